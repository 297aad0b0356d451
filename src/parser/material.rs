//! `Material` and `TextureFilename`

use super::{Construct, Member, SchemaParser};
use crate::scene::{DrawFlags, Material, SphereMode};
use crate::token::TokenSource;
use crate::Result;

/// Sphere texture extension and its blending mode
const SPHERE_EXTENSIONS: [(&str, SphereMode); 2] =
    [(".sph", SphereMode::Multiply), (".spa", SphereMode::Add)];

fn sphere_mode(file_name: &str) -> Option<SphereMode> {
    let lower = file_name.to_ascii_lowercase();
    SPHERE_EXTENSIONS
        .iter()
        .find(|(extension, _)| lower.ends_with(extension))
        .map(|&(_, mode)| mode)
}

impl<S: TokenSource> SchemaParser<S> {
    /// Body of a `Material`:
    /// `faceColor; power; specularColor; emissiveColor; [TextureFilename]`
    pub(super) fn parse_material_body(&mut self, name: Option<String>) -> Result<Material> {
        let diffuse = self.read_color4()?;
        let specular_power = self.read_f32()?;
        let specular = self.read_vector3()?;
        let ambient = self.read_vector3()?;

        let flags = if diffuse[3] < 1.0 {
            DrawFlags::GROUND_SHADOW | DrawFlags::DOUBLE_SIDED
        } else {
            DrawFlags::GROUND_SHADOW | DrawFlags::CAST_SHADOW
        };

        let mut material = Material {
            name,
            diffuse,
            specular,
            specular_power,
            ambient,
            flags,
            ..Material::default()
        };

        loop {
            match self.next_member()? {
                Member::End => break,
                Member::Object(type_name)
                    if Construct::from_name(&type_name) == Construct::TextureFilename =>
                {
                    self.enter()?;
                    self.read_object_header()?;
                    let file_name = self.read_string()?;
                    self.skip_members()?;
                    self.leave();
                    self.assign_texture(&mut material, &file_name);
                }
                Member::Object(type_name) => self.parse_object(&type_name)?,
                Member::Reference(target) => {
                    log::debug!("ignoring reference {target:?} inside material");
                }
            }
        }

        Ok(material)
    }

    /// `base*sphere` names both textures; a lone `.sph`/`.spa` file is
    /// only a sphere texture
    fn assign_texture(&mut self, material: &mut Material, file_name: &str) {
        let (base, sphere) = match file_name.split_once('*') {
            Some((base, sphere)) => (base, sphere),
            None if sphere_mode(file_name).is_some() => ("", file_name),
            None => (file_name, ""),
        };

        if !base.is_empty() {
            material.texture_index = Some(self.scene.intern_texture(base));
        }
        if !sphere.is_empty() {
            match sphere_mode(sphere) {
                Some(mode) => {
                    material.sphere_texture_index = Some(self.scene.intern_texture(sphere));
                    material.sphere_mode = mode;
                }
                None => log::debug!("ignoring sphere texture {sphere} with unknown extension"),
            }
        }
    }
}
