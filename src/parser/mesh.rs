//! `Mesh` and its per-mesh children

use super::{Construct, Member, SchemaParser};
use crate::scene::Material;
use crate::token::TokenSource;
use crate::{Result, XofError};

/// Upper bound for preallocation from declared counts
const MAX_PREALLOCATION: usize = 1 << 16;

/// Per-face material assignment read from a `MeshMaterialList`
struct MaterialAssignment {
    /// Material index of each face, relative to `materials`
    face_indices: Vec<usize>,
    materials: Vec<Material>,
}

impl<S: TokenSource> SchemaParser<S> {
    /// Body of a `Mesh`; the mesh is appended to the model so that several
    /// meshes merge into one vertex and triangle list
    pub(super) fn parse_mesh_body(&mut self, name: Option<&str>) -> Result<()> {
        let base_vertex = self.scene.positions.len();

        let vertex_count = self.read_count()?;
        self.scene
            .positions
            .reserve(vertex_count.min(MAX_PREALLOCATION));
        for _ in 0..vertex_count {
            let position = self.read_vector3()?;
            self.scene.positions.push(position);
        }
        self.scene.normals.resize(base_vertex + vertex_count, [0.0; 3]);
        self.scene.uvs.resize(base_vertex + vertex_count, [0.0; 2]);

        let face_count = self.read_count()?;
        let mut polygons = Vec::with_capacity(face_count.min(MAX_PREALLOCATION));
        for _ in 0..face_count {
            polygons.push(self.read_polygon(vertex_count)?);
        }

        let mut assignment = None;
        loop {
            match self.next_member()? {
                Member::End => break,
                Member::Object(type_name) => match Construct::from_name(&type_name) {
                    Construct::MeshMaterialList => {
                        self.enter()?;
                        self.read_object_header()?;
                        assignment = Some(self.parse_material_list_body(face_count)?);
                        self.leave();
                    }
                    Construct::MeshNormals => {
                        self.enter()?;
                        self.read_object_header()?;
                        self.parse_normals_body(base_vertex, &polygons)?;
                        self.leave();
                    }
                    Construct::MeshTextureCoords => {
                        self.enter()?;
                        self.read_object_header()?;
                        self.parse_texture_coords_body(base_vertex, vertex_count)?;
                        self.leave();
                    }
                    _ => self.parse_object(&type_name)?,
                },
                Member::Reference(target) => {
                    log::debug!("ignoring reference {target:?} inside mesh");
                }
            }
        }

        let base_material = self.scene.materials.len();
        let face_materials = match assignment {
            Some(assignment) => {
                self.scene.materials.extend(assignment.materials);
                assignment.face_indices
            }
            None => {
                log::debug!("mesh {} has no material list, using a default material", name.unwrap_or("<unnamed>"));
                self.scene.materials.push(Material::default());
                vec![0; face_count]
            }
        };

        let base = base_vertex as u32;
        for (polygon, local_material) in polygons.iter().zip(face_materials) {
            // Fan triangulation around the first corner
            for k in 1..polygon.len() - 1 {
                self.scene
                    .faces
                    .push([base + polygon[0], base + polygon[k], base + polygon[k + 1]]);
                self.scene.face_materials.push(base_material + local_material);
            }
        }

        log::debug!(
            "mesh {}: {} vertices, {} faces",
            name.unwrap_or("<unnamed>"),
            vertex_count,
            face_count
        );
        Ok(())
    }

    /// One `n; i0, i1, ...;` face with indices checked against the mesh
    fn read_polygon(&mut self, vertex_count: usize) -> Result<Vec<u32>> {
        let corners = self.read_count()?;
        if corners < 3 {
            return Err(XofError::protocol(
                self.source.offset(),
                "face with at least 3 vertices",
                format!("face with {corners} vertices"),
            ));
        }

        let mut polygon = Vec::with_capacity(corners.min(MAX_PREALLOCATION));
        for _ in 0..corners {
            let index = self.read_u32()?;
            if index as usize >= vertex_count {
                return Err(XofError::protocol(
                    self.source.offset(),
                    format!("vertex index below {vertex_count}"),
                    format!("vertex index {index}"),
                ));
            }
            polygon.push(index);
        }
        Ok(polygon)
    }

    fn parse_material_list_body(&mut self, face_count: usize) -> Result<MaterialAssignment> {
        let material_count = self.read_count()?;
        let index_count = self.read_count()?;

        let mut face_indices = Vec::with_capacity(face_count.min(MAX_PREALLOCATION));
        for _ in 0..index_count {
            let index = self.read_count()?;
            if face_indices.len() < face_count {
                face_indices.push(index);
            }
        }
        // A short list repeats its last entry for the remaining faces
        let last = face_indices.last().copied().unwrap_or(0);
        face_indices.resize(face_count, last);

        let mut materials = Vec::with_capacity(material_count.min(MAX_PREALLOCATION));
        loop {
            match self.next_member()? {
                Member::End => break,
                Member::Object(type_name) if Construct::from_name(&type_name) == Construct::Material => {
                    self.enter()?;
                    let name = self.read_object_header()?;
                    let material = self.parse_material_body(name.clone())?;
                    if let Some(name) = name {
                        self.named_materials.insert(name, material.clone());
                    }
                    materials.push(material);
                    self.leave();
                }
                Member::Object(type_name) => self.parse_object(&type_name)?,
                Member::Reference(Some(target)) => match self.named_materials.get(&target) {
                    Some(material) => materials.push(material.clone()),
                    None => {
                        return Err(XofError::protocol(
                            self.source.offset(),
                            "reference to a declared material",
                            format!("unknown material '{target}'"),
                        ))
                    }
                },
                Member::Reference(None) => {
                    return Err(XofError::protocol(
                        self.source.offset(),
                        "material reference by name",
                        "reference without a name",
                    ))
                }
            }
        }

        if materials.len() != material_count {
            return Err(XofError::protocol(
                self.source.offset(),
                format!("{material_count} materials"),
                format!("{} materials", materials.len()),
            ));
        }
        if let Some(&index) = face_indices.iter().find(|&&index| index >= materials.len()) {
            return Err(XofError::protocol(
                self.source.offset(),
                format!("material index below {}", materials.len()),
                format!("material index {index}"),
            ));
        }

        Ok(MaterialAssignment {
            face_indices,
            materials,
        })
    }

    /// Normals are indexed per face corner; each one is stored on the
    /// vertex at the same corner
    fn parse_normals_body(&mut self, base_vertex: usize, polygons: &[Vec<u32>]) -> Result<()> {
        let normal_count = self.read_count()?;
        let mut normals = Vec::with_capacity(normal_count.min(MAX_PREALLOCATION));
        for _ in 0..normal_count {
            normals.push(self.read_vector3()?);
        }

        let face_count = self.read_count()?;
        for face in 0..face_count {
            let corners = self.read_count()?;
            for corner in 0..corners {
                let normal_index = self.read_count()?;
                let normal = normals.get(normal_index).copied().ok_or_else(|| {
                    XofError::protocol(
                        self.source.offset(),
                        format!("normal index below {normal_count}"),
                        format!("normal index {normal_index}"),
                    )
                })?;
                match polygons.get(face).and_then(|polygon| polygon.get(corner)) {
                    Some(&vertex) => self.scene.normals[base_vertex + vertex as usize] = normal,
                    None => log::debug!("normal face {face} corner {corner} has no matching vertex"),
                }
            }
        }

        self.skip_members()
    }

    fn parse_texture_coords_body(&mut self, base_vertex: usize, vertex_count: usize) -> Result<()> {
        let coord_count = self.read_count()?;
        if coord_count != vertex_count {
            log::debug!("{coord_count} texture coordinates for {vertex_count} vertices");
        }
        for i in 0..coord_count {
            let uv = self.read_vector2()?;
            if i < vertex_count {
                self.scene.uvs[base_vertex + i] = uv;
            }
        }

        self.skip_members()
    }
}
