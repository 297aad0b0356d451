//! In-memory scene model produced by the schema parser
//!
//! The model keeps only what a mesh consumer needs: vertices with normals
//! and texture coordinates, triangles, materials and texture names.

/// 3-component vector
pub type Vector3 = [f32; 3];

/// 2-component vector
pub type Vector2 = [f32; 2];

/// Material draw flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawFlags(pub u8);

impl DrawFlags {
    /// Render both faces of each triangle
    pub const DOUBLE_SIDED: DrawFlags = DrawFlags(0x01);
    /// Project a shadow onto the ground plane
    pub const GROUND_SHADOW: DrawFlags = DrawFlags(0x02);
    /// Render into the shadow map
    pub const CAST_SHADOW: DrawFlags = DrawFlags(0x04);

    /// Whether every flag in `other` is set
    pub fn contains(&self, other: DrawFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for DrawFlags {
    type Output = DrawFlags;

    fn bitor(self, rhs: DrawFlags) -> DrawFlags {
        DrawFlags(self.0 | rhs.0)
    }
}

/// How a sphere texture is combined with the base color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SphereMode {
    /// No sphere texture
    #[default]
    None,
    /// `.sph` files: multiply
    Multiply,
    /// `.spa` files: add
    Add,
}

/// One surface material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Object name, when the material was declared with one
    pub name: Option<String>,
    /// Diffuse RGBA (`faceColor`)
    pub diffuse: [f32; 4],
    /// Specular RGB
    pub specular: [f32; 3],
    /// Specular exponent
    pub specular_power: f32,
    /// Ambient RGB (`emissiveColor`)
    pub ambient: [f32; 3],
    /// Draw flags
    pub flags: DrawFlags,
    /// Index into [`SceneModel::textures`]
    pub texture_index: Option<usize>,
    /// Index into [`SceneModel::textures`] of the sphere texture
    pub sphere_texture_index: Option<usize>,
    /// Sphere texture blending
    pub sphere_mode: SphereMode,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [0.0; 3],
            specular_power: 0.0,
            ambient: [0.0; 3],
            flags: DrawFlags::GROUND_SHADOW | DrawFlags::CAST_SHADOW,
            texture_index: None,
            sphere_texture_index: None,
            sphere_mode: SphereMode::None,
        }
    }
}

/// Values of the optional `Header` object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Flags
    pub flags: u32,
}

/// Complete result of loading one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneModel {
    /// Vertex positions
    pub positions: Vec<Vector3>,
    /// Per-vertex normals (zero when the document has none)
    pub normals: Vec<Vector3>,
    /// Per-vertex texture coordinates (zero when the document has none)
    pub uvs: Vec<Vector2>,
    /// Triangles as vertex indices
    pub faces: Vec<[u32; 3]>,
    /// Material index of each triangle
    pub face_materials: Vec<usize>,
    /// Materials in declaration order
    pub materials: Vec<Material>,
    /// Unique texture file names in first-use order
    pub textures: Vec<String>,
    /// `Header` object, if present
    pub header: Option<HeaderInfo>,
}

impl SceneModel {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Index of `name` in the texture list, adding it if new
    pub fn intern_texture(&mut self, name: &str) -> usize {
        match self.textures.iter().position(|t| t == name) {
            Some(index) => index,
            None => {
                self.textures.push(name.to_string());
                self.textures.len() - 1
            }
        }
    }

    /// Triangles that use material `index`
    pub fn faces_for_material(&self, index: usize) -> impl Iterator<Item = &[u32; 3]> + '_ {
        self.faces
            .iter()
            .zip(&self.face_materials)
            .filter(move |(_, &material)| material == index)
            .map(|(face, _)| face)
    }
}
