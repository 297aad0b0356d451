//! Schema parser
//!
//! A recursive-descent consumer of a [`TokenSource`] that recognizes the data
//! objects needed to build a [`SceneModel`] and skips everything else by
//! counting braces. Numeric reads work the same for both encodings: text
//! documents yield one number per token with separators in between, binary
//! documents yield lists that are drained one value at a time.

mod material;
mod mesh;

use crate::common::LoadOptions;
use crate::scene::{Material, SceneModel};
use crate::token::{Token, TokenSource};
use crate::{Result, XofError};
use std::collections::{HashMap, VecDeque};

/// Data objects the parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    /// `template` definition
    Template,
    /// `Header`
    Header,
    /// `Frame`, parsed as a plain container
    Frame,
    /// `Mesh`
    Mesh,
    /// `MeshMaterialList`
    MeshMaterialList,
    /// `Material`
    Material,
    /// `TextureFilename`
    TextureFilename,
    /// `MeshNormals`
    MeshNormals,
    /// `MeshTextureCoords`
    MeshTextureCoords,
    /// Anything else; skipped
    Unknown,
}

const CONSTRUCT_NAMES: [(&str, Construct); 9] = [
    ("template", Construct::Template),
    ("Header", Construct::Header),
    ("Frame", Construct::Frame),
    ("Mesh", Construct::Mesh),
    ("MeshMaterialList", Construct::MeshMaterialList),
    ("Material", Construct::Material),
    ("TextureFilename", Construct::TextureFilename),
    ("MeshNormals", Construct::MeshNormals),
    ("MeshTextureCoords", Construct::MeshTextureCoords),
];

impl Construct {
    /// Classify an object type name (case-insensitive)
    pub fn from_name(name: &str) -> Self {
        CONSTRUCT_NAMES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map_or(Construct::Unknown, |&(_, construct)| construct)
    }
}

/// A single numeric value from either encoding
#[derive(Debug, Clone, Copy)]
enum Scalar {
    Int(u32),
    Float(f64),
}

/// What follows the fixed fields of a data object
#[derive(Debug)]
enum Member {
    /// The closing brace
    End,
    /// A nested data object of the given type
    Object(String),
    /// `{ name }` reference to an object declared elsewhere
    Reference(Option<String>),
}

/// Recursive-descent parser building a [`SceneModel`]
#[derive(Debug)]
pub struct SchemaParser<S> {
    source: S,
    pending: VecDeque<Scalar>,
    options: LoadOptions,
    depth: usize,
    scene: SceneModel,
    named_materials: HashMap<String, Material>,
}

impl<S: TokenSource> SchemaParser<S> {
    /// Create a parser reading from `source`
    pub fn new(source: S, options: LoadOptions) -> Self {
        Self {
            source,
            pending: VecDeque::new(),
            options,
            depth: 0,
            scene: SceneModel::default(),
            named_materials: HashMap::new(),
        }
    }

    /// Consume the whole stream and return the validated model
    pub fn parse(mut self) -> Result<SceneModel> {
        while let Some(token) = self.next_opt()? {
            match token {
                Token::Name(type_name) => self.parse_object(&type_name)?,
                token if token.is_separator() => {}
                other => {
                    return Err(XofError::protocol(
                        self.source.offset(),
                        "data object or template",
                        other.to_string(),
                    ))
                }
            }
        }
        self.finish()
    }

    // Token access

    fn next_opt(&mut self) -> Result<Option<Token>> {
        self.source.next_token()
    }

    /// Next token; the end of the stream is a truncation
    fn next(&mut self) -> Result<Token> {
        self.next_opt()?
            .ok_or_else(|| XofError::truncated(self.source.offset(), 1, 0))
    }

    fn unexpected(&self, expected: &str, found: &Token) -> XofError {
        XofError::protocol(self.source.offset(), expected, found.to_string())
    }

    // Numbers

    fn next_scalar(&mut self) -> Result<Scalar> {
        loop {
            if let Some(value) = self.pending.pop_front() {
                return Ok(value);
            }

            match self.next()? {
                Token::Integer(n) => return Ok(Scalar::Int(n)),
                Token::Float(x) => return Ok(Scalar::Float(x)),
                Token::IntegerList(values) => {
                    self.pending.extend(values.into_iter().map(Scalar::Int))
                }
                Token::FloatList(values) => {
                    self.pending.extend(values.into_iter().map(Scalar::Float))
                }
                token if token.is_separator() => {}
                other => return Err(self.unexpected("number", &other)),
            }
        }
    }

    fn read_u32(&mut self) -> Result<u32> {
        match self.next_scalar()? {
            Scalar::Int(n) => Ok(n),
            Scalar::Float(x) if x >= 0.0 && x <= u32::MAX as f64 && x.fract() == 0.0 => {
                Ok(x as u32)
            }
            Scalar::Float(x) => Err(XofError::protocol(
                self.source.offset(),
                "integer",
                format!("float {x}"),
            )),
        }
    }

    fn read_count(&mut self) -> Result<usize> {
        Ok(self.read_u32()? as usize)
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(match self.next_scalar()? {
            Scalar::Int(n) => n as f32,
            Scalar::Float(x) => x as f32,
        })
    }

    fn read_vector2(&mut self) -> Result<[f32; 2]> {
        Ok([self.read_f32()?, self.read_f32()?])
    }

    fn read_vector3(&mut self) -> Result<[f32; 3]> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    fn read_color4(&mut self) -> Result<[f32; 4]> {
        Ok([
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ])
    }

    fn read_string(&mut self) -> Result<String> {
        loop {
            match self.next()? {
                Token::StringLit(value) => return Ok(value),
                token if token.is_separator() => {}
                other => return Err(self.unexpected("string", &other)),
            }
        }
    }

    // Object structure

    /// Read `[name] [<guid>] {` after an object's type name
    fn read_object_header(&mut self) -> Result<Option<String>> {
        let mut name = None;
        loop {
            match self.next()? {
                Token::OpenBrace => return Ok(name),
                Token::Name(instance) if name.is_none() => name = Some(instance),
                Token::Guid(_) => {}
                other => return Err(self.unexpected("'{'", &other)),
            }
        }
    }

    /// Next thing inside an object body after its fixed fields
    fn next_member(&mut self) -> Result<Member> {
        loop {
            let offset = self.source.offset();
            match self.next()? {
                Token::CloseBrace => {
                    self.discard_pending();
                    return Ok(Member::End);
                }
                Token::Name(type_name) => {
                    self.discard_pending();
                    return Ok(Member::Object(type_name));
                }
                Token::OpenBrace => {
                    self.discard_pending();
                    return self.read_reference().map(Member::Reference);
                }
                token if token.is_separator() => {}
                token @ (Token::Integer(_)
                | Token::Float(_)
                | Token::IntegerList(_)
                | Token::FloatList(_)
                | Token::StringLit(_)
                | Token::Guid(_)) => {
                    log::debug!("ignoring extra {token} at offset {offset}");
                }
                other => return Err(self.unexpected("'}' or nested object", &other)),
            }
        }
    }

    /// Read `name [<guid>] }` after the `{` of a reference
    fn read_reference(&mut self) -> Result<Option<String>> {
        let mut name = None;
        loop {
            match self.next()? {
                Token::CloseBrace => return Ok(name),
                Token::Name(target) if name.is_none() => name = Some(target),
                Token::Guid(_) => {}
                other => return Err(self.unexpected("reference name", &other)),
            }
        }
    }

    fn discard_pending(&mut self) {
        if !self.pending.is_empty() {
            log::debug!("ignoring {} unread list values", self.pending.len());
            self.pending.clear();
        }
    }

    /// Skip the rest of an object whose `{` was already consumed
    fn skip_object_body(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()? {
                Token::OpenBrace => depth += 1,
                Token::CloseBrace => depth -= 1,
                _ => {}
            }
        }
        self.pending.clear();
        Ok(())
    }

    /// Skip members until the closing brace
    fn skip_members(&mut self) -> Result<()> {
        loop {
            match self.next_member()? {
                Member::End => return Ok(()),
                Member::Object(type_name) => self.parse_object(&type_name)?,
                Member::Reference(_) => {}
            }
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_nesting_depth {
            return Err(XofError::protocol(
                self.source.offset(),
                format!("at most {} nested objects", self.options.max_nesting_depth),
                format!("nesting depth {}", self.depth),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // Dispatch

    /// Parse one object whose type name was just read
    fn parse_object(&mut self, type_name: &str) -> Result<()> {
        let construct = Construct::from_name(type_name);
        if construct == Construct::Template {
            return self.parse_template();
        }

        self.enter()?;
        let name = self.read_object_header()?;
        match construct {
            Construct::Header => self.parse_header_body()?,
            Construct::Frame => self.skip_members()?,
            Construct::Mesh => self.parse_mesh_body(name.as_deref())?,
            Construct::Material => {
                let material = self.parse_material_body(name.clone())?;
                match name {
                    Some(name) => {
                        self.named_materials.insert(name, material);
                    }
                    None => log::debug!("ignoring unnamed material outside a material list"),
                }
            }
            _ => {
                log::debug!("skipping {type_name} object {}", name.unwrap_or_default());
                self.skip_object_body()?;
            }
        }
        self.leave();
        Ok(())
    }

    /// `template Name { ... }` declarations carry no data
    fn parse_template(&mut self) -> Result<()> {
        let name = match self.next()? {
            Token::Name(name) => name,
            other => return Err(self.unexpected("template name", &other)),
        };
        match self.next()? {
            Token::OpenBrace => {}
            other => return Err(self.unexpected("'{'", &other)),
        }
        log::trace!("skipping template {name}");
        self.skip_object_body()
    }

    fn parse_header_body(&mut self) -> Result<()> {
        let major = self.read_u32()?;
        let minor = self.read_u32()?;
        let flags = self.read_u32()?;
        self.scene.header = Some(crate::scene::HeaderInfo {
            major,
            minor,
            flags,
        });
        self.skip_members()
    }

    /// Check index consistency and hand out the model
    fn finish(self) -> Result<SceneModel> {
        let scene = self.scene;
        let offset = self.source.offset();

        let vertex_count = scene.positions.len();
        if let Some(index) = scene
            .faces
            .iter()
            .flatten()
            .find(|&&index| index as usize >= vertex_count)
        {
            return Err(XofError::protocol(
                offset,
                format!("face index below {vertex_count}"),
                format!("face index {index}"),
            ));
        }

        let material_count = scene.materials.len();
        if let Some(index) = scene
            .face_materials
            .iter()
            .find(|&&index| index >= material_count)
        {
            return Err(XofError::protocol(
                offset,
                format!("material index below {material_count}"),
                format!("material index {index}"),
            ));
        }

        let texture_count = scene.textures.len();
        let texture_out_of_range = scene.materials.iter().any(|m| {
            [m.texture_index, m.sphere_texture_index]
                .iter()
                .flatten()
                .any(|&index| index >= texture_count)
        });
        if texture_out_of_range {
            return Err(XofError::protocol(
                offset,
                format!("texture index below {texture_count}"),
                "out of range texture index",
            ));
        }

        log::debug!(
            "parsed scene: {} vertices, {} triangles, {} materials, {} textures",
            scene.positions.len(),
            scene.faces.len(),
            scene.materials.len(),
            scene.textures.len()
        );
        Ok(scene)
    }
}
