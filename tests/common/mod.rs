//! Fixture builders shared by the integration tests

#![allow(dead_code)]

use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

/// Raw DEFLATE via flate2
pub fn deflate_raw(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// BTYPE of the first block of a DEFLATE stream
pub fn first_block_type(deflated: &[u8]) -> u8 {
    (deflated[0] >> 1) & 0b11
}

/// 16-byte header with the given format tag and 32-bit floats
pub fn header(tag: &[u8; 4]) -> Vec<u8> {
    header_with_float_size(tag, b"0032")
}

pub fn header_with_float_size(tag: &[u8; 4], float_size: &[u8; 4]) -> Vec<u8> {
    let mut bytes = b"xof 0302".to_vec();
    bytes.extend_from_slice(tag);
    bytes.extend_from_slice(float_size);
    bytes
}

/// Wrap an uncompressed document body in MSZip framing, one frame per
/// `chunk_size` bytes
pub fn mszip_document(tag: &[u8; 4], body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut document = header(tag);
    document.extend_from_slice(&((body.len() + 16) as u32).to_le_bytes());
    for chunk in body.chunks(chunk_size) {
        let deflated = deflate_raw(chunk, 6);
        document.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
        document.extend_from_slice(&((deflated.len() + 2) as u16).to_le_bytes());
        document.extend_from_slice(b"CK");
        document.extend_from_slice(&deflated);
    }
    document
}

/// Builder for binary token streams
#[derive(Default)]
pub struct BinaryWriter {
    pub data: Vec<u8>,
    /// Float lists are written as f64, matching a `"0064"` header
    pub double_width: bool,
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn double_width() -> Self {
        Self {
            double_width: true,
            ..Self::default()
        }
    }

    fn code(&mut self, code: u16) -> &mut Self {
        self.data.extend_from_slice(&code.to_le_bytes());
        self
    }

    fn counted(&mut self, count: usize) -> &mut Self {
        self.data.extend_from_slice(&(count as u32).to_le_bytes());
        self
    }

    pub fn name(&mut self, name: &str) -> &mut Self {
        self.code(1).counted(name.len());
        self.data.extend_from_slice(name.as_bytes());
        self
    }

    pub fn string(&mut self, value: &[u8]) -> &mut Self {
        self.code(2).counted(value.len());
        self.data.extend_from_slice(value);
        self.code(20)
    }

    pub fn integer(&mut self, value: u32) -> &mut Self {
        self.code(3);
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn integers(&mut self, values: &[u32]) -> &mut Self {
        self.code(6).counted(values.len());
        for value in values {
            self.data.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    pub fn floats(&mut self, values: &[f64]) -> &mut Self {
        self.code(7).counted(values.len());
        for &value in values {
            if self.double_width {
                self.data.extend_from_slice(&value.to_le_bytes());
            } else {
                self.data.extend_from_slice(&(value as f32).to_le_bytes());
            }
        }
        self
    }

    pub fn open(&mut self) -> &mut Self {
        self.code(10)
    }

    pub fn close(&mut self) -> &mut Self {
        self.code(11)
    }

    pub fn finish(&self) -> Vec<u8> {
        self.data.clone()
    }
}

/// One triangle with one red material, as a text body
pub const TRIANGLE_TEXT_BODY: &str = "
Header {
 1;
 0;
 1;
}

Mesh triangle {
 3;
 0.0;0.0;0.0;,
 1.0;0.0;0.0;,
 0.0;1.0;0.0;;
 1;
 3;0,1,2;;

 MeshMaterialList {
  1;
  1;
  0;;
  Material red {
   1.0;0.0;0.0;1.0;;
   5.0;
   1.0;1.0;1.0;;
   0.0;0.0;0.0;;
  }
 }
}
";

/// The same triangle as a binary body
pub fn triangle_binary_body() -> Vec<u8> {
    triangle_body(BinaryWriter::new())
}

/// The triangle with 64-bit float lists
pub fn triangle_binary_body_f64() -> Vec<u8> {
    triangle_body(BinaryWriter::double_width())
}

fn triangle_body(mut writer: BinaryWriter) -> Vec<u8> {
    writer.name("Header").open().integers(&[1, 0, 1]).close();
    writer
        .name("Mesh")
        .name("triangle")
        .open()
        .integers(&[3])
        .floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
        .integers(&[1, 3, 0, 1, 2]);
    writer
        .name("MeshMaterialList")
        .open()
        .integers(&[1, 1, 0])
        .name("Material")
        .name("red")
        .open()
        .floats(&[1.0, 0.0, 0.0, 1.0, 5.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0])
        .close()
        .close();
    writer.close();
    writer.finish()
}

pub fn text_document(body: &str) -> Vec<u8> {
    let mut document = header(b"txt ");
    document.extend_from_slice(body.as_bytes());
    document
}

pub fn binary_document(body: &[u8]) -> Vec<u8> {
    let mut document = header(b"bin ");
    document.extend_from_slice(body);
    document
}

pub fn binary_document_f64(body: &[u8]) -> Vec<u8> {
    let mut document = header_with_float_size(b"bin ", b"0064");
    document.extend_from_slice(body);
    document
}
