//! xof file header
//!
//! Every document starts with a 16-byte header:
//!
//! | Offset | Size | Content                                   |
//! |--------|------|-------------------------------------------|
//! | 0      | 4    | magic `"xof "`                            |
//! | 4      | 4    | version, 4 ASCII digits (`"0303"`)        |
//! | 8      | 4    | format: `"txt "`, `"bin "`, `"tzip"`, `"bzip"` |
//! | 12     | 4    | float width: `"0032"` or `"0064"`          |

use crate::common::{FLOAT_SIZE_32, HEADER_SIZE, XOF_MAGIC};
use crate::{Result, XofError};
use std::io::{Read, Seek, SeekFrom};

/// Physical encoding of the document body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Plain text tokens
    Text,
    /// Uncompressed binary tokens
    Binary,
    /// MSZip-compressed text tokens
    CompressedText,
    /// MSZip-compressed binary tokens
    CompressedBinary,
}

impl Encoding {
    /// Parse the 4-byte format indicator
    pub fn from_tag(tag: [u8; 4]) -> Option<Self> {
        match &tag {
            b"txt " => Some(Encoding::Text),
            b"bin " => Some(Encoding::Binary),
            b"tzip" => Some(Encoding::CompressedText),
            b"bzip" => Some(Encoding::CompressedBinary),
            _ => None,
        }
    }

    /// The 4-byte format indicator
    pub fn tag(&self) -> [u8; 4] {
        match self {
            Encoding::Text => *b"txt ",
            Encoding::Binary => *b"bin ",
            Encoding::CompressedText => *b"tzip",
            Encoding::CompressedBinary => *b"bzip",
        }
    }

    /// Whether the body is MSZip-compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, Encoding::CompressedText | Encoding::CompressedBinary)
    }

    /// Whether the body holds binary tokens
    pub fn is_binary(&self) -> bool {
        matches!(self, Encoding::Binary | Encoding::CompressedBinary)
    }

    /// The same token encoding without compression
    pub fn uncompressed(&self) -> Self {
        match self {
            Encoding::Text | Encoding::CompressedText => Encoding::Text,
            Encoding::Binary | Encoding::CompressedBinary => Encoding::Binary,
        }
    }
}

/// Width of floating point values in binary float lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    /// 4-byte IEEE floats
    F32 = 4,
    /// 8-byte IEEE doubles
    F64 = 8,
}

impl FloatWidth {
    /// Size of one value in bytes
    pub fn bytes(&self) -> usize {
        *self as usize
    }
}

/// Parsed 16-byte file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XofHeader {
    /// Raw version field
    pub version: [u8; 4],
    /// Body encoding
    pub encoding: Encoding,
    /// Float width for binary float lists
    pub float_width: FloatWidth,
}

impl XofHeader {
    /// Parse the header from the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(XofError::truncated(0, HEADER_SIZE, data.len()));
        }

        if data[0..4] != XOF_MAGIC {
            return Err(XofError::Format {
                offset: 0,
                reason: format!("bad magic {}", escape(&data[0..4])),
            });
        }

        let tag = field(data, 8);
        let encoding = Encoding::from_tag(tag).ok_or_else(|| XofError::Format {
            offset: 8,
            reason: format!("unknown format indicator {}", escape(&tag)),
        })?;

        // Anything other than "0032" means doubles
        let float_width = if field(data, 12) == FLOAT_SIZE_32 {
            FloatWidth::F32
        } else {
            FloatWidth::F64
        };

        Ok(Self {
            version: field(data, 4),
            encoding,
            float_width,
        })
    }

    /// Read and parse the header, leaving the reader where it was
    pub fn sniff<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let start = reader.stream_position()?;
        let mut buffer = Vec::with_capacity(HEADER_SIZE);
        reader
            .by_ref()
            .take(HEADER_SIZE as u64)
            .read_to_end(&mut buffer)?;
        reader.seek(SeekFrom::Start(start))?;
        Self::parse(&buffer)
    }

    /// Major version, if the version field is numeric
    pub fn major_version(&self) -> Option<u8> {
        parse_digits(&self.version[0..2])
    }

    /// Minor version, if the version field is numeric
    pub fn minor_version(&self) -> Option<u8> {
        parse_digits(&self.version[2..4])
    }

    /// Serialize the header back to its 16 bytes
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&XOF_MAGIC);
        bytes[4..8].copy_from_slice(&self.version);
        bytes[8..12].copy_from_slice(&self.encoding.tag());
        bytes[12..16].copy_from_slice(match self.float_width {
            FloatWidth::F32 => b"0032",
            FloatWidth::F64 => b"0064",
        });
        bytes
    }
}

fn field(data: &[u8], offset: usize) -> [u8; 4] {
    [
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ]
}

fn parse_digits(digits: &[u8]) -> Option<u8> {
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn escape(bytes: &[u8]) -> String {
    format!("\"{}\"", bytes.escape_ascii())
}
