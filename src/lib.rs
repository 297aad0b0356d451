//! xof - Rust reader for DirectX `.x` model files
//!
//! This crate loads DirectX retained-mode model files into a flat, index
//! consistent [`SceneModel`]. All four body encodings are supported: plain
//! text, binary tokens, and both of them wrapped in MSZip framing, which is
//! decoded by a self-contained RFC1951 inflater.
//!
//! # Features
//!
//! - Text (`txt `) and binary (`bin `) token streams parsed by one schema parser
//! - Compressed (`tzip` / `bzip`) documents with MSZip frame validation
//! - Hand-rolled DEFLATE decoder (stored, fixed and dynamic blocks)
//! - Multiple meshes merged into one vertex and triangle list
//! - Materials with textures and sphere textures (`.sph` / `.spa`)
//! - Shift-JIS text by default, other encodings through [`LoadOptions`]
//!
//! # Example - Loading
//!
//! ```no_run
//! use xof::load_file;
//!
//! let scene = load_file("model.x")?;
//! println!(
//!     "{} vertices, {} triangles, {} materials",
//!     scene.vertex_count(),
//!     scene.faces.len(),
//!     scene.materials.len()
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Example - Decompression
//!
//! ```no_run
//! use xof::{decompress_bytes, XofHeader};
//!
//! let compressed = std::fs::read("model_bzip.x")?;
//! let document = decompress_bytes(&compressed)?;
//! assert!(!XofHeader::parse(&document)?.encoding.is_compressed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

// Public modules
pub mod common;
pub mod error;
pub mod header;
pub mod inflate;
pub mod mszip;
pub mod parser;
pub mod scene;
pub mod token;

// Re-export commonly used types
pub use common::{LoadOptions, Result, XofError, HEADER_SIZE, MAX_WINDOW_SIZE};
pub use header::{Encoding, FloatWidth, XofHeader};
pub use inflate::{InflateStats, Inflater};
pub use mszip::{FrameDecoder, FrameRecord};
pub use parser::SchemaParser;
pub use scene::{DrawFlags, HeaderInfo, Material, SceneModel, SphereMode};
pub use token::{BinaryTokenReader, TextTokenizer, Token, TokenSource};

use std::borrow::Cow;
use std::io::Read;
use std::path::Path;

// Convenience functions

/// Load a document with default options
///
/// # Arguments
/// * `data` - The complete file contents, header included
///
/// # Returns
/// The parsed scene
pub fn load_bytes(data: &[u8]) -> Result<SceneModel> {
    load_with_options(data, &LoadOptions::default())
}

/// Load a document with explicit options
///
/// # Arguments
/// * `data` - The complete file contents, header included
/// * `options` - Text encoding and nesting limit
///
/// # Returns
/// The parsed scene; nothing is returned when any stage fails
pub fn load_with_options(data: &[u8], options: &LoadOptions) -> Result<SceneModel> {
    let header = XofHeader::parse(data)?;
    log::debug!(
        "header: version {}, encoding {:?}, {}-byte floats",
        String::from_utf8_lossy(&header.version),
        header.encoding,
        header.float_width.bytes()
    );

    let document: Cow<'_, [u8]> = if header.encoding.is_compressed() {
        Cow::Owned(mszip::decompress(data)?)
    } else {
        Cow::Borrowed(data)
    };

    if header.encoding.is_binary() {
        let source = BinaryTokenReader::new(&document, header.float_width, options.text_encoding)
            .with_start(HEADER_SIZE);
        SchemaParser::new(source, *options).parse()
    } else {
        let source = TextTokenizer::new(&document[HEADER_SIZE..], options.text_encoding);
        SchemaParser::new(source, *options).parse()
    }
}

/// Load a document from any reader
///
/// # Arguments
/// * `reader` - Source of the complete file contents
///
/// # Returns
/// The parsed scene
pub fn load<R: Read>(mut reader: R) -> Result<SceneModel> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    load_bytes(&data)
}

/// Load a document from a file path
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<SceneModel> {
    let data = std::fs::read(path)?;
    load_bytes(&data)
}

/// Expand a compressed document into its uncompressed equivalent
///
/// # Arguments
/// * `data` - The complete file contents
///
/// # Returns
/// The document with its format indicator rewritten to `txt ` or `bin `;
/// uncompressed input is returned unchanged
pub fn decompress_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let header = XofHeader::parse(data)?;
    if !header.encoding.is_compressed() {
        return Ok(data.to_vec());
    }

    let mut document = mszip::decompress(data)?;
    document[8..12].copy_from_slice(&header.encoding.uncompressed().tag());
    Ok(document)
}

/// Inflate a raw DEFLATE stream
///
/// # Arguments
/// * `data` - RFC1951 data without any zlib or gzip wrapper
///
/// # Returns
/// A vector containing the decompressed data
pub fn inflate_bytes(data: &[u8]) -> Result<Vec<u8>> {
    inflate::inflate(data)
}
