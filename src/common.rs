//! Common types and constants for the xof reader
//!
//! This module defines the error type, load options and format constants
//! shared by the decompressor, the tokenizers and the schema parser.

use encoding_rs::{Encoding, SHIFT_JIS};
use thiserror::Error;

/// Error type for xof operations
#[derive(Debug, Error)]
pub enum XofError {
    /// Unrecognized magic, format indicator or container signature
    #[error("Invalid format at byte {offset}: {reason}")]
    Format {
        /// Byte offset of the offending field
        offset: u64,
        /// What was wrong with it
        reason: String,
    },

    /// A read needed more bytes than remain
    #[error("Truncated stream at byte {offset}: needed {needed} bytes, {available} available")]
    TruncatedStream {
        /// Byte offset where the read started
        offset: u64,
        /// Bytes the read required
        needed: usize,
        /// Bytes that were left
        available: usize,
    },

    /// An MSZip frame disagrees with its declared sizes
    #[error("Frame {frame} size mismatch: expected {expected} bytes, got {actual}")]
    FrameSizeMismatch {
        /// Index of the frame (or the frame count for the final total)
        frame: usize,
        /// Declared size
        expected: usize,
        /// Size actually available or produced
        actual: usize,
    },

    /// Corrupt Huffman data or an invalid back-reference
    #[error("Huffman decode error at bit {bit_offset}: {reason}")]
    HuffmanDecode {
        /// Bit offset into the compressed block data
        bit_offset: u64,
        /// Description of the failure
        reason: String,
    },

    /// The token stream does not follow the grammar
    #[error("Protocol error at offset {offset}: expected {expected}, found {found}")]
    Protocol {
        /// Byte (binary) or character (text) offset
        offset: u64,
        /// What the grammar required
        expected: String,
        /// What was actually read
        found: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl XofError {
    pub(crate) fn truncated(offset: u64, needed: usize, available: usize) -> Self {
        XofError::TruncatedStream {
            offset,
            needed,
            available,
        }
    }

    pub(crate) fn protocol(
        offset: u64,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        XofError::Protocol {
            offset,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn huffman(bit_offset: u64, reason: impl Into<String>) -> Self {
        XofError::HuffmanDecode {
            bit_offset,
            reason: reason.into(),
        }
    }
}

/// Result type alias for xof operations
pub type Result<T> = std::result::Result<T, XofError>;

// Format constants

/// Size of the fixed file header
pub const HEADER_SIZE: usize = 16;

/// Magic bytes at the start of every xof file
pub const XOF_MAGIC: [u8; 4] = *b"xof ";

/// Float width indicator selecting 4-byte floats
pub const FLOAT_SIZE_32: [u8; 4] = *b"0032";

/// Float width indicator selecting 8-byte floats
pub const FLOAT_SIZE_64: [u8; 4] = *b"0064";

/// Signature at the start of every MSZip frame payload
pub const MSZIP_SIGNATURE: [u8; 2] = *b"CK";

/// DEFLATE back-reference window size
pub const MAX_WINDOW_SIZE: usize = 0x8000; // 32KB

/// Default limit for nested data objects
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Options controlling how a document is loaded
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Encoding of text documents and of binary names/strings
    pub text_encoding: &'static Encoding,
    /// Maximum depth of nested data objects
    pub max_nesting_depth: usize,
}

impl LoadOptions {
    /// Select the text encoding by its WHATWG label (e.g. `"shift_jis"`, `"utf-8"`)
    pub fn with_encoding_label(mut self, label: &str) -> Option<Self> {
        self.text_encoding = Encoding::for_label(label.as_bytes())?;
        Some(self)
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            text_encoding: SHIFT_JIS,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LoadOptions::default();
        assert_eq!(options.text_encoding, SHIFT_JIS);
        assert_eq!(options.max_nesting_depth, 64);
    }

    #[test]
    fn test_encoding_label() {
        let options = LoadOptions::default().with_encoding_label("utf-8").unwrap();
        assert_eq!(options.text_encoding, encoding_rs::UTF_8);
        assert!(LoadOptions::default()
            .with_encoding_label("no-such-encoding")
            .is_none());
    }

    #[test]
    fn test_error_messages() {
        let err = XofError::truncated(20, 4, 1);
        assert_eq!(
            err.to_string(),
            "Truncated stream at byte 20: needed 4 bytes, 1 available"
        );

        let err = XofError::protocol(7, "'{'", "';'");
        assert!(matches!(err, XofError::Protocol { offset: 7, .. }));
    }

    #[test]
    fn test_constants() {
        assert_eq!(HEADER_SIZE, 16);
        assert_eq!(&XOF_MAGIC, b"xof ");
        assert_eq!(MAX_WINDOW_SIZE, 32768);
    }
}
