//! DEFLATE (RFC1951) decompression
//!
//! This module provides a self-contained inflate implementation: a bit
//! cursor, canonical Huffman tables and the block decoder. It is used by the
//! MSZip frame decoder but works on any raw DEFLATE stream.

mod cursor;
mod engine;
mod huffman;

pub use cursor::BitCursor;
pub use engine::{Block, InflateStats, Inflater};
pub use huffman::{CanonicalHuffmanSymbol, CanonicalHuffmanTable, FIXED_LITERAL_TABLE};

use crate::Result;

pub use crate::common::MAX_WINDOW_SIZE;

/// Longest code length allowed by DEFLATE
pub const MAX_CODE_BITS: usize = 15;

/// Number of symbols in the fixed literal/length alphabet
pub const FIXED_LITERAL_COUNT: usize = 288;

/// Maximum literal/length codes in a dynamic block
pub const MAX_LITERAL_CODES: usize = 286;

/// Maximum distance codes in a dynamic block
pub const MAX_DISTANCE_CODES: usize = 30;

/// Size of the code length alphabet
pub const CODE_LENGTH_CODES: usize = 19;

/// End-of-block literal/length symbol
pub const END_OF_BLOCK: u16 = 256;

/// Block type selector: stored
pub const BLOCK_STORED: u32 = 0;

/// Block type selector: fixed Huffman codes
pub const BLOCK_FIXED: u32 = 1;

/// Block type selector: dynamic Huffman codes
pub const BLOCK_DYNAMIC: u32 = 2;

/// Order in which code length code lengths are transmitted
pub const CODE_LENGTH_ORDER: [usize; CODE_LENGTH_CODES] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Base lengths for symbols 257..=285
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115,
    131, 163, 195, 227, 258,
];

/// Extra bits for symbols 257..=285
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base distances for distance symbols 0..=29
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits for distance symbols 0..=29
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Convenience function to inflate a raw DEFLATE stream in memory
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    Inflater::new(data.to_vec()).inflate()
}

/// Inflate a raw DEFLATE stream whose back-references may reach into `dictionary`
pub fn inflate_with_dictionary(data: &[u8], dictionary: &[u8]) -> Result<Vec<u8>> {
    Inflater::with_dictionary(data.to_vec(), dictionary).inflate()
}
