//! Bit-granular cursor over an owned byte buffer
//!
//! DEFLATE packs fields LSB-first into bytes, while Huffman codes are stored
//! most significant bit first. The cursor supports both orders.

use crate::{Result, XofError};

/// Owned byte buffer with a bit read position
#[derive(Debug, Clone)]
pub struct BitCursor {
    buffer: Vec<u8>,
    bit_position: u64,
    overrun_bits: u64,
}

impl BitCursor {
    /// Create a cursor positioned at the first bit of `buffer`
    pub fn new(buffer: Vec<u8>) -> Self {
        Self {
            buffer,
            bit_position: 0,
            overrun_bits: 0,
        }
    }

    /// Total number of bits in the buffer
    pub fn total_bits(&self) -> u64 {
        self.buffer.len() as u64 * 8
    }

    /// Current read position in bits
    pub fn bit_position(&self) -> u64 {
        self.bit_position
    }

    /// Current read position in whole bytes (rounded down)
    pub fn byte_position(&self) -> u64 {
        self.bit_position / 8
    }

    /// Bits left before the end of the buffer
    pub fn remaining_bits(&self) -> u64 {
        self.total_bits() - self.bit_position
    }

    /// Number of zero bits handed out after the end of the buffer
    pub fn overrun_bits(&self) -> u64 {
        self.overrun_bits
    }

    /// Read one bit. Past the end this yields 0 and counts an overrun.
    pub fn read_bit(&mut self) -> u32 {
        if self.bit_position >= self.total_bits() {
            self.overrun_bits += 1;
            return 0;
        }

        let byte = self.buffer[(self.bit_position / 8) as usize];
        let bit = (byte >> (self.bit_position % 8)) & 1;
        self.bit_position += 1;
        bit as u32
    }

    /// Read `n` bits (n <= 32), first bit read becomes the least significant
    pub fn read_bits(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32);
        let mut value = 0u32;
        for i in 0..n {
            value |= self.read_bit() << i;
        }
        value
    }

    /// Read `n` bits (n <= 32), first bit read becomes the most significant
    pub fn read_bits_reversed(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32);
        let mut value = 0u32;
        for _ in 0..n {
            value = (value << 1) | self.read_bit();
        }
        value
    }

    /// Skip to the next byte boundary
    pub fn align_to_byte(&mut self) {
        let partial = self.bit_position % 8;
        if partial != 0 {
            self.bit_position = (self.bit_position + 8 - partial).min(self.total_bits());
        }
    }

    /// Take `n` whole bytes from a byte-aligned position
    ///
    /// Unlike bit reads, this never zero-fills: a short buffer is an error.
    pub fn read_aligned_bytes(&mut self, n: usize) -> Result<&[u8]> {
        self.align_to_byte();
        let start = self.byte_position() as usize;
        let available = self.buffer.len() - start;
        if n > available {
            return Err(XofError::truncated(start as u64, n, available));
        }

        self.bit_position += n as u64 * 8;
        Ok(&self.buffer[start..start + n])
    }
}
