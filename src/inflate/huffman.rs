//! Canonical Huffman tables
//!
//! Tables are built from code lengths alone using the RFC1951 canonical
//! assignment, and decoded one bit at a time with a binary search over the
//! `(length, code)`-sorted symbol list.

use super::cursor::BitCursor;
use super::{FIXED_LITERAL_COUNT, MAX_CODE_BITS};
use crate::{Result, XofError};
use once_cell::sync::Lazy;

/// One symbol of a canonical Huffman table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalHuffmanSymbol {
    /// Decoded symbol value
    pub source_value: u16,
    /// Length of the code in bits
    pub code_length: u16,
    /// Code value, most significant bit first
    pub canonical_code: u16,
}

/// Canonical Huffman table sorted for `(length, code)` lookup
#[derive(Debug, Clone)]
pub struct CanonicalHuffmanTable {
    symbols: Vec<CanonicalHuffmanSymbol>,
    max_bits: u16,
}

/// RFC1951 fixed literal/length table, built on first use
pub static FIXED_LITERAL_TABLE: Lazy<CanonicalHuffmanTable> = Lazy::new(|| {
    let mut lengths = [0u8; FIXED_LITERAL_COUNT];
    lengths[0..=143].fill(8);
    lengths[144..=255].fill(9);
    lengths[256..=279].fill(7);
    lengths[280..=287].fill(8);
    // The fixed lengths form a complete code, so assignment cannot fail
    CanonicalHuffmanTable::from_code_lengths(&lengths).unwrap_or_else(|_| unreachable!())
});

impl CanonicalHuffmanTable {
    /// Build a table from `(symbol, code_length)` pairs
    ///
    /// Pairs with a zero length do not take part in the code. Over-subscribed
    /// length sets are rejected; incomplete ones are allowed.
    pub fn build(symbols_with_lengths: &[(u16, u8)]) -> Result<Self> {
        let mut entries: Vec<(u16, u8)> = symbols_with_lengths
            .iter()
            .copied()
            .filter(|&(_, length)| length > 0)
            .collect();
        entries.sort_by_key(|&(symbol, _)| symbol);

        // Count codes of each bit length
        let mut bl_count = [0u32; MAX_CODE_BITS + 1];
        for &(symbol, length) in &entries {
            if length as usize > MAX_CODE_BITS {
                return Err(XofError::huffman(
                    0,
                    format!("code length {length} for symbol {symbol} exceeds {MAX_CODE_BITS}"),
                ));
            }
            bl_count[length as usize] += 1;
        }

        // Kraft check: remaining code space must never go negative
        let mut left: i64 = 1;
        for count in bl_count.iter().skip(1) {
            left = (left << 1) - *count as i64;
            if left < 0 {
                return Err(XofError::huffman(0, "over-subscribed code lengths"));
            }
        }

        // First code of each length
        let mut next_code = [0u32; MAX_CODE_BITS + 1];
        let mut code = 0u32;
        for bits in 1..=MAX_CODE_BITS {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        let mut symbols = Vec::with_capacity(entries.len());
        let mut max_bits = 0u16;
        for (source_value, length) in entries {
            let canonical_code = next_code[length as usize];
            next_code[length as usize] += 1;
            max_bits = max_bits.max(length as u16);
            symbols.push(CanonicalHuffmanSymbol {
                source_value,
                code_length: length as u16,
                canonical_code: canonical_code as u16,
            });
        }
        symbols.sort_by_key(|s| (s.code_length, s.canonical_code));

        Ok(Self { symbols, max_bits })
    }

    /// Build a table where the symbol is the index into `lengths`
    pub fn from_code_lengths(lengths: &[u8]) -> Result<Self> {
        let pairs: Vec<(u16, u8)> = lengths
            .iter()
            .enumerate()
            .map(|(symbol, &length)| (symbol as u16, length))
            .collect();
        Self::build(&pairs)
    }

    /// Longest code length in the table
    pub fn max_bits(&self) -> u16 {
        self.max_bits
    }

    /// Symbols sorted by `(code_length, canonical_code)`
    pub fn symbols(&self) -> &[CanonicalHuffmanSymbol] {
        &self.symbols
    }

    /// Look up the code assigned to `source_value`
    pub fn code_for(&self, source_value: u16) -> Option<(u16, u16)> {
        self.symbols
            .iter()
            .find(|s| s.source_value == source_value)
            .map(|s| (s.code_length, s.canonical_code))
    }

    /// Decode one symbol from the cursor
    pub fn decode(&self, cursor: &mut BitCursor) -> Result<u16> {
        let start = cursor.bit_position();
        let mut code = 0u16;

        for length in 1..=self.max_bits {
            code = (code << 1) | cursor.read_bit() as u16;
            if let Ok(index) = self
                .symbols
                .binary_search_by_key(&(length, code), |s| (s.code_length, s.canonical_code))
            {
                return Ok(self.symbols[index].source_value);
            }
        }

        Err(XofError::huffman(
            start,
            format!("no code matches within {} bits", self.max_bits),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Write `code` MSB-first as the stream would carry it
    fn code_bits(length: u16, code: u16) -> Vec<u8> {
        let mut bytes = vec![0u8; 4];
        for i in 0..length {
            let bit = (code >> (length - 1 - i)) & 1;
            bytes[(i / 8) as usize] |= (bit as u8) << (i % 8);
        }
        bytes
    }

    #[test]
    fn test_rfc1951_example() {
        // RFC1951 section 3.2.2: ABCDEFGH with lengths (3, 3, 3, 3, 3, 2, 4, 4)
        let table = CanonicalHuffmanTable::from_code_lengths(&[3, 3, 3, 3, 3, 2, 4, 4]).unwrap();
        assert_eq!(table.code_for(5), Some((2, 0b00)));
        assert_eq!(table.code_for(0), Some((3, 0b010)));
        assert_eq!(table.code_for(4), Some((3, 0b110)));
        assert_eq!(table.code_for(6), Some((4, 0b1110)));
        assert_eq!(table.code_for(7), Some((4, 0b1111)));
        assert_eq!(table.max_bits(), 4);
    }

    #[test]
    fn test_decode_each_symbol() {
        let table = CanonicalHuffmanTable::from_code_lengths(&[3, 3, 3, 3, 3, 2, 4, 4]).unwrap();
        for symbol in table.symbols().to_vec() {
            let mut cursor =
                BitCursor::new(code_bits(symbol.code_length, symbol.canonical_code));
            assert_eq!(table.decode(&mut cursor).unwrap(), symbol.source_value);
            assert_eq!(cursor.bit_position(), symbol.code_length as u64);
        }
    }

    #[test]
    fn test_fixed_table_groups() {
        let table = &*FIXED_LITERAL_TABLE;
        assert_eq!(table.symbols().len(), 288);
        assert_eq!(table.max_bits(), 9);
        assert_eq!(table.code_for(256), Some((7, 0b0000000)));
        assert_eq!(table.code_for(279), Some((7, 0b0010111)));
        assert_eq!(table.code_for(0), Some((8, 0b00110000)));
        assert_eq!(table.code_for(143), Some((8, 0b10111111)));
        assert_eq!(table.code_for(280), Some((8, 0b11000000)));
        assert_eq!(table.code_for(144), Some((9, 0b110010000)));
        assert_eq!(table.code_for(255), Some((9, 0b111111111)));
    }

    #[test]
    fn test_over_subscribed_rejected() {
        let err = CanonicalHuffmanTable::from_code_lengths(&[1, 1, 1]).unwrap_err();
        assert!(matches!(err, XofError::HuffmanDecode { .. }));
    }

    #[test]
    fn test_incomplete_code_allowed() {
        // A single distance code is legal in DEFLATE
        let table = CanonicalHuffmanTable::from_code_lengths(&[0, 1]).unwrap();
        let mut cursor = BitCursor::new(vec![0b0]);
        assert_eq!(table.decode(&mut cursor).unwrap(), 1);

        // The unused half of the code space never matches
        let mut cursor = BitCursor::new(vec![0b1]);
        assert!(table.decode(&mut cursor).is_err());
    }

    #[test]
    fn test_empty_table_never_matches() {
        let table = CanonicalHuffmanTable::from_code_lengths(&[0; 30]).unwrap();
        assert_eq!(table.max_bits(), 0);
        let mut cursor = BitCursor::new(vec![0xFF]);
        assert!(table.decode(&mut cursor).is_err());
    }

    #[test]
    fn test_unsorted_pairs() {
        let forward = CanonicalHuffmanTable::build(&[(10, 2), (20, 2), (30, 1)]).unwrap();
        let shuffled = CanonicalHuffmanTable::build(&[(30, 1), (20, 2), (10, 2)]).unwrap();
        assert_eq!(forward.symbols(), shuffled.symbols());
        assert_eq!(forward.code_for(30), Some((1, 0b0)));
        assert_eq!(forward.code_for(10), Some((2, 0b10)));
        assert_eq!(forward.code_for(20), Some((2, 0b11)));
    }
}
