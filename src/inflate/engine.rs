//! DEFLATE block decoder
//!
//! This module implements the block state machine: stored, fixed-Huffman and
//! dynamic-Huffman blocks are decoded in sequence until a block marked final.

use super::cursor::BitCursor;
use super::huffman::{CanonicalHuffmanTable, FIXED_LITERAL_TABLE};
use super::*;
use crate::{Result, XofError};

/// One compressed block, decoded from its 3-bit header
#[derive(Debug)]
pub enum Block {
    /// Uncompressed bytes
    Stored {
        /// Number of bytes that follow
        length: u16,
    },
    /// Literal/length and distance codes from RFC1951 section 3.2.6
    FixedHuffman,
    /// Codes transmitted in the block header
    DynamicHuffman {
        /// Literal/length alphabet
        literal_length_table: CanonicalHuffmanTable,
        /// Distance alphabet
        distance_table: CanonicalHuffmanTable,
    },
}

/// Statistics for one inflate run
#[derive(Debug, Default, Clone)]
pub struct InflateStats {
    /// Number of stored blocks
    pub stored_blocks: usize,
    /// Number of fixed-Huffman blocks
    pub fixed_blocks: usize,
    /// Number of dynamic-Huffman blocks
    pub dynamic_blocks: usize,
    /// Number of literal bytes decoded
    pub literal_count: usize,
    /// Number of back-references decoded
    pub match_count: usize,
    /// Longest back-reference
    pub longest_match: usize,
}

/// DEFLATE decoder over an in-memory compressed buffer
#[derive(Debug)]
pub struct Inflater {
    cursor: BitCursor,
    output: Vec<u8>,
    history_len: usize,
    stats: InflateStats,
    finished: bool,
}

impl Inflater {
    /// Create a decoder for `data`
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_dictionary(data, &[])
    }

    /// Create a decoder whose back-references may reach into `dictionary`
    ///
    /// Only the last 32KB of the dictionary are reachable.
    pub fn with_dictionary(data: Vec<u8>, dictionary: &[u8]) -> Self {
        let start = dictionary.len().saturating_sub(MAX_WINDOW_SIZE);
        let history = &dictionary[start..];
        let mut output = Vec::with_capacity(history.len() + data.len() * 4);
        output.extend_from_slice(history);

        Self {
            cursor: BitCursor::new(data),
            output,
            history_len: history.len(),
            stats: InflateStats::default(),
            finished: false,
        }
    }

    /// Statistics gathered so far
    pub fn stats(&self) -> &InflateStats {
        &self.stats
    }

    /// Number of compressed bytes consumed (rounded up to whole bytes)
    pub fn consumed_bytes(&self) -> u64 {
        self.cursor.bit_position().div_ceil(8)
    }

    /// Decode every block and return the decompressed bytes
    pub fn inflate(mut self) -> Result<Vec<u8>> {
        while !self.finished {
            self.decode_next_block()?;
        }
        Ok(self.output.split_off(self.history_len))
    }

    /// Decode one block, returning whether it was the final one
    pub fn decode_next_block(&mut self) -> Result<bool> {
        if self.finished {
            return Ok(true);
        }

        let header_start = self.cursor.bit_position();
        let is_final = self.cursor.read_bit() == 1;
        let block_type = self.cursor.read_bits(2);
        self.check_overrun(header_start, "block header")?;

        let block = self.read_block_header(block_type)?;
        log::trace!(
            "inflate block at bit {}: {} (final: {})",
            header_start,
            block_name(&block),
            is_final
        );

        match block {
            Block::Stored { length } => {
                self.stats.stored_blocks += 1;
                let bytes = self.cursor.read_aligned_bytes(length as usize)?;
                self.output.extend_from_slice(bytes);
                self.stats.literal_count += length as usize;
            }
            Block::FixedHuffman => {
                self.stats.fixed_blocks += 1;
                self.decode_symbols(&FIXED_LITERAL_TABLE, None)?;
            }
            Block::DynamicHuffman {
                literal_length_table,
                distance_table,
            } => {
                self.stats.dynamic_blocks += 1;
                self.decode_symbols(&literal_length_table, Some(&distance_table))?;
            }
        }

        self.finished = is_final;
        Ok(is_final)
    }

    /// Turn a block type selector into a [`Block`], reading any block header
    fn read_block_header(&mut self, block_type: u32) -> Result<Block> {
        match block_type {
            BLOCK_STORED => {
                self.cursor.align_to_byte();
                let offset = self.cursor.byte_position();
                let header = self.cursor.read_aligned_bytes(4)?;
                let length = u16::from_le_bytes([header[0], header[1]]);
                let complement = u16::from_le_bytes([header[2], header[3]]);
                if length != !complement {
                    return Err(XofError::protocol(
                        offset,
                        format!("stored length complement {:#06x}", !length),
                        format!("{complement:#06x}"),
                    ));
                }
                Ok(Block::Stored { length })
            }
            BLOCK_FIXED => Ok(Block::FixedHuffman),
            BLOCK_DYNAMIC => self.read_dynamic_tables(),
            _ => Err(XofError::protocol(
                self.cursor.byte_position(),
                "block type 0, 1 or 2",
                format!("block type {block_type}"),
            )),
        }
    }

    /// Read the dynamic block header and build its two tables
    fn read_dynamic_tables(&mut self) -> Result<Block> {
        let header_start = self.cursor.bit_position();
        let hlit = self.cursor.read_bits(5) as usize + 257;
        let hdist = self.cursor.read_bits(5) as usize + 1;
        let hclen = self.cursor.read_bits(4) as usize + 4;

        if hlit > MAX_LITERAL_CODES || hdist > MAX_DISTANCE_CODES {
            return Err(XofError::huffman(
                header_start,
                format!("too many codes: {hlit} literal/length, {hdist} distance"),
            ));
        }

        let mut code_length_lengths = [0u8; CODE_LENGTH_CODES];
        for &index in CODE_LENGTH_ORDER.iter().take(hclen) {
            code_length_lengths[index] = self.cursor.read_bits(3) as u8;
        }
        self.check_overrun(header_start, "dynamic block header")?;
        let code_length_table = CanonicalHuffmanTable::from_code_lengths(&code_length_lengths)
            .map_err(|e| relocate(e, header_start))?;

        // Literal/length and distance lengths form one run-length coded sequence
        let total = hlit + hdist;
        let mut lengths = Vec::with_capacity(total);
        while lengths.len() < total {
            let symbol_start = self.cursor.bit_position();
            let symbol = code_length_table.decode(&mut self.cursor)?;
            let (value, repeat) = match symbol {
                0..=15 => (symbol as u8, 1),
                16 => {
                    let previous = *lengths.last().ok_or_else(|| {
                        XofError::huffman(symbol_start, "repeat code 16 with no previous length")
                    })?;
                    (previous, 3 + self.cursor.read_bits(2) as usize)
                }
                17 => (0, 3 + self.cursor.read_bits(3) as usize),
                18 => (0, 11 + self.cursor.read_bits(7) as usize),
                _ => {
                    return Err(XofError::huffman(
                        symbol_start,
                        format!("invalid code length symbol {symbol}"),
                    ))
                }
            };
            self.check_overrun(symbol_start, "code lengths")?;

            if lengths.len() + repeat > total {
                return Err(XofError::huffman(
                    symbol_start,
                    format!(
                        "code length repeat of {repeat} overflows {total} declared lengths"
                    ),
                ));
            }
            lengths.resize(lengths.len() + repeat, value);
        }

        if lengths[END_OF_BLOCK as usize] == 0 {
            return Err(XofError::huffman(
                header_start,
                "end-of-block symbol has no code",
            ));
        }

        let literal_length_table = CanonicalHuffmanTable::from_code_lengths(&lengths[..hlit])
            .map_err(|e| relocate(e, header_start))?;
        let distance_table = CanonicalHuffmanTable::from_code_lengths(&lengths[hlit..])
            .map_err(|e| relocate(e, header_start))?;

        Ok(Block::DynamicHuffman {
            literal_length_table,
            distance_table,
        })
    }

    /// Decode literal/length symbols until end-of-block
    ///
    /// `distance_table` of `None` selects the fixed 5-bit distance code.
    fn decode_symbols(
        &mut self,
        literal_table: &CanonicalHuffmanTable,
        distance_table: Option<&CanonicalHuffmanTable>,
    ) -> Result<()> {
        loop {
            let symbol_start = self.cursor.bit_position();
            let symbol = literal_table.decode(&mut self.cursor)?;
            self.check_overrun(symbol_start, "literal/length symbol")?;

            match symbol {
                0..=255 => {
                    self.output.push(symbol as u8);
                    self.stats.literal_count += 1;
                }
                END_OF_BLOCK => return Ok(()),
                257..=285 => {
                    let index = (symbol - 257) as usize;
                    let length = LENGTH_BASE[index] as usize
                        + self.cursor.read_bits(LENGTH_EXTRA_BITS[index] as u32) as usize;

                    let distance_start = self.cursor.bit_position();
                    let distance_symbol = match distance_table {
                        Some(table) => table.decode(&mut self.cursor)?,
                        None => self.cursor.read_bits_reversed(5) as u16,
                    };
                    if distance_symbol as usize >= DISTANCE_BASE.len() {
                        return Err(XofError::huffman(
                            distance_start,
                            format!("invalid distance symbol {distance_symbol}"),
                        ));
                    }
                    let index = distance_symbol as usize;
                    let distance = DISTANCE_BASE[index] as usize
                        + self.cursor.read_bits(DISTANCE_EXTRA_BITS[index] as u32) as usize;
                    self.check_overrun(symbol_start, "back-reference")?;

                    self.copy_match(symbol_start, length, distance)?;
                }
                _ => {
                    return Err(XofError::huffman(
                        symbol_start,
                        format!("invalid literal/length symbol {symbol}"),
                    ))
                }
            }
        }
    }

    /// Append `length` bytes starting `distance` bytes back (may overlap)
    fn copy_match(&mut self, bit_offset: u64, length: usize, distance: usize) -> Result<()> {
        if distance == 0 || distance > self.output.len() {
            return Err(XofError::huffman(
                bit_offset,
                format!(
                    "back-reference distance {distance} exceeds {} available bytes",
                    self.output.len()
                ),
            ));
        }

        let start = self.output.len() - distance;
        if distance >= length {
            self.output.extend_from_within(start..start + length);
        } else {
            for i in 0..length {
                let byte = self.output[start + i];
                self.output.push(byte);
            }
        }

        self.stats.match_count += 1;
        self.stats.longest_match = self.stats.longest_match.max(length);
        Ok(())
    }

    /// Zero-filled bits past the end never count as real data
    fn check_overrun(&self, bit_offset: u64, what: &str) -> Result<()> {
        if self.cursor.overrun_bits() == 0 {
            return Ok(());
        }

        log::debug!("compressed data ended inside {what}");
        let available = (self.cursor.total_bits() - bit_offset).div_ceil(8) as usize;
        Err(XofError::truncated(
            bit_offset / 8,
            available + self.cursor.overrun_bits().div_ceil(8) as usize,
            available,
        ))
    }
}

fn block_name(block: &Block) -> &'static str {
    match block {
        Block::Stored { .. } => "stored",
        Block::FixedHuffman => "fixed",
        Block::DynamicHuffman { .. } => "dynamic",
    }
}

/// Table construction errors carry no position; attach the block header's
fn relocate(error: XofError, bit_offset: u64) -> XofError {
    match error {
        XofError::HuffmanDecode { reason, .. } => XofError::HuffmanDecode { bit_offset, reason },
        other => other,
    }
}
