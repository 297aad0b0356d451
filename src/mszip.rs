//! MSZip frame decoding for compressed xof documents
//!
//! A compressed document keeps its 16-byte header uncompressed, followed by
//! the declared size of the decompressed document (header included) and a
//! sequence of frames:
//!
//! ```text
//! u16 uncompressed size | u16 compressed size | "CK" | raw DEFLATE data
//! ```
//!
//! The compressed size counts the `"CK"` signature. Each frame may refer
//! back into the previous frame's output.

use crate::common::{HEADER_SIZE, MAX_WINDOW_SIZE, MSZIP_SIGNATURE};
use crate::inflate::Inflater;
use crate::{Result, XofError};
use byteorder::{ByteOrder, LittleEndian};

/// Size of the declared total that follows the header
pub const DECLARED_SIZE_FIELD: usize = 4;

/// Size of the per-frame size pair
pub const FRAME_HEADER_SIZE: usize = 4;

/// One framed chunk of compressed data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    /// Bytes this frame inflates to
    pub declared_uncompressed_size: u16,
    /// Bytes of payload, signature included
    pub declared_compressed_size: u16,
    /// The payload, signature included
    pub payload: Vec<u8>,
}

impl FrameRecord {
    /// Payload without the `"CK"` signature
    pub fn deflate_data(&self) -> &[u8] {
        &self.payload[MSZIP_SIGNATURE.len()..]
    }
}

/// Splits a compressed document into frames and inflates them
#[derive(Debug)]
pub struct FrameDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    frame_index: usize,
    declared_size: usize,
}

impl<'a> FrameDecoder<'a> {
    /// Validate the leading header and declared size of `data`
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let minimum = HEADER_SIZE + DECLARED_SIZE_FIELD;
        if data.len() < minimum {
            return Err(XofError::truncated(0, minimum, data.len()));
        }

        let declared_size = LittleEndian::read_u32(&data[HEADER_SIZE..minimum]) as usize;
        if declared_size < HEADER_SIZE {
            return Err(XofError::FrameSizeMismatch {
                frame: 0,
                expected: HEADER_SIZE,
                actual: declared_size,
            });
        }

        Ok(Self {
            data,
            pos: minimum,
            frame_index: 0,
            declared_size,
        })
    }

    /// Declared size of the decompressed document, header included
    pub fn declared_size(&self) -> usize {
        self.declared_size
    }

    /// The uncompressed leading header
    pub fn header(&self) -> &'a [u8] {
        &self.data[..HEADER_SIZE]
    }

    /// Read the next frame, or `None` once the input is exhausted
    pub fn next_frame(&mut self) -> Result<Option<FrameRecord>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }

        let available = self.data.len() - self.pos;
        if available < FRAME_HEADER_SIZE {
            return Err(XofError::truncated(
                self.pos as u64,
                FRAME_HEADER_SIZE,
                available,
            ));
        }

        let sizes = &self.data[self.pos..self.pos + FRAME_HEADER_SIZE];
        let declared_uncompressed_size = LittleEndian::read_u16(&sizes[0..2]);
        let declared_compressed_size = LittleEndian::read_u16(&sizes[2..4]);
        let payload_start = self.pos + FRAME_HEADER_SIZE;
        let compressed = declared_compressed_size as usize;

        if compressed > self.data.len() - payload_start {
            return Err(XofError::FrameSizeMismatch {
                frame: self.frame_index,
                expected: compressed,
                actual: self.data.len() - payload_start,
            });
        }

        let payload = &self.data[payload_start..payload_start + compressed];
        if payload.len() < MSZIP_SIGNATURE.len() || payload[..2] != MSZIP_SIGNATURE {
            return Err(XofError::Format {
                offset: payload_start as u64,
                reason: format!("frame {} is missing the CK signature", self.frame_index),
            });
        }

        log::trace!(
            "frame {} at byte {}: {} -> {} bytes",
            self.frame_index,
            self.pos,
            declared_compressed_size,
            declared_uncompressed_size
        );

        self.pos = payload_start + compressed;
        self.frame_index += 1;

        Ok(Some(FrameRecord {
            declared_uncompressed_size,
            declared_compressed_size,
            payload: payload.to_vec(),
        }))
    }

    /// Inflate every frame into one buffer starting with the header
    pub fn decompress(mut self) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(self.declared_size.min(self.data.len() * 16));
        output.extend_from_slice(self.header());

        while output.len() < self.declared_size {
            let frame_index = self.frame_index;
            let frame_offset = self.pos;
            let Some(frame) = self.next_frame()? else {
                break;
            };

            // The previous frame's output is the back-reference window
            let body = &output[HEADER_SIZE..];
            let dictionary = &body[body.len().saturating_sub(MAX_WINDOW_SIZE)..];
            let inflated = Inflater::with_dictionary(frame.deflate_data().to_vec(), dictionary)
                .inflate()
                .map_err(|e| offset_error(e, frame_offset + FRAME_HEADER_SIZE + 2))?;

            if inflated.len() != frame.declared_uncompressed_size as usize {
                return Err(XofError::FrameSizeMismatch {
                    frame: frame_index,
                    expected: frame.declared_uncompressed_size as usize,
                    actual: inflated.len(),
                });
            }
            output.extend_from_slice(&inflated);
        }

        if output.len() != self.declared_size {
            return Err(XofError::FrameSizeMismatch {
                frame: self.frame_index,
                expected: self.declared_size,
                actual: output.len(),
            });
        }

        log::debug!(
            "decompressed {} frames: {} -> {} bytes",
            self.frame_index,
            self.data.len(),
            output.len()
        );
        Ok(output)
    }
}

/// Convenience function to decompress an MSZip-framed document
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    FrameDecoder::new(data)?.decompress()
}

/// Offsets inside a frame are relative to its payload; make them absolute
fn offset_error(error: XofError, payload_offset: usize) -> XofError {
    let base = payload_offset as u64;
    match error {
        XofError::HuffmanDecode { bit_offset, reason } => XofError::HuffmanDecode {
            bit_offset: base * 8 + bit_offset,
            reason,
        },
        XofError::TruncatedStream {
            offset,
            needed,
            available,
        } => XofError::TruncatedStream {
            offset: base + offset,
            needed,
            available,
        },
        XofError::Protocol {
            offset,
            expected,
            found,
        } => XofError::Protocol {
            offset: base + offset,
            expected,
            found,
        },
        other => other,
    }
}
