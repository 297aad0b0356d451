//! Binary token reader
//!
//! Each token starts with a little-endian u16 type code followed by a
//! fixed-format payload. Type keywords (`DWORD`, `array`, `template`, ...)
//! are surfaced as [`Token::Name`] so the stream matches the text encoding.

use super::{Token, TokenSource};
use crate::header::FloatWidth;
use crate::{Result, XofError};
use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::Encoding;

const TOKEN_NAME: u16 = 1;
const TOKEN_STRING: u16 = 2;
const TOKEN_INTEGER: u16 = 3;
const TOKEN_GUID: u16 = 5;
const TOKEN_INTEGER_LIST: u16 = 6;
const TOKEN_FLOAT_LIST: u16 = 7;
const TOKEN_OBRACE: u16 = 10;
const TOKEN_CBRACE: u16 = 11;
const TOKEN_OPAREN: u16 = 12;
const TOKEN_CPAREN: u16 = 13;
const TOKEN_OBRACKET: u16 = 14;
const TOKEN_CBRACKET: u16 = 15;
const TOKEN_OANGLE: u16 = 16;
const TOKEN_CANGLE: u16 = 17;
const TOKEN_DOT: u16 = 18;
const TOKEN_COMMA: u16 = 19;
const TOKEN_SEMICOLON: u16 = 20;
const TOKEN_TEMPLATE: u16 = 31;

/// Keyword tokens 40..=52, in code order, spelled as text documents spell them
const KEYWORDS: [&str; 13] = [
    "WORD", "DWORD", "FLOAT", "DOUBLE", "CHAR", "UCHAR", "SWORD", "SDWORD", "VOID", "STRING",
    "UNICODE", "CSTRING", "array",
];
const TOKEN_FIRST_KEYWORD: u16 = 40;

/// Forward-only scanner over a binary token buffer
#[derive(Debug)]
pub struct BinaryTokenReader<'a> {
    data: &'a [u8],
    pos: usize,
    float_width: FloatWidth,
    encoding: &'static Encoding,
}

impl<'a> BinaryTokenReader<'a> {
    /// Scan `data` (the body after the file header)
    pub fn new(data: &'a [u8], float_width: FloatWidth, encoding: &'static Encoding) -> Self {
        Self {
            data,
            pos: 0,
            float_width,
            encoding,
        }
    }

    /// Start scanning at `pos` instead of the beginning
    pub fn with_start(mut self, pos: usize) -> Self {
        self.pos = pos.min(self.data.len());
        self
    }

    /// Take the next `n` bytes
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.data.len() - self.pos;
        if n > available {
            return Err(XofError::truncated(self.pos as u64, n, available));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    /// A count followed by `count * width` bytes; checked before allocating
    fn read_counted(&mut self, width: usize) -> Result<(usize, &'a [u8])> {
        let count_offset = self.pos;
        let count = self.read_u32()? as usize;
        let size = count.checked_mul(width).ok_or_else(|| {
            XofError::truncated(count_offset as u64, usize::MAX, self.data.len() - self.pos)
        })?;
        Ok((count, self.take(size)?))
    }

    fn read_text(&mut self) -> Result<String> {
        let (_, bytes) = self.read_counted(1)?;
        let (text, _) = self.encoding.decode_without_bom_handling(bytes);
        Ok(text.into_owned())
    }

    /// Decode the token with type code `code`
    fn read_payload(&mut self, code: u16, start: usize) -> Result<Token> {
        let token = match code {
            TOKEN_NAME => Token::Name(self.read_text()?),
            TOKEN_STRING => {
                let text = self.read_text()?;
                // Strings carry their terminator as a trailing token code
                let terminator_offset = self.pos;
                let terminator = self.read_u16()?;
                if terminator != TOKEN_SEMICOLON && terminator != TOKEN_COMMA {
                    return Err(XofError::protocol(
                        terminator_offset as u64,
                        "';' or ',' after string",
                        format!("token code {terminator}"),
                    ));
                }
                Token::StringLit(text)
            }
            TOKEN_INTEGER => Token::Integer(self.read_u32()?),
            TOKEN_GUID => {
                let mut guid = [0u8; 16];
                guid.copy_from_slice(self.take(16)?);
                Token::Guid(guid)
            }
            TOKEN_INTEGER_LIST => {
                let (count, bytes) = self.read_counted(4)?;
                let mut values = vec![0u32; count];
                LittleEndian::read_u32_into(bytes, &mut values);
                Token::IntegerList(values)
            }
            TOKEN_FLOAT_LIST => {
                let width = self.float_width.bytes();
                let (_, bytes) = self.read_counted(width)?;
                let values = match self.float_width {
                    FloatWidth::F32 => bytes
                        .chunks_exact(4)
                        .map(|chunk| LittleEndian::read_f32(chunk) as f64)
                        .collect(),
                    FloatWidth::F64 => bytes.chunks_exact(8).map(LittleEndian::read_f64).collect(),
                };
                Token::FloatList(values)
            }
            TOKEN_OBRACE => Token::OpenBrace,
            TOKEN_CBRACE => Token::CloseBrace,
            TOKEN_OPAREN => Token::OpenParen,
            TOKEN_CPAREN => Token::CloseParen,
            TOKEN_OBRACKET => Token::OpenBracket,
            TOKEN_CBRACKET => Token::CloseBracket,
            TOKEN_OANGLE => Token::OpenAngle,
            TOKEN_CANGLE => Token::CloseAngle,
            TOKEN_DOT => Token::Dot,
            TOKEN_COMMA => Token::Comma,
            TOKEN_SEMICOLON => Token::Semicolon,
            TOKEN_TEMPLATE => Token::Name("template".to_string()),
            code if (TOKEN_FIRST_KEYWORD..TOKEN_FIRST_KEYWORD + KEYWORDS.len() as u16)
                .contains(&code) =>
            {
                Token::Name(KEYWORDS[(code - TOKEN_FIRST_KEYWORD) as usize].to_string())
            }
            _ => {
                return Err(XofError::protocol(
                    start as u64,
                    "binary token code",
                    format!("unknown token code {code}"),
                ))
            }
        };
        Ok(token)
    }
}

impl TokenSource for BinaryTokenReader<'_> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }

        let start = self.pos;
        let code = self.read_u16()?;
        self.read_payload(code, start).map(Some)
    }

    fn offset(&self) -> u64 {
        self.pos as u64
    }
}
