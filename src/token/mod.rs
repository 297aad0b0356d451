//! Token streams for the two lexical encodings
//!
//! Text and binary documents share one grammar. Both scanners produce the
//! same [`Token`] values so the schema parser never needs to know which
//! encoding it is reading.

mod binary;
mod text;

pub use binary::BinaryTokenReader;
pub use text::TextTokenizer;

use crate::Result;
use std::fmt;

/// One lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier or keyword
    Name(String),
    /// Quoted string literal
    StringLit(String),
    /// Single integer
    Integer(u32),
    /// Single decimal or negative literal (text documents only)
    Float(f64),
    /// Binary run of integers
    IntegerList(Vec<u32>),
    /// Binary run of floats
    FloatList(Vec<f64>),
    /// 16-byte GUID in its in-memory layout
    Guid([u8; 16]),
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `<`
    OpenAngle,
    /// `>`
    CloseAngle,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,
}

impl Token {
    /// Whether this token only separates values
    pub fn is_separator(&self) -> bool {
        matches!(self, Token::Semicolon | Token::Comma)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => write!(f, "name '{name}'"),
            Token::StringLit(s) => write!(f, "string \"{s}\""),
            Token::Integer(n) => write!(f, "integer {n}"),
            Token::Float(x) => write!(f, "float {x}"),
            Token::IntegerList(list) => write!(f, "integer list of {}", list.len()),
            Token::FloatList(list) => write!(f, "float list of {}", list.len()),
            Token::Guid(guid) => write!(f, "GUID <{}>", format_guid(guid)),
            Token::OpenBrace => f.write_str("'{'"),
            Token::CloseBrace => f.write_str("'}'"),
            Token::OpenParen => f.write_str("'('"),
            Token::CloseParen => f.write_str("')'"),
            Token::OpenBracket => f.write_str("'['"),
            Token::CloseBracket => f.write_str("']'"),
            Token::OpenAngle => f.write_str("'<'"),
            Token::CloseAngle => f.write_str("'>'"),
            Token::Semicolon => f.write_str("';'"),
            Token::Comma => f.write_str("','"),
            Token::Dot => f.write_str("'.'"),
        }
    }
}

/// A forward-only producer of tokens
pub trait TokenSource {
    /// Next token, or `None` at the end of the document
    fn next_token(&mut self) -> Result<Option<Token>>;

    /// Offset of the next unread token (bytes for binary, characters for text)
    fn offset(&self) -> u64;
}

impl<S: TokenSource + ?Sized> TokenSource for Box<S> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        (**self).next_token()
    }

    fn offset(&self) -> u64 {
        (**self).offset()
    }
}

/// Format a GUID as `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX`
pub fn format_guid(guid: &[u8; 16]) -> String {
    let data1 = u32::from_le_bytes([guid[0], guid[1], guid[2], guid[3]]);
    let data2 = u16::from_le_bytes([guid[4], guid[5]]);
    let data3 = u16::from_le_bytes([guid[6], guid[7]]);
    format!(
        "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        data1,
        data2,
        data3,
        guid[8],
        guid[9],
        guid[10],
        guid[11],
        guid[12],
        guid[13],
        guid[14],
        guid[15]
    )
}

/// Parse `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX` into the in-memory layout
pub fn parse_guid(text: &str) -> Option<[u8; 16]> {
    let parts: Vec<&str> = text.split('-').collect();
    let widths = [8, 4, 4, 4, 12];
    if parts.len() != widths.len()
        || parts
            .iter()
            .zip(widths)
            .any(|(part, width)| part.len() != width || !part.bytes().all(|b| b.is_ascii_hexdigit()))
    {
        return None;
    }

    let mut guid = [0u8; 16];
    guid[0..4].copy_from_slice(&u32::from_str_radix(parts[0], 16).ok()?.to_le_bytes());
    guid[4..6].copy_from_slice(&u16::from_str_radix(parts[1], 16).ok()?.to_le_bytes());
    guid[6..8].copy_from_slice(&u16::from_str_radix(parts[2], 16).ok()?.to_le_bytes());
    let tail = format!("{}{}", parts[3], parts[4]);
    for (i, byte) in guid[8..16].iter_mut().enumerate() {
        *byte = u8::from_str_radix(&tail[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(guid)
}

/// Collect a whole stream, for tests and diagnostics
pub fn collect_tokens<S: TokenSource>(source: &mut S) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    while let Some(token) = source.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}
