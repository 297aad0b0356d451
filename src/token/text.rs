//! Text tokenizer
//!
//! The whole document is decoded up front (Shift-JIS by default) and then
//! scanned character by character.

use super::{parse_guid, Token, TokenSource};
use crate::{Result, XofError};
use encoding_rs::Encoding;

/// Forward-only scanner over a text document body
#[derive(Debug)]
pub struct TextTokenizer {
    chars: Vec<char>,
    pos: usize,
}

impl TextTokenizer {
    /// Decode `data` with `encoding` and scan the result
    pub fn new(data: &[u8], encoding: &'static Encoding) -> Self {
        let (text, _) = encoding.decode_without_bom_handling(data);
        Self::from_text(&text)
    }

    /// Scan already-decoded text
    pub fn from_text(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    /// Skip whitespace and `//`, `#` and `/* */` comments
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() || c == '\0' => self.pos += 1,
                (Some('/'), Some('/')) | (Some('#'), _) => {
                    while let Some(c) = self.peek() {
                        self.pos += 1;
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => {
                                return Err(XofError::truncated(start as u64, 2, 0));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_string(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.pos += 1;
                    return Ok(Token::StringLit(value));
                }
                Some(c) => {
                    value.push(c);
                    self.pos += 1;
                }
                None => return Err(XofError::truncated(start as u64, 1, 0)),
            }
        }
    }

    /// `<` starts a GUID when a well-formed one follows, otherwise it is punctuation
    fn read_angle(&mut self) -> Token {
        let close = self.chars[self.pos..]
            .iter()
            .take(40)
            .position(|&c| c == '>');
        if let Some(close) = close {
            let inner: String = self.chars[self.pos + 1..self.pos + close].iter().collect();
            if let Some(guid) = parse_guid(inner.trim()) {
                self.pos += close + 1;
                return Token::Guid(guid);
            }
        }
        self.pos += 1;
        Token::OpenAngle
    }

    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;
        let mut is_float = false;

        if matches!(self.peek(), Some('-') | Some('+')) {
            self.pos += 1;
        }
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' => self.pos += 1,
                '.' => {
                    is_float = true;
                    self.pos += 1;
                }
                'e' | 'E' if matches!(self.peek_at(1), Some('0'..='9' | '-' | '+')) => {
                    is_float = true;
                    self.pos += 2;
                }
                _ => break,
            }
        }

        let literal: String = self.chars[start..self.pos].iter().collect();
        let invalid = || XofError::protocol(start as u64, "numeric literal", literal.clone());
        if is_float {
            return literal.parse::<f64>().map(Token::Float).map_err(|_| invalid());
        }

        // Unsigned tokens cannot hold a sign; negative literals become floats
        match literal.parse::<i64>() {
            Ok(n) if (0..=u32::MAX as i64).contains(&n) => Ok(Token::Integer(n as u32)),
            Ok(n) if n >= i32::MIN as i64 => Ok(Token::Float(n as f64)),
            _ => Err(invalid()),
        }
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.pos;
        self.pos += 1;
        while let Some(c) = self.peek() {
            if is_identifier_char(c) || ((c == '-' || c == '.') && self.continues_identifier()) {
                self.pos += 1;
            } else {
                break;
            }
        }
        Token::Name(self.chars[start..self.pos].iter().collect())
    }

    /// Interior `-` and `.` only belong to a name when another name character follows
    fn continues_identifier(&self) -> bool {
        self.peek_at(1).is_some_and(is_identifier_char)
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl TokenSource for TextTokenizer {
    fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_trivia()?;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let punctuation = match c {
            '{' => Some(Token::OpenBrace),
            '}' => Some(Token::CloseBrace),
            '(' => Some(Token::OpenParen),
            ')' => Some(Token::CloseParen),
            '[' => Some(Token::OpenBracket),
            ']' => Some(Token::CloseBracket),
            '>' => Some(Token::CloseAngle),
            ';' => Some(Token::Semicolon),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = punctuation {
            self.pos += 1;
            return Ok(Some(token));
        }

        let next = self.peek_at(1);
        let token = match c {
            '"' => self.read_string()?,
            '<' => self.read_angle(),
            '0'..='9' => self.read_number()?,
            '-' | '+' if next.is_some_and(|n| n.is_ascii_digit() || n == '.') => self.read_number()?,
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => self.read_number()?,
            '.' => {
                self.pos += 1;
                Token::Dot
            }
            c if is_identifier_char(c) => self.read_identifier(),
            c => {
                return Err(XofError::protocol(
                    self.pos as u64,
                    "token",
                    format!("unexpected character {c:?}"),
                ))
            }
        };
        Ok(Some(token))
    }

    fn offset(&self) -> u64 {
        self.pos as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::collect_tokens;
    use encoding_rs::SHIFT_JIS;

    fn tokens(text: &str) -> Vec<Token> {
        collect_tokens(&mut TextTokenizer::from_text(text)).unwrap()
    }

    fn name(s: &str) -> Token {
        Token::Name(s.to_string())
    }

    #[test]
    fn test_mesh_fragment() {
        assert_eq!(
            tokens("Mesh body {\n 3;\n 1.0;-2.5;0.000000;,\n}"),
            vec![
                name("Mesh"),
                name("body"),
                Token::OpenBrace,
                Token::Integer(3),
                Token::Semicolon,
                Token::Float(1.0),
                Token::Semicolon,
                Token::Float(-2.5),
                Token::Semicolon,
                Token::Float(0.0),
                Token::Semicolon,
                Token::Comma,
                Token::CloseBrace,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            tokens("// line\n# hash\n/* block\n comment */ Header"),
            vec![name("Header")]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let err = collect_tokens(&mut TextTokenizer::from_text("a /* never closed")).unwrap_err();
        assert!(matches!(err, XofError::TruncatedStream { offset: 2, .. }));
    }

    #[test]
    fn test_template_definition() {
        assert_eq!(
            tokens("template Vector {\n <3D82AB5E-62DA-11cf-AB39-0020AF71E433>\n FLOAT x;\n array DWORD idx[n];\n [...]\n}"),
            vec![
                name("template"),
                name("Vector"),
                Token::OpenBrace,
                Token::Guid(parse_guid("3D82AB5E-62DA-11CF-AB39-0020AF71E433").unwrap()),
                name("FLOAT"),
                name("x"),
                Token::Semicolon,
                name("array"),
                name("DWORD"),
                name("idx"),
                Token::OpenBracket,
                name("n"),
                Token::CloseBracket,
                Token::Semicolon,
                Token::OpenBracket,
                Token::Dot,
                Token::Dot,
                Token::Dot,
                Token::CloseBracket,
                Token::CloseBrace,
            ]
        );
    }

    #[test]
    fn test_angle_without_guid() {
        assert_eq!(
            tokens("<x>"),
            vec![Token::OpenAngle, name("x"), Token::CloseAngle]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            tokens("\"face.bmp*face.sph\";"),
            vec![
                Token::StringLit("face.bmp*face.sph".to_string()),
                Token::Semicolon
            ]
        );
        let err = collect_tokens(&mut TextTokenizer::from_text("\"open")).unwrap_err();
        assert!(matches!(err, XofError::TruncatedStream { .. }));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("-1 +2 .5 1e3 4294967295"),
            vec![
                Token::Float(-1.0),
                Token::Integer(2),
                Token::Float(0.5),
                Token::Float(1000.0),
                Token::Integer(u32::MAX),
            ]
        );
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(tokens("-2147483648"), vec![Token::Float(-2147483648.0)]);
        assert!(collect_tokens(&mut TextTokenizer::from_text("4294967296")).is_err());
        assert!(collect_tokens(&mut TextTokenizer::from_text("-2147483649")).is_err());
    }

    #[test]
    fn test_identifier_with_dash() {
        assert_eq!(tokens("Cube-1 x_2"), vec![name("Cube-1"), name("x_2")]);
    }

    #[test]
    fn test_shift_jis_document() {
        // "顔" in Shift-JIS inside a string
        let data = [b'"', 0x8A, 0xE7, b'"'];
        let mut tokenizer = TextTokenizer::new(&data, SHIFT_JIS);
        assert_eq!(
            collect_tokens(&mut tokenizer).unwrap(),
            vec![Token::StringLit("顔".to_string())]
        );
    }

    #[test]
    fn test_stray_character() {
        let err = collect_tokens(&mut TextTokenizer::from_text("Mesh @")).unwrap_err();
        assert!(matches!(err, XofError::Protocol { offset: 5, .. }));
    }
}
