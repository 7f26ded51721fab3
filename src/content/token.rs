//! Content stream tokens.
//!
//! A [`Token`] is the raw byte span the tokenizer saw plus a type tag. The
//! raw bytes are authoritative: serializing a sequence of unmodified tokens
//! reproduces the source byte for byte, including whitespace and comments.

use crate::object::Object;
use bytes::Bytes;

/// Lexical category of a content stream token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum TokenType {
    /// `[`
    ArrayOpen,
    /// `]`
    ArrayClose,
    /// `{`
    BraceOpen,
    /// `}`
    BraceClose,
    /// `<<`
    DictOpen,
    /// `>>`
    DictClose,
    /// Integer number (e.g. `42`, `-7`)
    Integer,
    /// Real number (e.g. `144.0000`, `.5`)
    Real,
    /// Name including its leading slash (e.g. `/Im0`)
    Name,
    /// Literal `(...)` or hexadecimal `<...>` string
    String,
    /// `true` or `false`
    Boolean,
    /// `null`
    Null,
    /// Operator or any other bare keyword (e.g. `cm`, `Do`, `BI`)
    Word,
    /// Run of whitespace
    Space,
    /// `%` comment up to (not including) the end of line
    Comment,
    /// Binary data between `ID` and `EI`
    InlineImage,
}

/// An immutable lexical unit of a content stream.
///
/// Equality is structural: two tokens are equal when they have the same type
/// and the same raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    token_type: TokenType,
    raw: Bytes,
}

impl Token {
    /// Create a token from its type and raw bytes.
    ///
    /// The bytes are taken as given; no check is made that they lex to
    /// `token_type`.
    pub fn new(token_type: TokenType, raw: impl Into<Bytes>) -> Self {
        Self {
            token_type,
            raw: raw.into(),
        }
    }

    /// A single space.
    pub fn space() -> Self {
        Self::new(TokenType::Space, Bytes::from_static(b" "))
    }

    /// A newline.
    pub fn newline() -> Self {
        Self::new(TokenType::Space, Bytes::from_static(b"\n"))
    }

    /// An operator token, e.g. `Token::operator("Q")`.
    pub fn operator(op: &str) -> Self {
        Self::new(TokenType::Word, Bytes::copy_from_slice(op.as_bytes()))
    }

    /// The token's lexical category.
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// The exact bytes as they appear in the content stream.
    pub fn raw_value(&self) -> &[u8] {
        &self.raw
    }

    /// The raw bytes as a cheaply clonable buffer.
    pub fn raw_bytes(&self) -> &Bytes {
        &self.raw
    }

    /// Whether this is a number token.
    pub fn is_number(&self) -> bool {
        matches!(self.token_type, TokenType::Integer | TokenType::Real)
    }

    /// Whether this is the operator `op`.
    pub fn is_operator(&self, op: &str) -> bool {
        self.token_type == TokenType::Word && self.raw.as_ref() == op.as_bytes()
    }

    /// Parsed value for tokens that denote a PDF object.
    ///
    /// Names are returned without their slash and with `#xx` escapes decoded;
    /// strings are returned unescaped. Delimiters, operators, whitespace,
    /// comments and inline image data have no value.
    pub fn value(&self) -> Option<Object> {
        match self.token_type {
            TokenType::Integer => parse_integer(&self.raw).map(Object::Integer),
            TokenType::Real => parse_real(&self.raw).map(Object::Real),
            TokenType::Name => {
                let body = self.raw.get(1..)?;
                Some(Object::Name(decode_name_escapes(&String::from_utf8_lossy(body))))
            },
            TokenType::String => decode_string(&self.raw).map(Object::String),
            TokenType::Boolean => Some(Object::Boolean(self.raw.as_ref() == b"true")),
            TokenType::Null => Some(Object::Null),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token(TokenType::{:?}, b\"{}\")", self.token_type, self.raw.escape_ascii())
    }
}

fn parse_integer(raw: &[u8]) -> Option<i64> {
    let text = std::str::from_utf8(raw).ok()?;
    text.strip_prefix('+').unwrap_or(text).parse().ok()
}

/// Parse a PDF real, which may omit digits on either side of the point.
fn parse_real(raw: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(raw).ok()?;
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mut normalized = String::with_capacity(body.len() + 2);
    if body.starts_with('.') {
        normalized.push('0'); // .5 becomes 0.5
    }
    normalized.push_str(body);
    if body.ends_with('.') {
        normalized.push('0'); // 5. becomes 5.0
    }
    let value: f64 = normalized.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Decode #XX escape sequences in PDF names.
///
/// PDF Spec: ISO 32000-1:2008, Section 7.3.5 - Name Objects
///
/// ```
/// # use pdf_mutate::content::decode_name_escapes;
/// assert_eq!(decode_name_escapes("A#20B#23C"), "A B#C");
/// assert_eq!(decode_name_escapes("Im0"), "Im0");
/// assert_eq!(decode_name_escapes("A#"), "A#"); // Invalid sequence preserved
/// ```
pub fn decode_name_escapes(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '#' {
            result.push(ch);
            continue;
        }
        let hex1 = chars.next();
        let hex2 = chars.next();
        match (hex1, hex2) {
            (Some(h1), Some(h2)) => match (h1.to_digit(16), h2.to_digit(16)) {
                (Some(hi), Some(lo)) => result.push(((hi << 4) | lo) as u8 as char),
                _ => {
                    result.push('#');
                    result.push(h1);
                    result.push(h2);
                },
            },
            (Some(h1), None) => {
                result.push('#');
                result.push(h1);
            },
            _ => result.push('#'),
        }
    }

    result
}

/// Decode a raw literal `(...)` or hex `<...>` string token.
fn decode_string(raw: &[u8]) -> Option<Vec<u8>> {
    match raw.first()? {
        b'(' => Some(decode_literal(raw.get(1..raw.len().checked_sub(1)?)?)),
        b'<' => Some(decode_hex(raw.get(1..raw.len().checked_sub(1)?)?)),
        _ => None,
    }
}

/// Unescape the body of a literal string (PDF 32000-1 §7.3.4.2).
fn decode_literal(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let b = body[i];
        i += 1;
        match b {
            b'\\' if i < body.len() => {
                let esc = body[i];
                i += 1;
                match esc {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'0'..=b'7' => {
                        let mut value = (esc - b'0') as u32;
                        let mut digits = 1;
                        while digits < 3 && i < body.len() && (b'0'..=b'7').contains(&body[i]) {
                            value = value * 8 + (body[i] - b'0') as u32;
                            i += 1;
                            digits += 1;
                        }
                        out.push((value & 0xFF) as u8);
                    },
                    // Line continuation: backslash-EOL is dropped
                    b'\r' => {
                        if body.get(i) == Some(&b'\n') {
                            i += 1;
                        }
                    },
                    b'\n' => {},
                    other => out.push(other),
                }
            },
            // Unescaped EOL markers are read as a single LF
            b'\r' => {
                if body.get(i) == Some(&b'\n') {
                    i += 1;
                }
                out.push(b'\n');
            },
            other => out.push(other),
        }
    }
    out
}

/// Decode the body of a hex string; whitespace is ignored and an odd final
/// digit is padded with 0.
fn decode_hex(body: &[u8]) -> Vec<u8> {
    let digits: Vec<u8> = body
        .iter()
        .filter_map(|&c| (c as char).to_digit(16).map(|d| d as u8))
        .collect();
    digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}
