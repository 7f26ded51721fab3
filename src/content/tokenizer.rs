//! Content stream tokenizer.
//!
//! Unlike an object parser, this lexer keeps everything: whitespace runs and
//! comments become tokens of their own, so that concatenating the raw bytes
//! of every token gives back the original stream exactly.
//!
//! # Token rules
//!
//! - Whitespace (space, \t, \r, \n, \0, \f) runs → `Space`
//! - `%` up to end of line → `Comment`
//! - `[ ] { } << >>` → delimiters
//! - `(...)` with balanced parentheses and escapes, `<hex>` → `String`
//! - `/Name` → `Name`
//! - Any other run of regular characters is classified as `Integer`, `Real`,
//!   `Boolean`, `Null` or `Word`
//! - After the `ID` operator, one whitespace byte and the data up to the
//!   whitespace before `EI` → `Space`, `InlineImage`

use super::token::{Token, TokenType};
use crate::error::{Error, Result};
use bytes::Bytes;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, digit0, digit1, one_of},
    combinator::{all_consuming, opt, recognize, value},
    sequence::{delimited, pair, preceded, tuple},
};

/// PDF whitespace characters (PDF 32000-1 Table 1).
fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters (PDF 32000-1 Table 2).
fn is_delimiter(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

fn space(input: &[u8]) -> IResult<&[u8], TokenType> {
    let (rest, _) = take_while1(is_whitespace)(input)?;
    Ok((rest, TokenType::Space))
}

fn comment(input: &[u8]) -> IResult<&[u8], TokenType> {
    let (rest, _) = preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n'))(input)?;
    Ok((rest, TokenType::Comment))
}

/// Delimiters. `<<` and `>>` must be tried before the single-character forms.
fn delimiter(input: &[u8]) -> IResult<&[u8], TokenType> {
    alt((
        value(TokenType::DictOpen, tag(b"<<")),
        value(TokenType::DictClose, tag(b">>")),
        value(TokenType::ArrayOpen, char('[')),
        value(TokenType::ArrayClose, char(']')),
        value(TokenType::BraceOpen, char('{')),
        value(TokenType::BraceClose, char('}')),
    ))(input)
}

fn hex_string(input: &[u8]) -> IResult<&[u8], TokenType> {
    let (rest, _) = delimited(
        char('<'),
        take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c)),
        char('>'),
    )(input)?;
    Ok((rest, TokenType::String))
}

/// Literal string with balanced parentheses (PDF 32000-1 §7.3.4.2).
///
/// Escaped parentheses do not count towards the nesting depth.
fn literal_string(input: &[u8]) -> IResult<&[u8], TokenType> {
    let (body, _) = char('(')(input)?;
    let mut depth = 1;
    let mut pos = 0;

    while depth > 0 && pos < body.len() {
        match body[pos] {
            b'\\' => pos += 2,
            b'(' => {
                depth += 1;
                pos += 1;
            },
            b')' => {
                depth -= 1;
                pos += 1;
            },
            _ => pos += 1,
        }
    }

    if depth != 0 || pos > body.len() {
        return Err(nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }
    Ok((&body[pos..], TokenType::String))
}

fn name(input: &[u8]) -> IResult<&[u8], TokenType> {
    let (rest, _) = preceded(char('/'), take_while(is_regular))(input)?;
    Ok((rest, TokenType::Name))
}

/// Integer: optional sign and digits.
fn integer(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(pair(opt(one_of("+-")), digit1))(input)
}

/// Real: optional sign, digits with a point, digits optional on one side.
fn real(input: &[u8]) -> IResult<&[u8], &[u8]> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(tuple((digit1, char('.'), digit0))),
            recognize(pair(char('.'), digit1)),
        )),
    )))(input)
}

/// Run of regular characters: number, keyword or operator.
fn regular(input: &[u8]) -> IResult<&[u8], TokenType> {
    let (rest, run) = take_while1(is_regular)(input)?;
    let token_type = if all_consuming(integer)(run).is_ok() {
        TokenType::Integer
    } else if all_consuming(real)(run).is_ok() {
        TokenType::Real
    } else {
        match run {
            b"true" | b"false" => TokenType::Boolean,
            b"null" => TokenType::Null,
            _ => TokenType::Word,
        }
    };
    Ok((rest, token_type))
}

/// Lex one token from the start of `input`.
fn token(input: &[u8]) -> IResult<&[u8], TokenType> {
    alt((space, comment, delimiter, literal_string, hex_string, name, regular))(input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineImageState {
    None,
    /// `ID` was just emitted; the next byte must be a single whitespace.
    AfterId,
    /// Binary image data starts here and runs until `EI`.
    Data,
}

/// Lazy, byte-exact tokenizer over a content stream.
///
/// Yields `Err` once and then stops if the input cannot be tokenized.
///
/// # Example
///
/// ```
/// use pdf_mutate::content::{Tokenizer, TokenType};
///
/// let types: Vec<TokenType> = Tokenizer::new(&b"/Im0 Do"[..])
///     .map(|t| t.map(|t| t.token_type()))
///     .collect::<Result<_, _>>()?;
/// assert_eq!(types, vec![TokenType::Name, TokenType::Space, TokenType::Word]);
/// # Ok::<(), pdf_mutate::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Tokenizer {
    data: Bytes,
    pos: usize,
    inline_image: InlineImageState,
    failed: bool,
}

impl Tokenizer {
    /// Create a tokenizer over `data`. Token spans share the buffer.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            inline_image: InlineImageState::None,
            failed: false,
        }
    }

    /// Byte offset of the next token.
    pub fn offset(&self) -> usize {
        self.pos
    }

    fn fail(&mut self, offset: usize, reason: impl Into<String>) -> Result<Token> {
        self.failed = true;
        Err(Error::ParseError {
            offset,
            reason: reason.into(),
        })
    }

    fn emit(&mut self, token_type: TokenType, end: usize) -> Token {
        let token = Token::new(token_type, self.data.slice(self.pos..end));
        self.pos = end;
        token
    }

    /// Find where inline image data ends: the whitespace before an `EI`
    /// that is itself followed by whitespace, a delimiter or end of data.
    fn find_inline_image_end(&self) -> Option<usize> {
        let data = &self.data[..];
        let mut i = self.pos;
        while i < data.len() {
            if is_whitespace(data[i])
                && data.get(i + 1..i + 3) == Some(&b"EI"[..])
                && data.get(i + 3).map_or(true, |&c| !is_regular(c))
            {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    fn next_token(&mut self) -> Result<Token> {
        match self.inline_image {
            InlineImageState::AfterId => {
                if !is_whitespace(self.data[self.pos]) {
                    return self.fail(self.pos, "expected whitespace after ID");
                }
                self.inline_image = InlineImageState::Data;
                let end = self.pos + 1;
                return Ok(self.emit(TokenType::Space, end));
            },
            InlineImageState::Data => {
                self.inline_image = InlineImageState::None;
                let Some(end) = self.find_inline_image_end() else {
                    return self.fail(self.pos, "inline image data without EI");
                };
                if end > self.pos {
                    return Ok(self.emit(TokenType::InlineImage, end));
                }
            },
            InlineImageState::None => {},
        }

        let input = &self.data[self.pos..];
        match token(input) {
            Ok((rest, token_type)) => {
                let end = self.data.len() - rest.len();
                let token = self.emit(token_type, end);
                if token.is_operator("ID") {
                    self.inline_image = InlineImageState::AfterId;
                }
                Ok(token)
            },
            Err(_) => {
                let reason = match input[0] {
                    b'(' => "unbalanced parenthesis in literal string",
                    b'<' => "malformed hexadecimal string",
                    b')' => "unexpected ')'",
                    b'>' => "unexpected '>'",
                    _ => "unrecognized token",
                };
                let offset = self.pos;
                self.fail(offset, reason)
            },
        }
    }
}

impl Iterator for Tokenizer {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.pos >= self.data.len() {
            if self.inline_image != InlineImageState::None {
                let offset = self.pos;
                return Some(self.fail(offset, "content stream ends inside inline image"));
            }
            return None;
        }
        Some(self.next_token())
    }
}

/// Tokenize a whole content stream.
pub fn tokenize(data: impl Into<Bytes>) -> Result<Vec<Token>> {
    Tokenizer::new(data).collect()
}

/// Inverse of [`tokenize`]: concatenate the raw bytes of `tokens`.
pub fn serialize<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> Vec<u8> {
    let mut out = Vec::new();
    for token in tokens {
        out.extend_from_slice(token.raw_value());
    }
    out
}
