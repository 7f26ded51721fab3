//! Token filters for rewriting content streams.
//!
//! A [`TokenFilter`] sees every token of a content stream exactly once, in
//! order, and answers with a [`FilterOutcome`]: keep or substitute the token,
//! drop it, or expand it into several tokens. Filters are chained with a
//! [`TokenPipeline`]; the output of one filter is the input of the next.
//!
//! ```text
//! bytes ──tokenize──▶ filter 1 ──▶ filter 2 ──▶ … ──serialize──▶ bytes
//! ```
//!
//! The pipeline itself never touches a document. [`Document::filter_stream`]
//! writes the result back into a stream (commit mode), while
//! [`Document::preview_stream`] only returns it (preview mode).

use super::token::Token;
use super::tokenizer::Tokenizer;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::object::ObjectRef;
use std::any::Any;

/// What a filter does with one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Emit this token in place of the input (pass-through or substitution)
    Token(Token),
    /// Emit nothing
    Drop,
    /// Emit these tokens, in order, in place of the input
    Expand(Vec<Token>),
}

impl From<Token> for FilterOutcome {
    fn from(token: Token) -> Self {
        FilterOutcome::Token(token)
    }
}

impl From<Option<Token>> for FilterOutcome {
    fn from(token: Option<Token>) -> Self {
        token.map_or(FilterOutcome::Drop, FilterOutcome::Token)
    }
}

impl From<Vec<Token>> for FilterOutcome {
    fn from(tokens: Vec<Token>) -> Self {
        FilterOutcome::Expand(tokens)
    }
}

impl FilterOutcome {
    /// Convert a dynamically typed filter result.
    ///
    /// This is the entry point for filters whose result type is only known at
    /// runtime, such as callbacks from a scripting binding. Accepted shapes are
    /// `Token`, `Option<Token>`, `Vec<Token>`, `()` (drop) and `FilterOutcome`.
    ///
    /// # Errors
    ///
    /// [`Error::FilterContractViolation`] for any other type.
    pub fn from_dynamic(value: Box<dyn Any>) -> Result<Self> {
        let value = match value.downcast::<FilterOutcome>() {
            Ok(outcome) => return Ok(*outcome),
            Err(other) => other,
        };
        let value = match value.downcast::<Token>() {
            Ok(token) => return Ok(FilterOutcome::Token(*token)),
            Err(other) => other,
        };
        let value = match value.downcast::<Vec<Token>>() {
            Ok(tokens) => return Ok(FilterOutcome::Expand(*tokens)),
            Err(other) => other,
        };
        let value = match value.downcast::<Option<Token>>() {
            Ok(token) => return Ok((*token).into()),
            Err(other) => other,
        };
        if value.is::<()>() {
            return Ok(FilterOutcome::Drop);
        }
        Err(Error::FilterContractViolation(
            "handle_token must return a Token, a sequence of Tokens, or nothing".to_string(),
        ))
    }
}

/// Capability for rewriting content stream tokens.
///
/// `handle_token` has a default body that fails with
/// [`Error::UnimplementedCapability`]; a filter that does not override it is
/// abstract and aborts the pipeline on the first token instead of silently
/// passing tokens through.
///
/// # Example
///
/// ```
/// use pdf_mutate::content::{FilterOutcome, Token, TokenFilter, TokenType};
///
/// /// Collects every name used in the stream and drops all tokens.
/// #[derive(Default)]
/// struct CollectNames {
///     names: Vec<String>,
/// }
///
/// impl TokenFilter for CollectNames {
///     fn handle_token(&mut self, token: &Token) -> pdf_mutate::Result<FilterOutcome> {
///         if token.token_type() == TokenType::Name {
///             self.names.push(String::from_utf8_lossy(token.raw_value()).into_owned());
///         }
///         Ok(FilterOutcome::Drop)
///     }
/// }
/// ```
pub trait TokenFilter {
    /// Decide what to emit for `token`.
    fn handle_token(&mut self, token: &Token) -> Result<FilterOutcome> {
        let _ = token;
        Err(Error::UnimplementedCapability("TokenFilter::handle_token"))
    }

    /// Called once after the last token; returned tokens are emitted at the end.
    fn handle_eof(&mut self) -> Result<Vec<Token>> {
        Ok(Vec::new())
    }
}

/// A filter with no behaviour of its own.
///
/// Running it fails with [`Error::UnimplementedCapability`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseTokenFilter;

impl TokenFilter for BaseTokenFilter {}

/// Filter backed by a closure returning a [`FilterOutcome`].
pub struct FnFilter<F>(pub F);

impl<F> TokenFilter for FnFilter<F>
where
    F: FnMut(&Token) -> FilterOutcome,
{
    fn handle_token(&mut self, token: &Token) -> Result<FilterOutcome> {
        Ok((self.0)(token))
    }
}

/// Filter backed by a closure whose result is only typed at runtime.
///
/// Every result goes through [`FilterOutcome::from_dynamic`].
pub struct DynamicFilter<F>(pub F);

impl<F> TokenFilter for DynamicFilter<F>
where
    F: FnMut(&Token) -> Box<dyn Any>,
{
    fn handle_token(&mut self, token: &Token) -> Result<FilterOutcome> {
        FilterOutcome::from_dynamic((self.0)(token))
    }
}

/// An ordered chain of token filters.
#[derive(Default)]
pub struct TokenPipeline<'f> {
    filters: Vec<&'f mut dyn TokenFilter>,
}

impl<'f> TokenPipeline<'f> {
    /// Create an empty pipeline (which passes every token through).
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Pipeline consisting of a single filter.
    pub fn single(filter: &'f mut dyn TokenFilter) -> Self {
        Self::new().with_filter(filter)
    }

    /// Append a filter to the end of the chain.
    pub fn with_filter(mut self, filter: &'f mut dyn TokenFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append a filter to the end of the chain.
    pub fn push(&mut self, filter: &'f mut dyn TokenFilter) {
        self.filters.push(filter);
    }

    /// Number of filters in the chain.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run `source` through the chain, handing each output token to `sink`.
    ///
    /// Stops at the first error, whether it comes from the source or a filter.
    pub fn run<I>(&mut self, source: I, sink: &mut dyn FnMut(Token)) -> Result<()>
    where
        I: IntoIterator<Item = Result<Token>>,
    {
        for token in source {
            feed(&mut self.filters, token?, sink)?;
        }

        // Tokens flushed at end of input only pass through the filters after
        // the one that produced them.
        for i in 0..self.filters.len() {
            let (head, rest) = self.filters.split_at_mut(i + 1);
            for token in head[i].handle_eof()? {
                feed(rest, token, sink)?;
            }
        }
        Ok(())
    }

    /// Run a token sequence through the chain and collect the output tokens.
    pub fn process_tokens<I>(&mut self, source: I) -> Result<Vec<Token>>
    where
        I: IntoIterator<Item = Result<Token>>,
    {
        let mut out = Vec::new();
        self.run(source, &mut |token| out.push(token))?;
        Ok(out)
    }

    /// Tokenize `data`, run it through the chain and serialize the result.
    pub fn process(&mut self, data: impl Into<bytes::Bytes>) -> Result<Vec<u8>> {
        let data = data.into();
        let mut out = Vec::with_capacity(data.len());
        self.run(Tokenizer::new(data), &mut |token| {
            out.extend_from_slice(token.raw_value())
        })?;
        Ok(out)
    }
}

/// Push one token through `filters`, depth-first, so output order follows
/// input order even when filters expand tokens.
fn feed(
    filters: &mut [&mut dyn TokenFilter],
    token: Token,
    sink: &mut dyn FnMut(Token),
) -> Result<()> {
    let Some((first, rest)) = filters.split_first_mut() else {
        sink(token);
        return Ok(());
    };
    match first.handle_token(&token)? {
        FilterOutcome::Token(t) => feed(rest, t, sink),
        FilterOutcome::Drop => Ok(()),
        FilterOutcome::Expand(tokens) => {
            for t in tokens {
                feed(rest, t, sink)?;
            }
            Ok(())
        },
    }
}

impl Document {
    /// Rewrite a content stream in place (commit mode).
    ///
    /// The whole output is produced before anything is written, so an error
    /// from the tokenizer or any filter leaves the stream untouched.
    pub fn filter_stream(&mut self, stream: ObjectRef, pipeline: &mut TokenPipeline<'_>) -> Result<()> {
        let data = self.read_stream_bytes(stream)?;
        let original_len = data.len();
        let output = pipeline.process(data)?;
        log::debug!(
            "Filtered stream {}: {} -> {} bytes through {} filter(s)",
            stream,
            original_len,
            output.len(),
            pipeline.len()
        );
        self.write_stream_bytes(stream, output)
    }

    /// Run a content stream through `pipeline` and return the bytes (preview mode).
    ///
    /// The stream itself is never modified.
    pub fn preview_stream(&self, stream: ObjectRef, pipeline: &mut TokenPipeline<'_>) -> Result<Vec<u8>> {
        pipeline.process(self.read_stream_bytes(stream)?)
    }
}
