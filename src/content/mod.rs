//! Content stream tokens and token filters.
//!
//! - [`tokenizer`]: byte-exact lexer for page and form XObject content streams
//! - [`filter`]: [`TokenFilter`] trait and [`TokenPipeline`] for rewriting them

pub mod filter;
pub mod token;
pub mod tokenizer;

pub use filter::{BaseTokenFilter, DynamicFilter, FilterOutcome, FnFilter, TokenFilter, TokenPipeline};
pub use token::{decode_name_escapes, Token, TokenType};
pub use tokenizer::{serialize, tokenize, Tokenizer};
