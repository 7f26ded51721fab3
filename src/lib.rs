// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::len_without_is_empty)]

//! # pdf_mutate
//!
//! In-place mutation of PDF object graphs held in memory.
//!
//! ## Core Features
//!
//! - **Content stream filters**: byte-exact tokenizer plus a chainable
//!   [`TokenFilter`](content::TokenFilter) pipeline, with commit (rewrite the
//!   stream) and preview (return the bytes) modes
//! - **Emplace**: overwrite an indirect object with another's content while
//!   keeping its identity, so existing references see the new content
//! - **Outline editing**: import the bookmark tree into plain vectors, edit
//!   it, and commit it back with every link and count recomputed; loops and
//!   shared nodes are detected on the way in
//! - **Page helpers**: page list, blank pages, page boxes, content streams
//! - **Number trees** and a classic xref-table **writer**
//!
//! ## Quick Start
//!
//! ```
//! use pdf_mutate::content::{FilterOutcome, FnFilter, TokenPipeline};
//! use pdf_mutate::Document;
//!
//! let mut doc = Document::new();
//! let page = doc.add_blank_page((612.0, 792.0))?.reference();
//! let stream = doc.page_content_streams(page)?[0];
//! doc.write_stream_bytes(stream, &b"0.5 w 1 0 0 RG 0 0 m 100 100 l S"[..])?;
//!
//! // Turn the stroke colour into a fill colour
//! let mut recolor = FnFilter(|token: &pdf_mutate::content::Token| {
//!     if token.is_operator("RG") {
//!         FilterOutcome::Token(pdf_mutate::content::Token::operator("rg"))
//!     } else {
//!         FilterOutcome::Token(token.clone())
//!     }
//! });
//! let mut pipeline = TokenPipeline::single(&mut recolor);
//! doc.add_content_token_filter(page, &mut pipeline)?;
//! assert_eq!(doc.page_contents(page)?.as_ref(), b"0.5 w 1 0 0 rg 0 0 m 100 100 l S");
//! # Ok::<(), pdf_mutate::Error>(())
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: structural repairs (truncated
//! outlines, skipped page tree loops) at `warn`, mutations at `debug`.
//! Install any logger, e.g. `env_logger`, to see them.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Object model
pub mod document;
pub mod object;

// Mutation
pub mod content;
mod emplace;
pub mod number_tree;
pub mod outline;
pub mod page;

// Configuration
pub mod config;

// PDF writing
pub mod writer;

pub use config::OutlineOptions;
pub use document::{Document, DocumentId, ObjectHandle};
pub use error::{Error, Result};
pub use number_tree::NumberTree;
pub use object::{Dictionary, Object, ObjectRef};
pub use outline::{Outline, OutlineGuard, OutlineItem};
pub use page::PageBox;
