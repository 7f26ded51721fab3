//! PDF writing module.
//!
//! ```text
//! Document
//!     ↓
//! [PdfWriter] (header, reachable objects, xref table, trailer)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF bytes
//! ```
//!
//! ```
//! use pdf_mutate::Document;
//! use pdf_mutate::writer::{PdfWriter, PdfWriterConfig};
//!
//! let doc = Document::new();
//! let bytes = PdfWriter::with_config(&doc, PdfWriterConfig::default().with_prune_unreachable(false))
//!     .finish()?;
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! # Ok::<(), pdf_mutate::Error>(())
//! ```

mod object_serializer;
mod pdf_writer;

pub use object_serializer::ObjectSerializer;
pub use pdf_writer::{PdfWriter, PdfWriterConfig};
