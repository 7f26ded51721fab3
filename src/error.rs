//! Error types for the PDF mutation library.
//!
//! This module defines all error types that can occur while rewriting content
//! streams, emplacing objects and reconciling outlines.

use crate::object::ObjectRef;

/// Result type alias for PDF library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF mutation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Content stream could not be tokenized at a specific byte offset
    #[error("Failed to parse content stream at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where the error occurred
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// A token filter produced something other than a token, nothing,
    /// or a sequence of tokens
    #[error("Token filter contract violation: {0}")]
    FilterContractViolation(String),

    /// A capability was invoked without a concrete implementation
    #[error("Capability not implemented: {0}")]
    UnimplementedCapability(&'static str),

    /// Two objects involved in one operation belong to different documents
    #[error("Objects must have the same owner: {destination} and {source_ref} belong to different documents")]
    OwnershipMismatch {
        /// Object being written to
        destination: ObjectRef,
        /// Object being read from
        source_ref: ObjectRef,
    },

    /// Structural defect (loop or duplicate) in a linked object structure
    #[error("Structural error: {0}")]
    StructuralError(String),

    /// Referenced object does not exist in the document
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Stream payload is encoded with a filter this library does not decode
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Argument outside the range an operation accepts
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an [`Error::InvalidObjectType`].
    pub(crate) fn wrong_type(expected: &str, found: &str) -> Self {
        Error::InvalidObjectType {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
