//! Configuration for outline editing.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default number of outline levels imported below the root list.
pub const DEFAULT_MAX_DEPTH: usize = 15;

/// Outline import and commit options.
///
/// Can be built in code or loaded from JSON, where missing fields take their
/// defaults:
///
/// ```
/// use pdf_mutate::OutlineOptions;
///
/// let options = OutlineOptions::from_json(r#"{ "strict": true }"#)?;
/// assert!(options.strict);
/// assert_eq!(options.max_depth, 15);
/// # Ok::<(), pdf_mutate::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineOptions {
    /// Deepest level whose children are imported (the root list is level 0).
    pub max_depth: usize,

    /// Fail on loops and duplicate nodes instead of truncating.
    pub strict: bool,
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineOptions {
    /// Create options with defaults: depth 15, lenient.
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }

    /// Set the maximum import depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }
}
