//! Error taxonomy.
//!
//! Each kind has a distinct propagation policy (see the crate's
//! top-level docs): storage and model failures abort the turn,
//! template failures are logged and swallowed, and the rest become
//! tool-response strings the model is expected to react to.

use thiserror::Error;

/// Any persistence I/O failure. Aborts the current turn.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying backend rejected a read or write.
    #[error("storage io failed: {0}")]
    Io(String),

    /// A stored value could not be decoded.
    #[error("storage decode failed: {0}")]
    Decode(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors surfaced by the memory-context / pressure / executor layer.
///
/// `Template` and `Model` are host-visible (they abort the turn or are
/// swallowed, never shown to the model); the rest round-trip to the
/// model as a tool-response string.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MemoryError {
    /// A persistence call failed. Aborts the turn.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A pressure or primer template failed to render. The caller
    /// drops the warning (logs it) and continues the turn.
    #[error("template error: {0}")]
    Template(String),

    /// Malformed tool-call arguments. Returned to the model as a tool
    /// response; the model is expected to retry.
    #[error("argument error: {0}")]
    Argument(String),

    /// `Recall` would push the message queue over budget. Returned to
    /// the model as a tool response.
    #[error("memory overflow: request less messages per page or clear your memory")]
    MemoryOverflow,

    /// Archive search returned nothing.
    #[error("not found: no archived messages matched the query")]
    NotFound,

    /// The language-model call failed. Aborts the turn; the queue is
    /// left exactly as it was before the call.
    #[error("model error: {0}")]
    Model(String),
}

impl MemoryError {
    /// Render the error the way the model should see it in a tool
    /// response. Only meaningful for the model-visible variants
    /// (`Argument`, `MemoryOverflow`, `NotFound`); callers must not
    /// route `Storage`, `Template`, or `Model` through this path.
    pub fn as_tool_response(&self) -> String {
        self.to_string()
    }

    /// Whether this error must abort the current turn rather than
    /// being converted to a tool response.
    pub fn aborts_turn(&self) -> bool {
        matches!(self, MemoryError::Storage(_) | MemoryError::Model(_))
    }
}
