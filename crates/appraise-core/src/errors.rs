//! Error types for the evaluation pipeline.

use crate::context::CategoryKind;
use crate::providers::llm::UpstreamError;

/// Errors surfaced by the evaluation pipeline.
///
/// A parser miss is deliberately absent here: a response without a
/// `Total Score:` line is a valid outcome, reported through
/// [`crate::workflow::Workflow::is_valid_pending`].
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// Malformed prompt inputs or configuration (empty statement, empty
    /// example set, out-of-range sampling parameters, unreadable config).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A category key that the grading catalog does not know.
    #[error("unknown {kind} category: {key:?}")]
    UnknownCategory { kind: CategoryKind, key: String },

    /// The completion call failed; the workflow is left idle.
    #[error("upstream completion failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("no pending evaluation")]
    NoPendingEvaluation,

    /// The pending evaluation cannot be committed (e.g. the model gave no score).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The durable flush failed. The in-memory table keeps the appended row.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The backing table exists but its column set does not match the schema.
    #[error("corrupt table: {0}")]
    CorruptTable(String),

    #[error("export failed: {0}")]
    Export(String),
}

impl EvalError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    /// True for errors that signal a caller logic error against an idle workflow.
    pub fn is_idle_signal(&self) -> bool {
        matches!(self, Self::NothingToCommit | Self::NoPendingEvaluation)
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
