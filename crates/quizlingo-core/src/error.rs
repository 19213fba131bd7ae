//! Session and backend error types.
//!
//! Every session error is local to the session that raised it. None of them
//! leave the engine in a partially mutated state: a rejected call is a no-op.
//!
//! `BackendError` is defined here rather than in `quizlingo-client` so the
//! attempt driver can downcast collaborator errors and classify them for
//! retry decisions without string matching.

use thiserror::Error;

use crate::session::Phase;

/// Errors surfaced by the session engine and the attempt driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The call is not allowed in the session's current phase, or it
    /// addressed a question other than the current one.
    #[error("invalid transition while {phase}: {detail}")]
    InvalidTransition { phase: Phase, detail: String },

    /// The submitted result index does not name a result category.
    #[error("result index {index} out of range (quiz has {categories} result categories)")]
    InvalidResultIndex { index: i64, categories: usize },

    /// The chosen display position does not exist for the current question.
    #[error("question {question} has no option at display position {position}")]
    InvalidOption { question: usize, position: usize },

    /// The fetched quiz breaks a structural invariant.
    #[error("malformed quiz definition: {0}")]
    MalformedQuizDefinition(String),

    /// A quiz fetch or result submission failed.
    #[error("{operation} failed: {message}")]
    CollaboratorFailure {
        operation: &'static str,
        message: String,
    },
}

impl SessionError {
    /// Wrap a collaborator error, keeping its full context chain.
    pub fn collaborator(operation: &'static str, err: &anyhow::Error) -> Self {
        SessionError::CollaboratorFailure {
            operation,
            message: format!("{err:#}"),
        }
    }

    /// Returns `true` for usage errors that retrying can never fix.
    pub fn is_permanent(&self) -> bool {
        !matches!(self, SessionError::CollaboratorFailure { .. })
    }
}

/// Authoring rules a draft must satisfy before it can be published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthoringError {
    #[error("quiz title is empty")]
    EmptyTitle,

    #[error("at least {required} non-empty results are required, found {found}")]
    TooFewResults { required: usize, found: usize },

    #[error("quiz has no questions")]
    NoQuestions,
}

/// Errors that can occur when talking to a quiz backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend rejected the access token, or none was configured.
    #[error("authentication required: {0}")]
    Unauthorized(String),

    /// The requested quiz does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network or storage I/O error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl BackendError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        match self {
            BackendError::Unauthorized(_) | BackendError::NotFound(_) => true,
            BackendError::ApiError { status, .. } => (400..500).contains(status),
            BackendError::Timeout(_) | BackendError::NetworkError(_) => false,
        }
    }
}

/// Returns `true` if `err` wraps a permanent [`BackendError`].
pub fn is_permanent(err: &anyhow::Error) -> bool {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<BackendError>())
        .is_some_and(BackendError::is_permanent)
}
