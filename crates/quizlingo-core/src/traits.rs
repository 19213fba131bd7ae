//! Collaborator traits for quiz storage and result history.
//!
//! These async traits are implemented by the `quizlingo-client` crate. The
//! session engine never calls them directly; the [`attempt`](crate::attempt)
//! driver does, at the load and completion boundaries only.

use async_trait::async_trait;

use crate::model::{QuizRecord, QuizSummary, ResultSubmission};

/// Where quizzes are fetched from.
#[async_trait]
pub trait QuizSource: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// List the quizzes available to take.
    async fn list_quizzes(&self) -> anyhow::Result<Vec<QuizSummary>>;

    /// Fetch one quiz definition.
    async fn fetch_quiz(&self, id: u64) -> anyhow::Result<QuizRecord>;
}

/// Where authored quizzes are stored.
#[async_trait]
pub trait QuizPublisher: Send + Sync {
    /// Store a new quiz and return its id.
    async fn publish_quiz(&self, quiz: &QuizRecord) -> anyhow::Result<u64>;
}

/// Where completed sessions are recorded.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn submit_result(&self, submission: &ResultSubmission) -> anyhow::Result<()>;
}

/// Where previously recorded results are read back from.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Recorded results, oldest first.
    async fn history(&self) -> anyhow::Result<Vec<ResultSubmission>>;
}
