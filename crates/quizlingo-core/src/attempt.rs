//! Async driver pairing a session with its collaborators.
//!
//! The [`SessionEngine`] is synchronous and knows nothing about storage. An
//! [`Attempt`] awaits the quiz fetch before the `Loading -> InProgress`
//! transition and the result submission after `InProgress -> Completed`,
//! and keeps track of whether the produced result was actually recorded.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{is_permanent, SessionError};
use crate::model::ResultSubmission;
use crate::session::{Phase, Progress, QuestionView, SessionEngine, SessionOptions};
use crate::traits::{QuizSource, ResultSink};

/// Configuration for quiz attempts.
#[derive(Debug, Clone)]
pub struct AttemptConfig {
    /// Options for every session created by the runner.
    pub session: SessionOptions,
    /// Retries on transient submission errors.
    pub max_submit_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self {
            session: SessionOptions::default(),
            max_submit_retries: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// What happened to a completed session's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Scored and persisted to history.
    Recorded(ResultSubmission),
    /// Scored, but the submission never reached history.
    Unrecorded {
        submission: ResultSubmission,
        error: SessionError,
    },
}

impl Outcome {
    pub fn submission(&self) -> &ResultSubmission {
        match self {
            Outcome::Recorded(submission) | Outcome::Unrecorded { submission, .. } => submission,
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, Outcome::Recorded(_))
    }
}

/// Result of answering one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Another question is waiting.
    Next,
    /// That was the last question.
    Finished(Outcome),
}

#[derive(Debug, Clone)]
enum RecordStatus {
    NotSubmitted,
    Recorded,
    Failed(SessionError),
}

/// Creates attempts that share one quiz source and one result sink.
pub struct QuizRunner {
    source: Arc<dyn QuizSource>,
    sink: Arc<dyn ResultSink>,
    config: AttemptConfig,
}

impl QuizRunner {
    pub fn new(
        source: Arc<dyn QuizSource>,
        sink: Arc<dyn ResultSink>,
        config: AttemptConfig,
    ) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }

    /// A fresh attempt in the `Loading` phase.
    pub fn attempt(&self) -> Attempt {
        Attempt {
            engine: SessionEngine::new(self.config.session.clone()),
            source: Arc::clone(&self.source),
            sink: Arc::clone(&self.sink),
            config: self.config.clone(),
            record: RecordStatus::NotSubmitted,
        }
    }

    /// Create an attempt and load quiz `quiz_id` into it.
    pub async fn begin(&self, quiz_id: u64) -> Result<Attempt, SessionError> {
        let mut attempt = self.attempt();
        attempt.load(quiz_id).await?;
        Ok(attempt)
    }
}

/// One respondent's pass through one quiz, including recording the result.
pub struct Attempt {
    engine: SessionEngine,
    source: Arc<dyn QuizSource>,
    sink: Arc<dyn ResultSink>,
    config: AttemptConfig,
    record: RecordStatus,
}

impl Attempt {
    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn current_question(&self) -> Option<QuestionView<'_>> {
        self.engine.current_question()
    }

    pub fn progress(&self) -> Option<Progress> {
        self.engine.progress()
    }

    /// Fetch and load quiz `quiz_id`.
    ///
    /// On failure the attempt stays in `Loading` and `load` may be called
    /// again. A quiz without questions completes and is recorded here.
    pub async fn load(&mut self, quiz_id: u64) -> Result<Phase, SessionError> {
        if self.engine.phase() != Phase::Loading {
            return Err(SessionError::InvalidTransition {
                phase: self.engine.phase(),
                detail: "cannot load a quiz".into(),
            });
        }

        let record = self.source.fetch_quiz(quiz_id).await.map_err(|e| {
            tracing::error!(
                source = self.source.name(),
                quiz = quiz_id,
                "quiz fetch failed: {e:#}"
            );
            SessionError::collaborator("quiz fetch", &e)
        })?;

        let phase = self.engine.load_record(quiz_id, record)?;
        if phase == Phase::Completed {
            self.record_result().await;
        }
        Ok(phase)
    }

    /// Answer the current question with the option shown at `position`.
    pub async fn choose(&mut self, position: usize) -> Result<Step, SessionError> {
        let phase = self.engine.choose(position)?;
        Ok(self.after_answer(phase).await)
    }

    /// Answer the current question with a raw result index.
    pub async fn submit_answer(&mut self, result_index: i64) -> Result<Step, SessionError> {
        let phase = self.engine.submit_answer(result_index)?;
        Ok(self.after_answer(phase).await)
    }

    /// The outcome, once the session is completed.
    pub fn outcome(&self) -> Option<Outcome> {
        let submission = self.engine.submission()?.clone();
        match &self.record {
            RecordStatus::Recorded => Some(Outcome::Recorded(submission)),
            RecordStatus::Failed(error) => Some(Outcome::Unrecorded {
                submission,
                error: error.clone(),
            }),
            RecordStatus::NotSubmitted => None,
        }
    }

    /// Submit an unrecorded result again. A result that is already recorded
    /// is not submitted twice.
    pub async fn retry_record(&mut self) -> Result<Outcome, SessionError> {
        if self.engine.phase() != Phase::Completed {
            return Err(SessionError::InvalidTransition {
                phase: self.engine.phase(),
                detail: "cannot record an unfinished session".into(),
            });
        }
        if !matches!(self.record, RecordStatus::Recorded) {
            self.record_result().await;
        }
        self.outcome().ok_or_else(|| SessionError::InvalidTransition {
            phase: self.engine.phase(),
            detail: "completed session has no submission".into(),
        })
    }

    async fn after_answer(&mut self, phase: Phase) -> Step {
        if phase != Phase::Completed {
            return Step::Next;
        }
        self.record_result().await;
        match self.outcome() {
            Some(outcome) => Step::Finished(outcome),
            None => Step::Next,
        }
    }

    async fn record_result(&mut self) {
        let Some(submission) = self.engine.submission().cloned() else {
            return;
        };

        let session = self.engine.id();
        let mut retry_delay = self.config.retry_delay;
        let mut last_error = None;
        for retry in 0..=self.config.max_submit_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(Duration::from_secs(30));
            }
            match self.sink.submit_result(&submission).await {
                Ok(()) => {
                    tracing::info!(%session, result = %submission.result_text, "result recorded");
                    self.record = RecordStatus::Recorded;
                    return;
                }
                Err(e) => {
                    let permanent = is_permanent(&e);
                    tracing::warn!(%session, retry, permanent, "result submission failed: {e:#}");
                    last_error = Some(e);
                    if permanent {
                        break;
                    }
                }
            }
        }

        let error = last_error.unwrap_or_else(|| anyhow::anyhow!("no submission attempt made"));
        tracing::error!(%session, "result scored but not recorded: {error:#}");
        self.record = RecordStatus::Failed(SessionError::collaborator("result submission", &error));
    }
}
