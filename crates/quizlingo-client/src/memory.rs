//! In-memory backend for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use quizlingo_core::error::BackendError;
use quizlingo_core::model::{QuizRecord, QuizSummary, ResultSubmission};
use quizlingo_core::traits::{HistorySource, QuizPublisher, QuizSource, ResultSink};

/// A backend that keeps everything in memory.
///
/// Counts calls and can be told to fail the next N fetches or submissions
/// with a transient network error, so attempt retry and "scored but not
/// recorded" paths can be exercised without a server.
#[derive(Default)]
pub struct MemoryStore {
    quizzes: Mutex<Vec<QuizRecord>>,
    results: Mutex<Vec<ResultSubmission>>,
    failing_fetches: AtomicU32,
    failing_submits: AtomicU32,
    fetch_calls: AtomicU32,
    submit_calls: AtomicU32,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with `quizzes`; ids are positions.
    pub fn with_quizzes(quizzes: Vec<QuizRecord>) -> Self {
        Self {
            quizzes: Mutex::new(quizzes),
            ..Self::default()
        }
    }

    /// Fail the next `n` quiz fetches.
    pub fn fail_next_fetches(&self, n: u32) {
        self.failing_fetches.store(n, Ordering::Relaxed);
    }

    /// Fail the next `n` result submissions.
    pub fn fail_next_submits(&self, n: u32) {
        self.failing_submits.store(n, Ordering::Relaxed);
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::Relaxed)
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::Relaxed)
    }

    /// Results recorded so far.
    pub fn recorded(&self) -> Vec<ResultSubmission> {
        locked(&self.results).clone()
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl QuizSource for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_quizzes(&self) -> anyhow::Result<Vec<QuizSummary>> {
        Ok(locked(&self.quizzes)
            .iter()
            .enumerate()
            .map(|(id, q)| QuizSummary {
                id: id as u64,
                title: q.title.clone(),
                author: q.author.clone().unwrap_or_else(|| "Unknown".into()),
            })
            .collect())
    }

    async fn fetch_quiz(&self, id: u64) -> anyhow::Result<QuizRecord> {
        self.fetch_calls.fetch_add(1, Ordering::Relaxed);
        if Self::take_failure(&self.failing_fetches) {
            return Err(BackendError::NetworkError("simulated fetch failure".into()).into());
        }
        let mut record = usize::try_from(id)
            .ok()
            .and_then(|i| locked(&self.quizzes).get(i).cloned())
            .ok_or_else(|| BackendError::NotFound(format!("quiz {id}")))?;
        record.id = Some(id);
        Ok(record)
    }
}

#[async_trait]
impl QuizPublisher for MemoryStore {
    async fn publish_quiz(&self, quiz: &QuizRecord) -> anyhow::Result<u64> {
        let mut quizzes = locked(&self.quizzes);
        quizzes.push(quiz.clone());
        Ok((quizzes.len() - 1) as u64)
    }
}

#[async_trait]
impl ResultSink for MemoryStore {
    async fn submit_result(&self, submission: &ResultSubmission) -> anyhow::Result<()> {
        self.submit_calls.fetch_add(1, Ordering::Relaxed);
        if Self::take_failure(&self.failing_submits) {
            return Err(BackendError::NetworkError("simulated submit failure".into()).into());
        }
        locked(&self.results).push(submission.clone());
        Ok(())
    }
}

#[async_trait]
impl HistorySource for MemoryStore {
    async fn history(&self) -> anyhow::Result<Vec<ResultSubmission>> {
        Ok(self.recorded())
    }
}
