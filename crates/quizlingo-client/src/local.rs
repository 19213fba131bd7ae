//! Local JSON data directory backend.
//!
//! Keeps quizzes in `quizzes.json` and results in `results.json`, both as
//! pretty-printed JSON arrays. A quiz's id is its position in the array.
//! Results are tagged with the store's username and history only returns
//! that user's rows.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use quizlingo_core::error::BackendError;
use quizlingo_core::model::{QuizRecord, QuizSummary, ResultSubmission};
use quizlingo_core::traits::{HistorySource, QuizPublisher, QuizSource, ResultSink};

const QUIZZES_FILE: &str = "quizzes.json";
const RESULTS_FILE: &str = "results.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredResult {
    #[serde(flatten)]
    submission: ResultSubmission,
    username: String,
}

/// File-backed store for one local user.
pub struct LocalStore {
    data_dir: PathBuf,
    username: String,
    lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(data_dir: impl Into<PathBuf>, username: &str) -> Self {
        Self {
            data_dir: data_dir.into(),
            username: username.to_string(),
            lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("local store lock poisoned"))?;
        f()
    }

    fn read<T: DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        let path = self.data_dir.join(file);
        let json = serde_json::to_string_pretty(value).context("failed to serialize store")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

#[async_trait]
impl QuizSource for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn list_quizzes(&self) -> anyhow::Result<Vec<QuizSummary>> {
        let quizzes: Vec<QuizRecord> = self.with_lock(|| self.read(QUIZZES_FILE))?;
        Ok(quizzes
            .into_iter()
            .enumerate()
            .map(|(id, quiz)| QuizSummary {
                id: id as u64,
                title: quiz.title,
                author: quiz.author.unwrap_or_else(|| "Unknown".into()),
            })
            .collect())
    }

    async fn fetch_quiz(&self, id: u64) -> anyhow::Result<QuizRecord> {
        let quizzes: Vec<QuizRecord> = self.with_lock(|| self.read(QUIZZES_FILE))?;
        let mut record = usize::try_from(id)
            .ok()
            .and_then(|i| quizzes.into_iter().nth(i))
            .ok_or_else(|| BackendError::NotFound(format!("quiz {id}")))?;
        record.id = Some(id);
        Ok(record)
    }
}

#[async_trait]
impl QuizPublisher for LocalStore {
    async fn publish_quiz(&self, quiz: &QuizRecord) -> anyhow::Result<u64> {
        self.with_lock(|| {
            let mut quizzes: Vec<QuizRecord> = self.read(QUIZZES_FILE)?;
            let mut stored = quiz.clone();
            stored.id = None;
            stored.author = Some(self.username.clone());
            quizzes.push(stored);
            self.write(QUIZZES_FILE, &quizzes)?;
            let id = (quizzes.len() - 1) as u64;
            tracing::info!(id, title = %quiz.title, "quiz published");
            Ok(id)
        })
    }
}

#[async_trait]
impl ResultSink for LocalStore {
    async fn submit_result(&self, submission: &ResultSubmission) -> anyhow::Result<()> {
        self.with_lock(|| {
            let mut results: Vec<StoredResult> = self.read(RESULTS_FILE)?;
            results.push(StoredResult {
                submission: submission.clone(),
                username: self.username.clone(),
            });
            self.write(RESULTS_FILE, &results)
        })
    }
}

#[async_trait]
impl HistorySource for LocalStore {
    async fn history(&self) -> anyhow::Result<Vec<ResultSubmission>> {
        let results: Vec<StoredResult> = self.with_lock(|| self.read(RESULTS_FILE))?;
        Ok(results
            .into_iter()
            .filter(|r| r.username == self.username)
            .map(|r| r.submission)
            .collect())
    }
}
