//! TOML quiz draft parser.
//!
//! Loads authoring drafts from TOML files and directories, validates them,
//! and turns them into publishable [`QuizRecord`]s.
//!
//! A draft names its result slots up front and gives every question one
//! answer per slot, positionally:
//!
//! ```toml
//! [quiz]
//! title = "Which kitchen utensil are you?"
//! results = ["Spoon", "Fork", ""]
//!
//! [[questions]]
//! text = "Pick a dinner"
//! answers = ["Soup", "Pasta", ""]
//! ```
//!
//! Blank result slots are inactive and their answers are dropped.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::AuthoringError;
use crate::model::{OptionRecord, QuestionRecord, QuizRecord};

/// Minimum number of non-blank result slots a publishable quiz needs.
pub const MIN_RESULTS: usize = 2;

/// A quiz as written by its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizDraft {
    pub quiz: DraftHeader,
    #[serde(default)]
    pub questions: Vec<DraftQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftHeader {
    pub title: String,
    /// Result slot names; blank slots are inactive.
    #[serde(default)]
    pub results: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftQuestion {
    #[serde(default)]
    pub text: String,
    /// `answers[slot]` is this question's answer for result slot `slot`.
    #[serde(default)]
    pub answers: Vec<String>,
}

impl QuizDraft {
    /// `(slot, name)` for every non-blank result slot. Names are kept as
    /// written; whitespace only decides whether a slot is blank.
    pub fn active_results(&self) -> Vec<(usize, &str)> {
        self.quiz
            .results
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.trim().is_empty())
            .map(|(slot, name)| (slot, name.as_str()))
            .collect()
    }
}

/// Parse a single TOML file into a `QuizDraft`.
pub fn parse_draft(path: &Path) -> Result<QuizDraft> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz draft: {}", path.display()))?;

    parse_draft_str(&content, path)
}

/// Parse a TOML string into a `QuizDraft` (useful for testing).
pub fn parse_draft_str(content: &str, source_path: &Path) -> Result<QuizDraft> {
    toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))
}

/// Recursively load all `.toml` drafts from a directory.
pub fn load_draft_directory(dir: &Path) -> Result<Vec<QuizDraft>> {
    let mut drafts = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            drafts.extend(load_draft_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_draft(&path) {
                Ok(draft) => drafts.push(draft),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(drafts)
}

/// Apply the authoring rules and build the record to publish.
///
/// Each question gets one option per active result, in slot order, and
/// `result_index` is the position of that result among the active ones.
pub fn build_record(draft: &QuizDraft) -> Result<QuizRecord, AuthoringError> {
    let title = draft.quiz.title.trim();
    if title.is_empty() {
        return Err(AuthoringError::EmptyTitle);
    }

    let active = draft.active_results();
    if active.len() < MIN_RESULTS {
        return Err(AuthoringError::TooFewResults {
            required: MIN_RESULTS,
            found: active.len(),
        });
    }
    if draft.questions.is_empty() {
        return Err(AuthoringError::NoQuestions);
    }

    let questions = draft
        .questions
        .iter()
        .map(|q| QuestionRecord {
            text: q.text.clone(),
            options: active
                .iter()
                .enumerate()
                .map(|(index, &(slot, _))| OptionRecord {
                    text: q.answers.get(slot).cloned().unwrap_or_default(),
                    result_index: index as i64,
                })
                .collect(),
        })
        .collect();

    Ok(QuizRecord {
        id: None,
        title: title.to_string(),
        result_names: active.iter().map(|(_, name)| name.to_string()).collect(),
        questions,
        author: None,
    })
}

/// A warning from draft validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question index (if applicable).
    pub question: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Validate a draft for issues that do not block publishing.
pub fn validate_draft(draft: &QuizDraft) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let active = draft.active_results();

    // Duplicate result names
    let mut seen = HashSet::new();
    for (_, name) in &active {
        if !seen.insert(name.trim().to_lowercase()) {
            warnings.push(ValidationWarning {
                question: None,
                message: format!("duplicate result name: {name}"),
            });
        }
    }

    for (i, q) in draft.questions.iter().enumerate() {
        if q.text.trim().is_empty() {
            warnings.push(ValidationWarning {
                question: Some(i),
                message: "question text is empty".into(),
            });
        }

        for (slot, name) in &active {
            let answered = q.answers.get(*slot).is_some_and(|a| !a.trim().is_empty());
            if !answered {
                warnings.push(ValidationWarning {
                    question: Some(i),
                    message: format!("no answer for result \"{name}\""),
                });
            }
        }

        if q.answers.len() > draft.quiz.results.len() {
            warnings.push(ValidationWarning {
                question: Some(i),
                message: format!(
                    "{} answers given but only {} result slots exist; extras are ignored",
                    q.answers.len(),
                    draft.quiz.results.len()
                ),
            });
        }
    }

    warnings
}
