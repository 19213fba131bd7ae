//! Core data model types for quizlingo.
//!
//! Two layers live here: the serde wire records exchanged with collaborators
//! (`QuizRecord` and friends) and the validated, immutable
//! [`QuizDefinition`] that a session owns once a quiz is loaded.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// A quiz as fetched from (or published to) a quiz store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
    /// Store-assigned identifier. Absent in bodies where the id is the
    /// request path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Quiz title.
    pub title: String,
    /// `result_names[i]` is the display name of result category `i`.
    pub result_names: Vec<String>,
    /// Questions in presentation order.
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
    /// Who published the quiz. Ignored by the session engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// A question inside a [`QuizRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub text: String,
    #[serde(default)]
    pub options: Vec<OptionRecord>,
}

/// An answer option inside a [`QuestionRecord`].
///
/// `result_index` is signed on the wire so that out-of-range values can be
/// reported instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub text: String,
    pub result_index: i64,
}

/// One row of a quiz listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: u64,
    pub title: String,
    #[serde(default = "unknown_author")]
    pub author: String,
}

fn unknown_author() -> String {
    "Unknown".to_string()
}

/// The record emitted once per completed session and read back as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSubmission {
    pub quiz_title: String,
    pub result_text: String,
    /// Calendar date formatted for display, e.g. `19.10.2026`.
    pub date: String,
}

// ---------------------------------------------------------------------------
// Validated definition
// ---------------------------------------------------------------------------

/// One possible outcome of a quiz. `index` is its stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCategory {
    pub index: usize,
    pub name: String,
}

/// An answer option. `result_index` always names an existing category of
/// the owning quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub result_index: usize,
}

/// A question with its options in authored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<AnswerOption>,
}

/// A structurally valid quiz, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDefinition {
    id: u64,
    title: String,
    result_categories: Vec<ResultCategory>,
    questions: Vec<Question>,
}

impl QuizDefinition {
    /// Build a definition from a fetched record.
    ///
    /// Rejects quizzes without result categories, blank category names,
    /// questions without options, and options whose `result_index` does not
    /// name a category. Questions with fewer options than categories are
    /// accepted.
    pub fn from_record(id: u64, record: QuizRecord) -> Result<Self, SessionError> {
        if record.result_names.is_empty() {
            return Err(SessionError::MalformedQuizDefinition(
                "quiz has no result categories".into(),
            ));
        }

        let result_categories = record
            .result_names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                if name.trim().is_empty() {
                    Err(SessionError::MalformedQuizDefinition(format!(
                        "result category {index} has an empty name"
                    )))
                } else {
                    Ok(ResultCategory { index, name })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let category_count = result_categories.len();
        let questions = record
            .questions
            .into_iter()
            .enumerate()
            .map(|(q, question)| {
                if question.options.is_empty() {
                    return Err(SessionError::MalformedQuizDefinition(format!(
                        "question {q} has no options"
                    )));
                }
                let options = question
                    .options
                    .into_iter()
                    .enumerate()
                    .map(|(o, option)| {
                        let result_index = usize::try_from(option.result_index)
                            .ok()
                            .filter(|&i| i < category_count)
                            .ok_or_else(|| {
                                SessionError::MalformedQuizDefinition(format!(
                                    "question {q} option {o} references result index {}, \
                                     but the quiz has {category_count} result categories",
                                    option.result_index
                                ))
                            })?;
                        Ok(AnswerOption {
                            text: option.text,
                            result_index,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Question {
                    text: question.text,
                    options,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            title: record.title,
            result_categories,
            questions,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn result_categories(&self) -> &[ResultCategory] {
        &self.result_categories
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Indices of questions that do not carry exactly one option per
    /// result category.
    pub fn irregular_questions(&self) -> Vec<usize> {
        let expected = self.result_categories.len();
        self.questions
            .iter()
            .enumerate()
            .filter(|(_, q)| {
                q.options.len() != expected || {
                    let mut seen = vec![false; expected];
                    q.options
                        .iter()
                        .any(|o| std::mem::replace(&mut seen[o.result_index], true))
                }
            })
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(result_names: &[&str], questions: Vec<Vec<i64>>) -> QuizRecord {
        QuizRecord {
            id: None,
            title: "Which utensil are you?".into(),
            result_names: result_names.iter().map(|s| s.to_string()).collect(),
            questions: questions
                .into_iter()
                .enumerate()
                .map(|(i, indices)| QuestionRecord {
                    text: format!("Question {i}"),
                    options: indices
                        .into_iter()
                        .map(|result_index| OptionRecord {
                            text: format!("answer for {result_index}"),
                            result_index,
                        })
                        .collect(),
                })
                .collect(),
            author: None,
        }
    }

    #[test]
    fn builds_categories_from_result_names() {
        let quiz = QuizDefinition::from_record(
            7,
            record(&["Spoon", "Fork", "Knife"], vec![vec![0, 1, 2]]),
        )
        .unwrap();
        assert_eq!(quiz.id(), 7);
        assert_eq!(quiz.result_categories().len(), 3);
        assert_eq!(quiz.result_categories()[2].index, 2);
        assert_eq!(quiz.result_categories()[2].name, "Knife");
        assert!(quiz.irregular_questions().is_empty());
    }

    #[test]
    fn rejects_empty_result_names() {
        let err = QuizDefinition::from_record(0, record(&[], vec![])).unwrap_err();
        assert!(matches!(err, SessionError::MalformedQuizDefinition(_)));
    }

    #[test]
    fn rejects_blank_category_name() {
        let err = QuizDefinition::from_record(0, record(&["Spoon", "  "], vec![])).unwrap_err();
        assert!(err.to_string().contains("result category 1"));
    }

    #[test]
    fn rejects_out_of_range_result_index() {
        let err =
            QuizDefinition::from_record(0, record(&["Spoon", "Fork"], vec![vec![0, 2]]))
                .unwrap_err();
        assert!(err.to_string().contains("references result index 2"));

        let err =
            QuizDefinition::from_record(0, record(&["Spoon", "Fork"], vec![vec![-1, 1]]))
                .unwrap_err();
        assert!(err.to_string().contains("references result index -1"));
    }

    #[test]
    fn rejects_question_without_options() {
        let err =
            QuizDefinition::from_record(0, record(&["Spoon", "Fork"], vec![vec![]])).unwrap_err();
        assert!(err.to_string().contains("question 0 has no options"));
    }

    #[test]
    fn tolerates_partial_questions() {
        let quiz = QuizDefinition::from_record(
            0,
            record(&["Spoon", "Fork", "Knife"], vec![vec![0, 1, 2], vec![2, 0], vec![1, 1, 0]]),
        )
        .unwrap();
        assert_eq!(quiz.irregular_questions(), vec![1, 2]);
    }

    #[test]
    fn quiz_record_accepts_fetched_body_without_id() {
        let body = r#"{
            "title": "Kitchen",
            "result_names": ["Spoon", "Fork"],
            "questions": [
                {"text": "Soup?", "options": [
                    {"text": "yes", "result_index": 0},
                    {"text": "no", "result_index": 1}
                ]}
            ],
            "author": "admin"
        }"#;
        let record: QuizRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.author.as_deref(), Some("admin"));
        assert_eq!(record.questions[0].options[1].result_index, 1);
    }

    #[test]
    fn summary_defaults_author() {
        let summary: QuizSummary = serde_json::from_str(r#"{"id": 3, "title": "T"}"#).unwrap();
        assert_eq!(summary.author, "Unknown");
    }
}
