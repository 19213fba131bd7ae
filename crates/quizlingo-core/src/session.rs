//! The per-respondent session state machine.
//!
//! A [`SessionEngine`] moves through `Loading -> InProgress -> Completed`.
//! It is the single writer of its own state: every mutation goes through
//! `load`, `submit_answer`, `submit_answer_for` or `choose`, and a call that
//! returns an error leaves the engine exactly as it was.

use std::fmt;
use std::fmt::Write as _;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{AnswerOption, QuizDefinition, QuizRecord, ResultCategory, ResultSubmission};
use crate::scoring::{determine_winner, ScoreVector};
use crate::shuffle::OptionShuffler;

/// Default `strftime` pattern for [`ResultSubmission::date`].
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Context handed to a session when it is created.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Seed for the option shuffler. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// `strftime` pattern for the submission date.
    pub date_format: String,
    /// Date stamped on the submission instead of today's local date.
    pub fixed_date: Option<NaiveDate>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seed: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            fixed_date: None,
        }
    }
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Loading,
    InProgress,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Loading => write!(f, "loading"),
            Phase::InProgress => write!(f, "in progress"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

/// The current question as the respondent should see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView<'a> {
    /// Zero-based question index.
    pub index: usize,
    /// Number of questions in the quiz.
    pub total: usize,
    pub text: &'a str,
    /// Options in display order.
    pub options: Vec<&'a AnswerOption>,
}

/// Answered versus total questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

impl Progress {
    /// Completion in `0.0..=1.0`. A quiz without questions counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.answered as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).round() as u8
    }
}

/// One respondent's pass through one quiz.
pub struct SessionEngine {
    id: Uuid,
    options: SessionOptions,
    shuffler: OptionShuffler,
    phase: Phase,
    quiz: Option<QuizDefinition>,
    display_orders: Vec<Vec<usize>>,
    current: usize,
    scores: ScoreVector,
    winner: Option<usize>,
    submission: Option<ResultSubmission>,
}

impl SessionEngine {
    /// A new session in the `Loading` phase.
    pub fn new(options: SessionOptions) -> Self {
        let shuffler = match options.seed {
            Some(seed) => OptionShuffler::seeded(seed),
            None => OptionShuffler::from_entropy(),
        };
        Self {
            id: Uuid::new_v4(),
            options,
            shuffler,
            phase: Phase::Loading,
            quiz: None,
            display_orders: Vec::new(),
            current: 0,
            scores: ScoreVector::zeroed(0),
            winner: None,
            submission: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn quiz(&self) -> Option<&QuizDefinition> {
        self.quiz.as_ref()
    }

    /// Validate a fetched record and load it. A malformed record leaves the
    /// session in `Loading`.
    pub fn load_record(&mut self, id: u64, record: QuizRecord) -> Result<Phase, SessionError> {
        self.require(Phase::Loading, "load a quiz")?;
        let quiz = QuizDefinition::from_record(id, record)?;
        self.load(quiz)
    }

    /// Start the session on `quiz`.
    ///
    /// Display orders for every question are drawn here, once. A quiz with
    /// no questions completes immediately.
    pub fn load(&mut self, quiz: QuizDefinition) -> Result<Phase, SessionError> {
        self.require(Phase::Loading, "load a quiz")?;

        let irregular = quiz.irregular_questions();
        if !irregular.is_empty() {
            tracing::warn!(
                session = %self.id,
                quiz = quiz.id(),
                "questions {irregular:?} do not offer exactly one option per result"
            );
        }

        self.display_orders = self.shuffler.shuffle_quiz(&quiz);
        self.scores = ScoreVector::zeroed(quiz.result_categories().len());
        self.current = 0;
        let question_count = quiz.questions().len();
        tracing::info!(
            session = %self.id,
            quiz = quiz.id(),
            questions = question_count,
            "session started"
        );
        self.quiz = Some(quiz);
        self.phase = Phase::InProgress;

        if question_count == 0 {
            self.complete()?;
        }
        Ok(self.phase)
    }

    /// The question awaiting an answer, with options in display order.
    pub fn current_question(&self) -> Option<QuestionView<'_>> {
        if self.phase != Phase::InProgress {
            return None;
        }
        let quiz = self.quiz.as_ref()?;
        let question = quiz.questions().get(self.current)?;
        let order = self.display_orders.get(self.current)?;
        Some(QuestionView {
            index: self.current,
            total: quiz.questions().len(),
            text: &question.text,
            options: order.iter().map(|&i| &question.options[i]).collect(),
        })
    }

    /// Display order of question `question` as authored option positions.
    pub fn display_order(&self, question: usize) -> Option<&[usize]> {
        self.display_orders.get(question).map(Vec::as_slice)
    }

    /// `None` until a quiz is loaded.
    pub fn progress(&self) -> Option<Progress> {
        let quiz = self.quiz.as_ref()?;
        Some(Progress {
            answered: self.current,
            total: quiz.questions().len(),
        })
    }

    /// Credit the current question's answer to `result_index` and advance.
    ///
    /// Answering the last question computes the winner and completes the
    /// session.
    pub fn submit_answer(&mut self, result_index: i64) -> Result<Phase, SessionError> {
        self.require(Phase::InProgress, "submit an answer")?;
        let (categories, questions) = match &self.quiz {
            Some(quiz) => (quiz.result_categories().len(), quiz.questions().len()),
            None => return Err(self.invalid("submit an answer without a quiz")),
        };

        let index = usize::try_from(result_index)
            .ok()
            .filter(|&i| i < categories)
            .ok_or(SessionError::InvalidResultIndex {
                index: result_index,
                categories,
            })?;

        self.scores.record(index);
        self.current += 1;
        tracing::debug!(
            session = %self.id,
            answered = self.current,
            result_index = index,
            "answer recorded"
        );

        if self.current >= questions {
            self.complete()?;
        }
        Ok(self.phase)
    }

    /// Like [`submit_answer`](Self::submit_answer), but only if `question`
    /// is the current question.
    pub fn submit_answer_for(
        &mut self,
        question: usize,
        result_index: i64,
    ) -> Result<Phase, SessionError> {
        self.require(Phase::InProgress, "submit an answer")?;
        if question != self.current {
            return Err(self.invalid(&format!(
                "answered question {question} while question {} is current",
                self.current
            )));
        }
        self.submit_answer(result_index)
    }

    /// Answer the current question with the option shown at `position`.
    pub fn choose(&mut self, position: usize) -> Result<Phase, SessionError> {
        self.require(Phase::InProgress, "choose an option")?;
        let result_index = self
            .current_question()
            .and_then(|view| view.options.get(position).map(|o| o.result_index))
            .ok_or(SessionError::InvalidOption {
                question: self.current,
                position,
            })?;
        self.submit_answer(result_index as i64)
    }

    pub fn scores(&self) -> &ScoreVector {
        &self.scores
    }

    /// The winning category, once completed.
    pub fn winner(&self) -> Option<&ResultCategory> {
        let index = self.winner?;
        self.quiz.as_ref()?.result_categories().get(index)
    }

    /// The submission produced on completion.
    pub fn submission(&self) -> Option<&ResultSubmission> {
        self.submission.as_ref()
    }

    fn complete(&mut self) -> Result<(), SessionError> {
        let Some(quiz) = &self.quiz else {
            return Err(self.invalid("complete without a quiz"));
        };
        let winner = determine_winner(self.scores.counts(), quiz.result_categories())
            .ok_or_else(|| {
                SessionError::MalformedQuizDefinition("quiz has no result categories".into())
            })?;

        let submission = ResultSubmission {
            quiz_title: quiz.title().to_string(),
            result_text: winner.name.clone(),
            date: self.format_date(),
        };
        tracing::info!(
            session = %self.id,
            quiz = quiz.id(),
            scores = ?self.scores.counts(),
            winner = %winner.name,
            "session completed"
        );

        self.winner = Some(winner.index);
        self.submission = Some(submission);
        self.phase = Phase::Completed;
        Ok(())
    }

    fn format_date(&self) -> String {
        let date = self
            .options
            .fixed_date
            .unwrap_or_else(|| Local::now().date_naive());
        let mut out = String::new();
        if write!(out, "{}", date.format(&self.options.date_format)).is_err() {
            tracing::warn!(
                format = %self.options.date_format,
                "invalid date format, falling back to ISO 8601"
            );
            return date.format("%Y-%m-%d").to_string();
        }
        out
    }

    fn require(&self, phase: Phase, action: &str) -> Result<(), SessionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(self.invalid(&format!("cannot {action}")))
        }
    }

    fn invalid(&self, detail: &str) -> SessionError {
        SessionError::InvalidTransition {
            phase: self.phase,
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OptionRecord, QuestionRecord};

    fn kitchen_record(question_count: usize) -> QuizRecord {
        QuizRecord {
            id: None,
            title: "Which utensil are you?".into(),
            result_names: vec!["Spoon".into(), "Fork".into(), "Knife".into()],
            questions: (0..question_count)
                .map(|q| QuestionRecord {
                    text: format!("Question {q}"),
                    options: (0..3)
                        .map(|r| OptionRecord {
                            text: format!("q{q} answer {r}"),
                            result_index: r,
                        })
                        .collect(),
                })
                .collect(),
            author: None,
        }
    }

    fn options() -> SessionOptions {
        SessionOptions {
            seed: Some(11),
            fixed_date: NaiveDate::from_ymd_opt(2026, 10, 19),
            ..Default::default()
        }
    }

    fn started(question_count: usize) -> SessionEngine {
        let mut engine = SessionEngine::new(options());
        engine.load_record(1, kitchen_record(question_count)).unwrap();
        engine
    }

    #[test]
    fn spoon_fork_knife_end_to_end() {
        let mut engine = started(3);
        assert_eq!(engine.phase(), Phase::InProgress);
        assert_eq!(engine.submit_answer(0).unwrap(), Phase::InProgress);
        assert_eq!(engine.submit_answer(0).unwrap(), Phase::InProgress);
        assert_eq!(engine.submit_answer(1).unwrap(), Phase::Completed);

        assert_eq!(engine.scores().counts(), &[2, 1, 0]);
        assert_eq!(engine.winner().unwrap().name, "Spoon");
        let submission = engine.submission().unwrap();
        assert_eq!(submission.result_text, "Spoon");
        assert_eq!(submission.quiz_title, "Which utensil are you?");
        assert_eq!(submission.date, "19.10.2026");
    }

    #[test]
    fn zero_questions_complete_on_load() {
        let mut engine = SessionEngine::new(options());
        let phase = engine.load_record(5, kitchen_record(0)).unwrap();
        assert_eq!(phase, Phase::Completed);
        assert_eq!(engine.scores().counts(), &[0, 0, 0]);
        assert_eq!(engine.winner().unwrap().index, 0);
        assert_eq!(engine.submission().unwrap().result_text, "Spoon");
        assert_eq!(engine.progress().unwrap().fraction(), 1.0);
    }

    #[test]
    fn submit_after_completion_is_rejected() {
        let mut engine = started(1);
        engine.submit_answer(2).unwrap();
        let before = engine.scores().clone();
        let first = engine.submission().cloned();

        let err = engine.submit_answer(0).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                phase: Phase::Completed,
                ..
            }
        ));
        assert_eq!(engine.scores(), &before);
        assert_eq!(engine.submission().cloned(), first);
    }

    #[test]
    fn out_of_range_result_index_is_rejected() {
        let mut engine = started(2);
        for bad in [-1, 3] {
            let err = engine.submit_answer(bad).unwrap_err();
            assert_eq!(
                err,
                SessionError::InvalidResultIndex {
                    index: bad,
                    categories: 3
                }
            );
        }
        assert_eq!(engine.scores().counts(), &[0, 0, 0]);
        assert_eq!(engine.progress().unwrap().answered, 0);
    }

    #[test]
    fn submit_before_load_is_rejected() {
        let mut engine = SessionEngine::new(options());
        assert!(engine.progress().is_none());
        assert!(engine.current_question().is_none());
        let err = engine.submit_answer(0).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                phase: Phase::Loading,
                ..
            }
        ));
    }

    #[test]
    fn second_load_is_rejected() {
        let mut engine = started(2);
        let err = engine.load_record(2, kitchen_record(1)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(engine.quiz().unwrap().id(), 1);
    }

    #[test]
    fn malformed_record_stays_loading() {
        let mut engine = SessionEngine::new(options());
        let mut record = kitchen_record(2);
        record.questions[1].options[0].result_index = 9;
        let err = engine.load_record(1, record).unwrap_err();
        assert!(matches!(err, SessionError::MalformedQuizDefinition(_)));
        assert_eq!(engine.phase(), Phase::Loading);
        assert!(engine.quiz().is_none());
    }

    #[test]
    fn answering_out_of_order_is_rejected() {
        let mut engine = started(3);
        let err = engine.submit_answer_for(1, 0).unwrap_err();
        assert!(err.to_string().contains("question 1"));
        assert_eq!(engine.progress().unwrap().answered, 0);

        engine.submit_answer_for(0, 2).unwrap();
        let err = engine.submit_answer_for(0, 2).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(engine.scores().counts(), &[0, 0, 1]);
    }

    #[test]
    fn choose_credits_displayed_option() {
        for seed in 0..20 {
            let mut engine = SessionEngine::new(SessionOptions {
                seed: Some(seed),
                ..options()
            });
            engine.load_record(1, kitchen_record(3)).unwrap();

            let mut expected = [0u32; 3];
            for position in [2usize, 0, 1] {
                let credited = engine.current_question().unwrap().options[position].result_index;
                expected[credited] += 1;
                engine.choose(position).unwrap();
            }
            assert_eq!(engine.scores().counts(), &expected);
        }
    }

    #[test]
    fn choose_rejects_missing_position() {
        let mut engine = started(1);
        let err = engine.choose(3).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidOption {
                question: 0,
                position: 3
            }
        );
        assert_eq!(engine.phase(), Phase::InProgress);
    }

    #[test]
    fn display_order_is_fixed_for_the_session() {
        let engine = started(4);
        let view = engine.current_question().unwrap();
        let again = engine.current_question().unwrap();
        assert_eq!(view, again);
        let order = engine.display_order(0).unwrap();
        let texts: Vec<&str> = order
            .iter()
            .map(|&i| engine.quiz().unwrap().questions()[0].options[i].text.as_str())
            .collect();
        let shown: Vec<&str> = view.options.iter().map(|o| o.text.as_str()).collect();
        assert_eq!(texts, shown);
    }

    #[test]
    fn progress_is_monotonic() {
        let mut engine = started(4);
        let mut last = engine.progress().unwrap().fraction();
        assert_eq!(last, 0.0);
        while engine.phase() == Phase::InProgress {
            let _ = engine.submit_answer(-1);
            engine.submit_answer(1).unwrap();
            let now = engine.progress().unwrap().fraction();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 1.0);
        assert_eq!(engine.progress().unwrap().percent(), 100);
    }

    #[test]
    fn partial_questions_score_by_result_index() {
        let mut record = kitchen_record(2);
        record.questions[0].options = vec![OptionRecord {
            text: "only knives here".into(),
            result_index: 2,
        }];
        let mut engine = SessionEngine::new(options());
        engine.load_record(1, record).unwrap();

        assert_eq!(engine.current_question().unwrap().options.len(), 1);
        engine.choose(0).unwrap();
        engine.submit_answer(2).unwrap();
        assert_eq!(engine.scores().counts(), &[0, 0, 2]);
        assert_eq!(engine.winner().unwrap().name, "Knife");
    }

    #[test]
    fn invalid_date_format_falls_back_to_iso() {
        let mut engine = SessionEngine::new(SessionOptions {
            date_format: "%Q".into(),
            ..options()
        });
        engine.load_record(1, kitchen_record(0)).unwrap();
        assert_eq!(engine.submission().unwrap().date, "2026-10-19");
    }
}
