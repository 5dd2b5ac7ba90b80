//! Attempt records and review feedback built from a finished session.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::model::{AnswerResponse, Question};
use crate::scoring::ScoreCalculator;
use crate::session::QuizSessionState;

/// One completed pass through a quiz, ready for the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub content_id: String,
    /// One entry per question, in `order_index` order.
    pub answers: Vec<AttemptAnswer>,
    pub score: u32,
    pub max_score: u32,
    pub percentage: f64,
    /// Seconds from session start to submission.
    pub total_time: u64,
    pub completed_at: DateTime<Utc>,
}

/// The recorded answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub question_id: String,
    /// Selected option id; `None` for text answers and unanswered questions.
    pub selected_option: Option<String>,
    /// Typed answer; `None` for option answers and unanswered questions.
    pub text_answer: Option<String>,
    pub is_correct: bool,
    /// Seconds spent on the question.
    pub time_taken: u64,
}

impl AttemptRecord {
    /// Save the record as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize attempt")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write attempt to {}", path.display()))?;
        Ok(())
    }

    /// Load a record from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read attempt from {}", path.display()))?;
        let record: AttemptRecord =
            serde_json::from_str(&content).context("failed to parse attempt JSON")?;
        Ok(record)
    }

    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }

    /// e.g. `reading-1: 5/10 (50.00%) in 42s, Needs Improvement`
    pub fn to_summary_line(&self) -> String {
        let level = ScoreCalculator::performance_level(self.percentage).level;
        format!(
            "{}: {}/{} ({:.2}%) in {}s, {}",
            self.content_id, self.score, self.max_score, self.percentage, self.total_time, level
        )
    }
}

/// Feedback for one question on the review screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub question_id: String,
    pub text: String,
    /// What the learner answered, as display text. `None` when unanswered.
    pub user_answer: Option<String>,
    pub correct_answer_text: String,
    pub is_correct: bool,
    pub points: u32,
}

/// Turns session state into attempt records and review feedback. No I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultReporter {
    calculator: ScoreCalculator,
}

impl ResultReporter {
    pub fn new(calculator: ScoreCalculator) -> Self {
        Self { calculator }
    }

    /// Build the attempt record.
    ///
    /// `questions` must already be in `order_index` order. Timing comes from
    /// the state; a state that was never submitted reports a total of zero
    /// and its start time as the completion time.
    pub fn build_attempt(
        &self,
        content_id: &str,
        questions: &[&Question],
        state: &QuizSessionState,
    ) -> Result<AttemptRecord, QuizError> {
        let validator = self.calculator.validator();
        let answers = questions
            .iter()
            .map(|q| {
                let answer = state.answers.get(&q.id);
                let (selected_option, text_answer) = match answer.map(|a| &a.response) {
                    Some(AnswerResponse::Option { selected_option_id }) => {
                        (Some(selected_option_id.clone()), None)
                    }
                    Some(AnswerResponse::Text { text_answer }) => (None, Some(text_answer.clone())),
                    None => (None, None),
                };
                Ok(AttemptAnswer {
                    question_id: q.id.clone(),
                    selected_option,
                    text_answer,
                    is_correct: validator.is_correct(q, answer)?,
                    time_taken: state.per_question_seconds.get(&q.id).copied().unwrap_or(0),
                })
            })
            .collect::<Result<Vec<_>, QuizError>>()?;

        let summary = self
            .calculator
            .calculate_score(questions.iter().copied(), &state.answers)?;

        Ok(AttemptRecord {
            content_id: content_id.to_string(),
            answers,
            score: summary.total_score,
            max_score: summary.max_score,
            percentage: summary.percentage,
            total_time: state.total_time.unwrap_or(0),
            completed_at: state.completed_at.unwrap_or(state.session_start_time),
        })
    }

    /// Per-question feedback in `order_index` order.
    pub fn review_items(
        &self,
        questions: &[&Question],
        state: &QuizSessionState,
    ) -> Result<Vec<ReviewItem>, QuizError> {
        let validator = self.calculator.validator();
        questions
            .iter()
            .map(|q| {
                let answer = state.answers.get(&q.id);
                let user_answer = answer.map(|a| match &a.response {
                    AnswerResponse::Option { selected_option_id } => q
                        .option(selected_option_id)
                        .map(|o| o.text.clone())
                        .unwrap_or_else(|| selected_option_id.clone()),
                    AnswerResponse::Text { text_answer } => text_answer.clone(),
                });
                Ok(ReviewItem {
                    question_id: q.id.clone(),
                    text: q.text.clone(),
                    user_answer,
                    correct_answer_text: validator.correct_answer_text(q),
                    is_correct: validator.is_correct(q, answer)?,
                    points: q.points,
                })
            })
            .collect()
    }
}
