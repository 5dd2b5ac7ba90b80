//! Core data model types for lingoquiz.
//!
//! These are the types the whole engine works with: quiz content as supplied
//! by the content-loading collaborator, the questions and options inside it,
//! and the answers a learner gives.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuizError;

/// An ordered set of questions assessing one piece of learning content.
///
/// Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizContent {
    /// Content identifier (reading, listening or grammar item).
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Questions, expected in ascending `order_index`.
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuizContent {
    /// Questions sorted by `order_index`, ties broken by declaration order.
    pub fn ordered_questions(&self) -> Vec<&Question> {
        let mut ordered: Vec<&Question> = self.questions.iter().collect();
        ordered.sort_by_key(|q| q.order_index);
        ordered
    }

    /// Look up a question by id.
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Sum of every question's points.
    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }
}

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within the quiz.
    pub id: String,
    /// The learning content this question belongs to.
    #[serde(default)]
    pub content_id: String,
    /// Raw type tag (`multiple_choice`, `fill_blank`, `true_false`).
    ///
    /// Kept as received so malformed content surfaces as
    /// [`QuizError::UnknownQuestionType`] at dispatch time instead of failing
    /// the whole load.
    #[serde(rename = "type")]
    pub question_type: String,
    /// Prompt shown to the learner.
    pub text: String,
    /// Answer options. For fill-blank these are the accepted answers.
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// Points awarded for a correct answer.
    pub points: u32,
    /// Position within the quiz.
    pub order_index: i32,
    /// Legacy fill-blank answer key. Only consulted when the engine is
    /// configured with [`FillBlankKey::OptionsOrField`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl Question {
    /// Parse the type tag into a [`QuestionKind`].
    pub fn kind(&self) -> Result<QuestionKind, QuizError> {
        self.question_type
            .parse::<QuestionKind>()
            .map_err(|_| QuizError::UnknownQuestionType {
                question_id: self.id.clone(),
                tag: self.question_type.clone(),
            })
    }

    /// Options flagged correct.
    pub fn correct_options(&self) -> impl Iterator<Item = &AnswerOption> {
        self.options.iter().filter(|o| o.is_correct)
    }

    /// Look up an option by id.
    pub fn option(&self, option_id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// One selectable (or, for fill-blank, accepted) answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// The three supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    FillBlank,
    TrueFalse,
}

impl QuestionKind {
    /// Every supported kind, in display order.
    pub const ALL: [QuestionKind; 3] = [
        QuestionKind::MultipleChoice,
        QuestionKind::FillBlank,
        QuestionKind::TrueFalse,
    ];

    /// The canonical type tag.
    pub fn tag(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::FillBlank => "fill_blank",
            QuestionKind::TrueFalse => "true_false",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(QuestionKind::MultipleChoice),
            "fill_blank" => Ok(QuestionKind::FillBlank),
            "true_false" => Ok(QuestionKind::TrueFalse),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

/// Which fields count as the answer key for fill-blank questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillBlankKey {
    /// Only options flagged `is_correct`.
    #[default]
    Options,
    /// Correct options first, then the legacy `correct_answer` field.
    OptionsOrField,
}

impl FromStr for FillBlankKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "options" => Ok(FillBlankKey::Options),
            "options_or_field" => Ok(FillBlankKey::OptionsOrField),
            other => Err(format!("unknown fill-blank key: {other}")),
        }
    }
}

/// A learner's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: String,
    #[serde(flatten)]
    pub response: AnswerResponse,
}

/// The answer payload. Exactly one of option or text, by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerResponse {
    Option { selected_option_id: String },
    Text { text_answer: String },
}

/// Discriminant of [`AnswerResponse`], used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    Option,
    Text,
}

impl fmt::Display for AnswerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerKind::Option => write!(f, "option"),
            AnswerKind::Text => write!(f, "text"),
        }
    }
}

impl UserAnswer {
    /// An answer selecting an option.
    pub fn option(question_id: impl Into<String>, option_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            response: AnswerResponse::Option {
                selected_option_id: option_id.into(),
            },
        }
    }

    /// A free-text answer.
    pub fn text(question_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            response: AnswerResponse::Text {
                text_answer: text.into(),
            },
        }
    }

    pub fn kind(&self) -> AnswerKind {
        match self.response {
            AnswerResponse::Option { .. } => AnswerKind::Option,
            AnswerResponse::Text { .. } => AnswerKind::Text,
        }
    }

    pub fn selected_option_id(&self) -> Option<&str> {
        match &self.response {
            AnswerResponse::Option { selected_option_id } => Some(selected_option_id),
            AnswerResponse::Text { .. } => None,
        }
    }

    pub fn text_answer(&self) -> Option<&str> {
        match &self.response {
            AnswerResponse::Text { text_answer } => Some(text_answer),
            AnswerResponse::Option { .. } => None,
        }
    }

    /// True when the payload carries nothing: an empty option id or
    /// whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match &self.response {
            AnswerResponse::Option { selected_option_id } => selected_option_id.is_empty(),
            AnswerResponse::Text { text_answer } => text_answer.trim().is_empty(),
        }
    }
}

/// Flat question shape still produced by older content exports.
///
/// Options are bare strings and the answer key lives in `correct_answer`.
/// Deprecated: convert with [`LegacyQuestion::into_question`] at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyQuestion {
    pub id: String,
    #[serde(default)]
    pub content_id: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub points: u32,
    pub order_index: i32,
    #[serde(default)]
    pub correct_answer: Option<String>,
}

impl LegacyQuestion {
    /// Convert to the canonical per-option form.
    ///
    /// Options get ids `<question_id>-<n>` (1-based). The option matching
    /// `correct_answer` case-insensitively is flagged correct. A fill-blank
    /// question whose key matches no option gets a synthesized correct option.
    pub fn into_question(self) -> Question {
        let key = self
            .correct_answer
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);

        let mut options: Vec<AnswerOption> = self
            .options
            .iter()
            .enumerate()
            .map(|(i, text)| AnswerOption {
                id: format!("{}-{}", self.id, i + 1),
                text: text.clone(),
                is_correct: key
                    .as_deref()
                    .is_some_and(|k| text.trim().to_lowercase() == k),
            })
            .collect();

        let is_fill_blank = matches!(
            self.question_type.parse::<QuestionKind>(),
            Ok(QuestionKind::FillBlank)
        );
        if is_fill_blank && !options.iter().any(|o| o.is_correct) {
            if let Some(answer) = self.correct_answer.as_deref().map(str::trim) {
                if !answer.is_empty() {
                    options.push(AnswerOption {
                        id: format!("{}-{}", self.id, options.len() + 1),
                        text: answer.to_string(),
                        is_correct: true,
                    });
                }
            }
        }

        Question {
            id: self.id,
            content_id: self.content_id,
            question_type: self.question_type,
            text: self.text,
            options,
            points: self.points,
            order_index: self.order_index,
            correct_answer: if is_fill_blank {
                self.correct_answer
            } else {
                None
            },
        }
    }
}
