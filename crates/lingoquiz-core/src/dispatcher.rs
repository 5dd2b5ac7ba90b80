//! Routing of questions to their type-specific strategy.
//!
//! Every question type maps to exactly one strategy through an exhaustive
//! match, so adding a [`QuestionKind`] forces each call site to handle it.
//! Unknown type tags are reported, never defaulted.

use serde::Serialize;

use crate::error::QuizError;
use crate::model::{AnswerKind, Question, QuestionKind};

/// How a question is answered and checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStrategy {
    /// Choose one option among several.
    SingleChoice,
    /// Choose between a true and a false option.
    Binary,
    /// Type the missing text; compared against the accepted answers.
    TextEntry,
}

impl QuestionStrategy {
    pub fn for_kind(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::MultipleChoice => QuestionStrategy::SingleChoice,
            QuestionKind::TrueFalse => QuestionStrategy::Binary,
            QuestionKind::FillBlank => QuestionStrategy::TextEntry,
        }
    }

    /// The answer payload this strategy accepts.
    pub fn expected_answer(self) -> AnswerKind {
        match self {
            QuestionStrategy::SingleChoice | QuestionStrategy::Binary => AnswerKind::Option,
            QuestionStrategy::TextEntry => AnswerKind::Text,
        }
    }

    /// Whether the options are shown to the learner.
    pub fn shows_options(self) -> bool {
        match self {
            QuestionStrategy::SingleChoice | QuestionStrategy::Binary => true,
            QuestionStrategy::TextEntry => false,
        }
    }
}

/// Learner-facing view of a question, without any correctness flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub kind: QuestionKind,
    pub strategy: QuestionStrategy,
    pub text: String,
    pub points: u32,
    /// Selectable choices. Empty for text entry, whose options are the key.
    pub choices: Vec<ChoiceView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceView {
    pub id: String,
    pub text: String,
}

/// Routes questions by their type tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionDispatcher;

impl QuestionDispatcher {
    /// Resolve the strategy for a question.
    pub fn route(question: &Question) -> Result<QuestionStrategy, QuizError> {
        question.kind().map(QuestionStrategy::for_kind)
    }

    /// Build the learner-facing view for a question.
    pub fn view(question: &Question) -> Result<QuestionView, QuizError> {
        let kind = question.kind()?;
        let strategy = QuestionStrategy::for_kind(kind);
        let choices = if strategy.shows_options() {
            question
                .options
                .iter()
                .map(|o| ChoiceView {
                    id: o.id.clone(),
                    text: o.text.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(QuestionView {
            id: question.id.clone(),
            kind,
            strategy,
            text: question.text.clone(),
            points: question.points,
            choices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerOption;

    fn question(tag: &str) -> Question {
        Question {
            id: "q1".into(),
            content_id: "c1".into(),
            question_type: tag.into(),
            text: "The cat ___ on the mat".into(),
            options: vec![AnswerOption {
                id: "o1".into(),
                text: "sat".into(),
                is_correct: true,
            }],
            points: 3,
            order_index: 0,
            correct_answer: None,
        }
    }

    #[test]
    fn every_kind_has_a_strategy() {
        for kind in QuestionKind::ALL {
            let strategy = QuestionStrategy::for_kind(kind);
            let expected = if kind == QuestionKind::FillBlank {
                AnswerKind::Text
            } else {
                AnswerKind::Option
            };
            assert_eq!(strategy.expected_answer(), expected, "{kind}");
        }
    }

    #[test]
    fn route_known_tags() {
        assert_eq!(
            QuestionDispatcher::route(&question("multiple_choice")).unwrap(),
            QuestionStrategy::SingleChoice
        );
        assert_eq!(
            QuestionDispatcher::route(&question("true_false")).unwrap(),
            QuestionStrategy::Binary
        );
        assert_eq!(
            QuestionDispatcher::route(&question("fill_blank")).unwrap(),
            QuestionStrategy::TextEntry
        );
    }

    #[test]
    fn route_unknown_tag_fails() {
        let err = QuestionDispatcher::route(&question("ordering")).unwrap_err();
        assert!(matches!(err, QuizError::UnknownQuestionType { .. }));
    }

    #[test]
    fn fill_blank_view_hides_answer_key() {
        let view = QuestionDispatcher::view(&question("fill_blank")).unwrap();
        assert!(view.choices.is_empty());

        let view = QuestionDispatcher::view(&question("multiple_choice")).unwrap();
        assert_eq!(view.choices.len(), 1);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("is_correct"));
    }
}
