//! Engine error types.
//!
//! Rejected user actions are returned as values, never panics, so callers
//! (and tests) can match on exactly which precondition failed.

use thiserror::Error;

use crate::model::AnswerKind;
use crate::report::AttemptRecord;
use crate::session::SessionPhase;

/// Errors produced by the quiz engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// A session action was attempted while its precondition did not hold.
    /// The session state is unchanged.
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] TransitionViolation),

    /// A question carries a type tag the engine does not know how to score.
    #[error("unknown question type '{tag}' on question {question_id}")]
    UnknownQuestionType { question_id: String, tag: String },

    /// A session cannot be started over content with no questions.
    #[error("quiz {content_id} has no questions")]
    EmptyQuiz { content_id: String },

    /// A saved session state does not fit the content it is resumed against.
    #[error("session state does not match quiz {content_id}: {reason}")]
    StateMismatch { content_id: String, reason: String },
}

impl QuizError {
    /// Returns `true` if the caller can fix this by choosing another action.
    ///
    /// Malformed content is not recoverable from inside a session.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, QuizError::InvalidTransition(_))
    }

    /// The violated precondition, if this is a transition error.
    pub fn violation(&self) -> Option<&TransitionViolation> {
        match self {
            QuizError::InvalidTransition(v) => Some(v),
            _ => None,
        }
    }
}

/// The precise precondition a rejected action violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionViolation {
    #[error("session is {phase}, expected in progress")]
    NotInProgress { phase: SessionPhase },

    #[error("question {given} is not the current question ({current})")]
    NotCurrentQuestion { current: String, given: String },

    #[error("answer for {question_id} is a {given} answer, expected {expected}")]
    AnswerKindMismatch {
        question_id: String,
        expected: AnswerKind,
        given: AnswerKind,
    },

    #[error("question {question_id} has not been answered")]
    Unanswered { question_id: String },

    #[error("submit is only allowed on the last question (at {index} of {count})")]
    NotOnLastQuestion { index: usize, count: usize },

    #[error("review is only available after submission (session is {phase})")]
    NotSubmitted { phase: SessionPhase },
}

/// A freshly built attempt record that the persistence collaborator rejected.
///
/// The record is handed back untouched. The engine does not retry.
#[derive(Debug, Error)]
#[error("failed to persist attempt for {}: {:#}", .record.content_id, .cause)]
pub struct PersistError {
    pub record: AttemptRecord,
    pub cause: anyhow::Error,
}

/// Failure of a combined submit-and-persist call.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
