//! lingoquiz-core: quiz session engine, answer validation, and scoring.
//!
//! This crate defines the quiz data model, the session state machine that
//! drives an attempt, the per-question-type validator, the score calculator,
//! and the attempt record handed to persistence.

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mock;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod session;
pub mod traits;
pub mod validator;

pub use error::{PersistError, QuizError, SubmitError, TransitionViolation};
pub use session::{QuizSession, SessionPhase, SubmitOutcome};
