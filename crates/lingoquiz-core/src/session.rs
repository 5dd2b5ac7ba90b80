//! The quiz session state machine.
//!
//! Session state is a plain serializable value ([`QuizSessionState`]) and
//! every user action goes through one transition function, [`reduce`].
//! [`QuizSession`] pairs the two with the quiz content and a [`Clock`] for
//! callers that just want to drive a quiz.
//!
//! ```text
//! InProgress(0) --next/previous--> InProgress(i)
//! InProgress(last) --submit--> Submitted --review--> Reviewing
//! any --retry--> InProgress(0)
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{elapsed_secs, Clock, SystemClock};
use crate::config::EngineConfig;
use crate::dispatcher::{QuestionDispatcher, QuestionView};
use crate::error::{PersistError, QuizError, SubmitError, TransitionViolation};
use crate::model::{AnswerResponse, Question, QuizContent, UserAnswer};
use crate::report::{AttemptRecord, ResultReporter, ReviewItem};
use crate::scoring::{Performance, ScoreCalculator, ScoreSummary};
use crate::traits::AttemptSink;
use crate::validator::AnswerValidator;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    InProgress,
    Submitted,
    Reviewing,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::InProgress => write!(f, "in progress"),
            SessionPhase::Submitted => write!(f, "submitted"),
            SessionPhase::Reviewing => write!(f, "reviewing"),
        }
    }
}

/// Complete state of one attempt. Serializable so an attempt can be resumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSessionState {
    /// Identifies this run for log correlation. Regenerated on retry.
    pub run_id: Uuid,
    /// The quiz this state belongs to.
    pub content_id: String,
    pub phase: SessionPhase,
    /// Position in `order_index` order.
    pub current_index: usize,
    /// Recorded answers. Only answered questions are present.
    pub answers: BTreeMap<String, UserAnswer>,
    /// Accumulated whole seconds spent on each visited question.
    pub per_question_seconds: BTreeMap<String, u64>,
    pub session_start_time: DateTime<Utc>,
    /// When the current question was entered.
    pub question_entered_at: DateTime<Utc>,
    /// Seconds from start to submission, once submitted.
    #[serde(default)]
    pub total_time: Option<u64>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Score kept for the review screen once submitted.
    #[serde(default)]
    pub outcome: Option<ScoreSummary>,
}

impl QuizSessionState {
    /// A fresh attempt starting at the first question.
    pub fn new(content_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            content_id: content_id.into(),
            phase: SessionPhase::InProgress,
            current_index: 0,
            answers: BTreeMap::new(),
            per_question_seconds: BTreeMap::new(),
            session_start_time: now,
            question_entered_at: now,
            total_time: None,
            completed_at: None,
            outcome: None,
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.phase != SessionPhase::InProgress
    }

    /// Add the time spent on `question_id` since it was entered.
    fn close_question_timer(&mut self, question_id: &str, now: DateTime<Utc>) {
        let secs = elapsed_secs(self.question_entered_at, now);
        *self
            .per_question_seconds
            .entry(question_id.to_string())
            .or_insert(0) += secs;
        self.question_entered_at = now;
    }
}

/// Quiz content with its questions resolved into `order_index` order.
#[derive(Debug, Clone)]
pub struct QuizPlan {
    content: QuizContent,
    order: Vec<usize>,
}

impl QuizPlan {
    /// Fails with [`QuizError::EmptyQuiz`] when there is nothing to ask, and
    /// with [`QuizError::UnknownQuestionType`] when a question could never be
    /// answered.
    pub fn new(content: QuizContent) -> Result<Self, QuizError> {
        if content.questions.is_empty() {
            return Err(QuizError::EmptyQuiz {
                content_id: content.id.clone(),
            });
        }
        for question in &content.questions {
            question.kind()?;
        }
        let mut order: Vec<usize> = (0..content.questions.len()).collect();
        order.sort_by_key(|&i| content.questions[i].order_index);
        Ok(Self { content, order })
    }

    pub fn content(&self) -> &QuizContent {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.order.len().saturating_sub(1)
    }

    /// Question at `index` in `order_index` order.
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.order.get(index).map(|&i| &self.content.questions[i])
    }

    pub fn ordered(&self) -> impl Iterator<Item = &Question> + '_ {
        self.order.iter().map(|&i| &self.content.questions[i])
    }

    fn current(&self, state: &QuizSessionState) -> &Question {
        let index = state.current_index.min(self.last_index());
        &self.content.questions[self.order[index]]
    }
}

/// Policy knobs for [`reduce`].
#[derive(Debug, Clone, Copy)]
pub struct SessionRules {
    pub calculator: ScoreCalculator,
    /// Navigating forward requires an answer on the current question.
    pub require_answer_to_advance: bool,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            calculator: ScoreCalculator::default(),
            require_answer_to_advance: true,
        }
    }
}

impl From<&EngineConfig> for SessionRules {
    fn from(config: &EngineConfig) -> Self {
        let validator = AnswerValidator::new(config.fill_blank_key);
        Self {
            calculator: ScoreCalculator::new(validator).with_precision(config.score_precision),
            require_answer_to_advance: config.require_answer_to_advance,
        }
    }
}

/// A user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAction {
    Answer(UserAnswer),
    Next,
    Previous,
    Submit,
    Review,
    Retry,
}

/// What an accepted action did.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Answered { question_id: String },
    /// An empty answer removed the stored one.
    Cleared { question_id: String },
    Moved { from: usize, to: usize },
    /// Navigation at the first or last question.
    Stayed,
    Submitted(Box<AttemptRecord>),
    AlreadySubmitted,
    Reviewing,
    Reset,
}

/// Result of a submit request.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// First successful submit. Hand this record off exactly once.
    Submitted(AttemptRecord),
    /// The session was already submitted. Nothing was recomputed.
    AlreadySubmitted,
}

/// Apply one action to a state.
///
/// Returns the next state and the effect, or the violated precondition. The
/// input is never modified, so on error it is the state to keep. Apart from the
/// fresh run id minted by `Retry`, the result depends only on the arguments.
pub fn reduce(
    plan: &QuizPlan,
    rules: &SessionRules,
    state: &QuizSessionState,
    action: QuizAction,
    now: DateTime<Utc>,
) -> Result<(QuizSessionState, Effect), QuizError> {
    match action {
        QuizAction::Retry => Ok((
            QuizSessionState::new(plan.content().id.clone(), now),
            Effect::Reset,
        )),
        QuizAction::Review => match state.phase {
            SessionPhase::InProgress => {
                Err(TransitionViolation::NotSubmitted { phase: state.phase }.into())
            }
            SessionPhase::Reviewing => Ok((state.clone(), Effect::Reviewing)),
            SessionPhase::Submitted => {
                let mut next = state.clone();
                next.phase = SessionPhase::Reviewing;
                Ok((next, Effect::Reviewing))
            }
        },
        QuizAction::Submit if state.is_submitted() => {
            Ok((state.clone(), Effect::AlreadySubmitted))
        }
        _ if state.is_submitted() => {
            Err(TransitionViolation::NotInProgress { phase: state.phase }.into())
        }
        QuizAction::Answer(answer) => answer_current(plan, state, answer),
        QuizAction::Next => {
            let current = plan.current(state);
            if rules.require_answer_to_advance && !state.answers.contains_key(&current.id) {
                return Err(TransitionViolation::Unanswered {
                    question_id: current.id.clone(),
                }
                .into());
            }
            if state.current_index >= plan.last_index() {
                return Ok((state.clone(), Effect::Stayed));
            }
            Ok(move_to(plan, state, state.current_index + 1, now))
        }
        QuizAction::Previous => {
            if state.current_index == 0 {
                return Ok((state.clone(), Effect::Stayed));
            }
            Ok(move_to(plan, state, state.current_index - 1, now))
        }
        QuizAction::Submit => submit(plan, rules, state, now),
    }
}

fn answer_current(
    plan: &QuizPlan,
    state: &QuizSessionState,
    answer: UserAnswer,
) -> Result<(QuizSessionState, Effect), QuizError> {
    let current = plan.current(state);
    if answer.question_id != current.id {
        return Err(TransitionViolation::NotCurrentQuestion {
            current: current.id.clone(),
            given: answer.question_id,
        }
        .into());
    }

    let expected = QuestionDispatcher::route(current)?.expected_answer();
    if answer.kind() != expected {
        return Err(TransitionViolation::AnswerKindMismatch {
            question_id: current.id.clone(),
            expected,
            given: answer.kind(),
        }
        .into());
    }

    let mut next = state.clone();
    let question_id = current.id.clone();
    if answer.is_empty() {
        next.answers.remove(&question_id);
        Ok((next, Effect::Cleared { question_id }))
    } else {
        next.answers.insert(question_id.clone(), answer);
        Ok((next, Effect::Answered { question_id }))
    }
}

fn move_to(
    plan: &QuizPlan,
    state: &QuizSessionState,
    to: usize,
    now: DateTime<Utc>,
) -> (QuizSessionState, Effect) {
    let mut next = state.clone();
    let leaving = plan.current(state).id.clone();
    next.close_question_timer(&leaving, now);
    next.current_index = to;
    (
        next,
        Effect::Moved {
            from: state.current_index,
            to,
        },
    )
}

fn submit(
    plan: &QuizPlan,
    rules: &SessionRules,
    state: &QuizSessionState,
    now: DateTime<Utc>,
) -> Result<(QuizSessionState, Effect), QuizError> {
    if state.current_index != plan.last_index() {
        return Err(TransitionViolation::NotOnLastQuestion {
            index: state.current_index,
            count: plan.len(),
        }
        .into());
    }
    let current = plan.current(state);
    if !state.answers.contains_key(&current.id) {
        return Err(TransitionViolation::Unanswered {
            question_id: current.id.clone(),
        }
        .into());
    }

    let mut next = state.clone();
    let current_id = current.id.clone();
    next.close_question_timer(&current_id, now);
    next.total_time = Some(elapsed_secs(state.session_start_time, now));
    next.completed_at = Some(now);

    let questions: Vec<&Question> = plan.ordered().collect();
    let record = ResultReporter::new(rules.calculator).build_attempt(
        &plan.content().id,
        &questions,
        &next,
    )?;

    next.outcome = Some(ScoreSummary {
        total_score: record.score,
        max_score: record.max_score,
        percentage: record.percentage,
    });
    next.phase = SessionPhase::Submitted;
    Ok((next, Effect::Submitted(Box::new(record))))
}

/// One learner's attempt at a quiz.
///
/// Exclusively owned by its caller. Every method is synchronous except the
/// persistence handoff.
pub struct QuizSession<C: Clock = SystemClock> {
    plan: QuizPlan,
    rules: SessionRules,
    clock: C,
    state: QuizSessionState,
}

impl QuizSession<SystemClock> {
    /// Start a session with default settings and the system clock.
    pub fn new(content: QuizContent) -> Result<Self, QuizError> {
        Self::with_clock(content, &EngineConfig::default(), SystemClock)
    }
}

impl<C: Clock> QuizSession<C> {
    pub fn with_clock(
        content: QuizContent,
        config: &EngineConfig,
        clock: C,
    ) -> Result<Self, QuizError> {
        let plan = QuizPlan::new(content)?;
        let state = QuizSessionState::new(plan.content().id.clone(), clock.now());
        tracing::debug!(
            run_id = %state.run_id,
            content_id = %plan.content().id,
            questions = plan.len(),
            "quiz session started"
        );
        Ok(Self {
            plan,
            rules: SessionRules::from(config),
            clock,
            state,
        })
    }

    /// Resume a previously saved state.
    ///
    /// The state must belong to this content and point at an existing question.
    pub fn resume(
        content: QuizContent,
        config: &EngineConfig,
        clock: C,
        state: QuizSessionState,
    ) -> Result<Self, QuizError> {
        let plan = QuizPlan::new(content)?;
        let mismatch = |reason: String| QuizError::StateMismatch {
            content_id: plan.content().id.clone(),
            reason,
        };
        if state.content_id != plan.content().id {
            return Err(mismatch(format!("state belongs to {}", state.content_id)));
        }
        if state.current_index >= plan.len() {
            return Err(mismatch(format!(
                "current index {} out of range for {} questions",
                state.current_index,
                plan.len()
            )));
        }
        for (id, answer) in &state.answers {
            let Some(question) = plan.content().question(id) else {
                return Err(mismatch(format!("answer for unknown question {id}")));
            };
            if answer.question_id != *id {
                return Err(mismatch(format!(
                    "answer stored under {id} belongs to {}",
                    answer.question_id
                )));
            }
            let expected = QuestionDispatcher::route(question)?.expected_answer();
            if answer.kind() != expected {
                return Err(mismatch(format!(
                    "{id} has a {} answer, expected {expected}",
                    answer.kind()
                )));
            }
        }
        let finished = state.outcome.is_some()
            && state.completed_at.is_some()
            && state.total_time.is_some();
        match state.phase {
            SessionPhase::InProgress if state.outcome.is_some() => {
                return Err(mismatch("in-progress state carries a score".into()));
            }
            SessionPhase::Submitted | SessionPhase::Reviewing if !finished => {
                return Err(mismatch(format!(
                    "{} state is missing its score or completion time",
                    state.phase
                )));
            }
            _ => {}
        }
        Ok(Self {
            plan,
            rules: SessionRules::from(config),
            clock,
            state,
        })
    }

    /// Apply an action at the current clock time.
    pub fn dispatch(&mut self, action: QuizAction) -> Result<Effect, QuizError> {
        let now = self.clock.now();
        let label = action_label(&action);
        match reduce(&self.plan, &self.rules, &self.state, action, now) {
            Ok((state, effect)) => {
                self.state = state;
                tracing::debug!(
                    run_id = %self.state.run_id,
                    action = label,
                    index = self.state.current_index,
                    phase = %self.state.phase,
                    "transition accepted"
                );
                Ok(effect)
            }
            Err(e) => {
                tracing::debug!(
                    run_id = %self.state.run_id,
                    action = label,
                    "transition rejected: {e}"
                );
                Err(e)
            }
        }
    }

    /// Record an answer for `question_id`, which must be the current question.
    pub fn answer(
        &mut self,
        question_id: &str,
        response: AnswerResponse,
    ) -> Result<Effect, QuizError> {
        self.dispatch(QuizAction::Answer(UserAnswer {
            question_id: question_id.to_string(),
            response,
        }))
    }

    /// Select an option on the current question.
    pub fn select_option(&mut self, option_id: &str) -> Result<Effect, QuizError> {
        let question_id = self.current_question().id.clone();
        self.answer(
            &question_id,
            AnswerResponse::Option {
                selected_option_id: option_id.to_string(),
            },
        )
    }

    /// Type an answer for the current question.
    pub fn type_answer(&mut self, text: &str) -> Result<Effect, QuizError> {
        let question_id = self.current_question().id.clone();
        self.answer(
            &question_id,
            AnswerResponse::Text {
                text_answer: text.to_string(),
            },
        )
    }

    pub fn next(&mut self) -> Result<Effect, QuizError> {
        self.dispatch(QuizAction::Next)
    }

    pub fn previous(&mut self) -> Result<Effect, QuizError> {
        self.dispatch(QuizAction::Previous)
    }

    /// Finish the attempt. Only the first successful call yields a record.
    pub fn submit(&mut self) -> Result<SubmitOutcome, QuizError> {
        match self.dispatch(QuizAction::Submit)? {
            Effect::Submitted(record) => {
                tracing::info!(
                    run_id = %self.state.run_id,
                    content_id = %record.content_id,
                    score = record.score,
                    max_score = record.max_score,
                    percentage = record.percentage,
                    "quiz submitted"
                );
                Ok(SubmitOutcome::Submitted(*record))
            }
            _ => Ok(SubmitOutcome::AlreadySubmitted),
        }
    }

    /// Submit and hand a fresh record to `sink` exactly once.
    ///
    /// A repeated call returns [`SubmitOutcome::AlreadySubmitted`] without
    /// touching the sink. Sink failures come back as [`PersistError`] with the
    /// record attached; no retry is attempted.
    pub async fn submit_and_persist(
        &mut self,
        sink: &dyn AttemptSink,
    ) -> Result<SubmitOutcome, SubmitError> {
        match self.submit()? {
            SubmitOutcome::Submitted(record) => {
                if let Err(cause) = sink.save(&record).await {
                    tracing::error!(
                        run_id = %self.state.run_id,
                        "failed to persist attempt: {cause:#}"
                    );
                    return Err(PersistError { record, cause }.into());
                }
                Ok(SubmitOutcome::Submitted(record))
            }
            SubmitOutcome::AlreadySubmitted => Ok(SubmitOutcome::AlreadySubmitted),
        }
    }

    /// Move from Submitted to Reviewing.
    pub fn review(&mut self) -> Result<Effect, QuizError> {
        self.dispatch(QuizAction::Review)
    }

    /// Start over from the first question. Allowed in any phase.
    pub fn retry(&mut self) -> Effect {
        let now = self.clock.now();
        let previous = self.state.run_id;
        self.state = QuizSessionState::new(self.plan.content().id.clone(), now);
        tracing::debug!(previous_run = %previous, run_id = %self.state.run_id, "quiz retried");
        Effect::Reset
    }

    pub fn state(&self) -> &QuizSessionState {
        &self.state
    }

    pub fn into_state(self) -> QuizSessionState {
        self.state
    }

    pub fn content(&self) -> &QuizContent {
        self.plan.content()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn question_count(&self) -> usize {
        self.plan.len()
    }

    pub fn current_question(&self) -> &Question {
        self.plan.current(&self.state)
    }

    /// Learner-facing view of the current question.
    pub fn current_view(&self) -> Result<QuestionView, QuizError> {
        QuestionDispatcher::view(self.current_question())
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&UserAnswer> {
        self.state.answers.get(question_id)
    }

    pub fn answered_count(&self) -> usize {
        self.state.answers.len()
    }

    /// Fraction of questions answered, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.answered_count() as f64 / self.plan.len() as f64
    }

    pub fn is_last_question(&self) -> bool {
        self.state.current_index == self.plan.last_index()
    }

    pub fn is_current_answered(&self) -> bool {
        self.state.answers.contains_key(&self.current_question().id)
    }

    /// Whether `next()` would move forward.
    pub fn can_advance(&self) -> bool {
        self.state.phase == SessionPhase::InProgress
            && !self.is_last_question()
            && (!self.rules.require_answer_to_advance || self.is_current_answered())
    }

    /// Whether `submit()` would produce a record.
    pub fn can_submit(&self) -> bool {
        self.state.phase == SessionPhase::InProgress
            && self.is_last_question()
            && self.is_current_answered()
    }

    /// Score and tier kept after submission.
    pub fn outcome(&self) -> Option<(ScoreSummary, Performance)> {
        self.state
            .outcome
            .map(|s| (s, ScoreCalculator::performance_level(s.percentage)))
    }

    /// Per-question feedback, available once submitted.
    pub fn review_items(&self) -> Result<Vec<ReviewItem>, QuizError> {
        if !self.state.is_submitted() {
            return Err(TransitionViolation::NotSubmitted {
                phase: self.state.phase,
            }
            .into());
        }
        let questions: Vec<&Question> = self.plan.ordered().collect();
        ResultReporter::new(self.rules.calculator).review_items(&questions, &self.state)
    }
}

fn action_label(action: &QuizAction) -> &'static str {
    match action {
        QuizAction::Answer(_) => "answer",
        QuizAction::Next => "next",
        QuizAction::Previous => "previous",
        QuizAction::Submit => "submit",
        QuizAction::Review => "review",
        QuizAction::Retry => "retry",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::AnswerOption;
    use chrono::TimeZone;

    fn mc(id: &str, order_index: i32) -> Question {
        Question {
            id: id.into(),
            content_id: "reading-1".into(),
            question_type: "multiple_choice".into(),
            text: format!("Question {id}"),
            options: vec![
                AnswerOption {
                    id: format!("{id}-a"),
                    text: "right".into(),
                    is_correct: true,
                },
                AnswerOption {
                    id: format!("{id}-b"),
                    text: "wrong".into(),
                    is_correct: false,
                },
            ],
            points: 5,
            order_index,
            correct_answer: None,
        }
    }

    fn content() -> QuizContent {
        QuizContent {
            id: "reading-1".into(),
            title: "Reading 1".into(),
            // Declared out of order on purpose.
            questions: vec![mc("q3", 3), mc("q1", 1), mc("q2", 2)],
        }
    }

    fn session() -> (QuizSession<ManualClock>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        let s = QuizSession::with_clock(content(), &EngineConfig::default(), clock.clone()).unwrap();
        (s, clock)
    }

    #[test]
    fn starts_on_lowest_order_index() {
        let (s, _) = session();
        assert_eq!(s.phase(), SessionPhase::InProgress);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.current_question().id, "q1");
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let empty = QuizContent {
            id: "empty".into(),
            title: "Empty".into(),
            questions: vec![],
        };
        assert!(matches!(
            QuizSession::new(empty),
            Err(QuizError::EmptyQuiz { .. })
        ));
    }

    #[test]
    fn answer_must_target_current_question() {
        let (mut s, _) = session();
        let err = s
            .answer(
                "q2",
                AnswerResponse::Option {
                    selected_option_id: "q2-a".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(TransitionViolation::NotCurrentQuestion { .. })
        ));
        assert!(s.state().answers.is_empty());
    }

    #[test]
    fn answer_kind_must_match_question_type() {
        let (mut s, _) = session();
        let err = s.type_answer("right").unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(TransitionViolation::AnswerKindMismatch { .. })
        ));
    }

    #[test]
    fn answer_overwrites_and_does_not_move() {
        let (mut s, clock) = session();
        s.select_option("q1-b").unwrap();
        clock.advance_secs(4);
        s.select_option("q1-a").unwrap();
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.answer_for("q1").unwrap().selected_option_id(), Some("q1-a"));
        assert!(s.state().per_question_seconds.is_empty());
    }

    #[test]
    fn empty_answer_clears() {
        let (mut s, _) = session();
        s.select_option("q1-a").unwrap();
        let effect = s.select_option("").unwrap();
        assert_eq!(effect, Effect::Cleared { question_id: "q1".into() });
        assert!(!s.is_current_answered());
    }

    #[test]
    fn next_records_floored_time() {
        let (mut s, clock) = session();
        s.select_option("q1-a").unwrap();
        clock.advance(chrono::Duration::milliseconds(7_900));
        assert_eq!(s.next().unwrap(), Effect::Moved { from: 0, to: 1 });
        assert_eq!(s.state().per_question_seconds["q1"], 7);
    }

    #[test]
    fn revisits_accumulate_time() {
        let (mut s, clock) = session();
        s.select_option("q1-a").unwrap();
        clock.advance_secs(5);
        s.next().unwrap();
        clock.advance_secs(2);
        s.previous().unwrap();
        clock.advance_secs(3);
        s.next().unwrap();
        assert_eq!(s.state().per_question_seconds["q1"], 8);
        assert_eq!(s.state().per_question_seconds["q2"], 2);
    }

    #[test]
    fn previous_at_first_question_stays() {
        let (mut s, _) = session();
        assert_eq!(s.previous().unwrap(), Effect::Stayed);
        assert_eq!(s.current_index(), 0);
    }

    #[test]
    fn next_at_last_question_is_noop() {
        let (mut s, _) = session();
        for id in ["q1", "q2"] {
            s.select_option(&format!("{id}-a")).unwrap();
            s.next().unwrap();
        }
        s.select_option("q3-a").unwrap();
        let before = s.state().clone();
        assert_eq!(s.next().unwrap(), Effect::Stayed);
        assert_eq!(s.state(), &before);
    }

    #[test]
    fn submit_requires_last_question() {
        let (mut s, _) = session();
        s.select_option("q1-a").unwrap();
        let err = s.submit().unwrap_err();
        assert!(matches!(
            err.violation(),
            Some(TransitionViolation::NotOnLastQuestion { index: 0, count: 3 })
        ));
    }

    #[test]
    fn optional_answer_rule_allows_skipping() {
        let clock = ManualClock::new(Utc::now());
        let config = EngineConfig {
            require_answer_to_advance: false,
            ..EngineConfig::default()
        };
        let mut s = QuizSession::with_clock(content(), &config, clock).unwrap();
        assert!(s.can_advance());
        assert_eq!(s.next().unwrap(), Effect::Moved { from: 0, to: 1 });
    }

    #[test]
    fn mutations_after_submit_are_rejected() {
        let (mut s, _) = session();
        for id in ["q1", "q2"] {
            s.select_option(&format!("{id}-a")).unwrap();
            s.next().unwrap();
        }
        s.select_option("q3-a").unwrap();
        assert!(matches!(s.submit().unwrap(), SubmitOutcome::Submitted(_)));

        for result in [s.select_option("q3-b"), s.next(), s.previous()] {
            assert!(matches!(
                result.unwrap_err().violation(),
                Some(TransitionViolation::NotInProgress { phase: SessionPhase::Submitted })
            ));
        }
    }

    #[test]
    fn review_follows_submit() {
        let (mut s, _) = session();
        assert!(s.review().is_err());
        assert!(s.review_items().is_err());
        for id in ["q1", "q2"] {
            s.select_option(&format!("{id}-a")).unwrap();
            s.next().unwrap();
        }
        s.select_option("q3-b").unwrap();
        s.submit().unwrap();
        assert_eq!(s.review().unwrap(), Effect::Reviewing);
        assert_eq!(s.phase(), SessionPhase::Reviewing);
        let reviewing = s.state().clone();
        assert_eq!(s.review().unwrap(), Effect::Reviewing);
        assert_eq!(s.state(), &reviewing);
        assert_eq!(s.submit().unwrap(), SubmitOutcome::AlreadySubmitted);

        let items = s.review_items().unwrap();
        assert_eq!(items.len(), 3);
        assert!(!items[2].is_correct);
        assert_eq!(items[2].correct_answer_text, "right");

        let (summary, perf) = s.outcome().unwrap();
        assert_eq!(summary.total_score, 10);
        // 10 of 15 points.
        assert!((summary.percentage - 66.67).abs() < 1e-9);
        assert_eq!(perf.level, crate::scoring::PerformanceLevel::Pass);
    }

    #[test]
    fn state_round_trips_through_json_and_resumes() {
        let (mut s, clock) = session();
        s.select_option("q1-a").unwrap();
        s.next().unwrap();
        let json = serde_json::to_string(s.state()).unwrap();

        let state: QuizSessionState = serde_json::from_str(&json).unwrap();
        let resumed =
            QuizSession::resume(content(), &EngineConfig::default(), clock, state).unwrap();
        assert_eq!(resumed.current_question().id, "q2");
        assert_eq!(resumed.answered_count(), 1);
    }

    #[test]
    fn resume_rejects_foreign_state() {
        let (s, clock) = session();
        let mut state = s.into_state();
        state.current_index = 7;
        let err = QuizSession::resume(content(), &EngineConfig::default(), clock, state)
            .err()
            .unwrap();
        assert!(matches!(err, QuizError::StateMismatch { .. }));
    }

    #[test]
    fn resume_rejects_inconsistent_answers() {
        let (mut s, clock) = session();
        s.select_option("q1-a").unwrap();
        let mut state = s.into_state();
        state
            .answers
            .insert("q1".into(), UserAnswer::text("q1", "right"));
        let err = QuizSession::resume(content(), &EngineConfig::default(), clock.clone(), state)
            .err()
            .unwrap();
        assert!(matches!(err, QuizError::StateMismatch { ref reason, .. } if reason.contains("text answer")));

        let (s, _) = session();
        let mut state = s.into_state();
        state
            .answers
            .insert("q2".into(), UserAnswer::option("q1", "q1-a"));
        assert!(matches!(
            QuizSession::resume(content(), &EngineConfig::default(), clock, state),
            Err(QuizError::StateMismatch { .. })
        ));
    }

    #[test]
    fn resume_rejects_phase_without_outcome() {
        let (mut s, clock) = session();
        for id in ["q1", "q2"] {
            s.select_option(&format!("{id}-a")).unwrap();
            s.next().unwrap();
        }
        s.select_option("q3-a").unwrap();
        s.submit().unwrap();
        let submitted = s.into_state();

        let mut missing = submitted.clone();
        missing.outcome = None;
        assert!(matches!(
            QuizSession::resume(content(), &EngineConfig::default(), clock.clone(), missing),
            Err(QuizError::StateMismatch { .. })
        ));

        let mut scored = submitted.clone();
        scored.phase = SessionPhase::InProgress;
        assert!(matches!(
            QuizSession::resume(content(), &EngineConfig::default(), clock.clone(), scored),
            Err(QuizError::StateMismatch { .. })
        ));

        let resumed =
            QuizSession::resume(content(), &EngineConfig::default(), clock, submitted).unwrap();
        assert_eq!(resumed.phase(), SessionPhase::Submitted);
        assert_eq!(resumed.outcome().unwrap().0.total_score, 15);
    }

    #[test]
    fn unknown_question_type_is_rejected_at_start() {
        let mut odd = content();
        odd.questions[1].question_type = "matching".into();
        let err = QuizSession::with_clock(odd, &EngineConfig::default(), SystemClock)
            .err()
            .unwrap();
        assert_eq!(
            err,
            QuizError::UnknownQuestionType {
                question_id: "q1".into(),
                tag: "matching".into()
            }
        );
    }

    #[test]
    fn reducer_leaves_input_untouched_on_error() {
        let plan = QuizPlan::new(content()).unwrap();
        let now = Utc::now();
        let state = QuizSessionState::new("reading-1", now);
        let before = state.clone();
        let result = reduce(&plan, &SessionRules::default(), &state, QuizAction::Next, now);
        assert!(result.is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn progress_helpers() {
        let (mut s, _) = session();
        assert!(!s.can_advance());
        assert!(!s.can_submit());
        s.select_option("q1-a").unwrap();
        assert!(s.can_advance());
        assert!((s.progress() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.current_view().unwrap().choices.len(), 2);
    }
}
