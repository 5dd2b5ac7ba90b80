//! Per-question-type answer checking.

use crate::error::QuizError;
use crate::model::{FillBlankKey, Question, QuestionKind, UserAnswer};

/// Decides whether an answer is correct for a question.
///
/// Pure: the same `(question, answer)` always gives the same result.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerValidator {
    fill_blank_key: FillBlankKey,
}

impl AnswerValidator {
    pub fn new(fill_blank_key: FillBlankKey) -> Self {
        Self { fill_blank_key }
    }

    /// Check an answer.
    ///
    /// Absent or empty answers are incorrect. Fails only when the question's
    /// type tag is unknown.
    pub fn is_correct(
        &self,
        question: &Question,
        answer: Option<&UserAnswer>,
    ) -> Result<bool, QuizError> {
        let kind = question.kind()?;
        let Some(answer) = answer.filter(|a| !a.is_empty()) else {
            return Ok(false);
        };

        let correct = match kind {
            QuestionKind::MultipleChoice | QuestionKind::TrueFalse => answer
                .selected_option_id()
                .and_then(|id| question.option(id))
                .is_some_and(|o| o.is_correct),
            QuestionKind::FillBlank => answer
                .text_answer()
                .is_some_and(|text| self.matches_fill_blank(question, text)),
        };
        Ok(correct)
    }

    fn matches_fill_blank(&self, question: &Question, text: &str) -> bool {
        let given = normalize(text);
        if question
            .correct_options()
            .any(|o| normalize(&o.text) == given)
        {
            return true;
        }
        match self.fill_blank_key {
            FillBlankKey::Options => false,
            FillBlankKey::OptionsOrField => question
                .correct_answer
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty() && normalize(key) == given),
        }
    }

    /// Text of the first correct option, for feedback display only.
    ///
    /// Empty when no option is flagged correct. Under
    /// [`FillBlankKey::OptionsOrField`] falls back to `correct_answer`.
    pub fn correct_answer_text(&self, question: &Question) -> String {
        if let Some(option) = question.correct_options().next() {
            return option.text.clone();
        }
        match self.fill_blank_key {
            FillBlankKey::Options => String::new(),
            FillBlankKey::OptionsOrField => question.correct_answer.clone().unwrap_or_default(),
        }
    }
}

/// Trim the ends and case-fold. Internal whitespace is kept verbatim.
fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerOption;

    fn option(id: &str, text: &str, is_correct: bool) -> AnswerOption {
        AnswerOption {
            id: id.into(),
            text: text.into(),
            is_correct,
        }
    }

    fn mc() -> Question {
        Question {
            id: "q1".into(),
            content_id: "c1".into(),
            question_type: "multiple_choice".into(),
            text: "Pick the noun".into(),
            options: vec![option("a", "run", false), option("b", "house", true)],
            points: 5,
            order_index: 0,
            correct_answer: None,
        }
    }

    fn fill_blank(options: Vec<AnswerOption>, correct_answer: Option<&str>) -> Question {
        Question {
            id: "q2".into(),
            content_id: "c1".into(),
            question_type: "fill_blank".into(),
            text: "The ___ sat on the mat".into(),
            options,
            points: 10,
            order_index: 1,
            correct_answer: correct_answer.map(Into::into),
        }
    }

    #[test]
    fn multiple_choice_correct_and_incorrect() {
        let v = AnswerValidator::default();
        let q = mc();
        assert!(v.is_correct(&q, Some(&UserAnswer::option("q1", "b"))).unwrap());
        assert!(!v.is_correct(&q, Some(&UserAnswer::option("q1", "a"))).unwrap());
        assert!(!v
            .is_correct(&q, Some(&UserAnswer::option("q1", "missing")))
            .unwrap());
    }

    #[test]
    fn absent_or_empty_answer_is_incorrect() {
        let v = AnswerValidator::default();
        let q = mc();
        assert!(!v.is_correct(&q, None).unwrap());
        assert!(!v.is_correct(&q, Some(&UserAnswer::option("q1", ""))).unwrap());
    }

    #[test]
    fn option_answer_on_fill_blank_is_incorrect() {
        let v = AnswerValidator::default();
        let q = fill_blank(vec![option("o1", "cat", true)], None);
        assert!(!v.is_correct(&q, Some(&UserAnswer::option("q2", "o1"))).unwrap());
    }

    #[test]
    fn fill_blank_trims_and_folds_case() {
        let v = AnswerValidator::default();
        let q = fill_blank(vec![option("o1", "cat", true)], None);
        assert!(v.is_correct(&q, Some(&UserAnswer::text("q2", " Cat "))).unwrap());
        assert!(!v.is_correct(&q, Some(&UserAnswer::text("q2", "dog"))).unwrap());
    }

    #[test]
    fn fill_blank_internal_whitespace_is_verbatim() {
        let v = AnswerValidator::default();
        let q = fill_blank(vec![option("o1", "ice cream", true)], None);
        assert!(v
            .is_correct(&q, Some(&UserAnswer::text("q2", "Ice Cream")))
            .unwrap());
        assert!(!v
            .is_correct(&q, Some(&UserAnswer::text("q2", "ice  cream")))
            .unwrap());
    }

    #[test]
    fn fill_blank_any_correct_option_matches() {
        let v = AnswerValidator::default();
        let q = fill_blank(
            vec![
                option("o1", "colour", true),
                option("o2", "color", true),
                option("o3", "colr", false),
            ],
            None,
        );
        assert!(v.is_correct(&q, Some(&UserAnswer::text("q2", "color"))).unwrap());
        assert!(!v.is_correct(&q, Some(&UserAnswer::text("q2", "colr"))).unwrap());
    }

    #[test]
    fn legacy_field_only_used_when_configured() {
        let q = fill_blank(vec![], Some("cat"));
        let answer = UserAnswer::text("q2", "cat");

        let strict = AnswerValidator::new(FillBlankKey::Options);
        assert!(!strict.is_correct(&q, Some(&answer)).unwrap());
        assert_eq!(strict.correct_answer_text(&q), "");

        let lenient = AnswerValidator::new(FillBlankKey::OptionsOrField);
        assert!(lenient.is_correct(&q, Some(&answer)).unwrap());
        assert_eq!(lenient.correct_answer_text(&q), "cat");
    }

    #[test]
    fn correct_answer_text_uses_first_correct_option() {
        let v = AnswerValidator::default();
        assert_eq!(v.correct_answer_text(&mc()), "house");
        let q = fill_blank(vec![option("o1", "x", false)], None);
        assert_eq!(v.correct_answer_text(&q), "");
    }

    #[test]
    fn unknown_type_is_an_error() {
        let mut q = mc();
        q.question_type = "essay".into();
        let v = AnswerValidator::default();
        assert!(v.is_correct(&q, None).is_err());
    }

    #[test]
    fn is_correct_is_repeatable() {
        let v = AnswerValidator::default();
        let q = mc();
        let a = UserAnswer::option("q1", "b");
        let first = v.is_correct(&q, Some(&a)).unwrap();
        let second = v.is_correct(&q, Some(&a)).unwrap();
        assert_eq!(first, second);
    }
}
