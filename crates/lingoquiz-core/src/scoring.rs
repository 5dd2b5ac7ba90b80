//! Score aggregation and performance tiers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::model::{Question, UserAnswer};
use crate::validator::AnswerValidator;

/// Aggregate result of scoring a set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total_score: u32,
    pub max_score: u32,
    /// `total_score / max_score * 100`, rounded. `0.0` when `max_score` is 0.
    pub percentage: f64,
}

/// Discrete performance tier derived from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Excellent,
    VeryGood,
    Good,
    Pass,
    NeedsImprovement,
}

impl PerformanceLevel {
    /// Tiers from best to worst with their inclusive lower bounds.
    const TIERS: [(f64, PerformanceLevel); 4] = [
        (90.0, PerformanceLevel::Excellent),
        (80.0, PerformanceLevel::VeryGood),
        (70.0, PerformanceLevel::Good),
        (60.0, PerformanceLevel::Pass),
    ];

    pub fn label(self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::VeryGood => "Very Good",
            PerformanceLevel::Good => "Good",
            PerformanceLevel::Pass => "Pass",
            PerformanceLevel::NeedsImprovement => "Needs Improvement",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Outstanding work! You have mastered this material.",
            PerformanceLevel::VeryGood => "Great job! Just a few details left to polish.",
            PerformanceLevel::Good => "Good effort. Review the questions you missed.",
            PerformanceLevel::Pass => "You passed. Another look at the lesson will help.",
            PerformanceLevel::NeedsImprovement => {
                "Keep practicing. Go through the lesson again and retry."
            }
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A performance tier together with its learner-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Performance {
    pub level: PerformanceLevel,
    pub message: &'static str,
}

/// Aggregates validator results into scores.
#[derive(Debug, Clone, Copy)]
pub struct ScoreCalculator {
    validator: AnswerValidator,
    precision: u32,
}

impl Default for ScoreCalculator {
    fn default() -> Self {
        Self::new(AnswerValidator::default())
    }
}

impl ScoreCalculator {
    pub fn new(validator: AnswerValidator) -> Self {
        Self {
            validator,
            precision: 2,
        }
    }

    /// Override the number of decimal places in the percentage.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub fn validator(&self) -> &AnswerValidator {
        &self.validator
    }

    /// Score every question against the recorded answers.
    ///
    /// Unanswered questions count toward `max_score` only. A question with an
    /// unknown type tag fails the whole calculation.
    pub fn calculate_score<'a, I>(
        &self,
        questions: I,
        answers: &BTreeMap<String, UserAnswer>,
    ) -> Result<ScoreSummary, QuizError>
    where
        I: IntoIterator<Item = &'a Question>,
    {
        let mut total_score = 0u32;
        let mut max_score = 0u32;
        for question in questions {
            max_score = max_score.saturating_add(question.points);
            if self
                .validator
                .is_correct(question, answers.get(&question.id))?
            {
                total_score = total_score.saturating_add(question.points);
            }
        }

        Ok(ScoreSummary {
            total_score,
            max_score,
            percentage: percentage(total_score, max_score, self.precision),
        })
    }

    /// Map a percentage to its tier. Pure lookup.
    pub fn performance_level(percentage: f64) -> Performance {
        let level = PerformanceLevel::TIERS
            .iter()
            .find(|(min, _)| percentage >= *min)
            .map(|(_, level)| *level)
            .unwrap_or(PerformanceLevel::NeedsImprovement);
        Performance {
            level,
            message: level.message(),
        }
    }
}

/// `score / max * 100` rounded to `precision` decimals, clamped to `[0, 100]`.
/// A zero `max` yields `0.0`.
pub fn percentage(score: u32, max: u32, precision: u32) -> f64 {
    if max == 0 {
        return 0.0;
    }
    let raw = f64::from(score) / f64::from(max) * 100.0;
    let factor = 10f64.powi(precision.min(10) as i32);
    ((raw * factor).round() / factor).clamp(0.0, 100.0)
}
