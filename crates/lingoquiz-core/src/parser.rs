//! TOML quiz content parser.
//!
//! Loads quiz content from TOML files and directories, and validates it.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{AnswerOption, LegacyQuestion, Question, QuestionKind, QuizContent};

/// Intermediate TOML structure for parsing quiz files.
#[derive(Debug, Deserialize)]
struct TomlQuizFile {
    quiz: TomlQuizHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuizHeader {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(default)]
    content_id: Option<String>,
    #[serde(rename = "type")]
    question_type: String,
    text: String,
    #[serde(default)]
    options: Option<TomlOptions>,
    points: u32,
    #[serde(default)]
    order_index: Option<i32>,
    #[serde(default)]
    correct_answer: Option<String>,
}

/// Options either as `[[questions.options]]` tables or, in older exports,
/// as a plain string array keyed by `correct_answer`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlOptions {
    Rich(Vec<TomlOption>),
    Legacy(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct TomlOption {
    id: String,
    text: String,
    #[serde(default)]
    is_correct: bool,
}

/// Parse a single TOML file into `QuizContent`.
pub fn parse_quiz_content(path: &Path) -> Result<QuizContent> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;

    parse_quiz_content_str(&content, path)
}

/// Parse a TOML string into `QuizContent` (useful for testing).
pub fn parse_quiz_content_str(content: &str, source_path: &Path) -> Result<QuizContent> {
    let parsed: TomlQuizFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let quiz_id = parsed.quiz.id;
    let questions = parsed
        .questions
        .into_iter()
        .enumerate()
        .map(|(position, q)| {
            let content_id = q.content_id.unwrap_or_else(|| quiz_id.clone());
            let order_index = q.order_index.unwrap_or(position as i32);
            let has_key = q
                .correct_answer
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty());
            // An empty or missing option list keyed by `correct_answer` is the
            // flat export shape too.
            let options = match q.options {
                Some(TomlOptions::Rich(rich)) if rich.is_empty() && has_key => {
                    Some(TomlOptions::Legacy(Vec::new()))
                }
                None if has_key => Some(TomlOptions::Legacy(Vec::new())),
                other => other,
            };
            match options {
                Some(TomlOptions::Legacy(options)) => LegacyQuestion {
                    id: q.id,
                    content_id,
                    question_type: q.question_type,
                    text: q.text,
                    options,
                    points: q.points,
                    order_index,
                    correct_answer: q.correct_answer,
                }
                .into_question(),
                rich => Question {
                    id: q.id,
                    content_id,
                    question_type: q.question_type,
                    text: q.text,
                    options: match rich {
                        Some(TomlOptions::Rich(options)) => options
                            .into_iter()
                            .map(|o| AnswerOption {
                                id: o.id,
                                text: o.text,
                                is_correct: o.is_correct,
                            })
                            .collect(),
                        _ => Vec::new(),
                    },
                    points: q.points,
                    order_index,
                    correct_answer: q.correct_answer,
                },
            }
        })
        .collect();

    Ok(QuizContent {
        id: quiz_id,
        title: parsed.quiz.title,
        questions,
    })
}

/// Recursively load all `.toml` quiz files from a directory.
pub fn load_quiz_directory(dir: &Path) -> Result<Vec<QuizContent>> {
    let mut quizzes = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            quizzes.extend(load_quiz_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_quiz_content(&path) {
                Ok(quiz) => quizzes.push(quiz),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    quizzes.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(quizzes)
}

/// A warning from content validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn question(question: &Question, message: impl Into<String>) -> Self {
        Self {
            question_id: Some(question.id.clone()),
            message: message.into(),
        }
    }
}

/// Validate quiz content against the data-model invariants.
pub fn validate_quiz_content(quiz: &QuizContent) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if quiz.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "quiz has no questions".into(),
        });
        return warnings;
    }

    let mut seen_ids = HashSet::new();
    let mut seen_order = HashSet::new();
    let mut previous_order: Option<i32> = None;
    for q in &quiz.questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(ValidationWarning::question(
                q,
                format!("duplicate question ID: {}", q.id),
            ));
        }
        if !seen_order.insert(q.order_index) {
            warnings.push(ValidationWarning::question(
                q,
                format!("duplicate order_index: {}", q.order_index),
            ));
        } else if previous_order.is_some_and(|prev| q.order_index < prev) {
            warnings.push(ValidationWarning::question(
                q,
                format!("order_index {} is not ascending", q.order_index),
            ));
        }
        previous_order = Some(q.order_index);
    }

    for q in &quiz.questions {
        if q.text.trim().is_empty() {
            warnings.push(ValidationWarning::question(q, "question text is empty"));
        }
        if q.points == 0 {
            warnings.push(ValidationWarning::question(q, "points must be greater than zero"));
        }

        let mut option_ids = HashSet::new();
        for o in &q.options {
            if !option_ids.insert(&o.id) {
                warnings.push(ValidationWarning::question(
                    q,
                    format!("duplicate option ID: {}", o.id),
                ));
            }
        }

        let correct = q.correct_options().count();
        match q.kind() {
            Err(e) => warnings.push(ValidationWarning::question(q, e.to_string())),
            Ok(QuestionKind::MultipleChoice | QuestionKind::TrueFalse) => {
                if correct != 1 {
                    warnings.push(ValidationWarning::question(
                        q,
                        format!("expected exactly one correct option, found {correct}"),
                    ));
                }
                if q.correct_answer.is_some() {
                    warnings.push(ValidationWarning::question(
                        q,
                        "correct_answer is only used by fill_blank questions",
                    ));
                }
            }
            Ok(QuestionKind::FillBlank) => {
                let has_field = q
                    .correct_answer
                    .as_deref()
                    .is_some_and(|a| !a.trim().is_empty());
                if correct == 0 && !has_field {
                    warnings.push(ValidationWarning::question(
                        q,
                        "fill_blank needs a correct option or correct_answer",
                    ));
                } else if correct == 0 {
                    warnings.push(ValidationWarning::question(
                        q,
                        "answer key is only in correct_answer; scored only with fill_blank_key = \"options_or_field\"",
                    ));
                }
            }
        }
    }

    warnings
}
