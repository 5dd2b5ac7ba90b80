//! The `lingoquiz replay` command.
//!
//! Drives one session through a TOML action script on a manual clock, so the
//! same script always produces the same attempt record.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use lingoquiz_core::clock::ManualClock;
use lingoquiz_core::config::load_config_from;
use lingoquiz_core::model::AnswerKind;
use lingoquiz_core::parser;
use lingoquiz_core::report::AttemptRecord;
use lingoquiz_core::traits::AttemptSink;
use lingoquiz_core::{QuizError, QuizSession, SubmitError, SubmitOutcome};

#[derive(Debug, Deserialize)]
struct Script {
    /// Clock start. Defaults to 2024-01-01T00:00:00Z.
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    action: StepAction,
    /// Option id for `answer` on choice questions.
    #[serde(default)]
    option: Option<String>,
    /// Typed text for `answer` on fill-blank questions.
    #[serde(default)]
    text: Option<String>,
    /// Seconds the learner spends before this step.
    #[serde(default)]
    wait_secs: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StepAction {
    Answer,
    Next,
    Previous,
    Submit,
    Review,
    Retry,
}

fn parse_script(path: &Path) -> Result<Script> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("failed to parse script: {}", path.display()))
}

/// Writes each attempt as `<content_id>-attempt.json` under a directory.
struct JsonFileSink {
    dir: PathBuf,
}

#[async_trait]
impl AttemptSink for JsonFileSink {
    async fn save(&self, record: &AttemptRecord) -> Result<()> {
        let path = self.dir.join(format!("{}-attempt.json", record.content_id));
        record.save_json(&path)?;
        println!("Attempt saved to: {}", path.display());
        Ok(())
    }
}

pub async fn execute(
    content_path: PathBuf,
    script_path: PathBuf,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let content = parser::parse_quiz_content(&content_path)?;
    let script = parse_script(&script_path)?;

    let start = match script.started_at {
        Some(t) => t,
        None => Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .context("invalid default start time")?,
    };
    let clock = ManualClock::new(start);
    let mut session = QuizSession::with_clock(content, &config, clock.clone())?;
    let sink = output.map(|dir| JsonFileSink { dir });

    println!(
        "Replaying {} steps against {} ({} questions)",
        script.steps.len(),
        session.content().id,
        session.question_count()
    );

    let mut last_record = None;
    for (n, step) in script.steps.iter().enumerate() {
        clock.advance_secs(i64::from(step.wait_secs));
        tracing::debug!(step = n + 1, action = ?step.action, "applying step");
        match apply(&mut session, step, sink.as_ref()).await {
            Ok(Some(record)) => last_record = Some(record),
            Ok(None) => {}
            Err(e) if e.is_recoverable() => {
                eprintln!("  step {}: rejected: {e}", n + 1);
            }
            Err(e) => return Err(anyhow::Error::new(e).context(format!("step {} failed", n + 1))),
        }
    }

    // A retry after the last submit leaves nothing to report.
    match last_record.filter(|_| session.state().is_submitted()) {
        Some(record) => print_results(&session, &record)?,
        None => println!(
            "Session not submitted: {}/{} answered, on question {}.",
            session.answered_count(),
            session.question_count(),
            session.current_index() + 1
        ),
    }

    Ok(())
}

async fn apply(
    session: &mut QuizSession<ManualClock>,
    step: &Step,
    sink: Option<&JsonFileSink>,
) -> Result<Option<AttemptRecord>, QuizError> {
    match step.action {
        StepAction::Answer => {
            match (&step.option, &step.text) {
                (Some(option), _) => session.select_option(option)?,
                (None, Some(text)) => session.type_answer(text)?,
                // No value clears the current answer.
                (None, None) => match session.current_view()?.strategy.expected_answer() {
                    AnswerKind::Option => session.select_option("")?,
                    AnswerKind::Text => session.type_answer("")?,
                },
            };
        }
        StepAction::Next => {
            session.next()?;
        }
        StepAction::Previous => {
            session.previous()?;
        }
        StepAction::Review => {
            session.review()?;
        }
        StepAction::Retry => {
            session.retry();
        }
        StepAction::Submit => {
            let outcome = match sink {
                Some(sink) => match session.submit_and_persist(sink).await {
                    Ok(outcome) => outcome,
                    Err(SubmitError::Quiz(e)) => return Err(e),
                    Err(SubmitError::Persist(e)) => {
                        eprintln!("  {e}");
                        SubmitOutcome::Submitted(e.record)
                    }
                },
                None => session.submit()?,
            };
            if let SubmitOutcome::Submitted(record) = outcome {
                return Ok(Some(record));
            }
        }
    }
    Ok(None)
}

fn print_results(session: &QuizSession<ManualClock>, record: &AttemptRecord) -> Result<()> {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Question",
        "Answer",
        "Correct Answer",
        "Result",
        "Points",
        "Time",
    ]);

    let items = session.review_items()?;
    for (item, answer) in items.iter().zip(&record.answers) {
        table.add_row(vec![
            Cell::new(&item.question_id),
            Cell::new(item.user_answer.as_deref().unwrap_or("-")),
            Cell::new(&item.correct_answer_text),
            Cell::new(if item.is_correct { "OK" } else { "WRONG" }),
            Cell::new(if item.is_correct { item.points } else { 0 }),
            Cell::new(format!("{}s", answer.time_taken)),
        ]);
    }

    println!("\n{table}");
    println!("\n{}", record.to_summary_line());
    let performance = lingoquiz_core::scoring::ScoreCalculator::performance_level(record.percentage);
    println!("{}", performance.message);
    Ok(())
}
