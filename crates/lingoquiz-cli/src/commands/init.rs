//! The `lingoquiz init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("lingoquiz.toml").exists() {
        println!("lingoquiz.toml already exists, skipping.");
    } else {
        std::fs::write("lingoquiz.toml", SAMPLE_CONFIG)?;
        println!("Created lingoquiz.toml");
    }

    std::fs::create_dir_all("quizzes")?;
    let example_path = std::path::Path::new("quizzes/example.toml");
    if example_path.exists() {
        println!("quizzes/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_QUIZ)?;
        println!("Created quizzes/example.toml");
    }

    let script_path = std::path::Path::new("quizzes/example-script.toml");
    if script_path.exists() {
        println!("quizzes/example-script.toml already exists, skipping.");
    } else {
        std::fs::write(script_path, EXAMPLE_SCRIPT)?;
        println!("Created quizzes/example-script.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: lingoquiz validate --content quizzes/example.toml");
    println!(
        "  2. Run: lingoquiz replay --content quizzes/example.toml --script quizzes/example-script.toml"
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# lingoquiz configuration

# Require an answer before moving to the next question.
require_answer_to_advance = true

# Fill-blank answer key: "options" or "options_or_field".
fill_blank_key = "options"

# Decimal places kept in the percentage.
score_precision = 2
"#;

const EXAMPLE_QUIZ: &str = r#"[quiz]
id = "example"
title = "Spanish basics"

[[questions]]
id = "q1"
type = "multiple_choice"
text = "What does \"perro\" mean?"
points = 5
order_index = 1

[[questions.options]]
id = "q1-a"
text = "dog"
is_correct = true

[[questions.options]]
id = "q1-b"
text = "cat"

[[questions.options]]
id = "q1-c"
text = "bird"

[[questions]]
id = "q2"
type = "true_false"
text = "\"Gracias\" means \"please\"."
points = 5
order_index = 2

[[questions.options]]
id = "q2-true"
text = "True"

[[questions.options]]
id = "q2-false"
text = "False"
is_correct = true

[[questions]]
id = "q3"
type = "fill_blank"
text = "Buenos ___ (good morning)"
points = 10
order_index = 3

[[questions.options]]
id = "q3-key"
text = "días"
is_correct = true
"#;

const EXAMPLE_SCRIPT: &str = r#"started_at = "2024-05-01T10:00:00Z"

[[steps]]
action = "answer"
option = "q1-a"
wait_secs = 8

[[steps]]
action = "next"

[[steps]]
action = "answer"
option = "q2-true"
wait_secs = 5

[[steps]]
action = "next"

[[steps]]
action = "answer"
text = " Días "
wait_secs = 12

[[steps]]
action = "submit"

[[steps]]
action = "review"
"#;
