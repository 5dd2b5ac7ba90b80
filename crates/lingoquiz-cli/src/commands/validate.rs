//! The `lingoquiz validate` command.

use std::path::PathBuf;

use anyhow::Result;

use lingoquiz_core::parser;

pub fn execute(content_path: PathBuf) -> Result<()> {
    let quizzes = if content_path.is_dir() {
        parser::load_quiz_directory(&content_path)?
    } else {
        vec![parser::parse_quiz_content(&content_path)?]
    };

    let mut total_warnings = 0;

    for quiz in &quizzes {
        println!(
            "Quiz: {} ({} questions, {} points)",
            quiz.id,
            quiz.questions.len(),
            quiz.max_score()
        );

        let warnings = parser::validate_quiz_content(quiz);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All quizzes valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
