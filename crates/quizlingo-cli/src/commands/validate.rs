//! The `quizlingo validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizlingo_core::parser;

pub fn execute(draft_path: PathBuf) -> Result<()> {
    let drafts = if draft_path.is_dir() {
        parser::load_draft_directory(&draft_path)?
    } else {
        vec![parser::parse_draft(&draft_path)?]
    };

    let mut total_warnings = 0;
    let mut total_errors = 0;

    for draft in &drafts {
        println!(
            "Quiz: {} ({} questions, {} results)",
            draft.quiz.title,
            draft.questions.len(),
            draft.active_results().len()
        );

        if let Err(e) = parser::build_record(draft) {
            println!("  ERROR: {e}");
            total_errors += 1;
        }

        let warnings = parser::validate_draft(draft);
        for w in &warnings {
            let prefix = w
                .question
                .map(|i| format!("  [question {}]", i + 1))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    anyhow::ensure!(
        total_errors == 0,
        "{total_errors} quiz draft(s) cannot be published"
    );

    if total_warnings == 0 {
        println!("All quiz drafts valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
