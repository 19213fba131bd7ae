//! The `quizlingo publish` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizlingo_core::parser;

pub async fn execute(draft_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let draft = parser::parse_draft(&draft_path)?;
    for w in parser::validate_draft(&draft) {
        match w.question {
            Some(i) => eprintln!("  [question {}] WARNING: {}", i + 1, w.message),
            None => eprintln!("  WARNING: {}", w.message),
        }
    }
    let record = parser::build_record(&draft)
        .with_context(|| format!("cannot publish {}", draft_path.display()))?;

    let (_, backend) = super::open_backend(config_path)?;
    let id = backend
        .publisher
        .publish_quiz(&record)
        .await
        .context("failed to publish quiz")?;

    println!("Published \"{}\" as quiz {id}", record.title);
    Ok(())
}
