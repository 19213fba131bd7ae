//! The `quizlingo list` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::Table;

pub async fn execute(json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let (_, backend) = super::open_backend(config_path)?;
    let quizzes = backend
        .quizzes
        .list_quizzes()
        .await
        .context("failed to list quizzes")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&quizzes)?);
        return Ok(());
    }

    if quizzes.is_empty() {
        println!("No quizzes found. Publish one with `quizlingo publish --quiz <draft.toml>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Author"]);
    for quiz in &quizzes {
        table.add_row(vec![quiz.id.to_string(), quiz.title.clone(), quiz.author.clone()]);
    }
    println!("{table}");
    Ok(())
}
