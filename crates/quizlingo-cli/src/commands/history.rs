//! The `quizlingo history` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::Table;

pub async fn execute(json: bool, config_path: Option<PathBuf>) -> Result<()> {
    let (_, backend) = super::open_backend(config_path)?;
    let results = backend
        .history
        .history()
        .await
        .context("failed to load history")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Quiz", "Result", "Date"]);
    for r in &results {
        table.add_row(vec![r.quiz_title.clone(), r.result_text.clone(), r.date.clone()]);
    }
    println!("{table}");
    Ok(())
}
