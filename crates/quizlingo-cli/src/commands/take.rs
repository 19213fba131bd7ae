//! The `quizlingo take` command.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use comfy_table::Table;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use quizlingo_core::attempt::{Attempt, Outcome, QuizRunner, Step};
use quizlingo_core::session::QuestionView;

pub async fn execute(
    quiz_id: u64,
    answers: Option<String>,
    seed: Option<u64>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let scripted = answers.as_deref().map(parse_answers).transpose()?;

    let (config, backend) = super::open_backend(config_path)?;
    let runner = QuizRunner::new(
        Arc::clone(&backend.quizzes),
        Arc::clone(&backend.results),
        config.attempt_config(seed),
    );
    let mut attempt = runner
        .begin(quiz_id)
        .await
        .with_context(|| format!("cannot start quiz {quiz_id}"))?;

    if let Some(quiz) = attempt.engine().quiz() {
        println!("{}\n", quiz.title());
    }

    // A quiz without questions is already scored and recorded by now.
    if attempt.outcome().is_some() {
        if scripted.as_ref().is_some_and(|p| !p.is_empty()) {
            eprintln!("Quiz has no questions; --answers ignored.");
        }
    } else if let (Some(positions), Some(progress)) = (&scripted, attempt.progress()) {
        anyhow::ensure!(
            positions.len() == progress.total,
            "--answers has {} positions but the quiz has {} questions",
            positions.len(),
            progress.total
        );
    }

    let mut scripted = scripted.map(Vec::into_iter);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    let outcome = loop {
        if let Some(outcome) = attempt.outcome() {
            break outcome;
        }
        let Some(view) = attempt.current_question() else {
            bail!("quiz ended without a result");
        };
        print_question(&view);
        let count = view.options.len();

        let position = match scripted.as_mut() {
            Some(positions) => {
                let p = positions.next().context("ran out of answers")?;
                println!("> {p}");
                p
            }
            None => prompt(&mut stdin, count).await?,
        };

        match attempt.choose(position - 1).await? {
            Step::Next => println!(),
            Step::Finished(outcome) => break outcome,
        }
    };

    print_result(&attempt, &outcome);

    match outcome {
        Outcome::Recorded(_) => {
            println!("Saved to your history.");
            Ok(())
        }
        Outcome::Unrecorded { error, .. } => bail!("scored but not recorded: {error}"),
    }
}

/// Parse `--answers` as comma-separated 1-based display positions.
fn parse_answers(raw: &str) -> Result<Vec<usize>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let position: usize = s
                .parse()
                .with_context(|| format!("invalid answer position: {s:?}"))?;
            anyhow::ensure!(position >= 1, "answer positions start at 1");
            Ok(position)
        })
        .collect()
}

fn print_question(view: &QuestionView<'_>) {
    println!("[{}/{}] {}", view.index + 1, view.total, view.text);
    for (i, option) in view.options.iter().enumerate() {
        println!("  {}. {}", i + 1, option.text);
    }
}

async fn prompt(stdin: &mut Lines<BufReader<Stdin>>, count: usize) -> Result<usize> {
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = stdin.next_line().await? else {
            bail!("no answer given (stdin closed)");
        };
        match line.trim().parse::<usize>() {
            Ok(p) if (1..=count).contains(&p) => return Ok(p),
            _ => println!("Enter a number between 1 and {count}."),
        }
    }
}

fn print_result(attempt: &Attempt, outcome: &Outcome) {
    let submission = outcome.submission();
    if let Some(quiz) = attempt.engine().quiz() {
        let counts = attempt.engine().scores().counts();
        let mut table = Table::new();
        table.set_header(vec!["Result", "Points"]);
        for category in quiz.result_categories() {
            let points = counts.get(category.index).copied().unwrap_or(0);
            table.add_row(vec![category.name.clone(), points.to_string()]);
        }
        println!("\n{table}");
    }
    println!(
        "\nYour result: {} ({})",
        submission.result_text, submission.date
    );
}
