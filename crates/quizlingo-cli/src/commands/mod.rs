pub mod history;
pub mod init;
pub mod list;
pub mod login;
pub mod logout;
pub mod publish;
pub mod take;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;
use quizlingo_client::config::{load_config_from, QuizlingoConfig};
use quizlingo_client::{create_backend, Backend};

/// Load config (explicit path or default search) and build its backend.
pub fn open_backend(config_path: Option<PathBuf>) -> Result<(QuizlingoConfig, Backend)> {
    let config = load_config_from(config_path.as_deref())?;
    tracing::debug!(backend = ?config.backend, "using backend");
    let backend = create_backend(&config.backend)?;
    Ok((config, backend))
}
