//! The `quizlingo login` command.

use std::path::PathBuf;

use anyhow::{bail, Result};

use quizlingo_client::config::load_config_from;
use quizlingo_client::http::HttpBackend;
use quizlingo_client::BackendConfig;

pub async fn execute(
    username: String,
    password: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let BackendConfig::Http { base_url, .. } = &config.backend else {
        bail!("login needs an http backend; set [backend] type = \"http\" or QUIZLINGO_BASE_URL");
    };

    let backend = HttpBackend::new(base_url, None)?;
    let token = backend.login(&username, &password).await?;

    println!("Logged in to {} as {username}.", backend.base_url());
    println!("export QUIZLINGO_ACCESS_TOKEN={token}");
    Ok(())
}
