//! The `quizlingo logout` command.

use std::path::PathBuf;

use anyhow::{bail, Result};

use quizlingo_client::config::load_config_from;
use quizlingo_client::http::HttpBackend;
use quizlingo_client::BackendConfig;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let BackendConfig::Http {
        base_url,
        access_token,
    } = &config.backend
    else {
        bail!("logout needs an http backend; set [backend] type = \"http\" or QUIZLINGO_BASE_URL");
    };

    let backend = HttpBackend::new(base_url, access_token.clone())?;
    backend.logout().await?;

    println!("Logged out of {}.", backend.base_url());
    println!("unset QUIZLINGO_ACCESS_TOKEN");
    Ok(())
}
