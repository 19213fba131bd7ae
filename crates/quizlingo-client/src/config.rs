//! Backend configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizlingo_core::attempt::AttemptConfig;
use quizlingo_core::session::{SessionOptions, DEFAULT_DATE_FORMAT};
use quizlingo_core::traits::{HistorySource, QuizPublisher, QuizSource, ResultSink};

use crate::http::HttpBackend;
use crate::local::LocalStore;

/// Which backend stores quizzes and results. `Debug` masks the access token.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Http {
        base_url: String,
        #[serde(default)]
        access_token: Option<String>,
    },
    Local {
        #[serde(default = "default_data_dir")]
        data_dir: PathBuf,
        #[serde(default = "default_username")]
        username: String,
    },
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Http {
                base_url,
                access_token,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("access_token", &access_token.as_ref().map(|_| "***"))
                .finish(),
            BackendConfig::Local { data_dir, username } => f
                .debug_struct("Local")
                .field("data_dir", data_dir)
                .field("username", username)
                .finish(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local {
            data_dir: default_data_dir(),
            username: default_username(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./quizlingo-data")
}

fn default_username() -> String {
    "guest".to_string()
}

/// Top-level quizlingo configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizlingoConfig {
    /// Where quizzes and results live.
    #[serde(default)]
    pub backend: BackendConfig,
    /// `strftime` pattern for result dates.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Max retries on transient submission errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    500
}

impl Default for QuizlingoConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            date_format: default_date_format(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl QuizlingoConfig {
    /// Attempt settings derived from this config.
    pub fn attempt_config(&self, seed: Option<u64>) -> AttemptConfig {
        AttemptConfig {
            session: SessionOptions {
                seed,
                date_format: self.date_format.clone(),
                fixed_date: None,
            },
            max_submit_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Substitute `${VAR}` references from the environment in one left-to-right
/// pass. Substituted values are not scanned again; unset variables become
/// empty and an unterminated `${` is kept literally.
fn resolve_env_vars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                out.push_str(&std::env::var(&after[..end]).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Resolve env vars in a backend config.
fn resolve_backend_config(config: &BackendConfig) -> BackendConfig {
    match config {
        BackendConfig::Http {
            base_url,
            access_token,
        } => BackendConfig::Http {
            base_url: resolve_env_vars(base_url),
            access_token: access_token
                .as_ref()
                .map(|t| resolve_env_vars(t))
                .filter(|t| !t.is_empty()),
        },
        BackendConfig::Local { data_dir, username } => BackendConfig::Local {
            data_dir: PathBuf::from(resolve_env_vars(&data_dir.to_string_lossy())),
            username: resolve_env_vars(username),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizlingo.toml` in the current directory
/// 2. `~/.config/quizlingo/config.toml`
///
/// Environment variable overrides: `QUIZLINGO_BASE_URL`, `QUIZLINGO_ACCESS_TOKEN`.
pub fn load_config() -> Result<QuizlingoConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizlingoConfig> {
    let config_path = match path {
        Some(p) => {
            anyhow::ensure!(p.exists(), "config file not found: {}", p.display());
            Some(p.to_path_buf())
        }
        None => config_candidates().into_iter().find(|c| c.exists()),
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizlingoConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizlingoConfig::default(),
    };

    apply_env_overrides(
        &mut config,
        std::env::var("QUIZLINGO_BASE_URL").ok(),
        std::env::var("QUIZLINGO_ACCESS_TOKEN").ok(),
    );
    config.backend = resolve_backend_config(&config.backend);

    Ok(config)
}

fn apply_env_overrides(
    config: &mut QuizlingoConfig,
    base_url: Option<String>,
    token: Option<String>,
) {
    if let Some(url) = base_url {
        let access_token = match &config.backend {
            BackendConfig::Http { access_token, .. } => access_token.clone(),
            BackendConfig::Local { .. } => None,
        };
        config.backend = BackendConfig::Http {
            base_url: url,
            access_token,
        };
    }

    if let Some(key) = token {
        if let BackendConfig::Http { access_token, .. } = &mut config.backend {
            *access_token = Some(key);
        }
    }
}

/// `quizlingo.toml` in the working directory, then the per-user config.
fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from("quizlingo.toml")];
    if let Ok(home) = std::env::var("HOME") {
        candidates.push(PathBuf::from(home).join(".config/quizlingo/config.toml"));
    }
    candidates
}

/// The collaborators a CLI session needs, all backed by one store.
#[derive(Clone)]
pub struct Backend {
    pub quizzes: Arc<dyn QuizSource>,
    pub publisher: Arc<dyn QuizPublisher>,
    pub results: Arc<dyn ResultSink>,
    pub history: Arc<dyn HistorySource>,
}

impl Backend {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: QuizSource + QuizPublisher + ResultSink + HistorySource + 'static,
    {
        Self {
            quizzes: Arc::clone(&store) as Arc<dyn QuizSource>,
            publisher: Arc::clone(&store) as Arc<dyn QuizPublisher>,
            results: Arc::clone(&store) as Arc<dyn ResultSink>,
            history: store,
        }
    }
}

/// Create a backend from its configuration.
pub fn create_backend(config: &BackendConfig) -> Result<Backend> {
    match config {
        BackendConfig::Http {
            base_url,
            access_token,
        } => {
            let backend = HttpBackend::new(base_url, access_token.clone())?;
            Ok(Backend::from_store(Arc::new(backend)))
        }
        BackendConfig::Local { data_dir, username } => Ok(Backend::from_store(Arc::new(
            LocalStore::new(data_dir.clone(), username),
        ))),
    }
}
