//! quizlingo-client: Quiz storage and result history backends.
//!
//! Implements the collaborator traits from `quizlingo-core` for a remote
//! HTTP quiz service, a local JSON data directory, and an in-memory store
//! used in tests.

pub mod config;
pub mod http;
pub mod local;
pub mod memory;

pub use config::{create_backend, load_config, Backend, BackendConfig, QuizlingoConfig};
pub use quizlingo_core::error::BackendError;
