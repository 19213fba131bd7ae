//! quizlingo-core: Quiz session engine, shuffling, and scoring.
//!
//! This crate defines the quiz data model, the per-session state machine,
//! the option shuffler and the winner selection that the rest of quizlingo
//! builds on. Storage, transport and authentication are collaborators
//! described by the traits in [`traits`].

pub mod attempt;
pub mod error;
pub mod model;
pub mod parser;
pub mod scoring;
pub mod session;
pub mod shuffle;
pub mod traits;
