//! Core types, errors, and configuration shared by the mediagen crates.
//!
//! - [`types`] — `GenerationRequest`, `GenerationResult`, `GenerationError`, `Job`
//! - [`config`] — `~/.mediagen/config.json` schema and loader
//! - [`utils`] — path and string helpers

pub mod config;
pub mod types;
pub mod utils;

pub use types::{
    ErrorKind, GenerationError, GenerationKind, GenerationRequest, GenerationResult, Job,
    JobState, Provider,
};
