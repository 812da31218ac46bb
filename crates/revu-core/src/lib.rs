//! Core types, task state, and error hierarchy for Revu.
//!
//! Everything the other crates share lives here: the [`state::TaskState`]
//! record and its merge rules, the closed [`types::WorkerKind`] set, the
//! [`error::RevuError`] taxonomy, TOML configuration, and the
//! [`traits::InferenceClient`] seam between workers and model backends.

pub mod config;
pub mod error;
pub mod state;
pub mod traits;
pub mod types;

pub use config::{AppConfig, EngineConfig, ModelConfig, ModelsConfig, RetryConfig};
pub use error::{Result, RevuError};
pub use state::{StateUpdate, TaskState};
pub use traits::InferenceClient;
pub use types::{
    ErrorKind, ModelTier, RouteDecision, TaskError, TaskId, TaskKind, WorkerKind, WorkerResult,
};
