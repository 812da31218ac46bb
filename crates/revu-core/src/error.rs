use thiserror::Error;

use crate::types::WorkerKind;

#[derive(Debug, Error)]
pub enum RevuError {
    // Routing errors — fatal: the engine must not retry silently
    #[error("Routing failed: {0}")]
    Routing(String),

    // Worker errors — surfaced into TaskState for the router to handle
    #[error("Worker {worker} produced invalid output: {issues:?}")]
    OutputValidation {
        worker: WorkerKind,
        issues: Vec<String>,
    },

    #[error("Worker {worker} timed out after {timeout_secs}s")]
    WorkerTimeout {
        worker: WorkerKind,
        timeout_secs: u64,
    },

    // Inference errors
    #[error("Inference request failed: {0}")]
    Inference(String),

    #[error("Inference response parse error: {0}")]
    InferenceParse(String),

    // Engine errors — fatal
    #[error("Engine invariant violated: {0}")]
    FatalEngine(String),

    #[error("Engine exceeded max steps ({0})")]
    MaxStepsExceeded(usize),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RevuError {
    /// Whether the router can recover from this error by re-routing.
    ///
    /// Validation and timeout failures are recorded in TaskState and handed
    /// back to the router; everything else drives the engine to Failed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RevuError::OutputValidation { .. }
                | RevuError::WorkerTimeout { .. }
                | RevuError::Inference(_)
                | RevuError::InferenceParse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RevuError>;
