use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique task run identifier. Used for logging and traces only — it is
/// deliberately kept out of TaskState so that final states stay
/// reproducible byte-for-byte.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of workers the router can dispatch to.
///
/// Dispatch is a lookup over this enum — never open-ended registration.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    /// Logic / correctness / security analysis.
    LogicCheck,
    /// Style and formatting review.
    StyleCheck,
    /// Mermaid architecture diagram generation.
    Diagram,
    /// Code formatting (rewrites the snippet).
    Format,
    /// Final report assembly from accumulated findings.
    Report,
}

impl WorkerKind {
    pub const ALL: [WorkerKind; 5] = [
        WorkerKind::LogicCheck,
        WorkerKind::StyleCheck,
        WorkerKind::Diagram,
        WorkerKind::Format,
        WorkerKind::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerKind::LogicCheck => "logic_check",
            WorkerKind::StyleCheck => "style_check",
            WorkerKind::Diagram => "diagram",
            WorkerKind::Format => "format",
            WorkerKind::Report => "report",
        }
    }
}

impl std::fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task classification derived from the task text.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Full review: logic pass, style pass, then a report.
    Review,
    /// Formatting only.
    Format,
}

/// The router's output: dispatch to one worker, or stop.
///
/// Produced solely from TaskState contents — the router carries no
/// hidden state between calls.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RouteDecision {
    Dispatch(WorkerKind),
    Terminate,
}

/// Structured output produced by exactly one worker per invocation.
///
/// The schema is fixed: `summary` and `findings` are required when parsing
/// model output; `output` carries rewritten text (e.g. a formatted
/// snippet) when the worker produces one. Never partial or streamed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub worker: WorkerKind,
    pub summary: String,
    #[serde(default)]
    pub findings: Vec<String>,
    #[serde(default)]
    pub output: Option<String>,
}

/// Recoverable error kinds that get surfaced into TaskState.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    OutputValidation,
    WorkerTimeout,
    Inference,
}

/// A recoverable failure recorded in TaskState for the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    pub kind: ErrorKind,
    pub worker: WorkerKind,
    pub message: String,
    /// Engine step at which the error occurred.
    pub step: usize,
}

/// Which of the two configured inference backends a worker wants.
///
/// Consulted only by workers — the engine never reads model config.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ModelTier {
    /// High-quality model for report assembly.
    Heavy,
    /// Cheap model for checks and formatting.
    Fast,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_kind_serde() {
        let json = serde_json::to_string(&WorkerKind::LogicCheck).unwrap();
        assert_eq!(json, "\"logic_check\"");
        let parsed: WorkerKind = serde_json::from_str("\"style_check\"").unwrap();
        assert_eq!(parsed, WorkerKind::StyleCheck);
    }

    #[test]
    fn test_worker_result_defaults() {
        let json = r#"{"worker": "format", "summary": "formatted"}"#;
        let result: WorkerResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.worker, WorkerKind::Format);
        assert!(result.findings.is_empty());
        assert!(result.output.is_none());
    }

    #[test]
    fn test_task_id_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }
}
