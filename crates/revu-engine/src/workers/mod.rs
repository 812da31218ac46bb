//! The closed worker set.
//!
//! Each worker is a single-purpose task handler: given read access to the
//! TaskState and an inference client, it produces one schema-validated
//! [`WorkerResult`]. Workers never touch the authoritative state — the
//! engine merges their results.

pub mod diagram;
pub mod format;
pub mod logic;
pub mod report;
pub mod style;

use std::collections::HashMap;

use futures::future::BoxFuture;

use revu_core::config::{EngineConfig, ModelsConfig};
use revu_core::error::Result;
use revu_core::state::{StateUpdate, TaskState};
use revu_core::traits::InferenceClient;
use revu_core::types::{ModelTier, WorkerKind, WorkerResult};

pub use diagram::DiagramWorker;
pub use format::FormatWorker;
pub use logic::LogicWorker;
pub use report::ReportWorker;
pub use style::StyleWorker;

/// A single-purpose task handler.
pub trait Worker: Send + Sync + 'static {
    /// Which member of the closed worker set this is.
    fn kind(&self) -> WorkerKind;

    /// Which of the two configured backends this worker wants.
    fn tier(&self) -> ModelTier;

    /// Produce one structured result from the current state.
    ///
    /// Implementations read `state`, call the inference client at most
    /// once, and validate the reply against the fixed schema.
    fn run<'a>(
        &'a self,
        state: &'a TaskState,
        client: &'a dyn InferenceClient,
        models: &'a ModelsConfig,
    ) -> BoxFuture<'a, Result<WorkerResult>>;
}

/// Lookup table mapping each [`WorkerKind`] to its handler.
pub struct WorkerSet {
    workers: HashMap<WorkerKind, Box<dyn Worker>>,
}

impl WorkerSet {
    /// The standard four-worker set.
    pub fn standard(engine: &EngineConfig) -> Self {
        let workers: Vec<Box<dyn Worker>> = vec![
            Box::new(LogicWorker),
            Box::new(StyleWorker),
            Box::new(DiagramWorker),
            Box::new(FormatWorker),
            Box::new(ReportWorker::new(engine.max_task_chars)),
        ];
        Self {
            workers: workers.into_iter().map(|w| (w.kind(), w)).collect(),
        }
    }

    pub fn get(&self, kind: WorkerKind) -> Option<&dyn Worker> {
        self.workers.get(&kind).map(|w| w.as_ref())
    }
}

/// Translate a validated worker result into the update it wants merged.
pub fn state_update(result: WorkerResult) -> StateUpdate {
    match result.worker {
        WorkerKind::LogicCheck => StateUpdate::new().with_logic_findings(result.findings),
        WorkerKind::StyleCheck => StateUpdate::new().with_style_findings(result.findings),
        // An omitted diagram writes nothing
        WorkerKind::Diagram => match result.output {
            Some(diagram) => StateUpdate::new().with_diagram(diagram),
            None => StateUpdate::new(),
        },
        WorkerKind::Format => StateUpdate::new().with_result(result.output.unwrap_or_default()),
        WorkerKind::Report => StateUpdate::new().with_report(result.output.unwrap_or_default()),
    }
}
