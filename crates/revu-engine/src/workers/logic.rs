use futures::future::BoxFuture;
use tracing::debug;

use revu_core::config::ModelsConfig;
use revu_core::error::Result;
use revu_core::state::TaskState;
use revu_core::traits::InferenceClient;
use revu_core::types::{ModelTier, WorkerKind, WorkerResult};

use crate::validate::parse_worker_result;

const LOGIC_PROMPT: &str = r#"You are a senior code reviewer focused on correctness and security.
Review the code below for bugs, logic errors, unsafe patterns, and security issues.
Ignore style and formatting entirely.

Respond with ONLY a JSON object:
{"summary": "<one-line overview>", "findings": ["<issue>", ...]}

An empty findings array means the code is clean."#;

/// Correctness/security analysis. Findings accumulate into
/// `logic_findings`.
pub struct LogicWorker;

impl super::Worker for LogicWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::LogicCheck
    }

    fn tier(&self) -> ModelTier {
        ModelTier::Fast
    }

    fn run<'a>(
        &'a self,
        state: &'a TaskState,
        client: &'a dyn InferenceClient,
        models: &'a ModelsConfig,
    ) -> BoxFuture<'a, Result<WorkerResult>> {
        Box::pin(async move {
            let prompt = format!("{}\n\nCODE:\n{}", LOGIC_PROMPT, state.task);
            let raw = client
                .complete(models.select(self.tier()), &prompt)
                .await?;
            debug!(len = raw.len(), "Logic check reply received");
            parse_worker_result(self.kind(), &raw)
        })
    }
}
