use futures::future::BoxFuture;
use tracing::debug;

use revu_core::config::ModelsConfig;
use revu_core::error::Result;
use revu_core::state::TaskState;
use revu_core::traits::InferenceClient;
use revu_core::types::{ModelTier, WorkerKind, WorkerResult};

use crate::validate::parse_worker_result;

const FORMAT_PROMPT: &str = r#"You are a code formatter.
Reformat the code below: fix indentation, spacing, and line breaks.
Do not change its behavior in any way.

Respond with ONLY a JSON object:
{"summary": "<what changed>", "output": "<the full reformatted code>"}"#;

/// Rewrites the snippet. The reformatted text lands in `result`
/// (last-write-wins).
pub struct FormatWorker;

impl super::Worker for FormatWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Format
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
            let prompt = format!("{}\n\nCODE:\n{}", FORMAT_PROMPT, state.task);
            let raw = client
                .complete(models.select(self.tier()), &prompt)
                .await?;
            debug!(len = raw.len(), "Format reply received");
            parse_worker_result(self.kind(), &raw)
        })
    }
}
