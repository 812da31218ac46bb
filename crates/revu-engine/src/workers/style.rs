use futures::future::BoxFuture;
use tracing::debug;

use revu_core::config::ModelsConfig;
use revu_core::error::Result;
use revu_core::state::TaskState;
use revu_core::traits::InferenceClient;
use revu_core::types::{ModelTier, WorkerKind, WorkerResult};

use crate::validate::parse_worker_result;

const STYLE_PROMPT: &str = r#"You are a code reviewer focused on style and readability.
Review the code below for naming, formatting, documentation, and idiom issues.
Do not report bugs or security issues — another reviewer handles those.

Respond with ONLY a JSON object:
{"summary": "<one-line overview>", "findings": ["<suggestion>", ...]}

An empty findings array means the style is fine."#;

/// Style/readability review. Findings accumulate into `style_findings`.
pub struct StyleWorker;

impl super::Worker for StyleWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::StyleCheck
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
            let prompt = format!("{}\n\nCODE:\n{}", STYLE_PROMPT, state.task);
            let raw = client
                .complete(models.select(self.tier()), &prompt)
                .await?;
            debug!(len = raw.len(), "Style check reply received");
            parse_worker_result(self.kind(), &raw)
        })
    }
}
