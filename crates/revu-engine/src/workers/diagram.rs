use futures::future::BoxFuture;
use tracing::{debug, warn};

use revu_core::config::ModelsConfig;
use revu_core::error::Result;
use revu_core::state::TaskState;
use revu_core::traits::InferenceClient;
use revu_core::types::{ModelTier, WorkerKind, WorkerResult};

use crate::validate::{looks_like_refusal, strip_code_fences};

const DIAGRAM_PROMPT: &str = r#"You are a software architect.
Draw a Mermaid diagram of the structure of the code below: its modules,
functions, and the calls between them.

Respond with ONLY the Mermaid diagram source, starting with 'graph TD'.
No commentary, no explanation."#;

/// Mermaid diagram types the validator accepts at the start of the
/// output.
const MERMAID_HEADERS: [&str; 6] = [
    "graph",
    "flowchart",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "erDiagram",
];

/// Generates a Mermaid architecture diagram for the report.
///
/// The diagram is decorative: invalid or refused output is dropped
/// silently instead of being surfaced as an error, so a bad diagram
/// never costs a retry or blocks the review.
pub struct DiagramWorker;

impl super::Worker for DiagramWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Diagram
    }

    fn tier(&self) -> ModelTier {
        ModelTier::Heavy
    }

    fn run<'a>(
        &'a self,
        state: &'a TaskState,
        client: &'a dyn InferenceClient,
        models: &'a ModelsConfig,
    ) -> BoxFuture<'a, Result<WorkerResult>> {
        Box::pin(async move {
            let prompt = format!("{}\n\nCODE:\n{}", DIAGRAM_PROMPT, state.task);
            let raw = client
                .complete(models.select(self.tier()), &prompt)
                .await?;
            debug!(len = raw.len(), "Diagram reply received");

            let diagram = strip_code_fences(&raw);
            if is_valid_mermaid(&diagram) {
                Ok(WorkerResult {
                    worker: self.kind(),
                    summary: "architecture diagram generated".into(),
                    findings: vec![],
                    output: Some(diagram),
                })
            } else {
                warn!("Diagram output failed validation, omitting diagram");
                Ok(WorkerResult {
                    worker: self.kind(),
                    summary: "diagram omitted: output failed validation".into(),
                    findings: vec![],
                    output: None,
                })
            }
        })
    }
}

/// Cheap structural check: a known Mermaid header, no refusal text, and
/// balanced brackets.
fn is_valid_mermaid(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || looks_like_refusal(trimmed) {
        return false;
    }
    if !MERMAID_HEADERS.iter().any(|h| trimmed.starts_with(h)) {
        return false;
    }
    brackets_balanced(trimmed)
}

/// Node labels use `[...]`, `(...)`, and `{...}`; a truncated diagram
/// leaves one open.
fn brackets_balanced(text: &str) -> bool {
    let mut square: i32 = 0;
    let mut round: i32 = 0;
    let mut curly: i32 = 0;

    for ch in text.chars() {
        match ch {
            '[' => square += 1,
            ']' => square -= 1,
            '(' => round += 1,
            ')' => round -= 1,
            '{' => curly += 1,
            '}' => curly -= 1,
            _ => {}
        }
        if square < 0 || round < 0 || curly < 0 {
            return false;
        }
    }
    square == 0 && round == 0 && curly == 0
}

#[cfg(test)]
mod tests {
    use super::super::Worker;
    use super::*;
    use std::sync::Arc;

    use revu_llm::StubClient;

    const VALID_DIAGRAM: &str = "graph TD\n    A[main] --> B[parse]\n    B --> C[render]";

    async fn run_with_reply(reply: &str) -> WorkerResult {
        let client = Arc::new(StubClient::scripted(vec![reply.to_string()]));
        let state = TaskState::new("review this module");
        let models = ModelsConfig::default();
        DiagramWorker
            .run(&state, client.as_ref(), &models)
            .await
            .unwrap()
    }

    #[test]
    fn test_valid_mermaid_accepted() {
        assert!(is_valid_mermaid(VALID_DIAGRAM));
        assert!(is_valid_mermaid("flowchart LR\n    a --> b"));
    }

    #[test]
    fn test_invalid_mermaid_rejected() {
        assert!(!is_valid_mermaid(""));
        assert!(!is_valid_mermaid("Here is your diagram:"));
        assert!(!is_valid_mermaid("I cannot draw a diagram for this."));
        // Truncated node label
        assert!(!is_valid_mermaid("graph TD\n    A[main --> B"));
    }

    #[test]
    fn test_brackets_balanced() {
        assert!(brackets_balanced("A[x] --> B(y)"));
        assert!(!brackets_balanced("A[x --> B"));
        assert!(!brackets_balanced("A]x["));
    }

    #[tokio::test]
    async fn test_fenced_diagram_extracted() {
        let reply = format!("```mermaid\n{}\n```", VALID_DIAGRAM);
        let result = run_with_reply(&reply).await;
        assert_eq!(result.output.as_deref(), Some(VALID_DIAGRAM));
    }

    #[tokio::test]
    async fn test_invalid_output_omitted_without_error() {
        let result = run_with_reply("I cannot draw a diagram for this.").await;
        assert!(result.output.is_none());
        assert!(result.summary.contains("omitted"));
    }
}
