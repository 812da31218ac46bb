use futures::future::BoxFuture;
use tracing::{info, warn};

use revu_core::config::ModelsConfig;
use revu_core::error::Result;
use revu_core::state::TaskState;
use revu_core::traits::InferenceClient;
use revu_core::types::{ModelTier, WorkerKind, WorkerResult};

use crate::validate::parse_worker_result;

const REPORT_PROMPT: &str = r#"You are the review orchestrator producing the final report.
Group the findings into '## Security & Logic' and '## Style' sections,
deduplicate them intelligently, mark empty sections 'No issues found',
and keep the tone concise and professional.

Respond with ONLY a JSON object:
{"summary": "<one-line overview>", "output": "<the full Markdown report>"}"#;

/// How much of the task text is included as context in the report prompt.
const PROMPT_CONTEXT_CHARS: usize = 10_000;

/// Assembles the final report from accumulated findings.
///
/// Two fast paths skip the model entirely: oversized tasks are refused
/// with a size notice, and a run with no findings gets a canned clean
/// report. Both keep the result deterministic.
pub struct ReportWorker {
    max_task_chars: usize,
}

impl ReportWorker {
    pub fn new(max_task_chars: usize) -> Self {
        Self { max_task_chars }
    }

    fn oversize_notice(&self, len: usize) -> String {
        format!(
            "## Review Aborted\n\n\
             The task is too large for automated analysis.\n\n\
             - Size detected: {} characters\n\
             - Limit: {} characters\n\n\
             Please reduce the scope or review critical files manually.",
            len, self.max_task_chars
        )
    }
}

/// Prepend the architecture diagram section when one was generated.
fn with_diagram_section(diagram: Option<&str>, report: String) -> String {
    match diagram {
        Some(d) if !d.trim().is_empty() => {
            format!("## Architecture\n\n```mermaid\n{}\n```\n\n{}", d, report)
        }
        _ => report,
    }
}

/// Remove duplicate findings while preserving first-seen order.
fn dedup(findings: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    findings
        .iter()
        .filter(|f| seen.insert(f.trim().to_lowercase()))
        .cloned()
        .collect()
}

impl super::Worker for ReportWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Report
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
            // Safety check: task size limit
            if state.task.len() > self.max_task_chars {
                warn!(
                    len = state.task.len(),
                    limit = self.max_task_chars,
                    "Task exceeds size limit, refusing report"
                );
                let notice = self.oversize_notice(state.task.len());
                return Ok(WorkerResult {
                    worker: self.kind(),
                    summary: "task too large for automated analysis".into(),
                    findings: vec![],
                    output: Some(notice),
                });
            }

            let logic = dedup(&state.logic_findings);
            let style = dedup(&state.style_findings);

            // Quick exit: nothing to report
            if logic.is_empty() && style.is_empty() {
                info!("No findings to report");
                let body = "## Automated Review\n\n\
                            No critical issues or style suggestions detected."
                    .to_string();
                return Ok(WorkerResult {
                    worker: self.kind(),
                    summary: "no issues found".into(),
                    findings: vec![],
                    output: Some(with_diagram_section(state.diagram.as_deref(), body)),
                });
            }

            let context = if state.task.len() > PROMPT_CONTEXT_CHARS {
                let mut cut = PROMPT_CONTEXT_CHARS;
                while !state.task.is_char_boundary(cut) {
                    cut -= 1;
                }
                format!("{}...(truncated for context)", &state.task[..cut])
            } else {
                state.task.clone()
            };

            let prompt = format!(
                "{}\n\nTASK CONTEXT:\n{}\n\nLOGIC FINDINGS:\n{}\n\nSTYLE FINDINGS:\n{}",
                REPORT_PROMPT,
                context,
                bullet_list(&logic),
                bullet_list(&style),
            );

            let raw = client
                .complete(models.select(self.tier()), &prompt)
                .await?;
            let mut result = parse_worker_result(self.kind(), &raw)?;
            result.output = result
                .output
                .map(|report| with_diagram_section(state.diagram.as_deref(), report));
            Ok(result)
        })
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}
