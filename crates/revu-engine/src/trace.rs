use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use revu_core::error::Result;
use revu_core::types::WorkerKind;

/// One recorded engine transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub step: usize,
    pub phase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<WorkerKind>,
    pub detail: String,
    pub at: DateTime<Utc>,
}

/// In-memory record of a task run, step by step.
///
/// An optional collaborator: correctness never depends on it. The CLI
/// prints it on failure, and it can be dumped as JSONL for inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunTrace {
    events: Vec<TraceEvent>,
}

impl RunTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        step: usize,
        phase: &str,
        worker: Option<WorkerKind>,
        detail: impl Into<String>,
    ) {
        self.events.push(TraceEvent {
            step,
            phase: phase.to_string(),
            worker,
            detail: detail.into(),
            at: Utc::now(),
        });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Write the trace as one JSON object per line.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> Result<()> {
        for event in &self.events {
            serde_json::to_writer(&mut writer, event)?;
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Human-readable rendering, one line per event.
    pub fn render(&self) -> String {
        self.events
            .iter()
            .map(|e| match e.worker {
                Some(worker) => {
                    format!("step {:>2}  {:<12} {:<12} {}", e.step, e.phase, worker, e.detail)
                }
                None => format!("step {:>2}  {:<12} {:<12} {}", e.step, e.phase, "-", e.detail),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_render() {
        let mut trace = RunTrace::new();
        trace.record(1, "routing", None, "dispatch format");
        trace.record(1, "dispatching", Some(WorkerKind::Format), "worker started");

        assert_eq!(trace.events().len(), 2);
        let rendered = trace.render();
        assert!(rendered.contains("routing"));
        assert!(rendered.contains("format"));
    }

    #[test]
    fn test_jsonl_output() {
        let mut trace = RunTrace::new();
        trace.record(1, "routing", None, "start");
        trace.record(2, "merging", Some(WorkerKind::Report), "merged");

        let mut buf = Vec::new();
        trace.write_jsonl(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let event: TraceEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(event.step, 2);
        assert_eq!(event.worker, Some(WorkerKind::Report));
    }
}
