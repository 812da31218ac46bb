use serde::{Deserialize, Serialize};

use crate::types::{TaskError, TaskKind, WorkerKind};

/// The shared record threaded through the execution engine.
///
/// The engine exclusively owns the authoritative instance. Workers and
/// the router only ever see `&TaskState` and return proposed updates;
/// every write goes through [`TaskState::merged`], which produces a new
/// state rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskState {
    /// The task description as given by the user.
    pub task: String,
    /// Classification assigned by the router on the first routing pass.
    pub task_kind: Option<TaskKind>,
    /// Accumulated logic/correctness findings (append merge).
    pub logic_findings: Vec<String>,
    /// Accumulated style findings (append merge).
    pub style_findings: Vec<String>,
    /// Rewritten output, e.g. a formatted snippet (last-write-wins).
    pub result: Option<String>,
    /// Validated Mermaid architecture diagram (last-write-wins). Absent
    /// when diagram generation produced nothing usable.
    pub diagram: Option<String>,
    /// Assembled final report (last-write-wins).
    pub report: Option<String>,
    /// Workers dispatched so far, in order.
    pub route_history: Vec<WorkerKind>,
    /// Recoverable errors surfaced for the router (append merge).
    pub errors: Vec<TaskError>,
    /// Termination flag. Monotonic: once set it is never cleared.
    pub done: bool,
}

impl TaskState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            task_kind: None,
            logic_findings: Vec::new(),
            style_findings: Vec::new(),
            result: None,
            diagram: None,
            report: None,
            route_history: Vec::new(),
            errors: Vec::new(),
            done: false,
        }
    }

    /// Apply an update, producing the next state.
    ///
    /// List fields append; scalar fields are last-write-wins (applying
    /// the same scalar update twice is idempotent); `done` only ever
    /// transitions false → true.
    pub fn merged(&self, update: &StateUpdate) -> TaskState {
        let mut next = self.clone();

        if let Some(kind) = update.task_kind {
            next.task_kind = Some(kind);
        }
        next.logic_findings
            .extend(update.logic_findings.iter().cloned());
        next.style_findings
            .extend(update.style_findings.iter().cloned());
        if let Some(ref result) = update.result {
            next.result = Some(result.clone());
        }
        if let Some(ref diagram) = update.diagram {
            next.diagram = Some(diagram.clone());
        }
        if let Some(ref report) = update.report {
            next.report = Some(report.clone());
        }
        next.route_history.extend(update.route_history.iter().copied());
        next.errors.extend(update.errors.iter().cloned());
        if update.done {
            next.done = true;
        }

        next
    }

    /// Errors recorded against a worker since its last clean run.
    pub fn errors_for(&self, worker: WorkerKind) -> usize {
        self.errors.iter().filter(|e| e.worker == worker).count()
    }

    /// Whether a worker has already completed without a trailing error.
    ///
    /// A worker counts as completed once it appears in the route history
    /// more times than it has recorded errors.
    pub fn completed(&self, worker: WorkerKind) -> bool {
        let dispatched = self
            .route_history
            .iter()
            .filter(|w| **w == worker)
            .count();
        dispatched > self.errors_for(worker)
    }

    /// The most recent unresolved error, if the last dispatch failed.
    pub fn pending_error(&self) -> Option<&TaskError> {
        let last_worker = *self.route_history.last()?;
        let last_error = self.errors.last()?;
        if last_error.worker == last_worker && !self.completed(last_worker) {
            Some(last_error)
        } else {
            None
        }
    }
}

/// The only write surface onto TaskState.
///
/// Workers produce one per invocation (via their validated result); the
/// engine produces them for route history and error surfacing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateUpdate {
    pub task_kind: Option<TaskKind>,
    pub logic_findings: Vec<String>,
    pub style_findings: Vec<String>,
    pub result: Option<String>,
    pub diagram: Option<String>,
    pub report: Option<String>,
    pub route_history: Vec<WorkerKind>,
    pub errors: Vec<TaskError>,
    pub done: bool,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task_kind(mut self, kind: TaskKind) -> Self {
        self.task_kind = Some(kind);
        self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_diagram(mut self, diagram: impl Into<String>) -> Self {
        self.diagram = Some(diagram.into());
        self
    }

    pub fn with_report(mut self, report: impl Into<String>) -> Self {
        self.report = Some(report.into());
        self
    }

    pub fn with_logic_findings(mut self, findings: Vec<String>) -> Self {
        self.logic_findings = findings;
        self
    }

    pub fn with_style_findings(mut self, findings: Vec<String>) -> Self {
        self.style_findings = findings;
        self
    }

    pub fn with_error(mut self, error: TaskError) -> Self {
        self.errors.push(error);
        self
    }

    pub fn dispatched(mut self, worker: WorkerKind) -> Self {
        self.route_history.push(worker);
        self
    }

    pub fn terminated(mut self) -> Self {
        self.done = true;
        self
    }
}
