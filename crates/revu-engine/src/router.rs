use tracing::{debug, warn};

use revu_core::error::{Result, RevuError};
use revu_core::state::TaskState;
use revu_core::types::{RouteDecision, TaskKind, WorkerKind};

/// Review tasks run these workers in order. The report comes last so it
/// sees every finding and the diagram.
const REVIEW_PLAN: [WorkerKind; 4] = [
    WorkerKind::LogicCheck,
    WorkerKind::StyleCheck,
    WorkerKind::Diagram,
    WorkerKind::Report,
];

/// The orchestrator: picks the next worker (or termination) from the
/// current TaskState.
///
/// Routing is a pure function of the state — identical input always
/// yields the identical decision, and no state is carried between calls.
pub struct Router {
    /// Re-dispatch budget per worker after a recoverable failure.
    worker_retries: usize,
}

impl Router {
    pub fn new(worker_retries: usize) -> Self {
        Self { worker_retries }
    }

    /// Decide the next step.
    ///
    /// An unclassifiable task is a [`RevuError::Routing`] — fatal for the
    /// task, never retried silently. A pending recoverable error re-routes
    /// to the failing worker while its retry budget lasts, then terminates
    /// with the failure left in state.
    pub fn route(&self, state: &TaskState) -> Result<RouteDecision> {
        if state.done {
            return Ok(RouteDecision::Terminate);
        }

        if let Some(error) = state.pending_error() {
            let attempts = state.errors_for(error.worker);
            if attempts <= self.worker_retries {
                debug!(
                    worker = %error.worker,
                    attempts,
                    budget = self.worker_retries,
                    "Re-routing to failed worker"
                );
                return Ok(RouteDecision::Dispatch(error.worker));
            }
            warn!(
                worker = %error.worker,
                attempts,
                "Retry budget exhausted, terminating with failure in state"
            );
            return Ok(RouteDecision::Terminate);
        }

        let kind = state
            .task_kind
            .or_else(|| classify(&state.task))
            .ok_or_else(|| {
                RevuError::Routing(format!(
                    "no worker can handle task: \"{}\"",
                    preview(&state.task)
                ))
            })?;

        let next = match kind {
            TaskKind::Format => {
                (!state.completed(WorkerKind::Format)).then_some(WorkerKind::Format)
            }
            TaskKind::Review => REVIEW_PLAN
                .into_iter()
                .find(|w| !state.completed(*w)),
        };

        Ok(next
            .map(RouteDecision::Dispatch)
            .unwrap_or(RouteDecision::Terminate))
    }
}

/// Classify a task description into the closed TaskKind set.
///
/// Keyword-driven and deterministic. Returns None for text that names
/// neither a formatting nor a review intent.
pub fn classify(task: &str) -> Option<TaskKind> {
    let lower = task.to_lowercase();

    const FORMAT_KEYWORDS: [&str; 3] = ["format", "reformat", "indent"];
    const REVIEW_KEYWORDS: [&str; 6] = ["review", "check", "analyze", "audit", "diff", "lint"];

    if FORMAT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(TaskKind::Format);
    }
    if REVIEW_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(TaskKind::Review);
    }
    None
}

fn preview(task: &str) -> String {
    const MAX: usize = 60;
    if task.len() <= MAX {
        task.to_string()
    } else {
        let cut = task
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}…", &task[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revu_core::state::StateUpdate;
    use revu_core::types::{ErrorKind, TaskError};

    fn error_for(worker: WorkerKind, step: usize) -> TaskError {
        TaskError {
            kind: ErrorKind::OutputValidation,
            worker,
            message: "missing required key".into(),
            step,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("format this code snippet"), Some(TaskKind::Format));
        assert_eq!(classify("Review this PR diff"), Some(TaskKind::Review));
        assert_eq!(classify("check my function"), Some(TaskKind::Review));
        assert_eq!(classify("write me a poem"), None);
    }

    #[test]
    fn test_format_task_routes_to_format_then_terminates() {
        let router = Router::new(1);
        let state = TaskState::new("format this code snippet");

        assert_eq!(
            router.route(&state).unwrap(),
            RouteDecision::Dispatch(WorkerKind::Format)
        );

        let after = state.merged(&StateUpdate::new().dispatched(WorkerKind::Format));
        assert_eq!(router.route(&after).unwrap(), RouteDecision::Terminate);
    }

    #[test]
    fn test_review_plan_order() {
        let router = Router::new(1);
        let mut state = TaskState::new("review this diff");

        for expected in [
            WorkerKind::LogicCheck,
            WorkerKind::StyleCheck,
            WorkerKind::Diagram,
            WorkerKind::Report,
        ] {
            assert_eq!(
                router.route(&state).unwrap(),
                RouteDecision::Dispatch(expected)
            );
            state = state.merged(&StateUpdate::new().dispatched(expected));
        }
        assert_eq!(router.route(&state).unwrap(), RouteDecision::Terminate);
    }

    #[test]
    fn test_unclassifiable_task_is_routing_error() {
        let router = Router::new(1);
        let state = TaskState::new("write me a poem");
        assert!(matches!(
            router.route(&state),
            Err(RevuError::Routing(_))
        ));
    }

    #[test]
    fn test_pending_error_retries_within_budget() {
        let router = Router::new(1);
        let state = TaskState::new("review this diff").merged(
            &StateUpdate::new()
                .dispatched(WorkerKind::StyleCheck)
                .with_error(error_for(WorkerKind::StyleCheck, 1)),
        );

        assert_eq!(
            router.route(&state).unwrap(),
            RouteDecision::Dispatch(WorkerKind::StyleCheck)
        );
    }

    #[test]
    fn test_retry_budget_exhausted_terminates() {
        let router = Router::new(1);
        // Two failed attempts against a budget of one retry
        let state = TaskState::new("review this diff")
            .merged(
                &StateUpdate::new()
                    .dispatched(WorkerKind::StyleCheck)
                    .with_error(error_for(WorkerKind::StyleCheck, 1)),
            )
            .merged(
                &StateUpdate::new()
                    .dispatched(WorkerKind::StyleCheck)
                    .with_error(error_for(WorkerKind::StyleCheck, 2)),
            );

        assert_eq!(router.route(&state).unwrap(), RouteDecision::Terminate);
    }

    #[test]
    fn test_done_state_terminates() {
        let router = Router::new(1);
        let state = TaskState::new("review this diff").merged(&StateUpdate::new().terminated());
        assert_eq!(router.route(&state).unwrap(), RouteDecision::Terminate);
    }

    #[test]
    fn test_routing_is_deterministic() {
        let router = Router::new(1);
        let state = TaskState::new("review this diff");
        let first = router.route(&state).unwrap();
        let second = router.route(&state).unwrap();
        assert_eq!(first, second);
    }
}
