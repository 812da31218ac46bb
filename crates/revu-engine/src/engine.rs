use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use revu_core::config::{AppConfig, EngineConfig, ModelsConfig};
use revu_core::error::RevuError;
use revu_core::state::{StateUpdate, TaskState};
use revu_core::traits::InferenceClient;
use revu_core::types::{ErrorKind, RouteDecision, TaskError, TaskId, WorkerKind};

use crate::router::{classify, Router};
use crate::trace::RunTrace;
use crate::workers::{state_update, WorkerSet};

/// Engine phases. One round-trip is Routing → Dispatching → Merging;
/// Terminated and Failed are terminal.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Phase {
    Routing,
    Dispatching,
    Merging,
    Terminated,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Routing => "routing",
            Phase::Dispatching => "dispatching",
            Phase::Merging => "merging",
            Phase::Terminated => "terminated",
            Phase::Failed => "failed",
        }
    }
}

/// How a task run ended.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Terminated,
    Failed { error: String },
}

/// Result of driving one task to a terminal phase.
#[derive(Debug, Clone)]
pub struct EngineReport {
    /// The final authoritative state.
    pub state: TaskState,
    pub outcome: Outcome,
    /// Orchestrator/worker round-trips consumed.
    pub steps: usize,
    pub trace: RunTrace,
}

impl EngineReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Terminated
    }
}

/// Drives the routing loop for one task at a time.
///
/// The engine exclusively owns the authoritative TaskState during a run;
/// the router and workers only ever receive `&TaskState` and return
/// proposed updates. `run` takes `&self`, so independent tasks can run
/// concurrently on one engine — each call owns its own state.
pub struct Engine {
    config: EngineConfig,
    models: ModelsConfig,
    router: Router,
    workers: WorkerSet,
    client: Arc<dyn InferenceClient>,
}

impl Engine {
    pub fn new(config: AppConfig, client: Arc<dyn InferenceClient>) -> Self {
        let router = Router::new(config.engine.worker_retries);
        let workers = WorkerSet::standard(&config.engine);
        Self {
            config: config.engine,
            models: config.models,
            router,
            workers,
            client,
        }
    }

    /// Thread the seed state through routing round-trips until a
    /// terminal phase, bounded by `max_steps`.
    pub async fn run(&self, seed: TaskState) -> EngineReport {
        let task_id = TaskId::new();
        let mut state = seed;
        let mut trace = RunTrace::new();
        let mut step = 0usize;

        info!(%task_id, task = %state.task, "Engine started");

        loop {
            step += 1;
            if step > self.config.max_steps {
                return self.fail(
                    state,
                    trace,
                    step - 1,
                    RevuError::MaxStepsExceeded(self.config.max_steps),
                );
            }

            // Routing
            if state.task_kind.is_none() {
                if let Some(kind) = classify(&state.task) {
                    state = state.merged(&StateUpdate::new().with_task_kind(kind));
                }
            }
            let decision = match self.router.route(&state) {
                Ok(decision) => decision,
                Err(e) => return self.fail(state, trace, step, e),
            };

            let worker_kind = match decision {
                RouteDecision::Terminate => {
                    state = state.merged(&StateUpdate::new().terminated());
                    trace.record(step, Phase::Terminated.as_str(), None, "task terminated");
                    info!(%task_id, steps = step, "Engine terminated");
                    return EngineReport {
                        state,
                        outcome: Outcome::Terminated,
                        steps: step,
                        trace,
                    };
                }
                RouteDecision::Dispatch(worker) => {
                    trace.record(
                        step,
                        Phase::Routing.as_str(),
                        Some(worker),
                        "worker selected",
                    );
                    worker
                }
            };

            // Dispatching
            let worker = match self.workers.get(worker_kind) {
                Some(worker) => worker,
                None => {
                    return self.fail(
                        state,
                        trace,
                        step,
                        RevuError::FatalEngine(format!(
                            "router selected unregistered worker '{worker_kind}'"
                        )),
                    );
                }
            };
            trace.record(
                step,
                Phase::Dispatching.as_str(),
                Some(worker_kind),
                "worker dispatched",
            );

            let timeout = Duration::from_secs(self.config.worker_timeout_secs);
            let outcome = tokio::time::timeout(
                timeout,
                worker.run(&state, self.client.as_ref(), &self.models),
            )
            .await;

            // Merging
            let update = match outcome {
                Ok(Ok(result)) => {
                    trace.record(
                        step,
                        Phase::Merging.as_str(),
                        Some(worker_kind),
                        result.summary.clone(),
                    );
                    state_update(result).dispatched(worker_kind)
                }
                Ok(Err(e)) if e.is_recoverable() => {
                    warn!(%task_id, worker = %worker_kind, error = %e, "Worker failed, surfacing to router");
                    trace.record(step, Phase::Merging.as_str(), Some(worker_kind), e.to_string());
                    StateUpdate::new()
                        .dispatched(worker_kind)
                        .with_error(task_error(&e, worker_kind, step))
                }
                Ok(Err(e)) => return self.fail(state, trace, step, e),
                Err(_elapsed) => {
                    let e = RevuError::WorkerTimeout {
                        worker: worker_kind,
                        timeout_secs: self.config.worker_timeout_secs,
                    };
                    warn!(%task_id, worker = %worker_kind, "Worker timed out");
                    trace.record(step, Phase::Merging.as_str(), Some(worker_kind), e.to_string());
                    StateUpdate::new()
                        .dispatched(worker_kind)
                        .with_error(task_error(&e, worker_kind, step))
                }
            };

            state = state.merged(&update);
        }
    }

    fn fail(
        &self,
        state: TaskState,
        mut trace: RunTrace,
        steps: usize,
        error: RevuError,
    ) -> EngineReport {
        error!(error = %error, steps, "Engine failed");
        trace.record(steps, Phase::Failed.as_str(), None, error.to_string());
        EngineReport {
            state,
            outcome: Outcome::Failed {
                error: error.to_string(),
            },
            steps,
            trace,
        }
    }
}

/// Convert a recoverable error into its TaskState record.
fn task_error(error: &RevuError, worker: WorkerKind, step: usize) -> TaskError {
    let kind = match error {
        RevuError::OutputValidation { .. } => ErrorKind::OutputValidation,
        RevuError::WorkerTimeout { .. } => ErrorKind::WorkerTimeout,
        _ => ErrorKind::Inference,
    };
    TaskError {
        kind,
        worker,
        message: error.to_string(),
        step,
    }
}
