//! Router, workers, and execution engine for Revu.
//!
//! The engine threads a [`revu_core::TaskState`] through strictly
//! sequential orchestrator/worker round-trips: the [`router::Router`]
//! picks the next member of the closed worker set, the engine dispatches
//! it under a timeout, and the worker's validated result is merged back
//! as a pure state update. Recoverable worker failures are surfaced into
//! the state for the router; routing and invariant failures are fatal.

pub mod engine;
pub mod router;
pub mod trace;
pub mod validate;
pub mod workers;

pub use engine::{Engine, EngineReport, Outcome, Phase};
pub use router::{classify, Router};
pub use trace::{RunTrace, TraceEvent};
pub use validate::{heuristic_repair, parse_worker_result, OutputValidator};
pub use workers::{state_update, Worker, WorkerSet};
