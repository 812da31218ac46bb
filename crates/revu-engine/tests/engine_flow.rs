//! End-to-end engine runs against the deterministic stub client.

use std::sync::Arc;

use revu_core::config::AppConfig;
use revu_core::state::TaskState;
use revu_core::types::{ErrorKind, TaskKind, WorkerKind};
use revu_engine::{Engine, Outcome};
use revu_llm::StubClient;

fn engine_with(replies: Vec<&str>) -> Engine {
    let script = replies.into_iter().map(str::to_string).collect();
    Engine::new(AppConfig::default(), Arc::new(StubClient::scripted(script)))
}

const LOGIC_REPLY: &str =
    r#"{"summary": "one logic issue", "findings": ["unbounded recursion in dfs"]}"#;
const STYLE_REPLY: &str =
    r#"{"summary": "one style issue", "findings": ["function name is unclear"]}"#;
const DIAGRAM_REPLY: &str = "graph TD\n    A[dfs] --> B[visit]";
const REPORT_REPLY: &str = r###"{"summary": "review complete", "output": "## Security & Logic\n- unbounded recursion in dfs\n\n## Style\n- function name is unclear"}"###;

#[tokio::test]
async fn review_task_runs_workers_in_order() {
    let engine = engine_with(vec![LOGIC_REPLY, STYLE_REPLY, DIAGRAM_REPLY, REPORT_REPLY]);

    let report = engine.run(TaskState::new("review this diff please")).await;

    assert!(report.succeeded());
    let state = &report.state;
    assert_eq!(state.task_kind, Some(TaskKind::Review));
    assert_eq!(
        state.route_history,
        vec![
            WorkerKind::LogicCheck,
            WorkerKind::StyleCheck,
            WorkerKind::Diagram,
            WorkerKind::Report
        ]
    );
    assert_eq!(state.logic_findings, vec!["unbounded recursion in dfs"]);
    assert_eq!(state.style_findings, vec!["function name is unclear"]);
    assert_eq!(state.diagram.as_deref(), Some(DIAGRAM_REPLY));
    let rendered = state.report.as_deref().unwrap();
    // The diagram leads the report; findings follow
    assert!(rendered.starts_with("## Architecture\n\n```mermaid\ngraph TD"));
    assert!(rendered.contains("## Security & Logic"));
    assert!(state.done);
    assert!(state.errors.is_empty());
}

#[tokio::test]
async fn format_task_reaches_terminated_with_result() {
    let engine = engine_with(vec![
        r#"{"summary": "reindented", "output": "fn main() {\n    println!(\"hi\");\n}"}"#,
    ]);

    let report = engine.run(TaskState::new("format this code snippet")).await;

    assert!(report.succeeded());
    assert_eq!(report.state.task_kind, Some(TaskKind::Format));
    assert!(report.state.result.as_deref().unwrap().starts_with("fn main()"));
    assert!(report.state.done);
}

#[tokio::test]
async fn invalid_output_is_surfaced_then_rerouted_once() {
    // First format reply is missing the required 'output' key; the retry
    // succeeds.
    let engine = engine_with(vec![
        r#"{"summary": "oops, no output key"}"#,
        r#"{"summary": "fixed", "output": "fn main() {}"}"#,
    ]);

    let report = engine.run(TaskState::new("format this code snippet")).await;

    assert!(report.succeeded());
    let state = &report.state;
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].kind, ErrorKind::OutputValidation);
    assert_eq!(state.errors[0].worker, WorkerKind::Format);
    assert_eq!(
        state.route_history,
        vec![WorkerKind::Format, WorkerKind::Format]
    );
    assert_eq!(state.result.as_deref(), Some("fn main() {}"));
    assert!(state.done);
}

#[tokio::test]
async fn unclassifiable_task_fails_without_dispatch() {
    let engine = engine_with(vec![]);

    let report = engine.run(TaskState::new("translate this to French")).await;

    match report.outcome {
        Outcome::Failed { ref error } => assert!(error.contains("Routing failed")),
        ref other => panic!("expected Failed, got {other:?}"),
    }
    assert!(report.state.route_history.is_empty());
    assert!(!report.state.done);
}

#[tokio::test]
async fn clean_review_skips_report_model_call() {
    // Logic and style both come back empty; the report fast path needs no
    // fourth scripted reply.
    let engine = engine_with(vec![
        r#"{"summary": "clean", "findings": []}"#,
        r#"{"summary": "clean", "findings": []}"#,
        DIAGRAM_REPLY,
    ]);

    let report = engine.run(TaskState::new("review this diff")).await;

    assert!(report.succeeded());
    assert!(report
        .state
        .report
        .as_deref()
        .unwrap()
        .contains("No critical issues"));
}

#[tokio::test]
async fn invalid_diagram_is_dropped_without_error() {
    // The diagram reply is a refusal; the review still completes with no
    // error recorded and no diagram section in the report.
    let engine = engine_with(vec![
        LOGIC_REPLY,
        STYLE_REPLY,
        "I cannot draw a diagram for this.",
        REPORT_REPLY,
    ]);

    let report = engine.run(TaskState::new("review this diff")).await;

    assert!(report.succeeded());
    let state = &report.state;
    assert!(state.diagram.is_none());
    assert!(state.errors.is_empty());
    assert!(!state.report.as_deref().unwrap().contains("```mermaid"));
    assert!(state.done);
}

#[tokio::test]
async fn concurrent_tasks_do_not_share_state() {
    // The stub's default reply is identical for every call, so each run
    // is deterministic regardless of interleaving.
    let engine = Engine::new(AppConfig::default(), Arc::new(StubClient::new()));

    let (format_run, review_run) = tokio::join!(
        engine.run(TaskState::new("format this snippet")),
        engine.run(TaskState::new("review this diff"))
    );

    assert!(format_run.succeeded());
    assert!(review_run.succeeded());
    assert_eq!(format_run.state.task, "format this snippet");
    assert_eq!(review_run.state.task, "review this diff");
    assert_eq!(format_run.state.route_history, vec![WorkerKind::Format]);
    assert!(review_run.state.route_history.contains(&WorkerKind::Report));

    // Each concurrent run matches its own sequential run exactly
    let sequential = Engine::new(AppConfig::default(), Arc::new(StubClient::new()));
    let format_seq = sequential.run(TaskState::new("format this snippet")).await;
    let review_seq = sequential.run(TaskState::new("review this diff")).await;

    assert_eq!(
        serde_json::to_string(&format_run.state).unwrap(),
        serde_json::to_string(&format_seq.state).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&review_run.state).unwrap(),
        serde_json::to_string(&review_seq.state).unwrap()
    );
}

#[tokio::test]
async fn fixed_task_and_script_reproduce_identical_state() {
    let replies = vec![LOGIC_REPLY, STYLE_REPLY, DIAGRAM_REPLY, REPORT_REPLY];

    let first = engine_with(replies.clone())
        .run(TaskState::new("review this diff"))
        .await;
    let second = engine_with(replies)
        .run(TaskState::new("review this diff"))
        .await;

    let a = serde_json::to_string(&first.state).unwrap();
    let b = serde_json::to_string(&second.state).unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn trace_covers_every_step() {
    let engine = engine_with(vec![LOGIC_REPLY, STYLE_REPLY, DIAGRAM_REPLY, REPORT_REPLY]);
    let report = engine.run(TaskState::new("review this diff")).await;

    // Four round-trips plus terminate
    assert_eq!(report.steps, 5);
    let rendered = report.trace.render();
    assert!(rendered.contains("dispatching"));
    assert!(rendered.contains("terminated"));
}
