use std::collections::VecDeque;
use std::sync::Mutex;

use futures::future::BoxFuture;

use revu_core::config::ModelConfig;
use revu_core::error::Result;
use revu_core::traits::InferenceClient;

/// Reply returned once the script runs dry. Valid against the worker
/// result schema so offline runs still terminate cleanly.
const DEFAULT_REPLY: &str =
    r#"{"summary": "stub completion (no model configured)", "findings": [], "output": ""}"#;

/// Deterministic inference client for tests and offline runs.
///
/// Replies are consumed from a scripted queue in order; when the queue
/// is empty a fixed schema-valid reply is returned. Given the same task
/// and the same script, every run produces byte-identical output.
pub struct StubClient {
    script: Mutex<VecDeque<String>>,
}

impl StubClient {
    /// A stub with no script: every call returns the default reply.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// A stub that replays the given replies in order.
    pub fn scripted(replies: Vec<String>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
        }
    }

    /// Append a reply to the script.
    pub fn push(&self, reply: impl Into<String>) {
        self.script.lock().unwrap().push_back(reply.into());
    }
}

impl Default for StubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceClient for StubClient {
    fn complete(&self, _config: &ModelConfig, _prompt: &str) -> BoxFuture<'_, Result<String>> {
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| DEFAULT_REPLY.to_string());
        Box::pin(async move { Ok(reply) })
    }
}
