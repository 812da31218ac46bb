use futures::future::BoxFuture;

use crate::config::ModelConfig;
use crate::error::Result;

/// Inference client — a single blocking-style completion per call.
///
/// Workers and the router are the only consumers; the execution engine
/// never performs inference itself. Implementations must be cheap to
/// share behind an `Arc`.
pub trait InferenceClient: Send + Sync + 'static {
    /// Send a prompt and receive the full completion text.
    fn complete(&self, config: &ModelConfig, prompt: &str) -> BoxFuture<'_, Result<String>>;
}
