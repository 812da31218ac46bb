//! Inference clients for Revu.
//!
//! The [`InferenceClient`] trait lives in `revu-core`; this crate provides
//! the implementations: an OpenAI-compatible HTTP provider, a retrying
//! wrapper, and a deterministic stub for tests and offline runs.

pub mod http;
pub mod retry;
pub mod stub;

use revu_core::config::ModelConfig;
use revu_core::traits::InferenceClient;

pub use http::HttpClient;
pub use retry::RetryingClient;
pub use stub::StubClient;

/// Create an inference client based on the provider name, wrapping it in
/// retry handling when the model config asks for it.
pub fn create_client(config: &ModelConfig) -> Box<dyn InferenceClient> {
    let base: Box<dyn InferenceClient> = match config.provider.as_str() {
        "stub" => Box::new(StubClient::new()),
        // Everything else speaks the OpenAI-compatible protocol
        _ => Box::new(HttpClient::new()),
    };

    match config.retry {
        Some(ref retry) => Box::new(RetryingClient::new(base, retry.clone())),
        None => base,
    }
}
