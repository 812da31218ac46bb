use std::time::Duration;

use futures::future::BoxFuture;
use tracing::warn;

use revu_core::config::{ModelConfig, RetryConfig};
use revu_core::error::{Result, RevuError};
use revu_core::traits::InferenceClient;

/// An inference client that retries transient failures with exponential
/// backoff before giving up.
pub struct RetryingClient {
    inner: Box<dyn InferenceClient>,
    retry_config: RetryConfig,
}

impl RetryingClient {
    pub fn new(inner: Box<dyn InferenceClient>, retry_config: RetryConfig) -> Self {
        Self {
            inner,
            retry_config,
        }
    }
}

fn is_retryable(e: &RevuError) -> bool {
    match e {
        RevuError::Inference(msg) => {
            msg.contains("429")
                || msg.contains("500")
                || msg.contains("502")
                || msg.contains("503")
                || msg.contains("timeout")
                || msg.contains("connection")
        }
        _ => false,
    }
}

fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    // Clamp the exponent so a large retry budget cannot overflow
    let factor = 2u64.saturating_pow(attempt.min(32));
    let ms = config
        .initial_backoff_ms
        .saturating_mul(factor)
        .min(config.max_backoff_ms);
    // Add jitter: 0.8x to 1.2x
    let jitter = 0.8 + rand::random::<f64>() * 0.4;
    Duration::from_millis((ms as f64 * jitter) as u64)
}

impl InferenceClient for RetryingClient {
    fn complete(&self, config: &ModelConfig, prompt: &str) -> BoxFuture<'_, Result<String>> {
        let config = config.clone();
        let prompt = prompt.to_string();

        Box::pin(async move {
            let max_retries = self.retry_config.max_retries;
            let mut last_err = None;

            for attempt in 0..=max_retries {
                match self.inner.complete(&config, &prompt).await {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        if is_retryable(&e) && attempt < max_retries {
                            let backoff = calculate_backoff(attempt, &self.retry_config);
                            warn!(
                                attempt = attempt + 1,
                                max_retries,
                                backoff_ms = backoff.as_millis() as u64,
                                error = %e,
                                "Retrying inference request"
                            );
                            tokio::time::sleep(backoff).await;
                            last_err = Some(e);
                            continue;
                        }
                        last_err = Some(e);
                        break;
                    }
                }
            }

            Err(last_err
                .unwrap_or_else(|| RevuError::Inference("retry loop produced no error".into())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(is_retryable(&RevuError::Inference("HTTP 429: slow down".into())));
        assert!(is_retryable(&RevuError::Inference("connection refused".into())));
        assert!(!is_retryable(&RevuError::Inference("HTTP 401: bad key".into())));
        assert!(!is_retryable(&RevuError::Routing("no worker".into())));
    }

    #[test]
    fn test_backoff_capped() {
        let config = RetryConfig {
            max_retries: 10,
            initial_backoff_ms: 1000,
            max_backoff_ms: 5000,
        };
        // Jitter stays within 1.2x of the cap
        let backoff = calculate_backoff(2, &config);
        assert!(backoff.as_millis() <= 6000);
    }

    #[test]
    fn test_backoff_high_attempt_does_not_overflow() {
        let config = RetryConfig {
            max_retries: 100,
            initial_backoff_ms: 1000,
            max_backoff_ms: 5000,
        };
        // 1000 * 2^60 overflows u64 without the exponent clamp
        let backoff = calculate_backoff(60, &config);
        assert!(backoff.as_millis() <= 6000);
    }
}
