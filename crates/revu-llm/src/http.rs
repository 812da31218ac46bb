use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use revu_core::config::ModelConfig;
use revu_core::error::{Result, RevuError};
use revu_core::traits::InferenceClient;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible chat-completions client. Works with OpenAI, Groq,
/// Ollama, vLLM, OpenRouter, etc. Non-streaming: workers consume whole
/// completions, never deltas.
pub struct HttpClient {
    http: Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl InferenceClient for HttpClient {
    fn complete(&self, config: &ModelConfig, prompt: &str) -> BoxFuture<'_, Result<String>> {
        let url = config
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_API_URL.to_string());
        let api_key = config.api_key.clone();
        let request = serde_json::to_value(ChatRequest {
            model: &config.model_id,
            messages: vec![ChatRequestMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            stream: false,
        });

        Box::pin(async move {
            let request = request?;
            let mut builder = self.http.post(&url).json(&request);
            if let Some(ref key) = api_key {
                builder = builder.bearer_auth(key);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| RevuError::Inference(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RevuError::Inference(format!(
                    "HTTP {}: {}",
                    status, body
                )));
            }

            let parsed: ChatResponse = response
                .json()
                .await
                .map_err(|e| RevuError::InferenceParse(e.to_string()))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| {
                    RevuError::InferenceParse("response contained no completion text".into())
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![ChatRequestMessage {
                role: "user",
                content: "hello",
            }],
            max_tokens: 128,
            temperature: 0.0,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "result text"}}]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("result text")
        );
    }

    #[test]
    fn test_response_missing_choices() {
        let parsed: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.choices.is_empty());
    }
}
