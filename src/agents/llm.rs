//! Chat completion client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::{Result, SbError};

/// A hosted chat model. Implementations must be usable from blocking worker threads.
pub trait ChatClient: Send + Sync {
    /// Send one system + user exchange and return the assistant's text.
    fn complete(&self, system: &str, user: &str, temperature: f32, max_tokens: u32)
    -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiClient {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        if !config.enabled {
            return Err(SbError::MissingConfig("llm.enabled".to_string()));
        }
        if config.endpoint.trim().is_empty() {
            return Err(SbError::MissingConfig("llm.endpoint".to_string()));
        }
        if config.api_key.trim().is_empty() {
            return Err(SbError::MissingConfig("llm.api_key".to_string()));
        }
        if config.endpoint.starts_with("http://") {
            tracing::warn!(
                endpoint = %config.endpoint,
                "LLM endpoint uses unencrypted HTTP. The API key will be sent in plain text."
            );
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|err| SbError::Config(format!("llm http client: {err}")))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            client,
        })
    }
}

impl ChatClient for OpenAiClient {
    fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
        };

        tracing::debug!(model = %self.model, max_tokens, "sending chat completion");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    SbError::Timeout(format!("chat completion: {err}"))
                } else {
                    SbError::Llm(format!("request failed: {err}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SbError::Llm(format!("HTTP {status}")));
        }

        let body: CompletionResponse = response
            .json()
            .map_err(|err| SbError::Llm(format!("response parse: {err}")))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SbError::Llm("empty completion".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn config(endpoint: String) -> LlmConfig {
        LlmConfig {
            enabled: true,
            endpoint,
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn from_config_requires_enabled_and_key() {
        let mut cfg = config("https://example.invalid/v1/chat/completions".to_string());
        cfg.enabled = false;
        assert!(matches!(
            OpenAiClient::from_config(&cfg),
            Err(SbError::MissingConfig(key)) if key == "llm.enabled"
        ));

        cfg.enabled = true;
        cfg.api_key = "  ".to_string();
        assert!(matches!(
            OpenAiClient::from_config(&cfg),
            Err(SbError::MissingConfig(key)) if key == "llm.api_key"
        ));
    }

    #[test]
    fn posts_chat_request_and_reads_first_choice() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key");
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
            }));
        });

        let client = OpenAiClient::from_config(&config(server.url("/v1/chat/completions"))).unwrap();
        let reply = client.complete("system", "user", 0.3, 2000).unwrap();
        assert_eq!(reply, "{\"ok\": true}");
        mock.assert();
    }

    #[test]
    fn non_success_status_is_llm_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).body("rate limited");
        });

        let client = OpenAiClient::from_config(&config(server.url("/v1/chat/completions"))).unwrap();
        let err = client.complete("s", "u", 0.2, 10).unwrap_err();
        assert!(matches!(err, SbError::Llm(message) if message.contains("429")));
    }

    #[test]
    fn empty_choices_is_llm_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        });

        let client = OpenAiClient::from_config(&config(server.url("/v1/chat/completions"))).unwrap();
        assert!(matches!(
            client.complete("s", "u", 0.2, 10),
            Err(SbError::Llm(_))
        ));
    }
}
