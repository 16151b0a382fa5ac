//! OpenAI-compatible chat completions synthesizer

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{NarrativeSynthesizer, SYSTEM_PROMPT, SynthesisError, TripBrief};
use crate::config::SynthesisConfig;

pub struct OpenAiSynthesizer {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiSynthesizer {
    /// `timeout` bounds the HTTP exchange; the orchestrator applies its own budget on top
    pub fn new(config: &SynthesisConfig, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tripsmith/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for synthesis")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout,
        })
    }
}

#[async_trait]
impl NarrativeSynthesizer for OpenAiSynthesizer {
    #[tracing::instrument(name = "synthesize", level = "debug", skip_all, fields(model = %self.model))]
    async fn synthesize(&self, brief: &TripBrief) -> Result<String, SynthesisError> {
        let started = Instant::now();
        let prompt = brief.to_prompt();
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Chat completion rejected");
            return Err(SynthesisError::GenerationError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;
        let narrative = extract_narrative(parsed)?;

        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = narrative.len(),
            "Narrative generated"
        );
        Ok(narrative)
    }
}

impl OpenAiSynthesizer {
    fn transport_error(&self, err: reqwest::Error) -> SynthesisError {
        if err.is_timeout() {
            SynthesisError::Timeout(self.timeout)
        } else {
            SynthesisError::GenerationError(err.to_string())
        }
    }
}

fn extract_narrative(response: ChatResponse) -> Result<String, SynthesisError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();

    if content.is_empty() {
        Err(SynthesisError::GenerationError(
            "model returned an empty completion".to_string(),
        ))
    } else {
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_narrative() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  Day 1: arrive in Paris.\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_narrative(response).unwrap(), "Day 1: arrive in Paris.");
    }

    #[test]
    fn test_empty_completion_is_an_error() {
        let no_choices: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_narrative(no_choices),
            Err(SynthesisError::GenerationError(_))
        ));

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(extract_narrative(null_content).is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-4",
            messages: [
                ChatMessage {
                    role: "system",
                    content: "sys",
                },
                ChatMessage {
                    role: "user",
                    content: "hi",
                },
            ],
            temperature: 0.7,
            max_tokens: 2000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 2000);
    }
}
