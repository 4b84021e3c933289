//! OpenRouter chat-completions client
//!
//! All external text generation goes through the [`Generator`] trait so the
//! orchestration logic can be tested against deterministic fakes. The
//! production implementation talks to OpenRouter with bounded retry on rate
//! limits and a per-request timeout; expiry is surfaced as an ordinary error
//! the caller treats as a recoverable failure for that round.

use super::models::Model;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Rate limit retry configuration
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_SECS: u64 = 2;
const BACKOFF_MULTIPLIER: u64 = 2;

/// Narrow boundary for external text generation. Responses are free text
/// that only loosely conforms to the requested format; callers must
/// tolerate anything.
pub trait Generator {
    fn generate(
        &self,
        model: Model,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: String,
}

/// Production client against OpenRouter.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(LlmClient { client, api_key })
    }

    async fn call(&self, model: Model, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: model.id().to_string(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens: model.max_tokens(),
            stream: false,
        };

        let mut retry_count = 0;

        loop {
            let response = self
                .client
                .post(OPENROUTER_URL)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;

            if status.is_success() {
                let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
                    anyhow::anyhow!("Failed to parse OpenRouter response: {e}\n{text}")
                })?;
                return Ok(parsed
                    .choices
                    .first()
                    .map(|c| c.message.content.clone())
                    .unwrap_or_default());
            }

            if status.as_u16() == 429 && retry_count < MAX_RETRIES {
                retry_count += 1;
                let backoff = INITIAL_BACKOFF_SECS * BACKOFF_MULTIPLIER.pow(retry_count - 1);
                eprintln!(
                    "  OpenRouter rate limited. Retrying in {backoff}s (attempt {retry_count}/{MAX_RETRIES})"
                );
                tokio::time::sleep(Duration::from_secs(backoff)).await;
                continue;
            }

            let error_msg = match status.as_u16() {
                401 => "Invalid API key. Check OPENROUTER_API_KEY.".to_string(),
                429 => format!(
                    "Rate limited by OpenRouter after {retry_count} retries. Try again in a few minutes."
                ),
                500..=599 => format!(
                    "OpenRouter server error ({status}). The service may be temporarily unavailable."
                ),
                _ => format!("API error {status}: {}", truncate_str(&text, 200)),
            };
            return Err(anyhow::anyhow!("{error_msg}"));
        }
    }
}

impl Generator for LlmClient {
    async fn generate(&self, model: Model, system: &str, user: &str) -> Result<String> {
        self.call(model, system, user).await
    }
}

/// Truncate a string for display (Unicode-safe)
fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
