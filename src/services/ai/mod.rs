pub mod gemini;
pub mod groq;
pub mod ollama;

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A chat-completion backend that is asked to answer in JSON.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String>;
}

fn http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build LLM HTTP client")
}

/// OpenAI-style message list with the system prompt first.
fn with_system(system_prompt: &str, messages: &[Message]) -> Vec<Message> {
    std::iter::once(Message::system(system_prompt))
        .chain(messages.iter().cloned())
        .collect()
}

/// Decode a provider response, keeping the raw body in the error on failure.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response, provider: &str) -> anyhow::Result<T> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .with_context(|| format!("failed to read {provider} response"))?;

    if !status.is_success() {
        anyhow::bail!("{provider} API error ({status}): {body}");
    }

    serde_json::from_str(&body).with_context(|| format!("failed to parse {provider} response"))
}
