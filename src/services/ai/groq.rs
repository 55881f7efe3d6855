use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, read_json, with_system, LlmProvider, Message};

const GROQ_API: &str = "https://api.groq.com/openai/v1/chat/completions";

pub struct GroqProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

impl GroqProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            api_key,
            model,
            client: http_client(timeout)?,
        })
    }

    fn request<'a>(&'a self, system_prompt: &str, messages: &[Message]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: with_system(system_prompt, messages),
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let resp = self
            .client
            .post(GROQ_API)
            .bearer_auth(&self.api_key)
            .json(&self.request(system_prompt, messages))
            .send()
            .await
            .context("failed to call Groq API")?;

        let data: ChatResponse = read_json(resp, "Groq").await?;
        tracing::debug!(model = %self.model, "Groq completion received");

        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("missing content in Groq response"))
    }
}
