use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, read_json, LlmProvider, Message};

const GEMINI_API: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            api_key,
            model,
            client: http_client(timeout)?,
        })
    }
}

fn text(content: &str) -> Vec<Part> {
    vec![Part {
        text: content.to_string(),
    }]
}

// Gemini names the assistant "model" and has no system role in `contents`.
fn request(system_prompt: &str, messages: &[Message]) -> GenerateRequest {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: text(system_prompt),
        },
        contents: messages
            .iter()
            .map(|msg| Content {
                role: Some(if msg.role == "assistant" { "model" } else { "user" }.to_string()),
                parts: text(&msg.content),
            })
            .collect(),
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            temperature: 0.2,
        },
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let resp = self
            .client
            .post(format!("{GEMINI_API}/{}:generateContent", self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request(system_prompt, messages))
            .send()
            .await
            .context("failed to call Gemini API")?;

        let data: GenerateResponse = read_json(resp, "Gemini").await?;

        data.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| anyhow::anyhow!("missing text in Gemini response"))
    }
}
