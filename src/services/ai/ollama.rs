use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{http_client, read_json, with_system, LlmProvider, Message};

/// Local Ollama server, `/api/chat` in non-streaming JSON mode.
pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    format: &'static str,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Message,
}

impl OllamaProvider {
    pub fn new(url: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            model,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(&self, system_prompt: &str, messages: &[Message]) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: with_system(system_prompt, messages),
            format: "json",
            stream: false,
        };

        let resp = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to call Ollama at {}", self.url))?;

        let data: ChatResponse = read_json(resp, "Ollama").await?;
        Ok(data.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let provider = OllamaProvider::new(
            "http://127.0.0.1:9/".into(),
            "llama3.2".into(),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(provider.url, "http://127.0.0.1:9");

        let err = provider
            .chat("system", &[Message::user("hi")])
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("Ollama"));
    }
}
