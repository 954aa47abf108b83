use super::{http_client, CompletionClient, LlmSettings, MAX_OUTPUT_TOKENS, TEMPERATURE};
use crate::prompt::ClassificationPrompt;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";
const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: Client,
    url: String,
    api_key: String,
    api_version: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            bail!(
                "Anthropic API key must be provided via {}",
                LlmSettings::API_KEY_ENV
            );
        }
        let base = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com".to_string());
        let url = format!("{}/v1/messages", base.trim_end_matches('/'));
        Ok(Self {
            http: http_client(settings, "Anthropic")?,
            url,
            api_key: settings.api_key.clone(),
            api_version: settings
                .api_version
                .clone()
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_VERSION.to_string()),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, prompt: &ClassificationPrompt) -> Result<String> {
        let payload = AnthropicRequest::new(self.model.clone(), prompt);
        let response = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&payload)
            .send()
            .await
            .context("failed to call Anthropic messages API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Anthropic API error ({}): {}", status, body);
        }

        let message: AnthropicResponse = response
            .json()
            .await
            .context("failed to parse Anthropic response")?;
        message
            .content
            .into_iter()
            .find_map(|part| part.text)
            .ok_or_else(|| anyhow!("Anthropic response missing message content"))
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    system: String,
    messages: Vec<AnthropicMessage>,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicRequest {
    fn new(model: String, prompt: &ClassificationPrompt) -> Self {
        Self {
            model,
            system: prompt.system.to_string(),
            messages: vec![AnthropicMessage {
                role: "user".into(),
                content: prompt.user.clone(),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        }
    }
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Taxonomy;
    use httpmock::prelude::*;
    use serde_json::json;

    fn base_settings(url: String) -> LlmSettings {
        LlmSettings {
            provider: "anthropic".into(),
            api_key: "test-key".into(),
            endpoint: Some(url),
            model: Some("claude-test".into()),
            timeout_secs: Some(5),
            api_version: None,
        }
    }

    #[test]
    fn system_prompt_travels_outside_messages() {
        let prompt = ClassificationPrompt::new("96365", Taxonomy::Surgical);
        let body = serde_json::to_value(AnthropicRequest::new("claude-test".into(), &prompt))
            .unwrap();
        assert_eq!(body["system"], json!(prompt.system));
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["temperature"], json!(0.0));
        assert_eq!(body["max_tokens"], json!(10));
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn complete_parses_text_block() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "test-key")
                .header("anthropic-version", DEFAULT_ANTHROPIC_VERSION);
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"content":[{"type":"text","text":"Infusions"}]}"#);
        });

        let client = AnthropicClient::new(&base_settings(server.base_url())).unwrap();
        let prompt = ClassificationPrompt::new("96365", Taxonomy::Surgical);
        assert_eq!(client.complete(&prompt).await.unwrap(), "Infusions");
        mock.assert();
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn failure_surfaces_status() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(401).body("invalid x-api-key");
        });

        let client = AnthropicClient::new(&base_settings(server.base_url())).unwrap();
        let prompt = ClassificationPrompt::new("96365", Taxonomy::Surgical);
        let err = client.complete(&prompt).await.unwrap_err();
        assert!(err.to_string().contains("Anthropic API error"));
        mock.assert_hits(1);
    }
}
