use super::openai::{first_message_content, ChatCompletionRequest};
use super::{http_client, CompletionClient, LlmSettings};
use crate::prompt::ClassificationPrompt;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Azure OpenAI deployment; the model is addressed through the deployment name.
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    http: Client,
    url: String,
    api_key: String,
}

impl AzureOpenAiClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            bail!(
                "Azure OpenAI API key must be provided via {}",
                LlmSettings::API_KEY_ENV
            );
        }
        let endpoint = settings.endpoint.clone().ok_or_else(|| {
            anyhow!(
                "{} must be set for azure provider",
                LlmSettings::ENDPOINT_ENV
            )
        })?;
        let deployment = settings.model.clone().ok_or_else(|| {
            anyhow!(
                "{} must contain the deployment name for azure provider",
                LlmSettings::MODEL_ENV
            )
        })?;
        let api_version = settings
            .api_version
            .clone()
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version
        );

        Ok(Self {
            http: http_client(settings, "Azure OpenAI")?,
            url,
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for AzureOpenAiClient {
    async fn complete(&self, prompt: &ClassificationPrompt) -> Result<String> {
        let payload = ChatCompletionRequest::new(None, prompt);
        let response = self
            .http
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to call Azure OpenAI chat completions API")?;
        first_message_content(response, "Azure OpenAI").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Taxonomy;
    use httpmock::prelude::*;

    fn azure_settings(endpoint: Option<String>) -> LlmSettings {
        LlmSettings {
            provider: "azure".into(),
            api_key: "azure-key".into(),
            endpoint,
            model: Some("categorizer".into()),
            timeout_secs: None,
            api_version: Some("2024-06-01".into()),
        }
    }

    #[test]
    fn requires_endpoint() {
        let err = AzureOpenAiClient::new(&azure_settings(None)).unwrap_err();
        assert!(err.to_string().contains("CATEGORIZER_ENDPOINT"));
    }

    #[test]
    fn requires_deployment() {
        let mut settings = azure_settings(Some("https://example.openai.azure.com".into()));
        settings.model = None;
        let err = AzureOpenAiClient::new(&settings).unwrap_err();
        assert!(err.to_string().contains("deployment"));
    }

    #[test]
    fn builds_deployment_url() {
        let client =
            AzureOpenAiClient::new(&azure_settings(Some("https://example.openai.azure.com/".into())))
                .unwrap();
        assert_eq!(
            client.url,
            "https://example.openai.azure.com/openai/deployments/categorizer/chat/completions?api-version=2024-06-01"
        );
    }

    #[tokio::test]
    #[ignore = "requires loopback networking"]
    async fn complete_sends_api_key_header() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/openai/deployments/categorizer/chat/completions")
                .query_param("api-version", "2024-06-01")
                .header("api-key", "azure-key");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"choices":[{"message":{"content":"Labs"}}]}"#);
        });

        let client = AzureOpenAiClient::new(&azure_settings(Some(server.base_url()))).unwrap();
        let prompt = ClassificationPrompt::new("80053", Taxonomy::SiteOfCare);
        assert_eq!(client.complete(&prompt).await.unwrap(), "Labs");
        mock.assert();
    }
}
