mod anthropic;
mod azure;
mod openai;
mod settings;

use std::{fmt, str::FromStr, time::Duration};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::prompt::ClassificationPrompt;

pub use anthropic::AnthropicClient;
pub use azure::AzureOpenAiClient;
pub use openai::OpenAiClient;
pub use settings::{LlmOverrides, LlmSettings};

/// Sampling temperature for every classification request.
pub const TEMPERATURE: f32 = 0.0;
/// Output-token ceiling; a category name is a short phrase.
pub const MAX_OUTPUT_TOKENS: u32 = 10;

const USER_AGENT: &str = "code-categorizer/0.3";

/// Narrow capability over a hosted completion API.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send the prompt and return the raw assistant text.
    async fn complete(&self, prompt: &ClassificationPrompt) -> Result<String>;
}

/// Offline client used for dry runs; answers every prompt with `unavailable`.
#[derive(Debug, Default, Clone)]
pub struct NoopCompletionClient;

#[async_trait]
impl CompletionClient for NoopCompletionClient {
    async fn complete(&self, _prompt: &ClassificationPrompt) -> Result<String> {
        Ok("unavailable".into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Azure,
    Anthropic,
    Noop,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "azure" | "azure-openai" => Ok(Self::Azure),
            "anthropic" => Ok(Self::Anthropic),
            "noop" => Ok(Self::Noop),
            other => bail!("unsupported provider `{other}` (expected openai, azure, anthropic or noop)"),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
            Self::Anthropic => "anthropic",
            Self::Noop => "noop",
        };
        f.write_str(name)
    }
}

/// Construct the client selected by `settings.provider`.
pub fn build_client(settings: &LlmSettings) -> Result<Box<dyn CompletionClient>> {
    let kind: ProviderKind = settings.provider.parse()?;
    tracing::debug!(provider = %kind, model = ?settings.model, "building completion client");
    Ok(match kind {
        ProviderKind::OpenAi => Box::new(OpenAiClient::new(settings)?),
        ProviderKind::Azure => Box::new(AzureOpenAiClient::new(settings)?),
        ProviderKind::Anthropic => Box::new(AnthropicClient::new(settings)?),
        ProviderKind::Noop => Box::new(NoopCompletionClient),
    })
}

/// Shared HTTP client; without a configured timeout reqwest's default applies.
fn http_client(settings: &LlmSettings, provider_label: &str) -> Result<Client> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(secs) = settings.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .with_context(|| format!("failed to build {provider_label} HTTP client"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Taxonomy;

    fn settings(provider: &str) -> LlmSettings {
        LlmSettings {
            provider: provider.into(),
            api_key: String::new(),
            endpoint: None,
            model: None,
            timeout_secs: None,
            api_version: None,
        }
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(
            "azure-openai".parse::<ProviderKind>().unwrap(),
            ProviderKind::Azure
        );
        assert_eq!("noop".parse::<ProviderKind>().unwrap(), ProviderKind::Noop);
        let err = "bard".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("unsupported provider `bard`"));
    }

    #[test]
    fn unknown_provider_fails_to_build() {
        let err = build_client(&settings("bard")).err().expect("should fail");
        assert!(err.to_string().contains("bard"));
    }

    #[test]
    fn openai_without_key_fails_to_build() {
        let err = build_client(&settings("openai")).err().expect("should fail");
        assert!(err.to_string().contains("API key"));
    }

    #[tokio::test]
    async fn noop_client_answers_unavailable() {
        let client = build_client(&settings("noop")).expect("noop builds without key");
        let prompt = ClassificationPrompt::new("99213", Taxonomy::Surgical);
        assert_eq!(client.complete(&prompt).await.unwrap(), "unavailable");
    }
}
