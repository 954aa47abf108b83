use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Optional LLM values supplied by a config file or CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LlmOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    pub api_version: Option<String>,
}

/// Resolved configuration for a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub provider: String,
    pub api_key: String,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub api_version: Option<String>,
}

impl LlmSettings {
    pub const API_KEY_ENV: &'static str = "API_KEY";
    pub const PROVIDER_ENV: &'static str = "CATEGORIZER_PROVIDER";
    pub const ENDPOINT_ENV: &'static str = "CATEGORIZER_ENDPOINT";
    pub const MODEL_ENV: &'static str = "CATEGORIZER_MODEL";
    pub const TIMEOUT_ENV: &'static str = "CATEGORIZER_TIMEOUT_SECS";
    pub const API_VERSION_ENV: &'static str = "CATEGORIZER_API_VERSION";

    /// Layer config-file values, then environment variables, then CLI flags.
    ///
    /// * `CATEGORIZER_PROVIDER` - Provider identifier (default: `openai`).
    /// * `API_KEY`              - API key/token (required unless provider is `noop`).
    /// * `CATEGORIZER_ENDPOINT` - Optional custom endpoint/base URL.
    pub fn resolve(file: &LlmOverrides, cli: &LlmOverrides) -> Result<Self> {
        Self::from_map(std::env::vars().collect(), file, cli)
    }

    fn from_map(
        vars: HashMap<String, String>,
        file: &LlmOverrides,
        cli: &LlmOverrides,
    ) -> Result<Self> {
        let env = |key: &str| {
            vars.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let pick = |cli: &Option<String>, key: &str, file: &Option<String>| {
            non_blank(cli).or_else(|| env(key)).or_else(|| non_blank(file))
        };

        let provider = pick(&cli.provider, Self::PROVIDER_ENV, &file.provider)
            .unwrap_or_else(|| "openai".to_string());
        let api_key = match provider.to_lowercase().as_str() {
            "noop" => env(Self::API_KEY_ENV).unwrap_or_default(),
            _ => env(Self::API_KEY_ENV).with_context(|| {
                format!(
                    "environment variable {} must be set to the {} API key",
                    Self::API_KEY_ENV,
                    provider
                )
            })?,
        };
        let timeout_secs = cli
            .timeout_secs
            .or_else(|| env(Self::TIMEOUT_ENV).and_then(|v| v.parse::<u64>().ok()))
            .or(file.timeout_secs);

        Ok(Self {
            endpoint: pick(&cli.endpoint, Self::ENDPOINT_ENV, &file.endpoint),
            model: pick(&cli.model, Self::MODEL_ENV, &file.model),
            api_version: pick(&cli.api_version, Self::API_VERSION_ENV, &file.api_version),
            provider,
            api_key,
            timeout_secs,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_to_openai_provider() {
        let settings = LlmSettings::from_map(
            vars(&[(LlmSettings::API_KEY_ENV, "secret")]),
            &LlmOverrides::default(),
            &LlmOverrides::default(),
        )
        .expect("should load settings");
        assert_eq!(settings.provider, "openai");
        assert_eq!(settings.api_key, "secret");
        assert!(settings.endpoint.is_none());
        assert!(settings.model.is_none());
        assert!(settings.timeout_secs.is_none());
    }

    #[test]
    fn errors_when_api_key_missing() {
        let err = LlmSettings::from_map(
            vars(&[(LlmSettings::PROVIDER_ENV, "openai")]),
            &LlmOverrides::default(),
            &LlmOverrides::default(),
        )
        .expect_err("missing API key should error");
        assert!(err.to_string().contains(LlmSettings::API_KEY_ENV));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let err = LlmSettings::from_map(
            vars(&[(LlmSettings::API_KEY_ENV, "   ")]),
            &LlmOverrides::default(),
            &LlmOverrides::default(),
        )
        .expect_err("blank API key should error");
        assert!(err.to_string().contains("API_KEY"));
    }

    #[test]
    fn noop_provider_allows_missing_key() {
        let settings = LlmSettings::from_map(
            vars(&[(LlmSettings::PROVIDER_ENV, "noop")]),
            &LlmOverrides::default(),
            &LlmOverrides::default(),
        )
        .expect("noop should not require key");
        assert_eq!(settings.provider, "noop");
        assert!(settings.api_key.is_empty());
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let file = LlmOverrides {
            provider: Some("anthropic".into()),
            model: Some("file-model".into()),
            endpoint: Some("https://file.example".into()),
            timeout_secs: Some(10),
            api_version: Some("file-version".into()),
        };
        let cli = LlmOverrides {
            model: Some("cli-model".into()),
            ..LlmOverrides::default()
        };
        let settings = LlmSettings::from_map(
            vars(&[
                (LlmSettings::API_KEY_ENV, "secret"),
                (LlmSettings::MODEL_ENV, "env-model"),
                (LlmSettings::ENDPOINT_ENV, "https://env.example"),
                (LlmSettings::TIMEOUT_ENV, "45"),
            ]),
            &file,
            &cli,
        )
        .expect("layered settings");
        assert_eq!(settings.provider, "anthropic");
        assert_eq!(settings.model.as_deref(), Some("cli-model"));
        assert_eq!(settings.endpoint.as_deref(), Some("https://env.example"));
        assert_eq!(settings.timeout_secs, Some(45));
        assert_eq!(settings.api_version.as_deref(), Some("file-version"));
    }

    #[test]
    fn unparsable_timeout_falls_back_to_file() {
        let file = LlmOverrides {
            timeout_secs: Some(12),
            ..LlmOverrides::default()
        };
        let settings = LlmSettings::from_map(
            vars(&[
                (LlmSettings::API_KEY_ENV, "secret"),
                (LlmSettings::TIMEOUT_ENV, "soon"),
            ]),
            &file,
            &LlmOverrides::default(),
        )
        .unwrap();
        assert_eq!(settings.timeout_secs, Some(12));
    }
}
