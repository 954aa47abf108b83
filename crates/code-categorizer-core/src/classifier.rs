use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    cell::Cell, llm::CompletionClient, prompt::ClassificationPrompt, taxonomy::Taxonomy,
};

/// Labels written when a row cannot be assigned a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackLabels {
    /// Model answered with text outside the taxonomy.
    pub unrecognized: String,
    /// The completion call returned an error.
    pub call_failed: String,
    /// The cell could not be coerced to text.
    pub unknown: String,
}

impl Default for FallbackLabels {
    fn default() -> Self {
        Self {
            unrecognized: "Other".into(),
            call_failed: "Error".into(),
            unknown: "Unknown".into(),
        }
    }
}

/// Everything the classifier needs besides the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub taxonomy: Taxonomy,
    pub fallback: FallbackLabels,
}

/// Result of classifying one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Category(&'static str),
    Unrecognized { code: String, response: String },
    CallFailed { code: String, reason: String },
    Uncoercible { reason: String },
}

impl Classification {
    /// Text written to the output column.
    pub fn label<'a>(&'a self, fallback: &'a FallbackLabels) -> &'a str {
        match self {
            Self::Category(label) => label,
            Self::Unrecognized { .. } => &fallback.unrecognized,
            Self::CallFailed { .. } => &fallback.call_failed,
            Self::Uncoercible { .. } => &fallback.unknown,
        }
    }

    pub fn is_category(&self) -> bool {
        matches!(self, Self::Category(_))
    }
}

/// Assigns one taxonomy label per code through a completion client.
///
/// Stateless apart from the client: every call builds a fresh prompt, makes at
/// most one request and never retries.
pub struct RowClassifier {
    client: Box<dyn CompletionClient>,
    config: ClassifierConfig,
}

impl RowClassifier {
    pub fn new(client: Box<dyn CompletionClient>, config: ClassifierConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn prompt_for(&self, code: &str) -> ClassificationPrompt {
        ClassificationPrompt::new(code, self.config.taxonomy)
    }

    /// Classify a single cell. Failures degrade to a fallback variant.
    pub async fn classify(&self, cell: &Cell) -> Classification {
        let code = match cell.to_code_text() {
            Ok(code) => code,
            Err(err) => {
                warn!("Skipping classification for value '{}': {}", cell, err);
                return Classification::Uncoercible {
                    reason: err.to_string(),
                };
            }
        };

        let prompt = self.prompt_for(&code);
        let response = match self.client.complete(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                error!("Error categorizing code '{}': {:#}", code, err);
                return Classification::CallFailed {
                    code,
                    reason: format!("{err:#}"),
                };
            }
        };

        let answer = response.trim();
        match self.config.taxonomy.find(answer) {
            Some(label) => {
                debug!(code = %code, category = label, "categorized code");
                Classification::Category(label)
            }
            None => {
                warn!(
                    "Received unexpected category '{}' for code '{}'",
                    answer, code
                );
                Classification::Unrecognized {
                    code,
                    response: answer.to_string(),
                }
            }
        }
    }
}
