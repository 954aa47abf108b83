use serde::Serialize;

use crate::taxonomy::Taxonomy;

/// System turn sent with every classification request.
pub const SYSTEM_PROMPT: &str = "You are an assistant that categorizes medical procedure codes.";

const INSTRUCTION_HEADER: &str =
    "Categorize the following CPT/E&M code into one of these categories:";
const ANSWER_INSTRUCTION: &str = "Only provide the category name as your response.";

/// Fully rendered request text for one code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationPrompt {
    pub system: &'static str,
    pub user: String,
}

impl ClassificationPrompt {
    /// Render the prompt for `code`, listing the labels of `taxonomy`.
    ///
    /// Rendering is a pure function of its inputs so the same code always
    /// produces byte-identical text.
    pub fn new(code: &str, taxonomy: Taxonomy) -> Self {
        let user = format!(
            "{INSTRUCTION_HEADER}\n{labels}.\n{ANSWER_INSTRUCTION}\n\nCode: {code}",
            labels = taxonomy.labels().join(", "),
        );
        Self {
            system: SYSTEM_PROMPT,
            user,
        }
    }
}
