pub mod cell;
pub mod classifier;
pub mod llm;
pub mod prompt;
pub mod report;
pub mod runner;
pub mod table;
pub mod taxonomy;

pub use cell::{Cell, CoercionError};
pub use classifier::{Classification, ClassifierConfig, FallbackLabels, RowClassifier};
pub use llm::{build_client, CompletionClient, LlmOverrides, LlmSettings, ProviderKind};
pub use prompt::ClassificationPrompt;
pub use report::{render_summary, OutputFormat, RunSummary};
pub use runner::{CategorizeJob, ColumnSpec, CATEGORY_COLUMN, CODE_COLUMN};
pub use table::{read_table, write_table, Table, TableError, TableFormat};
pub use taxonomy::{Taxonomy, TaxonomyError};
