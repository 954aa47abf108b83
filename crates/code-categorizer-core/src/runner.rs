use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    classifier::RowClassifier,
    report::RunSummary,
    table::{read_table, write_table, Table, TableError, TableFormat},
};

/// Column the classifier reads after any rename.
pub const CODE_COLUMN: &str = "Item";
/// Column the labels are written to.
pub const CATEGORY_COLUMN: &str = "Category";

/// Which input column holds the codes and what to call it in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub source: String,
    pub rename_to: Option<String>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            source: CODE_COLUMN.to_string(),
            rename_to: None,
        }
    }
}

/// Check the required column and apply the rename. Returns the column index.
pub fn prepare_table(
    table: &mut Table,
    columns: &ColumnSpec,
    path: &Path,
) -> Result<usize, TableError> {
    let index = table
        .column_index(&columns.source)
        .ok_or_else(|| TableError::MissingColumn {
            column: columns.source.clone(),
            path: path.to_path_buf(),
        })?;
    if let Some(target) = columns.rename_to.as_deref() {
        table.rename_column(&columns.source, target);
    }
    Ok(index)
}

/// Classify every row of `column` in table order and store the labels in the
/// `Category` column.
pub async fn categorize_table(
    classifier: &RowClassifier,
    table: &mut Table,
    column: usize,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let total = table.len();
    let mut labels = Vec::with_capacity(total);
    for (row, cell) in table.column(column).enumerate() {
        let outcome = classifier.classify(cell).await;
        debug!(row = row + 1, total, "classified row");
        summary.record(&outcome);
        labels.push(outcome.label(&classifier.config().fallback).to_string());
    }
    table.set_column(CATEGORY_COLUMN, labels);
    summary
}

/// One input file categorized into one output file.
#[derive(Debug, Clone)]
pub struct CategorizeJob {
    pub input: PathBuf,
    pub input_format: TableFormat,
    pub output: PathBuf,
    pub output_format: TableFormat,
    pub columns: ColumnSpec,
}

impl CategorizeJob {
    /// Read the input and validate its code column.
    pub fn load(&self) -> Result<(Table, usize), TableError> {
        let mut table = read_table(&self.input, self.input_format)?;
        let index = prepare_table(&mut table, &self.columns, &self.input)?;
        Ok((table, index))
    }

    /// Load, classify and write. The output is only written once every row is done.
    pub async fn run(&self, classifier: &RowClassifier) -> Result<RunSummary, TableError> {
        let (mut table, index) = self.load()?;
        if table.is_empty() {
            warn!(input = %self.input.display(), "input table has no data rows");
        }
        info!(
            input = %self.input.display(),
            rows = table.len(),
            taxonomy = %classifier.config().taxonomy,
            "categorizing codes"
        );
        let summary = categorize_table(classifier, &mut table, index).await;
        write_table(&table, &self.output, self.output_format)?;
        info!(
            output = %self.output.display(),
            categorized = summary.categorized(),
            fallbacks = summary.fallbacks(),
            "run complete"
        );
        Ok(summary)
    }
}
