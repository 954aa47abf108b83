use std::{collections::BTreeMap, fmt::Write};

use serde::Serialize;

use crate::classifier::Classification;

/// Format styles supported when rendering a run summary.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Per-run tally of classification outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub categories: BTreeMap<String, usize>,
    pub unrecognized: usize,
    pub call_failed: usize,
    pub uncoercible: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &Classification) {
        self.rows += 1;
        match outcome {
            Classification::Category(label) => {
                *self.categories.entry((*label).to_string()).or_default() += 1;
            }
            Classification::Unrecognized { .. } => self.unrecognized += 1,
            Classification::CallFailed { .. } => self.call_failed += 1,
            Classification::Uncoercible { .. } => self.uncoercible += 1,
        }
    }

    pub fn categorized(&self) -> usize {
        self.categories.values().sum()
    }

    pub fn fallbacks(&self) -> usize {
        self.unrecognized + self.call_failed + self.uncoercible
    }
}

/// Produce a report string from a `RunSummary` using the desired format.
pub fn render_summary(summary: &RunSummary, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(summary),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
    }
}

fn render_human(summary: &RunSummary) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(
        out,
        "Rows: {} ({} categorized, {} fallback)",
        summary.rows,
        summary.categorized(),
        summary.fallbacks()
    )?;

    if !summary.categories.is_empty() {
        writeln!(out)?;
        writeln!(out, "Categories:")?;
        let mut ranked: Vec<_> = summary.categories.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (label, count) in ranked {
            writeln!(out, "  - {label:<28} {count:>6}")?;
        }
    }

    if summary.fallbacks() > 0 {
        writeln!(out)?;
        writeln!(out, "Fallbacks:")?;
        writeln!(out, "  - {:<28} {:>6}", "unrecognized response", summary.unrecognized)?;
        writeln!(out, "  - {:<28} {:>6}", "call failed", summary.call_failed)?;
        writeln!(out, "  - {:<28} {:>6}", "uncoercible value", summary.uncoercible)?;
    }

    Ok(out)
}
