use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const SURGICAL_LABELS: [&str; 10] = [
    "Visits",
    "Imaging",
    "Specialised treatment",
    "Labs",
    "Surgical Procedures",
    "Infusions",
    "Non-surgical Procedures",
    "Specialized Services",
    "Specialized Investigations",
    "General testing",
];

const SITE_OF_CARE_LABELS: [&str; 10] = [
    "Visits",
    "Imaging",
    "Specialised treatment",
    "Labs",
    "Hospital Procedures",
    "Infusions",
    "In-office Procedures",
    "Specialized Services",
    "Specialized Investigations",
    "General testing",
];

/// Fixed set of billing categories a code may be assigned to.
///
/// Both taxonomies share eight labels and differ in how procedures are split:
/// `Surgical` separates surgical from non-surgical work, `SiteOfCare`
/// separates hospital from in-office work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Taxonomy {
    #[default]
    Surgical,
    SiteOfCare,
}

impl Taxonomy {
    /// Labels in prompt order.
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            Self::Surgical => &SURGICAL_LABELS,
            Self::SiteOfCare => &SITE_OF_CARE_LABELS,
        }
    }

    /// Exact, case-sensitive membership lookup returning the canonical label.
    pub fn find(self, candidate: &str) -> Option<&'static str> {
        self.labels()
            .iter()
            .copied()
            .find(|label| *label == candidate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Surgical => "surgical",
            Self::SiteOfCare => "site-of-care",
        }
    }
}

impl fmt::Display for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("unknown taxonomy `{0}` (expected `surgical` or `site-of-care`)")]
    Unknown(String),
}

impl FromStr for Taxonomy {
    type Err = TaxonomyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "surgical" | "a" => Ok(Self::Surgical),
            "site-of-care" | "site_of_care" | "b" => Ok(Self::SiteOfCare),
            other => Err(TaxonomyError::Unknown(other.to_string())),
        }
    }
}
