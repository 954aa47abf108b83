use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single value read from an input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Spreadsheet error cell such as `#N/A`.
    Error(String),
}

/// Reasons a cell cannot be turned into code text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoercionError {
    #[error("cell is empty")]
    Empty,
    #[error("cell holds a non-finite number ({0})")]
    NonFinite(f64),
    #[error("cell holds a spreadsheet error ({0})")]
    ErrorValue(String),
}

impl Cell {
    /// Build a cell from a CSV field; blank fields are empty cells.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Self::Empty
        } else {
            Self::Text(field.to_string())
        }
    }

    /// Text form of the cell as sent to the classifier.
    pub fn to_code_text(&self) -> Result<String, CoercionError> {
        match self {
            Self::Empty => Err(CoercionError::Empty),
            Self::Text(text) => Ok(text.clone()),
            Self::Int(value) => Ok(value.to_string()),
            Self::Float(value) if !value.is_finite() => Err(CoercionError::NonFinite(*value)),
            Self::Float(value) => Ok(format_float(*value)),
            Self::Bool(true) => Ok("True".to_string()),
            Self::Bool(false) => Ok("False".to_string()),
            Self::Error(code) => Err(CoercionError::ErrorValue(code.clone())),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) if value.is_finite() => f.write_str(&format_float(*value)),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => f.write_str(if *value { "True" } else { "False" }),
            Self::Error(code) => f.write_str(code),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}
