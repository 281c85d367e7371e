//! Tagged cell values
//!
//! Survey extracts mix numeric codes, free text and blanks in the same
//! column, and later stages add a "not applicable" marker. Each cell carries
//! its own tag so numeric routines never have to guess what a string means.

use std::fmt;

/// A single value in a survey dataset
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    /// Value should exist but was not captured
    #[default]
    Missing,
    /// Question does not apply to this respondent
    NotApplicable,
    /// Numeric measure or integer code
    Number(f64),
    /// Free text or a recoded category label
    Text(String),
}

impl Cell {
    /// Parse a raw CSV field.
    ///
    /// Blank and whitespace-only fields are missing, anything that parses as
    /// a finite number is numeric, everything else is kept verbatim as text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        match parse_number(trimmed) {
            Some(value) => Self::Number(value),
            None => Self::Text(raw.to_string()),
        }
    }

    /// Create a text cell
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Numeric value, if this cell holds one
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer code, if this cell holds a whole number
    #[must_use]
    pub fn as_code(&self) -> Option<i64> {
        match self {
            Self::Number(value) if value.fract() == 0.0 && value.is_finite() => {
                Some(*value as i64)
            }
            _ => None,
        }
    }

    /// Text value, if this cell holds one
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Coerce to a number the way a numeric cast would: numbers pass through,
    /// parseable text is converted, everything else yields `None`.
    #[must_use]
    pub fn coerce_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(value) => parse_number(value.trim()),
            Self::Missing | Self::NotApplicable => None,
        }
    }

    /// Category key used for grouping: labels as-is, codes without a
    /// fractional part, nothing for missing or not-applicable cells.
    #[must_use]
    pub fn category_key(&self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value.clone()),
            Self::Number(_) => Some(self.to_string()),
            Self::Missing | Self::NotApplicable => None,
        }
    }

    /// Whether the cell is missing
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Whether the cell is marked not applicable
    #[must_use]
    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Self::NotApplicable)
    }

    /// Whether the cell is text made only of whitespace
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text(value) if value.trim().is_empty())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::NotApplicable => write!(f, "No Aplica"),
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Self::Missing
        } else {
            Self::Number(value)
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}
