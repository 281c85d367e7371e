//! Column schema harmonization across survey extracts.
//!
//! Extracts of the same survey drift between periods: columns move, and each
//! extract carries its own per-period expansion weight column. Harmonization
//! brings every extract onto one canonical column list before concatenation.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::models::{Cell, Column, SurveyFrame};

/// Ordered list of column names an extract is expected to have
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnSchema {
    columns: Vec<String>,
}

impl ColumnSchema {
    /// Create a schema from column names
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Schema of an existing frame
    #[must_use]
    pub fn from_frame(frame: &SurveyFrame) -> Self {
        Self::new(frame.column_names())
    }

    /// Column names in order
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether a column is part of the schema
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Compare an actual column list against this schema
    #[must_use]
    pub fn diff(&self, actual: &[String]) -> SchemaDiff {
        let expected: BTreeSet<&str> = self.columns.iter().map(String::as_str).collect();
        let found: BTreeSet<&str> = actual.iter().map(String::as_str).collect();

        let missing = expected
            .difference(&found)
            .map(|s| (*s).to_string())
            .collect::<Vec<_>>();
        let extra = found
            .difference(&expected)
            .map(|s| (*s).to_string())
            .collect::<Vec<_>>();
        let order_differs = missing.is_empty() && extra.is_empty() && self.columns != actual;

        SchemaDiff {
            missing,
            extra,
            order_differs,
        }
    }
}

/// Difference between an expected and an actual column list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaDiff {
    /// Expected columns that are absent (sorted)
    pub missing: Vec<String>,
    /// Unexpected columns that are present (sorted)
    pub extra: Vec<String>,
    /// Same set of columns in a different order
    pub order_differs: bool,
}

impl SchemaDiff {
    /// Whether the two column lists are identical
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && !self.order_differs
    }

    /// Whether the column sets agree, ignoring order
    #[must_use]
    pub fn same_set(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identical() {
            return write!(f, "no differences");
        }
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing columns [{}]", self.missing.join(", ")));
        }
        if !self.extra.is_empty() {
            parts.push(format!("extra columns [{}]", self.extra.join(", ")));
        }
        if self.order_differs {
            parts.push("column order differs".to_string());
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// How strictly extracts must match the canonical schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonizeMode {
    /// Any deviation, including column order, is an error
    Strict,
    /// Reorder columns when the sets agree; set differences are errors
    #[default]
    Lenient,
}

/// Harmonization settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonizeOptions {
    /// Strict or lenient matching
    pub mode: HarmonizeMode,
    /// Explicit canonical column list (weight columns excluded); when absent
    /// the first extract defines it
    pub canonical_schema: Option<Vec<String>>,
}

/// Canonical layout shared by every harmonized extract
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalSchema {
    /// Regular columns in order
    pub columns: ColumnSchema,
    /// Union of expansion weight columns, in first-seen order
    pub weight_columns: Vec<String>,
}

impl CanonicalSchema {
    /// Full column list: regular columns followed by weight columns
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.columns
            .columns()
            .iter()
            .chain(&self.weight_columns)
            .cloned()
            .collect()
    }
}

fn split_weight_columns(names: &[String], weight_prefix: &str) -> (Vec<String>, Vec<String>) {
    names
        .iter()
        .cloned()
        .partition(|name| !name.starts_with(weight_prefix))
}

/// Build the canonical schema for a set of extracts.
///
/// # Arguments
/// * `column_lists` - Column names of every extract, in load order
/// * `options` - Harmonization options; an explicit schema wins over the first extract
/// * `weight_prefix` - Prefix of the per-period expansion weight columns
pub fn canonical_schema_for(
    column_lists: &[Vec<String>],
    options: &HarmonizeOptions,
    weight_prefix: &str,
) -> Result<CanonicalSchema> {
    let regular = match (&options.canonical_schema, column_lists.first()) {
        (Some(explicit), _) => explicit
            .iter()
            .filter(|name| !name.starts_with(weight_prefix))
            .cloned()
            .collect(),
        (None, Some(first)) => split_weight_columns(first, weight_prefix).0,
        (None, None) => {
            return Err(SurveyError::invalid_data(
                "Cannot derive a canonical schema without extracts",
            ));
        }
    };

    let mut weight_columns: Vec<String> = Vec::new();
    for names in column_lists {
        for name in names.iter().filter(|n| n.starts_with(weight_prefix)) {
            if !weight_columns.contains(name) {
                weight_columns.push(name.clone());
            }
        }
    }

    Ok(CanonicalSchema {
        columns: ColumnSchema::new(regular),
        weight_columns,
    })
}

/// Bring a frame onto the canonical schema.
///
/// Returns a new frame with exactly the canonical columns in canonical order.
/// Weight columns the extract lacks are added as missing.
///
/// # Arguments
/// * `frame` - The extract to harmonize
/// * `file` - Name of the extract, used in errors and logs
/// * `canonical` - Target schema
/// * `mode` - Strict or lenient matching
/// * `weight_prefix` - Prefix of the per-period expansion weight columns
pub fn harmonize(
    frame: &SurveyFrame,
    file: &str,
    canonical: &CanonicalSchema,
    mode: HarmonizeMode,
    weight_prefix: &str,
) -> Result<SurveyFrame> {
    let (regular, _) = split_weight_columns(&frame.column_names(), weight_prefix);
    let diff = canonical.columns.diff(&regular);

    let acceptable = match mode {
        HarmonizeMode::Strict => diff.is_identical(),
        HarmonizeMode::Lenient => diff.same_set(),
    };
    if !acceptable {
        return Err(SurveyError::SchemaMismatch {
            file: file.to_string(),
            diff,
        });
    }
    if diff.order_differs {
        log::info!("Reordering columns of {file} to the canonical order");
    }

    let num_rows = frame.num_rows();
    let columns = canonical
        .names()
        .into_iter()
        .map(|name| match frame.column(&name) {
            Some(column) => column.clone(),
            None => Column::filled(name, &Cell::Missing, num_rows),
        })
        .collect();
    SurveyFrame::new(columns)
}

/// A struct that represents the consistency of a set of extract schemas
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaCompatibilityReport {
    /// Whether every extract matches the reference exactly
    pub compatible: bool,
    /// One issue per inconsistent extract
    pub issues: Vec<SchemaIssue>,
}

/// A schema consistency issue
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaIssue {
    /// The extract that deviates
    pub file_path: String,
    /// The reference extract being compared to
    pub reference_path: String,
    /// The differences found
    pub diff: SchemaDiff,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {}: {}", self.file_path, self.reference_path, self.diff)
    }
}

/// Compare every extract's columns against the first one without failing.
///
/// Weight columns are compared like any other column, so per-period weight
/// names show up as issues; this is an audit report, not a gate.
#[must_use]
pub fn check_consistency(extracts: &[(String, Vec<String>)]) -> SchemaCompatibilityReport {
    let Some((reference_path, reference)) = extracts.first() else {
        return SchemaCompatibilityReport {
            compatible: true,
            issues: Vec::new(),
        };
    };
    let reference_schema = ColumnSchema::new(reference.iter().cloned());

    let issues = extracts
        .iter()
        .skip(1)
        .filter_map(|(path, columns)| {
            let diff = reference_schema.diff(columns);
            (!diff.is_identical()).then(|| SchemaIssue {
                file_path: path.clone(),
                reference_path: reference_path.clone(),
                diff,
            })
        })
        .collect::<Vec<_>>();

    SchemaCompatibilityReport {
        compatible: issues.is_empty(),
        issues,
    }
}
