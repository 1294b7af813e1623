//! CSV loading for iris measurements.
//!
//! Supported format:
//! - UTF-8, comma-separated, first non-blank line is the header
//! - Columns are matched by name, in any order. Names are compared after
//!   lowercasing and stripping `_`, `.`, `-` and spaces, so `sepal_length`,
//!   `SepalLength` and `sepal.length` are the same column.
//! - The label comes from the first non-empty of `species`, `class`, `variety`.
//! - Rows whose cell count differs from the header are skipped.
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::data::dataset::{Dataset, Sample};
use crate::data::species::Species;
use crate::error::{IrisError, Result};
use crate::network::spec::FEATURES;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do with a row whose feature cell is missing or not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFeatures {
    /// Discard the row.
    #[default]
    Drop,
    /// Substitute 0.0 and keep the row.
    ZeroFill,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Minimum number of well-formed rows before any validation.
    pub min_rows: usize,
    pub missing_features: MissingFeatures,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig { min_rows: 50, missing_features: MissingFeatures::Drop }
    }
}

/// Canonical (stripped) names of the four feature columns, in input order.
const FEATURE_COLUMNS: [&str; FEATURES] = ["sepallength", "sepalwidth", "petallength", "petalwidth"];

/// Label column aliases in preference order.
const LABEL_COLUMNS: [&str; 3] = ["species", "class", "variety"];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parses CSV text into a normalized [`Dataset`].
///
/// # Errors
/// - `Format` if there are fewer than two non-blank lines or no row matches
///   the header's column count
/// - `InsufficientData` if fewer than `config.min_rows` rows match, or none
///   survive feature and species validation
pub fn load(text: &str, config: &LoaderConfig) -> Result<Dataset> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() < 2 {
        return Err(IrisError::Format(format!(
            "expected a header and at least one data row, found {} non-blank line(s)",
            lines.len()
        )));
    }
    let cleaned = lines.join("\n");

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(cleaned.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IrisError::Format(format!("unreadable header: {}", e)))?
        .iter()
        .map(canonical_name)
        .collect();
    let columns = ColumnMap::resolve(&headers);

    let mut records = Vec::new();
    let mut misshapen = 0usize;
    for (row_idx, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| IrisError::Format(format!("row {}: {}", row_idx + 1, e)))?;
        if record.len() == headers.len() {
            records.push(record);
        } else {
            misshapen += 1;
        }
    }

    if records.is_empty() {
        return Err(IrisError::Format(format!(
            "no row has the header's {} columns",
            headers.len()
        )));
    }
    if misshapen > 0 {
        warn!("skipped {} row(s) with a column count different from the header", misshapen);
    }
    if records.len() < config.min_rows {
        return Err(IrisError::InsufficientData(format!(
            "{} rows found, at least {} required",
            records.len(),
            config.min_rows
        )));
    }

    let samples: Vec<Sample> = records
        .iter()
        .filter_map(|r| parse_sample(r, &columns, config.missing_features))
        .collect();

    if samples.is_empty() {
        return Err(IrisError::InsufficientData(
            "no row has valid measurements and a known species".into(),
        ));
    }

    let dropped = records.len() - samples.len();
    if dropped > 0 {
        warn!("dropped {} row(s) with invalid measurements or unknown species", dropped);
    }
    info!("loaded {} samples from {} rows", samples.len(), records.len());

    let mut dataset = Dataset::from_samples(&samples);
    dataset.raw_rows = records.len();
    dataset.dropped_rows = dropped;
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Header positions of every column we know how to read.
#[derive(Debug)]
struct ColumnMap {
    features: [Option<usize>; FEATURES],
    /// Present label columns, already in preference order.
    labels: Vec<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> ColumnMap {
        let position = |name: &str| headers.iter().position(|h| h == name);
        ColumnMap {
            features: FEATURE_COLUMNS.map(position),
            labels: LABEL_COLUMNS.iter().filter_map(|&n| position(n)).collect(),
        }
    }
}

fn canonical_name(header: &str) -> String {
    header
        .chars()
        .filter(|c| !matches!(c, '_' | '.' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Builds a sample from one record, or `None` if the row must be dropped.
fn parse_sample(record: &StringRecord, columns: &ColumnMap, policy: MissingFeatures) -> Option<Sample> {
    let mut features = [0.0; FEATURES];
    for (slot, column) in features.iter_mut().zip(columns.features.iter()) {
        let parsed = column
            .and_then(|idx| record.get(idx))
            .and_then(|cell| cell.parse::<f64>().ok());
        *slot = match (parsed, policy) {
            (Some(v), _) => v,
            (None, MissingFeatures::ZeroFill) => 0.0,
            (None, MissingFeatures::Drop) => return None,
        };
    }
    if features.iter().any(|f| !f.is_finite() || *f < 0.0) {
        return None;
    }

    let label = columns
        .labels
        .iter()
        .filter_map(|&idx| record.get(idx))
        .find(|cell| !cell.is_empty())?;
    let species = Species::from_label(label)?;

    Some(Sample { features, species })
}
