// 📥 Raw terms - one flat occurrence row as it arrived
//
// Absent key = unknown. An absent value is never an issue by itself.

use crate::issues::Term;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Column names accepted as the record identifier, in priority order
const ID_COLUMNS: [&str; 3] = ["id", "occurrenceID", "gbifID"];

/// Immutable raw key/value row.
///
/// Known terms are stored under their simple name whatever form the source used,
/// so `decimalLatitude` and its qualified URI resolve to the same value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTerms {
    values: BTreeMap<String, String>,
}

impl RawTerms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add one raw value
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(normalize_key(key), value.into());
        self
    }

    /// Builder: add one raw value for a known term
    pub fn with_term(self, term: Term, value: impl Into<String>) -> Self {
        self.with(term.simple_name(), value)
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
            .collect();
        RawTerms { values }
    }

    /// Trimmed value of a term; blank counts as absent
    pub fn get(&self, term: Term) -> Option<&str> {
        self.get_raw(term.simple_name())
    }

    /// Trimmed value of any column; blank counts as absent
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.values
            .get(&normalize_key(key))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Same as `get` but absent maps to ""
    pub fn value_or_empty(&self, term: Term) -> &str {
        self.get(term).unwrap_or("")
    }

    /// Record identifier, if the row carries one
    pub fn id(&self) -> Option<&str> {
        ID_COLUMNS.iter().find_map(|key| self.get_raw(key))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn normalize_key(key: &str) -> String {
    match Term::from_name(key) {
        Some(term) => term.simple_name().to_string(),
        None => key.trim().to_string(),
    }
}

// ============================================================================
// CSV LOADING
// ============================================================================

/// Load every row of a headed CSV file as RawTerms.
///
/// Rows without an identifier column get their 1-based row number as id.
pub fn load_csv(csv_path: &Path) -> Result<Vec<RawTerms>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {:?}", csv_path))?;

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let mut rows = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", index + 1))?;

        let mut terms = RawTerms::from_pairs(headers.iter().zip(record.iter()));
        if terms.id().is_none() {
            terms = terms.with("id", (index + 1).to_string());
        }
        rows.push(terms);
    }

    tracing::info!(rows = rows.len(), file = ?csv_path, "loaded raw occurrence rows");
    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================
