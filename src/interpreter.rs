// 🧬 Occurrence Interpreter - one raw row → one interpreted record
//
// Temporal and spatial interpretation are independent and pure, so a batch
// fans out across threads with no coordination beyond the shared memo cache.

use crate::config::InterpreterConfig;
use crate::error::Result;
use crate::issues::{InterpretationIssue, Term};
use crate::location::{LocationInterpreter, ParsedLocation};
use crate::temporal::{TemporalInterpreter, TemporalValue};
use crate::terms::RawTerms;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// INTERPRETED RECORD
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpretedRecord {
    pub id: String,

    // Atomic date fields as supplied
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,

    pub event_date_from: Option<TemporalValue>,
    pub event_date_to: Option<TemporalValue>,
    pub date_identified: Option<TemporalValue>,
    pub modified: Option<TemporalValue>,

    pub location: ParsedLocation,
    pub location_success: bool,

    /// Temporal issues first, then location issues
    pub issues: Vec<InterpretationIssue>,
}

impl InterpretedRecord {
    /// SHA-256 of the serialized record; identical input gives an identical fingerprint
    pub fn fingerprint(&self) -> serde_json::Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

// ============================================================================
// OCCURRENCE INTERPRETER
// ============================================================================

pub struct OccurrenceInterpreter {
    temporal: TemporalInterpreter,
    location: LocationInterpreter,
}

impl OccurrenceInterpreter {
    pub fn new(temporal: TemporalInterpreter, location: LocationInterpreter) -> Self {
        OccurrenceInterpreter { temporal, location }
    }

    /// Default temporal settings and built-in reference tables
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(TemporalInterpreter::new(), LocationInterpreter::with_defaults()?))
    }

    pub fn from_config(config: &InterpreterConfig) -> anyhow::Result<Self> {
        let temporal = TemporalInterpreter::with_config(config.temporal.clone());
        let location = LocationInterpreter::from_config(&config.location)?;
        Ok(Self::new(temporal, location))
    }

    pub fn temporal(&self) -> &TemporalInterpreter {
        &self.temporal
    }

    pub fn interpret(&self, raw: &RawTerms) -> InterpretedRecord {
        let mut issues = Vec::new();

        let dates = self.temporal.interpret(
            raw.value_or_empty(Term::Year),
            raw.value_or_empty(Term::Month),
            raw.value_or_empty(Term::Day),
            raw.value_or_empty(Term::EventDate),
        );
        let (year, month, day) = (dates.year, dates.month, dates.day);
        let (event_date_from, event_date_to) = (dates.from_date(), dates.to_date());
        issues.extend(dates.into_issues());

        let (_, date_identified, identified_issues) = self
            .temporal
            .interpret_single(raw.value_or_empty(Term::DateIdentified), Term::DateIdentified)
            .into_parts();
        issues.extend(identified_issues);

        let (_, modified, modified_issues) = self
            .temporal
            .interpret_single(raw.value_or_empty(Term::Modified), Term::Modified)
            .into_parts();
        issues.extend(modified_issues);

        let (location_success, location, location_issues) = self
            .location
            .interpret(
                raw.value_or_empty(Term::Country),
                raw.value_or_empty(Term::CountryCode),
                raw.value_or_empty(Term::DecimalLatitude),
                raw.value_or_empty(Term::DecimalLongitude),
                raw.value_or_empty(Term::GeodeticDatum),
            )
            .into_parts();
        issues.extend(location_issues);

        InterpretedRecord {
            id: raw.id().unwrap_or_default().to_string(),
            year,
            month,
            day,
            event_date_from,
            event_date_to,
            date_identified,
            modified,
            location: location.unwrap_or_default(),
            location_success,
            issues,
        }
    }

    /// Interpret every row in parallel; output order matches input order
    pub fn interpret_batch(&self, rows: &[RawTerms]) -> Vec<InterpretedRecord> {
        let records: Vec<InterpretedRecord> = rows.par_iter().map(|row| self.interpret(row)).collect();

        tracing::info!(
            records = records.len(),
            with_issues = records.iter().filter(|r| r.has_issues()).count(),
            "interpreted batch"
        );
        if let Some((hits, misses)) = self.temporal.cache_stats() {
            tracing::debug!(hits, misses, "temporal cache");
        }
        records
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemporalConfig;
    use crate::issues::IssueType;
    use crate::location::CoordinateTransform;

    fn create_test_interpreter() -> OccurrenceInterpreter {
        let temporal = TemporalInterpreter::with_config(TemporalConfig {
            date_order: None,
            min_year: 1600,
            max_year: 2100,
            memoize: true,
            cache_capacity: 1_000,
        });
        let location = LocationInterpreter::with_defaults().unwrap();
        OccurrenceInterpreter::new(temporal, location)
    }

    fn create_test_row(id: &str) -> RawTerms {
        RawTerms::new()
            .with("occurrenceID", id)
            .with_term(Term::Year, "1999")
            .with_term(Term::Month, "10")
            .with_term(Term::Day, "1")
            .with_term(Term::EventDate, "2010/2011")
            .with_term(Term::CountryCode, "AU")
            .with_term(Term::Country, "Australia")
            .with_term(Term::DecimalLatitude, "33.87")
            .with_term(Term::DecimalLongitude, "151.21")
            .with_term(Term::GeodeticDatum, "WGS84")
    }

    #[test]
    fn test_interpret_full_row() {
        let record = create_test_interpreter().interpret(&create_test_row("occ-1"));

        assert_eq!(record.id, "occ-1");
        assert_eq!((record.year, record.month, record.day), (Some(1999), Some(10), Some(1)));
        assert_eq!(record.event_date_from, Some(TemporalValue::Year(2010)));
        assert_eq!(record.event_date_to, Some(TemporalValue::Year(2011)));
        assert!(record.location_success);
        assert_eq!(record.location.applied_transform, Some(CoordinateTransform::NegateLat));

        let types: Vec<IssueType> = record.issues.iter().map(|i| i.issue_type).collect();
        assert_eq!(types, vec![IssueType::PresumedNegatedLatitude]);
    }

    #[test]
    fn test_temporal_issues_come_first() {
        let row = RawTerms::new()
            .with_term(Term::EventDate, "2/3/2008")
            .with_term(Term::DateIdentified, "1200")
            .with_term(Term::Country, "Atlantis");
        let record = create_test_interpreter().interpret(&row);

        let types: Vec<IssueType> = record.issues.iter().map(|i| i.issue_type).collect();
        assert_eq!(
            types,
            vec![
                IssueType::RecordedDateInvalid,
                IssueType::IdentifiedDateUnlikely,
                IssueType::CountryInvalid,
            ]
        );
        assert_eq!(record.date_identified, Some(TemporalValue::Year(1200)));
        assert!(!record.location_success);
    }

    #[test]
    fn test_empty_row() {
        let record = create_test_interpreter().interpret(&RawTerms::new());

        assert_eq!(record.id, "");
        assert!(record.issues.is_empty());
        assert_eq!(record.event_date_from, None);
        assert_eq!(record.location, ParsedLocation::default());
    }

    #[test]
    fn test_batch_preserves_order() {
        let interpreter = create_test_interpreter();
        let rows: Vec<RawTerms> = (0..200).map(|i| create_test_row(&format!("occ-{}", i))).collect();

        let records = interpreter.interpret_batch(&rows);

        assert_eq!(records.len(), 200);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.id, format!("occ-{}", i));
        }
    }

    #[test]
    fn test_reinterpretation_is_bit_identical() {
        let interpreter = create_test_interpreter();
        let row = create_test_row("occ-1");

        let first = interpreter.interpret(&row);
        let second = interpreter.interpret(&row);
        let fresh = create_test_interpreter().interpret(&row);

        assert_eq!(first, second);
        assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());
        assert_eq!(first.fingerprint().unwrap(), fresh.fingerprint().unwrap());
        assert_eq!(first.fingerprint().unwrap().len(), 64);
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let record = create_test_interpreter().interpret(&create_test_row("occ-1"));
        let json = serde_json::to_string(&record).unwrap();
        let back: InterpretedRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, record.id);
        assert_eq!(back.event_date_from, record.event_date_from);
        assert_eq!(back.location.country, record.location.country);
        assert_eq!(back.location.applied_transform, record.location.applied_transform);
        assert_eq!(back.issues, record.issues);
        assert!(json.contains("\"event_date_from\":\"2010\""));
        assert!(json.contains("PRESUMED_NEGATED_LATITUDE"));
    }

    #[test]
    fn test_negative_year_record_reads_back() {
        let row = RawTerms::new()
            .with("occurrenceID", "occ-bc")
            .with_term(Term::Year, "-5")
            .with_term(Term::Month, "3");
        let record = create_test_interpreter().interpret(&row);
        assert_eq!(record.event_date_from, Some(TemporalValue::YearMonth(-5, 3)));

        let json = serde_json::to_string(&record).unwrap();
        let back: InterpretedRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back, record);
        assert!(json.contains("\"event_date_from\":\"-0005-03\""));
    }
}
