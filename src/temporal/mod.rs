// 📅 Temporal Interpreter - atomic year/month/day vs free-text event dates
//
// Flow per record:
// 1. Read the atomic fields into a base accumulator (atomic outputs come from here)
// 2. Split the free text into from/to endpoints
// 3. Parse "from" unseeded, "to" seeded with from's finest field
// 4. Complete the endpoints (merge_replace / merge_absent)
// 5. Convert both endpoints, collecting every issue on the way

pub mod accumulator;
pub mod converter;
pub mod delimiter;
pub mod parser;

pub use accumulator::{ChronoAccumulator, ChronoField, Component};
pub use converter::{ConversionContext, Granularity, TemporalValue};
pub use parser::DateOrder;

use crate::config::TemporalConfig;
use crate::issues::{InterpretationIssue, IssueLedger, IssueType, ParsedField, Term};
use crate::memo::Memoizer;
use serde::{Deserialize, Serialize};

type TemporalKey = (String, String, String, String);

const EPOCH_YEAR: i32 = 1970;

// ============================================================================
// PARSED TEMPORAL DATES
// ============================================================================

/// Atomic fields plus the event-date range.
///
/// `to_date` is only ever present together with `from_date`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTemporalDates {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    from_date: Option<TemporalValue>,
    to_date: Option<TemporalValue>,
    issues: Vec<InterpretationIssue>,
}

impl ParsedTemporalDates {
    pub fn from_date(&self) -> Option<TemporalValue> {
        self.from_date
    }

    pub fn to_date(&self) -> Option<TemporalValue> {
        self.to_date
    }

    pub fn issues(&self) -> &[InterpretationIssue] {
        &self.issues
    }

    pub fn has_issue(&self, issue_type: IssueType) -> bool {
        self.issues.iter().any(|i| i.issue_type == issue_type)
    }

    pub fn into_issues(self) -> Vec<InterpretationIssue> {
        self.issues
    }

    fn set_range(
        &mut self,
        from: Option<TemporalValue>,
        to: Option<TemporalValue>,
        ledger: &mut IssueLedger,
    ) {
        if from.is_none() && to.is_some() {
            tracing::debug!("range end without a start, dropped");
            ledger.push(IssueType::RecordedDateInvalid, &[Term::EventDate]);
            self.from_date = None;
            self.to_date = None;
            return;
        }
        self.from_date = from;
        self.to_date = to;
    }
}

/// Drop repeated issues, first occurrence wins
fn dedup_issues(issues: Vec<InterpretationIssue>) -> Vec<InterpretationIssue> {
    let mut unique: Vec<InterpretationIssue> = Vec::with_capacity(issues.len());
    for issue in issues {
        if !unique.contains(&issue) {
            unique.push(issue);
        }
    }
    unique
}

// ============================================================================
// TEMPORAL INTERPRETER
// ============================================================================

#[derive(Debug)]
pub struct TemporalInterpreter {
    config: TemporalConfig,
    memo: Option<Memoizer<TemporalKey, ParsedTemporalDates>>,
}

impl TemporalInterpreter {
    pub fn new() -> Self {
        Self::with_config(TemporalConfig::default())
    }

    pub fn with_config(config: TemporalConfig) -> Self {
        let memo = config
            .memoize
            .then(|| Memoizer::new(config.cache_capacity));
        TemporalInterpreter { config, memo }
    }

    pub fn config(&self) -> &TemporalConfig {
        &self.config
    }

    /// (hits, misses) of the memo cache, if enabled
    pub fn cache_stats(&self) -> Option<(u64, u64)> {
        self.memo.as_ref().map(|memo| memo.stats())
    }

    /// Reconcile atomic year/month/day with the free-text event date
    pub fn interpret(
        &self,
        raw_year: &str,
        raw_month: &str,
        raw_day: &str,
        raw_event_date: &str,
    ) -> ParsedTemporalDates {
        match &self.memo {
            Some(memo) => {
                let key = (
                    raw_year.to_string(),
                    raw_month.to_string(),
                    raw_day.to_string(),
                    raw_event_date.to_string(),
                );
                memo.get_or_insert_with(key, || {
                    self.compute(raw_year, raw_month, raw_day, raw_event_date)
                })
            }
            None => self.compute(raw_year, raw_month, raw_day, raw_event_date),
        }
    }

    fn compute(
        &self,
        raw_year: &str,
        raw_month: &str,
        raw_day: &str,
        raw_event_date: &str,
    ) -> ParsedTemporalDates {
        let text = raw_event_date.trim();
        if raw_year.trim().is_empty() && text.is_empty() {
            return ParsedTemporalDates::default();
        }

        let mut ledger = IssueLedger::new();
        let mut dates = ParsedTemporalDates::default();

        // Atomic reading
        let (base, unreadable) = parser::parse_atomic(raw_year, raw_month, raw_day);
        for term in unreadable {
            ledger.push(IssueType::RecordedDateInvalid, &[term]);
        }
        let atomic = ConversionContext::atomic(self.config.min_year, self.config.max_year);
        dates.year = converter::year(&base, &atomic, &mut ledger);
        dates.month = converter::month(&base, &atomic, &mut ledger);
        dates.day = converter::day(&base, &atomic, &mut ledger);

        if text.is_empty() {
            let base_value = converter::to_temporal(&base, &atomic, &mut ledger);
            dates.set_range(base_value, None, &mut ledger);
            dates.issues = dedup_issues(ledger.into_issues());
            return dates;
        }

        // Problems in the atomic fields stand even when the text supplies the date
        if base.is_set(ChronoField::Year) {
            let _ = converter::to_temporal(&base, &atomic, &mut ledger);
        }

        // Free-text range
        let (raw_from, raw_to) = delimiter::split_period(text);
        let order = self.config.date_order;
        let from = parser::parse_endpoint(&raw_from, None, order);
        let to = if raw_to.is_empty() {
            ChronoAccumulator::default()
        } else {
            parser::parse_endpoint(&raw_to, from.last_parsed(), order)
        };

        if !raw_from.is_empty() && !raw_to.is_empty() && from.is_ambiguous() && to.is_ambiguous() {
            tracing::debug!(from = %raw_from, to = %raw_to, "both range endpoints ambiguous");
            ledger.push(IssueType::RecordedDateInvalid, &[Term::EventDate]);
        }

        let (from, to) = if to.last_parsed().is_none() {
            (from.merge_replace(&base), to)
        } else {
            let to = to.merge_absent(&from);
            (from, to)
        };

        let ctx = ConversionContext::text(Term::EventDate, self.config.min_year, self.config.max_year);
        let from_date = converter::to_temporal(&from, &ctx, &mut ledger);
        let to_date = converter::to_temporal(&to, &ctx, &mut ledger);
        dates.set_range(from_date, to_date, &mut ledger);

        dates.issues = dedup_issues(ledger.into_issues());
        dates
    }

    /// Parse one stand-alone date term such as dateIdentified or modified
    pub fn interpret_single(&self, raw: &str, term: Term) -> ParsedField<TemporalValue> {
        let raw = raw.trim();
        if raw.is_empty() {
            return ParsedField::fail_with(Vec::new());
        }

        // Record modification dates start at the Unix epoch
        let min_year = match term {
            Term::Modified => self.config.min_year.max(EPOCH_YEAR),
            _ => self.config.min_year,
        };
        let ctx = ConversionContext::text(term, min_year, self.config.max_year);

        let mut ledger = IssueLedger::new();
        let acc = parser::parse_endpoint(raw, None, self.config.date_order);
        let value = converter::to_temporal(&acc, &ctx, &mut ledger);
        let issues = dedup_issues(ledger.into_issues());

        match value {
            Some(value) => ParsedField::success(value, issues),
            None => ParsedField::fail_with(issues),
        }
    }
}

impl Default for TemporalInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn create_test_config() -> TemporalConfig {
        TemporalConfig {
            date_order: None,
            min_year: 1600,
            max_year: 2100,
            memoize: false,
            cache_capacity: 0,
        }
    }

    fn create_test_interpreter() -> TemporalInterpreter {
        TemporalInterpreter::with_config(create_test_config())
    }

    fn date(y: i32, m: u32, d: u32) -> TemporalValue {
        TemporalValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn date_time(text: &str) -> TemporalValue {
        TemporalValue::DateTime(NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").unwrap())
    }

    #[test]
    fn test_empty_input_is_empty_result() {
        let interpreter = create_test_interpreter();
        let dates = interpreter.interpret("", "", "", "");

        assert_eq!(dates, ParsedTemporalDates::default());
        assert!(dates.issues().is_empty());

        // Month and day alone do not start an interpretation
        let dates = interpreter.interpret("", "5", "3", "  ");
        assert_eq!(dates, ParsedTemporalDates::default());
    }

    #[test]
    fn test_atomic_only() {
        let dates = create_test_interpreter().interpret("1999", "10", "1", "");

        assert_eq!((dates.year, dates.month, dates.day), (Some(1999), Some(10), Some(1)));
        assert_eq!(dates.from_date(), Some(date(1999, 10, 1)));
        assert_eq!(dates.to_date(), None);
        assert!(dates.issues().is_empty());
    }

    #[test]
    fn test_year_range_keeps_atomic_fields() {
        let dates = create_test_interpreter().interpret("1999", "10", "1", "2010/2011");

        assert_eq!(dates.from_date(), Some(TemporalValue::Year(2010)));
        assert_eq!(dates.to_date(), Some(TemporalValue::Year(2011)));
        assert_eq!((dates.year, dates.month, dates.day), (Some(1999), Some(10), Some(1)));
        assert!(dates.issues().is_empty());
    }

    #[test]
    fn test_year_month_range() {
        let dates = create_test_interpreter().interpret("", "", "", "1999-04/2010-05");

        assert_eq!(dates.from_date(), Some(TemporalValue::YearMonth(1999, 4)));
        assert_eq!(dates.to_date(), Some(TemporalValue::YearMonth(2010, 5)));
    }

    #[test]
    fn test_time_only_end_inherits_date() {
        let dates = create_test_interpreter().interpret("", "", "", "1999-04-17T12:26Z/12:52:17Z");

        assert_eq!(dates.from_date(), Some(date_time("1999-04-17T12:26:00")));
        assert_eq!(dates.to_date(), Some(date_time("1999-04-17T12:52:17")));
        assert!(dates.issues().is_empty());
    }

    #[test]
    fn test_compact_end_token_inherits_from_start() {
        let interpreter = create_test_interpreter();

        let dates = interpreter.interpret("", "", "", "2004-2-1 & 3-2");
        assert_eq!(dates.from_date(), Some(date(2004, 2, 1)));
        assert_eq!(dates.to_date(), Some(date(2004, 3, 2)));

        let dates = interpreter.interpret("", "", "", "2004-02-01 to 05");
        assert_eq!(dates.to_date(), Some(date(2004, 2, 5)));
    }

    #[test]
    fn test_ambiguous_single_date_is_invalid() {
        let dates = create_test_interpreter().interpret("", "", "", "2/3/2008");

        assert!(dates.has_issue(IssueType::RecordedDateInvalid));
        assert_eq!(dates.from_date(), Some(TemporalValue::Year(2008)));
        assert!(dates.issues().iter().all(|i| i.refers_to(Term::EventDate)));
    }

    #[test]
    fn test_configured_order_resolves_ambiguity() {
        let mut config = create_test_config();
        config.date_order = Some(DateOrder::Mdy);
        let dates = TemporalInterpreter::with_config(config).interpret("", "", "", "2/3/2008");

        assert_eq!(dates.from_date(), Some(date(2008, 2, 3)));
        assert!(dates.issues().is_empty());
    }

    #[test]
    fn test_both_endpoints_ambiguous() {
        let dates = create_test_interpreter().interpret("", "", "", "2/3/2008/5/3/2008");

        assert!(dates.has_issue(IssueType::RecordedDateInvalid));
        // Same issue from several sources is reported once
        assert_eq!(dates.issues().len(), 1);
    }

    #[test]
    fn test_text_fills_only_coarser_fields_from_atomic() {
        let interpreter = create_test_interpreter();

        let dates = interpreter.interpret("1999", "10", "1", "10 March");
        assert_eq!(dates.from_date(), Some(date(1999, 3, 10)));

        let dates = interpreter.interpret("1999", "10", "1", "2010");
        assert_eq!(dates.from_date(), Some(TemporalValue::Year(2010)));
        assert_eq!(dates.to_date(), None);
    }

    #[test]
    fn test_unreadable_text_falls_back_to_atomic() {
        let dates = create_test_interpreter().interpret("1999", "10", "1", "sometime in spring");

        assert_eq!(dates.from_date(), Some(date(1999, 10, 1)));
        assert!(dates.has_issue(IssueType::RecordedDateInvalid));
    }

    #[test]
    fn test_end_without_start_is_dropped() {
        let dates = create_test_interpreter().interpret("", "", "", "spring/2011");

        assert_eq!(dates.from_date(), None);
        assert_eq!(dates.to_date(), None);
        assert!(dates.has_issue(IssueType::RecordedDateInvalid));
    }

    #[test]
    fn test_invalid_atomic_month() {
        let dates = create_test_interpreter().interpret("2009", "13", "", "");

        assert_eq!(dates.year, Some(2009));
        assert_eq!(dates.month, None);
        assert_eq!(dates.from_date(), Some(TemporalValue::Year(2009)));
        assert_eq!(
            dates.issues(),
            &[InterpretationIssue::new(IssueType::RecordedDateInvalid, &[Term::Month])]
        );
    }

    #[test]
    fn test_unlikely_atomic_year_reported_once() {
        let dates = create_test_interpreter().interpret("1492", "", "", "");

        assert_eq!(dates.year, Some(1492));
        assert_eq!(
            dates.issues(),
            &[InterpretationIssue::new(IssueType::RecordedDateUnlikely, &[Term::Year])]
        );
    }

    #[test]
    fn test_interpret_single() {
        let interpreter = create_test_interpreter();

        let identified = interpreter.interpret_single("2008-02-03", Term::DateIdentified);
        assert!(identified.is_successful());
        assert_eq!(identified.result(), Some(&date(2008, 2, 3)));

        let modified = interpreter.interpret_single("1200-01-01", Term::Modified);
        assert!(modified.has_issue(IssueType::ModifiedDateUnlikely));
        assert!(modified.issues()[0].refers_to(Term::Modified));

        let empty = interpreter.interpret_single(" ", Term::Modified);
        assert!(!empty.is_successful());
        assert!(empty.issues().is_empty());
    }

    #[test]
    fn test_single_term_bounds_and_issue_types() {
        let interpreter = create_test_interpreter();

        // Modification dates before the epoch are unlikely, identification dates are not
        let modified = interpreter.interpret_single("1969-12-31", Term::Modified);
        assert!(modified.is_successful());
        assert!(modified.has_issue(IssueType::ModifiedDateUnlikely));
        let identified = interpreter.interpret_single("1969-12-31", Term::DateIdentified);
        assert!(identified.issues().is_empty());
        assert!(interpreter.interpret_single("1970-01-01", Term::Modified).issues().is_empty());

        let modified = interpreter.interpret_single("last tuesday", Term::Modified);
        assert!(!modified.is_successful());
        assert_eq!(
            modified.issues(),
            &[InterpretationIssue::new(IssueType::ModifiedDateInvalid, &[Term::Modified])]
        );

        let identified = interpreter.interpret_single("2008-02-30", Term::DateIdentified);
        assert_eq!(identified.result(), Some(&TemporalValue::YearMonth(2008, 2)));
        assert!(identified.has_issue(IssueType::IdentifiedDateInvalid));
        assert!(!identified.has_issue(IssueType::RecordedDateInvalid));
    }

    #[test]
    fn test_atomic_issues_kept_when_text_present() {
        let dates = create_test_interpreter().interpret("1999", "", "5", "2010-06-01");

        assert_eq!(dates.from_date(), Some(date(2010, 6, 1)));
        assert_eq!(
            dates.issues(),
            &[InterpretationIssue::new(IssueType::RecordedDateInvalid, &[Term::Day])]
        );
    }

    #[test]
    fn test_oversized_year_is_invalid_not_wrapped() {
        let dates = create_test_interpreter().interpret("", "", "", "3000000000");

        assert_eq!(dates.from_date(), None);
        assert!(dates.has_issue(IssueType::RecordedDateInvalid));
        assert!(!dates.has_issue(IssueType::RecordedDateUnlikely));
    }

    #[test]
    fn test_negative_atomic_year_survives_serialization() {
        let dates = create_test_interpreter().interpret("-5", "3", "", "");

        assert_eq!(dates.from_date(), Some(TemporalValue::YearMonth(-5, 3)));
        assert!(dates.has_issue(IssueType::RecordedDateUnlikely));

        let json = serde_json::to_string(&dates).unwrap();
        let back: ParsedTemporalDates = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dates);
    }

    #[test]
    fn test_memoized_results_are_identical() {
        let mut config = create_test_config();
        config.memoize = true;
        config.cache_capacity = 16;
        let memoized = TemporalInterpreter::with_config(config);
        let plain = create_test_interpreter();

        let first = memoized.interpret("1999", "10", "1", "2/3/2008");
        let second = memoized.interpret("1999", "10", "1", "2/3/2008");

        assert_eq!(first, second);
        assert_eq!(first, plain.interpret("1999", "10", "1", "2/3/2008"));
        assert_eq!(memoized.cache_stats(), Some((1, 1)));
    }
}
