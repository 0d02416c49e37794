// 🧾 Issue Ledger - the result algebra shared by every interpreter
//
// An interpretation never aborts on bad data. It returns whatever it could
// determine plus an ordered list of issues, each pointing at the raw terms
// that caused it.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TERMS
// ============================================================================

const DWC_NS: &str = "http://rs.tdwg.org/dwc/terms/";
const DC_NS: &str = "http://purl.org/dc/terms/";

/// Darwin Core / Dublin Core terms read by the interpreters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Term {
    Year,
    Month,
    Day,
    EventDate,
    DateIdentified,
    Modified,
    Country,
    CountryCode,
    DecimalLatitude,
    DecimalLongitude,
    GeodeticDatum,
}

impl Term {
    pub const ALL: [Term; 11] = [
        Term::Year,
        Term::Month,
        Term::Day,
        Term::EventDate,
        Term::DateIdentified,
        Term::Modified,
        Term::Country,
        Term::CountryCode,
        Term::DecimalLatitude,
        Term::DecimalLongitude,
        Term::GeodeticDatum,
    ];

    /// Unqualified term name, e.g. "decimalLatitude"
    pub fn simple_name(&self) -> &'static str {
        match self {
            Term::Year => "year",
            Term::Month => "month",
            Term::Day => "day",
            Term::EventDate => "eventDate",
            Term::DateIdentified => "dateIdentified",
            Term::Modified => "modified",
            Term::Country => "country",
            Term::CountryCode => "countryCode",
            Term::DecimalLatitude => "decimalLatitude",
            Term::DecimalLongitude => "decimalLongitude",
            Term::GeodeticDatum => "geodeticDatum",
        }
    }

    fn namespace(&self) -> &'static str {
        match self {
            Term::Modified => DC_NS,
            _ => DWC_NS,
        }
    }

    /// Fully qualified URI form used by archives
    pub fn qualified_name(&self) -> String {
        format!("{}{}", self.namespace(), self.simple_name())
    }

    /// Resolve either the simple or the qualified name (case-insensitive for simple names)
    pub fn from_name(name: &str) -> Option<Term> {
        let name = name.trim();
        Term::ALL.iter().copied().find(|term| {
            term.simple_name().eq_ignore_ascii_case(name) || term.qualified_name() == name
        })
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.simple_name())
    }
}

// ============================================================================
// ISSUE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    // Temporal
    RecordedDateInvalid,
    RecordedDateUnlikely,
    IdentifiedDateInvalid,
    IdentifiedDateUnlikely,
    ModifiedDateInvalid,
    ModifiedDateUnlikely,

    // Country
    CountryInvalid,
    CountryCodeInvalid,
    CountryMismatch,
    CountryDerivedFromCoordinates,
    CountryCoordinateMismatch,

    // Coordinates
    CoordinateInvalid,
    CoordinateOutOfRange,
    ZeroCoordinate,
    PresumedNegatedLatitude,
    PresumedNegatedLongitude,
    PresumedSwappedCoordinate,

    // Datum
    GeodeticDatumAssumedWgs84,
    GeodeticDatumInvalid,
    CoordinateReprojected,
    CoordinateReprojectionFailed,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::RecordedDateInvalid => "RECORDED_DATE_INVALID",
            IssueType::RecordedDateUnlikely => "RECORDED_DATE_UNLIKELY",
            IssueType::IdentifiedDateInvalid => "IDENTIFIED_DATE_INVALID",
            IssueType::IdentifiedDateUnlikely => "IDENTIFIED_DATE_UNLIKELY",
            IssueType::ModifiedDateInvalid => "MODIFIED_DATE_INVALID",
            IssueType::ModifiedDateUnlikely => "MODIFIED_DATE_UNLIKELY",
            IssueType::CountryInvalid => "COUNTRY_INVALID",
            IssueType::CountryCodeInvalid => "COUNTRY_CODE_INVALID",
            IssueType::CountryMismatch => "COUNTRY_MISMATCH",
            IssueType::CountryDerivedFromCoordinates => "COUNTRY_DERIVED_FROM_COORDINATES",
            IssueType::CountryCoordinateMismatch => "COUNTRY_COORDINATE_MISMATCH",
            IssueType::CoordinateInvalid => "COORDINATE_INVALID",
            IssueType::CoordinateOutOfRange => "COORDINATE_OUT_OF_RANGE",
            IssueType::ZeroCoordinate => "ZERO_COORDINATE",
            IssueType::PresumedNegatedLatitude => "PRESUMED_NEGATED_LATITUDE",
            IssueType::PresumedNegatedLongitude => "PRESUMED_NEGATED_LONGITUDE",
            IssueType::PresumedSwappedCoordinate => "PRESUMED_SWAPPED_COORDINATE",
            IssueType::GeodeticDatumAssumedWgs84 => "GEODETIC_DATUM_ASSUMED_WGS84",
            IssueType::GeodeticDatumInvalid => "GEODETIC_DATUM_INVALID",
            IssueType::CoordinateReprojected => "COORDINATE_REPROJECTED",
            IssueType::CoordinateReprojectionFailed => "COORDINATE_REPROJECTION_FAILED",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// INTERPRETATION ISSUE
// ============================================================================

/// An issue plus the terms it refers to. Never carries raw values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterpretationIssue {
    pub issue_type: IssueType,
    pub terms: Vec<Term>,
}

impl InterpretationIssue {
    pub fn new(issue_type: IssueType, terms: &[Term]) -> Self {
        InterpretationIssue {
            issue_type,
            terms: terms.to_vec(),
        }
    }

    pub fn refers_to(&self, term: Term) -> bool {
        self.terms.contains(&term)
    }
}

// ============================================================================
// PARSED FIELD
// ============================================================================

/// Result of one interpretation step.
///
/// `success == false` does not mean `result` is empty: partial values are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedField<T> {
    success: bool,
    result: Option<T>,
    issues: Vec<InterpretationIssue>,
}

impl<T> ParsedField<T> {
    pub fn success(result: T, issues: Vec<InterpretationIssue>) -> Self {
        ParsedField {
            success: true,
            result: Some(result),
            issues,
        }
    }

    /// Failed, but with a best-effort partial value
    pub fn fail(partial: T, issues: Vec<InterpretationIssue>) -> Self {
        ParsedField {
            success: false,
            result: Some(partial),
            issues,
        }
    }

    /// Failed with nothing to show
    pub fn fail_with(issues: Vec<InterpretationIssue>) -> Self {
        ParsedField {
            success: false,
            result: None,
            issues,
        }
    }

    /// Builder: append one issue
    pub fn with_issue(mut self, issue: InterpretationIssue) -> Self {
        self.issues.push(issue);
        self
    }

    pub fn is_successful(&self) -> bool {
        self.success
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn issues(&self) -> &[InterpretationIssue] {
        &self.issues
    }

    pub fn has_issue(&self, issue_type: IssueType) -> bool {
        self.issues.iter().any(|i| i.issue_type == issue_type)
    }

    pub fn into_parts(self) -> (bool, Option<T>, Vec<InterpretationIssue>) {
        (self.success, self.result, self.issues)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ParsedField<U> {
        ParsedField {
            success: self.success,
            result: self.result.map(f),
            issues: self.issues,
        }
    }
}

// ============================================================================
// ISSUE LEDGER
// ============================================================================

/// Single-owner accumulator threaded through one interpretation call.
///
/// Issues keep the order in which sub-parses were invoked.
#[derive(Debug, Default, Clone)]
pub struct IssueLedger {
    issues: Vec<InterpretationIssue>,
}

impl IssueLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue_type: IssueType, terms: &[Term]) {
        self.issues.push(InterpretationIssue::new(issue_type, terms));
    }

    pub fn push_issue(&mut self, issue: InterpretationIssue) {
        self.issues.push(issue);
    }

    /// Append every issue of a sub-result, returning its value and success flag
    pub fn absorb<T>(&mut self, field: ParsedField<T>) -> (bool, Option<T>) {
        let (success, result, issues) = field.into_parts();
        self.issues.extend(issues);
        (success, result)
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = InterpretationIssue>) {
        self.issues.extend(issues);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn into_issues(self) -> Vec<InterpretationIssue> {
        self.issues
    }
}

// ============================================================================
// TESTS
// ============================================================================
