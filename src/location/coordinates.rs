// 📍 Coordinate parsing - raw decimal latitude/longitude text → LatLng

use crate::issues::{InterpretationIssue, IssueType, ParsedField, Term};
use serde::{Deserialize, Serialize};

pub const COORDINATE_TERMS: [Term; 2] = [Term::DecimalLatitude, Term::DecimalLongitude];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }

    pub fn in_range(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn is_zero(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }
}

/// One decimal number; a lone decimal comma is accepted
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let normalized = if !raw.contains('.') && raw.matches(',').count() == 1 {
        raw.replace(',', ".")
    } else {
        raw.to_string()
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse and range-check a latitude/longitude pair.
///
/// Both absent is a plain failure without issues: there was nothing to read.
pub fn parse_lat_lng(raw_lat: &str, raw_lng: &str) -> ParsedField<LatLng> {
    let (raw_lat, raw_lng) = (raw_lat.trim(), raw_lng.trim());
    if raw_lat.is_empty() && raw_lng.is_empty() {
        return ParsedField::fail_with(Vec::new());
    }

    let (Some(lat), Some(lng)) = (parse_decimal(raw_lat), parse_decimal(raw_lng)) else {
        tracing::debug!(lat = raw_lat, lng = raw_lng, "unreadable coordinate");
        return ParsedField::fail_with(vec![InterpretationIssue::new(
            IssueType::CoordinateInvalid,
            &COORDINATE_TERMS,
        )]);
    };

    let point = LatLng::new(lat, lng);
    if !point.in_range() {
        tracing::debug!(lat, lng, "coordinate out of range");
        return ParsedField::fail_with(vec![InterpretationIssue::new(
            IssueType::CoordinateOutOfRange,
            &COORDINATE_TERMS,
        )]);
    }

    let mut issues = Vec::new();
    if point.is_zero() {
        issues.push(InterpretationIssue::new(IssueType::ZeroCoordinate, &COORDINATE_TERMS));
    }
    ParsedField::success(point, issues)
}

// ============================================================================
// TESTS
// ============================================================================
