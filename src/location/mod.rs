// 🌐 Spatial Interpreter - country name/code + coordinates
//
// Steps:
// 1. Resolve country name and code independently (code wins)
// 2. Parse the coordinate; stop here if it is unusable
// 3. Reproject to WGS84, keeping the original on failure
// 4. Match the point against the chosen country, retrying the transform catalogue
//
// Collaborators are capability traits so tests can plug in deterministic fakes.

pub mod coordinates;
pub mod country;
pub mod datum;
pub mod gazetteer;
pub mod transform;

pub use coordinates::LatLng;
pub use country::{Country, CountryVocabulary, VocabularyLookup};
pub use datum::{DatumReprojector, Wgs84Reprojector};
pub use gazetteer::{BoundingBoxGazetteer, PointCountryMatcher};
pub use transform::CoordinateTransform;

use crate::config::LocationConfig;
use crate::error::{Error, Result};
use crate::issues::{IssueLedger, IssueType, ParsedField, Term};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// PARSED LOCATION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedLocation {
    pub country: Option<Country>,
    /// Final WGS84 point, after reprojection and any corrective transform
    pub lat_lng: Option<LatLng>,
    /// Point as supplied, before reprojection or transforms
    pub verbatim_lat_lng: Option<LatLng>,
    /// Catalogue entry that made the point fall inside the country
    pub applied_transform: Option<CoordinateTransform>,
}

// ============================================================================
// LOCATION INTERPRETER
// ============================================================================

pub struct LocationInterpreter {
    country_names: Arc<dyn VocabularyLookup>,
    country_codes: Arc<dyn VocabularyLookup>,
    reprojector: Arc<dyn DatumReprojector>,
    matcher: Arc<dyn PointCountryMatcher>,
}

impl LocationInterpreter {
    pub fn builder() -> LocationInterpreterBuilder {
        LocationInterpreterBuilder::default()
    }

    /// Built-in country table, bounding boxes and WGS84 reprojector
    pub fn with_defaults() -> Result<Self> {
        let vocabulary = CountryVocabulary::builtin()?;
        let gazetteer = BoundingBoxGazetteer::builtin(&vocabulary)?;

        Self::builder()
            .vocabulary(Arc::new(vocabulary))
            .reprojector(Arc::new(Wgs84Reprojector::new()))
            .matcher(Arc::new(gazetteer))
            .build()
    }

    /// Reference tables from config paths, built-in ones otherwise
    pub fn from_config(config: &LocationConfig) -> anyhow::Result<Self> {
        let vocabulary = match &config.countries_file {
            Some(path) => CountryVocabulary::from_path(path)?,
            None => CountryVocabulary::builtin()?,
        };
        let gazetteer = match &config.bounds_file {
            Some(path) => BoundingBoxGazetteer::from_path(path, &vocabulary)?,
            None => BoundingBoxGazetteer::builtin(&vocabulary)?,
        };

        Ok(Self::builder()
            .vocabulary(Arc::new(vocabulary))
            .reprojector(Arc::new(Wgs84Reprojector::new()))
            .matcher(Arc::new(gazetteer))
            .build()?)
    }

    pub fn interpret(
        &self,
        raw_country: &str,
        raw_country_code: &str,
        raw_lat: &str,
        raw_lng: &str,
        raw_datum: &str,
    ) -> ParsedField<ParsedLocation> {
        let mut ledger = IssueLedger::new();

        // Country: name and code are resolved independently
        let by_name = resolve_country(
            self.country_names.as_ref(),
            raw_country,
            IssueType::CountryInvalid,
            Term::Country,
            &mut ledger,
        );
        let by_code = resolve_country(
            self.country_codes.as_ref(),
            raw_country_code,
            IssueType::CountryCodeInvalid,
            Term::CountryCode,
            &mut ledger,
        );
        if by_name != by_code {
            tracing::debug!(name = raw_country, code = raw_country_code, "country mismatch");
            ledger.push(IssueType::CountryMismatch, &[Term::Country, Term::CountryCode]);
        }
        let chosen = by_code.or(by_name);

        // Coordinates
        let (parsed, point) = ledger.absorb(coordinates::parse_lat_lng(raw_lat, raw_lng));
        let Some(point) = point.filter(|_| parsed) else {
            let location = ParsedLocation {
                country: chosen,
                ..Default::default()
            };
            return ParsedField::fail(location, ledger.into_issues());
        };

        let verbatim = point;

        // A failed reprojection still hands back the original point
        let (_, projected) = ledger.absorb(self.reprojector.reproject(point, raw_datum));
        let point = projected.unwrap_or(point);

        let mut location = ParsedLocation {
            country: chosen.clone(),
            lat_lng: Some(point),
            verbatim_lat_lng: Some(verbatim),
            applied_transform: None,
        };

        let matched = match &chosen {
            Some(country) => self.match_country(country, point, &mut location, &mut ledger),
            None => {
                if let Some(derived) = self.matcher.country_at(point) {
                    tracing::debug!(country = %derived.iso2, "country derived from coordinates");
                    ledger.push(IssueType::CountryDerivedFromCoordinates, &[Term::Country]);
                    location.country = Some(derived);
                }
                false
            }
        };

        let issues = ledger.into_issues();
        if matched {
            ParsedField::success(location, issues)
        } else {
            ParsedField::fail(location, issues)
        }
    }

    fn match_country(
        &self,
        country: &Country,
        point: LatLng,
        location: &mut ParsedLocation,
        ledger: &mut IssueLedger,
    ) -> bool {
        let found = CoordinateTransform::first_match(point, |candidate| {
            self.matcher.countries_at(candidate).contains(country)
        });

        match found {
            Some(transform) => {
                if transform != CoordinateTransform::Identity {
                    tracing::debug!(%transform, country = %country.iso2, "coordinate corrected");
                }
                for issue_type in transform.issues() {
                    ledger.push(*issue_type, &coordinates::COORDINATE_TERMS);
                }
                location.lat_lng = Some(transform.apply(point));
                location.applied_transform = Some(transform);
                true
            }
            None => {
                tracing::debug!(country = %country.iso2, ?point, "coordinate outside country");
                ledger.push(
                    IssueType::CountryCoordinateMismatch,
                    &[Term::Country, Term::DecimalLatitude, Term::DecimalLongitude],
                );
                false
            }
        }
    }
}

/// Lookup one raw value. Absent raw text is unknown, not invalid.
fn resolve_country(
    lookup: &dyn VocabularyLookup,
    raw: &str,
    invalid: IssueType,
    term: Term,
    ledger: &mut IssueLedger,
) -> Option<Country> {
    if raw.trim().is_empty() {
        return None;
    }

    let (success, result, issues) = lookup.lookup(raw).into_parts();
    if !success {
        tracing::debug!(%term, raw, "country lookup failed");
        ledger.extend(issues);
        ledger.push(invalid, &[term]);
    }
    result
}

// ============================================================================
// BUILDER
// ============================================================================

#[derive(Default)]
pub struct LocationInterpreterBuilder {
    country_names: Option<Arc<dyn VocabularyLookup>>,
    country_codes: Option<Arc<dyn VocabularyLookup>>,
    reprojector: Option<Arc<dyn DatumReprojector>>,
    matcher: Option<Arc<dyn PointCountryMatcher>>,
}

impl LocationInterpreterBuilder {
    /// Same vocabulary for names and codes
    pub fn vocabulary(self, lookup: Arc<dyn VocabularyLookup>) -> Self {
        self.country_names(Arc::clone(&lookup)).country_codes(lookup)
    }

    pub fn country_names(mut self, lookup: Arc<dyn VocabularyLookup>) -> Self {
        self.country_names = Some(lookup);
        self
    }

    pub fn country_codes(mut self, lookup: Arc<dyn VocabularyLookup>) -> Self {
        self.country_codes = Some(lookup);
        self
    }

    pub fn reprojector(mut self, reprojector: Arc<dyn DatumReprojector>) -> Self {
        self.reprojector = Some(reprojector);
        self
    }

    pub fn matcher(mut self, matcher: Arc<dyn PointCountryMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn build(self) -> Result<LocationInterpreter> {
        Ok(LocationInterpreter {
            country_names: self
                .country_names
                .ok_or(Error::MissingCollaborator("country name vocabulary"))?,
            country_codes: self
                .country_codes
                .ok_or(Error::MissingCollaborator("country code vocabulary"))?,
            reprojector: self
                .reprojector
                .ok_or(Error::MissingCollaborator("datum reprojector"))?,
            matcher: self
                .matcher
                .ok_or(Error::MissingCollaborator("point-in-country matcher"))?,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
