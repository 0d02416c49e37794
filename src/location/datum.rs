// 🧭 Datum reprojection - shift coordinates to WGS84
//
// Abridged Molodensky transform with per-datum mean shifts. Good to a few
// metres, which is far below the precision of most occurrence coordinates.

use crate::issues::{InterpretationIssue, IssueType, ParsedField, Term};
use crate::location::coordinates::LatLng;

const COORDINATE_AND_DATUM: [Term; 3] = [Term::DecimalLatitude, Term::DecimalLongitude, Term::GeodeticDatum];

/// Reprojects a coordinate declared in some datum. The original point is kept on failure.
pub trait DatumReprojector: Send + Sync {
    fn reproject(&self, point: LatLng, datum: &str) -> ParsedField<LatLng>;
}

// ============================================================================
// ELLIPSOIDS & DATUMS
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    a: f64,
    f: f64,
}

const WGS84_ELLIPSOID: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    f: 1.0 / 298.257_223_563,
};

const CLARKE_1866: Ellipsoid = Ellipsoid {
    a: 6_378_206.4,
    f: 1.0 / 294.978_698_2,
};

const INTERNATIONAL_1924: Ellipsoid = Ellipsoid {
    a: 6_378_388.0,
    f: 1.0 / 297.0,
};

const AUSTRALIAN_NATIONAL: Ellipsoid = Ellipsoid {
    a: 6_378_160.0,
    f: 1.0 / 298.25,
};

const AIRY_1830: Ellipsoid = Ellipsoid {
    a: 6_377_563.396,
    f: 1.0 / 299.324_964_6,
};

#[derive(Debug, Clone, Copy)]
struct DatumShift {
    ellipsoid: Ellipsoid,
    dx: f64,
    dy: f64,
    dz: f64,
}

#[derive(Debug, Clone, Copy)]
enum Datum {
    /// WGS84 itself, or close enough at coordinate precision
    Wgs84Equivalent,
    Shifted(DatumShift),
}

/// Normalized datum names and EPSG codes
const KNOWN_DATUMS: &[(&[&str], Datum)] = &[
    (
        &["WGS84", "WGS1984", "WORLDGEODETICSYSTEM1984", "EPSG4326", "4326"],
        Datum::Wgs84Equivalent,
    ),
    (
        &["NAD83", "NORTHAMERICANDATUM1983", "EPSG4269", "4269"],
        Datum::Wgs84Equivalent,
    ),
    (&["GDA94", "EPSG4283", "4283"], Datum::Wgs84Equivalent),
    (&["ETRS89", "EPSG4258", "4258"], Datum::Wgs84Equivalent),
    (
        &["NAD27", "NORTHAMERICANDATUM1927", "EPSG4267", "4267"],
        Datum::Shifted(DatumShift {
            ellipsoid: CLARKE_1866,
            dx: -8.0,
            dy: 160.0,
            dz: 176.0,
        }),
    ),
    (
        &["ED50", "EUROPEANDATUM1950", "EPSG4230", "4230"],
        Datum::Shifted(DatumShift {
            ellipsoid: INTERNATIONAL_1924,
            dx: -87.0,
            dy: -98.0,
            dz: -121.0,
        }),
    ),
    (
        &["AGD66", "AUSTRALIANGEODETICDATUM1966", "EPSG4202", "4202"],
        Datum::Shifted(DatumShift {
            ellipsoid: AUSTRALIAN_NATIONAL,
            dx: -133.0,
            dy: -48.0,
            dz: 148.0,
        }),
    ),
    (
        &["AGD84", "AUSTRALIANGEODETICDATUM1984", "EPSG4203", "4203"],
        Datum::Shifted(DatumShift {
            ellipsoid: AUSTRALIAN_NATIONAL,
            dx: -134.0,
            dy: -48.0,
            dz: 149.0,
        }),
    ),
    (
        &["OSGB36", "EPSG4277", "4277"],
        Datum::Shifted(DatumShift {
            ellipsoid: AIRY_1830,
            dx: 446.448,
            dy: -125.157,
            dz: 542.06,
        }),
    ),
];

fn normalize_datum(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn find_datum(raw: &str) -> Option<Datum> {
    let key = normalize_datum(raw);
    KNOWN_DATUMS
        .iter()
        .find(|(names, _)| names.contains(&key.as_str()))
        .map(|(_, datum)| *datum)
}

/// Abridged Molodensky shift of one point onto WGS84
fn molodensky(point: LatLng, shift: &DatumShift) -> LatLng {
    let Ellipsoid { a, f } = shift.ellipsoid;
    let da = WGS84_ELLIPSOID.a - a;
    let df = WGS84_ELLIPSOID.f - f;

    let phi = point.lat.to_radians();
    let lambda = point.lng.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let (sin_lambda, cos_lambda) = lambda.sin_cos();

    let e2 = 2.0 * f - f * f;
    let w = 1.0 - e2 * sin_phi * sin_phi;
    let rn = a / w.sqrt();
    let rm = a * (1.0 - e2) / w.powf(1.5);

    let d_phi = (-shift.dx * sin_phi * cos_lambda - shift.dy * sin_phi * sin_lambda
        + shift.dz * cos_phi
        + (a * df + f * da) * (2.0 * phi).sin())
        / rm;
    let d_lambda = (-shift.dx * sin_lambda + shift.dy * cos_lambda) / (rn * cos_phi);

    LatLng::new((phi + d_phi).to_degrees(), wrap_longitude((lambda + d_lambda).to_degrees()))
}

/// Fold a longitude back into [-180, 180]
fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        return lng;
    }
    let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lng > 0.0 {
        180.0
    } else {
        wrapped
    }
}

// ============================================================================
// WGS84 REPROJECTOR
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84Reprojector;

impl Wgs84Reprojector {
    pub fn new() -> Self {
        Wgs84Reprojector
    }
}

impl DatumReprojector for Wgs84Reprojector {
    fn reproject(&self, point: LatLng, datum: &str) -> ParsedField<LatLng> {
        let issue = |issue_type| InterpretationIssue::new(issue_type, &COORDINATE_AND_DATUM);

        if datum.trim().is_empty() {
            return ParsedField::success(point, vec![issue(IssueType::GeodeticDatumAssumedWgs84)]);
        }

        match find_datum(datum) {
            None => {
                tracing::debug!(datum, "unknown geodetic datum");
                ParsedField::success(point, vec![issue(IssueType::GeodeticDatumInvalid)])
            }
            Some(Datum::Wgs84Equivalent) => ParsedField::success(point, Vec::new()),
            Some(Datum::Shifted(shift)) => {
                let projected = molodensky(point, &shift);
                if projected.in_range() {
                    tracing::debug!(datum, ?point, ?projected, "coordinate reprojected");
                    ParsedField::success(projected, vec![issue(IssueType::CoordinateReprojected)])
                } else {
                    tracing::debug!(datum, ?point, "reprojection failed");
                    ParsedField::fail(point, vec![issue(IssueType::CoordinateReprojectionFailed)])
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
