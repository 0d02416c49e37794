// 🔄 Coordinate transforms - the fixed fallback catalogue
//
// Tried in catalogue order when a coordinate does not fall in its declared
// country. The first transform whose output matches wins.

use crate::issues::IssueType;
use crate::location::coordinates::LatLng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoordinateTransform {
    Identity,
    NegateLat,
    NegateLng,
    NegateBoth,
    SwapLatLng,
}

impl CoordinateTransform {
    /// Evaluation order, identity first
    pub const CATALOGUE: [CoordinateTransform; 5] = [
        CoordinateTransform::Identity,
        CoordinateTransform::NegateLat,
        CoordinateTransform::NegateLng,
        CoordinateTransform::NegateBoth,
        CoordinateTransform::SwapLatLng,
    ];

    pub fn apply(&self, point: LatLng) -> LatLng {
        match self {
            CoordinateTransform::Identity => point,
            CoordinateTransform::NegateLat => LatLng::new(-point.lat, point.lng),
            CoordinateTransform::NegateLng => LatLng::new(point.lat, -point.lng),
            CoordinateTransform::NegateBoth => LatLng::new(-point.lat, -point.lng),
            CoordinateTransform::SwapLatLng => LatLng::new(point.lng, point.lat),
        }
    }

    /// Issues raised when this transform is the one that matched
    pub fn issues(&self) -> &'static [IssueType] {
        match self {
            CoordinateTransform::Identity => &[],
            CoordinateTransform::NegateLat => &[IssueType::PresumedNegatedLatitude],
            CoordinateTransform::NegateLng => &[IssueType::PresumedNegatedLongitude],
            CoordinateTransform::NegateBoth => &[
                IssueType::PresumedNegatedLatitude,
                IssueType::PresumedNegatedLongitude,
            ],
            CoordinateTransform::SwapLatLng => &[IssueType::PresumedSwappedCoordinate],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CoordinateTransform::Identity => "identity",
            CoordinateTransform::NegateLat => "negateLat",
            CoordinateTransform::NegateLng => "negateLng",
            CoordinateTransform::NegateBoth => "negateBoth",
            CoordinateTransform::SwapLatLng => "swapLatLng",
        }
    }

    /// First catalogue entry whose in-range output satisfies `accepts`
    pub fn first_match<F>(point: LatLng, mut accepts: F) -> Option<CoordinateTransform>
    where
        F: FnMut(LatLng) -> bool,
    {
        Self::CATALOGUE.iter().copied().find(|transform| {
            let candidate = transform.apply(point);
            candidate.in_range() && accepts(candidate)
        })
    }
}

impl fmt::Display for CoordinateTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TESTS
// ============================================================================
