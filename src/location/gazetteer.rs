// 🗺️ Point → country lookup over country bounding boxes
//
// Boxes overlap near borders, so a point can sit in several countries.
// Membership checks use every containing box. A single answer (for deriving
// a missing country) comes from the smallest box, which gets small
// countries right inside their neighbours' boxes.

use crate::error::{Error, Result};
use crate::location::coordinates::LatLng;
use crate::location::country::{Country, CountryVocabulary};
use anyhow::Context;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

const BUILTIN_BOUNDS: &str = include_str!("../../data/country_bounds.csv");

/// Which countries contain a point
pub trait PointCountryMatcher: Send + Sync {
    /// Best single country for the point, if any
    fn country_at(&self, point: LatLng) -> Option<Country>;

    /// Every candidate country for the point, best first
    fn countries_at(&self, point: LatLng) -> Vec<Country> {
        self.country_at(point).into_iter().collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct BoundsRow {
    iso2: String,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

#[derive(Debug, Clone)]
struct BoundingBox {
    country: Country,
    min_lat: f64,
    max_lat: f64,
    min_lng: f64,
    max_lng: f64,
}

impl BoundingBox {
    fn contains(&self, point: LatLng) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lng..=self.max_lng).contains(&point.lng)
    }

    fn area(&self) -> f64 {
        (self.max_lat - self.min_lat) * (self.max_lng - self.min_lng)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoundingBoxGazetteer {
    boxes: Vec<BoundingBox>,
}

impl BoundingBoxGazetteer {
    pub fn builtin(vocabulary: &CountryVocabulary) -> Result<Self> {
        Self::from_reader(BUILTIN_BOUNDS.as_bytes(), vocabulary)
    }

    pub fn from_path(path: &Path, vocabulary: &CountryVocabulary) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open bounds table: {:?}", path))?;
        let gazetteer = Self::from_reader(file, vocabulary)
            .with_context(|| format!("Failed to load bounds table: {:?}", path))?;
        tracing::info!(boxes = gazetteer.len(), file = ?path, "loaded country bounds");
        Ok(gazetteer)
    }

    /// CSV with header `iso2,min_lat,max_lat,min_lng,max_lng`. A country may have several rows.
    pub fn from_reader<R: Read>(reader: R, vocabulary: &CountryVocabulary) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut gazetteer = BoundingBoxGazetteer::default();

        for result in rdr.deserialize::<BoundsRow>() {
            let row = result?;
            let Some(country) = vocabulary.find(&row.iso2) else {
                tracing::warn!(iso2 = %row.iso2, "skipping bounds for unknown country");
                continue;
            };
            if row.min_lat > row.max_lat || row.min_lng > row.max_lng {
                tracing::warn!(iso2 = %row.iso2, "skipping inverted bounding box");
                continue;
            }
            gazetteer.boxes.push(BoundingBox {
                country: country.clone(),
                min_lat: row.min_lat,
                max_lat: row.max_lat,
                min_lng: row.min_lng,
                max_lng: row.max_lng,
            });
        }

        if gazetteer.is_empty() {
            return Err(Error::ReferenceData("bounds table has no usable rows".to_string()));
        }
        Ok(gazetteer)
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl PointCountryMatcher for BoundingBoxGazetteer {
    fn country_at(&self, point: LatLng) -> Option<Country> {
        self.boxes
            .iter()
            .filter(|b| b.contains(point))
            .min_by(|a, b| a.area().total_cmp(&b.area()))
            .map(|b| b.country.clone())
    }

    fn countries_at(&self, point: LatLng) -> Vec<Country> {
        let mut containing: Vec<&BoundingBox> = self.boxes.iter().filter(|b| b.contains(point)).collect();
        containing.sort_by(|a, b| a.area().total_cmp(&b.area()));

        let mut countries: Vec<Country> = Vec::with_capacity(containing.len());
        for bounds in containing {
            if !countries.contains(&bounds.country) {
                countries.push(bounds.country.clone());
            }
        }
        countries
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_gazetteer() -> BoundingBoxGazetteer {
        let vocabulary = CountryVocabulary::builtin().unwrap();
        BoundingBoxGazetteer::builtin(&vocabulary).unwrap()
    }

    fn iso2_at(gazetteer: &BoundingBoxGazetteer, lat: f64, lng: f64) -> Option<String> {
        gazetteer.country_at(LatLng::new(lat, lng)).map(|c| c.iso2)
    }

    #[test]
    fn test_capitals() {
        let gazetteer = create_test_gazetteer();

        assert_eq!(iso2_at(&gazetteer, 52.52, 13.405).as_deref(), Some("DE"));
        assert_eq!(iso2_at(&gazetteer, 48.857, 2.352).as_deref(), Some("FR"));
        assert_eq!(iso2_at(&gazetteer, -33.87, 151.21).as_deref(), Some("AU"));
    }

    #[test]
    fn test_smallest_box_wins() {
        let gazetteer = create_test_gazetteer();

        // Luxembourg sits inside the French box
        assert_eq!(iso2_at(&gazetteer, 49.61, 6.13).as_deref(), Some("LU"));
    }

    #[test]
    fn test_overlapping_boxes_all_listed() {
        let gazetteer = create_test_gazetteer();
        let iso2s = |lat, lng| -> Vec<String> {
            gazetteer
                .countries_at(LatLng::new(lat, lng))
                .into_iter()
                .map(|c| c.iso2)
                .collect()
        };

        // Munich lies in both the Austrian and the German box
        let munich = iso2s(48.14, 11.58);
        assert_eq!(munich.first().map(String::as_str), Some("AT"));
        assert!(munich.contains(&"DE".to_string()));

        // Cologne and Dresden
        assert!(iso2s(50.94, 6.96).contains(&"DE".to_string()));
        assert!(iso2s(51.05, 13.74).contains(&"DE".to_string()));

        assert!(iso2s(-30.0, -20.0).is_empty());
    }

    #[test]
    fn test_open_ocean_has_no_country() {
        let gazetteer = create_test_gazetteer();
        assert_eq!(iso2_at(&gazetteer, -30.0, -20.0), None);
    }

    #[test]
    fn test_multiple_boxes_per_country() {
        let gazetteer = create_test_gazetteer();

        // Hawaii
        assert_eq!(iso2_at(&gazetteer, 21.3, -157.8).as_deref(), Some("US"));
        // Canary Islands
        assert_eq!(iso2_at(&gazetteer, 28.1, -15.4).as_deref(), Some("ES"));
    }

    #[test]
    fn test_unknown_codes_skipped() {
        let vocabulary = CountryVocabulary::builtin().unwrap();
        let csv = "iso2,min_lat,max_lat,min_lng,max_lng\nXX,0,1,0,1\nDE,47.27,55.06,5.87,15.04\n";
        let gazetteer = BoundingBoxGazetteer::from_reader(csv.as_bytes(), &vocabulary).unwrap();

        assert_eq!(gazetteer.len(), 1);
    }
}
