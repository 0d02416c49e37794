// 🔍 Deduplication Engine - cluster duplicate pairs, pick a representative
//
// Pairs come from an external similarity step. Clusters are rebuilt from the
// full pair list on every run and never updated incrementally.

use crate::error::{Error, Result};
use crate::interpreter::InterpretedRecord;
use crate::temporal::TemporalValue;
use anyhow::Context;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

// ============================================================================
// CLUSTER STRATEGY
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterStrategy {
    /// Each pair joins the first cluster holding either id. Two existing
    /// clusters linked by a later pair stay separate.
    #[default]
    FirstMatch,

    /// Union-find: every transitively linked id ends up in one cluster
    Transitive,
}

impl ClusterStrategy {
    pub fn from_name(name: &str) -> Option<ClusterStrategy> {
        match name.trim().to_ascii_lowercase().as_str() {
            "first-match" | "first_match" | "firstmatch" => Some(ClusterStrategy::FirstMatch),
            "transitive" | "union-find" => Some(ClusterStrategy::Transitive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterStrategy::FirstMatch => "first-match",
            ClusterStrategy::Transitive => "transitive",
        }
    }
}

// ============================================================================
// PAIRS & RECORDS
// ============================================================================

/// Two record ids flagged as likely duplicates. Order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterPair {
    pub id1: String,
    pub id2: String,
}

impl ClusterPair {
    pub fn new(id1: impl Into<String>, id2: impl Into<String>) -> Self {
        ClusterPair {
            id1: id1.into(),
            id2: id2.into(),
        }
    }
}

/// The interpreted fields representative selection looks at
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl ClusterRecord {
    /// Coordinates as supplied, so reprojection noise never counts as precision.
    /// Atomic date fields win; without an atomic year the event start date fills in.
    pub fn from_interpretation(record: &InterpretedRecord) -> Self {
        let lat_lng = record.location.verbatim_lat_lng.or(record.location.lat_lng);
        let (year, month, day) = match (record.year, record.event_date_from) {
            (None, Some(from)) => date_parts(from),
            _ => (record.year, record.month, record.day),
        };

        ClusterRecord {
            id: record.id.clone(),
            latitude: lat_lng.map(|p| p.lat),
            longitude: lat_lng.map(|p| p.lng),
            year,
            month,
            day,
        }
    }
}

fn date_parts(value: TemporalValue) -> (Option<i32>, Option<u32>, Option<u32>) {
    match value {
        TemporalValue::Year(y) => (Some(y), None, None),
        TemporalValue::YearMonth(y, m) => (Some(y), Some(m), None),
        TemporalValue::Date(d) => (Some(d.year()), Some(d.month()), Some(d.day())),
        TemporalValue::DateTime(dt) => (Some(dt.year()), Some(dt.month()), Some(dt.day())),
    }
}

/// One cluster with its chosen representative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// 1-based, in cluster creation order
    pub cluster_id: usize,
    pub members: Vec<String>,
    pub representative: String,
}

// ============================================================================
// PRECISION
// ============================================================================

/// Decimal digits in the canonical form of a number.
///
/// "12.0" → 0, "12.3" → 1, "12.34" → 2.
pub fn decimal_digit_count(value: f64) -> usize {
    let canonical = format!("{:?}", value);
    let mantissa = canonical.split(['e', 'E']).next().unwrap_or("");

    match mantissa.split_once('.') {
        Some((_, "0")) => 0,
        Some((_, digits)) => digits.len(),
        None => 0,
    }
}

/// max(digits(lat), digits(lng)); 0 when either is absent
pub fn coordinate_precision(record: &ClusterRecord) -> usize {
    match (record.latitude, record.longitude) {
        (Some(lat), Some(lng)) => decimal_digit_count(lat).max(decimal_digit_count(lng)),
        _ => 0,
    }
}

/// Number of year/month/day fields present
pub fn date_precision(record: &ClusterRecord) -> usize {
    [
        record.year.is_some(),
        record.month.is_some(),
        record.day.is_some(),
    ]
    .iter()
    .filter(|present| **present)
    .count()
}

/// Deepest coordinates, then fullest date, then smallest id
pub fn representative(records: &[ClusterRecord]) -> Option<&ClusterRecord> {
    let best_coordinates = records.iter().map(coordinate_precision).max()?;
    let survivors: Vec<&ClusterRecord> = records
        .iter()
        .filter(|r| coordinate_precision(r) == best_coordinates)
        .collect();

    let best_date = survivors.iter().map(|r| date_precision(r)).max()?;
    survivors
        .into_iter()
        .filter(|r| date_precision(r) == best_date)
        .min_by(|a, b| a.id.cmp(&b.id))
}

// ============================================================================
// DISJOINT SET
// ============================================================================

/// Union-find over dense indices, path halving + union by rank
#[derive(Debug, Default)]
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn add(&mut self) -> usize {
        let index = self.parent.len();
        self.parent.push(index);
        self.rank.push(0);
        index
    }

    fn find(&mut self, mut index: usize) -> usize {
        while self.parent[index] != index {
            let grandparent = self.parent[self.parent[index]];
            self.parent[index] = grandparent;
            index = grandparent;
        }
        index
    }

    fn union(&mut self, a: usize, b: usize) {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            return;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
    }
}

// ============================================================================
// DEDUPLICATION ENGINE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DeduplicationEngine {
    pub strategy: ClusterStrategy,
}

impl DeduplicationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(strategy: ClusterStrategy) -> Self {
        DeduplicationEngine { strategy }
    }

    /// Partition the ids of `pairs` into clusters, in creation order
    pub fn cluster(&self, pairs: &[ClusterPair]) -> Vec<BTreeSet<String>> {
        match self.strategy {
            ClusterStrategy::FirstMatch => cluster_first_match(pairs),
            ClusterStrategy::Transitive => cluster_transitive(pairs),
        }
    }

    /// Clusters plus the representative id of each.
    ///
    /// Every clustered id needs a record; a missing one is `Error::UnknownRecord`.
    pub fn summarize(&self, pairs: &[ClusterPair], records: &[ClusterRecord]) -> Result<Vec<ClusterSummary>> {
        let by_id: HashMap<&str, &ClusterRecord> = records.iter().map(|r| (r.id.as_str(), r)).collect();
        let clusters = self.cluster(pairs);
        let mut summaries = Vec::with_capacity(clusters.len());

        for (index, members) in clusters.into_iter().enumerate() {
            let member_records = members
                .iter()
                .map(|id| {
                    by_id
                        .get(id.as_str())
                        .map(|r| (*r).clone())
                        .ok_or_else(|| Error::UnknownRecord(id.clone()))
                })
                .collect::<Result<Vec<ClusterRecord>>>()?;

            let Some(chosen) = representative(&member_records) else {
                continue;
            };
            summaries.push(ClusterSummary {
                cluster_id: index + 1,
                representative: chosen.id.clone(),
                members: members.into_iter().collect(),
            });
        }

        tracing::info!(
            pairs = pairs.len(),
            clusters = summaries.len(),
            strategy = self.strategy.as_str(),
            "clustered duplicate candidates"
        );
        Ok(summaries)
    }
}

fn cluster_first_match(pairs: &[ClusterPair]) -> Vec<BTreeSet<String>> {
    let mut clusters: Vec<BTreeSet<String>> = Vec::new();

    for pair in pairs {
        let existing = clusters
            .iter_mut()
            .find(|c| c.contains(&pair.id1) || c.contains(&pair.id2));

        match existing {
            Some(cluster) => {
                cluster.insert(pair.id1.clone());
                cluster.insert(pair.id2.clone());
            }
            None => clusters.push(BTreeSet::from([pair.id1.clone(), pair.id2.clone()])),
        }
    }

    clusters
}

fn cluster_transitive(pairs: &[ClusterPair]) -> Vec<BTreeSet<String>> {
    let mut set = DisjointSet::default();
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    let mut ids: Vec<&str> = Vec::new();

    for pair in pairs {
        let a = intern(&pair.id1, &mut set, &mut index_of, &mut ids);
        let b = intern(&pair.id2, &mut set, &mut index_of, &mut ids);
        set.union(a, b);
    }

    // Cluster order = first appearance of any member
    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut clusters: Vec<BTreeSet<String>> = Vec::new();
    for (i, id) in ids.iter().enumerate() {
        let root = set.find(i);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            clusters.push(BTreeSet::new());
            clusters.len() - 1
        });
        clusters[slot].insert(id.to_string());
    }

    clusters
}

fn intern<'a>(
    id: &'a str,
    set: &mut DisjointSet,
    index_of: &mut HashMap<&'a str, usize>,
    ids: &mut Vec<&'a str>,
) -> usize {
    if let Some(&i) = index_of.get(id) {
        return i;
    }
    let i = set.add();
    index_of.insert(id, i);
    ids.push(id);
    i
}

// ============================================================================
// CSV LOADING
// ============================================================================

/// Load candidate pairs from a CSV with `id1,id2` columns
pub fn load_pairs(csv_path: &Path) -> anyhow::Result<Vec<ClusterPair>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open pairs file: {:?}", csv_path))?;

    let mut pairs = Vec::new();
    for (index, result) in rdr.deserialize::<ClusterPair>().enumerate() {
        let pair = result.with_context(|| format!("Failed to read pair on row {}", index + 1))?;
        pairs.push(pair);
    }

    tracing::info!(pairs = pairs.len(), file = ?csv_path, "loaded duplicate candidate pairs");
    Ok(pairs)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_record(
        id: &str,
        coordinates: Option<(f64, f64)>,
        date: (Option<i32>, Option<u32>, Option<u32>),
    ) -> ClusterRecord {
        ClusterRecord {
            id: id.to_string(),
            latitude: coordinates.map(|c| c.0),
            longitude: coordinates.map(|c| c.1),
            year: date.0,
            month: date.1,
            day: date.2,
        }
    }

    fn set(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<ClusterPair> {
        list.iter().map(|(a, b)| ClusterPair::new(*a, *b)).collect()
    }

    #[test]
    fn test_decimal_digit_count() {
        assert_eq!(decimal_digit_count(1.0), 0);
        assert_eq!(decimal_digit_count(12.3), 1);
        assert_eq!(decimal_digit_count(12.34), 2);
        assert_eq!(decimal_digit_count(-33.8688), 4);
        assert_eq!(decimal_digit_count(1.5), 1);
        assert_eq!(decimal_digit_count(0.0), 0);
    }

    #[test]
    fn test_precision_scores() {
        let full = create_test_record("A", Some((12.34, 1.0)), (Some(2001), Some(1), Some(1)));
        let bare = create_test_record("B", None, (Some(2001), None, None));

        assert_eq!(coordinate_precision(&full), 2);
        assert_eq!(coordinate_precision(&bare), 0);
        assert_eq!(date_precision(&full), 3);
        assert_eq!(date_precision(&bare), 1);
    }

    #[test]
    fn test_representative_prefers_coordinate_precision() {
        let records = vec![
            create_test_record("A", Some((12.3, 1.0)), (None, None, None)),
            create_test_record("B", Some((12.34, 1.0)), (Some(2001), Some(1), Some(1))),
        ];

        assert_eq!(representative(&records).map(|r| r.id.as_str()), Some("B"));
    }

    #[test]
    fn test_representative_then_date_precision() {
        let records = vec![
            create_test_record("A", Some((12.34, 1.0)), (Some(2001), None, None)),
            create_test_record("B", Some((12.34, 1.5)), (Some(2001), Some(1), None)),
        ];

        assert_eq!(representative(&records).map(|r| r.id.as_str()), Some("B"));
    }

    #[test]
    fn test_representative_tie_breaks_on_smallest_id() {
        let records = vec![
            create_test_record("occ-9", Some((10.5, 3.25)), (Some(2001), None, None)),
            create_test_record("occ-10", Some((10.25, 3.5)), (Some(2002), None, None)),
            create_test_record("occ-2", Some((10.25, 3.5)), (Some(2002), None, None)),
        ];

        // Lexicographic: "occ-10" < "occ-2" < "occ-9"
        assert_eq!(representative(&records).map(|r| r.id.as_str()), Some("occ-10"));
        assert!(representative(&[]).is_none());
    }

    #[test]
    fn test_chained_pairs_form_one_cluster() {
        let engine = DeduplicationEngine::new();
        let clusters = engine.cluster(&pairs(&[("A", "B"), ("B", "C")]));

        assert_eq!(clusters, vec![set(&["A", "B", "C"])]);
    }

    #[test]
    fn test_disjoint_pairs_form_two_clusters() {
        let engine = DeduplicationEngine::new();
        let clusters = engine.cluster(&pairs(&[("A", "B"), ("C", "D")]));

        assert_eq!(clusters, vec![set(&["A", "B"]), set(&["C", "D"])]);
    }

    #[test]
    fn test_first_match_does_not_bridge_clusters() {
        let links = pairs(&[("A", "B"), ("C", "D"), ("B", "C")]);

        let first_match = DeduplicationEngine::new().cluster(&links);
        assert_eq!(first_match, vec![set(&["A", "B", "C"]), set(&["C", "D"])]);

        let transitive = DeduplicationEngine::with_strategy(ClusterStrategy::Transitive).cluster(&links);
        assert_eq!(transitive, vec![set(&["A", "B", "C", "D"])]);
    }

    #[test]
    fn test_transitive_keeps_first_appearance_order() {
        let engine = DeduplicationEngine::with_strategy(ClusterStrategy::Transitive);
        let clusters = engine.cluster(&pairs(&[("X", "Y"), ("A", "B"), ("Y", "Z")]));

        assert_eq!(clusters, vec![set(&["X", "Y", "Z"]), set(&["A", "B"])]);
    }

    #[test]
    fn test_summarize() {
        let records = vec![
            create_test_record("A", Some((12.3, 1.0)), (None, None, None)),
            create_test_record("B", Some((12.34, 1.0)), (Some(2001), Some(1), Some(1))),
            create_test_record("C", None, (Some(2001), None, None)),
            create_test_record("D", None, (Some(2001), Some(5), None)),
        ];
        let summaries = DeduplicationEngine::new()
            .summarize(&pairs(&[("A", "B"), ("C", "D")]), &records)
            .unwrap();

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].cluster_id, 1);
        assert_eq!(summaries[0].members, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(summaries[0].representative, "B");
        assert_eq!(summaries[1].representative, "D");
    }

    #[test]
    fn test_summarize_unknown_record() {
        let records = vec![create_test_record("A", None, (None, None, None))];
        let result = DeduplicationEngine::new().summarize(&pairs(&[("A", "ghost")]), &records);

        assert!(matches!(result, Err(Error::UnknownRecord(id)) if id == "ghost"));
    }

    #[test]
    fn test_from_interpretation() {
        use crate::location::{LatLng, ParsedLocation};

        let mut interpreted = InterpretedRecord {
            id: "occ-1".to_string(),
            event_date_from: Some(TemporalValue::YearMonth(2001, 5)),
            location: ParsedLocation {
                lat_lng: Some(LatLng::new(1.5, 2.25)),
                ..Default::default()
            },
            ..Default::default()
        };

        let record = ClusterRecord::from_interpretation(&interpreted);
        assert_eq!(record.id, "occ-1");
        assert_eq!((record.year, record.month, record.day), (Some(2001), Some(5), None));
        assert_eq!((record.latitude, record.longitude), (Some(1.5), Some(2.25)));
        assert_eq!(coordinate_precision(&record), 2);

        // Atomic fields win once a year is present
        interpreted.year = Some(1999);
        let record = ClusterRecord::from_interpretation(&interpreted);
        assert_eq!((record.year, record.month, record.day), (Some(1999), None, None));
    }

    #[test]
    fn test_from_interpretation_prefers_verbatim_coordinates() {
        use crate::location::{LatLng, ParsedLocation};

        let interpreted = InterpretedRecord {
            id: "occ-ed50".to_string(),
            location: ParsedLocation {
                lat_lng: Some(LatLng::new(40.409_012_345_678_9, -3.701_234_567_890_1)),
                verbatim_lat_lng: Some(LatLng::new(40.41, -3.7)),
                ..Default::default()
            },
            ..Default::default()
        };

        let record = ClusterRecord::from_interpretation(&interpreted);
        assert_eq!((record.latitude, record.longitude), (Some(40.41), Some(-3.7)));
        assert_eq!(coordinate_precision(&record), 2);
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(ClusterStrategy::from_name("Transitive"), Some(ClusterStrategy::Transitive));
        assert_eq!(ClusterStrategy::from_name("first-match"), Some(ClusterStrategy::FirstMatch));
        assert_eq!(ClusterStrategy::from_name("random"), None);
        assert_eq!(ClusterStrategy::default(), ClusterStrategy::FirstMatch);
    }

    #[test]
    fn test_load_pairs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id1,id2").unwrap();
        writeln!(file, "a,b").unwrap();
        writeln!(file, "b,c").unwrap();

        let loaded = load_pairs(file.path()).unwrap();
        assert_eq!(loaded, pairs(&[("a", "b"), ("b", "c")]));
    }
}
