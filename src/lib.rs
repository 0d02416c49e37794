// Occurrence Interpreter - Core Library
// Exposes all modules for use in the CLI and tests

pub mod config;
pub mod data_quality;   // Issue counts per batch
pub mod deduplication;  // Duplicate clustering + representative selection
pub mod error;
pub mod interpreter;    // Record-level interpretation, parallel batches
pub mod issues;         // Issue Ledger: ParsedField, InterpretationIssue
pub mod location;       // Spatial Interpreter
pub mod memo;
pub mod temporal;       // Temporal Interpreter
pub mod terms;          // Raw rows

// Re-export commonly used types
pub use config::{ClusteringConfig, InterpreterConfig, LocationConfig, TemporalConfig};
pub use data_quality::QualitySummary;
pub use deduplication::{
    coordinate_precision, date_precision, decimal_digit_count, load_pairs, representative,
    ClusterPair, ClusterRecord, ClusterStrategy, ClusterSummary, DeduplicationEngine,
};
pub use error::{Error, Result};
pub use interpreter::{InterpretedRecord, OccurrenceInterpreter};
pub use issues::{InterpretationIssue, IssueLedger, IssueType, ParsedField, Term};
pub use location::{
    BoundingBoxGazetteer, CoordinateTransform, Country, CountryVocabulary, DatumReprojector,
    LatLng, LocationInterpreter, LocationInterpreterBuilder, ParsedLocation, PointCountryMatcher,
    VocabularyLookup, Wgs84Reprojector,
};
pub use memo::Memoizer;
pub use temporal::{
    ChronoAccumulator, ChronoField, DateOrder, Granularity, ParsedTemporalDates,
    TemporalInterpreter, TemporalValue,
};
pub use terms::{load_csv, RawTerms};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
