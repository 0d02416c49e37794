// ⚠️ Error types
// Bad input DATA never ends up here: it becomes an InterpretationIssue.
// These are failures of the caller or of the reference data we were given.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A required collaborator was never wired into an interpreter
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Clustering referenced an id for which no record was supplied
    #[error("No record supplied for cluster member: {0}")]
    UnknownRecord(String),

    /// Vocabulary or boundary table could not be used
    #[error("Reference data error: {0}")]
    ReferenceData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
