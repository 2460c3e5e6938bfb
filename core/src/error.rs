use thiserror::Error;

#[derive(Error, Debug)]
pub enum FairLendError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid crosswalk row {line}: {reason}")]
    InvalidCrosswalkRow { line: usize, reason: String },

    #[error("Duplicate GEOID5 '{geoid5}' in crosswalk")]
    DuplicateGeoid { geoid5: String },

    #[error("Unresolved geography '{county}, {state}': {reason}")]
    UnresolvedGeography {
        county: String,
        state:  String,
        reason: String,
    },

    #[error("Ambiguous county '{county}, {state}': candidates {candidates:?}")]
    AmbiguousMatch {
        county:     String,
        state:      String,
        candidates: Vec<String>,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Run not initialized")]
    RunNotInitialized,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type FairLendResult<T> = Result<T, FairLendError>;
