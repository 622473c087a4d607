//! Error types for the sequence loaders and layer plans

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read a `.npy` array
    #[error("Failed to read array file: {0}")]
    Npy(#[from] ndarray_npy::ReadNpyError),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    /// An outcome row references a date that no map carries
    #[error("Date '{0}' has no matching map in the metadata")]
    MissingDate(String),

    /// Malformed date triple or date string
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Required column not present in a table header
    #[error("Missing column '{0}'")]
    MissingColumn(String),

    /// Cell that could not be parsed as a number
    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    /// Arrays or tables that must line up do not
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Adjacency matrices are not ordered like the retained covid dates
    #[error(
        "Adjacency matrices out of step with covid dates at position {position}: \
         adjacency has {adjacency}, covid has {covid}"
    )]
    AdjacencyOrderMismatch {
        position: usize,
        adjacency: String,
        covid: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Not enough data to do what was asked
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}
