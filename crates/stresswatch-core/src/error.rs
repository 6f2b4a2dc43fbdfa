use thiserror::Error;

/// Validation and contract errors exposed by `stresswatch-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("instrument id cannot be empty")]
    EmptyInstrumentId,
    #[error("instrument '{id}' has an empty symbol")]
    EmptySymbol { id: String },
    #[error("instrument id '{id}' is declared more than once")]
    DuplicateInstrument { id: String },
    #[error("unknown instrument '{id}'")]
    UnknownInstrument { id: String },

    #[error("invalid unit class '{value}', expected one of currency, percentage, points")]
    InvalidUnitClass { value: String },
    #[error("invalid history span '{value}', expected one of 1mo, 3mo, 6mo, 1y")]
    InvalidHistorySpan { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("invalid schema version '{value}', expected v<major>.<minor>.<patch>")]
    InvalidSchemaVersion { value: String },

    #[error("field '{field}' must be greater than zero")]
    NonPositive { field: &'static str },
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file '{}' does not exist", .path.display())]
    MissingFile { path: std::path::PathBuf },

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        Self::Load(Box::new(error))
    }
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] crate::source::SourceError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
