use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] stresswatch_core::ValidationError),

    #[error(transparent)]
    Config(#[from] stresswatch_core::ConfigError),

    #[error("command error: {0}")]
    Command(String),

    #[error("strict mode failed: {unavailable} instrument(s) unavailable")]
    StrictModeViolation { unavailable: usize },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<stresswatch_core::CoreError> for CliError {
    fn from(error: stresswatch_core::CoreError) -> Self {
        use stresswatch_core::CoreError;

        match error {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Config(error) => Self::Config(error),
            CoreError::Serialization(error) => Self::Serialization(error),
            CoreError::Source(error) => Self::Command(error.to_string()),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 3,
            Self::Serialization(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Command(_) | Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stresswatch_core::{CoreError, SourceError, ValidationError};

    #[test]
    fn maps_categories_to_exit_codes() {
        assert_eq!(
            CliError::from(ValidationError::EmptyInstrumentId).exit_code(),
            2
        );
        assert_eq!(CliError::StrictModeViolation { unavailable: 1 }.exit_code(), 5);
        assert_eq!(
            CliError::from(CoreError::Source(SourceError::unavailable("down"))).exit_code(),
            10
        );
    }
}
