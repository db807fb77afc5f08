//! Error types shared by the RND components.

use std::fmt;

/// Configuration validation error.
///
/// Returned when configuration parameters are invalid or inconsistent.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A count parameter (n_workers, horizon, etc.) must be positive.
    InvalidCount {
        field: &'static str,
        value: usize,
    },
    /// A parameter is outside its valid range.
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCount { field, value } => {
                write!(f, "{} must be > 0, got {}", field, value)
            }
            ConfigError::OutOfRange { field, value, min, max } => {
                write!(f, "{} must be in [{}, {}], got {}", field, min, max, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error type for intrinsic reward generation and pseudo-rollout storage.
#[derive(Debug, Clone, PartialEq)]
pub enum RndError {
    /// An input does not have the shape the caller contract requires.
    ShapeMismatch {
        what: &'static str,
        expected: String,
        actual: String,
    },
    /// A rollout operation was called in the wrong phase of the collection cycle.
    OutOfOrder {
        operation: &'static str,
        pushed: usize,
        horizon: usize,
    },
    /// Invalid configuration.
    Config(ConfigError),
    /// Tensor data could not be read back from the backend.
    Tensor(String),
}

impl RndError {
    pub(crate) fn shape(
        what: &'static str,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        RndError::ShapeMismatch {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl fmt::Display for RndError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RndError::ShapeMismatch { what, expected, actual } => {
                write!(f, "Shape mismatch for {}: expected {}, got {}", what, expected, actual)
            }
            RndError::OutOfOrder { operation, pushed, horizon } => write!(
                f,
                "{} called out of order: {} of {} steps pushed",
                operation, pushed, horizon
            ),
            RndError::Config(e) => write!(f, "Invalid config: {}", e),
            RndError::Tensor(e) => write!(f, "Tensor error: {}", e),
        }
    }
}

impl std::error::Error for RndError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RndError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for RndError {
    fn from(e: ConfigError) -> Self {
        RndError::Config(e)
    }
}
