use std::fmt;

/// Result type for training operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Main error type for the DQN trainer
#[derive(Debug, Clone, PartialEq)]
pub enum DqnError {
    /// Sampling asked for more transitions than the buffer holds
    InsufficientData {
        requested: usize,
        available: usize,
    },

    /// Online and target parameter maps do not line up
    ParameterMismatch {
        reason: String,
    },

    /// Hyperparameter outside of its valid range
    InvalidHyperparameter {
        name: String,
        reason: String,
    },

    /// Invalid dimensions for operations
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid action
    InvalidAction {
        action: usize,
        num_actions: usize,
    },

    /// Numerical computation errors
    NumericalError(String),

    /// IO errors (config files)
    IoError(String),

    /// Config parsing errors
    ConfigError(String),
}

impl fmt::Display for DqnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqnError::InsufficientData { requested, available } => {
                write!(
                    f,
                    "Insufficient data: requested {} transitions, buffer holds {}",
                    requested, available
                )
            }
            DqnError::ParameterMismatch { reason } => {
                write!(f, "Parameter mismatch: {}", reason)
            }
            DqnError::InvalidHyperparameter { name, reason } => {
                write!(f, "Invalid hyperparameter '{}': {}", name, reason)
            }
            DqnError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            DqnError::InvalidAction { action, num_actions } => {
                write!(f, "Invalid action {}: must be less than {}", action, num_actions)
            }
            DqnError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            DqnError::IoError(msg) => write!(f, "IO error: {}", msg),
            DqnError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for DqnError {}

impl From<std::io::Error> for DqnError {
    fn from(err: std::io::Error) -> Self {
        DqnError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for DqnError {
    fn from(err: serde_json::Error) -> Self {
        DqnError::ConfigError(err.to_string())
    }
}

// Helper functions for common error patterns
impl DqnError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DqnError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_hyperparameter<S: Into<String>>(name: S, reason: S) -> Self {
        DqnError::InvalidHyperparameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn parameter_mismatch<S: Into<String>>(reason: S) -> Self {
        DqnError::ParameterMismatch {
            reason: reason.into(),
        }
    }

    /// True for errors that abort a training run rather than signal warm-up.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DqnError::InsufficientData { .. })
    }
}
