//! Error types for FORMA

use std::time::Duration;

use thiserror::Error;

/// Core FORMA errors
#[derive(Error, Debug)]
pub enum FormaError {
    // Catalog errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown joint: {0}")]
    UnknownJoint(String),

    #[error("Malformed catalog entry {exercise}/{stage}/{rule}: {reason}")]
    MalformedCatalog {
        exercise: String,
        stage: String,
        rule: String,
        reason: String,
    },

    #[error("Invalid catalog format: {0}")]
    CatalogFormat(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Collaborator errors
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("No async runtime available")]
    NoRuntime,

    // Session errors
    #[error("Session closed")]
    SessionClosed,
}

impl FormaError {
    /// Catalog error scoped to a whole exercise
    pub fn malformed_exercise(exercise: &str, reason: impl Into<String>) -> Self {
        FormaError::MalformedCatalog {
            exercise: exercise.to_string(),
            stage: "*".to_string(),
            rule: "*".to_string(),
            reason: reason.into(),
        }
    }

    /// Catalog error scoped to a single rule
    pub fn malformed_rule(
        exercise: &str,
        stage: &str,
        rule: &str,
        reason: impl Into<String>,
    ) -> Self {
        FormaError::MalformedCatalog {
            exercise: exercise.to_string(),
            stage: stage.to_string(),
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error comes from an external collaborator
    pub fn is_external(&self) -> bool {
        matches!(self, FormaError::ExternalService(_) | FormaError::Timeout(_))
    }
}

impl From<serde_json::Error> for FormaError {
    fn from(e: serde_json::Error) -> Self {
        FormaError::CatalogFormat(e.to_string())
    }
}

/// Result type for FORMA operations
pub type FormaResult<T> = Result<T, FormaError>;
