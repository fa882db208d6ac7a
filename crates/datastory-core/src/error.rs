//! Error types for Datastory

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatastoryError {
    // Configuration errors
    #[error("Unknown analysis type: {key}")]
    UnknownAnalysisType { key: String },

    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Remote errors
    #[error("API request failed: {status} - {body}")]
    RemoteRequest { status: u16, body: String },

    #[error("Failed to reach {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Failed to decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("Catalog action {action} failed: {message}")]
    CatalogAction { action: String, message: String },

    // Job errors
    #[error("Polling timeout: Maximum attempts ({max_attempts}) reached")]
    PollingTimeout { max_attempts: u32 },

    #[error("No access token available")]
    MissingCredential,

    #[error("Remote {kind} is missing an identifier")]
    MissingIdentifier { kind: String },

    #[error("A transcription was already started; reset before starting another")]
    SubmissionInProgress,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DatastoryError {
    /// Whether this error was raised before any remote call because the
    /// local configuration is unusable
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DatastoryError::UnknownAnalysisType { .. }
                | DatastoryError::ConfigMissing { .. }
                | DatastoryError::ConfigInvalid { .. }
        )
    }

    /// HTTP status carried by a remote failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            DatastoryError::RemoteRequest { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn missing_id(kind: impl Into<String>) -> Self {
        DatastoryError::MissingIdentifier { kind: kind.into() }
    }
}

impl From<serde_json::Error> for DatastoryError {
    fn from(err: serde_json::Error) -> Self {
        DatastoryError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DatastoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(DatastoryError::UnknownAnalysisType { key: "x".into() }.is_configuration());
        assert!(!DatastoryError::MissingCredential.is_configuration());
        assert!(!DatastoryError::RemoteRequest { status: 500, body: String::new() }
            .is_configuration());
    }

    #[test]
    fn test_remote_request_message_carries_status_and_body() {
        let err = DatastoryError::RemoteRequest { status: 500, body: "boom".into() };
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "API request failed: 500 - boom");
    }
}
