use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Cache configuration error: {0}")]
    Configuration(String),
    #[error("Invalidator {invalidator} does not support the {phase} phase")]
    UnsupportedPhase {
        invalidator: &'static str,
        phase: &'static str,
    },
    #[error("Authorization backend failed: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_display() {
        let error = CacheError::ConnectionFailed("timeout".to_string());
        assert_eq!(error.to_string(), "Cache connection failed: timeout");
    }

    #[test]
    fn test_operation_failed_display() {
        let error = CacheError::OperationFailed("WRONGTYPE".to_string());
        assert_eq!(error.to_string(), "Cache operation failed: WRONGTYPE");
    }

    #[test]
    fn test_serialization_display() {
        let error = CacheError::Serialization("invalid JSON".to_string());
        assert_eq!(error.to_string(), "Serialization error: invalid JSON");
    }

    #[test]
    fn test_configuration_display() {
        let error = CacheError::Configuration("missing get-set backend".to_string());
        assert_eq!(
            error.to_string(),
            "Cache configuration error: missing get-set backend"
        );
    }

    #[test]
    fn test_unsupported_phase_display() {
        let error = CacheError::UnsupportedPhase {
            invalidator: "GroupsUserInvalidator",
            phase: "create",
        };
        assert_eq!(
            error.to_string(),
            "Invalidator GroupsUserInvalidator does not support the create phase"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<Vec<String>>("not json").unwrap_err();
        let error = CacheError::from(err);
        assert!(matches!(error, CacheError::Serialization(_)));
    }
}
