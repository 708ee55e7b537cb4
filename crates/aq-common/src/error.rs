//! Error types for air-quality services.

use thiserror::Error;

/// Result type alias using AqError.
pub type AqResult<T> = Result<T, AqError>;

/// Primary error type for storage and query operations.
#[derive(Debug, Error)]
pub enum AqError {
    // === Request Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Storage Errors ===
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Fallback store provisioning failed: {0}")]
    FallbackProvisioning(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Infrastructure Errors ===
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AqError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AqError::InvalidParameter { .. } => 400,

            AqError::ServiceUnavailable(_) => 503,

            _ => 500,
        }
    }

    /// Shorthand for an invalid query parameter.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        AqError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AqError::invalid_parameter("limit", "must be positive").http_status_code(),
            400
        );
        assert_eq!(AqError::DatabaseError("boom".into()).http_status_code(), 500);
        assert_eq!(
            AqError::ServiceUnavailable("db".into()).http_status_code(),
            503
        );
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = AqError::invalid_parameter("limit", "must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid parameter value for 'limit': must be positive"
        );
    }
}
