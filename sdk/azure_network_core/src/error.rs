use thiserror::Error;

/// Errors that can occur when interacting with the Azure Network Management API.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// The request failed with an HTTP error whose body was not a cloud error envelope.
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// The service returned a cloud error (`{"error": {"code", "message"}}`).
    #[error("API error ({code}, HTTP {status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A payload could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP request failed at the transport level.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint URL is invalid.
    #[error("Invalid endpoint URL: {message}")]
    InvalidEndpoint {
        message: String,
        #[source]
        source: Option<url::ParseError>,
    },

    /// A required configuration value is missing.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// A request builder was given missing or inconsistent values.
    #[error("Builder error: {0}")]
    Builder(String),

    /// An operation argument was rejected before any request was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A string could not be parsed as an Azure resource ID.
    #[error("Invalid resource ID '{id}': {reason}")]
    InvalidResourceId { id: String, reason: String },

    /// A long-running operation finished in the `Failed` or `Canceled` state.
    #[error("Operation {status}: {code} - {message}")]
    OperationFailed {
        status: String,
        code: String,
        message: String,
    },

    /// A long-running operation did not finish within the configured number of polls.
    #[error("Operation did not complete after {attempts} polls")]
    PollTimeout { attempts: u32 },

    /// A blocking call could not start or enter its runtime.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl NetworkError {
    /// Create an HTTP error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid endpoint error that keeps the URL parse failure as its source.
    pub fn invalid_endpoint_with_source(message: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidEndpoint {
            message: format!("{}: {}", message.into(), source),
            source: Some(source),
        }
    }

    /// Create an invalid endpoint error without an underlying parse failure.
    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            message: message.into(),
            source: None,
        }
    }

    /// The HTTP status code, for errors that came from a service response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the service reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result type alias for network management operations.
pub type NetworkResult<T> = std::result::Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_code_and_status() {
        let err = NetworkError::Api {
            status: 409,
            code: "InUseSubnetCannotBeDeleted".into(),
            message: "Subnet default is in use".into(),
        };

        let text = err.to_string();
        assert!(text.contains("InUseSubnetCannotBeDeleted"));
        assert!(text.contains("409"));
        assert!(text.contains("Subnet default is in use"));
    }

    #[test]
    fn status_is_exposed_for_service_errors() {
        assert_eq!(NetworkError::http(503, "busy").status(), Some(503));
        assert_eq!(NetworkError::Builder("x".into()).status(), None);
    }

    #[test]
    fn not_found_detection() {
        let err = NetworkError::Api {
            status: 404,
            code: "ResourceNotFound".into(),
            message: "gone".into(),
        };
        assert!(err.is_not_found());
        assert!(!NetworkError::http(400, "bad").is_not_found());
    }

    #[test]
    fn invalid_endpoint_keeps_source() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err = NetworkError::invalid_endpoint_with_source("invalid endpoint URL", parse_err);

        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("invalid endpoint URL"));
    }
}
