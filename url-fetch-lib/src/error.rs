//! Error handling for fetch and hash operations.
//!
//! A single error type covers argument validation, retrieval failures
//! and the configuration layer used by the CLI.

use std::fmt;

/// Main error type for fetch operations.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// A caller-supplied argument is out of range (e.g. zero concurrency).
    /// Raised before any retrieval starts.
    InvalidArgument { message: String },

    /// Retrieving a resource failed: transport error, non-success status,
    /// unreadable body, unsupported scheme or timeout.
    ///
    /// In a batch this aborts the whole call.
    FetchFailed {
        resource: String,
        message: String,
        status_code: Option<u16>,
        source: Option<String>,
    },

    /// A hash was requested without a resource.
    NullResource,

    /// Configuration errors (invalid settings, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading URL lists or config files
    FileError { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl FetchError {
    /// Create a new invalid argument error.
    pub fn invalid_argument<M: Into<String>>(message: M) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a new fetch failure for `resource`.
    pub fn fetch_failed<R: Into<String>, M: Into<String>>(resource: R, message: M) -> Self {
        Self::FetchFailed {
            resource: resource.into(),
            message: message.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create a new fetch failure carrying the HTTP status code.
    pub fn fetch_failed_with_status<R: Into<String>, M: Into<String>>(
        resource: R,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::FetchFailed {
            resource: resource.into(),
            message: message.into(),
            status_code: Some(status_code),
            source: None,
        }
    }

    /// Create a new fetch failure wrapping an underlying cause.
    pub fn fetch_failed_with_source<R, M, S>(resource: R, message: M, source: S) -> Self
    where
        R: Into<String>,
        M: Into<String>,
        S: fmt::Display,
    {
        Self::FetchFailed {
            resource: resource.into(),
            message: message.into(),
            status_code: None,
            source: Some(source.to_string()),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error came from retrieving a resource.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchFailed { .. })
    }

    /// The resource a fetch failure refers to, if any.
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::FetchFailed { resource, .. } => Some(resource),
            _ => None,
        }
    }

    /// HTTP status code of a fetch failure, if the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::FetchFailed { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { message } => write!(f, "Invalid argument: {}", message),
            Self::FetchFailed {
                resource,
                message,
                status_code,
                source,
            } => {
                write!(f, "Fetch failed for '{}'", resource)?;
                if let Some(code) = status_code {
                    write!(f, " (HTTP {})", code)?;
                }
                write!(f, ": {}", message)?;
                if let Some(source) = source {
                    write!(f, " (source: {})", source)?;
                }
                Ok(())
            }
            Self::NullResource => write!(f, "No resource given"),
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => write!(f, "File error at '{}': {}", path, message),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let resource = err
            .url()
            .map(|url| url.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());

        if let Some(status) = err.status() {
            Self::FetchFailed {
                resource,
                message: "Server returned an error status".to_string(),
                status_code: Some(status.as_u16()),
                source: Some(err.to_string()),
            }
        } else if err.is_timeout() {
            Self::fetch_failed_with_source(resource, "Request timed out", err)
        } else if err.is_connect() {
            Self::fetch_failed_with_source(resource, "Connection failed", err)
        } else if err.is_body() || err.is_decode() {
            Self::fetch_failed_with_source(resource, "Response body unreadable", err)
        } else {
            Self::fetch_failed_with_source(resource, "HTTP request failed", err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_display_includes_status_and_source() {
        let err = FetchError::FetchFailed {
            resource: "http://localhost/a".to_string(),
            message: "Server returned an error status".to_string(),
            status_code: Some(500),
            source: Some("boom".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Fetch failed for 'http://localhost/a' (HTTP 500): Server returned an error status (source: boom)"
        );
    }

    #[test]
    fn test_classification_helpers() {
        let err = FetchError::fetch_failed_with_status("http://x/", "bad", 404);
        assert!(err.is_fetch_failure());
        assert_eq!(err.resource(), Some("http://x/"));
        assert_eq!(err.status_code(), Some(404));

        let err = FetchError::invalid_argument("max_concurrency must be at least 1");
        assert!(!err.is_fetch_failure());
        assert_eq!(err.resource(), None);
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn test_null_resource_display() {
        assert_eq!(FetchError::NullResource.to_string(), "No resource given");
    }
}
