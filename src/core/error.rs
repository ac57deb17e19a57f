//! # Error Handling Module
//!
//! Error types for the configuration and discovery surfaces of the isolation
//! balancer. Selection itself never returns these: a request with no eligible
//! instance yields `None`, which callers are expected to map to a
//! service-unavailable outcome. Everything here concerns the wiring around
//! selection (loading configuration, talking to an instance-list provider).

use axum::http::StatusCode;
use thiserror::Error;

/// Main result type used throughout the crate
pub type IsolationResult<T> = Result<T, IsolationError>;

/// Error categories for the isolation balancer's support surfaces
#[derive(Debug, Error, Clone)]
pub enum IsolationError {
    /// Configuration-related errors (invalid config, missing files, etc.)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Instance-list provider errors (registry unreachable, bad payload, etc.)
    #[error("Service discovery error: {message}")]
    ServiceDiscovery { message: String },

    /// Internal errors for unexpected failures
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// I/O errors (config file reads, etc.)
    #[error("I/O error: {message}")]
    Io { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// YAML parsing errors for configuration files
    #[error("YAML error: {message}")]
    Yaml { message: String },
}

impl IsolationError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a service discovery error with a custom message
    pub fn service_discovery<S: Into<String>>(message: S) -> Self {
        Self::ServiceDiscovery {
            message: message.into(),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code a gateway should answer with when this error
    /// surfaces during request handling.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceDiscovery { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Json { .. } => StatusCode::BAD_REQUEST,
            Self::Yaml { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// String representation of the error type for structured logs
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration_error",
            Self::ServiceDiscovery { .. } => "service_discovery_error",
            Self::Internal { .. } => "internal_error",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::Yaml { .. } => "yaml_error",
        }
    }
}

impl From<std::io::Error> for IsolationError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for IsolationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for IsolationError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}
