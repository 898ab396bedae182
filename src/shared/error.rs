//! Shared Error Types
//!
//! This module defines the error types used across the dashboard engine.
//! None of them ever escape the sync loop: poll failures are recorded and
//! surfaced through the connection status, malformed coordinates are counted
//! and skipped, and render failures are logged per marker.
//!
//! # Error Categories
//!
//! - `SyncError` - Snapshot fetch and decode failures (always recoverable)
//! - `CoordinateError` - Invalid `"lat,lng"` values on a project
//! - `RenderError` - Rendering backend refused an operation
//!
//! # Usage
//!
//! ```rust
//! use powermason_dashboard::shared::error::SyncError;
//!
//! let error = SyncError::rejected("Invalid token");
//! assert!(error.to_string().contains("Invalid token"));
//! ```
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync` and can be safely shared across thread boundaries.
use thiserror::Error;

/// Errors produced while obtaining a snapshot from the dashboard endpoint
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    /// The request never produced a response (connection refused, DNS, TLS)
    #[error("Network error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
    },

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// Numeric HTTP status code
        status: u16,
        /// Reason phrase or response body excerpt
        message: String,
    },

    /// The server answered `success: false`
    #[error("Server rejected update: {message}")]
    Rejected {
        /// Message or error text returned by the server
        message: String,
    },

    /// The body could not be decoded into a snapshot
    #[error("Malformed snapshot: {message}")]
    Malformed {
        /// Human-readable error message
        message: String,
    },

    /// Token or role missing from the configuration
    #[error("Token or role not available")]
    MissingCredentials,

    /// The request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
}

impl SyncError {
    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new HTTP status error
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Create a new rejection error
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Create a new malformed-body error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(format!("JSON error: {}", err))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::http_status(status.as_u16(), err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}

/// Reasons a `gps_coordinates` value cannot be placed on the map
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("no coordinates")]
    Missing,

    #[error("malformed coordinates '{0}'")]
    Malformed(String),

    #[error("coordinates are not finite")]
    NotFinite,

    #[error("coordinates out of range: lat {lat}, lng {lng}")]
    OutOfRange { lat: f64, lng: f64 },
}

/// Errors reported by a rendering backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The backend's target element is not present on this page
    #[error("render target '{0}' is not available")]
    Unavailable(&'static str),

    /// The backend failed to perform the operation
    #[error("render backend error: {0}")]
    Backend(String),
}
