//! Client library for the campus backend API.
//!
//! Provides:
//! - Wire models for courses, users and auth responses
//! - The session store (token + role) over pluggable durable storage
//! - A client factory producing public and bearer-authenticated clients
//! - Pure per-entity form validation

use reqwest::StatusCode;

pub mod client;
pub mod models;
pub mod session;
pub mod validation;

pub use client::{AuthedClient, ClientFactory, PublicClient};
pub use models::{AuthResponse, Course, CourseInput, Credentials, Role, SignupRequest, User, UserInput};
pub use session::{MemoryStorage, Session, SessionContext, SessionState, SessionStorage};

/// Message shown when the backend could not be reached at all.
pub const NETWORK_FAILURE_MESSAGE: &str = "Unable to reach the server. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure (connection refused, DNS, body decoding)
    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend rejected the bearer token
    #[error("Not authorized: {message}")]
    Unauthorized { message: String },

    /// Backend reported a business error
    #[error("HTTP error from API ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// 2xx response whose `status` field was not "success"
    #[error("API returned status {0:?}")]
    Rejected(String),

    /// Endpoint path could not be joined onto the base URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Returns true if the backend rejected our credentials.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    /// Text suitable for an error notification.
    ///
    /// Backend-provided messages are passed through verbatim; transport
    /// failures get a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthorized { message } | Error::Api { message, .. } => message.clone(),
            Error::Request(_) | Error::InvalidUrl(_) => NETWORK_FAILURE_MESSAGE.to_string(),
            Error::Rejected(status) => format!("Request was not accepted ({status})"),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_passes_backend_text_through() {
        let err = Error::Api {
            status: StatusCode::BAD_REQUEST,
            message: "Email already in use".to_string(),
        };
        assert_eq!(err.user_message(), "Email already in use");
        assert!(!err.is_auth_error());

        let err = Error::Unauthorized {
            message: "jwt expired".to_string(),
        };
        assert_eq!(err.user_message(), "jwt expired");
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_user_message_generic_for_transport_errors() {
        let err = Error::InvalidUrl("relative URL without a base".to_string());
        assert_eq!(err.user_message(), NETWORK_FAILURE_MESSAGE);
    }
}
