//! Error types
//!
//! `ConfigError` covers startup validation. `AppError` is what request
//! handlers return; it renders as `{"success": false, "code", "error"}`.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("{0} must be set together")]
    Incomplete(&'static str),
}

#[derive(Debug, Error)]
pub enum AppError {
    /// A required secret or setting is missing
    #[error("{0}")]
    Configuration(String),
    /// Caller input is missing or malformed
    #[error("{0}")]
    InvalidPayload(String),
    /// The transient handshake cookie is missing, expired or tampered with
    #[error("OAuth session expired or not found, restart authentication")]
    SessionExpired,
    /// Returned `state` (or request token) does not match the stored one
    #[error("OAuth state mismatch, restart authentication")]
    CsrfMismatch,
    /// The provider call failed or returned something unusable
    #[error("{0}")]
    Upstream(String),
    #[error("A bot for this account and server domain already exists")]
    DuplicateBot,
    #[error("{0}")]
    Storage(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::SessionExpired => "session_expired",
            Self::CsrfMismatch => "csrf_mismatch",
            Self::Upstream(_) => "upstream_error",
            Self::DuplicateBot => "duplicate_bot",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Render with an explicit status, for routes whose contract differs from the default
    pub fn response_with_status(&self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(serde_json::json!({
            "success": false,
            "code": self.code(),
            "error": self.to_string(),
        }))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration(_) | Self::Upstream(_) | Self::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidPayload(_) | Self::SessionExpired | Self::CsrfMismatch | Self::DuplicateBot => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        self.response_with_status(self.status_code())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(format!("Database error: {}", e))
    }
}
