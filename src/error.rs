/// Unified error types for the gateway
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Account is temporarily locked after repeated failures
    #[error("Account temporarily locked")]
    LockedAccount,

    /// Verified identity does not match the email supplied with the login
    #[error("Identity does not match the supplied email")]
    IdentityMismatch,

    /// The identity provider reports the email as unverified
    #[error("Email address has not been verified")]
    EmailNotVerified,

    /// Credential rejected by the identity provider
    #[error("Invalid credential")]
    InvalidCredential,

    /// Token is well-formed but past its expiry
    #[error("Token has expired")]
    TokenExpired,

    /// Token is malformed, forged, or signed for the wrong kind
    #[error("Invalid token")]
    TokenInvalid,

    /// Token's session has been deactivated
    #[error("Session has been revoked")]
    SessionRevoked,

    /// Not found errors (account, session)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate registration)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Identity provider or other upstream dependency unavailable
    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Convert GatewayError to HTTP response
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            // Deliberately uniform: no threshold or remaining-time detail.
            GatewayError::LockedAccount => (
                StatusCode::TOO_MANY_REQUESTS,
                "AccountLocked",
                "Too many failed attempts".to_string(),
            ),
            GatewayError::IdentityMismatch => (
                StatusCode::UNAUTHORIZED,
                "IdentityMismatch",
                self.to_string(),
            ),
            GatewayError::EmailNotVerified => (
                StatusCode::FORBIDDEN,
                "EmailNotVerified",
                self.to_string(),
            ),
            GatewayError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "InvalidCredential",
                self.to_string(),
            ),
            GatewayError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "TokenExpired",
                self.to_string(),
            ),
            GatewayError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TokenInvalid",
                self.to_string(),
            ),
            GatewayError::SessionRevoked => (
                StatusCode::UNAUTHORIZED,
                "SessionRevoked",
                self.to_string(),
            ),
            GatewayError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            GatewayError::Conflict(_) => (
                StatusCode::CONFLICT,
                "Conflict",
                self.to_string(),
            ),
            GatewayError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            GatewayError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimitExceeded",
                "Rate limit exceeded".to_string(),
            ),
            GatewayError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "UpstreamUnavailable",
                "Identity service temporarily unavailable".to_string(), // Don't leak details
            ),
            GatewayError::Database(_) | GatewayError::Internal(_) | GatewayError::Io(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "Internal server error".to_string(), // Don't leak details
            ),
        };

        let body = Json(ErrorBody {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
