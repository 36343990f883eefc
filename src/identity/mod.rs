/// External identity provider integration
///
/// The provider is the system of record for primary credentials. The gateway
/// only ever asks it to verify a credential, create a user, or mint an email
/// verification link; everything else (sessions, tokens, lockout) is local.

mod client;

pub use client::HttpIdentityProvider;

use async_trait::async_trait;
use thiserror::Error;

/// Identity claims returned by a successful provider call
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Stable identifier assigned by the provider
    pub subject_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
}

/// Provider-side failures
///
/// `NotFound` and `Invalid` are credential rejections the caller treats as
/// login failures; everything else is a transient platform fault.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("credential does not match any known identity")]
    NotFound,

    #[error("credential rejected by the identity provider")]
    Invalid,

    #[error("email is already registered with the identity provider")]
    Conflict,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Seam to the external identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify an externally-issued credential and return its identity claims
    async fn verify_credential(&self, credential: &str) -> Result<VerifiedIdentity, IdentityError>;

    /// Create a user record with the provider (registration)
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<VerifiedIdentity, IdentityError>;

    /// Generate an email verification link for an existing user
    async fn email_verification_link(&self, email: &str) -> Result<String, IdentityError>;
}
