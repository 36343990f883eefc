/// Session orchestration
///
/// Coordinates external identity verification, attempt tracking, the session
/// registry, and token issuance into the register/login/logout/refresh/verify
/// protocol.

mod orchestrator;

pub use orchestrator::SessionOrchestrator;

use crate::db::models::{Account, Session};
use serde::{Deserialize, Serialize};

/// Login request: externally-issued credential plus the email the caller
/// claims it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub credential: String,
    pub email: String,
}

/// Successful login outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: String,
    pub account: AccountView,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

/// Registration outcome
///
/// `verification_sent` is false when the notification step failed; the
/// created records are kept either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub account: AccountView,
    pub verification_sent: bool,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token refresh outcome: a new access token on the same session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub session_id: String,
}

/// Service-to-service token introspection request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectRequest {
    pub token: String,
}

/// Introspection outcome, letting downstream services resolve local identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectResponse {
    pub valid: bool,
    pub account_id: String,
    pub subject_id: String,
    pub email: String,
    pub session_id: String,
}

/// Request to (re)send a verification email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendVerificationRequest {
    pub email: String,
}

/// Authenticated account overview
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub account: AccountView,
    pub sessions: Vec<SessionView>,
}

/// Public view of an account; never includes internal lockout state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub subject_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        AccountView {
            id: account.id,
            subject_id: account.subject_id,
            email: account.email,
            display_name: account.display_name,
            email_verified: account.email_verified,
            last_login: account.last_login,
        }
    }
}

/// Public view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub device: String,
    pub ip_address: String,
    pub login_time: chrono::DateTime<chrono::Utc>,
    pub last_active: chrono::DateTime<chrono::Utc>,
    pub is_active: bool,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        SessionView {
            id: session.id,
            device: session.device,
            ip_address: session.ip_address,
            login_time: session.login_time,
            last_active: session.last_active,
            is_active: session.is_active,
        }
    }
}

/// Validated session resolved from a bearer token
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub account_id: String,
    pub subject_id: String,
    pub email: String,
    pub session_id: String,
}
