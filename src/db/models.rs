/// Database models for the gateway
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account record in the database
///
/// Keyed internally by a generated id; `subject_id` is the stable identifier
/// assigned by the external identity provider.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub subject_id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
    /// Login attempts are rejected until this passes; NULL means unlocked
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Session record in the database
///
/// One row per (account, device) login. Rows are retained for audit;
/// revocation only clears `is_active`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub account_id: String,
    pub device: String,
    pub ip_address: String,
    pub login_time: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub is_active: bool,
}

/// Failed login attempt aggregate
///
/// One row per (email, source address); `attempt_count` accumulates repeats.
/// `account_id` is NULL when the email matches no account.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FailedAttempt {
    pub id: String,
    pub account_id: Option<String>,
    pub email: String,
    pub ip_address: String,
    pub device: Option<String>,
    pub reason: String,
    pub attempt_count: i64,
    pub last_attempt: DateTime<Utc>,
}
