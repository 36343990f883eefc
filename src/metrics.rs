/// Metrics and telemetry for the gateway
///
/// Prometheus-compatible series for login outcomes, lockouts, token
/// refreshes, and session revocations.

use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    /// Login attempts by outcome ("success" / "failure")
    pub static ref LOGIN_ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "login_attempts_total",
        "Total number of login attempts",
        &["outcome"]
    )
    .unwrap();

    /// Account lockouts triggered by the attempt tracker
    pub static ref ACCOUNT_LOCKOUTS_TOTAL: IntCounter = register_int_counter!(
        "account_lockouts_total",
        "Total number of account lockouts"
    )
    .unwrap();

    /// Access tokens reissued through the refresh endpoint
    pub static ref TOKEN_REFRESHES_TOTAL: IntCounter = register_int_counter!(
        "token_refreshes_total",
        "Total number of access tokens issued via refresh"
    )
    .unwrap();

    /// Session revocations by scope ("single" / "all")
    pub static ref SESSION_REVOCATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "session_revocations_total",
        "Total number of session revocations",
        &["scope"]
    )
    .unwrap();

    /// Active sessions (refreshed by the background health job)
    pub static ref SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "sessions_active",
        "Number of active sessions"
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Record a login attempt
pub fn record_login(outcome: &str) {
    LOGIN_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Record an account lockout
pub fn record_lockout() {
    ACCOUNT_LOCKOUTS_TOTAL.inc();
}

/// Record an access-token refresh
pub fn record_refresh() {
    TOKEN_REFRESHES_TOTAL.inc();
}

/// Record a session revocation
pub fn record_revocation(scope: &str) {
    SESSION_REVOCATIONS_TOTAL.with_label_values(&[scope]).inc();
}

/// Update the active-session gauge
pub fn set_active_sessions(count: i64) {
    SESSIONS_ACTIVE.set(count);
}
