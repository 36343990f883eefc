/// Background task implementations
use crate::{context::AppContext, error::GatewayResult};

/// Failed-attempt records older than this are eligible for purging
const ATTEMPT_RETENTION_SECS: i64 = 24 * 3600;

/// Purge stale failed-attempt records for identities that are not locked
///
/// Records for a locked account are always kept, so cleanup cannot erase the
/// evidence behind an active lockout.
pub async fn purge_stale_attempts(ctx: &AppContext) -> GatewayResult<u64> {
    ctx.attempts.purge_stale(ATTEMPT_RETENTION_SECS).await
}

/// Health check - verify the store is reachable and refresh gauges
pub async fn health_check(ctx: &AppContext) -> GatewayResult<()> {
    sqlx::query("SELECT 1").fetch_one(&ctx.db).await?;

    let active = ctx.sessions.count_active().await?;
    crate::metrics::set_active_sessions(active);

    Ok(())
}
