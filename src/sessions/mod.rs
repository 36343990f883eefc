/// Per-device session registry
///
/// One record per (account, device) login. Deactivation is monotonic: an
/// inactive session never becomes active again, which is what gives logout
/// real revocation power over self-verifying tokens.

use crate::{db::models::Session, error::GatewayResult};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Session registry service
#[derive(Clone)]
pub struct SessionRegistry {
    db: SqlitePool,
}

impl SessionRegistry {
    /// Create a new session registry
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Allocate a fresh session for an account
    pub async fn create(
        &self,
        account_id: &str,
        device: &str,
        ip_address: &str,
    ) -> GatewayResult<Session> {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO sessions (id, account_id, device, ip_address, login_time, last_active, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
        )
        .bind(&session_id)
        .bind(account_id)
        .bind(device)
        .bind(ip_address)
        .bind(now)
        .bind(now)
        .execute(&self.db)
        .await?;

        Ok(Session {
            id: session_id,
            account_id: account_id.to_string(),
            device: device.to_string(),
            ip_address: ip_address.to_string(),
            login_time: now,
            last_active: now,
            is_active: true,
        })
    }

    /// Look up a session that is still active
    ///
    /// A token whose session does not resolve here is revoked, regardless of
    /// its own cryptographic validity.
    pub async fn find_active(
        &self,
        account_id: &str,
        session_id: &str,
    ) -> GatewayResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, account_id, device, ip_address, login_time, last_active, is_active
             FROM sessions
             WHERE id = ?1 AND account_id = ?2 AND is_active = 1",
        )
        .bind(session_id)
        .bind(account_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(session)
    }

    /// Deactivate a single session (single-device logout)
    ///
    /// Idempotent; an already-inactive session stays inactive.
    pub async fn deactivate(&self, account_id: &str, session_id: &str) -> GatewayResult<()> {
        sqlx::query(
            "UPDATE sessions SET is_active = 0 WHERE id = ?1 AND account_id = ?2",
        )
        .bind(session_id)
        .bind(account_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Deactivate every session for an account (logout-everywhere)
    pub async fn deactivate_all(&self, account_id: &str) -> GatewayResult<u64> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = 0 WHERE account_id = ?1 AND is_active = 1",
        )
        .bind(account_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    /// All sessions for an account, newest login first
    pub async fn list_for_account(&self, account_id: &str) -> GatewayResult<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>(
            "SELECT id, account_id, device, ip_address, login_time, last_active, is_active
             FROM sessions
             WHERE account_id = ?1
             ORDER BY login_time DESC",
        )
        .bind(account_id)
        .fetch_all(&self.db)
        .await?;

        Ok(sessions)
    }

    /// Bump a session's last-active timestamp
    pub async fn touch(&self, session_id: &str) -> GatewayResult<()> {
        sqlx::query("UPDATE sessions SET last_active = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(session_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Number of active sessions across all accounts
    pub async fn count_active(&self) -> GatewayResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE is_active = 1")
                .fetch_one(&self.db)
                .await?;

        Ok(count)
    }
}
