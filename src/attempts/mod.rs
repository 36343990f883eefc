/// Failed login attempt tracking and account lockout
///
/// Failures are aggregated per (email, source address) so the forensic trail
/// shows which addresses attacked, while the lockout threshold is computed
/// across all addresses for an identity so rotating sources cannot dodge it.

use crate::{
    db::models::{Account, FailedAttempt},
    error::GatewayResult,
};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Tracks failed authentication attempts and applies lockout
#[derive(Clone)]
pub struct AttemptTracker {
    db: SqlitePool,
    max_failed_attempts: i64,
    lockout_duration_secs: i64,
}

impl AttemptTracker {
    /// Create a new attempt tracker
    pub fn new(db: SqlitePool, max_failed_attempts: i64, lockout_duration_secs: i64) -> Self {
        Self {
            db,
            max_failed_attempts,
            lockout_duration_secs,
        }
    }

    /// Record a failed attempt and lock the account once the identity-wide
    /// total reaches the threshold
    ///
    /// The upsert is a single statement; two concurrent failures can never
    /// both observe a sub-threshold count and drop an increment. The lockout
    /// update is a no-op for emails without an account, so callers behave
    /// identically for known and unknown identities.
    pub async fn record_failure(
        &self,
        email: &str,
        account_id: Option<&str>,
        ip_address: &str,
        device: &str,
        reason: &str,
    ) -> GatewayResult<()> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO failed_attempts (id, account_id, email, ip_address, device, reason, attempt_count, last_attempt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
             ON CONFLICT (email, ip_address) DO UPDATE SET
                 attempt_count = attempt_count + 1,
                 device = excluded.device,
                 reason = excluded.reason,
                 last_attempt = excluded.last_attempt",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(account_id)
        .bind(email)
        .bind(ip_address)
        .bind(device)
        .bind(reason)
        .bind(now)
        .execute(&self.db)
        .await?;

        let total = self.total_for(email).await?;

        if total >= self.max_failed_attempts {
            let locked_until = now + Duration::seconds(self.lockout_duration_secs);
            let result = sqlx::query("UPDATE accounts SET locked_until = ?1 WHERE email = ?2")
                .bind(locked_until)
                .bind(email)
                .execute(&self.db)
                .await?;

            if result.rows_affected() > 0 {
                tracing::warn!(
                    "Account {} locked until {} after {} failed attempts",
                    email,
                    locked_until,
                    total
                );
                crate::metrics::record_lockout();
            }
        }

        Ok(())
    }

    /// Delete every failure record for an identity
    ///
    /// Called once after a successful verification, strictly before any
    /// session is created for that login.
    pub async fn reset(&self, email: &str) -> GatewayResult<()> {
        sqlx::query("DELETE FROM failed_attempts WHERE email = ?1")
            .bind(email)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Whether the account is currently locked out
    pub fn is_locked(&self, account: &Account) -> bool {
        account
            .locked_until
            .map(|until| until > Utc::now())
            .unwrap_or(false)
    }

    /// Total failures for an identity across all source addresses
    pub async fn total_for(&self, email: &str) -> GatewayResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(attempt_count), 0) FROM failed_attempts WHERE email = ?1",
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;

        Ok(total)
    }

    /// All failure records for an identity (forensic view)
    pub async fn records_for(&self, email: &str) -> GatewayResult<Vec<FailedAttempt>> {
        let records = sqlx::query_as::<_, FailedAttempt>(
            "SELECT id, account_id, email, ip_address, device, reason, attempt_count, last_attempt
             FROM failed_attempts
             WHERE email = ?1
             ORDER BY last_attempt DESC",
        )
        .bind(email)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }

    /// Delete stale records for identities that are not currently locked
    ///
    /// Records belonging to a locked account are kept so cleanup can never
    /// shorten an active lockout's evidence trail. Returns the number of rows
    /// removed.
    pub async fn purge_stale(&self, older_than_secs: i64) -> GatewayResult<u64> {
        let cutoff = Utc::now() - Duration::seconds(older_than_secs);

        let result = sqlx::query(
            "DELETE FROM failed_attempts
             WHERE last_attempt < ?1
               AND email NOT IN (
                   SELECT email FROM accounts
                   WHERE locked_until IS NOT NULL AND locked_until > ?2
               )",
        )
        .bind(cutoff)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use chrono::DateTime;

    async fn insert_account(db: &SqlitePool, email: &str) -> String {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO accounts (id, subject_id, email, email_verified, created_at)
             VALUES (?1, ?2, ?3, 1, ?4)",
        )
        .bind(&id)
        .bind(format!("ext-{}", id))
        .bind(email)
        .bind(Utc::now())
        .execute(db)
        .await
        .unwrap();
        id
    }

    async fn fetch_account(db: &SqlitePool, email: &str) -> Account {
        sqlx::query_as::<_, Account>(
            "SELECT id, subject_id, email, display_name, email_verified, locked_until, created_at, last_login
             FROM accounts WHERE email = ?1",
        )
        .bind(email)
        .fetch_one(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_repeat_failures_increment_one_record() {
        let db = test_pool().await;
        let tracker = AttemptTracker::new(db.clone(), 5, 900);
        insert_account(&db, "alice@example.com").await;

        for _ in 0..3 {
            tracker
                .record_failure("alice@example.com", None, "10.0.0.1", "cli", "invalid credential")
                .await
                .unwrap();
        }

        let records = tracker.records_for("alice@example.com").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attempt_count, 3);
        assert_eq!(tracker.total_for("alice@example.com").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_threshold_aggregates_across_addresses() {
        let db = test_pool().await;
        let tracker = AttemptTracker::new(db.clone(), 3, 900);
        insert_account(&db, "alice@example.com").await;

        // Two addresses, three failures total: rotation must not dodge lockout.
        tracker
            .record_failure("alice@example.com", None, "10.0.0.1", "cli", "invalid credential")
            .await
            .unwrap();
        tracker
            .record_failure("alice@example.com", None, "10.0.0.2", "cli", "invalid credential")
            .await
            .unwrap();

        let account = fetch_account(&db, "alice@example.com").await;
        assert!(!tracker.is_locked(&account), "below threshold");

        tracker
            .record_failure("alice@example.com", None, "10.0.0.2", "cli", "invalid credential")
            .await
            .unwrap();

        let account = fetch_account(&db, "alice@example.com").await;
        assert!(tracker.is_locked(&account), "locked at threshold");

        let records = tracker.records_for("alice@example.com").await.unwrap();
        assert_eq!(records.len(), 2, "one record per source address");
    }

    #[tokio::test]
    async fn test_reset_clears_all_records() {
        let db = test_pool().await;
        let tracker = AttemptTracker::new(db.clone(), 10, 900);
        insert_account(&db, "alice@example.com").await;

        for ip in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            tracker
                .record_failure("alice@example.com", None, ip, "cli", "invalid credential")
                .await
                .unwrap();
        }

        tracker.reset("alice@example.com").await.unwrap();
        assert_eq!(tracker.total_for("alice@example.com").await.unwrap(), 0);
        assert!(tracker.records_for("alice@example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lockout_expires_on_its_own() {
        let db = test_pool().await;
        let tracker = AttemptTracker::new(db.clone(), 3, 900);
        let account_id = insert_account(&db, "alice@example.com").await;

        // Lockout expired a minute ago.
        let past: DateTime<Utc> = Utc::now() - Duration::seconds(60);
        sqlx::query("UPDATE accounts SET locked_until = ?1 WHERE id = ?2")
            .bind(past)
            .bind(&account_id)
            .execute(&db)
            .await
            .unwrap();

        let account = fetch_account(&db, "alice@example.com").await;
        assert!(!tracker.is_locked(&account));

        // Future lockout is still in force.
        let future: DateTime<Utc> = Utc::now() + Duration::seconds(600);
        sqlx::query("UPDATE accounts SET locked_until = ?1 WHERE id = ?2")
            .bind(future)
            .bind(&account_id)
            .execute(&db)
            .await
            .unwrap();

        let account = fetch_account(&db, "alice@example.com").await;
        assert!(tracker.is_locked(&account));
    }

    #[tokio::test]
    async fn test_unknown_email_records_without_locking() {
        let db = test_pool().await;
        let tracker = AttemptTracker::new(db.clone(), 1, 900);

        // No account row exists; the failure is still recorded and nothing
        // panics or locks.
        tracker
            .record_failure("ghost@example.com", None, "10.0.0.1", "cli", "invalid credential")
            .await
            .unwrap();

        assert_eq!(tracker.total_for("ghost@example.com").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_keeps_locked_identities() {
        let db = test_pool().await;
        let tracker = AttemptTracker::new(db.clone(), 100, 900);
        let locked_id = insert_account(&db, "locked@example.com").await;
        insert_account(&db, "stale@example.com").await;

        sqlx::query("UPDATE accounts SET locked_until = ?1 WHERE id = ?2")
            .bind(Utc::now() + Duration::seconds(600))
            .bind(&locked_id)
            .execute(&db)
            .await
            .unwrap();

        for email in ["locked@example.com", "stale@example.com"] {
            tracker
                .record_failure(email, None, "10.0.0.1", "cli", "invalid credential")
                .await
                .unwrap();
        }

        // Age both records past the cutoff.
        sqlx::query("UPDATE failed_attempts SET last_attempt = ?1")
            .bind(Utc::now() - Duration::seconds(7200))
            .execute(&db)
            .await
            .unwrap();

        let purged = tracker.purge_stale(3600).await.unwrap();
        assert_eq!(purged, 1);
        assert_eq!(tracker.total_for("locked@example.com").await.unwrap(), 1);
        assert_eq!(tracker.total_for("stale@example.com").await.unwrap(), 0);
    }
}
