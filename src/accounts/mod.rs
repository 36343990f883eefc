/// Account store
///
/// Durable account records keyed by the identity provider's stable subject
/// id. Accounts are created on explicit registration or on first verified
/// login, and are never hard-deleted here.

use crate::{
    db::models::Account,
    error::{GatewayError, GatewayResult},
    identity::VerifiedIdentity,
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str =
    "id, subject_id, email, display_name, email_verified, locked_until, created_at, last_login";

/// Account persistence service
#[derive(Clone)]
pub struct AccountStore {
    db: SqlitePool,
}

impl AccountStore {
    /// Create a new account store
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Get account by external subject id
    pub async fn get_by_subject(&self, subject_id: &str) -> GatewayResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE subject_id = ?1",
            ACCOUNT_COLUMNS
        ))
        .bind(subject_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(account)
    }

    /// Get account by email
    pub async fn get_by_email(&self, email: &str) -> GatewayResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts WHERE email = ?1",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(account)
    }

    /// Create an account (registration path)
    pub async fn create(
        &self,
        subject_id: &str,
        email: &str,
        display_name: Option<&str>,
        email_verified: bool,
    ) -> GatewayResult<Account> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO accounts (id, subject_id, email, display_name, email_verified, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&id)
        .bind(subject_id)
        .bind(email)
        .bind(display_name)
        .bind(email_verified)
        .bind(now)
        .execute(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                GatewayError::Conflict("Email is already registered".to_string())
            }
            _ => GatewayError::Database(e),
        })?;

        Ok(Account {
            id,
            subject_id: subject_id.to_string(),
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
            email_verified,
            locked_until: None,
            created_at: now,
            last_login: None,
        })
    }

    /// Insert-or-update an account from a verified login
    ///
    /// Creates the row on first verified login; afterwards refreshes
    /// last-login, the verification flag, and the display name. One
    /// statement, so concurrent logins cannot race the insert.
    pub async fn upsert_login(&self, identity: &VerifiedIdentity) -> GatewayResult<Account> {
        let now = Utc::now();

        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (id, subject_id, email, display_name, email_verified, created_at, last_login)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT (subject_id) DO UPDATE SET
                 email_verified = excluded.email_verified,
                 display_name = COALESCE(excluded.display_name, display_name),
                 last_login = excluded.last_login
             RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(&identity.subject_id)
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(identity.email_verified)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        Ok(account)
    }

    /// Set or clear an account's lockout expiry
    pub async fn set_locked_until(
        &self,
        account_id: &str,
        locked_until: Option<chrono::DateTime<Utc>>,
    ) -> GatewayResult<()> {
        sqlx::query("UPDATE accounts SET locked_until = ?1 WHERE id = ?2")
            .bind(locked_until)
            .bind(account_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn identity(subject: &str, email: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            subject_id: subject.to_string(),
            email: email.to_string(),
            display_name: Some("Alice".to_string()),
            email_verified: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = AccountStore::new(test_pool().await);

        let created = store
            .create("ext-1", "alice@example.com", Some("Alice"), false)
            .await
            .unwrap();
        assert!(!created.email_verified);
        assert!(created.locked_until.is_none());

        let by_subject = store.get_by_subject("ext-1").await.unwrap().unwrap();
        assert_eq!(by_subject.id, created.id);

        let by_email = store.get_by_email("alice@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        assert!(store.get_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = AccountStore::new(test_pool().await);

        store
            .create("ext-1", "alice@example.com", None, false)
            .await
            .unwrap();
        let result = store.create("ext-2", "alice@example.com", None, false).await;

        match result {
            Err(GatewayError::Conflict(_)) => {}
            other => panic!("expected Conflict, got {:?}", other.map(|a| a.id)),
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let store = AccountStore::new(test_pool().await);

        // First verified login creates the row.
        let first = store.upsert_login(&identity("ext-1", "alice@example.com")).await.unwrap();
        assert!(first.email_verified);
        assert!(first.last_login.is_some());

        // Second login reuses the row and keeps the internal id stable.
        let mut updated = identity("ext-1", "alice@example.com");
        updated.display_name = None;
        let second = store.upsert_login(&updated).await.unwrap();
        assert_eq!(second.id, first.id);
        // Absent display name does not erase the stored one.
        assert_eq!(second.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_upsert_preserves_registration_account() {
        let store = AccountStore::new(test_pool().await);

        let registered = store
            .create("ext-1", "alice@example.com", Some("Alice"), false)
            .await
            .unwrap();

        // First login after email verification flips the flag on the same row.
        let logged_in = store.upsert_login(&identity("ext-1", "alice@example.com")).await.unwrap();
        assert_eq!(logged_in.id, registered.id);
        assert!(logged_in.email_verified);
    }

    #[tokio::test]
    async fn test_set_locked_until_roundtrip() {
        let store = AccountStore::new(test_pool().await);
        let account = store
            .create("ext-1", "alice@example.com", None, true)
            .await
            .unwrap();

        let until = Utc::now() + chrono::Duration::seconds(900);
        store.set_locked_until(&account.id, Some(until)).await.unwrap();
        let locked = store.get_by_email("alice@example.com").await.unwrap().unwrap();
        assert!(locked.locked_until.is_some());

        store.set_locked_until(&account.id, None).await.unwrap();
        let unlocked = store.get_by_email("alice@example.com").await.unwrap().unwrap();
        assert!(unlocked.locked_until.is_none());
    }
}
