/// Application context and dependency injection
use crate::{
    accounts::AccountStore,
    attempts::AttemptTracker,
    config::GatewayConfig,
    db,
    error::{GatewayError, GatewayResult},
    gateway::SessionOrchestrator,
    identity::{HttpIdentityProvider, IdentityProvider},
    mailer::Mailer,
    rate_limit::RateLimiter,
    sessions::SessionRegistry,
    tokens::TokenCodec,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<GatewayConfig>,
    pub db: SqlitePool,
    pub accounts: AccountStore,
    pub sessions: SessionRegistry,
    pub attempts: AttemptTracker,
    pub orchestrator: Arc<SessionOrchestrator>,
    pub rate_limiter: Arc<RateLimiter>,
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: GatewayConfig) -> GatewayResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        // Initialize database and run embedded migrations
        let pool = db::create_pool(&config.storage.gateway_db, db::DatabaseOptions::default()).await?;
        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let accounts = AccountStore::new(pool.clone());
        let sessions = SessionRegistry::new(pool.clone());
        let attempts = AttemptTracker::new(
            pool.clone(),
            config.auth.max_failed_attempts,
            config.auth.lockout_duration_secs,
        );
        let codec = TokenCodec::new(&config.auth);

        // External collaborators
        let provider: Arc<dyn IdentityProvider> = Arc::new(
            HttpIdentityProvider::new(&config.identity)
                .map_err(|e| GatewayError::Internal(e.to_string()))?,
        );
        let mailer = Arc::new(Mailer::new(config.email.clone())?);

        let orchestrator = Arc::new(SessionOrchestrator::new(
            accounts.clone(),
            sessions.clone(),
            attempts.clone(),
            codec,
            provider,
            Arc::clone(&mailer),
        ));

        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Ok(Self {
            config: Arc::new(config),
            db: pool,
            accounts,
            sessions,
            attempts,
            orchestrator,
            rate_limiter,
            mailer,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &GatewayConfig) -> GatewayResult<()> {
        let dir = &config.storage.data_directory;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                GatewayError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
