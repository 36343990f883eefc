/// Configuration management for the gateway
use crate::error::{GatewayError, GatewayResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub identity: IdentityProviderConfig,
    pub email: Option<EmailConfig>,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub gateway_db: PathBuf,
}

/// Authentication configuration
///
/// Access and refresh tokens are signed with independent secrets so one kind
/// can never be presented in place of the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: i64,
    /// Failures across all source addresses before an account locks
    pub max_failed_attempts: i64,
    /// Lockout duration in seconds
    pub lockout_duration_secs: i64,
}

/// External identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests per second for authenticated traffic
    pub authenticated_rps: u32,
    /// Requests per second for unauthenticated traffic
    pub unauthenticated_rps: u32,
    /// Requests per second for credential endpoints (login, register)
    pub credential_rps: u32,
    pub burst_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl GatewayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> GatewayResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("AEGIS_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("AEGIS_PORT")
            .unwrap_or_else(|_| "8300".to_string())
            .parse()
            .map_err(|_| GatewayError::Validation("Invalid port number".to_string()))?;
        let version = env::var("AEGIS_VERSION").unwrap_or_else(|_| "0.1.0".to_string());

        let data_directory: PathBuf = env::var("AEGIS_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let gateway_db = env::var("AEGIS_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("gateway.sqlite"));

        let access_token_secret = env::var("AEGIS_ACCESS_TOKEN_SECRET")
            .map_err(|_| GatewayError::Validation("Access token secret required".to_string()))?;
        let refresh_token_secret = env::var("AEGIS_REFRESH_TOKEN_SECRET")
            .map_err(|_| GatewayError::Validation("Refresh token secret required".to_string()))?;
        let access_token_ttl_secs = env::var("AEGIS_ACCESS_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .unwrap_or(900);
        let refresh_token_ttl_secs = env::var("AEGIS_REFRESH_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse()
            .unwrap_or(604_800);
        let max_failed_attempts = env::var("AEGIS_MAX_FAILED_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);
        let lockout_duration_secs = env::var("AEGIS_LOCKOUT_DURATION_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .unwrap_or(900);

        let identity_base_url = env::var("AEGIS_IDENTITY_BASE_URL")
            .map_err(|_| GatewayError::Validation("Identity provider base URL required".to_string()))?;
        let identity_api_key = env::var("AEGIS_IDENTITY_API_KEY").ok();
        let identity_timeout_secs = env::var("AEGIS_IDENTITY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let email = if let Ok(smtp_url) = env::var("AEGIS_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("AEGIS_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        let rate_limit_enabled = env::var("AEGIS_RATE_LIMITS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let authenticated_rps = env::var("AEGIS_RATE_LIMIT_AUTHENTICATED_RPS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);
        let unauthenticated_rps = env::var("AEGIS_RATE_LIMIT_UNAUTHENTICATED_RPS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let credential_rps = env::var("AEGIS_RATE_LIMIT_CREDENTIAL_RPS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);
        let burst_size = env::var("AEGIS_RATE_LIMIT_BURST_SIZE")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(GatewayConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_directory,
                gateway_db,
            },
            auth: AuthConfig {
                access_token_secret,
                refresh_token_secret,
                access_token_ttl_secs,
                refresh_token_ttl_secs,
                max_failed_attempts,
                lockout_duration_secs,
            },
            identity: IdentityProviderConfig {
                base_url: identity_base_url,
                api_key: identity_api_key,
                timeout_secs: identity_timeout_secs,
            },
            email,
            rate_limit: RateLimitConfig {
                enabled: rate_limit_enabled,
                authenticated_rps,
                unauthenticated_rps,
                credential_rps,
                burst_size,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> GatewayResult<()> {
        if self.service.hostname.is_empty() {
            return Err(GatewayError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.auth.access_token_secret.len() < 32 {
            return Err(GatewayError::Validation(
                "Access token secret must be at least 32 characters".to_string(),
            ));
        }

        if self.auth.refresh_token_secret.len() < 32 {
            return Err(GatewayError::Validation(
                "Refresh token secret must be at least 32 characters".to_string(),
            ));
        }

        // A shared secret would let a refresh token stand in for an access token.
        if self.auth.access_token_secret == self.auth.refresh_token_secret {
            return Err(GatewayError::Validation(
                "Access and refresh token secrets must differ".to_string(),
            ));
        }

        if self.auth.max_failed_attempts < 1 {
            return Err(GatewayError::Validation(
                "Max failed attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
