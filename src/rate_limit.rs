/// Rate limiting
///
/// Coarse per-process quotas in front of the handlers. Credential endpoints
/// get the tightest tier; the attempt tracker remains the authoritative
/// defense against credential stuffing.
use crate::{config::RateLimitConfig, context::AppContext, error::GatewayError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    authenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    unauthenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    credential: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

fn quota(rps: u32, burst: u32) -> Quota {
    Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::new(1).unwrap()))
        .allow_burst(NonZeroU32::new(burst).unwrap_or(NonZeroU32::new(1).unwrap()))
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            authenticated: Arc::new(GovernorLimiter::direct(quota(
                config.authenticated_rps,
                config.burst_size,
            ))),
            unauthenticated: Arc::new(GovernorLimiter::direct(quota(
                config.unauthenticated_rps,
                config.burst_size / 5,
            ))),
            credential: Arc::new(GovernorLimiter::direct(quota(
                config.credential_rps,
                config.burst_size / 10,
            ))),
        }
    }

    /// Check rate limit for authenticated traffic
    pub fn check_authenticated(&self) -> Result<(), GatewayError> {
        self.authenticated
            .check()
            .map_err(|_| GatewayError::RateLimitExceeded)
    }

    /// Check rate limit for unauthenticated traffic
    pub fn check_unauthenticated(&self) -> Result<(), GatewayError> {
        self.unauthenticated
            .check()
            .map_err(|_| GatewayError::RateLimitExceeded)
    }

    /// Check rate limit for credential endpoints (login, register)
    pub fn check_credential(&self) -> Result<(), GatewayError> {
        self.credential
            .check()
            .map_err(|_| GatewayError::RateLimitExceeded)
    }
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if !ctx.config.rate_limit.enabled {
        return Ok(next.run(request).await);
    }

    let path = request.uri().path();
    let is_credential_endpoint = matches!(
        path,
        "/auth/login" | "/auth/register" | "/auth/send-verification"
    );
    let has_auth_header = request.headers().get("authorization").is_some();

    if is_credential_endpoint {
        ctx.rate_limiter.check_credential()?;
    } else if has_auth_header {
        ctx.rate_limiter.check_authenticated()?;
    } else {
        ctx.rate_limiter.check_unauthenticated()?;
    }

    Ok(next.run(request).await)
}
