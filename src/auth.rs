/// Authentication extractors
use crate::{
    api::middleware::extract_bearer_token,
    context::AppContext,
    error::GatewayError,
    gateway::ValidatedSession,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated context - extracts and validates the session from a request
///
/// Missing and malformed bearer tokens are rejected identically, so a caller
/// cannot distinguish "no token" probing from a forged token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub session: ValidatedSession,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or(GatewayError::TokenInvalid)?;

        let session = state.orchestrator.validate_access(&token).await?;

        Ok(AuthContext { session })
    }
}
