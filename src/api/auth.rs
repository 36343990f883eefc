/// Authentication endpoints
use crate::{
    api::middleware::client_meta,
    auth::AuthContext,
    context::AppContext,
    error::GatewayResult,
    gateway::{
        IntrospectRequest, IntrospectResponse, LoginRequest, LoginResponse, MeResponse,
        RefreshRequest, RefreshResponse, RegisterRequest, RegisterResponse,
        SendVerificationRequest,
    },
};
use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;

/// Build authentication routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/refresh", post(refresh))
        .route("/auth/verify", post(verify_token))
        .route("/auth/send-verification", post(send_verification))
        .route("/auth/me", get(me))
}

/// Register a new account with the identity provider
async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> GatewayResult<Json<RegisterResponse>> {
    let response = ctx.orchestrator.register(req).await?;

    Ok(Json(response))
}

/// Login: verify the external credential and open a device session
async fn login(
    State(ctx): State<AppContext>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> GatewayResult<Json<LoginResponse>> {
    let (device, ip_address) = client_meta(&headers, &addr);

    let response = ctx.orchestrator.login(req, &device, &ip_address).await?;

    Ok(Json(response))
}

/// Logout the session the presented access token is bound to
async fn logout(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> GatewayResult<Json<serde_json::Value>> {
    ctx.orchestrator.logout(&auth.session).await?;

    Ok(Json(serde_json::json!({})))
}

/// Logout every session of the authenticated account
async fn logout_all(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> GatewayResult<Json<serde_json::Value>> {
    let revoked = ctx.orchestrator.logout_all(&auth.session).await?;

    Ok(Json(serde_json::json!({ "revoked": revoked })))
}

/// Exchange a refresh token for a new access token
async fn refresh(
    State(ctx): State<AppContext>,
    Json(req): Json<RefreshRequest>,
) -> GatewayResult<Json<RefreshResponse>> {
    let response = ctx.orchestrator.refresh(&req.refresh_token).await?;

    Ok(Json(response))
}

/// Service-to-service token introspection
async fn verify_token(
    State(ctx): State<AppContext>,
    Json(req): Json<IntrospectRequest>,
) -> GatewayResult<Json<IntrospectResponse>> {
    let response = ctx.orchestrator.introspect(&req.token).await?;

    Ok(Json(response))
}

/// Send (or resend) a verification email
async fn send_verification(
    State(ctx): State<AppContext>,
    Json(req): Json<SendVerificationRequest>,
) -> GatewayResult<Json<serde_json::Value>> {
    ctx.orchestrator.send_verification(&req.email).await?;

    Ok(Json(serde_json::json!({ "sent": true })))
}

/// Authenticated account overview with device sessions
async fn me(State(ctx): State<AppContext>, auth: AuthContext) -> GatewayResult<Json<MeResponse>> {
    let response = ctx.orchestrator.me(&auth.session).await?;

    Ok(Json(response))
}
