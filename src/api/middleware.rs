/// Request helpers shared by the handlers
use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Device descriptor and source address for session binding
///
/// The source address honors the first X-Forwarded-For hop when present,
/// falling back to the socket peer.
pub fn client_meta(headers: &HeaderMap, addr: &SocketAddr) -> (String, String) {
    let device = headers
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string());

    (device, ip_address)
}
