/// Token issuance and verification
///
/// Access and refresh tokens are HS256-signed JWTs carrying the subject id,
/// email, and the id of the session they were issued under. Each kind is
/// signed with its own secret and its own TTL, so a refresh token presented
/// where an access token is expected fails signature verification outright.

use crate::{
    config::AuthConfig,
    error::{GatewayError, GatewayResult},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Which of the two token kinds a codec operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims embedded in every issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Stable external identity id
    pub sub: String,
    pub email: String,
    /// Session the token is bound to
    pub sid: String,
    /// Issued-at (UTC Unix timestamp)
    pub iat: i64,
    /// Expiration (UTC Unix timestamp)
    pub exp: i64,
}

/// Signs and verifies session/refresh tokens
///
/// Pure function of the configured secrets, the input claims, and the wall
/// clock; no store access.
#[derive(Clone)]
pub struct TokenCodec {
    access_secret: String,
    refresh_secret: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenCodec {
    /// Create a codec from the authentication configuration
    pub fn new(auth: &AuthConfig) -> Self {
        Self {
            access_secret: auth.access_token_secret.clone(),
            refresh_secret: auth.refresh_token_secret.clone(),
            access_ttl_secs: auth.access_token_ttl_secs,
            refresh_ttl_secs: auth.refresh_token_ttl_secs,
        }
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    fn ttl_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        }
    }

    /// Issue a token of the given kind bound to a session
    pub fn issue(
        &self,
        kind: TokenKind,
        subject_id: &str,
        email: &str,
        session_id: &str,
    ) -> GatewayResult<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject_id.to_string(),
            email: email.to_string(),
            sid: session_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs(kind),
        };

        encode(
            &Header::default(), // HS256
            &claims,
            &EncodingKey::from_secret(self.secret(kind)),
        )
        .map_err(|e| GatewayError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Issue a short-lived access token
    pub fn issue_access(&self, subject_id: &str, email: &str, session_id: &str) -> GatewayResult<String> {
        self.issue(TokenKind::Access, subject_id, email, session_id)
    }

    /// Issue a long-lived refresh token
    pub fn issue_refresh(&self, subject_id: &str, email: &str, session_id: &str) -> GatewayResult<String> {
        self.issue(TokenKind::Refresh, subject_id, email, session_id)
    }

    /// Verify a token against the given kind's secret and return its claims
    ///
    /// Expiry of a well-formed token surfaces as `TokenExpired`; everything
    /// else (malformed, forged, wrong kind) collapses into `TokenInvalid` so
    /// a forged token is indistinguishable from a garbled one.
    pub fn verify(&self, token: &str, kind: TokenKind) -> GatewayResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(kind)),
            &Validation::default(), // HS256, validates exp
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => GatewayError::TokenExpired,
            _ => GatewayError::TokenInvalid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec() -> TokenCodec {
        TokenCodec {
            access_secret: "access-secret-that-is-long-enough-for-hmac".to_string(),
            refresh_secret: "refresh-secret-that-is-long-enough-for-hmac".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 604_800,
        }
    }

    #[test]
    fn test_issue_and_verify_access_token() {
        let codec = test_codec();
        let token = codec
            .issue_access("subject-1", "alice@example.com", "session-1")
            .expect("token issuance should succeed");

        let claims = codec
            .verify(&token, TokenKind::Access)
            .expect("verification should succeed");
        assert_eq!(claims.sub, "subject-1");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.sid, "session-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let codec = test_codec();
        let access = codec
            .issue_access("subject-1", "alice@example.com", "session-1")
            .unwrap();
        let refresh = codec
            .issue_refresh("subject-1", "alice@example.com", "session-1")
            .unwrap();

        // A refresh token checked as access (and vice versa) must look forged,
        // not expired.
        match codec.verify(&refresh, TokenKind::Access) {
            Err(GatewayError::TokenInvalid) => {}
            other => panic!("expected TokenInvalid, got {:?}", other.map(|c| c.sub)),
        }
        match codec.verify(&access, TokenKind::Refresh) {
            Err(GatewayError::TokenInvalid) => {}
            other => panic!("expected TokenInvalid, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_expired_token_is_distinguished() {
        let codec = test_codec();

        // Manually craft a token already past expiry, well beyond the default
        // 60-second leeway.
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "subject-1".to_string(),
            email: "alice@example.com".to_string(),
            sid: "session-1".to_string(),
            iat: now - 600,
            exp: now - 300,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(codec.access_secret.as_bytes()),
        )
        .unwrap();

        match codec.verify(&token, TokenKind::Access) {
            Err(GatewayError::TokenExpired) => {}
            other => panic!("expected TokenExpired, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let codec = test_codec();
        match codec.verify("not-a-jwt", TokenKind::Access) {
            Err(GatewayError::TokenInvalid) => {}
            other => panic!("expected TokenInvalid, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_pair_shares_session_id() {
        let codec = test_codec();
        let access = codec
            .issue_access("subject-1", "alice@example.com", "session-7")
            .unwrap();
        let refresh = codec
            .issue_refresh("subject-1", "alice@example.com", "session-7")
            .unwrap();

        let access_claims = codec.verify(&access, TokenKind::Access).unwrap();
        let refresh_claims = codec.verify(&refresh, TokenKind::Refresh).unwrap();
        assert_eq!(access_claims.sid, refresh_claims.sid);
    }
}
