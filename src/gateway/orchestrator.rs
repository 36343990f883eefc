/// Session orchestrator
///
/// Drives a login attempt through lock check, external verification, attempt
/// bookkeeping, account upsert, session allocation, and token issuance. The
/// backing store is the only shared mutable state; every step is an
/// individually atomic store operation and no lock is held across awaits.

use crate::{
    accounts::AccountStore,
    attempts::AttemptTracker,
    db::models::{Account, Session},
    error::{GatewayError, GatewayResult},
    gateway::{
        AccountView, IntrospectResponse, LoginRequest, LoginResponse, MeResponse,
        RefreshResponse, RegisterRequest, RegisterResponse, SessionView, ValidatedSession,
    },
    identity::{IdentityError, IdentityProvider},
    mailer::Mailer,
    sessions::SessionRegistry,
    tokens::{TokenCodec, TokenKind},
    validation,
};
use std::sync::Arc;

/// Coordinates the login/logout/refresh/verify protocol
pub struct SessionOrchestrator {
    accounts: AccountStore,
    sessions: SessionRegistry,
    attempts: AttemptTracker,
    codec: TokenCodec,
    provider: Arc<dyn IdentityProvider>,
    mailer: Arc<Mailer>,
}

impl SessionOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        accounts: AccountStore,
        sessions: SessionRegistry,
        attempts: AttemptTracker,
        codec: TokenCodec,
        provider: Arc<dyn IdentityProvider>,
        mailer: Arc<Mailer>,
    ) -> Self {
        Self {
            accounts,
            sessions,
            attempts,
            codec,
            provider,
            mailer,
        }
    }

    /// Authenticate a credential and open a new device session
    pub async fn login(
        &self,
        req: LoginRequest,
        device: &str,
        ip_address: &str,
    ) -> GatewayResult<LoginResponse> {
        let claimed_email = req.email.trim().to_ascii_lowercase();
        let known = self.accounts.get_by_email(&claimed_email).await?;
        let known_id = known.as_ref().map(|a| a.id.clone());

        // Lock check precedes the provider call: a locked account costs no
        // external verification and leaks no timing signal from it.
        if let Some(ref account) = known {
            if self.attempts.is_locked(account) {
                tracing::info!("Rejected login for locked account {}", claimed_email);
                return Err(GatewayError::LockedAccount);
            }
        }

        let identity = match self.provider.verify_credential(&req.credential).await {
            Ok(identity) => identity,
            Err(IdentityError::NotFound | IdentityError::Invalid) => {
                self.attempts
                    .record_failure(
                        &claimed_email,
                        known_id.as_deref(),
                        ip_address,
                        device,
                        "invalid credential",
                    )
                    .await?;
                crate::metrics::record_login("failure");
                return Err(GatewayError::InvalidCredential);
            }
            // Provider trouble is not a credential failure; surface it so the
            // transport layer can apply its retry policy.
            Err(e) => return Err(GatewayError::Upstream(e.to_string())),
        };

        // A valid credential belonging to a different identity is a
        // substitution attempt, not a typo.
        if !identity.email.eq_ignore_ascii_case(&claimed_email) {
            self.attempts
                .record_failure(
                    &claimed_email,
                    known_id.as_deref(),
                    ip_address,
                    device,
                    "identity mismatch",
                )
                .await?;
            crate::metrics::record_login("failure");
            return Err(GatewayError::IdentityMismatch);
        }

        if !identity.email_verified {
            return Err(GatewayError::EmailNotVerified);
        }

        let mut identity = identity;
        identity.email = claimed_email.clone();

        // Success: clear the failure history before any session exists for
        // this login.
        self.attempts.reset(&claimed_email).await?;

        let account = self.accounts.upsert_login(&identity).await?;
        let session = self.sessions.create(&account.id, device, ip_address).await?;

        let access_token =
            self.codec
                .issue_access(&account.subject_id, &account.email, &session.id)?;
        let refresh_token =
            self.codec
                .issue_refresh(&account.subject_id, &account.email, &session.id)?;

        crate::metrics::record_login("success");
        tracing::info!(
            "Login for {} from {} ({})",
            account.email,
            ip_address,
            device
        );

        Ok(LoginResponse {
            access_token,
            refresh_token,
            session_id: session.id,
            account: account.into(),
        })
    }

    /// Resolve an access token to its account and live session
    async fn authorize(&self, token: &str) -> GatewayResult<(Account, Session)> {
        let claims = self.codec.verify(token, TokenKind::Access)?;

        let account = self
            .accounts
            .get_by_subject(&claims.sub)
            .await?
            .ok_or_else(|| GatewayError::NotFound("Account not found".to_string()))?;

        // Cryptographic validity is not enough: a deactivated session means
        // the token is revoked.
        let session = self
            .sessions
            .find_active(&account.id, &claims.sid)
            .await?
            .ok_or(GatewayError::SessionRevoked)?;

        Ok((account, session))
    }

    /// Validate an access token and return the session it represents
    pub async fn validate_access(&self, token: &str) -> GatewayResult<ValidatedSession> {
        let (account, session) = self.authorize(token).await?;

        Ok(ValidatedSession {
            account_id: account.id,
            subject_id: account.subject_id,
            email: account.email,
            session_id: session.id,
        })
    }

    /// Single-device logout
    ///
    /// Revocation happens here; whatever cookie cleanup the transport layer
    /// does afterwards cannot affect it.
    pub async fn logout(&self, session: &ValidatedSession) -> GatewayResult<()> {
        self.sessions
            .deactivate(&session.account_id, &session.session_id)
            .await?;
        crate::metrics::record_revocation("single");
        tracing::info!("Session {} revoked", session.session_id);

        Ok(())
    }

    /// Logout-everywhere: revoke all of the account's sessions
    pub async fn logout_all(&self, session: &ValidatedSession) -> GatewayResult<u64> {
        let revoked = self.sessions.deactivate_all(&session.account_id).await?;
        crate::metrics::record_revocation("all");
        tracing::info!(
            "All sessions revoked for account {} ({} active)",
            session.account_id,
            revoked
        );

        Ok(revoked)
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The new access token is bound to the same session. The refresh token
    /// itself is not reissued: its original expiry is the hard ceiling on how
    /// long the chain can continue.
    pub async fn refresh(&self, refresh_token: &str) -> GatewayResult<RefreshResponse> {
        let claims = self.codec.verify(refresh_token, TokenKind::Refresh)?;

        let account = self
            .accounts
            .get_by_subject(&claims.sub)
            .await?
            .ok_or_else(|| GatewayError::NotFound("Account not found".to_string()))?;

        let session = self
            .sessions
            .find_active(&account.id, &claims.sid)
            .await?
            .ok_or(GatewayError::SessionRevoked)?;

        let access_token =
            self.codec
                .issue_access(&account.subject_id, &account.email, &session.id)?;
        crate::metrics::record_refresh();

        Ok(RefreshResponse {
            access_token,
            session_id: session.id,
        })
    }

    /// Service-to-service token introspection
    pub async fn introspect(&self, token: &str) -> GatewayResult<IntrospectResponse> {
        let (account, session) = self.authorize(token).await?;
        self.sessions.touch(&session.id).await?;

        Ok(IntrospectResponse {
            valid: true,
            account_id: account.id,
            subject_id: account.subject_id,
            email: account.email,
            session_id: session.id,
        })
    }

    /// Register a new account with the identity provider
    ///
    /// The account and provider records survive a failed verification email;
    /// the response only reports the delivery as not sent.
    pub async fn register(&self, req: RegisterRequest) -> GatewayResult<RegisterResponse> {
        let email = req.email.trim().to_ascii_lowercase();
        validation::validate_email(&email)?;
        validation::validate_password(&req.password)?;

        let identity = match self
            .provider
            .create_user(&email, &req.password, req.display_name.as_deref())
            .await
        {
            Ok(identity) => identity,
            Err(IdentityError::Conflict) => {
                return Err(GatewayError::Conflict(
                    "Email is already registered".to_string(),
                ))
            }
            Err(IdentityError::Invalid) => {
                return Err(GatewayError::Validation(
                    "Registration rejected by the identity provider".to_string(),
                ))
            }
            Err(e) => return Err(GatewayError::Upstream(e.to_string())),
        };

        let display_name = identity
            .display_name
            .as_deref()
            .or(req.display_name.as_deref());
        let account = self
            .accounts
            .create(&identity.subject_id, &email, display_name, false)
            .await?;

        let verification_sent = self
            .deliver_verification(&account.email, account.display_name.as_deref())
            .await;

        tracing::info!(
            "Registered account {} (verification sent: {})",
            account.email,
            verification_sent
        );

        Ok(RegisterResponse {
            account: account.into(),
            verification_sent,
        })
    }

    /// Send (or resend) a verification email for an existing account
    pub async fn send_verification(&self, email: &str) -> GatewayResult<()> {
        let email = email.trim().to_ascii_lowercase();
        let account = self
            .accounts
            .get_by_email(&email)
            .await?
            .ok_or_else(|| GatewayError::NotFound("Account not found".to_string()))?;

        let link = self
            .provider
            .email_verification_link(&account.email)
            .await
            .map_err(|e| match e {
                IdentityError::NotFound => GatewayError::NotFound("Account not found".to_string()),
                other => GatewayError::Upstream(other.to_string()),
            })?;

        self.mailer
            .send_verification_email(&account.email, account.display_name.as_deref(), &link)
            .await
    }

    /// Authenticated account overview with the device sessions
    pub async fn me(&self, session: &ValidatedSession) -> GatewayResult<MeResponse> {
        let account = self
            .accounts
            .get_by_subject(&session.subject_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound("Account not found".to_string()))?;

        let sessions = self
            .sessions
            .list_for_account(&account.id)
            .await?
            .into_iter()
            .map(SessionView::from)
            .collect();

        Ok(MeResponse {
            account: AccountView::from(account),
            sessions,
        })
    }

    /// Best-effort verification email; failure degrades the outcome only
    async fn deliver_verification(&self, email: &str, display_name: Option<&str>) -> bool {
        if !self.mailer.is_configured() {
            tracing::warn!("Email not configured, verification for {} not sent", email);
            return false;
        }

        let link = match self.provider.email_verification_link(email).await {
            Ok(link) => link,
            Err(e) => {
                tracing::warn!("Failed to obtain verification link for {}: {}", email, e);
                return false;
            }
        };

        match self
            .mailer
            .send_verification_email(email, display_name, &link)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to send verification email to {}: {}", email, e);
                false
            }
        }
    }
}
