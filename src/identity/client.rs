/// HTTP client for the external identity provider
use super::{IdentityError, IdentityProvider, VerifiedIdentity};
use crate::config::IdentityProviderConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity provider reached over its REST API
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Wire format for identity claims
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityPayload {
    subject_id: String,
    email: String,
    display_name: Option<String>,
    email_verified: bool,
}

impl From<IdentityPayload> for VerifiedIdentity {
    fn from(payload: IdentityPayload) -> Self {
        VerifiedIdentity {
            subject_id: payload.subject_id,
            email: payload.email,
            display_name: payload.display_name,
            email_verified: payload.email_verified,
        }
    }
}

#[derive(Debug, Serialize)]
struct VerifyCredentialBody<'a> {
    token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserBody<'a> {
    email: &'a str,
    password: &'a str,
    display_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct VerificationLinkBody<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerificationLinkPayload {
    link: String,
}

impl HttpIdentityProvider {
    /// Create a client from configuration
    pub fn new(config: &IdentityProviderConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IdentityError::Unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.post(format!("{}{}", self.base_url, path));
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    async fn parse_identity(
        response: reqwest::Response,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let payload: IdentityPayload = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("Malformed provider response: {}", e)))?;
        Ok(payload.into())
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_credential(&self, credential: &str) -> Result<VerifiedIdentity, IdentityError> {
        let response = self
            .request("/v1/credentials/verify")
            .json(&VerifyCredentialBody { token: credential })
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(IdentityError::NotFound),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(IdentityError::Invalid),
            status if status.is_success() => Self::parse_identity(response).await,
            status => Err(IdentityError::Unavailable(format!(
                "Provider returned {}",
                status
            ))),
        }
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let response = self
            .request("/v1/users")
            .json(&CreateUserBody {
                email,
                password,
                display_name,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::CONFLICT => Err(IdentityError::Conflict),
            StatusCode::BAD_REQUEST => Err(IdentityError::Invalid),
            status if status.is_success() => Self::parse_identity(response).await,
            status => Err(IdentityError::Unavailable(format!(
                "Provider returned {}",
                status
            ))),
        }
    }

    async fn email_verification_link(&self, email: &str) -> Result<String, IdentityError> {
        let response = self
            .request("/v1/users/verification-link")
            .json(&VerificationLinkBody { email })
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(IdentityError::NotFound),
            status if status.is_success() => {
                let payload: VerificationLinkPayload = response.json().await.map_err(|e| {
                    IdentityError::Unavailable(format!("Malformed provider response: {}", e))
                })?;
                Ok(payload.link)
            }
            status => Err(IdentityError::Unavailable(format!(
                "Provider returned {}",
                status
            ))),
        }
    }
}
