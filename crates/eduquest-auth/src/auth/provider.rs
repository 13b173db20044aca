use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Profile handed back by an identity provider after a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    /// Stable account id at the provider
    pub external_id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Request(String),

    #[error("provider rejected the authorization code: {0}")]
    Rejected(String),

    #[error("provider profile is incomplete: {0}")]
    IncompleteProfile(&'static str),
}

/// Capability interface to a redirect-based identity provider.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start the handshake.
    fn authorization_url(&self) -> String;

    /// Trade the callback's authorization code for the user's profile.
    async fn exchange(&self, code: &str) -> Result<ExternalProfile, ProviderError>;
}

/// Google OpenID Connect login.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    config: GoogleConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        GoogleProvider { config, client }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorization_url(&self) -> String {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.callback_url.as_str()),
            ("response_type", "code"),
            ("scope", "openid email profile"),
        ];

        match Url::parse_with_params(GOOGLE_AUTH_URL, &params) {
            Ok(url) => url.into(),
            Err(_) => GOOGLE_AUTH_URL.to_string(),
        }
    }

    async fn exchange(&self, code: &str) -> Result<ExternalProfile, ProviderError> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.callback_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, error = %body, "Google token exchange failed");
            return Err(ProviderError::Rejected(format!("HTTP {}", status)));
        }

        let tokens = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let response = self
            .client
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Request(format!(
                "userinfo returned HTTP {}",
                response.status()
            )));
        }

        let info = response
            .json::<UserInfo>()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let email = info.email.ok_or(ProviderError::IncompleteProfile("email"))?;

        Ok(ExternalProfile {
            external_id: info.sub,
            display_name: info.name.unwrap_or_else(|| email.clone()),
            email,
            avatar_url: info.picture,
        })
    }
}
