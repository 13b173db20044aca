use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use reqwest::Url;
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidateEmail;

use super::credentials::{normalize_email, CredentialStore, NewUser, UserChanges};
use super::guard::AuthContext;
use super::jwt::TokenService;
use super::password::{burn_verification, hash_password, verify_password};
use super::provider::IdentityProvider;
use super::reconcile::IdentityReconciler;
use super::session::SessionStore;
use crate::config::Config;
use crate::error::AuthError;
use crate::logging::mask_email;
use crate::models::user::{self, PublicUser};

/// Token plus the public view of the user it was issued to.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthOutcome {
    pub token: String,
    pub user: PublicUser,
}

/// Fields a user may edit on their own profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    /// `Some("")` clears the avatar
    pub avatar_url: Option<String>,
}

/// Top-level authentication flows.
///
/// Every flow resolves the user first and only then issues a token and
/// records its session, so an aborted request never leaves a session
/// without an owner.
#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    tokens: Arc<TokenService>,
    reconciler: IdentityReconciler,
    provider: Option<Arc<dyn IdentityProvider>>,
    config: Arc<Config>,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        tokens: Arc<TokenService>,
        config: Arc<Config>,
    ) -> Self {
        AuthService {
            reconciler: IdentityReconciler::new(credentials.clone()),
            credentials,
            sessions,
            tokens,
            provider: None,
            config,
        }
    }

    /// Enable login through an identity provider.
    pub fn with_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    // ── Registration and login ──

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthOutcome, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        self.check_email_format(&email)?;
        self.check_password_policy(password)?;

        if self.credentials.find_by_email(&email).await?.is_some() {
            return Err(AuthError::Conflict("User already exists".to_string()));
        }

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => email.split('@').next().unwrap_or_default().to_string(),
        };

        let user = self
            .credentials
            .create(NewUser {
                email,
                password_hash: Some(hash_password(password)?),
                name,
                is_verified: false,
                ..Default::default()
            })
            .await
            .map_err(|e| match e {
                AuthError::Conflict(_) => AuthError::Conflict("User already exists".to_string()),
                other => other,
            })?;

        tracing::info!(user_id = %user.id, email = %mask_email(&user.email), "user registered");
        self.start_session(user).await
    }

    /// Password login. Unknown email, provider-only account and wrong
    /// password all fail with the same `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome, AuthError> {
        let email = normalize_email(email);
        let user = self.credentials.find_by_email(&email).await?;

        let user = match user {
            Some(user) => match user.password_hash.as_deref() {
                Some(digest) if verify_password(password, digest) => user,
                Some(_) => return Err(self.login_failed(&email)),
                None => {
                    burn_verification(password);
                    return Err(self.login_failed(&email));
                }
            },
            None => {
                burn_verification(password);
                return Err(self.login_failed(&email));
            }
        };

        if !user.is_active {
            tracing::info!(user_id = %user.id, "login refused for inactive account");
            return Err(AuthError::AccountInactive);
        }

        let user = self.stamp_login(&user.id).await?;
        tracing::info!(user_id = %user.id, "user logged in");
        self.start_session(user).await
    }

    fn login_failed(&self, email: &str) -> AuthError {
        tracing::info!(email = %mask_email(email), "failed login attempt");
        AuthError::InvalidCredentials
    }

    // ── Identity provider ──

    /// URL that starts the provider handshake.
    pub fn provider_login_url(&self) -> Result<String, AuthError> {
        Ok(self.provider()?.authorization_url())
    }

    /// Finish the handshake: exchange the code, reconcile the profile,
    /// then issue a token and session.
    pub async fn provider_login(&self, code: &str) -> Result<AuthOutcome, AuthError> {
        let provider = self.provider()?;
        if code.trim().is_empty() {
            return Err(AuthError::Validation(
                "Missing authorization code".to_string(),
            ));
        }

        let profile = provider.exchange(code).await.map_err(|e| {
            tracing::warn!(error = %e, "identity provider exchange failed");
            AuthError::InvalidCredentials
        })?;

        let user = self.reconciler.reconcile(&profile).await?;
        if !user.is_active {
            tracing::info!(user_id = %user.id, "provider login refused for inactive account");
            return Err(AuthError::AccountInactive);
        }

        tracing::info!(user_id = %user.id, "user logged in through identity provider");
        self.start_session(user).await
    }

    /// Front-end URL carrying the token and a compact user summary.
    pub fn provider_success_redirect(&self, outcome: &AuthOutcome) -> Result<String, AuthError> {
        let user = serde_json::json!({
            "id": outcome.user.id,
            "email": outcome.user.email,
            "name": outcome.user.name,
            "picture": outcome.user.avatar_url,
        });

        Url::parse_with_params(
            &self.config.frontend_url,
            &[
                ("token", outcome.token.as_str()),
                ("user", user.to_string().as_str()),
            ],
        )
        .map(String::from)
        .map_err(|e| AuthError::Internal(format!("Invalid FRONTEND_URL: {}", e)))
    }

    /// Front-end login page with an error code for a failed handshake.
    pub fn provider_failure_redirect(&self, error: &AuthError) -> String {
        let code = match error {
            AuthError::Conflict(_) => "account_exists",
            AuthError::AccountInactive => "account_inactive",
            AuthError::NotFound(_) => "provider_unavailable",
            AuthError::Validation(_) | AuthError::InvalidCredentials => "authentication_failed",
            _ => "server_error",
        };
        self.frontend_login_url(code)
    }

    /// Front-end login page with an arbitrary error code.
    pub fn frontend_login_url(&self, code: &str) -> String {
        let base = format!("{}/login", self.config.frontend_url.trim_end_matches('/'));
        match Url::parse_with_params(&base, &[("error", code)]) {
            Ok(url) => url.into(),
            Err(_) => base,
        }
    }

    fn provider(&self) -> Result<&Arc<dyn IdentityProvider>, AuthError> {
        self.provider.as_ref().ok_or_else(|| {
            AuthError::NotFound("Identity provider login is not configured".to_string())
        })
    }

    // ── Session lifecycle ──

    /// Revoke the session behind the current token.
    pub async fn logout(&self, ctx: &AuthContext) -> Result<(), AuthError> {
        self.sessions.delete_by_token(&ctx.token).await?;
        tracing::info!(user_id = %ctx.user_id, session_id = ctx.session_id, "user logged out");
        Ok(())
    }

    /// Revoke every session of the current user. Returns how many went.
    pub async fn logout_all(&self, ctx: &AuthContext) -> Result<u64, AuthError> {
        let revoked = self.sessions.delete_all_for_user(&ctx.user_id).await?;
        tracing::info!(user_id = %ctx.user_id, revoked, "user logged out everywhere");
        Ok(revoked)
    }

    // ── Profile ──

    pub async fn current_user(&self, ctx: &AuthContext) -> Result<PublicUser, AuthError> {
        Ok(self.load_user(&ctx.user_id).await?.into())
    }

    pub async fn update_profile(
        &self,
        ctx: &AuthContext,
        update: ProfileUpdate,
    ) -> Result<PublicUser, AuthError> {
        let name = match update.name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(AuthError::Validation("Name cannot be empty".to_string()));
                }
                Some(name)
            }
            None => None,
        };
        let avatar_url = update.avatar_url.map(|url| {
            let url = url.trim().to_string();
            (!url.is_empty()).then_some(url)
        });

        let user = self
            .credentials
            .update(
                &ctx.user_id,
                UserChanges {
                    name,
                    avatar_url,
                    ..Default::default()
                },
            )
            .await?;

        Ok(user.into())
    }

    /// Move the account to a new email. The account becomes unverified.
    pub async fn change_email(
        &self,
        ctx: &AuthContext,
        new_email: &str,
        password: Option<&str>,
    ) -> Result<PublicUser, AuthError> {
        let user = self.load_user(&ctx.user_id).await?;
        self.confirm_password(&user, password)?;

        let new_email = normalize_email(new_email);
        if new_email.is_empty() {
            return Err(AuthError::Validation("New email is required".to_string()));
        }
        self.check_email_format(&new_email)?;
        if new_email == user.email {
            return Err(AuthError::Validation(
                "New email must differ from the current one".to_string(),
            ));
        }

        if let Some(holder) = self.credentials.find_by_email(&new_email).await? {
            if holder.id != user.id {
                return Err(AuthError::Conflict("Email is already in use".to_string()));
            }
        }

        let updated = self
            .credentials
            .update(
                &user.id,
                UserChanges {
                    email: Some(new_email),
                    is_verified: Some(false),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e {
                AuthError::Conflict(_) => AuthError::Conflict("Email is already in use".to_string()),
                other => other,
            })?;

        tracing::info!(user_id = %updated.id, "email changed");
        Ok(updated.into())
    }

    /// Set a new password. Accounts that already have one must confirm it;
    /// provider-only accounts may set their first password directly.
    pub async fn change_password(
        &self,
        ctx: &AuthContext,
        current_password: Option<&str>,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.load_user(&ctx.user_id).await?;
        self.confirm_password(&user, current_password)?;
        self.check_password_policy(new_password)?;

        self.credentials
            .update(
                &user.id,
                UserChanges {
                    password_hash: Some(hash_password(new_password)?),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(user_id = %user.id, "password changed");
        Ok(())
    }

    /// Delete the account and, with it, every session it owns.
    pub async fn delete_account(
        &self,
        ctx: &AuthContext,
        confirmation: &str,
        password: Option<&str>,
    ) -> Result<(), AuthError> {
        if confirmation != self.config.account_deletion_phrase {
            return Err(AuthError::Validation(format!(
                "Type \"{}\" to confirm account deletion",
                self.config.account_deletion_phrase
            )));
        }

        let user = self.load_user(&ctx.user_id).await?;
        self.confirm_password(&user, password)?;

        if !self.credentials.delete(&user.id).await? {
            return Err(AuthError::NotFound("User not found".to_string()));
        }

        tracing::info!(user_id = %user.id, "account deleted");
        Ok(())
    }

    // ── Helpers ──

    /// Issue a token and record its session from the same instant, so the
    /// session expires exactly at the token's `exp`.
    async fn start_session(&self, user: user::Model) -> Result<AuthOutcome, AuthError> {
        let issued_at = Utc::now().trunc_subsecs(0);
        let token = self
            .tokens
            .issue_at(&user.id, &user.email, &user.name, issued_at)?;
        self.sessions
            .create_at(
                &user.id,
                &token,
                issued_at.naive_utc(),
                self.tokens.validity(),
            )
            .await?;

        Ok(AuthOutcome {
            token,
            user: user.into(),
        })
    }

    async fn stamp_login(&self, user_id: &str) -> Result<user::Model, AuthError> {
        self.credentials
            .update(
                user_id,
                UserChanges {
                    last_login_at: Some(Utc::now().naive_utc()),
                    ..Default::default()
                },
            )
            .await
    }

    async fn load_user(&self, user_id: &str) -> Result<user::Model, AuthError> {
        self.credentials
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))
    }

    fn confirm_password(&self, user: &user::Model, password: Option<&str>) -> Result<(), AuthError> {
        match user.password_hash.as_deref() {
            None => Ok(()),
            Some(digest) => match password {
                Some(p) if verify_password(p, digest) => Ok(()),
                _ => Err(AuthError::InvalidCredentials),
            },
        }
    }

    fn check_email_format(&self, email: &str) -> Result<(), AuthError> {
        if email.validate_email() {
            Ok(())
        } else {
            Err(AuthError::Validation("Email address is not valid".to_string()))
        }
    }

    fn check_password_policy(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.config.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        Ok(())
    }
}
