use std::sync::Arc;

use chrono::Utc;

use super::credentials::{normalize_email, CredentialStore, NewUser, UserChanges};
use super::provider::ExternalProfile;
use crate::error::AuthError;
use crate::logging::mask_email;
use crate::models::user;

/// Maps an identity-provider profile onto exactly one local user.
#[derive(Clone)]
pub struct IdentityReconciler {
    credentials: Arc<dyn CredentialStore>,
}

impl IdentityReconciler {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        IdentityReconciler { credentials }
    }

    /// Find the user linked to `profile`, creating one on first login.
    ///
    /// Known users only get their last-login stamped; display fields are
    /// left as the user last edited them. A new profile whose email is
    /// already taken by another account is refused with `Conflict`; the
    /// two are never merged.
    pub async fn reconcile(&self, profile: &ExternalProfile) -> Result<user::Model, AuthError> {
        if profile.external_id.trim().is_empty() {
            return Err(AuthError::Validation(
                "Identity provider returned no account id".to_string(),
            ));
        }
        if profile.email.trim().is_empty() {
            return Err(AuthError::Validation(
                "Identity provider returned no email".to_string(),
            ));
        }

        if let Some(existing) = self
            .credentials
            .find_by_external_id(&profile.external_id)
            .await?
        {
            return self.stamp_login(existing).await;
        }

        let email = normalize_email(&profile.email);
        if self.credentials.find_by_email(&email).await?.is_some() {
            tracing::warn!(
                email = %mask_email(&email),
                "provider login refused: email belongs to another account"
            );
            return Err(AuthError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let name = match profile.display_name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };

        let created = self
            .credentials
            .create(NewUser {
                email,
                password_hash: None,
                name,
                avatar_url: profile.avatar_url.clone(),
                google_id: Some(profile.external_id.clone()),
                is_verified: true,
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "created account from identity provider");
                self.stamp_login(user).await
            }
            // A concurrent callback for the same profile won the insert.
            Err(AuthError::Conflict(msg)) => {
                match self
                    .credentials
                    .find_by_external_id(&profile.external_id)
                    .await?
                {
                    Some(existing) => self.stamp_login(existing).await,
                    None => Err(AuthError::Conflict(msg)),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn stamp_login(&self, user: user::Model) -> Result<user::Model, AuthError> {
        self.credentials
            .update(
                &user.id,
                UserChanges {
                    last_login_at: Some(Utc::now().naive_utc()),
                    ..Default::default()
                },
            )
            .await
    }
}
