use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::error::AuthError;
use crate::models::{session, user};

/// Trim and lowercase an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Fields for a new user record.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub name: String,
    pub avatar_url: Option<String>,
    pub google_id: Option<String>,
    pub is_verified: bool,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
    pub last_login_at: Option<NaiveDateTime>,
}

/// Owner of user identity records.
///
/// Email and Google id are unique; writes that would break that fail
/// with [`AuthError::Conflict`].
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AuthError>;

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<user::Model>, AuthError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<user::Model>, AuthError>;

    async fn create(&self, new_user: NewUser) -> Result<user::Model, AuthError>;

    async fn update(&self, id: &str, changes: UserChanges) -> Result<user::Model, AuthError>;

    /// Remove the user together with all of their sessions.
    /// Returns whether a user was removed.
    async fn delete(&self, id: &str) -> Result<bool, AuthError>;
}

/// [`CredentialStore`] backed by the `users` table.
#[derive(Clone)]
pub struct SeaCredentialStore {
    db: DatabaseConnection,
}

impl SeaCredentialStore {
    pub fn new(db: DatabaseConnection) -> Self {
        SeaCredentialStore { db }
    }
}

const DUPLICATE_ACCOUNT: &str = "An account with this email or external identity already exists";

#[async_trait::async_trait]
impl CredentialStore for SeaCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AuthError> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<user::Model>, AuthError> {
        let found = user::Entity::find()
            .filter(user::Column::GoogleId.eq(external_id))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<user::Model>, AuthError> {
        Ok(user::Entity::find_by_id(id.to_string()).one(&self.db).await?)
    }

    async fn create(&self, new_user: NewUser) -> Result<user::Model, AuthError> {
        if new_user.password_hash.is_none() && new_user.google_id.is_none() {
            return Err(AuthError::Validation(
                "A user needs a password or an external identity".to_string(),
            ));
        }

        let now = Utc::now().naive_utc();
        let model = user::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            email: Set(normalize_email(&new_user.email)),
            password_hash: Set(new_user.password_hash),
            name: Set(new_user.name),
            avatar_url: Set(new_user.avatar_url),
            google_id: Set(new_user.google_id),
            is_active: Set(true),
            is_verified: Set(new_user.is_verified),
            created_at: Set(now),
            updated_at: Set(now),
            last_login_at: Set(None),
        };

        model
            .insert(&self.db)
            .await
            .map_err(|e| AuthError::from_write(e, DUPLICATE_ACCOUNT))
    }

    async fn update(&self, id: &str, changes: UserChanges) -> Result<user::Model, AuthError> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

        let mut active: user::ActiveModel = existing.into();
        if let Some(email) = changes.email {
            active.email = Set(normalize_email(&email));
        }
        if let Some(hash) = changes.password_hash {
            active.password_hash = Set(Some(hash));
        }
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(avatar_url) = changes.avatar_url {
            active.avatar_url = Set(avatar_url);
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(is_verified) = changes.is_verified {
            active.is_verified = Set(is_verified);
        }
        if let Some(at) = changes.last_login_at {
            active.last_login_at = Set(Some(at));
        }
        active.updated_at = Set(Utc::now().naive_utc());

        active
            .update(&self.db)
            .await
            .map_err(|e| AuthError::from_write(e, DUPLICATE_ACCOUNT))
    }

    async fn delete(&self, id: &str) -> Result<bool, AuthError> {
        let txn = self.db.begin().await?;

        session::Entity::delete_many()
            .filter(session::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        let res = user::Entity::delete_by_id(id.to_string()).exec(&txn).await?;

        txn.commit().await?;
        Ok(res.rows_affected > 0)
    }
}
