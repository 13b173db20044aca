use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};

use crate::error::AuthError;
use crate::models::session;

/// Hash a bearer token for storage (hex SHA-256).
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Server-side session records keyed by bearer token.
///
/// Deletions are idempotent, so the periodic sweep and per-request expiry
/// checks may run concurrently without coordination.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Record `token` for `user_id`, expiring `validity` after `issued_at`.
    async fn create_at(
        &self,
        user_id: &str,
        token: &str,
        issued_at: NaiveDateTime,
        validity: Duration,
    ) -> Result<session::Model, AuthError>;

    /// Record `token` for `user_id`, expiring `validity` from now.
    async fn create(
        &self,
        user_id: &str,
        token: &str,
        validity: Duration,
    ) -> Result<session::Model, AuthError> {
        self.create_at(user_id, token, Utc::now().naive_utc(), validity)
            .await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<session::Model>, AuthError>;

    /// Returns whether a session was removed.
    async fn delete_by_token(&self, token: &str) -> Result<bool, AuthError>;

    /// Returns the number of sessions removed.
    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AuthError>;

    /// Delete every session whose expiry is strictly before `now`.
    async fn purge_expired(&self, now: NaiveDateTime) -> Result<u64, AuthError>;
}

/// [`SessionStore`] backed by the `sessions` table.
#[derive(Clone)]
pub struct SeaSessionStore {
    db: DatabaseConnection,
}

impl SeaSessionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        SeaSessionStore { db }
    }
}

#[async_trait::async_trait]
impl SessionStore for SeaSessionStore {
    async fn create_at(
        &self,
        user_id: &str,
        token: &str,
        issued_at: NaiveDateTime,
        validity: Duration,
    ) -> Result<session::Model, AuthError> {
        let model = session::ActiveModel {
            user_id: Set(user_id.to_string()),
            token_hash: Set(hash_token(token)),
            expires_at: Set(issued_at + validity),
            created_at: Set(issued_at),
            ..Default::default()
        };

        model
            .insert(&self.db)
            .await
            .map_err(|e| AuthError::from_write(e, "Session already exists for this token"))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<session::Model>, AuthError> {
        let found = session::Entity::find()
            .filter(session::Column::TokenHash.eq(hash_token(token)))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool, AuthError> {
        let res = session::Entity::delete_many()
            .filter(session::Column::TokenHash.eq(hash_token(token)))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn delete_all_for_user(&self, user_id: &str) -> Result<u64, AuthError> {
        let res = session::Entity::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    async fn purge_expired(&self, now: NaiveDateTime) -> Result<u64, AuthError> {
        let res = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }
}
