use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User entity: one canonical account per identity.
///
/// A user carries at least one authentication method: a password hash,
/// a Google account id, or both.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Absent for accounts created through an identity provider
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub name: String,

    pub avatar_url: Option<String>,

    #[sea_orm(unique)]
    pub google_id: Option<String>,

    pub is_active: bool,

    pub is_verified: bool,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_login_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session::Entity")]
    Sessions,
}

impl Related<super::session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Public user data (safe to return in API responses).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
    pub is_verified: bool,
    /// False for accounts that can only sign in through an identity provider
    pub has_password: bool,
    pub created_at: NaiveDateTime,
    pub last_login_at: Option<NaiveDateTime>,
}

impl From<Model> for PublicUser {
    fn from(user: Model) -> Self {
        PublicUser {
            has_password: user.has_password(),
            id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            is_verified: user.is_verified,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}
