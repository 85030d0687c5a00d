//! User entity for platform accounts

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// User UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Email address (unique, used for login)
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 password hash (PHC string)
    pub password_hash: String,

    /// Display name
    pub full_name: Option<String>,

    /// Platform role ("admin", "organizer", "judge", "participant")
    pub role: String,

    /// Whether the account is active
    pub is_active: bool,

    /// When the account was created
    pub created_at: ChronoDateTimeUtc,

    /// When the account was last updated
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Teams led by this user
    #[sea_orm(has_many = "super::team::Entity")]
    LedTeams,

    /// Team memberships
    #[sea_orm(has_many = "super::team_member::Entity")]
    Memberships,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedTeams.def()
    }
}

impl Related<super::team_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
