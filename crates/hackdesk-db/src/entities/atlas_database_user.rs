//! Database users provisioned on an Atlas cluster
//!
//! Grows and shrinks independently of the cluster lifecycle. Only the
//! Argon2 hash of the user's password is stored; the plaintext goes to the
//! control plane once at creation and is never persisted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "atlas_database_users")]
pub struct Model {
    /// Record UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Cluster this user belongs to
    pub cluster_id: Uuid,

    /// Database username (unique within the cluster)
    pub username: String,

    /// Argon2 password hash (PHC string)
    pub password_hash: String,

    /// Comma-separated database roles (e.g. "readWrite,dbAdmin")
    pub roles: String,

    /// When the user was created
    pub created_at: ChronoDateTimeUtc,
}

impl Model {
    /// Roles parsed from the stored list
    pub fn role_list(&self) -> Vec<String> {
        self.roles
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Database user belongs to a cluster
    #[sea_orm(
        belongs_to = "super::atlas_cluster::Entity",
        from = "Column::ClusterId",
        to = "super::atlas_cluster::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Cluster,
}

impl Related<super::atlas_cluster::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cluster.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
