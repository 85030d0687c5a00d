//! AtlasCluster entity for provisioned managed-database clusters
//!
//! One record per cluster provisioned through the Atlas control plane.
//! `active_slot` holds `"{event_id}:{team_id}"` while the cluster is live
//! (status not `deleted`/`failed`) and NULL otherwise; the unique index on
//! it enforces at most one live cluster per team per event at the database
//! layer, including under concurrent provision attempts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cloud provider hosting a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CloudProvider {
    #[sea_orm(string_value = "AWS")]
    Aws,

    #[sea_orm(string_value = "GCP")]
    Gcp,

    #[sea_orm(string_value = "AZURE")]
    Azure,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "AWS",
            CloudProvider::Gcp => "GCP",
            CloudProvider::Azure => "AZURE",
        }
    }
}

impl std::str::FromStr for CloudProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AWS" => Ok(CloudProvider::Aws),
            "GCP" => Ok(CloudProvider::Gcp),
            "AZURE" => Ok(CloudProvider::Azure),
            other => Err(format!("unknown cloud provider '{}'", other)),
        }
    }
}

/// Lifecycle status of a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ClusterStatus {
    /// Creation started at the control plane, not yet reachable
    #[sea_orm(string_value = "provisioning")]
    Provisioning,

    /// Cluster is up and has a connection string
    #[sea_orm(string_value = "active")]
    Active,

    /// Control plane reported a provisioning error
    #[sea_orm(string_value = "failed")]
    Failed,

    /// Teardown requested; external delete pending or being retried
    #[sea_orm(string_value = "deleting")]
    Deleting,

    /// Cluster no longer exists at the control plane
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

impl ClusterStatus {
    /// Whether the record occupies the per-team active slot
    pub fn is_live(&self) -> bool {
        !matches!(self, ClusterStatus::Deleted | ClusterStatus::Failed)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "atlas_clusters")]
pub struct Model {
    /// Cluster record UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Event the cluster was provisioned under
    pub event_id: Uuid,

    /// Team owning the cluster
    pub team_id: Uuid,

    /// Hackathon project the cluster backs, if any
    pub project_id: Option<Uuid>,

    /// External control-plane project (group) id
    pub atlas_project_id: String,

    /// External cluster name within the control-plane project
    pub cluster_name: String,

    /// Cloud provider
    pub provider: CloudProvider,

    /// Provider region
    pub region: String,

    /// Instance tier (e.g. "M0", "M10")
    pub tier: String,

    /// Lifecycle status
    pub status: ClusterStatus,

    /// Connection string; populated only while status is `active`
    #[sea_orm(column_type = "Text", nullable)]
    pub connection_string: Option<String>,

    /// Uniqueness key `"{event_id}:{team_id}"` while the cluster is live
    #[sea_orm(unique)]
    pub active_slot: Option<String>,

    /// User who requested the cluster
    pub provisioned_by: Uuid,

    /// When the record was created
    pub created_at: ChronoDateTimeUtc,

    /// When the control plane was last polled for this cluster
    pub last_status_check: Option<ChronoDateTimeUtc>,
}

/// Value of `active_slot` for a live cluster of the given team and event
pub fn active_slot(event_id: Uuid, team_id: Uuid) -> String {
    format!("{}:{}", event_id, team_id)
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Cluster belongs to an event
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Event,

    /// Cluster belongs to a team
    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Team,

    /// Cluster has database users
    #[sea_orm(has_many = "super::atlas_database_user::Entity")]
    DatabaseUsers,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::atlas_database_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DatabaseUsers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_provider_round_trip() {
        for (raw, provider) in [
            ("aws", CloudProvider::Aws),
            ("GCP", CloudProvider::Gcp),
            ("Azure", CloudProvider::Azure),
        ] {
            assert_eq!(CloudProvider::from_str(raw).unwrap(), provider);
        }
        assert!(CloudProvider::from_str("DIGITALOCEAN").is_err());
    }

    #[test]
    fn test_live_statuses() {
        assert!(ClusterStatus::Provisioning.is_live());
        assert!(ClusterStatus::Active.is_live());
        assert!(ClusterStatus::Deleting.is_live());
        assert!(!ClusterStatus::Failed.is_live());
        assert!(!ClusterStatus::Deleted.is_live());
    }
}
