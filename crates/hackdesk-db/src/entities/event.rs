//! Event entity for hackathons
//!
//! Each event embeds its Atlas provisioning config (the `atlas_*` columns),
//! which governs what the provisioning service permits for clusters created
//! under that event.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum EventStatus {
    /// Event is being set up, not yet visible
    #[sea_orm(string_value = "draft")]
    Draft,

    /// Event is open for registration and running
    #[sea_orm(string_value = "published")]
    Published,

    /// Event has ended
    #[sea_orm(string_value = "concluded")]
    Concluded,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    /// Event UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Event name
    pub name: String,

    /// URL-friendly slug (unique)
    #[sea_orm(unique)]
    pub slug: String,

    /// Event description
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Lifecycle status
    pub status: EventStatus,

    /// When the event starts
    pub starts_at: ChronoDateTimeUtc,

    /// When the event ends
    pub ends_at: ChronoDateTimeUtc,

    /// Whether Atlas cluster provisioning is enabled for this event
    pub atlas_enabled: bool,

    /// Default cloud provider for new clusters ("AWS", "GCP", "AZURE")
    pub atlas_default_provider: String,

    /// Default region for new clusters
    pub atlas_default_region: String,

    /// Whether provisioned clusters allow access from anywhere (0.0.0.0/0)
    pub atlas_open_network_access: bool,

    /// Maximum database users allowed per cluster
    pub atlas_max_db_users_per_cluster: i32,

    /// Whether clusters are torn down automatically when the event concludes
    pub atlas_auto_cleanup: bool,

    /// Comma-separated list of providers teams may choose from
    pub atlas_allowed_providers: String,

    /// Comma-separated list of regions teams may choose from
    pub atlas_allowed_regions: String,

    /// When the event was created
    pub created_at: ChronoDateTimeUtc,
}

impl Model {
    /// Providers teams may choose from, parsed from the stored list
    pub fn allowed_providers(&self) -> Vec<String> {
        split_list(&self.atlas_allowed_providers)
    }

    /// Regions teams may choose from, parsed from the stored list
    pub fn allowed_regions(&self) -> Vec<String> {
        split_list(&self.atlas_allowed_regions)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Teams registered for this event
    #[sea_orm(has_many = "super::team::Entity")]
    Teams,

    /// Clusters provisioned under this event
    #[sea_orm(has_many = "super::atlas_cluster::Entity")]
    Clusters,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teams.def()
    }
}

impl Related<super::atlas_cluster::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clusters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
