use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use hackdesk_db::entities::{atlas_cluster, atlas_database_user};

/// Cloud provider hosting a cluster
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudProvider {
    Aws,
    Gcp,
    Azure,
}

impl From<atlas_cluster::CloudProvider> for CloudProvider {
    fn from(provider: atlas_cluster::CloudProvider) -> Self {
        match provider {
            atlas_cluster::CloudProvider::Aws => CloudProvider::Aws,
            atlas_cluster::CloudProvider::Gcp => CloudProvider::Gcp,
            atlas_cluster::CloudProvider::Azure => CloudProvider::Azure,
        }
    }
}

/// Cluster lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    Provisioning,
    Active,
    Failed,
    Deleting,
    Deleted,
}

impl From<atlas_cluster::ClusterStatus> for ClusterStatus {
    fn from(status: atlas_cluster::ClusterStatus) -> Self {
        match status {
            atlas_cluster::ClusterStatus::Provisioning => ClusterStatus::Provisioning,
            atlas_cluster::ClusterStatus::Active => ClusterStatus::Active,
            atlas_cluster::ClusterStatus::Failed => ClusterStatus::Failed,
            atlas_cluster::ClusterStatus::Deleting => ClusterStatus::Deleting,
            atlas_cluster::ClusterStatus::Deleted => ClusterStatus::Deleted,
        }
    }
}

impl From<ClusterStatus> for atlas_cluster::ClusterStatus {
    fn from(status: ClusterStatus) -> Self {
        match status {
            ClusterStatus::Provisioning => atlas_cluster::ClusterStatus::Provisioning,
            ClusterStatus::Active => atlas_cluster::ClusterStatus::Active,
            ClusterStatus::Failed => atlas_cluster::ClusterStatus::Failed,
            ClusterStatus::Deleting => atlas_cluster::ClusterStatus::Deleting,
            ClusterStatus::Deleted => atlas_cluster::ClusterStatus::Deleted,
        }
    }
}

/// A provisioned cluster
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Cluster {
    /// Cluster record ID
    pub id: Uuid,
    /// Event the cluster belongs to
    pub event_id: Uuid,
    /// Team owning the cluster
    pub team_id: Uuid,
    /// Hackathon project the cluster backs, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
    /// External cluster name
    pub cluster_name: String,
    /// Cloud provider
    pub provider: CloudProvider,
    /// Provider region
    pub region: String,
    /// Instance tier
    pub tier: String,
    /// Lifecycle status
    pub status: ClusterStatus,
    /// Connection string, present once the cluster is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    /// User who requested the cluster
    pub provisioned_by: Uuid,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the control plane was last polled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_status_check: Option<DateTime<Utc>>,
}

impl From<atlas_cluster::Model> for Cluster {
    fn from(model: atlas_cluster::Model) -> Self {
        Self {
            id: model.id,
            event_id: model.event_id,
            team_id: model.team_id,
            project_id: model.project_id,
            cluster_name: model.cluster_name,
            provider: model.provider.into(),
            region: model.region,
            tier: model.tier,
            status: model.status.into(),
            connection_string: model.connection_string,
            provisioned_by: model.provisioned_by,
            created_at: model.created_at,
            last_status_check: model.last_status_check,
        }
    }
}

/// Request to provision a cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProvisionClusterRequest {
    /// Cloud provider; defaults to the event's configured provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Region; defaults to the event's configured region
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Instance tier; defaults to M0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    /// Hackathon project to attach the cluster to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
}

/// List of clusters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClusterList {
    pub clusters: Vec<Cluster>,
    pub total: usize,
}

/// Query parameters for listing clusters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterListQuery {
    pub event_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub status: Option<ClusterStatus>,
}

/// Refreshed cluster state after polling the control plane
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClusterStatusResponse {
    pub status: ClusterStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

/// Request to create a database user on a cluster
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDatabaseUserRequest {
    pub username: String,
    pub password: String,
    /// Database roles; defaults to readWrite
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A database user on a cluster (never includes credentials)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DatabaseUser {
    pub id: Uuid,
    pub cluster_id: Uuid,
    pub username: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<atlas_database_user::Model> for DatabaseUser {
    fn from(model: atlas_database_user::Model) -> Self {
        let roles = model.role_list();
        Self {
            id: model.id,
            cluster_id: model.cluster_id,
            username: model.username,
            roles,
            created_at: model.created_at,
        }
    }
}

/// One failed cluster deletion within a cleanup batch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CleanupFailure {
    pub cluster_id: Uuid,
    pub error: String,
}

/// Outcome of cleaning up one event's clusters
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CleanupReport {
    pub event_id: Uuid,
    pub clusters_found: usize,
    pub clusters_deleted: usize,
    pub errors: Vec<CleanupFailure>,
}

impl From<hackdesk_control::CleanupReport> for CleanupReport {
    fn from(report: hackdesk_control::CleanupReport) -> Self {
        Self {
            event_id: report.event_id,
            clusters_found: report.clusters_found,
            clusters_deleted: report.clusters_deleted,
            errors: report
                .errors
                .into_iter()
                .map(|failure| CleanupFailure {
                    cluster_id: failure.cluster_id,
                    error: failure.error,
                })
                .collect(),
        }
    }
}

/// Events a cleanup run would touch
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CleanupPreview {
    pub event_ids: Vec<Uuid>,
    pub total: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Stable machine-readable code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
