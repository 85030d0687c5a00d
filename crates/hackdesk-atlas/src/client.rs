//! Control-plane API contract and typed errors

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Control-plane errors
#[derive(Debug, Error)]
pub enum AtlasError {
    /// The cluster or database user does not exist at the control plane.
    /// Callers treat this as success for deletes and as the deleted-state
    /// signal for describes.
    #[error("Resource not found at control plane")]
    NotFound,

    #[error("Control plane rejected credentials")]
    Unauthorized,

    #[error("Control plane error ({status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected control plane response: {0}")]
    InvalidResponse(String),
}

/// Raw cluster state vocabulary reported by the control plane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtlasClusterState {
    /// Cluster is ready to serve connections
    Idle,
    /// Initial provisioning job running
    Creating,
    /// Configuration change in progress
    Updating,
    /// Node replacement in progress
    Repairing,
    /// Provisioning job failed
    Error,
    /// Teardown job running
    Deleting,
    /// Cluster is gone
    Deleted,
    /// Vocabulary we do not recognize
    Other(String),
}

impl AtlasClusterState {
    /// Parse the provider's `stateName` value, case-insensitively
    pub fn parse(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "IDLE" => AtlasClusterState::Idle,
            "CREATING" => AtlasClusterState::Creating,
            "UPDATING" => AtlasClusterState::Updating,
            "REPAIRING" => AtlasClusterState::Repairing,
            "ERROR" => AtlasClusterState::Error,
            "DELETING" => AtlasClusterState::Deleting,
            "DELETED" => AtlasClusterState::Deleted,
            _ => AtlasClusterState::Other(raw.to_string()),
        }
    }
}

/// Request to create a cluster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Cluster name (external identity within the project)
    pub name: String,
    /// Cloud provider ("AWS", "GCP", "AZURE")
    pub provider: String,
    /// Provider region
    pub region: String,
    /// Instance tier (e.g. "M0", "M10")
    pub tier: String,
    /// Whether to open the project access list to 0.0.0.0/0
    pub open_network_access: bool,
}

/// Result of starting cluster creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCluster {
    /// External cluster id assigned by the control plane
    pub external_id: String,
}

/// Snapshot of a cluster's external state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterView {
    pub state: AtlasClusterState,
    /// SRV connection string, once the cluster is reachable
    pub connection_string: Option<String>,
}

/// Request to create a database user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseUserSpec {
    pub username: String,
    pub password: String,
    /// Database roles (e.g. "readWrite", "dbAdmin")
    pub roles: Vec<String>,
}

/// Result of creating a database user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDatabaseUser {
    pub username: String,
}

/// Control-plane operations used by the lifecycle services
///
/// All calls are fire-and-forget against asynchronous backend jobs: they
/// return once the control plane accepts the request, not when the job
/// completes.
#[automock]
#[async_trait]
pub trait AtlasApi: Send + Sync {
    /// Start cluster creation in the given control-plane project
    async fn create_cluster(
        &self,
        project_id: &str,
        spec: &ClusterSpec,
    ) -> Result<CreatedCluster, AtlasError>;

    /// Fetch the current external state of a cluster
    async fn describe_cluster(
        &self,
        project_id: &str,
        cluster_name: &str,
    ) -> Result<ClusterView, AtlasError>;

    /// Start cluster deletion
    async fn delete_cluster(&self, project_id: &str, cluster_name: &str)
        -> Result<(), AtlasError>;

    /// Create a database user in the project
    async fn create_database_user(
        &self,
        project_id: &str,
        spec: &DatabaseUserSpec,
    ) -> Result<CreatedDatabaseUser, AtlasError>;

    /// Delete a database user from the project
    async fn delete_database_user(
        &self,
        project_id: &str,
        username: &str,
    ) -> Result<(), AtlasError>;
}
