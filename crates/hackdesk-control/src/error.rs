//! Error taxonomy for the lifecycle services
//!
//! Each variant is distinct so the route layer can map it to the right
//! response code without inspecting messages.

use hackdesk_auth::PasswordError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    /// No authenticated caller
    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated, but lacking the required team role
    #[error("Caller is not authorized for this team")]
    Forbidden,

    /// A referenced record (team, event, cluster, database user) is missing
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Cluster provisioning is switched off for the event
    #[error("Cluster provisioning is not enabled for this event")]
    FeatureDisabled,

    /// Requested provider/region is outside the event's allowed lists
    #[error("Invalid cluster configuration: {0}")]
    InvalidConfig(String),

    /// The team already has a live cluster for this event
    #[error("Team already has an active cluster for this event")]
    Conflict,

    /// Database users can only be managed on an active cluster
    #[error("Cluster is not active")]
    ClusterNotReady,

    /// The event's per-cluster database-user quota is exhausted
    #[error("Cluster already has the maximum of {0} database users")]
    UserLimitReached(i32),

    /// The control plane rejected or failed a create call
    #[error("Cluster provisioning failed: {0}")]
    ProvisioningFailed(String),

    /// The control plane rejected or failed a delete call
    #[error("Cluster deletion failed: {0}")]
    DeletionFailed(String),

    /// The control plane could not be polled for status
    #[error("Status check failed: {0}")]
    StatusCheckFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Password hashing error: {0}")]
    Password(#[from] PasswordError),
}
