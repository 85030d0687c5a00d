//! Atlas control-plane client
//!
//! Thin adapter over the managed-database provider's administration API.
//! Cluster and database-user calls are accepted by the control plane and
//! completed by asynchronous backend jobs; callers observe completion by
//! polling [`AtlasApi::describe_cluster`], never by blocking.

pub mod client;
pub mod http;

pub use client::{
    AtlasApi, AtlasClusterState, AtlasError, ClusterSpec, ClusterView, CreatedCluster,
    CreatedDatabaseUser, DatabaseUserSpec, MockAtlasApi,
};
pub use http::{AtlasClientConfig, HttpAtlasClient};
