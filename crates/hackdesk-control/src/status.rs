//! Status reconciliation service
//!
//! Polls the control plane for a cluster's real state and folds it into
//! the local record. Purely request-driven: callers poll at their own
//! interval while a cluster is provisioning. Every transition is a
//! conditional update keyed on the current status, so a record that a
//! concurrent delete has moved to `deleting` is never resurrected.

use std::sync::Arc;

use hackdesk_atlas::{AtlasApi, AtlasClusterState, AtlasError};
use hackdesk_db::entities::atlas_cluster::{self, ClusterStatus};
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ControlError;

/// The refreshed state returned to callers
///
/// Callers must use this pair (or re-read the record) rather than trusting
/// whatever copy they held before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRefresh {
    pub status: ClusterStatus,
    pub connection_string: Option<String>,
}

/// Reconciles local cluster records with the control plane
#[derive(Clone)]
pub struct StatusService {
    db: DatabaseConnection,
    atlas: Arc<dyn AtlasApi>,
}

impl StatusService {
    pub fn new(db: DatabaseConnection, atlas: Arc<dyn AtlasApi>) -> Self {
        Self { db, atlas }
    }

    /// Poll the control plane and update the local record
    ///
    /// State machine: `provisioning` becomes `active` when the cluster is
    /// ready (first-observed connection string persisted) or `failed` on a
    /// provisioning error; any state becomes `deleted` when the control
    /// plane no longer knows the cluster; `active` is stable and only has
    /// its connection string refreshed. `last_status_check` is stamped on
    /// every call.
    pub async fn refresh_cluster_status(
        &self,
        cluster_id: Uuid,
    ) -> Result<StatusRefresh, ControlError> {
        let cluster = atlas_cluster::Entity::find_by_id(cluster_id)
            .one(&self.db)
            .await?
            .ok_or(ControlError::NotFound("cluster"))?;

        let now = Utc::now();

        // Terminal locally; nothing to poll
        if cluster.status == ClusterStatus::Deleted {
            self.stamp_checked(cluster.id).await?;
            return Ok(StatusRefresh {
                status: ClusterStatus::Deleted,
                connection_string: None,
            });
        }

        let described = self
            .atlas
            .describe_cluster(&cluster.atlas_project_id, &cluster.cluster_name)
            .await;

        match described {
            Ok(view) => {
                debug!(
                    cluster = %cluster.cluster_name,
                    state = ?view.state,
                    "Control plane state observed"
                );
                match view.state {
                    AtlasClusterState::Idle => {
                        // Ready: provisioning completes, or an active
                        // cluster picks up a rotated connection string
                        let mut patch = atlas_cluster::ActiveModel {
                            status: Set(ClusterStatus::Active),
                            last_status_check: Set(Some(now)),
                            ..Default::default()
                        };
                        if view.connection_string.is_some() {
                            patch.connection_string = Set(view.connection_string.clone());
                        }
                        let updated = atlas_cluster::Entity::update_many()
                            .set(patch)
                            .filter(atlas_cluster::Column::Id.eq(cluster.id))
                            .filter(atlas_cluster::Column::Status.is_in([
                                ClusterStatus::Provisioning,
                                ClusterStatus::Active,
                            ]))
                            .exec(&self.db)
                            .await?;
                        if updated.rows_affected > 0
                            && cluster.status == ClusterStatus::Provisioning
                        {
                            info!(cluster = %cluster.cluster_name, "Cluster became active");
                        }
                        if updated.rows_affected == 0 {
                            // Deleting or failed meanwhile; only stamp
                            self.stamp_checked(cluster.id).await?;
                        }
                    }
                    AtlasClusterState::Error => {
                        let updated = atlas_cluster::Entity::update_many()
                            .set(atlas_cluster::ActiveModel {
                                status: Set(ClusterStatus::Failed),
                                connection_string: Set(None),
                                active_slot: Set(None),
                                last_status_check: Set(Some(now)),
                                ..Default::default()
                            })
                            .filter(atlas_cluster::Column::Id.eq(cluster.id))
                            .filter(
                                atlas_cluster::Column::Status.eq(ClusterStatus::Provisioning),
                            )
                            .exec(&self.db)
                            .await?;
                        if updated.rows_affected > 0 {
                            info!(cluster = %cluster.cluster_name, "Cluster provisioning failed");
                        } else {
                            self.stamp_checked(cluster.id).await?;
                        }
                    }
                    AtlasClusterState::Deleted => {
                        self.mark_deleted(cluster.id, now).await?;
                    }
                    AtlasClusterState::Creating
                    | AtlasClusterState::Updating
                    | AtlasClusterState::Repairing
                    | AtlasClusterState::Deleting
                    | AtlasClusterState::Other(_) => {
                        // Still in flight; no transition
                        self.stamp_checked(cluster.id).await?;
                    }
                }
            }
            // Gone externally: legitimate terminal signal, not an error
            Err(AtlasError::NotFound) => {
                info!(cluster = %cluster.cluster_name, "Cluster no longer exists at control plane");
                self.mark_deleted(cluster.id, now).await?;
            }
            Err(err) => {
                self.stamp_checked(cluster.id).await?;
                return Err(ControlError::StatusCheckFailed(err.to_string()));
            }
        }

        let fresh = atlas_cluster::Entity::find_by_id(cluster.id)
            .one(&self.db)
            .await?
            .ok_or(ControlError::NotFound("cluster"))?;

        Ok(StatusRefresh {
            status: fresh.status,
            connection_string: fresh.connection_string,
        })
    }

    async fn stamp_checked(&self, cluster_id: Uuid) -> Result<(), ControlError> {
        atlas_cluster::Entity::update_many()
            .set(atlas_cluster::ActiveModel {
                last_status_check: Set(Some(Utc::now())),
                ..Default::default()
            })
            .filter(atlas_cluster::Column::Id.eq(cluster_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn mark_deleted(
        &self,
        cluster_id: Uuid,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), ControlError> {
        atlas_cluster::Entity::update_many()
            .set(atlas_cluster::ActiveModel {
                status: Set(ClusterStatus::Deleted),
                connection_string: Set(None),
                active_slot: Set(None),
                last_status_check: Set(Some(now)),
                ..Default::default()
            })
            .filter(atlas_cluster::Column::Id.eq(cluster_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }
}
