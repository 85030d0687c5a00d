//! Cleanup service
//!
//! Batch teardown of clusters belonging to concluded events. Driven by an
//! external scheduler (cron invokes the CLI); nothing here owns a timer.
//! Per-cluster failures go into the report instead of aborting the batch,
//! so one stuck cluster cannot shield its siblings from cleanup.

use hackdesk_db::entities::{
    atlas_cluster::{self, ClusterStatus},
    event,
    event::EventStatus,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ControlError;
use crate::provision::ProvisioningService;

/// One failed cluster deletion within a batch
#[derive(Debug, Clone, Serialize)]
pub struct CleanupFailure {
    pub cluster_id: Uuid,
    pub error: String,
}

/// Outcome of cleaning up one event's clusters
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub event_id: Uuid,
    pub clusters_found: usize,
    pub clusters_deleted: usize,
    pub errors: Vec<CleanupFailure>,
}

/// Finds and tears down clusters of concluded events
#[derive(Clone)]
pub struct CleanupService {
    db: DatabaseConnection,
    provisioning: ProvisioningService,
}

impl CleanupService {
    pub fn new(db: DatabaseConnection, provisioning: ProvisioningService) -> Self {
        Self { db, provisioning }
    }

    /// Events eligible for cleanup: concluded, auto-cleanup enabled, and
    /// still holding at least one non-deleted cluster
    ///
    /// Read-only; this is also the dry-run primitive.
    pub async fn find_events_needing_cleanup(&self) -> Result<Vec<Uuid>, ControlError> {
        let candidates = event::Entity::find()
            .filter(event::Column::Status.eq(EventStatus::Concluded))
            .filter(event::Column::AtlasAutoCleanup.eq(true))
            .all(&self.db)
            .await?;

        let mut eligible = Vec::new();
        for candidate in candidates {
            let remaining = atlas_cluster::Entity::find()
                .filter(atlas_cluster::Column::EventId.eq(candidate.id))
                .filter(atlas_cluster::Column::Status.ne(ClusterStatus::Deleted))
                .count(&self.db)
                .await?;
            if remaining > 0 {
                eligible.push(candidate.id);
            }
        }

        Ok(eligible)
    }

    /// Tear down every non-deleted cluster of one event
    ///
    /// Never fails fast: each cluster is attempted and failures are
    /// collected into the report.
    pub async fn cleanup_event_clusters(
        &self,
        event_id: Uuid,
    ) -> Result<CleanupReport, ControlError> {
        let clusters = atlas_cluster::Entity::find()
            .filter(atlas_cluster::Column::EventId.eq(event_id))
            .filter(atlas_cluster::Column::Status.ne(ClusterStatus::Deleted))
            .all(&self.db)
            .await?;

        let clusters_found = clusters.len();
        let mut clusters_deleted = 0;
        let mut errors = Vec::new();

        for cluster in clusters {
            match self.provisioning.delete_cluster(cluster.id).await {
                Ok(()) => clusters_deleted += 1,
                Err(err) => {
                    warn!(
                        cluster = %cluster.cluster_name,
                        event = %event_id,
                        error = %err,
                        "Cleanup failed for cluster"
                    );
                    errors.push(CleanupFailure {
                        cluster_id: cluster.id,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            event = %event_id,
            found = clusters_found,
            deleted = clusters_deleted,
            failed = errors.len(),
            "Event cluster cleanup finished"
        );

        Ok(CleanupReport {
            event_id,
            clusters_found,
            clusters_deleted,
            errors,
        })
    }

    /// Clean up every eligible event, one report per event
    pub async fn run_scheduled_cleanup(&self) -> Result<Vec<CleanupReport>, ControlError> {
        let events = self.find_events_needing_cleanup().await?;
        info!(events = events.len(), "Scheduled cleanup starting");

        let mut reports = Vec::with_capacity(events.len());
        for event_id in events {
            reports.push(self.cleanup_event_clusters(event_id).await?);
        }

        Ok(reports)
    }
}
