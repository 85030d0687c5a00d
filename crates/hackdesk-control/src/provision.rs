//! Provisioning service
//!
//! Orchestrates cluster creation and teardown against the control plane.
//! Creation is validated against the event's provisioning config and the
//! one-live-cluster-per-team rule; the `active_slot` unique index is the
//! authoritative guard for the latter, the application-level check only
//! fails fast. Records are created in `provisioning` state and reach
//! `active` via the status service, never here.

use std::str::FromStr;
use std::sync::Arc;

use hackdesk_atlas::{AtlasApi, AtlasError, ClusterSpec, DatabaseUserSpec};
use hackdesk_auth::hash_password;
use hackdesk_db::entities::{
    atlas_cluster::{self, active_slot, CloudProvider, ClusterStatus},
    atlas_database_user, event, team,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ControlError;

/// Requested cluster placement; unset fields fall back to the event config
#[derive(Debug, Clone, Default)]
pub struct ClusterRequest {
    pub provider: Option<String>,
    pub region: Option<String>,
    pub tier: Option<String>,
    /// Hackathon project the cluster backs, if any
    pub project_id: Option<Uuid>,
}

/// Filter for listing cluster records
#[derive(Debug, Clone, Default)]
pub struct ClusterFilter {
    pub event_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub status: Option<ClusterStatus>,
}

/// Orchestrates cluster creation and teardown
#[derive(Clone)]
pub struct ProvisioningService {
    db: DatabaseConnection,
    atlas: Arc<dyn AtlasApi>,
    atlas_project_id: String,
}

impl ProvisioningService {
    pub fn new(db: DatabaseConnection, atlas: Arc<dyn AtlasApi>, atlas_project_id: String) -> Self {
        Self {
            db,
            atlas,
            atlas_project_id,
        }
    }

    /// Provision a cluster for a team under an event
    ///
    /// Starts the external creation job and persists a record in
    /// `provisioning` state. On control-plane failure nothing is persisted.
    pub async fn provision_cluster(
        &self,
        event_id: Uuid,
        team_id: Uuid,
        requested_by: Uuid,
        request: ClusterRequest,
    ) -> Result<atlas_cluster::Model, ControlError> {
        let event = event::Entity::find_by_id(event_id)
            .one(&self.db)
            .await?
            .ok_or(ControlError::NotFound("event"))?;

        let team = team::Entity::find_by_id(team_id)
            .one(&self.db)
            .await?
            .ok_or(ControlError::NotFound("team"))?;
        if team.event_id != event.id {
            return Err(ControlError::NotFound("team"));
        }

        if !event.atlas_enabled {
            return Err(ControlError::FeatureDisabled);
        }

        let provider_raw = request
            .provider
            .unwrap_or_else(|| event.atlas_default_provider.clone())
            .to_uppercase();
        if !event.allowed_providers().contains(&provider_raw) {
            return Err(ControlError::InvalidConfig(format!(
                "provider '{}' is not allowed for this event",
                provider_raw
            )));
        }
        let provider = CloudProvider::from_str(&provider_raw).map_err(ControlError::InvalidConfig)?;

        let region = request
            .region
            .unwrap_or_else(|| event.atlas_default_region.clone())
            .to_uppercase();
        if !event.allowed_regions().contains(&region) {
            return Err(ControlError::InvalidConfig(format!(
                "region '{}' is not allowed for this event",
                region
            )));
        }

        let tier = request.tier.unwrap_or_else(|| "M0".to_string());

        // Fast-path duplicate check; the unique index below is authoritative
        let existing = atlas_cluster::Entity::find()
            .filter(atlas_cluster::Column::EventId.eq(event.id))
            .filter(atlas_cluster::Column::TeamId.eq(team.id))
            .filter(
                atlas_cluster::Column::Status
                    .is_not_in([ClusterStatus::Deleted, ClusterStatus::Failed]),
            )
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(ControlError::Conflict);
        }

        let id = Uuid::new_v4();
        let cluster_name = format!("hd-{}", &id.simple().to_string()[..8]);
        let spec = ClusterSpec {
            name: cluster_name.clone(),
            provider: provider.as_str().to_string(),
            region: region.clone(),
            tier: tier.clone(),
            open_network_access: event.atlas_open_network_access,
        };

        self.atlas
            .create_cluster(&self.atlas_project_id, &spec)
            .await
            .map_err(|err| ControlError::ProvisioningFailed(err.to_string()))?;

        let record = atlas_cluster::ActiveModel {
            id: Set(id),
            event_id: Set(event.id),
            team_id: Set(team.id),
            project_id: Set(request.project_id),
            atlas_project_id: Set(self.atlas_project_id.clone()),
            cluster_name: Set(cluster_name.clone()),
            provider: Set(provider),
            region: Set(region),
            tier: Set(tier),
            status: Set(ClusterStatus::Provisioning),
            connection_string: Set(None),
            active_slot: Set(Some(active_slot(event.id, team.id))),
            provisioned_by: Set(requested_by),
            created_at: Set(Utc::now()),
            last_status_check: Set(None),
        };

        match record.insert(&self.db).await {
            Ok(model) => {
                info!(
                    cluster = %cluster_name,
                    event = %event.id,
                    team = %team.id,
                    "Cluster provisioning started"
                );
                Ok(model)
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // Lost the race to a concurrent provision; tear down the
                // external cluster this call started
                if let Err(cleanup_err) = self
                    .atlas
                    .delete_cluster(&self.atlas_project_id, &cluster_name)
                    .await
                {
                    warn!(
                        cluster = %cluster_name,
                        error = %cleanup_err,
                        "Failed to delete cluster created by losing provision attempt"
                    );
                }
                Err(ControlError::Conflict)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Tear down a cluster: external delete first, then the record is
    /// marked `deleted`
    ///
    /// The record is moved to `deleting` before the external call so a
    /// concurrent status refresh cannot resurrect it. If the external
    /// delete fails the record stays `deleting` for a later retry; it is
    /// never reverted. Deleting an already-deleted cluster is a no-op.
    pub async fn delete_cluster(&self, cluster_id: Uuid) -> Result<(), ControlError> {
        let cluster = atlas_cluster::Entity::find_by_id(cluster_id)
            .one(&self.db)
            .await?
            .ok_or(ControlError::NotFound("cluster"))?;

        if cluster.status == ClusterStatus::Deleted {
            return Ok(());
        }

        let marked = atlas_cluster::Entity::update_many()
            .set(atlas_cluster::ActiveModel {
                status: Set(ClusterStatus::Deleting),
                ..Default::default()
            })
            .filter(atlas_cluster::Column::Id.eq(cluster.id))
            .filter(atlas_cluster::Column::Status.ne(ClusterStatus::Deleted))
            .exec(&self.db)
            .await?;
        if marked.rows_affected == 0 {
            // Deleted concurrently
            return Ok(());
        }

        match self
            .atlas
            .delete_cluster(&cluster.atlas_project_id, &cluster.cluster_name)
            .await
        {
            Ok(()) => {}
            // Already gone externally counts as success
            Err(AtlasError::NotFound) => {}
            Err(err) => {
                warn!(
                    cluster = %cluster.cluster_name,
                    error = %err,
                    "External cluster deletion failed; record kept in deleting state"
                );
                return Err(ControlError::DeletionFailed(err.to_string()));
            }
        }

        atlas_cluster::Entity::update_many()
            .set(atlas_cluster::ActiveModel {
                status: Set(ClusterStatus::Deleted),
                connection_string: Set(None),
                active_slot: Set(None),
                ..Default::default()
            })
            .filter(atlas_cluster::Column::Id.eq(cluster.id))
            .exec(&self.db)
            .await?;

        info!(cluster = %cluster.cluster_name, "Cluster deleted");

        Ok(())
    }

    /// Fetch a single cluster record
    pub async fn get_cluster(&self, cluster_id: Uuid) -> Result<atlas_cluster::Model, ControlError> {
        atlas_cluster::Entity::find_by_id(cluster_id)
            .one(&self.db)
            .await?
            .ok_or(ControlError::NotFound("cluster"))
    }

    /// List cluster records matching the filter, newest first
    pub async fn list_clusters(
        &self,
        filter: ClusterFilter,
    ) -> Result<Vec<atlas_cluster::Model>, ControlError> {
        let mut condition = Condition::all();
        if let Some(event_id) = filter.event_id {
            condition = condition.add(atlas_cluster::Column::EventId.eq(event_id));
        }
        if let Some(team_id) = filter.team_id {
            condition = condition.add(atlas_cluster::Column::TeamId.eq(team_id));
        }
        if let Some(status) = filter.status {
            condition = condition.add(atlas_cluster::Column::Status.eq(status));
        }

        let clusters = atlas_cluster::Entity::find()
            .filter(condition)
            .order_by_desc(atlas_cluster::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(clusters)
    }

    /// Create a database user on an active cluster
    ///
    /// The plaintext password goes to the control plane once; only its
    /// Argon2 hash is stored locally.
    pub async fn create_database_user(
        &self,
        cluster_id: Uuid,
        username: String,
        password: String,
        roles: Vec<String>,
    ) -> Result<atlas_database_user::Model, ControlError> {
        let cluster = self.get_cluster(cluster_id).await?;

        if cluster.status != ClusterStatus::Active {
            return Err(ControlError::ClusterNotReady);
        }

        let event = event::Entity::find_by_id(cluster.event_id)
            .one(&self.db)
            .await?
            .ok_or(ControlError::NotFound("event"))?;

        let user_count = atlas_database_user::Entity::find()
            .filter(atlas_database_user::Column::ClusterId.eq(cluster.id))
            .count(&self.db)
            .await?;
        if user_count >= event.atlas_max_db_users_per_cluster as u64 {
            return Err(ControlError::UserLimitReached(
                event.atlas_max_db_users_per_cluster,
            ));
        }

        let roles = if roles.is_empty() {
            vec!["readWrite".to_string()]
        } else {
            roles
        };

        let spec = DatabaseUserSpec {
            username: username.clone(),
            password: password.clone(),
            roles: roles.clone(),
        };
        self.atlas
            .create_database_user(&cluster.atlas_project_id, &spec)
            .await
            .map_err(|err| match err {
                AtlasError::Api { status: 409, .. } => ControlError::Conflict,
                other => ControlError::ProvisioningFailed(other.to_string()),
            })?;

        let record = atlas_database_user::ActiveModel {
            id: Set(Uuid::new_v4()),
            cluster_id: Set(cluster.id),
            username: Set(username.clone()),
            password_hash: Set(hash_password(&password)?),
            roles: Set(roles.join(",")),
            created_at: Set(Utc::now()),
        };

        match record.insert(&self.db).await {
            Ok(model) => {
                info!(cluster = %cluster.cluster_name, username = %username, "Database user created");
                Ok(model)
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ControlError::Conflict)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete a database user from a cluster
    ///
    /// Not-found at the control plane is tolerated; a missing local record
    /// is reported so callers can 404.
    pub async fn delete_database_user(
        &self,
        cluster_id: Uuid,
        username: &str,
    ) -> Result<(), ControlError> {
        let cluster = self.get_cluster(cluster_id).await?;

        match self
            .atlas
            .delete_database_user(&cluster.atlas_project_id, username)
            .await
        {
            Ok(()) | Err(AtlasError::NotFound) => {}
            Err(err) => return Err(ControlError::DeletionFailed(err.to_string())),
        }

        let deleted = atlas_database_user::Entity::delete_many()
            .filter(atlas_database_user::Column::ClusterId.eq(cluster.id))
            .filter(atlas_database_user::Column::Username.eq(username))
            .exec(&self.db)
            .await?;

        if deleted.rows_affected == 0 {
            return Err(ControlError::NotFound("database user"));
        }

        info!(cluster = %cluster.cluster_name, username = %username, "Database user deleted");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        seed_cluster, seed_event, seed_event_with, seed_team, seed_user, setup_db,
    };
    use hackdesk_atlas::{CreatedCluster, CreatedDatabaseUser, MockAtlasApi};
    use hackdesk_db::entities::event::EventStatus;

    const PROJECT: &str = "5f1a2b3c4d5e6f7a8b9c0d1e";

    fn service(db: &DatabaseConnection, atlas: MockAtlasApi) -> ProvisioningService {
        ProvisioningService::new(db.clone(), Arc::new(atlas), PROJECT.to_string())
    }

    fn accepting_create() -> MockAtlasApi {
        let mut atlas = MockAtlasApi::new();
        atlas.expect_create_cluster().times(1).returning(|_, spec| {
            Ok(CreatedCluster {
                external_id: spec.name.clone(),
            })
        });
        atlas
    }

    #[tokio::test]
    async fn test_provision_creates_provisioning_record() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;

        let service = service(&db, accepting_create());
        let cluster = service
            .provision_cluster(event.id, team.id, leader.id, ClusterRequest::default())
            .await
            .expect("Provisioning should succeed");

        assert_eq!(cluster.status, ClusterStatus::Provisioning);
        assert_eq!(cluster.provider, CloudProvider::Aws);
        assert_eq!(cluster.region, "US_EAST_1");
        assert_eq!(cluster.tier, "M0");
        assert!(cluster.connection_string.is_none());
        assert_eq!(cluster.active_slot, Some(active_slot(event.id, team.id)));
        assert_eq!(cluster.provisioned_by, leader.id);
        assert!(cluster.cluster_name.starts_with("hd-"));
    }

    #[tokio::test]
    async fn test_provision_honors_requested_placement() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;

        let service = service(&db, accepting_create());
        let cluster = service
            .provision_cluster(
                event.id,
                team.id,
                leader.id,
                ClusterRequest {
                    provider: Some("gcp".to_string()),
                    region: Some("eu_west_1".to_string()),
                    tier: Some("M10".to_string()),
                    project_id: None,
                },
            )
            .await
            .expect("Provisioning should succeed");

        assert_eq!(cluster.provider, CloudProvider::Gcp);
        assert_eq!(cluster.region, "EU_WEST_1");
        assert_eq!(cluster.tier, "M10");
    }

    #[tokio::test]
    async fn test_provision_fails_when_feature_disabled() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event_with(&db, EventStatus::Published, false, true).await;
        let team = seed_team(&db, &event, &leader).await;

        // No expectations: any control-plane call would panic the mock
        let service = service(&db, MockAtlasApi::new());
        let result = service
            .provision_cluster(event.id, team.id, leader.id, ClusterRequest::default())
            .await;

        assert!(matches!(result, Err(ControlError::FeatureDisabled)));
    }

    #[tokio::test]
    async fn test_provision_rejects_disallowed_provider() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await; // allows AWS,GCP
        let team = seed_team(&db, &event, &leader).await;

        let service = service(&db, MockAtlasApi::new());
        let result = service
            .provision_cluster(
                event.id,
                team.id,
                leader.id,
                ClusterRequest {
                    provider: Some("AZURE".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ControlError::InvalidConfig(_))));

        // No record was created
        let count = atlas_cluster::Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_provision_rejects_disallowed_region() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;

        let service = service(&db, MockAtlasApi::new());
        let result = service
            .provision_cluster(
                event.id,
                team.id,
                leader.id,
                ClusterRequest {
                    region: Some("AP_SOUTHEAST_2".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(ControlError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_provision_conflicts_with_live_cluster() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;
        seed_cluster(&db, &event, &team, &leader, ClusterStatus::Provisioning).await;

        let service = service(&db, MockAtlasApi::new());
        let result = service
            .provision_cluster(event.id, team.id, leader.id, ClusterRequest::default())
            .await;

        assert!(matches!(result, Err(ControlError::Conflict)));
    }

    #[tokio::test]
    async fn test_provision_allowed_after_failed_cluster() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;
        seed_cluster(&db, &event, &team, &leader, ClusterStatus::Failed).await;

        let service = service(&db, accepting_create());
        let result = service
            .provision_cluster(event.id, team.id, leader.id, ClusterRequest::default())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_provision_persists_nothing_on_external_failure() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;

        let mut atlas = MockAtlasApi::new();
        atlas.expect_create_cluster().times(1).returning(|_, _| {
            Err(AtlasError::Api {
                status: 503,
                detail: "maintenance".to_string(),
            })
        });

        let service = service(&db, atlas);
        let result = service
            .provision_cluster(event.id, team.id, leader.id, ClusterRequest::default())
            .await;

        assert!(matches!(result, Err(ControlError::ProvisioningFailed(_))));

        let count = atlas_cluster::Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_provision_unknown_event_is_not_found() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;

        let service = service(&db, MockAtlasApi::new());
        let result = service
            .provision_cluster(
                Uuid::new_v4(),
                Uuid::new_v4(),
                leader.id,
                ClusterRequest::default(),
            )
            .await;

        assert!(matches!(result, Err(ControlError::NotFound("event"))));
    }

    #[tokio::test]
    async fn test_delete_marks_record_deleted() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;
        let cluster = seed_cluster(&db, &event, &team, &leader, ClusterStatus::Active).await;

        let mut atlas = MockAtlasApi::new();
        atlas
            .expect_delete_cluster()
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service(&db, atlas);
        service
            .delete_cluster(cluster.id)
            .await
            .expect("Delete should succeed");

        let record = atlas_cluster::Entity::find_by_id(cluster.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, ClusterStatus::Deleted);
        assert!(record.connection_string.is_none());
        assert!(record.active_slot.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;
        let cluster = seed_cluster(&db, &event, &team, &leader, ClusterStatus::Active).await;

        let mut atlas = MockAtlasApi::new();
        // Only the first call reaches the control plane
        atlas
            .expect_delete_cluster()
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service(&db, atlas);
        service.delete_cluster(cluster.id).await.unwrap();
        service
            .delete_cluster(cluster.id)
            .await
            .expect("Second delete should be a no-op");
    }

    #[tokio::test]
    async fn test_delete_tolerates_external_not_found() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;
        let cluster = seed_cluster(&db, &event, &team, &leader, ClusterStatus::Provisioning).await;

        let mut atlas = MockAtlasApi::new();
        atlas
            .expect_delete_cluster()
            .times(1)
            .returning(|_, _| Err(AtlasError::NotFound));

        let service = service(&db, atlas);
        service
            .delete_cluster(cluster.id)
            .await
            .expect("Not-found on delete counts as success");

        let record = atlas_cluster::Entity::find_by_id(cluster.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, ClusterStatus::Deleted);
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_record_deleting() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;
        let cluster = seed_cluster(&db, &event, &team, &leader, ClusterStatus::Active).await;

        let mut atlas = MockAtlasApi::new();
        atlas.expect_delete_cluster().times(1).returning(|_, _| {
            Err(AtlasError::Api {
                status: 500,
                detail: "internal".to_string(),
            })
        });

        let service = service(&db, atlas);
        let result = service.delete_cluster(cluster.id).await;
        assert!(matches!(result, Err(ControlError::DeletionFailed(_))));

        // Kept for retry, never reverted to active
        let record = atlas_cluster::Entity::find_by_id(cluster.id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, ClusterStatus::Deleting);
    }

    #[tokio::test]
    async fn test_delete_unknown_cluster_is_not_found() {
        let db = setup_db().await;

        let service = service(&db, MockAtlasApi::new());
        let result = service.delete_cluster(Uuid::new_v4()).await;

        assert!(matches!(result, Err(ControlError::NotFound("cluster"))));
    }

    #[tokio::test]
    async fn test_list_clusters_filters() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event_a = seed_event(&db).await;
        let event_b = seed_event(&db).await;
        let team_a = seed_team(&db, &event_a, &leader).await;
        let team_b = seed_team(&db, &event_b, &leader).await;
        seed_cluster(&db, &event_a, &team_a, &leader, ClusterStatus::Active).await;
        seed_cluster(&db, &event_b, &team_b, &leader, ClusterStatus::Deleted).await;

        let service = service(&db, MockAtlasApi::new());

        let all = service.list_clusters(ClusterFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let for_event = service
            .list_clusters(ClusterFilter {
                event_id: Some(event_a.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_event.len(), 1);

        let active = service
            .list_clusters(ClusterFilter {
                status: Some(ClusterStatus::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].event_id, event_a.id);
    }

    #[tokio::test]
    async fn test_create_database_user_requires_active_cluster() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;
        let cluster = seed_cluster(&db, &event, &team, &leader, ClusterStatus::Provisioning).await;

        let service = service(&db, MockAtlasApi::new());
        let result = service
            .create_database_user(
                cluster.id,
                "app".to_string(),
                "s3cret-pass".to_string(),
                vec![],
            )
            .await;

        assert!(matches!(result, Err(ControlError::ClusterNotReady)));
    }

    #[tokio::test]
    async fn test_create_database_user_stores_hash() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;
        let cluster = seed_cluster(&db, &event, &team, &leader, ClusterStatus::Active).await;

        let mut atlas = MockAtlasApi::new();
        atlas
            .expect_create_database_user()
            .times(1)
            .returning(|_, spec| {
                Ok(CreatedDatabaseUser {
                    username: spec.username.clone(),
                })
            });

        let service = service(&db, atlas);
        let user = service
            .create_database_user(
                cluster.id,
                "app".to_string(),
                "s3cret-pass".to_string(),
                vec![],
            )
            .await
            .expect("User creation should succeed");

        assert_eq!(user.username, "app");
        assert_eq!(user.roles, "readWrite");
        assert_ne!(user.password_hash, "s3cret-pass");
        assert!(hackdesk_auth::verify_password("s3cret-pass", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_create_database_user_enforces_limit() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await; // limit = 2
        let team = seed_team(&db, &event, &leader).await;
        let cluster = seed_cluster(&db, &event, &team, &leader, ClusterStatus::Active).await;

        let mut atlas = MockAtlasApi::new();
        atlas
            .expect_create_database_user()
            .times(2)
            .returning(|_, spec| {
                Ok(CreatedDatabaseUser {
                    username: spec.username.clone(),
                })
            });

        let service = service(&db, atlas);
        for username in ["first", "second"] {
            service
                .create_database_user(
                    cluster.id,
                    username.to_string(),
                    "s3cret-pass".to_string(),
                    vec![],
                )
                .await
                .expect("Within limit");
        }

        let result = service
            .create_database_user(
                cluster.id,
                "third".to_string(),
                "s3cret-pass".to_string(),
                vec![],
            )
            .await;

        assert!(matches!(result, Err(ControlError::UserLimitReached(2))));
    }

    #[tokio::test]
    async fn test_delete_database_user() {
        let db = setup_db().await;
        let leader = seed_user(&db, "participant").await;
        let event = seed_event(&db).await;
        let team = seed_team(&db, &event, &leader).await;
        let cluster = seed_cluster(&db, &event, &team, &leader, ClusterStatus::Active).await;

        let mut atlas = MockAtlasApi::new();
        atlas
            .expect_create_database_user()
            .returning(|_, spec| {
                Ok(CreatedDatabaseUser {
                    username: spec.username.clone(),
                })
            });
        atlas
            .expect_delete_database_user()
            .times(2)
            .returning(|_, _| Ok(()));

        let service = service(&db, atlas);
        service
            .create_database_user(
                cluster.id,
                "app".to_string(),
                "s3cret-pass".to_string(),
                vec![],
            )
            .await
            .unwrap();

        service
            .delete_database_user(cluster.id, "app")
            .await
            .expect("Delete should succeed");

        // Second delete: control plane tolerated, local row gone
        let result = service.delete_database_user(cluster.id, "app").await;
        assert!(matches!(
            result,
            Err(ControlError::NotFound("database user"))
        ));
    }
}
