//! Integration tests for hackdesk-db
//!
//! Tests database operations with real SQLite in-memory database

use chrono::Utc;
use hackdesk_db::{
    connect,
    entities::{
        atlas_cluster::{self, active_slot, CloudProvider, ClusterStatus},
        atlas_database_user, event,
        event::EventStatus,
        team, team_member, user,
    },
    migrate,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Helper to create a test database
async fn setup_test_db() -> DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

async fn seed_user(db: &DatabaseConnection, role: &str) -> user::Model {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        email: Set(format!("{}@example.com", id)),
        password_hash: Set("$argon2id$test".to_string()),
        full_name: Set(None),
        role: Set(role.to_string()),
        is_active: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

async fn seed_event(db: &DatabaseConnection, status: EventStatus) -> event::Model {
    let id = Uuid::new_v4();
    event::ActiveModel {
        id: Set(id),
        name: Set("Test Hackathon".to_string()),
        slug: Set(format!("test-{}", id)),
        description: Set(None),
        status: Set(status),
        starts_at: Set(Utc::now()),
        ends_at: Set(Utc::now()),
        atlas_enabled: Set(true),
        atlas_default_provider: Set("AWS".to_string()),
        atlas_default_region: Set("US_EAST_1".to_string()),
        atlas_open_network_access: Set(false),
        atlas_max_db_users_per_cluster: Set(5),
        atlas_auto_cleanup: Set(true),
        atlas_allowed_providers: Set("AWS,GCP".to_string()),
        atlas_allowed_regions: Set("US_EAST_1, EU_WEST_1".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert event")
}

async fn seed_team(db: &DatabaseConnection, event_id: Uuid, leader_id: Uuid) -> team::Model {
    team::ActiveModel {
        id: Set(Uuid::new_v4()),
        event_id: Set(event_id),
        name: Set("Rustaceans".to_string()),
        leader_id: Set(leader_id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert team")
}

fn cluster_model(event_id: Uuid, team_id: Uuid, provisioned_by: Uuid) -> atlas_cluster::ActiveModel {
    let id = Uuid::new_v4();
    atlas_cluster::ActiveModel {
        id: Set(id),
        event_id: Set(event_id),
        team_id: Set(team_id),
        project_id: Set(None),
        atlas_project_id: Set("5f1a2b3c4d5e6f7a8b9c0d1e".to_string()),
        cluster_name: Set(format!("hd-{:.8}", id.simple().to_string())),
        provider: Set(CloudProvider::Aws),
        region: Set("US_EAST_1".to_string()),
        tier: Set("M0".to_string()),
        status: Set(ClusterStatus::Provisioning),
        connection_string: Set(None),
        active_slot: Set(Some(active_slot(event_id, team_id))),
        provisioned_by: Set(provisioned_by),
        created_at: Set(Utc::now()),
        last_status_check: Set(None),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = sea_orm::ConnectionTrait::get_database_backend(&db);
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let result = migrate(&db).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_create_cluster_record() {
    let db = setup_test_db().await;

    let leader = seed_user(&db, "participant").await;
    let event = seed_event(&db, EventStatus::Published).await;
    let team = seed_team(&db, event.id, leader.id).await;

    let inserted = cluster_model(event.id, team.id, leader.id)
        .insert(&db)
        .await
        .expect("Failed to insert cluster");

    assert_eq!(inserted.status, ClusterStatus::Provisioning);
    assert_eq!(inserted.provider, CloudProvider::Aws);
    assert!(inserted.connection_string.is_none());
    assert_eq!(inserted.active_slot, Some(active_slot(event.id, team.id)));
}

#[tokio::test]
async fn test_active_slot_rejects_second_live_cluster() {
    let db = setup_test_db().await;

    let leader = seed_user(&db, "participant").await;
    let event = seed_event(&db, EventStatus::Published).await;
    let team = seed_team(&db, event.id, leader.id).await;

    cluster_model(event.id, team.id, leader.id)
        .insert(&db)
        .await
        .expect("Failed to insert first cluster");

    // Second live cluster for the same (event, team) must hit the unique index
    let err = cluster_model(event.id, team.id, leader.id)
        .insert(&db)
        .await
        .expect_err("Second live cluster should violate uniqueness");

    assert!(matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn test_released_slot_allows_replacement_cluster() {
    let db = setup_test_db().await;

    let leader = seed_user(&db, "participant").await;
    let event = seed_event(&db, EventStatus::Published).await;
    let team = seed_team(&db, event.id, leader.id).await;

    // A failed cluster holds no slot
    let mut failed = cluster_model(event.id, team.id, leader.id);
    failed.status = Set(ClusterStatus::Failed);
    failed.active_slot = Set(None);
    failed.insert(&db).await.expect("Failed to insert");

    // So a replacement can claim it
    let replacement = cluster_model(event.id, team.id, leader.id)
        .insert(&db)
        .await
        .expect("Replacement cluster should insert cleanly");

    assert_eq!(replacement.status, ClusterStatus::Provisioning);
}

#[tokio::test]
async fn test_query_clusters_by_status() {
    let db = setup_test_db().await;

    let leader = seed_user(&db, "participant").await;
    let event = seed_event(&db, EventStatus::Published).await;
    let team_a = seed_team(&db, event.id, leader.id).await;
    let team_b = seed_team(&db, event.id, leader.id).await;

    cluster_model(event.id, team_a.id, leader.id)
        .insert(&db)
        .await
        .expect("Failed to insert");

    let mut deleted = cluster_model(event.id, team_b.id, leader.id);
    deleted.status = Set(ClusterStatus::Deleted);
    deleted.active_slot = Set(None);
    deleted.insert(&db).await.expect("Failed to insert");

    let live = atlas_cluster::Entity::find()
        .filter(atlas_cluster::Column::EventId.eq(event.id))
        .filter(atlas_cluster::Column::Status.ne(ClusterStatus::Deleted))
        .all(&db)
        .await
        .expect("Failed to query");

    assert_eq!(live.len(), 1);
    assert_eq!(live[0].team_id, team_a.id);
}

#[tokio::test]
async fn test_database_user_unique_per_cluster() {
    let db = setup_test_db().await;

    let leader = seed_user(&db, "participant").await;
    let event = seed_event(&db, EventStatus::Published).await;
    let team = seed_team(&db, event.id, leader.id).await;
    let cluster = cluster_model(event.id, team.id, leader.id)
        .insert(&db)
        .await
        .expect("Failed to insert cluster");

    let db_user = atlas_database_user::ActiveModel {
        id: Set(Uuid::new_v4()),
        cluster_id: Set(cluster.id),
        username: Set("app".to_string()),
        password_hash: Set("$argon2id$test".to_string()),
        roles: Set("readWrite,dbAdmin".to_string()),
        created_at: Set(Utc::now()),
    };
    let inserted = db_user.insert(&db).await.expect("Failed to insert db user");
    assert_eq!(inserted.role_list(), vec!["readWrite", "dbAdmin"]);

    let duplicate = atlas_database_user::ActiveModel {
        id: Set(Uuid::new_v4()),
        cluster_id: Set(cluster.id),
        username: Set("app".to_string()),
        password_hash: Set("$argon2id$other".to_string()),
        roles: Set("read".to_string()),
        created_at: Set(Utc::now()),
    };
    let err = duplicate
        .insert(&db)
        .await
        .expect_err("Duplicate username on one cluster should fail");

    assert!(matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn test_database_users_cascade_with_cluster() {
    let db = setup_test_db().await;

    let leader = seed_user(&db, "participant").await;
    let event = seed_event(&db, EventStatus::Published).await;
    let team = seed_team(&db, event.id, leader.id).await;
    let cluster = cluster_model(event.id, team.id, leader.id)
        .insert(&db)
        .await
        .expect("Failed to insert cluster");

    atlas_database_user::ActiveModel {
        id: Set(Uuid::new_v4()),
        cluster_id: Set(cluster.id),
        username: Set("app".to_string()),
        password_hash: Set("$argon2id$test".to_string()),
        roles: Set("readWrite".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert db user");

    atlas_cluster::Entity::delete_by_id(cluster.id)
        .exec(&db)
        .await
        .expect("Failed to delete cluster");

    let remaining = atlas_database_user::Entity::find()
        .filter(atlas_database_user::Column::ClusterId.eq(cluster.id))
        .all(&db)
        .await
        .expect("Failed to query");

    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_event_config_accessors() {
    let db = setup_test_db().await;

    let event = seed_event(&db, EventStatus::Published).await;

    assert_eq!(event.allowed_providers(), vec!["AWS", "GCP"]);
    assert_eq!(event.allowed_regions(), vec!["US_EAST_1", "EU_WEST_1"]);
}

#[tokio::test]
async fn test_team_membership_round_trip() {
    let db = setup_test_db().await;

    let leader = seed_user(&db, "participant").await;
    let member = seed_user(&db, "participant").await;
    let event = seed_event(&db, EventStatus::Published).await;
    let team = seed_team(&db, event.id, leader.id).await;

    team_member::ActiveModel {
        team_id: Set(team.id),
        user_id: Set(member.id),
        joined_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .expect("Failed to insert membership");

    let found = team_member::Entity::find_by_id((team.id, member.id))
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("Membership not found");

    assert_eq!(found.user_id, member.id);
}
