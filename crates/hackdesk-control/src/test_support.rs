//! Shared fixtures for service tests

use chrono::Utc;
use hackdesk_db::entities::{
    atlas_cluster::{self, active_slot, CloudProvider, ClusterStatus},
    event,
    event::EventStatus,
    team, team_member, user,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

pub(crate) async fn setup_db() -> DatabaseConnection {
    let db = hackdesk_db::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    hackdesk_db::migrate(&db).await.expect("Failed to migrate");

    db
}

pub(crate) async fn seed_user(db: &DatabaseConnection, role: &str) -> user::Model {
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

/// Published event with provisioning enabled, AWS/GCP in US_EAST_1/EU_WEST_1
pub(crate) async fn seed_event(db: &DatabaseConnection) -> event::Model {
    seed_event_with(db, EventStatus::Published, true, true).await
}

pub(crate) async fn seed_event_with(
    db: &DatabaseConnection,
    status: EventStatus,
    atlas_enabled: bool,
    auto_cleanup: bool,
) -> event::Model {
    let id = Uuid::new_v4();
    event::ActiveModel {
        id: Set(id),
        name: Set("Test Hackathon".to_string()),
        slug: Set(format!("test-{}", id)),
        description: Set(None),
        status: Set(status),
        starts_at: Set(Utc::now()),
        ends_at: Set(Utc::now()),
        atlas_enabled: Set(atlas_enabled),
        atlas_default_provider: Set("AWS".to_string()),
        atlas_default_region: Set("US_EAST_1".to_string()),
        atlas_open_network_access: Set(false),
        atlas_max_db_users_per_cluster: Set(2),
        atlas_auto_cleanup: Set(auto_cleanup),
        atlas_allowed_providers: Set("AWS,GCP".to_string()),
        atlas_allowed_regions: Set("US_EAST_1,EU_WEST_1".to_string()),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert event")
}

pub(crate) async fn seed_team(
    db: &DatabaseConnection,
    event: &event::Model,
    leader: &user::Model,
) -> team::Model {
    team::ActiveModel {
        id: Set(Uuid::new_v4()),
        event_id: Set(event.id),
        name: Set("Rustaceans".to_string()),
        leader_id: Set(leader.id),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert team")
}

pub(crate) async fn add_member(db: &DatabaseConnection, team: &team::Model, user: &user::Model) {
    team_member::ActiveModel {
        team_id: Set(team.id),
        user_id: Set(user.id),
        joined_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to insert membership");
}

pub(crate) async fn seed_cluster(
    db: &DatabaseConnection,
    event: &event::Model,
    team: &team::Model,
    provisioned_by: &user::Model,
    status: ClusterStatus,
) -> atlas_cluster::Model {
    let id = Uuid::new_v4();
    let slot = status
        .is_live()
        .then(|| active_slot(event.id, team.id));
    let connection_string = matches!(status, ClusterStatus::Active)
        .then(|| format!("mongodb+srv://hd-{}.example.mongodb.net", id.simple()));

    atlas_cluster::ActiveModel {
        id: Set(id),
        event_id: Set(event.id),
        team_id: Set(team.id),
        project_id: Set(None),
        atlas_project_id: Set("5f1a2b3c4d5e6f7a8b9c0d1e".to_string()),
        cluster_name: Set(format!("hd-{}", &id.simple().to_string()[..8])),
        provider: Set(CloudProvider::Aws),
        region: Set("US_EAST_1".to_string()),
        tier: Set("M0".to_string()),
        status: Set(status),
        connection_string: Set(connection_string),
        active_slot: Set(slot),
        provisioned_by: Set(provisioned_by.id),
        created_at: Set(Utc::now()),
        last_status_check: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to insert cluster")
}
