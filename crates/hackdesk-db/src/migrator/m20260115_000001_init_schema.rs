//! Consolidated initial schema migration

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(string_len_null(User::FullName, 255))
                    .col(
                        string_len(User::Role, 32)
                            .not_null()
                            .default("participant"),
                    )
                    .col(boolean(User::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(User::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_email")
                    .table(User::Table)
                    .col(User::Email)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create events table (embeds Atlas provisioning config)
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(uuid(Event::Id).primary_key())
                    .col(string_len(Event::Name, 255).not_null())
                    .col(string_len(Event::Slug, 255).not_null().unique_key())
                    .col(text_null(Event::Description))
                    .col(string_len(Event::Status, 32).not_null().default("draft"))
                    .col(timestamp_with_time_zone(Event::StartsAt).not_null())
                    .col(timestamp_with_time_zone(Event::EndsAt).not_null())
                    .col(boolean(Event::AtlasEnabled).not_null().default(false))
                    .col(
                        string_len(Event::AtlasDefaultProvider, 16)
                            .not_null()
                            .default("AWS"),
                    )
                    .col(
                        string_len(Event::AtlasDefaultRegion, 64)
                            .not_null()
                            .default("US_EAST_1"),
                    )
                    .col(
                        boolean(Event::AtlasOpenNetworkAccess)
                            .not_null()
                            .default(false),
                    )
                    .col(
                        integer(Event::AtlasMaxDbUsersPerCluster)
                            .not_null()
                            .default(5),
                    )
                    .col(boolean(Event::AtlasAutoCleanup).not_null().default(true))
                    .col(
                        string_len(Event::AtlasAllowedProviders, 255)
                            .not_null()
                            .default("AWS"),
                    )
                    .col(
                        string_len(Event::AtlasAllowedRegions, 255)
                            .not_null()
                            .default("US_EAST_1"),
                    )
                    .col(
                        timestamp_with_time_zone(Event::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_events_status")
                    .table(Event::Table)
                    .col(Event::Status)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Create teams table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Team::Table)
                    .if_not_exists()
                    .col(uuid(Team::Id).primary_key())
                    .col(uuid(Team::EventId).not_null())
                    .col(string_len(Team::Name, 255).not_null())
                    .col(uuid(Team::LeaderId).not_null())
                    .col(
                        timestamp_with_time_zone(Team::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teams_event_id")
                            .from(Team::Table, Team::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_teams_leader_id")
                            .from(Team::Table, Team::LeaderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_teams_event_id")
                    .table(Team::Table)
                    .col(Team::EventId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Create team_members junction table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(TeamMember::Table)
                    .if_not_exists()
                    .col(uuid(TeamMember::TeamId).not_null())
                    .col(uuid(TeamMember::UserId).not_null())
                    .col(
                        timestamp_with_time_zone(TeamMember::JoinedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(TeamMember::TeamId)
                            .col(TeamMember::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_members_team_id")
                            .from(TeamMember::Table, TeamMember::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_members_user_id")
                            .from(TeamMember::Table, TeamMember::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 5. Create atlas_clusters table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(AtlasCluster::Table)
                    .if_not_exists()
                    .col(uuid(AtlasCluster::Id).primary_key())
                    .col(uuid(AtlasCluster::EventId).not_null())
                    .col(uuid(AtlasCluster::TeamId).not_null())
                    .col(uuid_null(AtlasCluster::ProjectId))
                    .col(string_len(AtlasCluster::AtlasProjectId, 64).not_null())
                    .col(string_len(AtlasCluster::ClusterName, 64).not_null())
                    .col(string_len(AtlasCluster::Provider, 16).not_null())
                    .col(string_len(AtlasCluster::Region, 64).not_null())
                    .col(string_len(AtlasCluster::Tier, 16).not_null())
                    .col(
                        string_len(AtlasCluster::Status, 32)
                            .not_null()
                            .default("provisioning"),
                    )
                    .col(text_null(AtlasCluster::ConnectionString))
                    .col(string_len_null(AtlasCluster::ActiveSlot, 80))
                    .col(uuid(AtlasCluster::ProvisionedBy).not_null())
                    .col(
                        timestamp_with_time_zone(AtlasCluster::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(
                        AtlasCluster::LastStatusCheck,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_atlas_clusters_event_id")
                            .from(AtlasCluster::Table, AtlasCluster::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_atlas_clusters_team_id")
                            .from(AtlasCluster::Table, AtlasCluster::TeamId)
                            .to(Team::Table, Team::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique NULL-ignoring index: at most one live cluster per (event, team)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_atlas_clusters_active_slot")
                    .table(AtlasCluster::Table)
                    .col(AtlasCluster::ActiveSlot)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_atlas_clusters_event_id")
                    .table(AtlasCluster::Table)
                    .col(AtlasCluster::EventId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_atlas_clusters_team_id")
                    .table(AtlasCluster::Table)
                    .col(AtlasCluster::TeamId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 6. Create atlas_database_users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(AtlasDatabaseUser::Table)
                    .if_not_exists()
                    .col(uuid(AtlasDatabaseUser::Id).primary_key())
                    .col(uuid(AtlasDatabaseUser::ClusterId).not_null())
                    .col(string_len(AtlasDatabaseUser::Username, 64).not_null())
                    .col(string_len(AtlasDatabaseUser::PasswordHash, 255).not_null())
                    .col(string_len(AtlasDatabaseUser::Roles, 255).not_null())
                    .col(
                        timestamp_with_time_zone(AtlasDatabaseUser::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_atlas_database_users_cluster_id")
                            .from(AtlasDatabaseUser::Table, AtlasDatabaseUser::ClusterId)
                            .to(AtlasCluster::Table, AtlasCluster::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_atlas_database_users_cluster_username")
                    .table(AtlasDatabaseUser::Table)
                    .col(AtlasDatabaseUser::ClusterId)
                    .col(AtlasDatabaseUser::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AtlasDatabaseUser::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AtlasCluster::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeamMember::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Team::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Event::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Email,
    PasswordHash,
    FullName,
    Role,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Event {
    #[sea_orm(iden = "events")]
    Table,
    Id,
    Name,
    Slug,
    Description,
    Status,
    StartsAt,
    EndsAt,
    AtlasEnabled,
    AtlasDefaultProvider,
    AtlasDefaultRegion,
    AtlasOpenNetworkAccess,
    AtlasMaxDbUsersPerCluster,
    AtlasAutoCleanup,
    AtlasAllowedProviders,
    AtlasAllowedRegions,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Team {
    #[sea_orm(iden = "teams")]
    Table,
    Id,
    EventId,
    Name,
    LeaderId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum TeamMember {
    #[sea_orm(iden = "team_members")]
    Table,
    TeamId,
    UserId,
    JoinedAt,
}

#[derive(DeriveIden)]
enum AtlasCluster {
    #[sea_orm(iden = "atlas_clusters")]
    Table,
    Id,
    EventId,
    TeamId,
    ProjectId,
    AtlasProjectId,
    ClusterName,
    Provider,
    Region,
    Tier,
    Status,
    ConnectionString,
    ActiveSlot,
    ProvisionedBy,
    CreatedAt,
    LastStatusCheck,
}

#[derive(DeriveIden)]
enum AtlasDatabaseUser {
    #[sea_orm(iden = "atlas_database_users")]
    Table,
    Id,
    ClusterId,
    Username,
    PasswordHash,
    Roles,
    CreatedAt,
}
