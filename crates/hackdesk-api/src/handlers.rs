use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use hackdesk_auth::Caller;
use hackdesk_control::{
    require_team_leader, require_team_member, ClusterFilter, ClusterRequest, ControlError,
};

use crate::error::{error_response, ApiError};
use crate::models::*;
use crate::AppState;

fn require_admin(caller: &Caller) -> Result<(), ApiError> {
    if caller.is_privileged() {
        Ok(())
    } else {
        Err(error_response(ControlError::Forbidden))
    }
}

fn caller_id(caller: &Caller) -> Result<Uuid, ApiError> {
    caller
        .user_id()
        .ok_or_else(|| error_response(ControlError::Unauthorized))
}

/// Provision a cluster for a team
#[utoipa::path(
    post,
    path = "/api/events/{event_id}/teams/{team_id}/cluster",
    params(
        ("event_id" = Uuid, Path, description = "Event ID"),
        ("team_id" = Uuid, Path, description = "Team ID")
    ),
    request_body = ProvisionClusterRequest,
    responses(
        (status = 201, description = "Cluster provisioning started", body = Cluster),
        (status = 403, description = "Not the team leader, or provisioning disabled", body = ErrorResponse),
        (status = 404, description = "Event or team not found", body = ErrorResponse),
        (status = 409, description = "Team already has a cluster", body = ErrorResponse),
        (status = 422, description = "Provider or region not allowed", body = ErrorResponse),
        (status = 500, description = "Control plane error", body = ErrorResponse)
    ),
    tag = "clusters"
)]
pub async fn provision_cluster(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path((event_id, team_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<ProvisionClusterRequest>,
) -> Result<(StatusCode, Json<Cluster>), ApiError> {
    info!(event = %event_id, team = %team_id, "Cluster provisioning requested");

    require_team_leader(&state.db, &caller, Some(team_id))
        .await
        .map_err(error_response)?;

    let requested_by = caller_id(&caller)?;
    let cluster = state
        .provisioning
        .provision_cluster(
            event_id,
            team_id,
            requested_by,
            ClusterRequest {
                provider: body.provider,
                region: body.region,
                tier: body.tier,
                project_id: body.project_id,
            },
        )
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(cluster.into())))
}

/// List clusters
#[utoipa::path(
    get,
    path = "/api/clusters",
    params(
        ("event_id" = Option<Uuid>, Query, description = "Filter by event"),
        ("team_id" = Option<Uuid>, Query, description = "Filter by team"),
        ("status" = Option<String>, Query, description = "Filter by lifecycle status")
    ),
    responses(
        (status = 200, description = "List of clusters", body = ClusterList),
        (status = 403, description = "Caller may not list these clusters", body = ErrorResponse)
    ),
    tag = "clusters"
)]
pub async fn list_clusters(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<ClusterListQuery>,
) -> Result<Json<ClusterList>, ApiError> {
    debug!(?query, "Listing clusters");

    // Non-privileged callers must scope the listing to a team they belong to
    match query.team_id {
        Some(team_id) => {
            require_team_member(&state.db, &caller, Some(team_id))
                .await
                .map_err(error_response)?;
        }
        None => require_admin(&caller)?,
    }

    let clusters = state
        .provisioning
        .list_clusters(ClusterFilter {
            event_id: query.event_id,
            team_id: query.team_id,
            status: query.status.map(Into::into),
        })
        .await
        .map_err(error_response)?;

    let clusters: Vec<Cluster> = clusters.into_iter().map(Into::into).collect();
    let total = clusters.len();

    Ok(Json(ClusterList { clusters, total }))
}

/// Get a cluster record
#[utoipa::path(
    get,
    path = "/api/clusters/{id}",
    params(("id" = Uuid, Path, description = "Cluster ID")),
    responses(
        (status = 200, description = "Cluster record", body = Cluster),
        (status = 403, description = "Caller is not on the owning team", body = ErrorResponse),
        (status = 404, description = "Cluster not found", body = ErrorResponse)
    ),
    tag = "clusters"
)]
pub async fn get_cluster(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Cluster>, ApiError> {
    debug!(cluster = %id, "Fetching cluster");

    let cluster = state
        .provisioning
        .get_cluster(id)
        .await
        .map_err(error_response)?;

    require_team_member(&state.db, &caller, Some(cluster.team_id))
        .await
        .map_err(error_response)?;

    Ok(Json(cluster.into()))
}

/// Poll the control plane and refresh a cluster's status
#[utoipa::path(
    post,
    path = "/api/clusters/{id}/refresh",
    params(("id" = Uuid, Path, description = "Cluster ID")),
    responses(
        (status = 200, description = "Refreshed status", body = ClusterStatusResponse),
        (status = 403, description = "Caller is not on the owning team", body = ErrorResponse),
        (status = 404, description = "Cluster not found", body = ErrorResponse),
        (status = 500, description = "Control plane unreachable", body = ErrorResponse)
    ),
    tag = "clusters"
)]
pub async fn refresh_cluster(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClusterStatusResponse>, ApiError> {
    debug!(cluster = %id, "Refreshing cluster status");

    let cluster = state
        .provisioning
        .get_cluster(id)
        .await
        .map_err(error_response)?;

    require_team_member(&state.db, &caller, Some(cluster.team_id))
        .await
        .map_err(error_response)?;

    let refresh = state
        .status
        .refresh_cluster_status(id)
        .await
        .map_err(error_response)?;

    Ok(Json(ClusterStatusResponse {
        status: refresh.status.into(),
        connection_string: refresh.connection_string,
    }))
}

/// Tear down a cluster
#[utoipa::path(
    delete,
    path = "/api/clusters/{id}",
    params(("id" = Uuid, Path, description = "Cluster ID")),
    responses(
        (status = 204, description = "Cluster deleted"),
        (status = 403, description = "Not the team leader", body = ErrorResponse),
        (status = 404, description = "Cluster not found", body = ErrorResponse),
        (status = 500, description = "External deletion failed; kept for retry", body = ErrorResponse)
    ),
    tag = "clusters"
)]
pub async fn delete_cluster(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    info!(cluster = %id, "Cluster deletion requested");

    let cluster = state
        .provisioning
        .get_cluster(id)
        .await
        .map_err(error_response)?;

    require_team_leader(&state.db, &caller, Some(cluster.team_id))
        .await
        .map_err(error_response)?;

    state
        .provisioning
        .delete_cluster(id)
        .await
        .map_err(error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Create a database user on a cluster
#[utoipa::path(
    post,
    path = "/api/clusters/{id}/users",
    params(("id" = Uuid, Path, description = "Cluster ID")),
    request_body = CreateDatabaseUserRequest,
    responses(
        (status = 201, description = "Database user created", body = DatabaseUser),
        (status = 403, description = "Not the team leader", body = ErrorResponse),
        (status = 404, description = "Cluster not found", body = ErrorResponse),
        (status = 409, description = "Cluster not ready, duplicate user, or quota reached", body = ErrorResponse)
    ),
    tag = "database-users"
)]
pub async fn create_database_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(body): Json<CreateDatabaseUserRequest>,
) -> Result<(StatusCode, Json<DatabaseUser>), ApiError> {
    info!(cluster = %id, username = %body.username, "Database user creation requested");

    let cluster = state
        .provisioning
        .get_cluster(id)
        .await
        .map_err(error_response)?;

    require_team_leader(&state.db, &caller, Some(cluster.team_id))
        .await
        .map_err(error_response)?;

    let user = state
        .provisioning
        .create_database_user(id, body.username, body.password, body.roles)
        .await
        .map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Delete a database user from a cluster
#[utoipa::path(
    delete,
    path = "/api/clusters/{id}/users/{username}",
    params(
        ("id" = Uuid, Path, description = "Cluster ID"),
        ("username" = String, Path, description = "Database username")
    ),
    responses(
        (status = 204, description = "Database user deleted"),
        (status = 403, description = "Not the team leader", body = ErrorResponse),
        (status = 404, description = "Cluster or user not found", body = ErrorResponse)
    ),
    tag = "database-users"
)]
pub async fn delete_database_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path((id, username)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError> {
    info!(cluster = %id, username = %username, "Database user deletion requested");

    let cluster = state
        .provisioning
        .get_cluster(id)
        .await
        .map_err(error_response)?;

    require_team_leader(&state.db, &caller, Some(cluster.team_id))
        .await
        .map_err(error_response)?;

    state
        .provisioning
        .delete_database_user(id, &username)
        .await
        .map_err(error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Preview which events a cleanup run would touch (no side effects)
#[utoipa::path(
    get,
    path = "/api/admin/cleanup/preview",
    responses(
        (status = 200, description = "Events eligible for cleanup", body = CleanupPreview),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn cleanup_preview(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<CleanupPreview>, ApiError> {
    require_admin(&caller)?;

    let event_ids = state
        .cleanup
        .find_events_needing_cleanup()
        .await
        .map_err(error_response)?;
    let total = event_ids.len();

    Ok(Json(CleanupPreview { event_ids, total }))
}

/// Run cleanup across all eligible events
#[utoipa::path(
    post,
    path = "/api/admin/cleanup",
    responses(
        (status = 200, description = "Per-event cleanup reports", body = [CleanupReport]),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn run_cleanup(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<CleanupReport>>, ApiError> {
    require_admin(&caller)?;
    info!("Fleet-wide cluster cleanup requested");

    let reports = state
        .cleanup
        .run_scheduled_cleanup()
        .await
        .map_err(error_response)?;

    Ok(Json(reports.into_iter().map(Into::into).collect()))
}

/// Clean up one event's clusters
#[utoipa::path(
    post,
    path = "/api/admin/events/{event_id}/cleanup",
    params(("event_id" = Uuid, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Cleanup report", body = CleanupReport),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn cleanup_event(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<CleanupReport>, ApiError> {
    require_admin(&caller)?;
    info!(event = %event_id, "Event cluster cleanup requested");

    let report = state
        .cleanup
        .cleanup_event_clusters(event_id)
        .await
        .map_err(error_response)?;

    Ok(Json(report.into()))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
