//! REST API for the cluster lifecycle services
//!
//! Thin route layer: handlers authorize through the guard, delegate to the
//! services, and map error kinds to response codes. Everything stateful
//! lives in hackdesk-control.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use hackdesk_control::{CleanupService, ProvisioningService, StatusService};
use sea_orm::DatabaseConnection;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub provisioning: ProvisioningService,
    pub status: StatusService,
    pub cleanup: CleanupService,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hackdesk API",
        version = "0.1.0",
        description = "REST API for managing hackathon team database clusters",
        contact(
            name = "Hackdesk Team",
            email = "team@hackdesk.dev"
        )
    ),
    paths(
        handlers::provision_cluster,
        handlers::list_clusters,
        handlers::get_cluster,
        handlers::refresh_cluster,
        handlers::delete_cluster,
        handlers::create_database_user,
        handlers::delete_database_user,
        handlers::cleanup_preview,
        handlers::run_cleanup,
        handlers::cleanup_event,
        handlers::health_check,
    ),
    components(
        schemas(
            models::CloudProvider,
            models::ClusterStatus,
            models::Cluster,
            models::ProvisionClusterRequest,
            models::ClusterList,
            models::ClusterStatusResponse,
            models::CreateDatabaseUserRequest,
            models::DatabaseUser,
            models::CleanupFailure,
            models::CleanupReport,
            models::CleanupPreview,
            models::HealthResponse,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "clusters", description = "Cluster lifecycle endpoints"),
        (name = "database-users", description = "Per-cluster database user endpoints"),
        (name = "admin", description = "Cleanup and administration endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
    /// JWT secret for validating session tokens
    pub jwt_secret: Option<String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().expect("static addr"),
            enable_cors: true,
            jwt_secret: None,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server over an already-connected database and the
    /// lifecycle services
    pub fn new(
        config: ApiServerConfig,
        db: DatabaseConnection,
        provisioning: ProvisioningService,
        status: StatusService,
        cleanup: CleanupService,
    ) -> Self {
        let state = Arc::new(AppState {
            db,
            provisioning,
            status,
            cleanup,
        });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let jwt_secret = match &self.config.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("No JWT secret configured; using an insecure development secret");
                "insecure-dev-secret".to_string()
            }
        };
        let auth_state = Arc::new(middleware::AuthState::new(jwt_secret.as_bytes()));

        // PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .with_state(self.state.clone());

        // PROTECTED routes (require a session token)
        let protected_router = Router::new()
            .route(
                "/api/events/{event_id}/teams/{team_id}/cluster",
                post(handlers::provision_cluster),
            )
            .route("/api/clusters", get(handlers::list_clusters))
            .route(
                "/api/clusters/{id}",
                get(handlers::get_cluster).delete(handlers::delete_cluster),
            )
            .route("/api/clusters/{id}/refresh", post(handlers::refresh_cluster))
            .route(
                "/api/clusters/{id}/users",
                post(handlers::create_database_user),
            )
            .route(
                "/api/clusters/{id}/users/{username}",
                axum::routing::delete(handlers::delete_database_user),
            )
            .route(
                "/api/admin/cleanup/preview",
                get(handlers::cleanup_preview),
            )
            .route("/api/admin/cleanup", post(handlers::run_cleanup))
            .route(
                "/api/admin/events/{event_id}/cleanup",
                post(handlers::cleanup_event),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                auth_state.clone(),
                middleware::require_auth,
            ));

        let api_router = public_router.merge(protected_router);

        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router);

        let cors = self.config.enable_cors.then(|| {
            use tower_http::cors::AllowOrigin;

            // Cookie auth needs credentials, which rules out allow_origin(Any)
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                    let origin = origin.to_str().unwrap_or("");
                    origin.starts_with("http://localhost:")
                        || origin.starts_with("http://127.0.0.1:")
                        || origin.starts_with("https://localhost:")
                        || origin.starts_with("https://127.0.0.1:")
                }))
        });

        let mut router = router.layer(TraceLayer::new_for_http());
        if let Some(cors) = cors {
            router = router.layer(cors);
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let bind_addr = self.config.bind_addr;
        let router = self.build_router();

        info!("Starting API server on {}", bind_addr);
        info!("OpenAPI spec: http://{}/api/openapi.json", bind_addr);
        info!("Swagger UI: http://{}/swagger-ui", bind_addr);

        let listener = tokio::net::TcpListener::bind(bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}
