//! hackdesk process entry point
//!
//! Owns the database connection lifecycle: connect, migrate, construct the
//! services, run the selected command, disconnect on exit. The `cleanup`
//! command is what the external scheduler (cron) invokes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use hackdesk_api::{ApiServer, ApiServerConfig};
use hackdesk_atlas::{AtlasClientConfig, HttpAtlasClient};
use hackdesk_control::{CleanupService, ProvisioningService, StatusService};

#[derive(Parser)]
#[command(name = "hackdesk", about = "Hackathon platform cluster services", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server
    Serve(ServeArgs),
    /// Tear down clusters of concluded events (scheduler entry point)
    Cleanup(CleanupArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Database URL (sqlite or postgres)
    #[arg(
        long,
        env = "HACKDESK_DATABASE_URL",
        default_value = "sqlite://hackdesk.db?mode=rwc"
    )]
    database_url: String,

    /// Atlas administration API base URL
    #[arg(
        long,
        env = "HACKDESK_ATLAS_BASE_URL",
        default_value = "https://cloud.mongodb.com"
    )]
    atlas_base_url: String,

    /// Atlas service-account access token
    #[arg(long, env = "HACKDESK_ATLAS_TOKEN", default_value = "")]
    atlas_token: String,

    /// Atlas project (group) id that hosts the clusters
    #[arg(long, env = "HACKDESK_ATLAS_PROJECT", default_value = "")]
    atlas_project: String,
}

#[derive(Args)]
struct ServeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Address to bind the API server
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Secret for validating session tokens
    #[arg(long, env = "HACKDESK_JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Disable CORS (enabled by default for development)
    #[arg(long)]
    no_cors: bool,
}

#[derive(Args)]
struct CleanupArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Only report which events would be cleaned up; no side effects
    #[arg(long)]
    dry_run: bool,

    /// Restrict cleanup to a single event
    #[arg(long)]
    event: Option<Uuid>,
}

struct Services {
    db: sea_orm::DatabaseConnection,
    provisioning: ProvisioningService,
    status: StatusService,
    cleanup: CleanupService,
}

async fn build_services(common: &CommonArgs) -> anyhow::Result<Services> {
    let db = hackdesk_db::connect(&common.database_url)
        .await
        .context("Failed to connect to database")?;
    hackdesk_db::migrate(&db)
        .await
        .context("Failed to run migrations")?;

    let atlas = HttpAtlasClient::new(AtlasClientConfig {
        base_url: common.atlas_base_url.clone(),
        access_token: common.atlas_token.clone(),
        timeout: Duration::from_secs(30),
    })
    .context("Failed to build control-plane client")?;
    let atlas = Arc::new(atlas);

    let provisioning =
        ProvisioningService::new(db.clone(), atlas.clone(), common.atlas_project.clone());
    let status = StatusService::new(db.clone(), atlas);
    let cleanup = CleanupService::new(db.clone(), provisioning.clone());

    Ok(Services {
        db,
        provisioning,
        status,
        cleanup,
    })
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let services = build_services(&args.common).await?;

    let server = ApiServer::new(
        ApiServerConfig {
            bind_addr: args.bind,
            enable_cors: !args.no_cors,
            jwt_secret: args.jwt_secret,
        },
        services.db,
        services.provisioning,
        services.status,
        services.cleanup,
    );

    server.start().await
}

async fn cleanup(args: CleanupArgs) -> anyhow::Result<()> {
    let services = build_services(&args.common).await?;

    if args.dry_run {
        let event_ids = services.cleanup.find_events_needing_cleanup().await?;
        info!(events = event_ids.len(), "Dry run: events needing cleanup");
        println!("{}", serde_json::to_string_pretty(&event_ids)?);
        return Ok(());
    }

    let reports = match args.event {
        Some(event_id) => vec![services.cleanup.cleanup_event_clusters(event_id).await?],
        None => services.cleanup.run_scheduled_cleanup().await?,
    };

    for report in &reports {
        info!(
            event = %report.event_id,
            found = report.clusters_found,
            deleted = report.clusters_deleted,
            failed = report.errors.len(),
            "Cleanup report"
        );
    }
    println!("{}", serde_json::to_string_pretty(&reports)?);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Cleanup(args) => cleanup(args).await,
    }
}
