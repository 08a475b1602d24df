use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use campaign_api::config::Settings;
use campaign_api::database::postgres::{
    PgAccessRepository, PgActRepository, PgCatalogRepository, PgLabeledRepository,
    PgLotRepository, PgPreCatastralRepository, PgReportRepository,
};
use campaign_api::database::DbPool;
use campaign_api::logging;
use campaign_api::router::build_router;
use campaign_api::state::{AppState, Repositories};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = logging::init_logger()?;

    info!("Starting campaign API server");

    let settings = Settings::load()?;
    info!("Configuration loaded");

    let db_pool = DbPool::new(&settings.database).await?;
    info!("Database connection established");

    if settings.database.run_migrations {
        db_pool.run_migrations().await?;
    } else {
        warn!("Skipping database migrations");
    }

    let pool = db_pool.get_pool().clone();
    let repos = Repositories {
        acts: Arc::new(PgActRepository::new(pool.clone())),
        pre_catastrals: Arc::new(PgPreCatastralRepository::new(pool.clone())),
        lots: Arc::new(PgLotRepository::new(pool.clone())),
        labeled: Arc::new(PgLabeledRepository::new(pool.clone())),
        catalog: Arc::new(PgCatalogRepository::new(pool.clone())),
        access: Arc::new(PgAccessRepository::new(pool.clone())),
        reports: Arc::new(PgReportRepository::new(pool)),
        health: Arc::new(db_pool.clone()),
    };

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    let state = AppState::new(settings, repos);
    state
        .access
        .ensure_admin(state.settings.auth.bootstrap_admin_password.as_deref())
        .await?;

    let app = build_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
