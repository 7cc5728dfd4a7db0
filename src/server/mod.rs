pub mod app;
pub mod errors;
pub mod handlers;

use anyhow::Result;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::ServerConfig;
use crate::database::{connection::*, migrations::Migrator, seed_data};

pub async fn start_server(config: &ServerConfig) -> Result<()> {
    let database_url = get_database_url(Some(&config.database_path));
    let db = establish_connection(&database_url).await?;

    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    if config.seed_on_start {
        seed_data::seed_support_scenarios(&db).await?;
    }

    let app = app::create_app(db, config.cors_origin.as_deref()).await?;

    log_routes(config.port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server running on http://0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes(port: u16) {
    info!("API Endpoints:");
    info!("  /api/health                 - Health check");
    info!("  /api/scenarios              - Scenario list and creation");
    info!("  /api/scenarios/{{id}}         - Scenario read, update, delete");
    info!("  /api/options                - Option creation");
    info!("  /api/options/{{id}}           - Option update, delete");
    info!("  /docs                       - Swagger UI documentation");
    info!("Chat client should point at http://localhost:{}/api", port);
}
