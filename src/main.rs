use business_health::api::{create_router, AppState, DataSources};
use business_health::config::Settings;
use business_health::observability::{init_logging, init_metrics, HealthChecker};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    init_logging(&settings.log_config());
    info!("Configuration loaded");

    let metrics_handle = init_metrics()?;

    // Connect to PostgreSQL
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(settings.database.pool_size)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&settings.database.url)
        .await?;
    info!("Database connection established");

    if settings.database.run_migrations {
        info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Migrations applied successfully");
    }

    let state = AppState::new(DataSources::postgres(pool.clone(), &settings), &settings)?
        .with_metrics(metrics_handle)
        .with_health_checker(Arc::new(HealthChecker::new(pool)));

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.application.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Business health service listening");

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
