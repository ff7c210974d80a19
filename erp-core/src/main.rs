use dotenv::dotenv;
use erp_core::config::Config;
use erp_core::db::create_pool;
use erp_core::logging::init_tracing;
use erp_core::routes::create_router;
use erp_core::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    init_tracing();

    info!("Starting ERP core server...");

    let config = Config::from_env()?;

    // Initialize database connection pool
    let db_pool = create_pool(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    let bind_address = config.bind_address();
    let app = create_router(AppState::new(db_pool, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_address, e))?;

    info!("Server listening on {}", bind_address);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
