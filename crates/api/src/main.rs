use anyhow::Result;
use teller_api::{build_app, AppConfig};
use teller_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("teller_api");

    let config = AppConfig::from_env();
    let app = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(bind = %config.bind, "teller api started");

    axum::serve(listener, app).await?;
    Ok(())
}
