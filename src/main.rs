use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use finchat_backend::core::config::AppConfig;
use finchat_backend::logging;
use finchat_backend::server::router;
use finchat_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    logging::init(&config.log_dir);

    let state = AppState::initialize(config).await?;

    let bind_addr = format!("0.0.0.0:{}", state.config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let app: Router = router::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
