use std::path::Path;

use anyhow::Context;
use tokio::net::TcpListener;

use squadrag::core::config::Settings;
use squadrag::core::logging;
use squadrag::server::router::router;
use squadrag::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(Path::new("logs"));

    let settings = Settings::from_env();
    let bind_addr = format!("0.0.0.0:{}", settings.port);

    let state = AppState::initialize(settings).await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let app = router(state);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
