use anyhow::Context;

use offload_api::config::AppConfig;
use offload_infra::InMemoryJobStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    offload_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let app = offload_api::app::build_app(&config, InMemoryJobStore::arc());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    let addr = listener.local_addr()?;
    tracing::info!("listening on {addr}");
    tracing::info!("to create a background job use http://{addr}/slow");
    tracing::info!("to track jobs use http://{addr}/jobs");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
