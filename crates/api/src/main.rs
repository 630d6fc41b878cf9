use anyhow::Context;

use lostfound_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lostfound_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(?config, "configuration loaded");

    let app = lostfound_api::app::build_app(&config)
        .await
        .context("failed to build application services")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
