use chat2anakin::config::RelayConfig;
use chat2anakin::server::build_router;
use chat2anakin::util::{env_bind_addr, env_config_path, init_tracing, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config_path = env_config_path();
    tracing::info!("Loading relay configuration from: {}", config_path);
    let config = RelayConfig::load_from_file(&config_path)?;
    tracing::info!(
        "Relay configuration loaded ({} models, upstream {})",
        config.models.len(),
        config.base_url
    );

    let state = AppState::new(config);
    let router = build_router(state);

    let addr = env_bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Chat2Anakin listening on http://{}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}
