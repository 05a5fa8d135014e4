use std::sync::Arc;

use anyhow::Context;
use token_auth_demo::{
    build_api_route_filter, build_protected_route_filter, handle_auth_errors, Auth, AuthConfig,
    ServerSettings, StaticCredentials,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = ServerSettings::from_env().context("failed to load server settings")?;

    let config = AuthConfig {
        auth_token_secret: settings.token_secret.clone(),
        auth_token_lifetime: settings.token_lifetime,
        credentials: Arc::new(StaticCredentials::demo()),
    };

    let auth = Auth::new(config);

    let all_routes = build_api_route_filter(&auth)
        .or(build_protected_route_filter(&auth))
        .recover(handle_auth_errors)
        .with(warp::trace::request());

    let (addr, server) = warp::serve(all_routes)
        .try_bind_with_graceful_shutdown(settings.listen_addr, async {
            tokio::signal::ctrl_c().await.ok();
        })
        .with_context(|| format!("failed to bind {}", settings.listen_addr))?;

    info!(%addr, token_lifetime = ?auth.tokens().lifetime(), "listening");
    server.await;
    info!("shut down");

    Ok(())
}
