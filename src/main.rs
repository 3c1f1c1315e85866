use std::net::SocketAddr;

use anyhow::Context;
use secureguard::{config::Config, domain::models::GuardMode};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "secureguard=debug,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    match config.guard.mode() {
        GuardMode::Permissive => {
            tracing::warn!("Testing mode enabled: HTTPS redirect and host checks are disabled")
        }
        GuardMode::Enforcing if config.guard.is_unrestricted() => {
            tracing::info!("Enforcing HTTPS, no host restriction configured")
        }
        GuardMode::Enforcing => tracing::info!(
            allowed_hosts = ?config.guard.allowed_hosts,
            "Enforcing HTTPS and host allow-list"
        ),
    }

    // Build router
    let app = secureguard::app(config.guard.clone()).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;
    tracing::info!("secureguard listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
