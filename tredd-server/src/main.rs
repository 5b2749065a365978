use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tredd_server::{config, routes, state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tredd_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::load()?;
    let state = state::AppState::new(&config)?;

    // A crash between reveal and claim must not lose a payment: replay
    // every persisted transfer's claim before accepting new work.
    let replayed = state
        .queue
        .replay(state.store.as_ref(), config.limits.claim_grace_ms)
        .await?;
    if replayed > 0 {
        tracing::info!(count = replayed, "replayed pending claims");
    }
    let _claim_worker = state.spawn_claim_worker();

    let app = routes::router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
