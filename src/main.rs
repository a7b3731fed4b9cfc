//! Age Guess Back binary entrypoint wiring configuration, media catalog and the REST layer.

use std::{net::SocketAddr, sync::Arc};

use age_guess_back::{
    build_router,
    config::AppConfig,
    media::{FsMediaResolver, MediaResolver},
    state::{AppState, SharedState, clock::SystemClock},
};
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();

    let resolver: Arc<dyn MediaResolver> = Arc::new(FsMediaResolver::new(
        config.media_dir.clone(),
        config.birth_date,
    ));
    let app_state = AppState::new(&config, Arc::new(SystemClock), resolver);
    tokio::spawn(warm_media_catalog(app_state.clone()));
    let app = build_router(app_state, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Probe every file once so the first game does not wait on EXIF and ffprobe lookups.
async fn warm_media_catalog(state: SharedState) {
    match state.session().refresh_catalog().await {
        0 => warn!("no eligible media found; rounds will show no media"),
        count => info!(count, "media catalog ready"),
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
