//! DJ bingo backend entrypoint wiring REST, SSE and the storage backend.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dj_bingo_back::{
    config::AppConfig,
    dao::game_store::memory::MemoryGameStore,
    routes,
    services::sse_events,
    state::{AppState, SharedState},
};

const DEFAULT_PORT: u16 = 8080;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());
    tokio::spawn(forward_degraded_changes(app_state.clone()));
    install_store(app_state.clone()).await;

    let app = routes::router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "dj-bingo-back listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")
}

/// `PORT`, then `SERVER_PORT`, then 8080, on every interface.
fn listen_addr() -> SocketAddr {
    let port = ["PORT", "SERVER_PORT"]
        .into_iter()
        .filter_map(|name| env::var(name).ok())
        .find_map(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    SocketAddr::from(([0, 0, 0, 0], port))
}

/// Use MongoDB when `MONGO_URI` is set, the in-memory store otherwise.
async fn install_store(state: SharedState) {
    #[cfg(feature = "mongo-store")]
    if env::var_os("MONGO_URI").is_some() {
        info!("MONGO_URI set; supervising MongoDB game store");
        tokio::spawn(dj_bingo_back::services::storage_supervisor::run(
            state,
            mongo::connect,
        ));
        return;
    }

    info!("no database configured; using in-memory game store");
    state.set_game_store(Arc::new(MemoryGameStore::new())).await;
}

#[cfg(feature = "mongo-store")]
mod mongo {
    use std::sync::Arc;

    use dj_bingo_back::dao::{
        game_store::{
            GameStore,
            mongodb::{MongoConfig, MongoGameStore},
        },
        storage::StorageError,
    };

    pub async fn connect() -> Result<Arc<dyn GameStore>, StorageError> {
        let config = MongoConfig::from_env().await?;
        let store = MongoGameStore::connect(config).await?;
        Ok(Arc::new(store))
    }
}

/// Relay degraded mode changes to the admin stream.
async fn forward_degraded_changes(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        if degraded {
            warn!("entering degraded mode");
        } else {
            info!("leaving degraded mode");
        }
        sse_events::broadcast_system_status(&state, degraded);
    }
}

/// `RUST_LOG` wins; otherwise info, with request traces from tower-http.
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
                warn!(error = %err, "cannot install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
