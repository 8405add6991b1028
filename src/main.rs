//! Quiz Night Back binary entrypoint wiring the realtime store, admin controller, REST and SSE.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_night_back::{
    config::AppConfig,
    dao::game_store::{GameStore, memory::MemoryGameStore},
    routes,
    services::game_service::AdminCommand,
    state::{AppState, SharedState, questions::load_question_bank},
};

/// Environment variable selecting the store backend (`memory` or `firebase`).
const STORE_ENV: &str = "QUIZ_NIGHT_STORE";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let questions = load_question_bank(&config);
    let store = connect_store().await?;

    let app_state = AppState::new(store, config, questions);

    // Every session opens on a fresh lobby.
    if let Err(err) = app_state.admin().execute(AdminCommand::Restart).await {
        warn!(error = %err, "failed to reset the game document on startup");
    }

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the store backend: Firebase when configured, otherwise the in-process store.
async fn connect_store() -> anyhow::Result<Arc<dyn GameStore>> {
    let requested = env::var(STORE_ENV).ok();

    match requested.as_deref() {
        Some("memory") => {}
        #[cfg(feature = "firebase-store")]
        Some("firebase") => return connect_firebase().await,
        #[cfg(feature = "firebase-store")]
        None if env::var_os("FIREBASE_DATABASE_URL").is_some() => {
            return connect_firebase().await;
        }
        None => {}
        Some(other) => anyhow::bail!("unsupported {STORE_ENV} value `{other}`"),
    }

    info!("using in-memory game store");
    Ok(Arc::new(MemoryGameStore::new()))
}

/// Connect to Firebase, retrying with exponential backoff until the database answers.
#[cfg(feature = "firebase-store")]
async fn connect_firebase() -> anyhow::Result<Arc<dyn GameStore>> {
    use std::time::Duration;

    use quiz_night_back::dao::game_store::firebase::{FirebaseConfig, FirebaseGameStore};
    use tokio::time::sleep;

    let config = FirebaseConfig::from_env().context("reading Firebase configuration")?;
    let initial_delay = Duration::from_millis(1000);
    let max_delay = Duration::from_secs(10);
    let mut delay = initial_delay;

    loop {
        match FirebaseGameStore::connect(config.clone()).await {
            Ok(store) => return Ok(Arc::new(store)),
            Err(err) => {
                warn!(error = %err, "Firebase connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(max_delay);
            }
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
