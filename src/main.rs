mod bac;
mod config;
mod db;
mod frame;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use services::decay::DecayScheduler;
use services::flush::FlushScheduler;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    let config = config::Config::from_env().expect("invalid configuration");

    let pool = db::init_pool(&config.database_url, config.db_max_connections)
        .await
        .expect("database init failed");
    let store = Arc::new(store::PgParticipantStore::new(pool));

    let state = state::AppState::new(store, config.session);

    // Background schedulers stop when `shutdown` fires; flush drains once more.
    let shutdown = CancellationToken::new();
    let decay = DecayScheduler::new(
        state.store.clone(),
        state.queue.clone(),
        state.decay_clock.clone(),
        config.decay_period,
    )
    .spawn(shutdown.clone());
    let flush = FlushScheduler::new(state.queue.clone(), state.dispatcher.clone(), config.flush_period)
        .spawn(shutdown.clone());

    let app = routes::app(state, &config.static_dir);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, static_dir = %config.static_dir.display(), "baptender listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .expect("server failed");

    shutdown.cancel();
    let _ = tokio::join!(decay, flush);
    tracing::info!("baptender stopped");
}

/// Resolve on Ctrl-C and cancel `shutdown` so the schedulers stop too.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
    shutdown.cancel();
}
