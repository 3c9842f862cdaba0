mod config;
mod errors;
mod importer;
mod records;
mod server;
mod session;
mod stats;
mod store;

use crate::session::AppState;

#[tokio::main]
async fn main() {
    // Structured logging (line-buffered for hosted log capture)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("linekeeper starting");

    // Load config
    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    // Open the local store (and the remote mirror, if configured)
    let store = match store::Store::open(&cfg) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("store init error: {e}");
            std::process::exit(1);
        }
    };

    let port = cfg.server_port;
    let app_state = AppState::new(cfg, store);

    // Initial load runs in the background; mutations are rejected
    // until the session reaches Ready.
    let load_state = app_state.clone();
    tokio::spawn(async move {
        load_state.run_initial_load().await;
    });

    let app = axum::Router::new()
        .route("/api/state", axum::routing::get(server::routes::get_state))
        .route("/api/stats", axum::routing::get(server::routes::get_stats))
        .route("/api/series", axum::routing::get(server::routes::get_series))
        .route("/api/segments", axum::routing::get(server::routes::get_segments))
        .route("/api/wagers", axum::routing::get(server::routes::get_wagers).post(server::routes::post_wagers))
        .route("/api/wagers/{id}", axum::routing::delete(server::routes::delete_wager))
        .route("/api/wagers/{id}/settle", axum::routing::post(server::routes::post_settle))
        .route("/api/wagers/{id}/reset", axum::routing::post(server::routes::post_reset))
        .route("/api/wagers/{id}/odd", axum::routing::post(server::routes::post_odd))
        .route("/api/movements", axum::routing::get(server::routes::get_movements).post(server::routes::post_movement))
        .route("/api/import", axum::routing::post(server::routes::post_import))
        .route("/api/counters", axum::routing::get(server::routes::get_counters))
        .route("/api/reload", axum::routing::post(server::routes::post_reload))
        .fallback_service(
            tower_http::services::ServeDir::new("dashboard/dist")
                .fallback(tower_http::services::ServeFile::new("dashboard/dist/index.html")),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(app_state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
