mod config;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::AppConfig::from_env().expect("invalid configuration");
    let backend = services::backend::BackendClient::new(&config.backend_url, config.backend_timeouts)
        .expect("backend client init failed");

    if config.google.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID/SECRET/REDIRECT_URI not set; Google sign-in disabled");
    }
    tracing::info!(backend = backend.base_url(), "auth backend configured");

    let port = config.port;
    let http = backend.http().clone();
    let state = state::AppState::new(config, Arc::new(backend), http);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "authgate listening");
    axum::serve(listener, app).await.expect("server failed");
}
