//! # Shopfront API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

mod bootstrap;
mod config;
mod handlers;
mod middleware;
mod state;
mod telemetry;

use config::AppConfig;
use handlers::JSON_LIMIT;
use handlers::upload::{MAX_UPLOAD_BYTES, UPLOAD_ROUTE};
use middleware::security;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    let (host, port) = (config.host.clone(), config.port);
    tracing::info!("Starting Shopfront API Server on {}:{}", host, port);

    let upload_dir = config.upload_dir.clone();
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .with_context(|| format!("creating upload directory {}", upload_dir.display()))?;

    let state = AppState::new(config)
        .await
        .context("building application state")?;
    bootstrap::ensure_admin(&state).await;

    HttpServer::new(move || {
        App::new()
            .wrap(security::cors(state.config.origin.as_deref()))
            .wrap(security::security_headers())
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES + JSON_LIMIT))
            .service(actix_files::Files::new(UPLOAD_ROUTE, upload_dir.clone()))
            .configure(|cfg| handlers::configure_routes(cfg, &state))
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("binding {host}:{port}"))?
    .run()
    .await
    .context("running HTTP server")
}
