//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::{AppState, SessionBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dependency {
    Connected,
    Disconnected,
    #[serde(rename = "Not Configured")]
    NotConfigured,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db: Dependency,
    pub redis: Dependency,
    pub version: &'static str,
    pub timestamp: String,
}

#[cfg(feature = "postgres")]
async fn database_status(state: &AppState) -> Dependency {
    match &state.db {
        Some(db) => match db.ping().await {
            Ok(()) => Dependency::Connected,
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                Dependency::Disconnected
            }
        },
        // Configured but unreachable at startup
        None if state.config.database.is_some() => Dependency::Disconnected,
        None => Dependency::NotConfigured,
    }
}

#[cfg(not(feature = "postgres"))]
async fn database_status(_state: &AppState) -> Dependency {
    Dependency::NotConfigured
}

async fn redis_status(state: &AppState) -> Dependency {
    match state.session_backend {
        SessionBackend::Redis => match state.sessions.ping().await {
            Ok(()) => Dependency::Connected,
            Err(e) => {
                tracing::warn!(error = %e, "Redis ping failed");
                Dependency::Disconnected
            }
        },
        SessionBackend::Memory if redis_configured(state) => Dependency::Disconnected,
        SessionBackend::Memory => Dependency::NotConfigured,
    }
}

#[cfg(feature = "redis")]
fn redis_configured(state: &AppState) -> bool {
    state.config.redis.is_some()
}

#[cfg(not(feature = "redis"))]
fn redis_configured(_state: &AppState) -> bool {
    false
}

/// GET /health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let db = database_status(&state).await;
    let redis = redis_status(&state).await;

    let status = if db == Dependency::Disconnected || redis == Dependency::Disconnected {
        "Degraded"
    } else {
        "OK"
    };

    HttpResponse::Ok().json(HealthResponse {
        status,
        db,
        redis,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use serde_json::Value;

    use crate::handlers::test_support::{self, test_app};

    #[actix_web::test]
    async fn test_health_without_external_services() {
        let state = test_support::state();
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "OK");
        assert_eq!(body["db"], "Not Configured");
        assert_eq!(body["redis"], "Not Configured");
        assert!(body["timestamp"].is_string());
    }
}
