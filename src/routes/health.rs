/**
 * Health Routes
 * Liveness and readiness probes for the API and its MongoDB connection
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::db::{LeadStore, StoreError};
use crate::state::AppState;

/// The only failure text probes expose; the cause is logged.
const DATABASE_UNAVAILABLE: &str = "Database unavailable";

lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Pin the uptime clock to process start rather than first request.
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Healthy,
    Unhealthy,
    Ready,
    #[serde(rename = "not ready")]
    NotReady,
}

/// Result of probing one dependency
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: HealthStatus,
    /// Milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database: ServiceCheck,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub database: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

async fn check_database(store: &dyn LeadStore) -> ServiceCheck {
    match store.ping().await {
        Ok(elapsed) => ServiceCheck {
            status: HealthStatus::Healthy,
            response_time: Some(elapsed.as_millis() as u64),
            error: None,
        },
        Err(e) => unhealthy(&e),
    }
}

fn unhealthy(error: &StoreError) -> ServiceCheck {
    tracing::warn!(error = %error, "database health check failed");
    ServiceCheck {
        status: HealthStatus::Unhealthy,
        response_time: None,
        error: Some(DATABASE_UNAVAILABLE.to_string()),
    }
}

/// GET /health
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: HealthStatus::Ok,
    })
}

/// GET /health/detailed - process is up; database state is reported, not enforced
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_database(state.store.as_ref()).await;

    Json(DetailedHealthResponse {
        status: HealthStatus::Ok,
        timestamp: Utc::now(),
        uptime: SERVER_START.elapsed().as_secs(),
        checks: HealthChecks { database },
    })
}

/// GET /health/database
pub async fn health_database(State(state): State<AppState>) -> impl IntoResponse {
    Json(check_database(state.store.as_ref()).await)
}

/// GET /health/ready - 503 until MongoDB answers a ping
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_database(state.store.as_ref()).await;
    let ready = database.status == HealthStatus::Healthy;

    let response = ReadyResponse {
        status: if ready {
            HealthStatus::Ready
        } else {
            HealthStatus::NotReady
        },
        timestamp: Utc::now(),
        uptime: SERVER_START.elapsed().as_secs(),
        database: database.status,
        reason: database.error.map(|e| format!("Database is not healthy: {}", e)),
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
