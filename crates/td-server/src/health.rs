//! Health checks
//!
//! Probes both external collaborators: a cheap select against the record
//! store and an existence check against the blob store.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use td_attachments::{BlobHandle, BlobStore};
use td_store::{Filter, RecordStore, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub name: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    fn http_status(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

pub struct HealthChecker {
    start_time: Instant,
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl HealthChecker {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            start_time: Instant::now(),
            records,
            blobs,
        }
    }

    pub async fn check(&self) -> HealthReport {
        let mut components = Vec::with_capacity(2);

        let started = Instant::now();
        let record_result = self.records.select(Table::Projects, Filter::All).await;
        components.push(ComponentHealth {
            name: "record_store",
            status: match record_result {
                Ok(_) => HealthStatus::Healthy,
                Err(_) => HealthStatus::Unhealthy,
            },
            message: record_result.err().map(|e| e.to_string()),
            response_time_ms: started.elapsed().as_millis() as u64,
        });

        let started = Instant::now();
        let blob_result = self
            .blobs
            .exists(&BlobHandle::new("health-probe"))
            .await;
        components.push(ComponentHealth {
            name: "blob_store",
            status: match blob_result {
                Ok(_) => HealthStatus::Healthy,
                Err(_) => HealthStatus::Unhealthy,
            },
            message: blob_result.err().map(|e| e.to_string()),
            response_time_ms: started.elapsed().as_millis() as u64,
        });

        let status = if components.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// GET /health
pub async fn health(State(checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    let report = checker.check().await;
    (report.http_status(), Json(report))
}

/// GET /health/live
pub async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}

/// GET /health/ready
pub async fn readiness(State(checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    let report = checker.check().await;
    (
        report.http_status(),
        Json(serde_json::json!({ "ready": report.status == HealthStatus::Healthy })),
    )
}
