//! API handlers for the plancheck server
//!
//! Provides REST endpoints for:
//! - Checking an uploaded DXF drawing
//! - Fetching a stored result (full or summary)

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use compliance_engine::{CheckConfig, ComplianceEngine};
use shared_types::{CheckOutcome, ComplianceReport, Diagnostic, ReportSummary};

use crate::error::ServerError;
use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /healthz
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "plancheck-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// A finished check kept for later retrieval
#[derive(Debug, Clone, Serialize)]
pub struct StoredResult {
    pub filename: Option<String>,
    pub checked_at: DateTime<Utc>,
    pub outcome: CheckOutcome,
}

/// In-memory results keyed by token, oldest evicted past `capacity`
#[derive(Debug)]
pub struct ResultStore {
    capacity: usize,
    entries: HashMap<String, StoredResult>,
    /// Tokens in insertion order, which is also `checked_at` order
    order: VecDeque<String>,
}

impl ResultStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn insert(&mut self, token: String, result: StoredResult) {
        if self.entries.insert(token.clone(), result).is_none() {
            self.order.push_back(token);
        }
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            debug!("Evicted stored result {}", oldest);
        }
    }

    pub fn get(&self, token: &str) -> Option<&StoredResult> {
        self.entries.get(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Check request body
#[derive(Deserialize)]
pub struct CheckRequest {
    /// Original file name, echoed back in stored results
    pub filename: Option<String>,

    /// Base64-encoded DXF content
    pub dxf_base64: String,

    /// Partial config overriding the server defaults for this request only
    pub config: Option<serde_json::Value>,
}

/// Check response
#[derive(Serialize)]
pub struct CheckResponse {
    pub success: bool,
    pub token: String,
    pub summary: ReportSummary,
    pub report: ComplianceReport,
    pub diagnostics: Vec<Diagnostic>,
}

/// Handler: POST /api/check
pub async fn handle_check(
    State(state): State<AppState>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, ServerError> {
    let bytes = decode_upload(&req.dxf_base64)?;
    info!(
        "Check request: file={}, size={}",
        req.filename.as_deref().unwrap_or("<unnamed>"),
        bytes.len()
    );

    let config = match &req.config {
        Some(overrides) => {
            debug!("Config overrides: {}", overrides);
            state
                .config
                .merged_with(overrides)
                .map_err(|e| ServerError::InvalidRequest(e.to_string()))?
        }
        None => state.config.as_ref().clone(),
    };

    let outcome = run_with_timeout(bytes, config, state.timeout_ms).await?;

    let token = Uuid::new_v4().to_string();
    let stored = StoredResult {
        filename: req.filename,
        checked_at: Utc::now(),
        outcome: outcome.clone(),
    };
    let mut results = state.results.write().await;
    results.insert(token.clone(), stored);
    debug!("Stored result {} ({} kept)", token, results.len());
    drop(results);

    Ok(Json(CheckResponse {
        success: true,
        token,
        summary: outcome.report.summary(),
        report: outcome.report,
        diagnostics: outcome.diagnostics,
    }))
}

/// Handler: GET /api/results/:token
pub async fn handle_get_result(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<StoredResult>, ServerError> {
    let results = state.results.read().await;
    results
        .get(&token)
        .cloned()
        .map(Json)
        .ok_or(ServerError::ResultNotFound(token))
}

/// Stored result summary response
#[derive(Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub token: String,
    pub filename: Option<String>,
    pub checked_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub compliant: bool,
}

/// Handler: GET /api/results/:token/summary
pub async fn handle_get_summary(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<SummaryResponse>, ServerError> {
    let results = state.results.read().await;
    let stored = results
        .get(&token)
        .ok_or_else(|| ServerError::ResultNotFound(token.clone()))?;

    Ok(Json(SummaryResponse {
        success: true,
        filename: stored.filename.clone(),
        checked_at: stored.checked_at,
        summary: stored.outcome.report.summary(),
        compliant: stored.outcome.report.is_compliant(),
        token,
    }))
}

fn decode_upload(encoded: &str) -> Result<Vec<u8>, ServerError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ServerError::InvalidRequest(format!("dxf_base64 is not valid base64: {}", e)))?;
    if bytes.is_empty() {
        return Err(ServerError::InvalidRequest("Uploaded drawing is empty".to_string()));
    }
    Ok(bytes)
}

/// Parse and check `bytes` on the blocking pool
///
/// The engine has no cancellation point, so on timeout the task is left to
/// finish in the background and its result is dropped.
pub async fn run_with_timeout(
    bytes: Vec<u8>,
    config: CheckConfig,
    timeout_ms: u64,
) -> Result<CheckOutcome, ServerError> {
    let task = tokio::task::spawn_blocking(move || check_bytes(&bytes, config));

    match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ServerError::Internal(format!(
            "Check task failed: {}",
            join_err
        ))),
        Err(_) => {
            warn!("Check abandoned after {}ms", timeout_ms);
            Err(ServerError::Timeout(timeout_ms))
        }
    }
}

fn check_bytes(bytes: &[u8], config: CheckConfig) -> Result<CheckOutcome, ServerError> {
    let drawing = shared_dxf::load_bytes(bytes)?;
    let engine = ComplianceEngine::with_config(config)
        .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
    Ok(engine.check(&drawing))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = handle_health().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.service, "plancheck-server");
    }

    fn stored(filename: &str) -> StoredResult {
        StoredResult {
            filename: Some(filename.to_string()),
            checked_at: Utc::now(),
            outcome: ComplianceEngine::new().check(&shared_types::Drawing::builder().build()),
        }
    }

    #[test]
    fn test_result_store_evicts_oldest() {
        let mut store = ResultStore::new(2);
        store.insert("a".to_string(), stored("a.dxf"));
        store.insert("b".to_string(), stored("b.dxf"));
        store.insert("c".to_string(), stored("c.dxf"));

        assert_eq!(store.len(), 2);
        assert!(store.get("a").is_none());
        assert!(store.get("b").is_some());
        assert!(store.get("c").is_some());
    }

    #[test]
    fn test_result_store_with_zero_capacity_keeps_nothing() {
        let mut store = ResultStore::new(0);
        store.insert("a".to_string(), stored("a.dxf"));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_decode_upload_rejects_bad_input() {
        assert!(matches!(
            decode_upload("***"),
            Err(ServerError::InvalidRequest(_))
        ));
        assert!(matches!(
            decode_upload(""),
            Err(ServerError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_decode_upload_trims_whitespace() {
        assert_eq!(decode_upload(" MTIz\n").unwrap(), b"123".to_vec());
    }
}
