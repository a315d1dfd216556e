use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::{ClientRegistry, FlushOutcome};
use crate::error::{ClientError, TransportError};
use crate::model::auction::{AuctionRequest, AuctionResponse};
use crate::model::events::EventBatch;
use crate::model::status::{IntegrationStatus, PerformanceReport};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ClientRegistry>,
}

#[derive(Deserialize, Debug)]
pub struct InitializeRequest {
    pub credential: String,
}

fn default_error_rate() -> f64 {
    0.3
}

#[derive(Deserialize, Debug)]
pub struct ErrorSimulationRequest {
    pub enabled: bool,
    #[serde(default = "default_error_rate")]
    pub rate: f64,
}

/// 错误到 HTTP 状态码的映射
impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let status = match &self {
            ClientError::Validation(_) => StatusCode::BAD_REQUEST,
            ClientError::NotInitialized => StatusCode::CONFLICT,
            ClientError::Transient(TransportError::Injected { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            ClientError::Transient(TransportError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// **初始化（或替换）客户端**
pub async fn handle_initialize(
    State(state): State<Arc<AppState>>,
    Json(body): Json<InitializeRequest>,
) -> Result<StatusCode, ClientError> {
    state.registry.initialize(&body.credential).await?;
    info!("client initialized via api");
    Ok(StatusCode::NO_CONTENT)
}

/// **发起竞价**
pub async fn handle_create_auction(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuctionRequest>,
) -> Result<Json<AuctionResponse>, ClientError> {
    let client = state.registry.client().await?;
    let response = client.create_auction(&request).await?;
    Ok(Json(response))
}

/// **上报事件**（只入队，返回 202）
pub async fn handle_report_events(
    State(state): State<Arc<AppState>>,
    Json(batch): Json<EventBatch>,
) -> Result<StatusCode, ClientError> {
    let client = state.registry.client().await?;
    client.report_event(batch).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn handle_flush_events(State(state): State<Arc<AppState>>) -> Result<Json<FlushOutcome>, ClientError> {
    let client = state.registry.client().await?;
    Ok(Json(client.flush().await?))
}

pub async fn handle_get_status(State(state): State<Arc<AppState>>) -> Result<Json<IntegrationStatus>, ClientError> {
    let client = state.registry.client().await?;
    Ok(Json(client.get_status().await))
}

pub async fn handle_clear_errors(State(state): State<Arc<AppState>>) -> Result<StatusCode, ClientError> {
    let client = state.registry.client().await?;
    client.clear_errors().await;
    Ok(StatusCode::NO_CONTENT)
}

/// **开关故障注入**（测试 / 演示用）
pub async fn handle_error_simulation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ErrorSimulationRequest>,
) -> Result<StatusCode, ClientError> {
    state.registry.set_error_simulation(body.enabled, body.rate).await?;
    warn!(enabled = body.enabled, rate = body.rate, "error simulation toggled via api");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_clear_personalization(State(state): State<Arc<AppState>>) -> StatusCode {
    state.registry.clear_personalization().await;
    StatusCode::NO_CONTENT
}

pub async fn handle_performance(State(state): State<Arc<AppState>>) -> Json<PerformanceReport> {
    Json(state.registry.performance().await)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/initialize", post(handle_initialize))
        .route("/auctions", post(handle_create_auction))
        .route("/events", post(handle_report_events))
        .route("/events/flush", post(handle_flush_events))
        .route("/status", get(handle_get_status))
        .route("/status/errors", delete(handle_clear_errors))
        .route("/simulation/errors", post(handle_error_simulation))
        .route("/personalization", delete(handle_clear_personalization))
        .route("/performance", get(handle_performance))
        .with_state(state)
}
