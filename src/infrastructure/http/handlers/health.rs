//! Health Handlers - 健康检查与存活探针

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::model::ModelStatus;
use crate::infrastructure::http::dto::{HealthResponse, PingResponse};
use crate::infrastructure::http::state::AppState;

/// Health endpoint - 模型生命周期状态 + 元数据
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let model = state.loader.state();
    let status = match model.status {
        ModelStatus::Loaded => "healthy",
        ModelStatus::Failed => "unhealthy",
        ModelStatus::Loading => "loading",
        ModelStatus::Unloaded => "idle",
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at.to_rfc3339(),
        model,
        backend_reachable: state.backend.health_check().await,
    })
}

/// Ping endpoint - 存活探针
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
