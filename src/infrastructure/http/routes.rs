//! HTTP Routes
//!
//! API Endpoints:
//! - /run     POST  执行一个任务（请求体为任务事件，响应为信封）
//! - /health  GET   模型生命周期状态 + 元数据
//! - /ping    GET   存活探针

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run", post(handlers::run_job))
        .route("/health", get(handlers::health))
        .route("/ping", get(handlers::ping))
}
