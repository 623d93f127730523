//! Data Transfer Objects
//!
//! 任务信封本身定义在 application/jobs，HTTP 层直接序列化；
//! 这里只放健康检查类的附加响应结构

use serde::Serialize;

use crate::application::model::ModelState;

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// healthy / unhealthy / loading / idle
    pub status: &'static str,
    pub version: &'static str,
    /// 进程启动时间（RFC 3339）
    pub started_at: String,
    /// 模型生命周期快照
    pub model: ModelState,
    /// 模型后端连通性
    pub backend_reachable: bool,
}

/// Ping 响应
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
}
