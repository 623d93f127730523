//! Model Lifecycle State
//!
//! 纯数据模型，状态迁移由 ModelLoader 驱动

use serde::Serialize;

use crate::application::ports::ModelInfo;

/// 模型生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    /// 尚未有任务触发加载
    Unloaded,
    /// 首次加载进行中，并发任务等待同一结果
    Loading,
    /// 加载成功，句柄只读共享
    Loaded,
    /// 加载失败，所有后续任务以同一原因快速失败
    Failed,
}

impl ModelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        }
    }
}

/// 生命周期快照
///
/// 不变量:
/// - model 仅在 Loaded 时存在
/// - failure_reason 仅在 Failed 时存在
#[derive(Debug, Clone, Serialize)]
pub struct ModelState {
    pub status: ModelStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// 底层加载尝试次数（成败合计，进程生命周期内至多 1）
    pub load_attempts: u32,
}
