//! Application State

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::jobs::JobHandler;
use crate::application::model::ModelLoader;
use crate::application::ports::ModelBackendPort;

/// 应用状态
///
/// 任务之间共享的只读依赖集合
pub struct AppState {
    pub job_handler: Arc<JobHandler>,
    pub loader: Arc<ModelLoader>,
    pub backend: Arc<dyn ModelBackendPort>,
    /// 进程启动时间（健康检查回显）
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        job_handler: Arc<JobHandler>,
        loader: Arc<ModelLoader>,
        backend: Arc<dyn ModelBackendPort>,
    ) -> Self {
        Self {
            job_handler,
            loader,
            backend,
            started_at: Utc::now(),
        }
    }
}
