//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（ModelBackend）
//! - model: 模型生命周期（ModelState、ModelLoader）
//! - jobs: 任务执行管线（信封、执行器、编码器、处理器）
//! - error: 应用层错误定义

pub mod error;
pub mod jobs;
pub mod model;
pub mod ports;

// Re-exports
pub use error::JobError;
pub use jobs::{JobEvent, JobHandler, JobResponse};
pub use model::{ModelLoader, ModelState, ModelStatus};
