//! Genie - 生成模型推理 Worker
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Inference Context: 推理请求的规范化与校验
//!
//! 应用层 (application/):
//! - Ports: 端口定义（ModelBackendPort）
//! - Model: 模型生命周期（ModelState, ModelLoader）
//! - Jobs: 任务执行管线（Handler → Executor → Encoder）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 任务分发入口 + 健康检查
//! - Adapters: 模型后端客户端（HTTP / Fake）

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
