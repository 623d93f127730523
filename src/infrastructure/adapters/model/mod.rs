//! Model Backend Adapters - ModelBackendPort 实现
//!
//! - HttpModelClient: 通过 HTTP 调用承载模型的推理服务
//! - FakeModelClient: 确定性替身，用于测试与离线开发

mod fake_model_client;
mod http_model_client;

pub use fake_model_client::{FakeModelClient, FakeModelClientConfig};
pub use http_model_client::{HttpModelClient, HttpModelClientConfig};
