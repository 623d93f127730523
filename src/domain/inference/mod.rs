//! Inference Context - 推理限界上下文
//!
//! 职责:
//! - 原始任务输入的规范化（默认值替换、类型收敛）
//! - 生成模式与默认参数定义
//! - 请求校验

mod errors;
mod request;

pub use errors::ValidationError;
pub use request::{
    GenerationDefaults, GenerationMode, ImageParams, InferenceRequest, SamplingParams,
};
