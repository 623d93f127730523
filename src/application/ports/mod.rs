//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod model_backend;

pub use model_backend::{
    DevicePreference, GenerationCall, GenerationOutput, LoadOptions, ModelBackendPort, ModelError,
    ModelInfo, Precision, RawOutput,
};
