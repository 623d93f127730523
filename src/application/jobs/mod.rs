//! Jobs - 任务执行管线
//!
//! 一次任务的完整生命周期：
//! 信封解析 → 请求规范化 → 模型就绪 → 生成调用 → 输出编码 → 响应信封

mod encoder;
mod envelope;
mod executor;
mod handler;

pub use encoder::{EncodingError, ResultEncoder};
pub use envelope::{Artifact, JobEvent, JobOutput, JobResponse, ResolvedParameters};
pub use executor::InferenceExecutor;
pub use handler::JobHandler;
