//! Job Envelopes - 任务事件与响应信封
//!
//! 每个任务恰好产生一个信封：成功或错误，永不部分填充

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 分发运行时投递的任务事件
#[derive(Debug, Clone, Deserialize)]
pub struct JobEvent {
    /// 任务标识（缺失时生成 UUID，仅用于日志）
    #[serde(default)]
    pub id: Option<String>,

    /// 原始任务输入，规范化前不做任何假设
    #[serde(default)]
    pub input: Value,
}

impl JobEvent {
    pub fn new(input: Value) -> Self {
        Self { id: None, input }
    }

    /// 日志用任务标识
    pub fn job_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }
}

/// 任务响应信封
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobResponse {
    Success {
        output: JobOutput,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        traceback: Option<String>,
    },
}

impl JobResponse {
    pub fn success(output: JobOutput) -> Self {
        Self::Success { output }
    }

    pub fn error(error: impl Into<String>, traceback: Option<String>) -> Self {
        Self::Error {
            error: error.into(),
            traceback,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// 成功载荷
#[derive(Debug, Clone, Serialize)]
pub struct JobOutput {
    #[serde(flatten)]
    pub artifact: Artifact,

    /// 模型标识
    pub model: String,

    /// 原始 prompt 回显
    pub prompt: String,

    /// 实际生效的参数（规范化后的值，而非调用方原始输入）
    pub parameters: ResolvedParameters,

    /// 实际使用的随机种子
    pub seed: u64,
}

/// 生成产物
///
/// 图像以 base64 文本表示，二进制数据不进入 JSON 传输通道
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Artifact {
    Text { generated_text: String },
    Image { image: String },
}

/// 回显给调用方的已解析参数
///
/// 只序列化当前生成模式实际生效的字段
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_inference_steps: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    pub seed: u64,
}
