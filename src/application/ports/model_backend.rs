//! Model Backend Port - 生成模型后端抽象
//!
//! 定义模型加载与生成调用的抽象接口，具体实现在
//! infrastructure/adapters 层。模型本身（分词、前向、采样、
//! 扩散管线）对本核心完全不透明

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::inference::GenerationMode;

/// 模型后端错误
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 设备偏好
///
/// Auto 表示优先加速器，不可用时回退 CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    Auto,
    Cuda,
    Cpu,
}

impl Default for DevicePreference {
    fn default() -> Self {
        Self::Auto
    }
}

impl DevicePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cuda => "cuda",
            Self::Cpu => "cpu",
        }
    }
}

/// 数值精度偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Auto,
    Fp16,
    Fp32,
}

impl Default for Precision {
    fn default() -> Self {
        Self::Auto
    }
}

impl Precision {
    /// 针对实际设备解析精度：加速器用半精度，CPU 用全精度
    pub fn resolve_for(self, device: &str) -> Self {
        match self {
            Self::Auto => {
                if device.starts_with("cpu") {
                    Self::Fp32
                } else {
                    Self::Fp16
                }
            }
            other => other,
        }
    }

    pub fn dtype_name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Fp16 => "float16",
            Self::Fp32 => "float32",
        }
    }
}

/// 模型加载选项
///
/// 进程启动时由配置固化，生命周期内不变
#[derive(Debug, Clone, Serialize)]
pub struct LoadOptions {
    pub model_id: String,
    /// 权重缓存目录（磁盘缓存由后端自行管理）
    pub cache_dir: String,
    pub device: DevicePreference,
    pub precision: Precision,
}

/// 已加载模型的元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    /// 实际落位设备（如 "cuda:0"、"cpu"）
    pub device: String,
    /// 实际数值精度（如 "float16"）
    pub dtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_parameters: Option<u64>,
    pub cache_dir: String,
}

/// 一次生成调用的全部参数
#[derive(Debug, Clone)]
pub struct GenerationCall {
    pub mode: GenerationMode,
    pub prompt: String,
    pub negative_prompt: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    /// 调用方指定的随机种子；None 时后端自行选择并回报
    pub seed: Option<u64>,
    /// 视觉输入（图像文件路径，文本模式可选）
    pub image_input: Option<String>,
}

/// 模型原始输出
#[derive(Debug, Clone)]
pub enum RawOutput {
    /// 解码后的文本（可能残留特殊 token 标记）
    Text { text: String },
    /// RGB8 像素缓冲
    Image {
        pixels: Vec<u8>,
        width: u32,
        height: u32,
    },
}

/// 生成结果
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub raw: RawOutput,
    /// 实际使用的随机种子（调用方未指定时由后端选择）
    pub resolved_seed: u64,
}

/// Model Backend Port
///
/// 外部生成模型的抽象接口
#[async_trait]
pub trait ModelBackendPort: Send + Sync {
    /// 加载模型
    ///
    /// 进程生命周期内至多成功执行一次，单飞语义由 ModelLoader 保证
    async fn load(&self, options: &LoadOptions) -> Result<ModelInfo, ModelError>;

    /// 执行一次生成调用
    ///
    /// 阻塞直至后端返回或出错（可能持续数分钟）；错误原样上抛
    async fn generate(
        &self,
        model: &ModelInfo,
        call: GenerationCall,
    ) -> Result<GenerationOutput, ModelError>;

    /// 检查后端是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_auto_resolves_by_device() {
        assert_eq!(Precision::Auto.resolve_for("cuda:0"), Precision::Fp16);
        assert_eq!(Precision::Auto.resolve_for("cpu"), Precision::Fp32);
    }

    #[test]
    fn test_explicit_precision_is_kept() {
        assert_eq!(Precision::Fp32.resolve_for("cuda:0"), Precision::Fp32);
        assert_eq!(Precision::Fp16.resolve_for("cpu"), Precision::Fp16);
    }

    #[test]
    fn test_dtype_names() {
        assert_eq!(Precision::Fp16.dtype_name(), "float16");
        assert_eq!(Precision::Fp32.dtype_name(), "float32");
    }
}
