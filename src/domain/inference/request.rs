//! Inference Context - Request Value Objects
//!
//! 任务输入在此完成唯一一次规范化：缺失或非法的可选字段
//! 静默回退到文档化默认值，只有 prompt 缺失才算校验失败

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::ValidationError;

/// 生成模式
///
/// 由 Worker 配置决定，不按任务动态推断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// 文本生成（可选携带视觉输入）
    Text,
    /// 图像生成
    Image,
}

impl Default for GenerationMode {
    fn default() -> Self {
        Self::Image
    }
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// 可选字段的回退默认值集合
#[derive(Debug, Clone, Copy)]
pub struct GenerationDefaults {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            max_new_tokens: 512,
            temperature: 0.7,
            width: 1024,
            height: 1024,
            num_inference_steps: 50,
            guidance_scale: 4.0,
        }
    }
}

/// 文本生成采样参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
}

/// 图像生成参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageParams {
    pub width: u32,
    pub height: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
}

/// 规范化后的推理请求
///
/// 不变量:
/// - prompt 非空
/// - 所有数值字段都已落在合法范围内
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub sampling: SamplingParams,
    pub image: ImageParams,
    /// 调用方指定的随机种子；缺失时由模型后端选择
    pub seed: Option<u64>,
    /// 视觉输入（图像文件路径，仅文本模式使用）
    pub image_input: Option<String>,
}

impl InferenceRequest {
    /// 规范化原始任务输入
    ///
    /// 未识别的字段一律忽略（向前兼容）；数值字段类型不符或
    /// 越界时替换为默认值。整数字段不接受浮点（与调用方约定
    /// 一致），浮点字段接受整数
    pub fn normalize(
        input: &Value,
        defaults: &GenerationDefaults,
    ) -> Result<Self, ValidationError> {
        let obj = input.as_object().ok_or(ValidationError::MissingPrompt)?;

        let prompt = obj
            .get("prompt")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingPrompt)?;
        if prompt.is_empty() {
            return Err(ValidationError::MissingPrompt);
        }

        let guidance_scale = read_non_negative_float(obj, "true_cfg_scale")
            .or_else(|| read_non_negative_float(obj, "guidance_scale"))
            .unwrap_or(defaults.guidance_scale);

        Ok(Self {
            prompt: prompt.to_string(),
            negative_prompt: read_string(obj, "negative_prompt").unwrap_or_default(),
            sampling: SamplingParams {
                max_new_tokens: read_positive_int(obj, "max_new_tokens")
                    .unwrap_or(defaults.max_new_tokens),
                temperature: read_non_negative_float(obj, "temperature")
                    .unwrap_or(defaults.temperature),
            },
            image: ImageParams {
                width: read_positive_int(obj, "width").unwrap_or(defaults.width),
                height: read_positive_int(obj, "height").unwrap_or(defaults.height),
                num_inference_steps: read_positive_int(obj, "num_inference_steps")
                    .unwrap_or(defaults.num_inference_steps),
                guidance_scale,
            },
            seed: obj.get("seed").and_then(Value::as_u64),
            image_input: read_string(obj, "image_path").filter(|p| !p.is_empty()),
        })
    }
}

/// 读取字符串字段，类型不符视为缺失
fn read_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// 读取正整数字段，类型不符或非正视为缺失
///
/// JSON 浮点（如 512.0）不做整数收敛
fn read_positive_int(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    obj.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n >= 1)
}

/// 读取非负有限浮点字段，整数可收敛为浮点
fn read_non_negative_float(obj: &Map<String, Value>, key: &str) -> Option<f32> {
    obj.get(key)
        .and_then(Value::as_f64)
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f as f32)
}
