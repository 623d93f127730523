//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

use crate::application::ports::{DevicePreference, Precision};
use crate::domain::inference::{GenerationDefaults, GenerationMode};

/// 应用主配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 模型配置
    #[serde(default)]
    pub model: ModelConfig,

    /// 模型后端配置
    #[serde(default)]
    pub backend: BackendConfig,

    /// 生成参数配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            backend: BackendConfig::default(),
            generation: GenerationConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 模型配置
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// 模型标识（HuggingFace 格式）
    #[serde(default = "default_model_id")]
    pub id: String,

    /// 模型权重缓存目录
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// 设备偏好
    /// 可选: auto, cuda, cpu
    #[serde(default)]
    pub device: DevicePreference,

    /// 数值精度偏好
    /// 可选: auto, fp16, fp32
    #[serde(default)]
    pub precision: Precision,
}

fn default_model_id() -> String {
    "Qwen/Qwen-Image".to_string()
}

/// 缓存目录默认值，沿用 TRANSFORMERS_CACHE 环境变量约定
fn default_cache_dir() -> String {
    std::env::var("TRANSFORMERS_CACHE")
        .unwrap_or_else(|_| "/runpod-volume/qwen_image".to_string())
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: default_model_id(),
            cache_dir: default_cache_dir(),
            device: DevicePreference::default(),
            precision: Precision::default(),
        }
    }
}

/// 模型后端配置
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// 模型后端服务基础 URL
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// 请求超时时间（秒）
    /// 生成调用可能持续数分钟
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_backend_timeout() -> u64 {
    600
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

/// 生成参数配置
///
/// mode 决定执行路径（text 或 image），其余字段是
/// 请求字段缺失或非法时的回退默认值
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// 生成模式
    /// 可选: text, image
    #[serde(default)]
    pub mode: GenerationMode,

    /// 最大生成 token 数默认值
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// 采样温度默认值
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// 图像宽度默认值（像素）
    #[serde(default = "default_dimension")]
    pub width: u32,

    /// 图像高度默认值（像素）
    #[serde(default = "default_dimension")]
    pub height: u32,

    /// 扩散步数默认值
    #[serde(default = "default_num_inference_steps")]
    pub num_inference_steps: u32,

    /// CFG 引导系数默认值
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,
}

fn default_max_new_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_dimension() -> u32 {
    1024
}

fn default_num_inference_steps() -> u32 {
    50
}

fn default_guidance_scale() -> f32 {
    4.0
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            mode: GenerationMode::default(),
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            width: default_dimension(),
            height: default_dimension(),
            num_inference_steps: default_num_inference_steps(),
            guidance_scale: default_guidance_scale(),
        }
    }
}

impl GenerationConfig {
    /// 转换为领域层的默认值集合
    pub fn defaults(&self) -> GenerationDefaults {
        GenerationDefaults {
            max_new_tokens: self.max_new_tokens,
            temperature: self.temperature,
            width: self.width,
            height: self.height,
            num_inference_steps: self.num_inference_steps,
            guidance_scale: self.guidance_scale,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.model.id, "Qwen/Qwen-Image");
        assert_eq!(config.backend.url, "http://localhost:8000");
        assert_eq!(config.generation.max_new_tokens, 512);
        assert_eq!(config.generation.num_inference_steps, 50);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_generation_defaults_mapping() {
        let config = GenerationConfig::default();
        let defaults = config.defaults();
        assert_eq!(defaults.max_new_tokens, 512);
        assert_eq!(defaults.temperature, 0.7);
        assert_eq!(defaults.width, 1024);
        assert_eq!(defaults.height, 1024);
        assert_eq!(defaults.guidance_scale, 4.0);
    }
}
