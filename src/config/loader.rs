//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `GENIE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `GENIE_SERVER__PORT=9090`
/// - `GENIE_MODEL__ID=Qwen/Qwen-Image`
/// - `GENIE_MODEL__CACHE_DIR=/runpod-volume/qwen_image`
/// - `GENIE_BACKEND__URL=http://model-server:8000`
/// - `GENIE_GENERATION__MODE=image`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("model.id", "Qwen/Qwen-Image")?
        .set_default("model.cache_dir", default_cache_dir())?
        .set_default("model.device", "auto")?
        .set_default("model.precision", "auto")?
        .set_default("backend.url", "http://localhost:8000")?
        .set_default("backend.timeout_secs", 600)?
        .set_default("generation.mode", "image")?
        .set_default("generation.max_new_tokens", 512)?
        .set_default("generation.temperature", 0.7)?
        .set_default("generation.width", 1024)?
        .set_default("generation.height", 1024)?
        .set_default("generation.num_inference_steps", 50)?
        .set_default("generation.guidance_scale", 4.0)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: GENIE_
    // 层级分隔符: __ (双下划线)
    // 例如: GENIE_BACKEND__URL=http://model-server:8000
    builder = builder.add_source(
        Environment::with_prefix("GENIE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 缓存目录默认值，沿用 TRANSFORMERS_CACHE 环境变量约定
fn default_cache_dir() -> String {
    std::env::var("TRANSFORMERS_CACHE")
        .unwrap_or_else(|_| "/runpod-volume/qwen_image".to_string())
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证端口范围
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    // 验证模型标识
    if config.model.id.is_empty() {
        return Err(ConfigError::ValidationError(
            "Model id cannot be empty".to_string(),
        ));
    }

    // 验证缓存目录
    if config.model.cache_dir.is_empty() {
        return Err(ConfigError::ValidationError(
            "Model cache dir cannot be empty".to_string(),
        ));
    }

    // 验证后端 URL
    if config.backend.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Backend URL cannot be empty".to_string(),
        ));
    }

    if config.backend.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Backend timeout cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Model: {}", config.model.id);
    tracing::info!("Cache Dir: {}", config.model.cache_dir);
    tracing::info!("Device: {:?}", config.model.device);
    tracing::info!("Precision: {:?}", config.model.precision);
    tracing::info!("Backend URL: {}", config.backend.url);
    tracing::info!("Backend Timeout: {}s", config.backend.timeout_secs);
    tracing::info!("Generation Mode: {:?}", config.generation.mode);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
