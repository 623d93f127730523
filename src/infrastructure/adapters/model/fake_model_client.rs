//! Fake Model Client - 用于测试的模型后端
//!
//! 不依赖外部服务，输出完全确定；可注入延迟与失败，
//! 并暴露调用计数供并发与幂等性测试断言

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::application::ports::{
    GenerationCall, GenerationOutput, LoadOptions, ModelBackendPort, ModelError, ModelInfo,
    RawOutput,
};
use crate::domain::inference::GenerationMode;

/// Fake Model Client 配置
#[derive(Debug, Clone)]
pub struct FakeModelClientConfig {
    /// 模拟加载耗时（毫秒）
    pub load_delay_ms: u64,
    /// 模拟生成耗时（毫秒）
    pub generate_delay_ms: u64,
    /// 注入加载失败（原因）
    pub fail_load: Option<String>,
    /// 注入生成失败（原因）
    pub fail_generate: Option<String>,
    /// 模拟落位设备
    pub device: String,
    /// 调用方未指定种子时的回退值
    pub default_seed: u64,
}

impl Default for FakeModelClientConfig {
    fn default() -> Self {
        Self {
            load_delay_ms: 0,
            generate_delay_ms: 0,
            fail_load: None,
            fail_generate: None,
            device: "cpu".to_string(),
            default_seed: 0,
        }
    }
}

/// Fake Model Client
pub struct FakeModelClient {
    config: FakeModelClientConfig,
    load_calls: AtomicU32,
    generate_calls: AtomicU32,
}

impl FakeModelClient {
    pub fn new(config: FakeModelClientConfig) -> Self {
        Self {
            config,
            load_calls: AtomicU32::new(0),
            generate_calls: AtomicU32::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeModelClientConfig::default())
    }

    /// 底层 load 被调用的次数
    pub fn load_calls(&self) -> u32 {
        self.load_calls.load(Ordering::SeqCst)
    }

    /// 底层 generate 被调用的次数
    pub fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelBackendPort for FakeModelClient {
    async fn load(&self, options: &LoadOptions) -> Result<ModelInfo, ModelError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);

        if self.config.load_delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.load_delay_ms))
                .await;
        }

        if let Some(reason) = &self.config.fail_load {
            return Err(ModelError::ServiceError(reason.clone()));
        }

        let dtype = options
            .precision
            .resolve_for(&self.config.device)
            .dtype_name()
            .to_string();

        tracing::debug!(
            model = %options.model_id,
            device = %self.config.device,
            dtype = %dtype,
            "FakeModelClient: model loaded"
        );

        Ok(ModelInfo {
            model_id: options.model_id.clone(),
            device: self.config.device.clone(),
            dtype,
            total_parameters: Some(20_000_000_000),
            cache_dir: options.cache_dir.clone(),
        })
    }

    async fn generate(
        &self,
        model: &ModelInfo,
        call: GenerationCall,
    ) -> Result<GenerationOutput, ModelError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.config.fail_generate {
            return Err(ModelError::ServiceError(reason.clone()));
        }

        if self.config.generate_delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(
                self.config.generate_delay_ms,
            ))
            .await;
        }

        let resolved_seed = call.seed.unwrap_or(self.config.default_seed);

        tracing::debug!(
            model = %model.model_id,
            mode = %call.mode.as_str(),
            resolved_seed = resolved_seed,
            "FakeModelClient: returning fixed output"
        );

        let raw = match call.mode {
            GenerationMode::Text => RawOutput::Text {
                text: format!(
                    "fake completion for: {} (seed {})",
                    call.prompt, resolved_seed
                ),
            },
            GenerationMode::Image => RawOutput::Image {
                pixels: deterministic_pixels(call.width, call.height, resolved_seed),
                width: call.width,
                height: call.height,
            },
        };

        Ok(GenerationOutput { raw, resolved_seed })
    }

    async fn health_check(&self) -> bool {
        self.config.fail_load.is_none() && self.config.fail_generate.is_none()
    }
}

/// 由种子推导的确定性 RGB8 像素图案
fn deterministic_pixels(width: u32, height: u32, seed: u64) -> Vec<u8> {
    let len = width as usize * height as usize * 3;
    (0..len)
        .map(|i| ((i as u64).wrapping_mul(31).wrapping_add(seed.wrapping_mul(131)) % 251) as u8)
        .collect()
}
