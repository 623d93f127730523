//! Model Loader - 一次性惰性初始化
//!
//! 整个进程生命周期内底层加载至多执行一次：
//! - 首个调用方触发加载，期间并发调用方阻塞等待同一结果
//! - 成功后缓存句柄（只读共享），失败后缓存原因（不重试）
//! - 初始化由首次使用触发，而非进程启动顺序

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::OnceCell;

use super::state::{ModelState, ModelStatus};
use crate::application::ports::{LoadOptions, ModelBackendPort, ModelError, ModelInfo};

/// 初始化错误
///
/// 可克隆：失败结果被缓存后由所有后续任务共享
#[derive(Debug, Clone, Error)]
#[error("model initialization failed: {reason}")]
pub struct InitError {
    pub reason: String,
}

impl From<ModelError> for InitError {
    fn from(err: ModelError) -> Self {
        Self {
            reason: err.to_string(),
        }
    }
}

/// 已加载模型句柄
///
/// 加载成功后不可变，所有任务并发只读使用
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub info: ModelInfo,
}

/// 模型加载器
pub struct ModelLoader {
    backend: Arc<dyn ModelBackendPort>,
    options: LoadOptions,
    outcome: OnceCell<Result<Arc<LoadedModel>, InitError>>,
    loading: AtomicBool,
    attempts: AtomicU32,
}

impl ModelLoader {
    pub fn new(backend: Arc<dyn ModelBackendPort>, options: LoadOptions) -> Self {
        Self {
            backend,
            options,
            outcome: OnceCell::new(),
            loading: AtomicBool::new(false),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 幂等加载入口
    ///
    /// 首次调用执行加载并缓存结果；之后 Loaded 走快路径直接
    /// 返回句柄，Failed 立即返回缓存的原因
    pub async fn ensure_loaded(&self) -> Result<Arc<LoadedModel>, InitError> {
        let outcome = self
            .outcome
            .get_or_init(|| async {
                self.loading.store(true, Ordering::SeqCst);
                self.attempts.fetch_add(1, Ordering::SeqCst);
                tracing::info!(
                    model = %self.options.model_id,
                    cache_dir = %self.options.cache_dir,
                    device = %self.options.device.as_str(),
                    "Loading model"
                );

                let result = match self.backend.load(&self.options).await {
                    Ok(info) => {
                        tracing::info!(
                            model = %info.model_id,
                            device = %info.device,
                            dtype = %info.dtype,
                            "Model loaded"
                        );
                        Ok(Arc::new(LoadedModel { info }))
                    }
                    Err(e) => {
                        tracing::error!(model = %self.options.model_id, error = %e, "Model load failed");
                        Err(InitError::from(e))
                    }
                };
                self.loading.store(false, Ordering::SeqCst);
                result
            })
            .await;

        outcome.clone()
    }

    /// 当前生命周期快照（供健康检查）
    pub fn state(&self) -> ModelState {
        let (status, model, failure_reason) = match self.outcome.get() {
            Some(Ok(loaded)) => (ModelStatus::Loaded, Some(loaded.info.clone()), None),
            Some(Err(e)) => (ModelStatus::Failed, None, Some(e.reason.clone())),
            None if self.loading.load(Ordering::SeqCst) => (ModelStatus::Loading, None, None),
            None => (ModelStatus::Unloaded, None, None),
        };

        ModelState {
            status,
            model,
            failure_reason,
            load_attempts: self.attempts.load(Ordering::SeqCst),
        }
    }

    /// 底层加载尝试次数
    pub fn load_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DevicePreference, Precision};
    use crate::infrastructure::adapters::{FakeModelClient, FakeModelClientConfig};

    fn load_options() -> LoadOptions {
        LoadOptions {
            model_id: "Qwen/Qwen-Image".to_string(),
            cache_dir: "/tmp/weights".to_string(),
            device: DevicePreference::Auto,
            precision: Precision::Auto,
        }
    }

    fn loader_with(config: FakeModelClientConfig) -> (Arc<ModelLoader>, Arc<FakeModelClient>) {
        let backend = Arc::new(FakeModelClient::new(config));
        let loader = ModelLoader::new(backend.clone(), load_options()).arc();
        (loader, backend)
    }

    #[tokio::test]
    async fn test_initial_state_is_unloaded() {
        let (loader, _) = loader_with(FakeModelClientConfig::default());
        let state = loader.state();
        assert_eq!(state.status, ModelStatus::Unloaded);
        assert_eq!(state.load_attempts, 0);
    }

    #[tokio::test]
    async fn test_successful_load_transitions_to_loaded() {
        let (loader, backend) = loader_with(FakeModelClientConfig::default());

        let model = loader.ensure_loaded().await.unwrap();
        assert_eq!(model.info.model_id, "Qwen/Qwen-Image");

        let state = loader.state();
        assert_eq!(state.status, ModelStatus::Loaded);
        assert!(state.model.is_some());
        assert_eq!(state.load_attempts, 1);
        assert_eq!(backend.load_calls(), 1);
    }

    #[tokio::test]
    async fn test_repeated_calls_hit_fast_path() {
        let (loader, backend) = loader_with(FakeModelClientConfig::default());

        for _ in 0..5 {
            loader.ensure_loaded().await.unwrap();
        }
        assert_eq!(backend.load_calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_trigger_single_load() {
        let (loader, backend) = loader_with(FakeModelClientConfig {
            load_delay_ms: 100,
            ..Default::default()
        });

        let mut handles = Vec::new();
        for _ in 0..8 {
            let loader = loader.clone();
            handles.push(tokio::spawn(async move { loader.ensure_loaded().await }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        assert_eq!(backend.load_calls(), 1);
        assert_eq!(loader.load_attempts(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_sticky() {
        let (loader, backend) = loader_with(FakeModelClientConfig {
            fail_load: Some("weights not found".to_string()),
            ..Default::default()
        });

        let first = loader.ensure_loaded().await.unwrap_err();
        let second = loader.ensure_loaded().await.unwrap_err();

        // 同一原因，不重试
        assert_eq!(first.reason, second.reason);
        assert!(first.reason.contains("weights not found"));
        assert_eq!(backend.load_calls(), 1);

        let state = loader.state();
        assert_eq!(state.status, ModelStatus::Failed);
        assert!(state.failure_reason.is_some());
    }
}
