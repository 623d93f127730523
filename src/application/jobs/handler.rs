//! Job Handler - 任务执行状态机
//!
//! 状态机: RECEIVED → VALIDATED → EXECUTED → ENCODED → RESPONDED，
//! 任一阶段失败进入 FAILED。
//!
//! 单一失败边界：任何阶段的错误都收敛为错误信封，分发运行时
//! 永远收到结构化响应，进程不会因单个任务崩溃

use std::sync::Arc;
use std::time::Instant;

use super::encoder::ResultEncoder;
use super::envelope::{JobEvent, JobOutput, JobResponse};
use super::executor::InferenceExecutor;
use crate::application::error::JobError;
use crate::application::model::ModelLoader;
use crate::domain::inference::{GenerationDefaults, InferenceRequest};

/// 任务阶段（仅用于日志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobStage {
    Received,
    Validated,
    Executed,
    Encoded,
    Responded,
    Failed,
}

impl JobStage {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Executed => "executed",
            Self::Encoded => "encoded",
            Self::Responded => "responded",
            Self::Failed => "failed",
        }
    }
}

/// 任务处理器
///
/// 每个任务调用一次 handle，编排校验 → 模型就绪 → 执行 → 编码
pub struct JobHandler {
    loader: Arc<ModelLoader>,
    executor: InferenceExecutor,
    encoder: ResultEncoder,
    defaults: GenerationDefaults,
}

impl JobHandler {
    pub fn new(
        loader: Arc<ModelLoader>,
        executor: InferenceExecutor,
        encoder: ResultEncoder,
        defaults: GenerationDefaults,
    ) -> Self {
        Self {
            loader,
            executor,
            encoder,
            defaults,
        }
    }

    /// 任务入口
    pub async fn handle(&self, event: JobEvent) -> JobResponse {
        let job_id = event.job_id();
        let started = Instant::now();
        tracing::info!(job_id = %job_id, stage = JobStage::Received.as_str(), "Job received");

        match self.process(&job_id, &event).await {
            Ok(output) => {
                tracing::info!(
                    job_id = %job_id,
                    stage = JobStage::Responded.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Job completed"
                );
                JobResponse::success(output)
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job_id,
                    stage = JobStage::Failed.as_str(),
                    phase = e.phase(),
                    error = %e,
                    "Job failed"
                );
                JobResponse::error(e.to_string(), e.traceback())
            }
        }
    }

    async fn process(&self, job_id: &str, event: &JobEvent) -> Result<JobOutput, JobError> {
        // 校验在前：非法输入不触发冷启动加载
        let request = InferenceRequest::normalize(&event.input, &self.defaults)?;
        tracing::debug!(
            job_id = %job_id,
            stage = JobStage::Validated.as_str(),
            prompt_len = request.prompt.len(),
            seed = ?request.seed,
            "Input normalized"
        );

        let model = self.loader.ensure_loaded().await?;

        let output = self
            .executor
            .run(&model.info, &request)
            .await
            .map_err(JobError::Execution)?;
        tracing::debug!(
            job_id = %job_id,
            stage = JobStage::Executed.as_str(),
            resolved_seed = output.resolved_seed,
            "Generation finished"
        );

        let payload = self.encoder.encode(&output, &request)?;
        tracing::debug!(job_id = %job_id, stage = JobStage::Encoded.as_str(), "Output encoded");

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DevicePreference, LoadOptions, Precision};
    use crate::domain::inference::GenerationMode;
    use crate::infrastructure::adapters::{FakeModelClient, FakeModelClientConfig};
    use serde_json::json;

    const MODEL_ID: &str = "Qwen/Qwen-Image";

    fn make_handler(
        mode: GenerationMode,
        config: FakeModelClientConfig,
    ) -> (Arc<JobHandler>, Arc<FakeModelClient>) {
        let backend = Arc::new(FakeModelClient::new(config));
        let loader = ModelLoader::new(
            backend.clone(),
            LoadOptions {
                model_id: MODEL_ID.to_string(),
                cache_dir: "/tmp/weights".to_string(),
                device: DevicePreference::Auto,
                precision: Precision::Auto,
            },
        )
        .arc();
        let handler = JobHandler::new(
            loader,
            InferenceExecutor::new(backend.clone(), mode),
            ResultEncoder::new(MODEL_ID, mode),
            GenerationDefaults::default(),
        );
        (Arc::new(handler), backend)
    }

    fn event(input: serde_json::Value) -> JobEvent {
        JobEvent::new(input)
    }

    fn response_json(response: &JobResponse) -> serde_json::Value {
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_image_job_with_defaults() {
        // Scenario A: 仅 prompt，图像模式回显默认参数
        let (handler, _) = make_handler(GenerationMode::Image, FakeModelClientConfig::default());
        let response = handler.handle(event(json!({"prompt": "a red fox"}))).await;

        let json = response_json(&response);
        assert_eq!(json["status"], "success");
        assert_eq!(json["output"]["parameters"]["width"], 1024);
        assert_eq!(json["output"]["parameters"]["num_inference_steps"], 50);
        assert_eq!(json["output"]["model"], MODEL_ID);
        assert_eq!(json["output"]["prompt"], "a red fox");
        assert!(json["output"]["image"].is_string());
    }

    #[tokio::test]
    async fn test_empty_prompt_fails_without_model_call() {
        // Scenario B: prompt 为空 → 错误信封，模型完全不被触发
        let (handler, backend) = make_handler(GenerationMode::Image, FakeModelClientConfig::default());
        let response = handler.handle(event(json!({"prompt": ""}))).await;

        let json = response_json(&response);
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "prompt parameter is required");
        assert!(json.get("traceback").is_none());
        assert_eq!(backend.load_calls(), 0);
        assert_eq!(backend.generate_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_token_count_falls_back_to_default() {
        // Scenario C: 非法 max_new_tokens 回退默认值
        let (handler, _) = make_handler(GenerationMode::Text, FakeModelClientConfig::default());
        let response = handler
            .handle(event(json!({"prompt": "cat", "max_new_tokens": -5})))
            .await;

        let json = response_json(&response);
        assert_eq!(json["status"], "success");
        assert_eq!(json["output"]["parameters"]["max_new_tokens"], 512);
        assert!(json["output"]["generated_text"].is_string());
    }

    #[tokio::test]
    async fn test_explicit_seed_is_reproducible() {
        let (handler, _) = make_handler(GenerationMode::Text, FakeModelClientConfig::default());
        let input = json!({"prompt": "hi", "seed": 1234});

        let first = response_json(&handler.handle(event(input.clone())).await);
        let second = response_json(&handler.handle(event(input)).await);

        assert_eq!(first["output"]["seed"], 1234);
        assert_eq!(first["output"]["parameters"]["seed"], 1234);
        assert_eq!(first["output"]["seed"], second["output"]["seed"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_cold_start_loads_once() {
        // Scenario D: 两个并发任务共享同一次冷启动加载
        let (handler, backend) = make_handler(
            GenerationMode::Image,
            FakeModelClientConfig {
                load_delay_ms: 100,
                ..Default::default()
            },
        );

        let h1 = {
            let handler = handler.clone();
            tokio::spawn(async move { handler.handle(event(json!({"prompt": "first"}))).await })
        };
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        let h2 = {
            let handler = handler.clone();
            tokio::spawn(async move { handler.handle(event(json!({"prompt": "second"}))).await })
        };

        assert!(h1.await.unwrap().is_success());
        assert!(h2.await.unwrap().is_success());
        assert_eq!(backend.load_calls(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_is_sticky_across_jobs() {
        // Scenario E: 加载失败后所有任务返回同一错误信封，不重试
        let (handler, backend) = make_handler(
            GenerationMode::Image,
            FakeModelClientConfig {
                fail_load: Some("device unavailable".to_string()),
                ..Default::default()
            },
        );

        let first = response_json(&handler.handle(event(json!({"prompt": "a"}))).await);
        let second = response_json(&handler.handle(event(json!({"prompt": "b"}))).await);

        assert_eq!(first["status"], "error");
        assert_eq!(first["error"], second["error"]);
        assert!(first["error"].as_str().unwrap().contains("device unavailable"));
        assert_eq!(backend.load_calls(), 1);
        assert_eq!(backend.generate_calls(), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_model_loaded() {
        let (handler, backend) = make_handler(
            GenerationMode::Text,
            FakeModelClientConfig {
                fail_generate: Some("CUDA out of memory".to_string()),
                ..Default::default()
            },
        );

        let response = response_json(&handler.handle(event(json!({"prompt": "hi"}))).await);
        assert_eq!(response["status"], "error");
        assert!(response["traceback"].is_string());

        // 执行失败不影响模型状态，后续任务仍会尝试生成
        let again = response_json(&handler.handle(event(json!({"prompt": "hi"}))).await);
        assert_eq!(again["status"], "error");
        assert_eq!(backend.load_calls(), 1);
        assert_eq!(backend.generate_calls(), 2);
    }
}
