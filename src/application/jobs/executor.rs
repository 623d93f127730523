//! Inference Executor - 生成调用驱动
//!
//! 将规范化请求翻译为一次生成调用并驱动模型后端。
//! 除种子簿记外不解释任何后端错误，原样上抛

use std::sync::Arc;

use crate::application::ports::{
    GenerationCall, GenerationOutput, ModelBackendPort, ModelError, ModelInfo,
};
use crate::domain::inference::{GenerationMode, InferenceRequest};

/// 推理执行器
pub struct InferenceExecutor {
    backend: Arc<dyn ModelBackendPort>,
    mode: GenerationMode,
}

impl InferenceExecutor {
    pub fn new(backend: Arc<dyn ModelBackendPort>, mode: GenerationMode) -> Self {
        Self { backend, mode }
    }

    pub fn mode(&self) -> GenerationMode {
        self.mode
    }

    /// 执行一次生成调用
    ///
    /// 调用方给了种子就透传；没给则由后端选择并在输出中回报，
    /// 保证响应中的种子总是可观测（重放可复现）
    pub async fn run(
        &self,
        model: &ModelInfo,
        request: &InferenceRequest,
    ) -> Result<GenerationOutput, ModelError> {
        let call = self.build_call(request);

        tracing::debug!(
            mode = %self.mode.as_str(),
            prompt_len = call.prompt.len(),
            seed = ?call.seed,
            "Dispatching generation call"
        );

        let output = self.backend.generate(model, call).await?;

        tracing::debug!(resolved_seed = output.resolved_seed, "Generation completed");
        Ok(output)
    }

    fn build_call(&self, request: &InferenceRequest) -> GenerationCall {
        GenerationCall {
            mode: self.mode,
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            max_new_tokens: request.sampling.max_new_tokens,
            temperature: request.sampling.temperature,
            width: request.image.width,
            height: request.image.height,
            num_inference_steps: request.image.num_inference_steps,
            guidance_scale: request.image.guidance_scale,
            seed: request.seed,
            image_input: request.image_input.clone(),
        }
    }
}
