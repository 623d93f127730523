//! HTTP Model Client - 调用承载模型的推理服务
//!
//! 实现 ModelBackendPort trait，通过 HTTP 驱动外部模型服务
//!
//! 外部 API:
//! POST {base}/api/model/load   Request/Response: JSON
//! POST {base}/api/generate     文本生成，Request/Response: JSON
//! POST {base}/api/txt2img      图像生成，Response: RGB8 binary，元数据在 headers
//! GET  {base}/health

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    GenerationCall, GenerationOutput, LoadOptions, ModelBackendPort, ModelError, ModelInfo,
    RawOutput,
};
use crate::domain::inference::GenerationMode;

/// 模型加载请求体 (JSON)
#[derive(Debug, Serialize)]
struct LoadHttpRequest<'a> {
    model: &'a str,
    cache_dir: &'a str,
    device: &'a str,
    precision: &'a str,
}

/// 模型加载响应体 (JSON)
#[derive(Debug, Deserialize)]
struct LoadHttpResponse {
    /// 实际落位设备
    device: String,
    /// 实际数值精度
    dtype: String,
    #[serde(default)]
    total_parameters: Option<u64>,
}

/// 文本生成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TextHttpRequest<'a> {
    prompt: &'a str,
    max_new_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_path: Option<&'a str>,
}

/// 文本生成响应体 (JSON)
#[derive(Debug, Deserialize)]
struct TextHttpResponse {
    generated_text: String,
    #[serde(default)]
    seed: Option<u64>,
}

/// 图像生成请求体 (JSON)，响应为二进制像素流
#[derive(Debug, Serialize)]
struct ImageHttpRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    width: u32,
    height: u32,
    num_inference_steps: u32,
    guidance_scale: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

/// HTTP 模型客户端配置
#[derive(Debug, Clone)]
pub struct HttpModelClientConfig {
    /// 模型服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒），生成调用可能持续数分钟
    pub timeout_secs: u64,
}

impl Default for HttpModelClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 600,
        }
    }
}

impl HttpModelClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 模型客户端
pub struct HttpModelClient {
    client: Client,
    config: HttpModelClientConfig,
}

impl HttpModelClient {
    /// 创建新的 HTTP 模型客户端
    pub fn new(config: HttpModelClientConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 使用默认配置创建客户端
    pub fn with_default_config() -> Result<Self, ModelError> {
        Self::new(HttpModelClientConfig::default())
    }

    fn load_url(&self) -> String {
        format!("{}/api/model/load", self.config.base_url)
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url)
    }

    fn txt2img_url(&self) -> String {
        format!("{}/api/txt2img", self.config.base_url)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url)
    }

    fn map_request_error(e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout
        } else if e.is_connect() {
            ModelError::NetworkError(format!("Cannot connect to model service: {}", e))
        } else {
            ModelError::NetworkError(e.to_string())
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ModelError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }
        Ok(response)
    }

    async fn generate_text(&self, call: &GenerationCall) -> Result<GenerationOutput, ModelError> {
        let http_request = TextHttpRequest {
            prompt: &call.prompt,
            max_new_tokens: call.max_new_tokens,
            temperature: call.temperature,
            seed: call.seed,
            image_path: call.image_input.as_deref(),
        };

        let response = self
            .client
            .post(self.generate_url())
            .json(&http_request)
            .send()
            .await
            .map_err(Self::map_request_error)?;
        let response = Self::check_status(response).await?;

        let body: TextHttpResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        // 种子优先采用服务回报值；都缺失时落到 0，保证可观测
        let resolved_seed = body.seed.or(call.seed).unwrap_or(0);

        Ok(GenerationOutput {
            raw: RawOutput::Text {
                text: body.generated_text,
            },
            resolved_seed,
        })
    }

    async fn generate_image(&self, call: &GenerationCall) -> Result<GenerationOutput, ModelError> {
        let http_request = ImageHttpRequest {
            prompt: &call.prompt,
            negative_prompt: &call.negative_prompt,
            width: call.width,
            height: call.height,
            num_inference_steps: call.num_inference_steps,
            guidance_scale: call.guidance_scale,
            seed: call.seed,
        };

        let response = self
            .client
            .post(self.txt2img_url())
            .json(&http_request)
            .send()
            .await
            .map_err(Self::map_request_error)?;
        let response = Self::check_status(response).await?;

        // 从 headers 提取元数据
        let headers = response.headers();
        let width = read_header_u64(headers, "X-Image-Width")
            .map(|v| v as u32)
            .unwrap_or(call.width);
        let height = read_header_u64(headers, "X-Image-Height")
            .map(|v| v as u32)
            .unwrap_or(call.height);
        let resolved_seed = read_header_u64(headers, "X-Seed")
            .or(call.seed)
            .unwrap_or(0);

        // 直接获取像素字节
        let pixels = response
            .bytes()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to read pixels: {}", e)))?
            .to_vec();

        Ok(GenerationOutput {
            raw: RawOutput::Image {
                pixels,
                width,
                height,
            },
            resolved_seed,
        })
    }
}

/// 读取数值型 header
fn read_header_u64(headers: &reqwest::header::HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[async_trait]
impl ModelBackendPort for HttpModelClient {
    async fn load(&self, options: &LoadOptions) -> Result<ModelInfo, ModelError> {
        let http_request = LoadHttpRequest {
            model: &options.model_id,
            cache_dir: &options.cache_dir,
            device: options.device.as_str(),
            precision: options.precision.dtype_name(),
        };

        tracing::debug!(
            url = %self.load_url(),
            model = %options.model_id,
            "Sending model load request"
        );

        let response = self
            .client
            .post(self.load_url())
            .json(&http_request)
            .send()
            .await
            .map_err(Self::map_request_error)?;
        let response = Self::check_status(response).await?;

        let body: LoadHttpResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        tracing::info!(
            model = %options.model_id,
            device = %body.device,
            dtype = %body.dtype,
            "Model service reported load complete"
        );

        Ok(ModelInfo {
            model_id: options.model_id.clone(),
            device: body.device,
            dtype: body.dtype,
            total_parameters: body.total_parameters,
            cache_dir: options.cache_dir.clone(),
        })
    }

    async fn generate(
        &self,
        model: &ModelInfo,
        call: GenerationCall,
    ) -> Result<GenerationOutput, ModelError> {
        tracing::debug!(
            model = %model.model_id,
            mode = %call.mode.as_str(),
            prompt_len = call.prompt.len(),
            seed = ?call.seed,
            "Sending generation request"
        );

        let output = match call.mode {
            GenerationMode::Text => self.generate_text(&call).await?,
            GenerationMode::Image => self.generate_image(&call).await?,
        };

        tracing::info!(
            model = %model.model_id,
            mode = %call.mode.as_str(),
            resolved_seed = output.resolved_seed,
            "Generation request completed"
        );
        Ok(output)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpModelClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 600);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpModelClientConfig::new("http://model-server:9000").with_timeout(120);
        assert_eq!(config.base_url, "http://model-server:9000");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn test_urls() {
        let client = HttpModelClient::with_default_config().unwrap();
        assert_eq!(client.load_url(), "http://localhost:8000/api/model/load");
        assert_eq!(client.generate_url(), "http://localhost:8000/api/generate");
        assert_eq!(client.txt2img_url(), "http://localhost:8000/api/txt2img");
    }
}
