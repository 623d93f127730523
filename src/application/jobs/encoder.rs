//! Result Encoder - 输出物化
//!
//! 将原始模型输出转换为可安全嵌入 JSON 信封的载荷：
//! - 文本：剥离特殊 token 标记与控制字符
//! - 图像：RGB8 像素缓冲 → PNG（无损容器）→ base64
//!
//! 同时回显实际生效的参数，调用方可据此核对执行内容

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

use super::envelope::{Artifact, JobOutput, ResolvedParameters};
use crate::application::ports::{GenerationOutput, RawOutput};
use crate::domain::inference::{GenerationMode, InferenceRequest};

/// 编码错误
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("invalid pixel buffer: {0}")]
    InvalidPixelBuffer(String),

    #[error("PNG encoding failed: {0}")]
    PngEncode(String),
}

/// 文本输出中需要剥离的特殊 token 标记
const SPECIAL_TOKEN_MARKERS: &[&str] = &[
    "<|im_start|>",
    "<|im_end|>",
    "<|endoftext|>",
    "<|vision_start|>",
    "<|vision_end|>",
];

/// 结果编码器
pub struct ResultEncoder {
    model_id: String,
    mode: GenerationMode,
}

impl ResultEncoder {
    pub fn new(model_id: impl Into<String>, mode: GenerationMode) -> Self {
        Self {
            model_id: model_id.into(),
            mode,
        }
    }

    /// 物化一次生成结果
    pub fn encode(
        &self,
        output: &GenerationOutput,
        request: &InferenceRequest,
    ) -> Result<JobOutput, EncodingError> {
        let artifact = match &output.raw {
            RawOutput::Text { text } => Artifact::Text {
                generated_text: strip_special_tokens(text),
            },
            RawOutput::Image {
                pixels,
                width,
                height,
            } => Artifact::Image {
                image: encode_png_base64(pixels, *width, *height)?,
            },
        };

        Ok(JobOutput {
            artifact,
            model: self.model_id.clone(),
            prompt: request.prompt.clone(),
            parameters: self.resolved_parameters(request, output.resolved_seed),
            seed: output.resolved_seed,
        })
    }

    /// 回显当前模式实际生效的参数
    fn resolved_parameters(&self, request: &InferenceRequest, seed: u64) -> ResolvedParameters {
        match self.mode {
            GenerationMode::Text => ResolvedParameters {
                max_new_tokens: Some(request.sampling.max_new_tokens),
                temperature: Some(request.sampling.temperature),
                seed,
                ..Default::default()
            },
            GenerationMode::Image => ResolvedParameters {
                width: Some(request.image.width),
                height: Some(request.image.height),
                num_inference_steps: Some(request.image.num_inference_steps),
                guidance_scale: Some(request.image.guidance_scale),
                negative_prompt: Some(request.negative_prompt.clone()),
                seed,
                ..Default::default()
            },
        }
    }
}

/// 剥离特殊 token 标记与控制字符（保留换行和制表符）
fn strip_special_tokens(text: &str) -> String {
    let mut cleaned = text.to_string();
    for marker in SPECIAL_TOKEN_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// RGB8 像素缓冲 → 内存 PNG → base64
fn encode_png_base64(pixels: &[u8], width: u32, height: u32) -> Result<String, EncodingError> {
    let expected = width as usize * height as usize * 3;
    if pixels.len() != expected {
        return Err(EncodingError::InvalidPixelBuffer(format!(
            "expected {} bytes for {}x{}, got {}",
            expected,
            width,
            height,
            pixels.len()
        )));
    }

    let image = image::RgbImage::from_raw(width, height, pixels.to_vec()).ok_or_else(|| {
        EncodingError::InvalidPixelBuffer("pixel buffer does not match dimensions".to_string())
    })?;

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| EncodingError::PngEncode(e.to_string()))?;

    Ok(general_purpose::STANDARD.encode(png.into_inner()))
}
