//! Inference Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// prompt 缺失、为空或不是字符串
    #[error("prompt parameter is required")]
    MissingPrompt,
}
