//! 应用层错误定义
//!
//! 各组件返回类型化错误，只在 JobHandler 边界收敛为响应信封

use thiserror::Error;

use crate::application::jobs::EncodingError;
use crate::application::model::InitError;
use crate::application::ports::ModelError;
use crate::domain::inference::ValidationError;

/// 任务错误
#[derive(Debug, Error)]
pub enum JobError {
    /// 输入校验失败，任务在任何模型调用之前终止
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// 模型初始化失败，进程级降级，所有任务以同一原因快速失败
    #[error("{0}")]
    Initialization(#[from] InitError),

    /// 生成调用失败，不影响模型状态
    #[error("inference failed: {0}")]
    Execution(ModelError),

    /// 输出编码失败
    #[error("failed to encode output: {0}")]
    Encoding(#[from] EncodingError),
}

impl JobError {
    /// 失败发生的阶段名（用于日志）
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Initialization(_) => "initialization",
            Self::Execution(_) => "execution",
            Self::Encoding(_) => "encoding",
        }
    }

    /// 诊断链
    ///
    /// 校验错误是调用方缺陷，不附带诊断信息；其余错误附带
    /// 完整错误因果链
    pub fn traceback(&self) -> Option<String> {
        if matches!(self, Self::Validation(_)) {
            return None;
        }

        let mut lines = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            lines.push(format!("caused by: {}", err));
            source = err.source();
        }
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_has_no_traceback() {
        let err = JobError::Validation(ValidationError::MissingPrompt);
        assert!(err.traceback().is_none());
        assert_eq!(err.phase(), "validation");
    }

    #[test]
    fn test_execution_error_has_traceback() {
        let err = JobError::Execution(ModelError::ServiceError("CUDA out of memory".to_string()));
        let trace = err.traceback().unwrap();
        assert!(trace.contains("CUDA out of memory"));
        assert_eq!(err.phase(), "execution");
    }

    #[test]
    fn test_initialization_error_message() {
        let err = JobError::Initialization(InitError {
            reason: "weights not found".to_string(),
        });
        assert!(err.to_string().contains("weights not found"));
        assert_eq!(err.phase(), "initialization");
    }
}
