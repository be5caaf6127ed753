//! 应用层错误定义
//!
//! 一次合成请求的三类终止性错误，均不在内部重试

use thiserror::Error;

use crate::application::ports::{EncodeError, EngineError};
use crate::domain::TextError;

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// 调用方输入无效
    #[error("{0}")]
    Validation(String),

    /// 引擎尚未加载（或加载失败），稍后可重试
    #[error("Model is not loaded: {0}")]
    NotReady(String),

    /// 编码、推理、解码过程中的其它失败
    #[error("TTS generation failed: {0}")]
    Generation(String),
}

impl SynthesisError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// 创建未就绪错误
    pub fn not_ready(message: impl Into<String>) -> Self {
        Self::NotReady(message.into())
    }

    /// 创建生成错误
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotReady(_) => "not_ready",
            Self::Generation(_) => "generation",
        }
    }
}

impl From<TextError> for SynthesisError {
    fn from(err: TextError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EngineError> for SynthesisError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(msg) => Self::Validation(msg),
            EngineError::Load(msg) => Self::NotReady(msg),
            other => Self::Generation(other.to_string()),
        }
    }
}

impl From<EncodeError> for SynthesisError {
    fn from(err: EncodeError) -> Self {
        Self::Generation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_errors_are_validation() {
        let err: SynthesisError = TextError::Empty.into();
        assert!(matches!(err, SynthesisError::Validation(_)));
        assert_eq!(err.to_string(), "text must not be empty");
    }

    #[test]
    fn test_engine_error_mapping() {
        let err: SynthesisError = EngineError::InvalidInput("unknown voice".into()).into();
        assert!(matches!(err, SynthesisError::Validation(_)));

        let err: SynthesisError = EngineError::Load("missing weights".into()).into();
        assert!(matches!(err, SynthesisError::NotReady(_)));

        let err: SynthesisError = EngineError::Inference("boom".into()).into();
        assert_eq!(err.to_string(), "TTS generation failed: Inference failed: boom");
    }
}
