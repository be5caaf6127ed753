//! Synthesis Context - Errors

use thiserror::Error;

/// 输入文本校验错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("text must not be empty")]
    Empty,

    #[error("text exceeds max length ({max_chars})")]
    TooLong { max_chars: usize },
}
