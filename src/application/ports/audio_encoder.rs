//! Audio Encoder Port - 音频编码抽象
//!
//! 把推理得到的 f32 样本整体编码为可传输的字节

use thiserror::Error;

use crate::domain::AudioResult;

/// 编码错误
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Audio Encoder Port
pub trait AudioEncoderPort: Send + Sync {
    /// 一次性编码完整缓冲区，相同输入得到相同字节
    fn encode(&self, audio: &AudioResult) -> Result<Vec<u8>, EncodeError>;

    /// 输出的 MIME 类型
    fn content_type(&self) -> &'static str;
}
