//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_encoder;
mod speech_engine;

pub use audio_encoder::{AudioEncoderPort, EncodeError};
pub use speech_engine::{
    EngineError, EngineInputs, EngineLoader, GenerateOptions, GenerationOutput, GradientMode,
    InputValue, RawSpeech, SpeechEngine, SpeechProcessor, Tensor,
};
