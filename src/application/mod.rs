//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 引擎、处理器、加载器、音频编码端口
//! - inference: 推理准入核心（生命周期、闸门、流水线）
//! - commands: 合成命令及处理器
//! - queries: 健康检查查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod inference;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{handlers::SynthesizeHandler, SynthesizeCommand, SynthesizeResponse};

pub use error::SynthesisError;

pub use inference::{
    EngineHandle, EngineLifecycle, EngineLifecycleConfig, GateClosed, GenerationGate,
    InferencePipeline, InferencePipelineConfig,
};

pub use ports::{
    AudioEncoderPort, EncodeError, EngineError, EngineInputs, EngineLoader, GenerateOptions,
    GenerationOutput, GradientMode, InputValue, RawSpeech, SpeechEngine, SpeechProcessor, Tensor,
};

pub use queries::{handlers::GetHealthHandler, HealthQuery, HealthStatus};
