//! Domain Layer - 领域层
//!
//! 只有一个限界上下文:
//! - Synthesis Context: 合成请求、参数解析、设备选择、音频结果

pub mod synthesis;

pub use synthesis::{
    AudioResult, DeviceOverride, DeviceSelection, GenerationDefaults, GenerationRequest, Precision,
    ResolvedParameters, SynthesisText, TextError, DEFAULT_SAMPLE_RATE,
};
