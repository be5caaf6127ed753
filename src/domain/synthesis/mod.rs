//! Synthesis Context
//!
//! 一次合成请求涉及的值对象与纯函数，不包含任何 I/O

mod errors;
mod parameters;
mod value_objects;

pub use errors::TextError;
pub use parameters::{GenerationDefaults, GenerationRequest, ResolvedParameters};
pub use value_objects::{
    AudioResult, DeviceOverride, DeviceSelection, Precision, SynthesisText, DEFAULT_SAMPLE_RATE,
};
