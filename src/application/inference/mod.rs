//! Inference Core - 推理准入与生命周期
//!
//! - lifecycle: 引擎惰性加载与设备选择
//! - gate: 单槽位生成闸门
//! - pipeline: 单请求编排

mod gate;
mod lifecycle;
mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;

pub use gate::{GateClosed, GatePermit, GenerationGate};
pub use lifecycle::{EngineHandle, EngineLifecycle, EngineLifecycleConfig};
pub use pipeline::{InferencePipeline, InferencePipelineConfig};
