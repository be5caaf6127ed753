//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现以及 HTTP 边界

pub mod adapters;
pub mod http;

pub use adapters::{SyntheticEngineConfig, SyntheticEngineLoader, WavEncoder};
