//! Engine Adapter - 推理后端实现

mod synthetic_engine;

pub use synthetic_engine::{SyntheticEngineConfig, SyntheticEngineLoader};
