//! Kugelaudio Sidecar - 单模型语音合成服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Synthesis Context: 合成文本、生成参数、设备选择、音频结果
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechEngine, SpeechProcessor, EngineLoader, AudioEncoder）
//! - Inference: 引擎生命周期、生成闸门、推理流水线
//! - Commands: 合成命令处理器
//! - Queries: 健康状态查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: /healthz, /v1/tts
//! - Adapters: WAV 编码器, 内置合成后端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
