//! Application State
//!
//! 包含 Command/Query Handlers 以及关闭时需要的共享组件

use std::sync::Arc;

use crate::application::{
    AudioEncoderPort, EngineLifecycle, GenerationGate, GetHealthHandler, InferencePipeline,
    InferencePipelineConfig, SynthesizeHandler,
};

/// 应用状态
pub struct AppState {
    // ========== Shared ==========
    pub lifecycle: Arc<EngineLifecycle>,
    pub gate: Arc<GenerationGate>,

    // ========== Command Handlers ==========
    /// 合成在独立任务中执行，需要 'static 句柄
    pub synthesize_handler: Arc<SynthesizeHandler>,

    // ========== Query Handlers ==========
    pub get_health_handler: GetHealthHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        pipeline_config: InferencePipelineConfig,
        lifecycle: Arc<EngineLifecycle>,
        gate: Arc<GenerationGate>,
        encoder: Arc<dyn AudioEncoderPort>,
    ) -> Self {
        let pipeline = Arc::new(InferencePipeline::new(
            pipeline_config,
            lifecycle.clone(),
            gate.clone(),
        ));

        Self {
            lifecycle: lifecycle.clone(),
            gate,
            synthesize_handler: Arc::new(SynthesizeHandler::new(pipeline, encoder)),
            get_health_handler: GetHealthHandler::new(lifecycle),
        }
    }
}
