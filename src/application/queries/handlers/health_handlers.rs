//! Health Query Handler

use std::sync::Arc;

use crate::application::inference::EngineLifecycle;
use crate::application::queries::{HealthQuery, HealthStatus};

/// GetHealth Handler
///
/// 只读取已发布的状态，从不触发加载
pub struct GetHealthHandler {
    lifecycle: Arc<EngineLifecycle>,
}

impl GetHealthHandler {
    pub fn new(lifecycle: Arc<EngineLifecycle>) -> Self {
        Self { lifecycle }
    }

    pub fn handle(&self, _query: HealthQuery) -> HealthStatus {
        HealthStatus {
            ready: self.lifecycle.is_ready(),
            model_id: self.lifecycle.model_id().to_string(),
            device: self.lifecycle.device(),
        }
    }
}
