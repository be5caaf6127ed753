//! Engine Lifecycle
//!
//! 引擎与处理器的一次性惰性加载。加载成功后两者作为一个 EngineHandle 发布，
//! 进程退出前不再变化；加载失败不缓存，由下一次调用重新尝试。

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

use crate::application::ports::{EngineError, EngineLoader, SpeechEngine, SpeechProcessor};
use crate::domain::{DeviceOverride, DeviceSelection, Precision};

/// 生命周期配置
#[derive(Debug, Clone)]
pub struct EngineLifecycleConfig {
    /// 模型标识（仓库名或本地目录）
    pub model_id: String,
    /// 设备覆盖
    pub device: DeviceOverride,
}

impl Default for EngineLifecycleConfig {
    fn default() -> Self {
        Self {
            model_id: "kugelaudio/kugelaudio-0-open".to_string(),
            device: DeviceOverride::Auto,
        }
    }
}

/// 已加载的引擎与处理器
///
/// 不变量: 引擎和处理器要么同时存在，要么都不存在
pub struct EngineHandle {
    engine: Box<dyn SpeechEngine>,
    processor: Box<dyn SpeechProcessor>,
    device: DeviceSelection,
    precision: Precision,
    loaded_at: DateTime<Utc>,
}

impl EngineHandle {
    pub fn engine(&self) -> &dyn SpeechEngine {
        self.engine.as_ref()
    }

    pub fn processor(&self) -> &dyn SpeechProcessor {
        self.processor.as_ref()
    }

    pub fn device(&self) -> DeviceSelection {
        self.device
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("device", &self.device)
            .field("precision", &self.precision)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

/// 引擎生命周期
pub struct EngineLifecycle {
    config: EngineLifecycleConfig,
    loader: Arc<dyn EngineLoader>,
    handle: OnceCell<EngineHandle>,
}

impl EngineLifecycle {
    pub fn new(config: EngineLifecycleConfig, loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            config,
            loader,
            handle: OnceCell::new(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.config.model_id
    }

    /// 当前已发布的句柄，不会触发加载
    pub fn handle(&self) -> Option<&EngineHandle> {
        self.handle.get()
    }

    pub fn is_ready(&self) -> bool {
        self.handle.initialized()
    }

    /// 当前设备；加载前报告 CPU
    pub fn device(&self) -> DeviceSelection {
        self.handle().map(|h| h.device).unwrap_or_default()
    }

    /// 确保引擎已加载
    ///
    /// 已加载时直接返回；并发的首次调用共享同一次加载
    pub async fn ensure_loaded(&self) -> Result<&EngineHandle, EngineError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }

        self.handle
            .get_or_try_init(|| self.load())
            .await
            .map_err(|e| {
                tracing::error!(model_id = %self.config.model_id, error = %e, "Engine load failed");
                e
            })
    }

    async fn load(&self) -> Result<EngineHandle, EngineError> {
        let accelerator_available = self.loader.accelerator_available();
        let device = self.config.device.resolve(accelerator_available);
        if matches!(self.config.device, DeviceOverride::Accelerated { .. }) && !device.is_accelerated()
        {
            tracing::warn!(
                requested = %self.config.device,
                "Accelerated device requested but not available, falling back to cpu"
            );
        }
        let precision = device.precision();

        tracing::info!(
            model_id = %self.config.model_id,
            device = %device,
            precision = precision.as_str(),
            "Loading engine"
        );
        let started = Instant::now();

        let mut engine = self
            .loader
            .load_engine(&self.config.model_id, device, precision)
            .await?;
        engine.set_inference_mode();
        engine.strip_encoders();

        let processor = self.loader.load_processor(&self.config.model_id).await?;

        tracing::info!(
            model_id = %self.config.model_id,
            device = %device,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Engine loaded"
        );

        Ok(EngineHandle {
            engine,
            processor,
            device,
            precision,
            loaded_at: Utc::now(),
        })
    }
}
