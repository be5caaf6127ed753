//! Generation Gate
//!
//! 单槽位互斥准入：任意时刻最多一个 generate 调用。
//! 等待者挂起而不是忙等；许可在 drop 时释放，覆盖成功、失败和 panic。

use std::future::Future;
use thiserror::Error;
use tokio::sync::{Semaphore, SemaphorePermit};

/// 闸门已关闭（进程正在退出）
#[derive(Debug, Error)]
#[error("generation gate is closed")]
pub struct GateClosed;

/// 持有生成槽位的许可
#[derive(Debug)]
pub struct GatePermit<'a> {
    _permit: SemaphorePermit<'a>,
}

/// 生成闸门
#[derive(Debug)]
pub struct GenerationGate {
    slot: Semaphore,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self {
            slot: Semaphore::new(1),
        }
    }

    /// 等待槽位空闲
    pub async fn acquire(&self) -> Result<GatePermit<'_>, GateClosed> {
        if self.is_busy() {
            tracing::debug!("Generation slot busy, waiting");
        }
        let permit = self.slot.acquire().await.map_err(|_| GateClosed)?;
        Ok(GatePermit { _permit: permit })
    }

    /// 在持有槽位期间运行 future
    pub async fn run<F, T>(&self, fut: F) -> Result<T, GateClosed>
    where
        F: Future<Output = T>,
    {
        let _permit = self.acquire().await?;
        Ok(fut.await)
    }

    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }

    /// 关闭闸门，之后的等待者立即失败；已持有的许可不受影响
    pub fn close(&self) {
        self.slot.close();
    }
}

impl Default for GenerationGate {
    fn default() -> Self {
        Self::new()
    }
}
