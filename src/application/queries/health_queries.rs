//! Health Queries - 就绪状态查询

use serde::Serialize;

use crate::domain::DeviceSelection;

/// 健康检查查询
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthQuery;

/// 当前引擎状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    pub ready: bool,
    pub model_id: String,
    pub device: DeviceSelection,
}
