//! Synthesis Context - Value Objects

use serde::Serialize;
use std::str::FromStr;

use super::errors::TextError;

/// 处理器未提供采样率时使用的默认值
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

// ============================================================================
// Device
// ============================================================================

/// 推理设备
///
/// 加载时确定一次，进程生命周期内不可变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceSelection {
    #[default]
    Cpu,
    /// 加速设备（CUDA），ordinal 为 None 时使用默认卡
    Accelerated { ordinal: Option<u32> },
}

impl DeviceSelection {
    pub fn is_accelerated(&self) -> bool {
        matches!(self, Self::Accelerated { .. })
    }

    /// 设备对应的数值精度：CPU 用 f32，加速设备用 bf16 以节省显存
    pub fn precision(&self) -> Precision {
        match self {
            Self::Cpu => Precision::F32,
            Self::Accelerated { .. } => Precision::Bf16,
        }
    }
}

impl std::fmt::Display for DeviceSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Accelerated { ordinal: None } => write!(f, "cuda"),
            Self::Accelerated { ordinal: Some(n) } => write!(f, "cuda:{}", n),
        }
    }
}

impl Serialize for DeviceSelection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 设备覆盖配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceOverride {
    /// 未指定：有加速设备就用，否则 CPU
    #[default]
    Auto,
    Cpu,
    Accelerated { ordinal: Option<u32> },
}

impl DeviceOverride {
    /// 结合硬件可用性得出最终设备
    ///
    /// 请求加速设备但不可用时静默回退到 CPU
    pub fn resolve(self, accelerator_available: bool) -> DeviceSelection {
        match self {
            Self::Cpu => DeviceSelection::Cpu,
            Self::Accelerated { ordinal } if accelerator_available => {
                DeviceSelection::Accelerated { ordinal }
            }
            Self::Accelerated { .. } => DeviceSelection::Cpu,
            Self::Auto if accelerator_available => DeviceSelection::Accelerated { ordinal: None },
            Self::Auto => DeviceSelection::Cpu,
        }
    }
}

impl FromStr for DeviceOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "" | "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "cuda" | "gpu" | "accelerated" => Ok(Self::Accelerated { ordinal: None }),
            other => match other.strip_prefix("cuda:") {
                Some(n) => n
                    .parse::<u32>()
                    .map(|ordinal| Self::Accelerated {
                        ordinal: Some(ordinal),
                    })
                    .map_err(|_| format!("invalid device ordinal: {}", s)),
                None => Err(format!("unknown device: {}", s)),
            },
        }
    }
}

impl std::fmt::Display for DeviceOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cpu => write!(f, "cpu"),
            Self::Accelerated { ordinal: None } => write!(f, "cuda"),
            Self::Accelerated { ordinal: Some(n) } => write!(f, "cuda:{}", n),
        }
    }
}

/// 权重精度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    F32,
    Bf16,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::Bf16 => "bf16",
        }
    }
}

// ============================================================================
// Text
// ============================================================================

/// 已校验的合成文本
///
/// 不变量:
/// - 去除首尾空白后非空
/// - 字符数（Unicode 标量）不超过上限
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisText(String);

impl SynthesisText {
    pub fn parse(raw: &str, max_chars: usize) -> Result<Self, TextError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(TextError::Empty);
        }
        if text.chars().count() > max_chars {
            return Err(TextError::TooLong { max_chars });
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for SynthesisText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Audio
// ============================================================================

/// 一次推理的音频结果（交错排列的 f32 样本）
#[derive(Debug, Clone, PartialEq)]
pub struct AudioResult {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioResult {
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// 每声道帧数
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frames() as u64 * 1000) / self.sample_rate as u64
    }
}
