//! Configuration Types
//!
//! 定义所有配置结构体。
//!
//! 服务器、日志配置由 serde 直接反序列化；推理相关字段先以原始字符串读入
//! （[`RawConfig`]），再由逐字段的纯函数解析，非法或缺失时回退到默认值。

use serde::Deserialize;

use crate::domain::{DeviceOverride, DEFAULT_SAMPLE_RATE};

pub const DEFAULT_MODEL_ID: &str = "kugelaudio/kugelaudio-0-open";
pub const DEFAULT_TEXT_MAX_CHARS: usize = 4000;
pub const DEFAULT_CFG_SCALE: f64 = 3.0;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

// ============================================================================
// Raw (as loaded)
// ============================================================================

/// 配置源中读到的原始值
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub log: LogConfig,

    pub model_id: Option<String>,
    pub text_max_chars: Option<String>,
    pub default_cfg_scale: Option<String>,
    pub default_max_tokens: Option<String>,
    pub default_voice: Option<String>,
    pub device: Option<String>,
    pub eager_load: Option<String>,

    #[serde(default)]
    pub synthetic: RawSyntheticConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSyntheticConfig {
    pub sample_rate: Option<String>,
    pub samples_per_token: Option<String>,
    pub latency_ms: Option<String>,
    pub accelerator: Option<String>,
}

// ============================================================================
// Field parsers
// ============================================================================

/// 正整数；缺失、非数字或 ≤ 0 时返回 None
pub fn parse_positive_int(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
}

/// 正的有限浮点数
pub fn parse_positive_float(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// 去除首尾空白，空串视为未设置
pub fn parse_optional_string(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn parse_bool(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Resolved
// ============================================================================

/// 应用主配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,

    /// 日志配置
    pub log: LogConfig,

    /// 模型标识（hub ID 或本地目录）
    pub model_id: String,

    /// 文本最大字符数（按 Unicode 标量计）
    pub text_max_chars: usize,

    pub default_cfg_scale: f64,
    pub default_max_tokens: u32,
    pub default_voice: Option<String>,

    /// 设备覆盖
    pub device: DeviceOverride,

    /// 启动时预加载模型
    pub eager_load: bool,

    /// 内置合成后端配置
    pub synthetic: SyntheticConfig,

    /// 被忽略的非法取值（键, 原值），启动日志中提示
    pub ignored: Vec<(&'static str, String)>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_raw(RawConfig::default())
    }
}

impl AppConfig {
    /// 逐字段解析原始配置
    pub fn from_raw(raw: RawConfig) -> Self {
        let mut ignored = Vec::new();

        let mut check = |key: &'static str, value: &Option<String>, accepted: bool| {
            if let Some(v) = value {
                if !accepted && !v.trim().is_empty() {
                    ignored.push((key, v.clone()));
                }
            }
        };

        let text_max_chars = parse_positive_int(raw.text_max_chars.as_deref());
        check("text_max_chars", &raw.text_max_chars, text_max_chars.is_some());

        let cfg_scale = parse_positive_float(raw.default_cfg_scale.as_deref());
        check("default_cfg_scale", &raw.default_cfg_scale, cfg_scale.is_some());

        let max_tokens = parse_positive_int(raw.default_max_tokens.as_deref());
        check("default_max_tokens", &raw.default_max_tokens, max_tokens.is_some());

        let device = raw
            .device
            .as_deref()
            .map(str::parse::<DeviceOverride>)
            .transpose()
            .ok()
            .flatten();
        check("device", &raw.device, device.is_some());

        let eager_load = parse_bool(raw.eager_load.as_deref());
        check("eager_load", &raw.eager_load, eager_load.is_some());

        let synthetic = &raw.synthetic;
        let sample_rate = parse_positive_int(synthetic.sample_rate.as_deref());
        check("synthetic.sample_rate", &synthetic.sample_rate, sample_rate.is_some());

        let samples_per_token = parse_positive_int(synthetic.samples_per_token.as_deref());
        check(
            "synthetic.samples_per_token",
            &synthetic.samples_per_token,
            samples_per_token.is_some(),
        );

        let latency_ms = synthetic
            .latency_ms
            .as_deref()
            .and_then(|s| s.trim().parse::<u64>().ok());
        check("synthetic.latency_ms", &synthetic.latency_ms, latency_ms.is_some());

        let accelerator = parse_bool(synthetic.accelerator.as_deref());
        check("synthetic.accelerator", &synthetic.accelerator, accelerator.is_some());

        Self {
            server: raw.server,
            log: raw.log,
            model_id: parse_optional_string(raw.model_id.as_deref())
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            text_max_chars: text_max_chars
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(DEFAULT_TEXT_MAX_CHARS),
            default_cfg_scale: cfg_scale.unwrap_or(DEFAULT_CFG_SCALE),
            default_max_tokens: max_tokens
                .map(|n| n.min(u32::MAX as u64) as u32)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            default_voice: parse_optional_string(raw.default_voice.as_deref()),
            device: device.unwrap_or_default(),
            eager_load: eager_load.unwrap_or(true),
            synthetic: SyntheticConfig {
                sample_rate: sample_rate
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(DEFAULT_SAMPLE_RATE),
                samples_per_token: samples_per_token
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(960),
                latency_ms: latency_ms.unwrap_or(0),
                accelerator,
            },
            ignored,
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 请求体大小上限（字节）
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_body_limit() -> usize {
    1024 * 1024 // 1 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 内置合成后端配置
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub sample_rate: u32,
    pub samples_per_token: u32,
    pub latency_ms: u64,
    /// None 时自动探测
    pub accelerator: Option<bool>,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
