//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, RawConfig};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `KUGELAUDIO_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `KUGELAUDIO_MODEL_ID=/models/kugelaudio-0-open`
/// - `KUGELAUDIO_TEXT_MAX_CHARS=2000`
/// - `KUGELAUDIO_DEVICE=cuda:0`
/// - `KUGELAUDIO_SERVER__PORT=8080`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 服务器与日志默认值；推理字段的默认值在 AppConfig::from_raw 中
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 值保持字符串，由逐字段解析器处理
    builder = builder.add_source(
        Environment::with_prefix("KUGELAUDIO")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(false),
    );

    let config = builder.build()?;

    let raw: RawConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    let app_config = AppConfig::from_raw(raw);
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.server.host.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Server host cannot be empty".to_string(),
        ));
    }

    if config.server.body_limit_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "Body limit cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Model: {}", config.model_id);
    tracing::info!("Device: {}", config.device);
    tracing::info!("Text Max Chars: {}", config.text_max_chars);
    tracing::info!("Default CFG Scale: {}", config.default_cfg_scale);
    tracing::info!("Default Max Tokens: {}", config.default_max_tokens);
    tracing::info!(
        "Default Voice: {}",
        config.default_voice.as_deref().unwrap_or("<none>")
    );
    tracing::info!("Eager Load: {}", config.eager_load);
    tracing::info!(
        "Synthetic Backend: {} Hz, {} samples/token, {} ms latency",
        config.synthetic.sample_rate,
        config.synthetic.samples_per_token,
        config.synthetic.latency_ms
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");

    for (key, value) in &config.ignored {
        tracing::warn!(key = *key, value = %value, "Invalid config value ignored, using default");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeviceOverride;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
model_id = "/models/kugel"
text_max_chars = 120
default_cfg_scale = 4.5
default_voice = "alice"
device = "cpu"
eager_load = false

[server]
port = 9000

[synthetic]
latency_ms = 5
"#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model_id, "/models/kugel");
        assert_eq!(config.text_max_chars, 120);
        assert_eq!(config.default_cfg_scale, 4.5);
        assert_eq!(config.default_max_tokens, 2048);
        assert_eq!(config.default_voice.as_deref(), Some("alice"));
        assert_eq!(config.device, DeviceOverride::Cpu);
        assert!(!config.eager_load);
        assert_eq!(config.synthetic.latency_ms, 5);
    }

    #[test]
    fn test_invalid_file_values_do_not_abort() {
        let file = write_config(
            r#"
text_max_chars = -3
default_max_tokens = "many"
device = "quantum"
"#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.text_max_chars, 4000);
        assert_eq!(config.default_max_tokens, 2048);
        assert_eq!(config.device, DeviceOverride::Auto);
        assert_eq!(config.ignored.len(), 3);
    }

    #[test]
    fn test_missing_required_file_fails() {
        let result = load_config_from_path(Some(Path::new("/nonexistent/kugelaudio.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_host() {
        let mut config = AppConfig::default();
        config.server.host = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }
}
