//! Kugelaudio Sidecar - 单模型语音合成服务
//!
//! - Domain: synthesis/ (Bounded Context)
//! - Application: inference, commands, queries, ports
//! - Infrastructure: http, adapters

use std::sync::Arc;

use kugelaudio_sidecar::application::{
    EngineLifecycle, EngineLifecycleConfig, GenerationGate, InferencePipelineConfig,
};
use kugelaudio_sidecar::config::{load_config, print_config};
use kugelaudio_sidecar::domain::GenerationDefaults;
use kugelaudio_sidecar::infrastructure::adapters::{
    SyntheticEngineConfig, SyntheticEngineLoader, WavEncoder,
};
use kugelaudio_sidecar::infrastructure::http::{AppState, HttpServer, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},kugelaudio_sidecar={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Kugelaudio TTS Sidecar v{}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    // 推理后端
    let loader = Arc::new(SyntheticEngineLoader::new(SyntheticEngineConfig {
        sample_rate: config.synthetic.sample_rate,
        samples_per_token: config.synthetic.samples_per_token,
        latency_ms: config.synthetic.latency_ms,
        accelerator: config.synthetic.accelerator,
    }));

    let lifecycle = Arc::new(EngineLifecycle::new(
        EngineLifecycleConfig {
            model_id: config.model_id.clone(),
            device: config.device,
        },
        loader,
    ));
    let gate = Arc::new(GenerationGate::new());

    let pipeline_config = InferencePipelineConfig {
        text_max_chars: config.text_max_chars,
        defaults: GenerationDefaults {
            voice: config.default_voice.clone(),
            cfg_scale: config.default_cfg_scale,
            max_tokens: config.default_max_tokens,
        },
    };

    // 预加载；失败时继续提供服务，首个合成请求会重试
    if config.eager_load {
        if let Err(e) = lifecycle.ensure_loaded().await {
            tracing::warn!(error = %e, "Eager model load failed, will retry on first request");
        }
    }

    let state = Arc::new(AppState::new(
        pipeline_config,
        lifecycle,
        gate,
        Arc::new(WavEncoder::new()),
    ));

    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_body_limit(config.server.body_limit_bytes);
    let server = HttpServer::new(server_config, state);

    server.run_with_shutdown(shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
}
