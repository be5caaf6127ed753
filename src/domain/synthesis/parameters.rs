//! Generation Parameters
//!
//! 请求参数与进程默认值的合并规则。纯函数，无 I/O，不会失败。

/// 合成请求
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub text: String,
    pub voice: Option<String>,
    pub cfg_scale: Option<f64>,
    pub max_tokens: Option<i64>,
}

impl GenerationRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_cfg_scale(mut self, cfg_scale: f64) -> Self {
        self.cfg_scale = Some(cfg_scale);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// 进程级默认生成参数
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationDefaults {
    /// None 表示交给引擎内部默认音色
    pub voice: Option<String>,
    pub cfg_scale: f64,
    pub max_tokens: u32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            voice: None,
            cfg_scale: 3.0,
            max_tokens: 2048,
        }
    }
}

/// 解析后的生成参数
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameters {
    pub voice: Option<String>,
    pub cfg_scale: f64,
    pub max_tokens: u32,
}

impl GenerationDefaults {
    /// 逐字段解析，先命中者生效
    ///
    /// - voice: 请求值（trim 后非空） → 默认音色 → 未设置
    /// - cfg_scale: 请求值（有限且 > 0） → 默认值
    /// - max_tokens: 请求值（> 0） → 默认值
    pub fn resolve(&self, request: &GenerationRequest) -> ResolvedParameters {
        let voice = request
            .voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| self.voice.clone());

        let cfg_scale = request
            .cfg_scale
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(self.cfg_scale);

        let max_tokens = request
            .max_tokens
            .filter(|v| *v > 0)
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
            .unwrap_or(self.max_tokens);

        ResolvedParameters {
            voice,
            cfg_scale,
            max_tokens,
        }
    }
}
