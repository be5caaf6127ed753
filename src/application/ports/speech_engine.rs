//! Speech Engine Port - 推理引擎抽象
//!
//! 引擎、处理器、加载器三个端口。具体实现在 infrastructure/adapters/engine，
//! 核心只依赖这里的类型。

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::{DeviceSelection, Precision};

/// 引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to load model: {0}")]
    Load(String),

    /// 处理器拒绝输入（调用方问题）
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid output: {0}")]
    Output(String),
}

// ============================================================================
// Tensor
// ============================================================================

/// 引擎原生张量句柄
///
/// 行优先存储，附带所在设备与精度
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    shape: Vec<usize>,
    device: DeviceSelection,
    precision: Precision,
}

impl Tensor {
    pub fn new(
        data: Vec<f32>,
        shape: Vec<usize>,
        device: DeviceSelection,
        precision: Precision,
    ) -> Result<Self, EngineError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(EngineError::Output(format!(
                "tensor shape {:?} does not match {} elements",
                shape,
                data.len()
            )));
        }
        let data = match precision {
            Precision::F32 => data,
            Precision::Bf16 => data.into_iter().map(round_bf16).collect(),
        };
        Ok(Self {
            data,
            shape,
            device,
            precision,
        })
    }

    /// 一维 CPU f32 张量
    pub fn from_vec(data: Vec<f32>) -> Self {
        let shape = vec![data.len()];
        Self {
            data,
            shape,
            device: DeviceSelection::Cpu,
            precision: Precision::F32,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn device(&self) -> DeviceSelection {
        self.device
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// 移动到指定设备
    pub fn to_device(mut self, device: DeviceSelection) -> Self {
        self.device = device;
        self
    }

    /// 拷回主机内存并转为 f32
    pub fn into_host_f32(self) -> (Vec<f32>, Vec<usize>) {
        (self.data, self.shape)
    }
}

/// 截断到 bf16 可表示的精度
fn round_bf16(value: f32) -> f32 {
    f32::from_bits(value.to_bits() & 0xFFFF_0000)
}

// ============================================================================
// Inputs / Outputs
// ============================================================================

/// 处理器产出的单个输入项
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Tensor(Tensor),
    /// 非张量输入，原样传给引擎
    Value(serde_json::Value),
}

impl InputValue {
    /// 张量移到目标设备，其它值保持不变
    pub fn to_device(self, device: DeviceSelection) -> Self {
        match self {
            Self::Tensor(t) => Self::Tensor(t.to_device(device)),
            other => other,
        }
    }

    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Self::Tensor(t) => Some(t),
            Self::Value(_) => None,
        }
    }
}

/// 引擎输入（名称 → 值）
pub type EngineInputs = BTreeMap<String, InputValue>;

/// 引擎输出的原始语音
///
/// 引擎可能返回原生张量，也可能返回普通数值数组
#[derive(Debug, Clone, PartialEq)]
pub enum RawSpeech {
    Tensor(Tensor),
    Array { values: Vec<f64>, shape: Vec<usize> },
}

impl RawSpeech {
    /// 转为主机 f32 数据及其形状
    pub fn into_host_f32(self) -> Result<(Vec<f32>, Vec<usize>), EngineError> {
        match self {
            Self::Tensor(t) => Ok(t.into_host_f32()),
            Self::Array { values, shape } => {
                let expected: usize = shape.iter().product();
                if expected != values.len() {
                    return Err(EngineError::Output(format!(
                        "array shape {:?} does not match {} elements",
                        shape,
                        values.len()
                    )));
                }
                Ok((values.into_iter().map(|v| v as f32).collect(), shape))
            }
        }
    }
}

/// 一次 generate 调用的输出
#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
    pub speech_outputs: Vec<RawSpeech>,
}

/// 梯度追踪模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientMode {
    Enabled,
    Disabled,
}

/// generate 调用参数
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub cfg_scale: f64,
    pub max_new_tokens: u32,
    pub gradients: GradientMode,
}

// ============================================================================
// Ports
// ============================================================================

/// 推理引擎
///
/// 有状态、不可重入：同一时刻只允许一个 generate 调用
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// 切换到仅推理模式（关闭训练期行为）
    fn set_inference_mode(&mut self);

    /// 释放仅推理场景用不到的编码器资源
    fn strip_encoders(&mut self);

    async fn generate(
        &self,
        inputs: EngineInputs,
        options: GenerateOptions,
    ) -> Result<GenerationOutput, EngineError>;
}

/// 预处理/后处理器
pub trait SpeechProcessor: Send + Sync {
    /// 把文本和音色编码为引擎输入
    fn encode(&self, text: &str, voice: Option<&str>) -> Result<EngineInputs, EngineError>;

    /// 音频子组件的采样率
    fn sampling_rate(&self) -> Option<u32>;
}

/// 模型加载器
#[async_trait]
pub trait EngineLoader: Send + Sync {
    /// 加速设备是否可用
    fn accelerator_available(&self) -> bool;

    async fn load_engine(
        &self,
        model_id: &str,
        device: DeviceSelection,
        precision: Precision,
    ) -> Result<Box<dyn SpeechEngine>, EngineError>;

    async fn load_processor(&self, model_id: &str) -> Result<Box<dyn SpeechProcessor>, EngineError>;
}
