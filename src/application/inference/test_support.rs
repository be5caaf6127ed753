//! 测试替身：可记录调用区间的引擎、可控的处理器和加载器

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::application::ports::{
    EngineError, EngineInputs, EngineLoader, GenerateOptions, GenerationOutput, InputValue,
    RawSpeech, SpeechEngine, SpeechProcessor, Tensor,
};
use crate::domain::{DeviceSelection, Precision};

/// 调用记录
#[derive(Default)]
pub struct CallLog {
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub inference_mode: AtomicBool,
    pub encoders_stripped: AtomicBool,
    failures_left: AtomicUsize,
    intervals: Mutex<Vec<(Instant, Instant)>>,
    options: Mutex<Option<GenerateOptions>>,
    inputs: Mutex<Option<EngineInputs>>,
    text: Mutex<Option<String>>,
}

impl CallLog {
    pub fn fail_next_calls(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn intervals(&self) -> Vec<(Instant, Instant)> {
        self.intervals.lock().unwrap().clone()
    }

    pub fn last_options(&self) -> Option<GenerateOptions> {
        self.options.lock().unwrap().clone()
    }

    pub fn last_inputs(&self) -> Option<EngineInputs> {
        self.inputs.lock().unwrap().clone()
    }

    pub fn last_text(&self) -> Option<String> {
        self.text.lock().unwrap().clone()
    }
}

#[derive(Clone)]
enum OutputMode {
    /// [1, max_new_tokens] 张量
    Generated,
    Empty,
}

struct RecordingEngine {
    log: Arc<CallLog>,
    delay: Duration,
    device: DeviceSelection,
    precision: Precision,
    output: OutputMode,
}

#[async_trait]
impl SpeechEngine for RecordingEngine {
    fn set_inference_mode(&mut self) {
        self.log.inference_mode.store(true, Ordering::SeqCst);
    }

    fn strip_encoders(&mut self) {
        self.log.encoders_stripped.store(true, Ordering::SeqCst);
    }

    async fn generate(
        &self,
        inputs: EngineInputs,
        options: GenerateOptions,
    ) -> Result<GenerationOutput, EngineError> {
        self.log.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.log.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let start = Instant::now();

        *self.log.options.lock().unwrap() = Some(options.clone());
        *self.log.inputs.lock().unwrap() = Some(inputs);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let end = Instant::now();
        self.log.intervals.lock().unwrap().push((start, end));
        self.log.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failing = self
            .log
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(EngineError::Inference("engine exploded".to_string()));
        }

        let speech_outputs = match self.output {
            OutputMode::Generated => {
                let n = options.max_new_tokens as usize;
                let tensor = Tensor::new(vec![0.25; n], vec![1, n], self.device, self.precision)?;
                vec![RawSpeech::Tensor(tensor)]
            }
            OutputMode::Empty => Vec::new(),
        };
        Ok(GenerationOutput { speech_outputs })
    }
}

struct FakeProcessor {
    log: Arc<CallLog>,
    sampling_rate: Option<u32>,
    rejected_voice: Option<String>,
}

impl SpeechProcessor for FakeProcessor {
    fn encode(&self, text: &str, voice: Option<&str>) -> Result<EngineInputs, EngineError> {
        if voice.is_some() && voice == self.rejected_voice.as_deref() {
            return Err(EngineError::InvalidInput(format!(
                "unknown voice: {}",
                voice.unwrap_or_default()
            )));
        }
        *self.log.text.lock().unwrap() = Some(text.to_string());

        let ids: Vec<f32> = text.chars().map(|c| c as u32 as f32).collect();
        let mut inputs = EngineInputs::new();
        inputs.insert("input_ids".to_string(), InputValue::Tensor(Tensor::from_vec(ids)));
        inputs.insert(
            "voice".to_string(),
            InputValue::Value(voice.map(serde_json::Value::from).unwrap_or_default()),
        );
        Ok(inputs)
    }

    fn sampling_rate(&self) -> Option<u32> {
        self.sampling_rate
    }
}

/// 可控的加载器
pub struct FakeLoader {
    pub log: Arc<CallLog>,
    accelerator: bool,
    delay: Duration,
    load_delay: Duration,
    fail_load: AtomicBool,
    fail_processor: bool,
    sampling_rate: Option<u32>,
    rejected_voice: Option<String>,
    output: OutputMode,
    engine_loads: AtomicUsize,
    processor_loads: AtomicUsize,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self {
            log: Arc::new(CallLog::default()),
            accelerator: false,
            delay: Duration::ZERO,
            load_delay: Duration::ZERO,
            fail_load: AtomicBool::new(false),
            fail_processor: false,
            sampling_rate: Some(24_000),
            rejected_voice: None,
            output: OutputMode::Generated,
            engine_loads: AtomicUsize::new(0),
            processor_loads: AtomicUsize::new(0),
        }
    }

    pub fn with_accelerator(mut self, available: bool) -> Self {
        self.accelerator = available;
        self
    }

    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    pub fn with_load_delay_ms(mut self, ms: u64) -> Self {
        self.load_delay = Duration::from_millis(ms);
        self
    }

    pub fn with_sampling_rate(mut self, rate: Option<u32>) -> Self {
        self.sampling_rate = rate;
        self
    }

    pub fn rejecting_voice(mut self, voice: &str) -> Self {
        self.rejected_voice = Some(voice.to_string());
        self
    }

    pub fn without_output(mut self) -> Self {
        self.output = OutputMode::Empty;
        self
    }

    pub fn failing_load(self) -> Self {
        self.fail_load.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_processor(mut self) -> Self {
        self.fail_processor = true;
        self
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn engine_loads(&self) -> usize {
        self.engine_loads.load(Ordering::SeqCst)
    }

    pub fn processor_loads(&self) -> usize {
        self.processor_loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineLoader for FakeLoader {
    fn accelerator_available(&self) -> bool {
        self.accelerator
    }

    async fn load_engine(
        &self,
        _model_id: &str,
        device: DeviceSelection,
        precision: Precision,
    ) -> Result<Box<dyn SpeechEngine>, EngineError> {
        self.engine_loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(EngineError::Load("weights not found".to_string()));
        }
        Ok(Box::new(RecordingEngine {
            log: self.log.clone(),
            delay: self.delay,
            device,
            precision,
            output: self.output.clone(),
        }))
    }

    async fn load_processor(&self, _model_id: &str) -> Result<Box<dyn SpeechProcessor>, EngineError> {
        self.processor_loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_processor {
            return Err(EngineError::Load("processor config missing".to_string()));
        }
        Ok(Box::new(FakeProcessor {
            log: self.log.clone(),
            sampling_rate: self.sampling_rate,
            rejected_voice: self.rejected_voice.clone(),
        }))
    }
}
