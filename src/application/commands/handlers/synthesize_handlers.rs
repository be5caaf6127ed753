//! Synthesize Command Handler

use std::sync::Arc;
use std::time::Instant;

use crate::application::commands::{SynthesizeCommand, SynthesizeResponse};
use crate::application::error::SynthesisError;
use crate::application::inference::InferencePipeline;
use crate::application::ports::AudioEncoderPort;

/// Synthesize Handler
///
/// 流水线产出音频后整体编码
pub struct SynthesizeHandler {
    pipeline: Arc<InferencePipeline>,
    encoder: Arc<dyn AudioEncoderPort>,
}

impl SynthesizeHandler {
    pub fn new(pipeline: Arc<InferencePipeline>, encoder: Arc<dyn AudioEncoderPort>) -> Self {
        Self { pipeline, encoder }
    }

    pub async fn handle(
        &self,
        command: SynthesizeCommand,
    ) -> Result<SynthesizeResponse, SynthesisError> {
        let request_id = command.request_id;
        let started = Instant::now();

        let audio = self.pipeline.run(&command.request).await.map_err(|e| {
            tracing::warn!(
                request_id = %request_id,
                kind = e.kind(),
                error = %e,
                "Synthesis rejected"
            );
            e
        })?;

        let audio_data = self.encoder.encode(&audio)?;

        tracing::info!(
            request_id = %request_id,
            sample_rate = audio.sample_rate,
            duration_ms = audio.duration_ms(),
            audio_size = audio_data.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Synthesis completed"
        );

        Ok(SynthesizeResponse {
            request_id,
            audio_data,
            content_type: self.encoder.content_type(),
            sample_rate: audio.sample_rate,
            duration_ms: audio.duration_ms(),
        })
    }
}
