//! WAV Encoder - 基于 hound 的 PCM 编码器
//!
//! f32 样本 → RIFF/WAVE，16 位有符号 PCM

use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

use crate::application::ports::{AudioEncoderPort, EncodeError};
use crate::domain::AudioResult;

const BITS_PER_SAMPLE: u16 = 16;

/// WAV 编码器
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoder;

impl WavEncoder {
    pub fn new() -> Self {
        Self
    }

    fn validate(audio: &AudioResult) -> Result<(), EncodeError> {
        if audio.sample_rate == 0 {
            return Err(EncodeError::InvalidInput(
                "sample rate must be positive".to_string(),
            ));
        }
        if audio.channels == 0 {
            return Err(EncodeError::InvalidInput(
                "channel count must be positive".to_string(),
            ));
        }
        if audio.samples.len() % audio.channels as usize != 0 {
            return Err(EncodeError::InvalidInput(format!(
                "{} samples cannot be split into {} channels",
                audio.samples.len(),
                audio.channels
            )));
        }
        Ok(())
    }
}

/// f32 → i16，超出 [-1, 1] 的截断，非有限值写为静音
fn to_pcm16(sample: f32) -> i16 {
    if !sample.is_finite() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

impl AudioEncoderPort for WavEncoder {
    fn encode(&self, audio: &AudioResult) -> Result<Vec<u8>, EncodeError> {
        Self::validate(audio)?;

        let spec = WavSpec {
            channels: audio.channels,
            sample_rate: audio.sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + audio.samples.len() * 2));
        {
            let mut writer = WavWriter::new(&mut cursor, spec)
                .map_err(|e| EncodeError::EncodingError(format!("Failed to create WAV writer: {}", e)))?;

            for &sample in &audio.samples {
                writer
                    .write_sample(to_pcm16(sample))
                    .map_err(|e| EncodeError::EncodingError(format!("Failed to write sample: {}", e)))?;
            }

            writer
                .finalize()
                .map_err(|e| EncodeError::EncodingError(format!("Failed to finalize WAV: {}", e)))?;
        }

        Ok(cursor.into_inner())
    }

    fn content_type(&self) -> &'static str {
        "audio/wav"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::SampleBuffer;
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::MediaSourceStream;
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    struct Decoded {
        samples: Vec<f32>,
        sample_rate: u32,
        channels: usize,
    }

    /// 使用 symphonia 独立解码，校验编码结果
    fn decode(data: &[u8]) -> Decoded {
        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        hint.with_extension("wav");

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .expect("probe failed");
        let mut format = probed.format;
        let track = format.default_track().expect("no audio track");
        let sample_rate = track.codec_params.sample_rate.expect("unknown sample rate");
        let channels = track.codec_params.channels.expect("unknown channels").count();
        let track_id = track.id;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .expect("decoder creation failed");

        let mut samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(symphonia::core::errors::Error::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => panic!("packet read error: {}", e),
            };
            if packet.track_id() != track_id {
                continue;
            }
            let decoded = decoder.decode(&packet).expect("decode failed");
            let spec = *decoded.spec();
            let frames = decoded.frames();
            let mut buf = SampleBuffer::<f32>::new(frames as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend(&buf.samples()[..frames * spec.channels.count()]);
        }

        Decoded {
            samples,
            sample_rate,
            channels,
        }
    }

    fn sine(len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_round_trip_preserves_rate_and_count() {
        let audio = AudioResult::mono(sine(24_000, 24_000), 24_000);
        let wav = WavEncoder::new().encode(&audio).unwrap();

        let decoded = decode(&wav);
        assert_eq!(decoded.sample_rate, 24_000);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.samples.len(), 24_000);

        for (a, b) in audio.samples.iter().zip(decoded.samples.iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_header_layout() {
        let audio = AudioResult::mono(vec![0.0; 100], 24_000);
        let wav = WavEncoder::new().encode(&audio).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24_000);
        assert_eq!(wav.len(), 44 + 200);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let audio = AudioResult::mono(sine(1000, 16_000), 16_000);
        let encoder = WavEncoder::new();
        assert_eq!(encoder.encode(&audio).unwrap(), encoder.encode(&audio).unwrap());
    }

    #[test]
    fn test_out_of_range_and_non_finite_samples() {
        assert_eq!(to_pcm16(2.0), i16::MAX);
        assert_eq!(to_pcm16(-2.0), -i16::MAX);
        assert_eq!(to_pcm16(f32::NAN), 0);
        assert_eq!(to_pcm16(f32::INFINITY), 0);
        assert_eq!(to_pcm16(0.0), 0);
    }

    #[test]
    fn test_stereo_round_trip() {
        let samples: Vec<f32> = (0..2000).map(|i| if i % 2 == 0 { 0.25 } else { -0.25 }).collect();
        let audio = AudioResult {
            samples,
            sample_rate: 48_000,
            channels: 2,
        };
        let decoded = decode(&WavEncoder::new().encode(&audio).unwrap());
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.sample_rate, 48_000);
        assert_eq!(decoded.samples.len(), 2000);
    }

    #[test]
    fn test_empty_audio_is_valid_wav() {
        let wav = WavEncoder::new()
            .encode(&AudioResult::mono(Vec::new(), 24_000))
            .unwrap();
        assert_eq!(wav.len(), 44);
    }

    #[test]
    fn test_invalid_audio_rejected() {
        let encoder = WavEncoder::new();
        assert!(encoder.encode(&AudioResult::mono(vec![0.0], 0)).is_err());

        let ragged = AudioResult {
            samples: vec![0.0; 3],
            sample_rate: 24_000,
            channels: 2,
        };
        assert!(matches!(encoder.encode(&ragged), Err(EncodeError::InvalidInput(_))));
    }
}
