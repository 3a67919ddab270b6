//! Offline renderer: plays a single tone to a sample buffer or WAV bytes.

use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::RenderError;
use crate::tone::{ToneEngine, ToneOptions};

use super::curve::Shape;
use super::oscillator::Waveform;

/// Block size used when pulling audio from the engine.
const RENDER_BLOCK: usize = 128;

/// A complete description of one tone to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToneRequest {
    pub frequency: f64,
    /// Seconds; must be positive for an offline render.
    pub duration: f64,
    pub waveform: Waveform,
    pub shape: Shape,
}

impl Default for ToneRequest {
    fn default() -> Self {
        ToneRequest {
            frequency: 440.0,
            duration: 1.0,
            waveform: Waveform::Sine,
            shape: Shape::None,
        }
    }
}

/// Render `request` to mono samples. A non-positive duration renders nothing.
pub fn render_tone(request: &ToneRequest, config: &EngineConfig) -> Vec<f32> {
    if request.duration <= 0.0 {
        return Vec::new();
    }

    let mut engine = ToneEngine::new(config.clone());
    let options = ToneOptions {
        shaper: request.shape.curve(),
        analyser: None,
    };
    let _tone = engine.play(request.frequency, request.duration, request.waveform, options);
    engine.render_for(request.duration, RENDER_BLOCK)
}

/// Render `request` as a 16-bit mono PCM WAV file.
pub fn render_tone_wav(request: &ToneRequest, config: &EngineConfig) -> Result<Vec<u8>, RenderError> {
    let samples = render_tone(request, config);
    encode_wav(&samples, config.sample_rate.round() as u32)
}

/// Encode mono f32 samples as 16-bit PCM WAV.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, RenderError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig {
            sample_rate: 8000.0,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn renders_requested_length() {
        let request = ToneRequest {
            duration: 0.5,
            ..ToneRequest::default()
        };
        let samples = render_tone(&request, &config());
        assert_eq!(samples.len(), 4000);
        assert!(samples.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn zero_duration_renders_nothing() {
        let request = ToneRequest {
            duration: 0.0,
            ..ToneRequest::default()
        };
        assert!(render_tone(&request, &config()).is_empty());
    }

    #[test]
    fn saturation_bounds_rendered_output() {
        let request = ToneRequest {
            frequency: 220.0,
            duration: 0.25,
            waveform: Waveform::Square,
            shape: Shape::Saturation { height: 0.3, attack: 1.0 },
        };
        let samples = render_tone(&request, &config());
        assert!(samples.iter().all(|s| s.abs() <= 0.3 + 1e-6));
    }

    #[test]
    fn wav_header_valid() {
        let request = ToneRequest {
            duration: 0.25,
            ..ToneRequest::default()
        };
        let wav = render_tone_wav(&request, &config()).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 8000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 2000);
    }

    #[test]
    fn request_from_json() {
        let request: ToneRequest = serde_json::from_str(
            r#"{"frequency": 330, "waveform": "sawtooth", "shape": {"type": "distortion", "amount": 0.4}}"#,
        )
        .unwrap();
        assert_eq!(request.frequency, 330.0);
        assert_eq!(request.duration, 1.0);
        assert_eq!(request.waveform, Waveform::Sawtooth);
        assert_eq!(request.shape, Shape::Distortion { amount: 0.4 });
    }
}
