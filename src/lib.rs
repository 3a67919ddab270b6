pub mod cancel;
pub mod config;
pub mod dsp;
pub mod error;
pub mod notes;
pub mod tone;

pub use cancel::CancelToken;
pub use config::{EngineConfig, ResamplerConfig};
pub use dsp::curve::{Shape, bit_crusher, distortion, saturation};
pub use dsp::oscillator::Waveform;
pub use dsp::resampler::PitchShiftResampler;
pub use error::{Error, ToneEnded, ToneError};
pub use notes::{Note, frequency_of};
pub use tone::{ToneEngine, ToneHandle, ToneOptions, ToneOutcome};

use wasm_bindgen::prelude::*;

use crate::dsp::renderer::ToneRequest;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the tonebox version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: route `log` records and panics to the browser console.
#[cfg(feature = "console")]
#[wasm_bindgen]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    // Ignore a second initialisation.
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// WASM-exposed: equal-tempered frequency of a tonic, offset, and octave.
#[wasm_bindgen(js_name = frequencyOf)]
pub fn frequency_of_js(tonic_index: i32, semitone_offset: i32, octave: f64) -> f64 {
    notes::frequency_of(tonic_index, semitone_offset, octave)
}

/// WASM-exposed: bit-crusher curve for a WaveShaperNode.
#[wasm_bindgen(js_name = bitCrusherCurve)]
pub fn bit_crusher_curve(bits: f64) -> Vec<f32> {
    dsp::curve::bit_crusher(bits)
}

/// WASM-exposed: saturation curve for a WaveShaperNode.
#[wasm_bindgen(js_name = saturationCurve)]
pub fn saturation_curve(height: f64, attack: f64) -> Vec<f32> {
    dsp::curve::saturation(height, attack)
}

/// WASM-exposed: distortion curve for a WaveShaperNode.
#[wasm_bindgen(js_name = distortionCurve)]
pub fn distortion_curve(amount: f64) -> Vec<f32> {
    dsp::curve::distortion(amount)
}

/// WASM-exposed: render a tone described by a JS object to WAV bytes.
///
/// `request` follows [`ToneRequest`], e.g.
/// `{ frequency: 440, duration: 1, waveform: "sine", shape: { type: "none" } }`.
#[wasm_bindgen(js_name = renderToneWav)]
pub fn render_tone_wav(request: JsValue, sample_rate: f64) -> Result<Vec<u8>, JsValue> {
    let request: ToneRequest =
        serde_wasm_bindgen::from_value(request).map_err(|e| JsValue::from_str(&format!("{e}")))?;
    let config = EngineConfig {
        sample_rate,
        ..EngineConfig::default()
    };
    config.validate().map_err(|e| JsValue::from_str(&format!("{e}")))?;
    dsp::renderer::render_tone_wav(&request, &config).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed pitch shifter, driven once per render quantum from an
/// AudioWorklet's `process` callback.
#[wasm_bindgen]
pub struct PitchShifter {
    inner: PitchShiftResampler,
    warned_range: bool,
}

#[wasm_bindgen]
impl PitchShifter {
    /// `capacity` is the nominal history size (default 2048).
    #[wasm_bindgen(constructor)]
    pub fn new(capacity: Option<u32>) -> PitchShifter {
        let capacity = capacity.map_or(dsp::resampler::DEFAULT_CAPACITY, |c| c.max(1) as usize);
        PitchShifter {
            inner: PitchShiftResampler::new(capacity),
            warned_range: false,
        }
    }

    /// Shift one mono block from `input` into `output`.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], pitch_ratio: f64) {
        if !self.warned_range && !self.inner.pitch_range().contains(pitch_ratio) {
            log::warn!("pitch ratio {pitch_ratio} outside [0.1, 10], clamping");
            self.warned_range = true;
        }
        self.inner.process_mono(input, output, pitch_ratio);
    }

    /// Fill `output` for a quantum with no connected input.
    pub fn silence(&mut self, output: &mut [f32]) {
        self.inner.process(&[], &mut [output], 1.0);
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    #[wasm_bindgen(getter, js_name = historyLength)]
    pub fn history_length(&self) -> usize {
        self.inner.history_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exported_curves_match_generators() {
        assert_eq!(bit_crusher_curve(3.0), dsp::curve::bit_crusher(3.0));
        assert_eq!(saturation_curve(0.5, 0.5).len(), dsp::curve::SHAPER_LEN);
        assert_eq!(distortion_curve(2.0), dsp::curve::distortion(1.0));
        assert_eq!(frequency_of_js(0, 0, 4.0), 440.0);
    }

    #[test]
    fn pitch_shifter_silence_and_process() {
        let mut shifter = PitchShifter::new(Some(64));
        let mut out = vec![0.4; 128];
        shifter.silence(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));

        let input: Vec<f32> = (0..128).map(|i| (i as f32 * 0.1).sin()).collect();
        shifter.process(&input, &mut out, 1.0);
        assert_eq!(shifter.history_length(), 128);
        assert!((out[10] - input[10]).abs() < 1e-6);

        shifter.process(&input, &mut out, 40.0);
        shifter.reset();
        assert_eq!(shifter.history_length(), 0);
    }
}
