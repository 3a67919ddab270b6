//! Waveshaping transfer curves.
//!
//! Each generator samples a transfer function `y = f(x)` into a fixed-length
//! table for the [`WaveShaper`](super::shaper::WaveShaper). Parameters are
//! clamped into range rather than rejected, so every call yields a usable
//! curve.

use std::f64::consts::PI;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Table length of the bit-crusher staircase.
pub const BIT_CRUSHER_LEN: usize = 1 << 16;

/// Table length of the saturation and distortion curves.
pub const SHAPER_LEN: usize = 44100;

/// Quantize the input range into `2^bits` evenly spaced levels.
///
/// `bits` is clamped to `[1, 16]`.
pub fn bit_crusher(bits: f64) -> Vec<f32> {
    let bits = bits.clamp(1.0, 16.0);
    let levels = 2.0_f64.powf(bits);
    let n = BIT_CRUSHER_LEN as f64;
    (0..BIT_CRUSHER_LEN)
        .map(|i| {
            let x = i as f64 * levels / n;
            ((2.0 * x.floor() + 1.0) / levels - 1.0) as f32
        })
        .collect()
}

/// Soft clip `height * tanh(attack * 100 * x)`.
///
/// `height` is clamped to `[-1, 1]` and `attack` to `[0, 1]`.
pub fn saturation(height: f64, attack: f64) -> Vec<f32> {
    let height = height.clamp(-1.0, 1.0);
    let attack = attack.clamp(0.0, 1.0);
    sample_symmetric(|x| height * (attack * 100.0 * x).tanh())
}

/// Arctangent distortion whose harmonic content grows with `amount`.
///
/// `amount` is clamped to `[0, 1]`.
pub fn distortion(amount: f64) -> Vec<f32> {
    let k = amount.clamp(0.0, 1.0) * 100.0;
    sample_symmetric(|x| (3.0 + k) * ((x * 0.25).sinh() * 5.0).atan() / (PI + k * x.abs()))
}

/// Sample `f` over `[-1, 1)` into a [`SHAPER_LEN`] table.
fn sample_symmetric(f: impl Fn(f64) -> f64) -> Vec<f32> {
    let n = SHAPER_LEN as f64;
    (0..SHAPER_LEN)
        .map(|i| f(2.0 * i as f64 / n - 1.0) as f32)
        .collect()
}

/// Selectable shaping effects.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Pass-through; the shaper runs without a curve.
    #[default]
    None,
    #[serde(rename = "bitcrusher")]
    BitCrusher { bits: f64 },
    Saturation { height: f64, attack: f64 },
    Distortion { amount: f64 },
}

/// Effect names in picker order.
pub const SHAPES: [&str; 4] = ["none", "bitcrusher", "saturation", "distortion"];

impl Shape {
    /// Build this shape's curve, or `None` for the identity shaper.
    pub fn curve(&self) -> Option<Arc<[f32]>> {
        match *self {
            Shape::None => None,
            Shape::BitCrusher { bits } => Some(bit_crusher(bits).into()),
            Shape::Saturation { height, attack } => Some(saturation(height, attack).into()),
            Shape::Distortion { amount } => Some(distortion(amount).into()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shape::None => SHAPES[0],
            Shape::BitCrusher { .. } => SHAPES[1],
            Shape::Saturation { .. } => SHAPES[2],
            Shape::Distortion { .. } => SHAPES[3],
        }
    }
}
