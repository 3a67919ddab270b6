//! WaveShaper stage. Maps each sample through a transfer curve.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Oversampling applied around the curve lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Oversample {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "2x")]
    X2,
    #[default]
    #[serde(rename = "4x")]
    X4,
}

impl Oversample {
    pub fn factor(&self) -> usize {
        match self {
            Oversample::None => 1,
            Oversample::X2 => 2,
            Oversample::X4 => 4,
        }
    }
}

/// Non-linear shaping stage driven by a shared, read-only curve.
///
/// Input in `[-1, 1]` is mapped linearly across the curve and interpolated
/// between neighbouring entries; input outside that range takes the end
/// value. Without a curve the stage passes samples through untouched.
#[derive(Debug, Clone)]
pub struct WaveShaper {
    curve: Option<Arc<[f32]>>,
    oversample: Oversample,
    last_input: f64,
}

impl WaveShaper {
    pub fn new(curve: Option<Arc<[f32]>>, oversample: Oversample) -> Self {
        WaveShaper {
            curve,
            oversample,
            last_input: 0.0,
        }
    }

    /// Shape one sample.
    ///
    /// With oversampling, the segment from the previous input is subdivided,
    /// each point is shaped, and the results are averaged back down.
    pub fn process(&mut self, input: f64) -> f64 {
        let Some(curve) = self.curve.as_deref() else {
            return input;
        };

        let factor = self.oversample.factor();
        let out = if factor == 1 {
            lookup(curve, input)
        } else {
            let step = (input - self.last_input) / factor as f64;
            let sum: f64 = (1..=factor)
                .map(|j| lookup(curve, self.last_input + step * j as f64))
                .sum();
            sum / factor as f64
        };

        self.last_input = input;
        out
    }
}

/// Read `curve` at amplitude `x`, interpolating between entries.
pub fn lookup(curve: &[f32], x: f64) -> f64 {
    let n = curve.len();
    match n {
        0 => return x,
        1 => return curve[0] as f64,
        _ => {}
    }

    let v = (n - 1) as f64 * 0.5 * (x + 1.0);
    if v <= 0.0 {
        return curve[0] as f64;
    }
    if v >= (n - 1) as f64 {
        return curve[n - 1] as f64;
    }

    let k = v.floor() as usize;
    let f = v - k as f64;
    curve[k] as f64 * (1.0 - f) + curve[k + 1] as f64 * f
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::curve::{bit_crusher, saturation};

    #[test]
    fn no_curve_is_identity() {
        let mut shaper = WaveShaper::new(None, Oversample::X4);
        for x in [-2.0, -0.5, 0.0, 0.3, 1.7] {
            assert_eq!(shaper.process(x), x);
        }
    }

    #[test]
    fn lookup_interpolates_linear_curve() {
        let curve: Vec<f32> = vec![-1.0, 0.0, 1.0];
        assert_eq!(lookup(&curve, -1.0), -1.0);
        assert_eq!(lookup(&curve, 0.0), 0.0);
        assert!((lookup(&curve, 0.5) - 0.5).abs() < 1e-12);
        assert!((lookup(&curve, -0.25) + 0.25).abs() < 1e-12);
    }

    #[test]
    fn lookup_clamps_out_of_range_input() {
        let curve: Vec<f32> = vec![-0.8, 0.1, 0.9];
        assert!((lookup(&curve, -3.0) + 0.8).abs() < 1e-6);
        assert!((lookup(&curve, 3.0) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn single_entry_curve_is_constant() {
        let curve: Vec<f32> = vec![0.25];
        assert_eq!(lookup(&curve, -1.0), 0.25);
        assert_eq!(lookup(&curve, 0.7), 0.25);
    }

    #[test]
    fn one_bit_crusher_squares_the_signal() {
        let curve: Arc<[f32]> = bit_crusher(1.0).into();
        let mut shaper = WaveShaper::new(Some(curve), Oversample::None);
        assert!((shaper.process(0.6) - 0.5).abs() < 1e-6);
        assert!((shaper.process(-0.6) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn oversampled_output_stays_within_curve_bounds() {
        let curve: Arc<[f32]> = saturation(0.5, 1.0).into();
        let mut shaper = WaveShaper::new(Some(curve), Oversample::X4);
        for i in 0..1000 {
            let x = (i as f64 * 0.05).sin();
            let y = shaper.process(x);
            assert!(y.abs() <= 0.5 + 1e-6, "Shaped sample {y} exceeds height");
        }
    }

    #[test]
    fn oversampling_settles_on_steady_input() {
        let curve: Arc<[f32]> = saturation(1.0, 0.5).into();
        let mut plain = WaveShaper::new(Some(curve.clone()), Oversample::None);
        let mut over = WaveShaper::new(Some(curve), Oversample::X2);
        over.process(0.4);
        let a = plain.process(0.4);
        let b = over.process(0.4);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn oversample_names() {
        let o: Oversample = serde_json::from_str("\"4x\"").unwrap();
        assert_eq!(o, Oversample::X4);
        assert_eq!(Oversample::default().factor(), 4);
    }
}
