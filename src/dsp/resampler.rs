//! Streaming pitch shifter by variable-rate playback.
//!
//! Incoming blocks are appended to a bounded history, which is then read
//! back at `pitch_ratio` samples per output sample with linear
//! interpolation. This transposes pitch and tempo together. When the read
//! cursor reaches the end of the history it jumps back to the oldest
//! sample, so the output loops with an audible click.

use crate::config::{ParamRange, ResamplerConfig};

/// Nominal history size; the ring holds twice this many samples.
pub const DEFAULT_CAPACITY: usize = 2048;

/// Fixed-capacity history of the most recent samples, oldest at index 0.
#[derive(Debug, Clone)]
struct History {
    data: Vec<f32>,
    /// Physical index of the oldest sample.
    start: usize,
    len: usize,
}

impl History {
    fn new(capacity: usize) -> Self {
        History {
            data: vec![0.0; capacity.max(1)],
            start: 0,
            len: 0,
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    /// Append one sample, dropping the oldest once full.
    #[inline]
    fn push(&mut self, sample: f32) {
        let cap = self.data.len();
        let write_pos = (self.start + self.len) % cap;
        self.data[write_pos] = sample;
        if self.len < cap {
            self.len += 1;
        } else {
            self.start = (self.start + 1) % cap;
        }
    }

    #[inline]
    fn get(&self, index: usize) -> f32 {
        self.data[(self.start + index) % self.data.len()]
    }

    fn clear(&mut self) {
        self.start = 0;
        self.len = 0;
    }
}

/// Per-block pitch shifter over a bounded trailing window.
///
/// Must be driven by a single owner, one block at a time.
#[derive(Debug, Clone)]
pub struct PitchShiftResampler {
    history: History,
    read_cursor: f64,
    pitch_range: ParamRange,
}

impl PitchShiftResampler {
    /// Create a resampler whose history retains `2 * capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(&ResamplerConfig {
            capacity,
            ..ResamplerConfig::default()
        })
    }

    pub fn with_config(config: &ResamplerConfig) -> Self {
        PitchShiftResampler {
            history: History::new(config.capacity * 2),
            read_cursor: 0.0,
            pitch_range: config.pitch_ratio,
        }
    }

    /// Samples currently retained.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn read_cursor(&self) -> f64 {
        self.read_cursor
    }

    pub fn pitch_range(&self) -> ParamRange {
        self.pitch_range
    }

    /// Process one block.
    ///
    /// Only the first input channel is read and only the first output
    /// channel receives the shifted signal; remaining output channels are
    /// zeroed. With no input channels every output channel is zeroed.
    /// `pitch_ratio` is clamped into the declared range.
    pub fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]], pitch_ratio: f64) {
        let Some(input) = inputs.first() else {
            for channel in outputs.iter_mut() {
                channel.fill(0.0);
            }
            return;
        };

        for &s in input.iter() {
            self.history.push(s);
        }

        let Some((primary, rest)) = outputs.split_first_mut() else {
            return;
        };
        for channel in rest.iter_mut() {
            channel.fill(0.0);
        }

        let ratio = self.pitch_range.clamp(pitch_ratio);
        for out in primary.iter_mut() {
            *out = self.read_at_cursor();
            self.read_cursor += ratio;

            if self.read_cursor >= self.history.len() as f64 - 1.0 {
                self.read_cursor = 0.0;
            }
        }
    }

    /// Mono convenience wrapper around [`process`](Self::process).
    pub fn process_mono(&mut self, input: &[f32], output: &mut [f32], pitch_ratio: f64) {
        self.process(&[input], &mut [output], pitch_ratio);
    }

    /// Interpolated history sample under the read cursor, or silence past
    /// the end.
    #[inline]
    fn read_at_cursor(&self) -> f32 {
        let len = self.history.len();
        let floor = self.read_cursor.floor();
        let fraction = (self.read_cursor - floor) as f32;
        let floor = floor as usize;
        let ceil = self.read_cursor.ceil() as usize;

        if ceil < len {
            self.history.get(floor) * (1.0 - fraction) + self.history.get(ceil) * fraction
        } else if floor < len {
            self.history.get(floor)
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.read_cursor = 0.0;
    }
}

impl Default for PitchShiftResampler {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
