//! DSP building blocks: curves, tone stages, analysis, and resampling.
//!
//! Everything here is plain sample math with no platform audio API, so the
//! same code runs inside an AudioWorklet (via WASM) and in native tests.

pub mod analyser;
pub mod curve;
pub mod envelope;
pub mod oscillator;
pub mod renderer;
pub mod resampler;
pub mod shaper;
