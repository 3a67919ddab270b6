//! Tone engine: plays monophonic tones through a shaper and gain stage.
//!
//! Each [`ToneEngine::play`] call starts a [`ToneSession`] and returns a
//! [`ToneHandle`] that resolves once: with [`ToneEnded`] when the scheduled
//! duration elapses, or with [`ToneError::Aborted`] when the engine's
//! current [`CancelToken`] fires first. Time only advances through
//! [`ToneEngine::render`], which pulls one block of audio from every live
//! session into the destination buffer.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError};
use std::task::{Context, Poll};

use log::{debug, trace, warn};
use tokio::sync::oneshot;

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::dsp::analyser::{Analyser, AnalyserTap};
use crate::dsp::envelope::GainEnvelope;
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::dsp::shaper::WaveShaper;
use crate::error::{ToneEnded, ToneError};
use crate::notes::frequency_of;

/// What a tone resolves to.
pub type ToneOutcome = Result<ToneEnded, ToneError>;

/// Optional routing for a tone.
#[derive(Debug, Clone, Default)]
pub struct ToneOptions {
    /// Transfer curve for the shaping stage; `None` passes through.
    pub shaper: Option<Arc<[f32]>>,
    /// Extra destination receiving the shaped, gained signal.
    pub analyser: Option<AnalyserTap>,
}

impl ToneOptions {
    pub fn with_shaper(mut self, curve: Arc<[f32]>) -> Self {
        self.shaper = Some(curve);
        self
    }

    pub fn with_analyser(mut self, tap: AnalyserTap) -> Self {
        self.analyser = Some(tap);
        self
    }
}

/// One playing tone: oscillator -> shaper -> gain.
#[derive(Debug)]
pub struct ToneSession {
    id: u64,
    oscillator: Oscillator,
    shaper: WaveShaper,
    gain: GainEnvelope,
    /// Absolute sample at which the source stops, if scheduled.
    stop_at: Option<u64>,
    token: CancelToken,
    analyser: Option<AnalyserTap>,
    scratch: Vec<f32>,
    done: Option<oneshot::Sender<ToneOutcome>>,
}

impl ToneSession {
    /// Add this session's output for the block starting at `block_start`,
    /// keeping a copy in `scratch` for the analysis tap.
    fn render(&mut self, block_start: u64, out: &mut [f32]) {
        self.scratch.clear();
        self.scratch.resize(out.len(), 0.0);

        for (i, (dest, tap)) in out.iter_mut().zip(self.scratch.iter_mut()).enumerate() {
            let pos = block_start + i as u64;
            if self.stop_at.is_some_and(|t| pos >= t) {
                break;
            }
            let shaped = self.shaper.process(self.oscillator.next_sample());
            let y = (shaped * self.gain.value_at(pos)) as f32;
            *dest += y;
            *tap = y;
        }
    }

    fn has_ended(&self, now: u64) -> bool {
        self.stop_at.is_some_and(|t| now >= t)
    }

    /// Deliver the outcome. Only the first call has any effect.
    fn finish(&mut self, outcome: ToneOutcome) {
        if let Some(done) = self.done.take() {
            match &outcome {
                Ok(ended) => debug!("tone {} {ended}", self.id),
                Err(e) => debug!("tone {} {e}", self.id),
            }
            // The handle may already be gone; nobody is waiting then.
            let _ = done.send(outcome);
        }
    }
}

/// Pending result of a [`ToneEngine::play`] call.
///
/// Await it, or poll it without blocking through [`try_outcome`](Self::try_outcome).
#[derive(Debug)]
pub struct ToneHandle {
    id: u64,
    rx: oneshot::Receiver<ToneOutcome>,
    outcome: Option<ToneOutcome>,
}

impl ToneHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The outcome if the tone has finished, otherwise `None`.
    pub fn try_outcome(&mut self) -> Option<ToneOutcome> {
        if self.outcome.is_none() {
            self.outcome = match self.rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(oneshot::error::TryRecvError::Empty) => None,
                // Engine dropped with the tone still live.
                Err(oneshot::error::TryRecvError::Closed) => Some(Err(ToneError::Aborted)),
            };
        }
        self.outcome
    }
}

impl Future for ToneHandle {
    type Output = ToneOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome {
            return Poll::Ready(outcome);
        }
        let outcome = match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => outcome,
            Poll::Ready(Err(_)) => Err(ToneError::Aborted),
            Poll::Pending => return Poll::Pending,
        };
        self.outcome = Some(outcome);
        Poll::Ready(outcome)
    }
}

/// Drives tones against a sample clock.
///
/// All tones started between two `stop` calls share one cancellation
/// token; `stop` fires it and issues a fresh one, so a fired token never
/// reaches a later tone. Tones that must be cancelled independently need
/// their own engine.
#[derive(Debug)]
pub struct ToneEngine {
    config: EngineConfig,
    /// Current time in samples.
    clock: u64,
    sessions: Vec<ToneSession>,
    token: CancelToken,
    next_id: u64,
    /// Per-block mix for each distinct analysis tap.
    tap_mix: Vec<(AnalyserTap, Vec<f32>)>,
}

impl ToneEngine {
    pub fn new(config: EngineConfig) -> Self {
        ToneEngine {
            config,
            clock: 0,
            sessions: Vec::new(),
            token: CancelToken::new(),
            next_id: 0,
            tap_mix: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    /// Seconds rendered so far.
    pub fn current_time(&self) -> f64 {
        self.clock as f64 / self.config.sample_rate
    }

    pub fn active_tones(&self) -> usize {
        self.sessions.len()
    }

    /// The token that the next `stop` will fire. Cancelling a clone has the
    /// same effect on live tones, applied at the next `play` or `render`.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// A new analysis tap sized from the engine config.
    pub fn analyser(&self) -> AnalyserTap {
        Analyser::tap(self.config.analyser_size)
    }

    /// Start a tone at `freq` Hz.
    ///
    /// With `duration > 0` the source stops after `duration` seconds and
    /// the gain decays toward zero with time constant `duration / 4` from
    /// now. Otherwise the tone plays until [`stop`](Self::stop).
    pub fn play(&mut self, freq: f64, duration: f64, waveform: Waveform, options: ToneOptions) -> ToneHandle {
        self.sweep_cancelled();

        if !(freq.is_finite() && freq > 0.0) {
            warn!("playing tone with non-positive frequency {freq}");
        }

        let sr = self.config.sample_rate;
        let start = self.clock;
        let mut gain = GainEnvelope::new(sr);
        let stop_at = if duration > 0.0 {
            gain.set_target_at(0.0, start, duration / 4.0);
            // An unbounded duration saturates to a tone that never ends.
            Some(start.saturating_add((duration * sr).round() as u64))
        } else {
            None
        };

        let id = self.next_id;
        self.next_id += 1;
        let (tx, rx) = oneshot::channel();

        debug!("tone {id}: {freq:.2} Hz {waveform} for {duration}s");
        self.sessions.push(ToneSession {
            id,
            oscillator: Oscillator::new(waveform, freq, sr),
            shaper: WaveShaper::new(options.shaper, self.config.oversample),
            gain,
            stop_at,
            token: self.token.clone(),
            analyser: options.analyser,
            scratch: Vec::new(),
            done: Some(tx),
        });

        ToneHandle { id, rx, outcome: None }
    }

    /// Play the pitch `semitone_offset` semitones above `tonic_index` in
    /// `octave`.
    pub fn play_note(
        &mut self,
        tonic_index: i32,
        semitone_offset: i32,
        octave: f64,
        duration: f64,
        waveform: Waveform,
        options: ToneOptions,
    ) -> ToneHandle {
        let freq = frequency_of(tonic_index, semitone_offset, octave);
        self.play(freq, duration, waveform, options)
    }

    /// Abort every live tone and re-arm with a fresh token.
    ///
    /// Safe to call with nothing playing.
    pub fn stop(&mut self) {
        if self.token.cancel() {
            trace!("cancel token fired at {:.3}s", self.current_time());
        }
        self.sweep_cancelled();
    }

    /// Render one block into `out`, advancing the clock by `out.len()`.
    pub fn render(&mut self, out: &mut [f32]) {
        self.sweep_cancelled();

        out.fill(0.0);
        let block_start = self.clock;
        for session in &mut self.sessions {
            session.render(block_start, out);

            let Some(tap) = &session.analyser else {
                continue;
            };
            match self.tap_mix.iter_mut().find(|(t, _)| Arc::ptr_eq(t, tap)) {
                Some((_, mix)) => {
                    for (m, &s) in mix.iter_mut().zip(&session.scratch) {
                        *m += s;
                    }
                }
                None => self.tap_mix.push((tap.clone(), session.scratch.clone())),
            }
        }
        for (tap, mix) in self.tap_mix.drain(..) {
            tap.lock().unwrap_or_else(PoisonError::into_inner).write(&mix);
        }
        self.clock += out.len() as u64;

        let now = self.clock;
        self.sessions.retain_mut(|session| {
            if session.has_ended(now) {
                session.finish(Ok(ToneEnded));
                false
            } else {
                true
            }
        });
    }

    /// Render `seconds` of audio in blocks of `block_size`.
    pub fn render_for(&mut self, seconds: f64, block_size: usize) -> Vec<f32> {
        let total = (seconds * self.config.sample_rate).round() as usize;
        let mut out = vec![0.0; total];
        for block in out.chunks_mut(block_size.max(1)) {
            self.render(block);
        }
        out
    }

    /// Abort sessions holding a fired token, and re-arm if ours has fired.
    fn sweep_cancelled(&mut self) {
        self.sessions.retain_mut(|session| {
            if session.token.is_cancelled() {
                session.finish(Err(ToneError::Aborted));
                false
            } else {
                true
            }
        });
        if self.token.is_cancelled() {
            self.token = CancelToken::new();
        }
    }
}

impl Default for ToneEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
