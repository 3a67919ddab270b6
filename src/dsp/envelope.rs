//! Gain stage with an exponential-approach envelope.

/// Gain that optionally decays toward a target once scheduled.
///
/// Follows `value(t) = target + (start - target) * exp(-(t - t0) / tau)`
/// for `t >= t0`. Before `t0`, or with no schedule, the gain holds.
#[derive(Debug, Clone)]
pub struct GainEnvelope {
    /// Gain held before any target is reached.
    pub level: f64,
    target: Option<Target>,
    sample_rate: f64,
}

#[derive(Debug, Clone, Copy)]
struct Target {
    value: f64,
    /// Start time in samples.
    start: u64,
    /// Time constant in seconds.
    tau: f64,
}

impl GainEnvelope {
    pub fn new(sample_rate: f64) -> Self {
        GainEnvelope {
            level: 1.0,
            target: None,
            sample_rate,
        }
    }

    /// Approach `value` from sample `start` with time constant `tau`
    /// seconds. A non-positive `tau` leaves the gain unscheduled.
    pub fn set_target_at(&mut self, value: f64, start: u64, tau: f64) {
        if tau > 0.0 {
            self.target = Some(Target { value, start, tau });
        }
    }

    /// Gain at the absolute sample position `pos`.
    pub fn value_at(&self, pos: u64) -> f64 {
        match self.target {
            Some(t) if pos >= t.start => {
                let elapsed = (pos - t.start) as f64 / self.sample_rate;
                t.value + (self.level - t.value) * (-elapsed / t.tau).exp()
            }
            _ => self.level,
        }
    }
}
