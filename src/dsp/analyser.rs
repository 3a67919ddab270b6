//! Analysis tap feeding the oscilloscope.

use std::sync::{Arc, Mutex};

/// Default window, matching a 2048-point analyser.
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Shared handle through which the engine writes and the UI reads.
pub type AnalyserTap = Arc<Mutex<Analyser>>;

/// Keeps the most recent `fft_size` samples of whatever is connected to it.
#[derive(Debug, Clone)]
pub struct Analyser {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl Analyser {
    pub fn new(fft_size: usize) -> Self {
        Analyser {
            buffer: vec![0.0; fft_size.max(1)],
            write_pos: 0,
        }
    }

    pub fn tap(fft_size: usize) -> AnalyserTap {
        Arc::new(Mutex::new(Analyser::new(fft_size)))
    }

    pub fn fft_size(&self) -> usize {
        self.buffer.len()
    }

    /// Number of points in the time-domain view.
    pub fn frequency_bin_count(&self) -> usize {
        self.buffer.len() / 2
    }

    /// Accumulate a block of samples.
    pub fn write(&mut self, block: &[f32]) {
        let len = self.buffer.len();
        for &s in block {
            self.buffer[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % len;
        }
    }

    /// The first `frequency_bin_count` samples of the latest `fft_size`
    /// window, oldest first, as a half-length `getByteTimeDomainData`
    /// array reads them.
    pub fn time_domain_data(&self) -> Vec<f32> {
        let len = self.buffer.len();
        let count = self.frequency_bin_count().max(1).min(len);
        (0..count).map(|i| self.buffer[(self.write_pos + i) % len]).collect()
    }

    /// Time-domain data scaled to bytes, with 128 as the zero line.
    pub fn byte_time_domain_data(&self) -> Vec<u8> {
        self.time_domain_data()
            .iter()
            .map(|&s| (128.0 * (1.0 + s)).floor().clamp(0.0, 255.0) as u8)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_reads_as_midline() {
        let a = Analyser::new(DEFAULT_FFT_SIZE);
        let bytes = a.byte_time_domain_data();
        assert_eq!(bytes.len(), 1024);
        assert!(bytes.iter().all(|&b| b == 128));
    }

    #[test]
    fn reads_front_half_of_latest_window() {
        let mut a = Analyser::new(8);
        a.write(&[1.0, 2.0, 3.0]);
        a.write(&[4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        // Window is 2..=9.
        assert_eq!(a.time_domain_data(), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn byte_scaling_clamps() {
        let mut a = Analyser::new(4);
        a.write(&[-1.0, 0.5, 1.0, -3.0]);
        assert_eq!(a.byte_time_domain_data(), vec![0, 192]);
        a.write(&[0.5, -1.0]);
        assert_eq!(a.byte_time_domain_data(), vec![255, 0]);
    }
}
