//! Per-chunk timing.

use std::time::Duration;

/// Accumulates processing time and reports load once per second of audio.
#[derive(Debug, Clone, Default)]
pub struct EngineStats {
    sample_rate: f32,
    frames: u64,
    busy: Duration,
    reports: u64,
    last_cpu_percent: f32,
}

impl EngineStats {
    /// Start counting at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    /// Forget everything counted so far.
    pub fn clear(&mut self) {
        *self = Self::new(self.sample_rate);
    }

    /// Add one timed chunk. Logs and restarts the window once a second of
    /// audio has been counted.
    pub fn record(&mut self, frames: usize, elapsed: Duration) {
        self.frames += frames as u64;
        self.busy += elapsed;
        let window = self.sample_rate.max(1.0) as u64;
        if self.frames < window {
            return;
        }
        let audio_secs = self.frames as f64 / f64::from(self.sample_rate.max(1.0));
        let busy_secs = self.busy.as_secs_f64();
        let us_per_sample = busy_secs * 1e6 / self.frames as f64;
        self.last_cpu_percent = (busy_secs / audio_secs * 100.0) as f32;
        self.reports += 1;
        tracing::info!(
            "dsp: {:.3} us/sample, {:.2}% cpu over {} frames",
            us_per_sample,
            self.last_cpu_percent,
            self.frames
        );
        self.frames = 0;
        self.busy = Duration::ZERO;
    }

    /// Number of windows reported.
    pub fn reports(&self) -> u64 {
        self.reports
    }

    /// CPU percentage of the last reported window.
    pub fn last_cpu_percent(&self) -> f32 {
        self.last_cpu_percent
    }

    /// Frames counted in the current window.
    pub fn pending_frames(&self) -> u64 {
        self.frames
    }
}
