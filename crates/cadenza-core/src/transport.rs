//! Host transport position and tempo.
//!
//! The host reports its transport once per block. The engine advances that
//! snapshot chunk by chunk with [`TransportInfo::advanced_by`] so that
//! tempo-synced procs see a position aligned to the chunk they are rendering.

use libm::floor;

/// Transport state reported by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    /// Transport halted; the beat position does not advance.
    #[default]
    Stopped,
    /// Transport running.
    Playing,
}

/// Snapshot of the host transport at the start of a block.
///
/// # Example
///
/// ```rust
/// use cadenza_core::{TransportInfo, TransportState};
///
/// let t = TransportInfo::new(0.0, 0.0, 120.0, TransportState::Playing);
/// // half a second at 120 BPM is one beat
/// let later = t.advanced_by(24000, 48000.0);
/// assert!((later.beat_position - 1.0).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransportInfo {
    /// Wall position of the host timeline in seconds.
    pub elapsed_seconds: f64,
    /// Position in quarter-note beats.
    pub beat_position: f64,
    /// Tempo in beats per minute.
    pub bpm: f64,
    /// Whether the transport is running.
    pub state: TransportState,
}

impl Default for TransportInfo {
    fn default() -> Self {
        Self::new(0.0, 0.0, 120.0, TransportState::Stopped)
    }
}

impl TransportInfo {
    /// Create a transport snapshot.
    pub fn new(elapsed_seconds: f64, beat_position: f64, bpm: f64, state: TransportState) -> Self {
        Self {
            elapsed_seconds,
            beat_position,
            bpm: bpm.max(1.0),
            state,
        }
    }

    /// Check if transport is playing.
    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Beats advanced per sample at `sample_rate`.
    pub fn beats_per_sample(&self, sample_rate: f32) -> f64 {
        if sample_rate <= 0.0 {
            return 0.0;
        }
        self.bpm / 60.0 / f64::from(sample_rate)
    }

    /// Fractional position within the current beat (0.0 to 1.0).
    pub fn beat_phase(&self) -> f64 {
        self.beat_position - floor(self.beat_position)
    }

    /// The snapshot `frames` samples later.
    ///
    /// Elapsed time always advances; the beat position only while playing.
    #[must_use]
    pub fn advanced_by(&self, frames: usize, sample_rate: f32) -> Self {
        let mut next = *self;
        if sample_rate > 0.0 {
            next.elapsed_seconds += frames as f64 / f64::from(sample_rate);
        }
        if self.is_playing() {
            next.beat_position += frames as f64 * self.beats_per_sample(sample_rate);
        }
        next
    }
}
