//! Note-number to pitch mapping.
//!
//! Pitch signals are log pitch: octaves relative to A4 (440 Hz). A [`Scale`]
//! decides which log pitch a note number plays.

/// Maps note numbers to log pitch in octaves relative to A4.
pub trait Scale: Send {
    /// Log pitch for `note`. Fractional notes are allowed.
    fn note_to_log_pitch(&self, note: f32) -> f32;
}

/// Twelve-tone equal temperament, note 69 = A4 = 0 octaves.
///
/// # Example
///
/// ```rust
/// use cadenza_synth::{EqualTemperament, Scale};
///
/// let scale = EqualTemperament;
/// assert_eq!(scale.note_to_log_pitch(69.0), 0.0);
/// assert_eq!(scale.note_to_log_pitch(81.0), 1.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EqualTemperament;

impl Scale for EqualTemperament {
    fn note_to_log_pitch(&self, note: f32) -> f32 {
        (note - 69.0) / 12.0
    }
}

/// An octave-repeating scale from cents offsets.
///
/// `degrees` lists the cents of each step above the root within one octave
/// (the first entry is normally 0). Note `root_note` plays `root_pitch`.
#[derive(Clone, Debug, PartialEq)]
pub struct CentsScale {
    degrees: Vec<f32>,
    root_note: i32,
    root_pitch: f32,
}

impl CentsScale {
    /// Create a scale. An empty degree list falls back to a single step at 0.
    pub fn new(degrees: Vec<f32>, root_note: i32, root_pitch: f32) -> Self {
        let degrees = if degrees.is_empty() { vec![0.0] } else { degrees };
        Self {
            degrees,
            root_note,
            root_pitch,
        }
    }
}

impl Scale for CentsScale {
    fn note_to_log_pitch(&self, note: f32) -> f32 {
        let steps = self.degrees.len() as i32;
        let offset = libm::roundf(note) as i32 - self.root_note;
        let octave = offset.div_euclid(steps);
        let degree = offset.rem_euclid(steps) as usize;
        self.root_pitch + octave as f32 + self.degrees[degree] / 1200.0
    }
}
