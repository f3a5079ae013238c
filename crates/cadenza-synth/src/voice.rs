//! One voice of the event-to-signal converter.
//!
//! A [`Voice`] owns a 9-row output signal, one row per [field](FIELD_NAMES),
//! and writes every frame of every row each vector. Note transitions land on
//! the exact frame of their event; the continuous controls (pitch bend, mod,
//! x, y, z) move toward their targets with a vector-rate [`Glide`].
//!
//! ## State machine
//!
//! ```text
//!          NoteOn              NoteOff (pedal up)
//!   Off ----------> On ------------------------> Off
//!                   | ^                           ^
//!   NoteOff (pedal  | | NoteRetrig                | NoteOff on
//!   down)           v |  (stays On)               | pedal release
//!                 Sustain ------------------------+
//! ```

use cadenza_core::{GraphError, Signal, flush_denormal};

use crate::event::{Event, EventKind};
use crate::scale::Scale;

/// Row holding the voice index.
pub const VOICE_ID: usize = 0;
/// Row holding log pitch in octaves relative to A4.
pub const PITCH: usize = 1;
/// Row holding velocity, 0 while the voice is silent.
pub const VELOCITY: usize = 2;
/// Row holding pitch bend.
pub const PITCH_BEND: usize = 3;
/// Row holding the mod wheel (controller 1).
pub const MOD: usize = 4;
/// Row holding x (controller 73).
pub const X: usize = 5;
/// Row holding y (controller 74).
pub const Y: usize = 6;
/// Row holding z (pressure).
pub const Z: usize = 7;
/// Row holding seconds since the last note transition.
pub const ELAPSED_TIME: usize = 8;
/// Number of output rows per voice.
pub const FIELD_COUNT: usize = 9;

/// Field names in row order, as used in port names.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "voice", "pitch", "velocity", "bend", "mod", "x", "y", "z", "elapsed",
];

/// Glide time of the continuous controls, in seconds.
pub const GLIDE_TIME_SECONDS: f32 = 0.01;

const GLIDE_ROWS: [usize; 5] = [PITCH_BEND, MOD, X, Y, Z];

/// Voice activity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceState {
    /// Silent and free for allocation.
    #[default]
    Off,
    /// Playing a held note.
    On,
    /// Released while the sustain pedal is down.
    Sustain,
}

/// One-pole smoothing evaluated once per vector.
///
/// Each call moves the value a fixed fraction of the way to the target,
/// `1 - exp(-n / glide_samples)` for an `n`-frame vector, and writes a
/// linear ramp from the old value to the new one across the vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glide {
    value: f32,
    glide_samples: f32,
}

impl Glide {
    /// Create a glide at 0 with the given time constant in samples.
    pub fn new(glide_samples: f32) -> Self {
        Self {
            value: 0.0,
            glide_samples: glide_samples.max(1.0),
        }
    }

    /// Change the time constant.
    pub fn set_glide_samples(&mut self, glide_samples: f32) {
        self.glide_samples = glide_samples.max(1.0);
    }

    /// Current value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Jump to `value` without ramping.
    pub fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    /// Advance one vector toward `target`, writing the ramp into `out`.
    pub fn process(&mut self, target: f32, out: &mut [f32]) {
        if out.is_empty() {
            return;
        }
        let n = out.len() as f32;
        let coeff = 1.0 - libm::expf(-n / self.glide_samples);
        let start = self.value;
        let end = flush_denormal(start + coeff * (target - start));
        let step = (end - start) / n;
        for (i, s) in out.iter_mut().enumerate() {
            *s = flush_denormal(start + step * (i + 1) as f32);
        }
        self.value = end;
    }
}

/// One converter voice.
#[derive(Debug, Clone)]
pub struct Voice {
    index: usize,
    state: VoiceState,
    creator: u32,
    age: u64,
    sample_rate: f32,
    next_frame: usize,
    pitch: f32,
    velocity: f32,
    targets: [f32; 5],
    glides: [Glide; 5],
    outputs: Signal,
}

impl Voice {
    /// Create voice `index` producing `frames`-long vectors.
    pub fn new(index: usize, sample_rate: f32, frames: usize) -> Self {
        let glide = Glide::new(sample_rate * GLIDE_TIME_SECONDS);
        let mut voice = Self {
            index,
            state: VoiceState::Off,
            creator: 0,
            age: 0,
            sample_rate,
            next_frame: 0,
            pitch: 0.0,
            velocity: 0.0,
            targets: [0.0; 5],
            glides: [glide; 5],
            outputs: Signal::new(FIELD_COUNT, frames),
        };
        voice.write_id_row();
        voice
    }

    /// Change the vector length. Output rows are zeroed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Allocation`] if the rows cannot be sized.
    pub fn set_vector_size(&mut self, frames: usize) -> Result<(), GraphError> {
        self.outputs.resize(FIELD_COUNT, frames)?;
        self.write_id_row();
        Ok(())
    }

    /// Change the sample rate; retunes the glides.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for g in &mut self.glides {
            g.set_glide_samples(sample_rate * GLIDE_TIME_SECONDS);
        }
    }

    /// Return to the silent initial state.
    pub fn reset(&mut self) {
        self.state = VoiceState::Off;
        self.creator = 0;
        self.age = 0;
        self.next_frame = 0;
        self.pitch = 0.0;
        self.velocity = 0.0;
        self.targets = [0.0; 5];
        for g in &mut self.glides {
            g.set_value(0.0);
        }
    }

    /// Start a vector: the write cursor goes back to frame 0.
    pub fn begin_vector(&mut self) {
        self.next_frame = 0;
    }

    /// Apply a note event at its frame.
    ///
    /// Handles `NoteOn`, `NoteRetrig`, `NoteSustain` and `NoteOff`; any other
    /// kind turns the voice off without writing frames.
    pub fn write_note_event(&mut self, event: &Event, scale: &dyn Scale) {
        let frames = self.outputs.frames();
        let dest = event.time.min(frames);
        match event.kind {
            EventKind::NoteOn => {
                self.fill_to(dest);
                self.state = VoiceState::On;
                self.creator = event.creator;
                self.age = 0;
                self.pitch = scale.note_to_log_pitch(event.value1);
                self.velocity = event.value2;
            }
            EventKind::NoteRetrig => {
                // one frame of silence must fit before the new note
                let dest = dest.max(1).min(frames);
                if dest > 0 {
                    let gap = dest - 1;
                    self.fill_to(gap);
                    if self.next_frame <= gap {
                        self.write_frame(gap, 0.0);
                        self.next_frame = dest;
                    }
                }
                self.state = VoiceState::On;
                self.creator = event.creator;
                self.age = 0;
                self.pitch = scale.note_to_log_pitch(event.value1);
                self.velocity = event.value2;
            }
            EventKind::NoteSustain => {
                self.state = VoiceState::Sustain;
            }
            EventKind::NoteOff => {
                self.fill_to(dest);
                self.state = VoiceState::Off;
                self.creator = 0;
                self.age = 0;
                self.velocity = 0.0;
            }
            _ => {
                self.state = VoiceState::Off;
                self.age = 0;
            }
        }
    }

    /// Finish a vector: hold pitch and velocity through the last frame and
    /// run the control glides.
    pub fn end_vector(&mut self) {
        let frames = self.outputs.frames();
        self.fill_to(frames);
        for (k, &row) in GLIDE_ROWS.iter().enumerate() {
            let target = self.targets[k];
            self.glides[k].process(target, self.outputs.row_mut(row));
        }
    }

    /// Set the pitch bend target.
    pub fn set_pitch_bend(&mut self, value: f32) {
        self.targets[0] = value;
    }

    /// Set the mod target.
    pub fn set_mod(&mut self, value: f32) {
        self.targets[1] = value;
    }

    /// Set the x target.
    pub fn set_x(&mut self, value: f32) {
        self.targets[2] = value;
    }

    /// Set the y target.
    pub fn set_y(&mut self, value: f32) {
        self.targets[3] = value;
    }

    /// Set the z target.
    pub fn set_z(&mut self, value: f32) {
        self.targets[4] = value;
    }

    /// Voice index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current state.
    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Creator of the note this voice is playing, 0 when off.
    pub fn creator(&self) -> u32 {
        self.creator
    }

    /// Held log pitch.
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Held velocity.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Frames since the last note transition.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Output rows of the last vector.
    pub fn outputs(&self) -> &Signal {
        &self.outputs
    }

    /// One output row of the last vector.
    pub fn row(&self, field: usize) -> &[f32] {
        self.outputs.row(field)
    }

    fn write_id_row(&mut self) {
        let id = self.index as f32;
        self.outputs.row_mut(VOICE_ID).fill(id);
    }

    fn write_frame(&mut self, t: usize, velocity: f32) {
        let elapsed = elapsed_seconds(self.age, self.sample_rate);
        self.age += 1;
        self.outputs.row_mut(VELOCITY)[t] = velocity;
        self.outputs.row_mut(PITCH)[t] = self.pitch;
        self.outputs.row_mut(ELAPSED_TIME)[t] = elapsed;
    }

    /// Hold the current values from the cursor up to `dest`.
    fn fill_to(&mut self, dest: usize) {
        for t in self.next_frame..dest {
            self.write_frame(t, self.velocity);
        }
        self.next_frame = self.next_frame.max(dest);
    }
}

fn elapsed_seconds(age: u64, sample_rate: f32) -> f32 {
    (age as f64 / f64::from(sample_rate)) as f32
}
