//! Discrete events to continuous per-voice signals.
//!
//! [`EventsToSignals`] queues timestamped events between vectors, then on
//! [`process`](EventsToSignals::process) dispatches them in order to a fixed
//! bank of [`MAX_VOICES`] voices. Every voice writes every frame of all its
//! rows each vector, whether it is playing or not.
//!
//! ## Allocation
//!
//! A note-on takes the first free voice of a rotating scan over
//! `[0, polyphony)`; the rotation offset moves by one after each free
//! allocation so consecutive notes spread across voices. When every voice is
//! busy the one holding the pitch nearest the new note is stolen: it is
//! retriggered with a single zero-velocity frame just before the new note so
//! envelopes downstream see a fresh attack.

use cadenza_core::GraphError;

use crate::event::{Event, EventKind};
use crate::queue::{DEFAULT_QUEUE_CAPACITY, EventQueue};
use crate::scale::{EqualTemperament, Scale};
use crate::voice::{Voice, VoiceState};

/// Number of voices always allocated.
pub const MAX_VOICES: usize = 16;

/// Vector length used until [`EventsToSignals::set_vector_size`] is called.
pub const DEFAULT_VECTOR_SIZE: usize = 64;

/// Controller number: mod wheel.
pub const CC_MOD: u32 = 1;
/// Controller number: x axis.
pub const CC_X: u32 = 73;
/// Controller number: y axis.
pub const CC_Y: u32 = 74;
/// Controller number: all sound off.
pub const CC_ALL_SOUND_OFF: u32 = 120;
/// Controller number: all notes off.
pub const CC_ALL_NOTES_OFF: u32 = 123;

/// Polyphonic event-to-signal converter.
///
/// # Example
///
/// ```rust
/// use cadenza_synth::{Event, EventsToSignals, voice};
///
/// let mut conv = EventsToSignals::new(48000.0);
/// conv.set_polyphony(4);
/// conv.add_event(Event::note_on(60, 60.0, 0.9, 10)).unwrap();
/// conv.process();
///
/// let v = conv.voice(0);
/// assert_eq!(v.row(voice::VELOCITY)[9], 0.0);
/// assert_eq!(v.row(voice::VELOCITY)[10], 0.9);
/// ```
pub struct EventsToSignals {
    voices: Vec<Voice>,
    queue: EventQueue,
    scale: Box<dyn Scale>,
    polyphony: usize,
    rotate_offset: usize,
    sustain_held: bool,
    sample_rate: f32,
}

impl EventsToSignals {
    /// Create a converter with all voices off and polyphony [`MAX_VOICES`].
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: (0..MAX_VOICES)
                .map(|i| Voice::new(i, sample_rate, DEFAULT_VECTOR_SIZE))
                .collect(),
            queue: EventQueue::with_capacity(DEFAULT_QUEUE_CAPACITY),
            scale: Box::new(EqualTemperament),
            polyphony: MAX_VOICES,
            rotate_offset: 0,
            sustain_held: false,
            sample_rate,
        }
    }

    /// Set the number of voices notes are allocated to, clamped to
    /// `1..=MAX_VOICES`. Returns the value in effect.
    pub fn set_polyphony(&mut self, n: usize) -> usize {
        self.polyphony = n.clamp(1, MAX_VOICES);
        self.polyphony
    }

    /// Number of voices notes are allocated to.
    pub fn polyphony(&self) -> usize {
        self.polyphony
    }

    /// Change the sample rate used for glides and elapsed time.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for v in &mut self.voices {
            v.set_sample_rate(sample_rate);
        }
    }

    /// Current sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Change the vector length of every voice.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Allocation`] if a voice cannot be sized.
    pub fn set_vector_size(&mut self, frames: usize) -> Result<(), GraphError> {
        for v in &mut self.voices {
            v.set_vector_size(frames)?;
        }
        Ok(())
    }

    /// Frames per vector.
    pub fn vector_size(&self) -> usize {
        self.voices[0].outputs().frames()
    }

    /// Change how many events one vector can queue. Queued events are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Allocation`] if the queue cannot be sized.
    pub fn set_queue_capacity(&mut self, capacity: usize) -> Result<(), GraphError> {
        self.queue.resize(capacity)
    }

    /// The pending event queue.
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Replace the note-to-pitch mapping.
    pub fn set_scale(&mut self, scale: Box<dyn Scale>) {
        self.scale = scale;
    }

    /// Queue an event for the next vector.
    ///
    /// # Errors
    ///
    /// Returns the event back if the queue is full.
    pub fn add_event(&mut self, event: Event) -> Result<(), Event> {
        self.queue.push(event)
    }

    /// Return every voice to silence and forget queued events and the pedal.
    pub fn reset(&mut self) {
        self.queue.clear();
        for v in &mut self.voices {
            v.reset();
        }
        self.rotate_offset = 0;
        self.sustain_held = false;
    }

    /// Produce one vector of signals from the queued events.
    pub fn process(&mut self) {
        for v in &mut self.voices {
            v.begin_vector();
        }
        while let Some(event) = self.queue.pop() {
            self.process_event(event);
        }
        for v in &mut self.voices {
            v.end_vector();
        }
    }

    /// Voice `index`. Panics if `index >= MAX_VOICES`.
    pub fn voice(&self, index: usize) -> &Voice {
        &self.voices[index]
    }

    /// All voices, including those beyond the polyphony.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Current rotation offset of the free-voice scan.
    pub fn rotate_offset(&self) -> usize {
        self.rotate_offset
    }

    /// True while the sustain pedal is held.
    pub fn sustain_held(&self) -> bool {
        self.sustain_held
    }

    /// Number of voices in the polyphony range that are not off.
    pub fn active_voices(&self) -> usize {
        self.voices[..self.polyphony]
            .iter()
            .filter(|v| v.state() != VoiceState::Off)
            .count()
    }

    fn process_event(&mut self, event: Event) {
        match event.kind {
            EventKind::NoteOn => self.note_on(&event),
            EventKind::NoteOff => self.note_off(&event),
            EventKind::Controller => self.controller(&event),
            EventKind::PitchWheel => {
                for v in &mut self.voices[..self.polyphony] {
                    v.set_pitch_bend(event.value1);
                }
            }
            EventKind::NotePressure => {
                for v in &mut self.voices[..self.polyphony] {
                    v.set_z(event.value1);
                }
            }
            EventKind::SustainPedal => self.sustain(&event),
            EventKind::Null | EventKind::NoteRetrig | EventKind::NoteSustain => {}
        }
    }

    fn note_on(&mut self, event: &Event) {
        if let Some(v) = self.find_free_voice() {
            self.rotate_offset += 1;
            self.voices[v].write_note_event(event, self.scale.as_ref());
        } else {
            let pitch = self.scale.note_to_log_pitch(event.value1);
            let v = self.find_nearest_voice(pitch);
            #[cfg(feature = "tracing")]
            tracing::debug!("stealing voice {v} for note {}", event.value1);
            let retrig = event.with_kind(EventKind::NoteRetrig);
            self.voices[v].write_note_event(&retrig, self.scale.as_ref());
        }
    }

    fn note_off(&mut self, event: &Event) {
        let kind = if self.sustain_held {
            EventKind::NoteSustain
        } else {
            EventKind::NoteOff
        };
        let off = event.with_kind(kind);
        for v in &mut self.voices[..self.polyphony] {
            if v.creator() == event.creator && v.state() == VoiceState::On {
                v.write_note_event(&off, self.scale.as_ref());
            }
        }
    }

    fn controller(&mut self, event: &Event) {
        let value = event.value1;
        match event.controller_number() {
            CC_ALL_SOUND_OFF => {
                if value == 0.0 {
                    self.reset();
                }
            }
            CC_ALL_NOTES_OFF => {
                if value == 0.0 {
                    let off = event.with_kind(EventKind::NoteOff);
                    for v in &mut self.voices[..self.polyphony] {
                        if v.state() != VoiceState::Off {
                            v.write_note_event(&off, self.scale.as_ref());
                        }
                    }
                }
            }
            CC_MOD => {
                for v in &mut self.voices[..self.polyphony] {
                    v.set_mod(value);
                }
            }
            CC_X => {
                for v in &mut self.voices[..self.polyphony] {
                    v.set_x(value);
                }
            }
            CC_Y => {
                for v in &mut self.voices[..self.polyphony] {
                    v.set_y(value);
                }
            }
            _ => {}
        }
    }

    fn sustain(&mut self, event: &Event) {
        self.sustain_held = event.value1 > 0.5;
        if !self.sustain_held {
            let off = Event::note_off(0, event.time);
            for v in &mut self.voices[..self.polyphony] {
                if v.state() == VoiceState::Sustain {
                    v.write_note_event(&off, self.scale.as_ref());
                }
            }
        }
    }

    fn find_free_voice(&self) -> Option<usize> {
        let n = self.polyphony;
        (0..n)
            .map(|v| (v + self.rotate_offset) % n)
            .find(|&v| self.voices[v].state() == VoiceState::Off)
    }

    /// Voice whose held pitch is nearest `pitch`; ties go to the lowest index.
    fn find_nearest_voice(&self, pitch: f32) -> usize {
        let mut nearest = 0;
        let mut min_dist = f32::INFINITY;
        for (i, v) in self.voices[..self.polyphony].iter().enumerate() {
            let dist = (v.pitch() - pitch).abs();
            if dist < min_dist {
                min_dist = dist;
                nearest = i;
            }
        }
        nearest
    }
}

impl Default for EventsToSignals {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl core::fmt::Debug for EventsToSignals {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventsToSignals")
            .field("polyphony", &self.polyphony)
            .field("rotate_offset", &self.rotate_offset)
            .field("sustain_held", &self.sustain_held)
            .field("queued", &self.queue.len())
            .field(
                "states",
                &self.voices[..self.polyphony]
                    .iter()
                    .map(|v| (v.creator(), v.state()))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}
