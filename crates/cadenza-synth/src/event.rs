//! Timestamped control events.
//!
//! An [`Event`] is a tagged variant with a creator identity, two values, and a
//! frame offset inside the vector it belongs to. Value meanings by kind:
//!
//! | kind           | `value1`          | `value2`           |
//! |----------------|-------------------|--------------------|
//! | `NoteOn`       | note number       | velocity (0 to 1)  |
//! | `NoteOff`      |                   |                    |
//! | `Controller`   | controller value  | controller number  |
//! | `PitchWheel`   | bend amount       |                    |
//! | `NotePressure` | pressure (0 to 1) |                    |
//! | `SustainPedal` | pedal (0 to 1)    |                    |
//!
//! `NoteRetrig` and `NoteSustain` are produced internally by the converter.

/// What an event does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Placeholder; ignored.
    #[default]
    Null,
    /// Start a note.
    NoteOn,
    /// Release a note.
    NoteOff,
    /// Restart a stolen voice with a new note.
    NoteRetrig,
    /// Hold a released note while the sustain pedal is down.
    NoteSustain,
    /// Continuous controller change.
    Controller,
    /// Pitch bend.
    PitchWheel,
    /// Channel or polyphonic pressure.
    NotePressure,
    /// Sustain pedal.
    SustainPedal,
}

/// A control event.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Event {
    /// What the event does.
    pub kind: EventKind,
    /// Identity of the note source, matched by later note-offs.
    pub creator: u32,
    /// First value; see the module table.
    pub value1: f32,
    /// Second value; see the module table.
    pub value2: f32,
    /// Frame offset within the current vector.
    pub time: usize,
}

impl Event {
    /// A note-on. The creator is usually the note number itself, or the
    /// channel under MPE.
    pub fn note_on(creator: u32, note: f32, velocity: f32, time: usize) -> Self {
        Self {
            kind: EventKind::NoteOn,
            creator,
            value1: note,
            value2: velocity,
            time,
        }
    }

    /// A note-off for the note started by `creator`.
    pub fn note_off(creator: u32, time: usize) -> Self {
        Self {
            kind: EventKind::NoteOff,
            creator,
            time,
            ..Self::default()
        }
    }

    /// A controller change.
    pub fn controller(number: u8, value: f32, time: usize) -> Self {
        Self {
            kind: EventKind::Controller,
            value1: value,
            value2: f32::from(number),
            time,
            ..Self::default()
        }
    }

    /// A pitch bend.
    pub fn pitch_wheel(value: f32, time: usize) -> Self {
        Self {
            kind: EventKind::PitchWheel,
            value1: value,
            time,
            ..Self::default()
        }
    }

    /// A pressure change.
    pub fn note_pressure(value: f32, time: usize) -> Self {
        Self {
            kind: EventKind::NotePressure,
            value1: value,
            time,
            ..Self::default()
        }
    }

    /// A sustain pedal change.
    pub fn sustain_pedal(value: f32, time: usize) -> Self {
        Self {
            kind: EventKind::SustainPedal,
            value1: value,
            time,
            ..Self::default()
        }
    }

    /// The same event at another frame.
    #[must_use]
    pub fn at(self, time: usize) -> Self {
        Self { time, ..self }
    }

    /// The same event as another kind.
    #[must_use]
    pub fn with_kind(self, kind: EventKind) -> Self {
        Self { kind, ..self }
    }

    /// Controller number of a `Controller` event.
    pub fn controller_number(&self) -> u32 {
        self.value2 as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_layout() {
        let e = Event::controller(74, 0.25, 9);
        assert_eq!(e.kind, EventKind::Controller);
        assert_eq!(e.value1, 0.25);
        assert_eq!(e.controller_number(), 74);
        assert_eq!(e.time, 9);
    }

    #[test]
    fn retime_keeps_payload() {
        let e = Event::note_on(60, 60.0, 0.8, 100).at(4);
        assert_eq!(e.time, 4);
        assert_eq!(e.creator, 60);
        assert_eq!(e.value2, 0.8);
    }
}
