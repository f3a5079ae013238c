//! Timed event lists.
//!
//! A score is a list of control events stamped in seconds, used to drive
//! offline renders.
//!
//! # TOML Format
//!
//! ```toml
//! [[event]]
//! at = 0.0
//! kind = "note_on"
//! note = 60
//! velocity = 0.8
//!
//! [[event]]
//! at = 0.5
//! kind = "controller"
//! number = 74
//! value = 0.3
//!
//! [[event]]
//! at = 1.0
//! kind = "note_off"
//! note = 60
//! ```
//!
//! `kind` is one of `note_on`, `note_off`, `controller`, `pitch_wheel`,
//! `pressure` and `sustain`. Notes are matched by `creator`, which defaults
//! to the note number.

use serde::{Deserialize, Serialize};
use std::path::Path;

use cadenza_synth::Event;

use crate::error::ConfigError;

/// One score line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Time in seconds from the start of the render.
    pub at: f64,
    /// Event kind name.
    pub kind: String,
    /// Note number for note events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<f32>,
    /// Velocity for `note_on`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f32>,
    /// Note identity; defaults to the note number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<u32>,
    /// Controller number for `controller`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u8>,
    /// Value for controllers, wheel, pressure and pedal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
}

/// An event placed at an absolute frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    /// Frame from the start of the render.
    pub frame: u64,
    /// The event; its `time` is filled in per block by the caller.
    pub event: Event,
}

/// A list of timed events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Entries in file order.
    #[serde(default, rename = "event")]
    pub events: Vec<ScoreEntry>,
}

impl ScoreEntry {
    fn require(&self, value: Option<f32>, field: &str) -> Result<f32, ConfigError> {
        value.ok_or_else(|| {
            ConfigError::invalid_value(
                field,
                format!("required by '{}' at {}s", self.kind, self.at),
            )
        })
    }

    fn creator(&self, note: f32) -> u32 {
        self.creator.unwrap_or(note.max(0.0) as u32)
    }

    /// The event this entry describes, at frame offset 0.
    pub fn to_event(&self) -> Result<Event, ConfigError> {
        let event = match self.kind.as_str() {
            "note_on" => {
                let note = self.require(self.note, "note")?;
                let velocity = self.velocity.unwrap_or(1.0);
                Event::note_on(self.creator(note), note, velocity, 0)
            }
            "note_off" => {
                let creator = match self.creator {
                    Some(c) => c,
                    None => self.creator(self.require(self.note, "note")?),
                };
                Event::note_off(creator, 0)
            }
            "controller" => {
                let number = self.number.ok_or_else(|| {
                    ConfigError::invalid_value(
                        "number",
                        format!("required by 'controller' at {}s", self.at),
                    )
                })?;
                Event::controller(number, self.require(self.value, "value")?, 0)
            }
            "pitch_wheel" => Event::pitch_wheel(self.require(self.value, "value")?, 0),
            "pressure" => Event::note_pressure(self.require(self.value, "value")?, 0),
            "sustain" => Event::sustain_pedal(self.require(self.value, "value")?, 0),
            other => {
                return Err(ConfigError::invalid_value(
                    "kind",
                    format!("unknown event kind '{other}'"),
                ));
            }
        };
        Ok(event)
    }
}

impl Score {
    /// Load a score from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a score from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Convert the score to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the score has no entries.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time of the last entry, in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.events.iter().map(|e| e.at).fold(0.0, f64::max)
    }

    /// Every entry as an event at its frame, sorted by frame. Entries at
    /// the same frame keep file order.
    pub fn schedule(&self, sample_rate: f32) -> Result<Vec<ScheduledEvent>, ConfigError> {
        let mut out = Vec::with_capacity(self.events.len());
        for entry in &self.events {
            if !entry.at.is_finite() || entry.at < 0.0 {
                return Err(ConfigError::invalid_value(
                    "at",
                    format!("expected a non-negative time, got {}", entry.at),
                ));
            }
            let frame = (entry.at * f64::from(sample_rate)).round() as u64;
            out.push(ScheduledEvent {
                frame,
                event: entry.to_event()?,
            });
        }
        out.sort_by_key(|s| s.frame);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_synth::EventKind;

    const SCORE: &str = r#"
        [[event]]
        at = 0.5
        kind = "note_off"
        note = 60

        [[event]]
        at = 0.0
        kind = "note_on"
        note = 60
        velocity = 0.8

        [[event]]
        at = 0.25
        kind = "controller"
        number = 74
        value = 0.3
    "#;

    #[test]
    fn schedule_sorts_by_frame() {
        let score = Score::from_toml(SCORE).unwrap();
        assert_eq!(score.len(), 3);
        assert_eq!(score.duration_seconds(), 0.5);

        let events = score.schedule(1000.0).unwrap();
        let frames: Vec<_> = events.iter().map(|e| e.frame).collect();
        assert_eq!(frames, [0, 250, 500]);
        assert_eq!(events[0].event.kind, EventKind::NoteOn);
        assert_eq!(events[0].event.creator, 60);
        assert_eq!(events[0].event.value2, 0.8);
        assert_eq!(events[1].event.controller_number(), 74);
        assert_eq!(events[2].event.creator, 60);
    }

    #[test]
    fn missing_fields_are_reported() {
        let score = Score::from_toml("[[event]]\nat = 0.0\nkind = \"pitch_wheel\"\n").unwrap();
        let err = score.schedule(48000.0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "value"));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let entry = ScoreEntry {
            kind: "aftertouch".into(),
            ..ScoreEntry::default()
        };
        assert!(entry.to_event().is_err());
    }

    #[test]
    fn negative_time_is_rejected() {
        let score = Score {
            events: vec![ScoreEntry {
                at: -1.0,
                kind: "sustain".into(),
                value: Some(1.0),
                ..ScoreEntry::default()
            }],
        };
        assert!(score.schedule(48000.0).is_err());
    }

    #[test]
    fn explicit_creator_overrides_note() {
        let entry = ScoreEntry {
            kind: "note_on".into(),
            note: Some(64.0),
            creator: Some(2),
            ..ScoreEntry::default()
        };
        let e = entry.to_event().unwrap();
        assert_eq!(e.creator, 2);
        assert_eq!(e.value1, 64.0);
        assert_eq!(e.value2, 1.0);
    }
}
