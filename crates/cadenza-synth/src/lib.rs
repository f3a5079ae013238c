//! Cadenza Synth - polyphonic event-to-signal conversion
//!
//! This crate turns discrete, timestamped control events into continuous
//! per-voice control signals, one processing vector at a time.
//!
//! # Core Components
//!
//! ## Events
//!
//! - [`Event`] / [`EventKind`] - Note, controller, pitch wheel, pressure and
//!   pedal events with a creator identity and a frame offset
//! - [`EventQueue`] - Bounded FIFO drained once per vector
//!
//! ## Voices
//!
//! - [`Voice`] - One voice: state machine, held note, control glides and nine
//!   output rows (see [`voice::FIELD_NAMES`])
//! - [`EventsToSignals`] - Voice allocation, stealing and event dispatch
//! - [`Scale`] / [`EqualTemperament`] - Note number to log pitch
//!
//! ## Graph Integration
//!
//! - [`InputToSignals`] - The converter as a graph proc (`midi_to_signals`)
//!
//! # Example
//!
//! ```rust
//! use cadenza_synth::{Event, EventsToSignals, VoiceState, voice};
//!
//! let mut conv = EventsToSignals::new(48000.0);
//! conv.set_polyphony(2);
//!
//! conv.add_event(Event::note_on(60, 60.0, 1.0, 0)).unwrap();
//! conv.add_event(Event::note_on(64, 64.0, 1.0, 0)).unwrap();
//! conv.process();
//! assert_eq!(conv.active_voices(), 2);
//!
//! // a third note steals the nearest voice
//! conv.add_event(Event::note_on(65, 65.0, 1.0, 20)).unwrap();
//! conv.process();
//! assert_eq!(conv.voice(1).creator(), 65);
//! assert_eq!(conv.voice(1).row(voice::VELOCITY)[19], 0.0);
//! assert_eq!(conv.voice(1).state(), VoiceState::On);
//! ```
//!
//! # Feature Flags
//!
//! - `tracing` - log voice stealing and queue overflow through `tracing`

pub mod adapter;
pub mod converter;
pub mod event;
pub mod queue;
pub mod scale;
pub mod voice;

pub use adapter::{InputProtocol, InputToSignals, voice_port_name};
pub use converter::{EventsToSignals, MAX_VOICES};
pub use event::{Event, EventKind};
pub use queue::{DEFAULT_QUEUE_CAPACITY, EventQueue};
pub use scale::{CentsScale, EqualTemperament, Scale};
pub use voice::{Glide, Voice, VoiceState};
