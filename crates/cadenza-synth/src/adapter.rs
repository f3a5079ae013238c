//! Graph proc wrapping the converter.
//!
//! [`InputToSignals`] exposes every voice field as an output port named
//! `<field>_<voice>` with a 1-based voice number, so a copied voice container
//! can connect `pitch_{copy}` to its own oscillator.

use core::any::Any;

use cadenza_core::graph::{BuildContext, ParamSpec, PrepareContext, Proc};
use cadenza_core::{GraphError, Signal};

use crate::converter::{EventsToSignals, MAX_VOICES};
use crate::event::Event;
use crate::queue::DEFAULT_QUEUE_CAPACITY;
use crate::voice::{FIELD_COUNT, FIELD_NAMES};

/// Registry class name of [`InputToSignals`].
pub const CLASS_NAME: &str = "midi_to_signals";

const PARAMS: &[ParamSpec] = &[
    ParamSpec::new("polyphony", MAX_VOICES as f32),
    ParamSpec::new("protocol", 0.0),
    ParamSpec::new("data_rate", 100.0),
];

/// Where control events come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputProtocol {
    /// Plain MIDI; creators are note numbers.
    #[default]
    Midi,
    /// MIDI Polyphonic Expression; creators are channels and every voice is
    /// available.
    MidiMpe,
    /// OSC touch frames. Decoding happens in the transport layer that
    /// feeds events; the converter treats them like MIDI.
    Osc,
}

impl InputProtocol {
    /// Protocol for a numeric parameter value.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(InputProtocol::Midi),
            1 => Some(InputProtocol::MidiMpe),
            2 => Some(InputProtocol::Osc),
            _ => None,
        }
    }

    /// Numeric parameter value of this protocol.
    pub fn index(self) -> usize {
        match self {
            InputProtocol::Midi => 0,
            InputProtocol::MidiMpe => 1,
            InputProtocol::Osc => 2,
        }
    }
}

/// Output port name for `field` of the 1-based voice `voice`.
pub fn voice_port_name(field: usize, voice: usize) -> String {
    format!("{}_{voice}", FIELD_NAMES[field])
}

/// Turns queued control events into per-voice signals inside a graph.
#[derive(Debug)]
pub struct InputToSignals {
    converter: EventsToSignals,
    voices: usize,
    protocol: InputProtocol,
    data_rate: f32,
}

impl InputToSignals {
    /// Create an adapter exposing `ctx.max_voices` voices.
    pub fn new(ctx: &BuildContext) -> Self {
        let voices = ctx.max_voices.clamp(1, MAX_VOICES);
        let mut converter = EventsToSignals::new(ctx.sample_rate);
        converter.set_polyphony(voices);
        Self {
            converter,
            voices,
            protocol: InputProtocol::Midi,
            data_rate: 100.0,
        }
    }

    /// Queue an event for the next vector.
    ///
    /// # Errors
    ///
    /// Returns the event back if the queue is full.
    pub fn push_event(&mut self, event: Event) -> Result<(), Event> {
        self.converter.add_event(event)
    }

    /// Switch input protocol. MPE opens every exposed voice.
    pub fn set_protocol(&mut self, protocol: InputProtocol) {
        self.protocol = protocol;
        if protocol == InputProtocol::MidiMpe {
            self.converter.set_polyphony(self.voices);
        }
    }

    /// Current input protocol.
    pub fn protocol(&self) -> InputProtocol {
        self.protocol
    }

    /// Set the rate in Hz at which the input source delivers frames.
    ///
    /// Stored for the transport layer that feeds events; the converter
    /// itself does not resample by it.
    pub fn set_data_rate(&mut self, rate: f32) {
        self.data_rate = rate.max(0.0);
    }

    /// Rate in Hz at which the input source delivers frames.
    pub fn data_rate(&self) -> f32 {
        self.data_rate
    }

    /// Set polyphony, limited to the exposed voices. Returns the value in effect.
    pub fn set_polyphony(&mut self, n: usize) -> usize {
        self.converter.set_polyphony(n.min(self.voices))
    }

    /// Number of voices with output ports.
    pub fn voice_count(&self) -> usize {
        self.voices
    }

    /// The wrapped converter.
    pub fn converter(&self) -> &EventsToSignals {
        &self.converter
    }

    /// The wrapped converter, mutably.
    pub fn converter_mut(&mut self) -> &mut EventsToSignals {
        &mut self.converter
    }
}

impl Proc for InputToSignals {
    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn inputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<String> {
        (1..=self.voices)
            .flat_map(|v| (0..FIELD_COUNT).map(move |f| voice_port_name(f, v)))
            .collect()
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    fn set_param(&mut self, name: &str, value: f32) -> bool {
        match name {
            "polyphony" => {
                self.set_polyphony(value.max(0.0) as usize);
                true
            }
            "protocol" => match InputProtocol::from_index(value.max(0.0) as usize) {
                Some(p) => {
                    self.set_protocol(p);
                    true
                }
                None => false,
            },
            "data_rate" => {
                self.set_data_rate(value);
                true
            }
            _ => false,
        }
    }

    fn param(&self, name: &str) -> Option<f32> {
        match name {
            "polyphony" => Some(self.converter.polyphony() as f32),
            "protocol" => Some(self.protocol.index() as f32),
            "data_rate" => Some(self.data_rate),
            _ => None,
        }
    }

    fn prepare(&mut self, ctx: &PrepareContext) -> Result<(), GraphError> {
        self.converter.set_sample_rate(ctx.sample_rate);
        self.converter.set_vector_size(ctx.vector_size)?;
        self.converter
            .set_queue_capacity(ctx.host_block_size.max(DEFAULT_QUEUE_CAPACITY))?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "{CLASS_NAME}: {} voices, vector {}, queue {}",
            self.voices,
            ctx.vector_size,
            self.converter.queue().capacity()
        );
        Ok(())
    }

    fn process(&mut self, _inputs: &Signal, outputs: &mut Signal) {
        self.converter.process();
        for (v, voice) in self.converter.voices()[..self.voices].iter().enumerate() {
            for field in 0..FIELD_COUNT {
                let out = outputs.row_mut(v * FIELD_COUNT + field);
                for (o, &s) in out.iter_mut().zip(voice.row(field)) {
                    *o = s;
                }
            }
        }
    }

    fn reset(&mut self) {
        self.converter.reset();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::{PITCH, VELOCITY, VOICE_ID};

    fn adapter(voices: usize) -> InputToSignals {
        InputToSignals::new(&BuildContext {
            sample_rate: 48000.0,
            max_voices: voices,
        })
    }

    #[test]
    fn ports_are_one_based_per_voice() {
        let a = adapter(2);
        let outs = a.outputs();
        assert_eq!(outs.len(), 2 * FIELD_COUNT);
        assert_eq!(outs[0], "voice_1");
        assert_eq!(outs[FIELD_COUNT + PITCH], "pitch_2");
        assert_eq!(outs[2 * FIELD_COUNT - 1], "elapsed_2");
    }

    #[test]
    fn process_copies_voice_rows() {
        let mut a = adapter(2);
        a.prepare(&PrepareContext {
            sample_rate: 48000.0,
            vector_size: 8,
            host_block_size: 64,
        })
        .unwrap();
        a.push_event(Event::note_on(69, 69.0, 0.5, 2)).unwrap();
        let mut out = Signal::new(2 * FIELD_COUNT, 8);
        a.process(&Signal::default(), &mut out);
        assert_eq!(out.row(VELOCITY)[1], 0.0);
        assert_eq!(out.row(VELOCITY)[2], 0.5);
        assert_eq!(out.row(PITCH)[7], 0.0);
        assert_eq!(out.row(FIELD_COUNT + VOICE_ID)[0], 1.0);
    }

    #[test]
    fn mpe_opens_all_voices() {
        let mut a = adapter(8);
        a.set_polyphony(2);
        assert!(a.set_param("protocol", 1.0));
        assert_eq!(a.param("polyphony"), Some(8.0));
        assert!(!a.set_param("protocol", 7.0));
        assert!(!a.set_param("voices", 1.0));
    }

    #[test]
    fn prepare_sizes_queue_to_host_block() {
        let mut a = adapter(1);
        a.prepare(&PrepareContext {
            sample_rate: 44100.0,
            vector_size: 16,
            host_block_size: 1024,
        })
        .unwrap();
        assert_eq!(a.converter().queue().capacity(), 1024);
        assert_eq!(a.converter().vector_size(), 16);
    }
}
