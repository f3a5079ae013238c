//! Sine oscillator with a log-pitch input.

use core::any::Any;
use core::f32::consts::TAU;

use libm::sinf;

use crate::graph::{ParamSpec, PrepareContext, Proc, port_names};
use crate::{GraphError, Signal, log_pitch_to_hz};

const PARAMS: &[ParamSpec] = &[ParamSpec::new("frequency", 440.0), ParamSpec::new("gain", 1.0)];

/// Sine oscillator.
///
/// The `pitch` input is in octaves relative to the `frequency` parameter:
/// 0 plays `frequency`, 1 plays an octave above.
#[derive(Debug, Clone)]
pub struct SineOsc {
    frequency: f32,
    gain: f32,
    phase: f32,
    sample_rate: f32,
}

impl Default for SineOsc {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl SineOsc {
    /// Create an oscillator at 440 Hz, unity gain.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            frequency: 440.0,
            gain: 1.0,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Current phase in cycles, [0, 1).
    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl Proc for SineOsc {
    fn class_name(&self) -> &'static str {
        "sine_osc"
    }

    fn inputs(&self) -> Vec<String> {
        port_names(&["pitch"])
    }

    fn outputs(&self) -> Vec<String> {
        port_names(&["out"])
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    fn set_param(&mut self, name: &str, value: f32) -> bool {
        match name {
            "frequency" => self.frequency = value.max(0.0),
            "gain" => self.gain = value,
            _ => return false,
        }
        true
    }

    fn param(&self, name: &str) -> Option<f32> {
        match name {
            "frequency" => Some(self.frequency),
            "gain" => Some(self.gain),
            _ => None,
        }
    }

    fn prepare(&mut self, ctx: &PrepareContext) -> Result<(), GraphError> {
        self.sample_rate = ctx.sample_rate;
        Ok(())
    }

    fn process(&mut self, inputs: &Signal, outputs: &mut Signal) {
        let inv_sr = if self.sample_rate > 0.0 {
            1.0 / self.sample_rate
        } else {
            0.0
        };
        let pitch = inputs.row(0);
        for (out, &p) in outputs.row_mut(0).iter_mut().zip(pitch) {
            *out = self.gain * sinf(TAU * self.phase);
            self.phase += log_pitch_to_hz(p, self.frequency) * inv_sr;
            self.phase -= libm::floorf(self.phase);
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
