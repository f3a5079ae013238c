//! One-pole lowpass proc.

use core::any::Any;

use crate::graph::{ParamSpec, PrepareContext, Proc, port_names};
use crate::{GraphError, OnePole, Signal};

const PARAMS: &[ParamSpec] = &[ParamSpec::new("frequency", 1000.0)];

/// 6 dB/oct lowpass around [`OnePole`].
#[derive(Debug, Clone)]
pub struct Lowpass {
    filter: OnePole,
}

impl Default for Lowpass {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Lowpass {
    /// Create a lowpass at 1 kHz.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            filter: OnePole::new(sample_rate, 1000.0),
        }
    }
}

impl Proc for Lowpass {
    fn class_name(&self) -> &'static str {
        "lowpass"
    }

    fn inputs(&self) -> Vec<String> {
        port_names(&["in"])
    }

    fn outputs(&self) -> Vec<String> {
        port_names(&["out"])
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        PARAMS
    }

    fn set_param(&mut self, name: &str, value: f32) -> bool {
        if name == "frequency" {
            self.filter.set_frequency(value.max(0.0));
            true
        } else {
            false
        }
    }

    fn param(&self, name: &str) -> Option<f32> {
        (name == "frequency").then(|| self.filter.frequency())
    }

    fn prepare(&mut self, ctx: &PrepareContext) -> Result<(), GraphError> {
        self.filter.set_sample_rate(ctx.sample_rate);
        Ok(())
    }

    fn process(&mut self, inputs: &Signal, outputs: &mut Signal) {
        for (o, &i) in outputs.row_mut(0).iter_mut().zip(inputs.row(0)) {
            *o = self.filter.process(i);
        }
    }

    fn reset(&mut self) {
        self.filter.reset();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
