//! Stateless arithmetic procs.

use core::any::Any;

use crate::Signal;
use crate::graph::{ParamSpec, Proc, port_names};

const GAIN_PARAMS: &[ParamSpec] = &[ParamSpec::new("gain", 1.0)];

/// Scales its input by the `gain` parameter.
#[derive(Debug, Clone)]
pub struct Gain {
    gain: f32,
}

impl Default for Gain {
    fn default() -> Self {
        Self { gain: 1.0 }
    }
}

impl Proc for Gain {
    fn class_name(&self) -> &'static str {
        "gain"
    }

    fn inputs(&self) -> Vec<String> {
        port_names(&["in"])
    }

    fn outputs(&self) -> Vec<String> {
        port_names(&["out"])
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        GAIN_PARAMS
    }

    fn set_param(&mut self, name: &str, value: f32) -> bool {
        if name == "gain" {
            self.gain = value;
            true
        } else {
            false
        }
    }

    fn param(&self, name: &str) -> Option<f32> {
        (name == "gain").then_some(self.gain)
    }

    fn process(&mut self, inputs: &Signal, outputs: &mut Signal) {
        for (o, &i) in outputs.row_mut(0).iter_mut().zip(inputs.row(0)) {
            *o = i * self.gain;
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Sums inputs `a` and `b`.
#[derive(Debug, Clone, Default)]
pub struct Add;

impl Proc for Add {
    fn class_name(&self) -> &'static str {
        "add"
    }

    fn inputs(&self) -> Vec<String> {
        port_names(&["a", "b"])
    }

    fn outputs(&self) -> Vec<String> {
        port_names(&["out"])
    }

    fn process(&mut self, inputs: &Signal, outputs: &mut Signal) {
        let (a, b) = (inputs.row(0), inputs.row(1));
        for ((o, &x), &y) in outputs.row_mut(0).iter_mut().zip(a).zip(b) {
            *o = x + y;
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Multiplies inputs `a` and `b` (ring modulation, VCA).
#[derive(Debug, Clone, Default)]
pub struct Multiply;

impl Proc for Multiply {
    fn class_name(&self) -> &'static str {
        "multiply"
    }

    fn inputs(&self) -> Vec<String> {
        port_names(&["a", "b"])
    }

    fn outputs(&self) -> Vec<String> {
        port_names(&["out"])
    }

    fn process(&mut self, inputs: &Signal, outputs: &mut Signal) {
        let (a, b) = (inputs.row(0), inputs.row(1));
        for ((o, &x), &y) in outputs.row_mut(0).iter_mut().zip(a).zip(b) {
            *o = x * y;
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rows(a: &[f32], b: &[f32]) -> Signal {
        let mut s = Signal::new(2, a.len());
        s.row_mut(0).copy_from_slice(a);
        s.row_mut(1).copy_from_slice(b);
        s
    }

    #[test]
    fn add_and_multiply() {
        let inputs = two_rows(&[1.0, 2.0, -1.0], &[0.5, 0.5, 4.0]);
        let mut out = Signal::new(1, 3);
        Add.process(&inputs, &mut out);
        assert_eq!(out.row(0), &[1.5, 2.5, 3.0]);
        Multiply.process(&inputs, &mut out);
        assert_eq!(out.row(0), &[0.5, 1.0, -4.0]);
    }

    #[test]
    fn gain_scales() {
        let mut g = Gain::default();
        assert!(g.set_param("gain", -2.0));
        let mut inputs = Signal::new(1, 2);
        inputs.row_mut(0).copy_from_slice(&[0.25, 1.0]);
        let mut out = Signal::new(1, 2);
        g.process(&inputs, &mut out);
        assert_eq!(out.row(0), &[-0.5, -2.0]);
    }
}
