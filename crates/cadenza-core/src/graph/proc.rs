//! The [`Proc`] trait: one unit of DSP work in the graph.
//!
//! A proc consumes one row per input port and fills one row per output port,
//! one vector at a time. Ports are addressed by name when a graph is built and
//! by index when it runs. Parameters are named `f32` values.
//!
//! Procs are created by name through a [`ProcFactory`], which receives an
//! explicit [`BuildContext`] rather than reading any shared state.

use core::any::Any;

use crate::{GraphError, Signal};

/// Values every proc may need at construction time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildContext {
    /// Sample rate in Hz the graph will most likely run at.
    pub sample_rate: f32,
    /// Upper bound on voices for polyphonic procs.
    pub max_voices: usize,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            max_voices: 16,
        }
    }
}

/// Processing dimensions handed to [`Proc::prepare`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrepareContext {
    /// Sample rate in Hz.
    pub sample_rate: f32,
    /// Frames per processing vector.
    pub vector_size: usize,
    /// Largest block the host will deliver in one call.
    pub host_block_size: usize,
}

/// Static description of one parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    /// Parameter name as used in descriptions and `set_param`.
    pub name: &'static str,
    /// Value after construction.
    pub default: f32,
}

impl ParamSpec {
    /// Create a parameter spec.
    pub const fn new(name: &'static str, default: f32) -> Self {
        Self { name, default }
    }
}

/// Builds an owned port name list.
pub fn port_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|&n| n.to_owned()).collect()
}

/// A processing node.
///
/// `process` runs on the audio thread and must not allocate, block, or fail.
/// Everything that can fail belongs in [`prepare`](Proc::prepare).
///
/// # Example
///
/// ```rust
/// use cadenza_core::graph::{Proc, port_names};
/// use cadenza_core::Signal;
/// use std::any::Any;
///
/// struct Invert;
///
/// impl Proc for Invert {
///     fn class_name(&self) -> &'static str { "invert" }
///     fn inputs(&self) -> Vec<String> { port_names(&["in"]) }
///     fn outputs(&self) -> Vec<String> { port_names(&["out"]) }
///     fn process(&mut self, inputs: &Signal, outputs: &mut Signal) {
///         for (o, i) in outputs.row_mut(0).iter_mut().zip(inputs.row(0)) {
///             *o = -*i;
///         }
///     }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
/// ```
pub trait Proc: Send {
    /// Registry class name this proc was created from.
    fn class_name(&self) -> &'static str;

    /// Input port names, in port order.
    fn inputs(&self) -> Vec<String>;

    /// Output port names, in port order.
    fn outputs(&self) -> Vec<String>;

    /// Parameters this proc accepts.
    fn param_specs(&self) -> &'static [ParamSpec] {
        &[]
    }

    /// Set a named parameter. Returns false if the name is unknown.
    fn set_param(&mut self, _name: &str, _value: f32) -> bool {
        false
    }

    /// Current value of a named parameter.
    fn param(&self, _name: &str) -> Option<f32> {
        None
    }

    /// Size internal state for the given dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Allocation`] if a buffer cannot be sized.
    fn prepare(&mut self, _ctx: &PrepareContext) -> Result<(), GraphError> {
        Ok(())
    }

    /// Compute one vector.
    ///
    /// `inputs` has one row per input port holding the summed connections
    /// (silence for unconnected ports); `outputs` has one row per output port.
    fn process(&mut self, inputs: &Signal, outputs: &mut Signal);

    /// Clear running state without touching parameters.
    fn reset(&mut self) {}

    /// Downcast hook for callers that drive a specific proc type directly.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Creates procs by class name.
pub trait ProcFactory {
    /// Instantiate `class`, or `None` if the class is unknown.
    fn create(&self, class: &str, ctx: &BuildContext) -> Option<Box<dyn Proc>>;
}
