//! Proc class registry and factory for cadenza signal graphs.
//!
//! This crate provides a centralized registry for discovering and
//! instantiating procs by class name. It implements the graph builder's
//! [`ProcFactory`] seam and provides metadata for listing and inspecting the
//! available classes.
//!
//! # Features
//!
//! - **Class Discovery**: List all available proc classes with metadata
//! - **Factory Pattern**: Create procs by class name at runtime
//! - **Category System**: Classes organized by role (source, control, etc.)
//! - **Port and Parameter Info**: Port names and parameter defaults per class
//!
//! # Example
//!
//! ```rust
//! use cadenza_core::graph::{BuildContext, ProcFactory};
//! use cadenza_registry::{ProcCategory, ProcRegistry};
//!
//! let registry = ProcRegistry::new();
//!
//! // List all classes
//! for class in registry.all_procs() {
//!     println!("{}: {}", class.id, class.description);
//! }
//!
//! // Create a proc by class name
//! let osc = registry.create("sine_osc", &BuildContext::default());
//! assert!(osc.is_some());
//!
//! // Filter by category
//! assert_eq!(registry.procs_in_category(ProcCategory::Control).len(), 2);
//! ```

use cadenza_core::graph::{BuildContext, ParamSpec, Proc, ProcFactory};
use cadenza_core::procs::{Add, Gain, HostPhasor, Lowpass, Multiply, SineOsc};
use cadenza_synth::InputToSignals;

/// Category of proc class for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcCategory {
    /// Signal generators (oscillators)
    Source,
    /// Host and event driven control signals
    Control,
    /// Sample-wise arithmetic and gain
    Arithmetic,
    /// Filters
    Filter,
}

impl ProcCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            ProcCategory::Source => "Source",
            ProcCategory::Control => "Control",
            ProcCategory::Arithmetic => "Arithmetic",
            ProcCategory::Filter => "Filter",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            ProcCategory::Source => "Oscillators and other signal generators",
            ProcCategory::Control => "Transport and event-to-signal converters",
            ProcCategory::Arithmetic => "Gain, sums and products of signals",
            ProcCategory::Filter => "Lowpass and other filters",
        }
    }
}

/// Describes a proc class in the registry.
#[derive(Debug, Clone)]
pub struct ProcDescriptor {
    /// Class name used in graph descriptions.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the class.
    pub description: &'static str,
    /// Category for organization.
    pub category: ProcCategory,
}

/// Factory function type for creating procs.
type Constructor = fn(&BuildContext) -> Box<dyn Proc>;

/// Internal entry in the registry.
struct RegistryEntry {
    descriptor: ProcDescriptor,
    constructor: Constructor,
}

/// Ports and parameters of one class, as built for a given context.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcInterface {
    /// Input port names.
    pub inputs: Vec<String>,
    /// Output port names.
    pub outputs: Vec<String>,
    /// Parameters with their defaults.
    pub params: &'static [ParamSpec],
}

/// Registry of all available proc classes.
///
/// All built-in classes are registered on construction; further classes can
/// be added with [`register`](Self::register).
pub struct ProcRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for ProcRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcRegistry {
    /// Create a new registry with all built-in classes registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(7),
        };
        registry.register_builtin_procs();
        registry
    }

    /// Register all built-in classes.
    fn register_builtin_procs(&mut self) {
        // Sources
        self.register(
            ProcDescriptor {
                id: "sine_osc",
                name: "Sine Oscillator",
                description: "Sine oscillator with a log-pitch input in octaves",
                category: ProcCategory::Source,
            },
            |ctx| Box::new(SineOsc::new(ctx.sample_rate)),
        );

        // Control
        self.register(
            ProcDescriptor {
                id: "host_phasor",
                name: "Host Phasor",
                description: "Per-beat 0 to 1 ramp following the host transport",
                category: ProcCategory::Control,
            },
            |ctx| Box::new(HostPhasor::new(ctx.sample_rate)),
        );

        self.register(
            ProcDescriptor {
                id: cadenza_synth::adapter::CLASS_NAME,
                name: "Events To Signals",
                description: "Polyphonic note and controller events as per-voice signals",
                category: ProcCategory::Control,
            },
            |ctx| Box::new(InputToSignals::new(ctx)),
        );

        // Arithmetic
        self.register(
            ProcDescriptor {
                id: "gain",
                name: "Gain",
                description: "Scale a signal by a linear gain",
                category: ProcCategory::Arithmetic,
            },
            |_| Box::new(Gain::default()),
        );

        self.register(
            ProcDescriptor {
                id: "add",
                name: "Add",
                description: "Sum of two signals",
                category: ProcCategory::Arithmetic,
            },
            |_| Box::new(Add),
        );

        self.register(
            ProcDescriptor {
                id: "multiply",
                name: "Multiply",
                description: "Product of two signals (ring modulation, VCA)",
                category: ProcCategory::Arithmetic,
            },
            |_| Box::new(Multiply),
        );

        // Filters
        self.register(
            ProcDescriptor {
                id: "lowpass",
                name: "Lowpass",
                description: "One-pole lowpass with cutoff in Hz",
                category: ProcCategory::Filter,
            },
            |ctx| Box::new(Lowpass::new(ctx.sample_rate)),
        );
    }

    /// Register a class. A later registration with the same id shadows the
    /// earlier one.
    pub fn register(&mut self, descriptor: ProcDescriptor, constructor: Constructor) {
        self.entries.retain(|e| e.descriptor.id != descriptor.id);
        self.entries.push(RegistryEntry {
            descriptor,
            constructor,
        });
    }

    /// Returns descriptors for all registered classes.
    pub fn all_procs(&self) -> Vec<&ProcDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for classes in a specific category.
    pub fn procs_in_category(&self, category: ProcCategory) -> Vec<&ProcDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by class name.
    pub fn get(&self, id: &str) -> Option<&ProcDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.descriptor)
    }

    /// Ports and parameters of `id` when built with `ctx`.
    ///
    /// Creates a temporary instance; port lists can depend on the context
    /// (the event converter exposes one set of ports per voice).
    pub fn interface(&self, id: &str, ctx: &BuildContext) -> Option<ProcInterface> {
        let proc = self.create(id, ctx)?;
        Some(ProcInterface {
            inputs: proc.inputs(),
            outputs: proc.outputs(),
            params: proc.param_specs(),
        })
    }

    /// Find a parameter spec by name for a given class.
    pub fn param_spec(&self, id: &str, param_name: &str) -> Option<ParamSpec> {
        let proc = self.create(id, &BuildContext::default())?;
        proc.param_specs()
            .iter()
            .find(|p| p.name == param_name)
            .copied()
    }

    /// Returns the number of registered classes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no classes are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ProcFactory for ProcRegistry {
    fn create(&self, class: &str, ctx: &BuildContext) -> Option<Box<dyn Proc>> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == class)
            .map(|e| (e.constructor)(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::Signal;
    use cadenza_core::graph::PrepareContext;

    #[test]
    fn test_registry_creation() {
        let registry = ProcRegistry::new();
        assert_eq!(registry.len(), 7);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_get_proc() {
        let registry = ProcRegistry::new();

        let gain = registry.get("gain");
        assert!(gain.is_some());
        assert_eq!(gain.unwrap().name, "Gain");

        assert!(registry.get("nonexistent").is_none());
        assert!(
            registry
                .create("nonexistent", &BuildContext::default())
                .is_none()
        );
    }

    #[test]
    fn test_procs_by_category() {
        let registry = ProcRegistry::new();
        assert_eq!(registry.procs_in_category(ProcCategory::Source).len(), 1);
        assert_eq!(registry.procs_in_category(ProcCategory::Control).len(), 2);
        assert_eq!(registry.procs_in_category(ProcCategory::Arithmetic).len(), 3);
        assert_eq!(registry.procs_in_category(ProcCategory::Filter).len(), 1);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ProcCategory::Control.name(), "Control");
        assert!(!ProcCategory::Filter.description().is_empty());
    }

    #[test]
    fn test_class_names_match_ids() {
        let registry = ProcRegistry::new();
        let ctx = BuildContext::default();
        for descriptor in registry.all_procs() {
            let proc = registry.create(descriptor.id, &ctx).unwrap();
            assert_eq!(proc.class_name(), descriptor.id);
        }
    }

    #[test]
    fn test_converter_ports_follow_max_voices() {
        let registry = ProcRegistry::new();
        let ctx = BuildContext {
            sample_rate: 48000.0,
            max_voices: 4,
        };
        let iface = registry.interface("midi_to_signals", &ctx).unwrap();
        assert!(iface.inputs.is_empty());
        assert_eq!(iface.outputs.len(), 4 * 9);
        assert!(iface.outputs.contains(&"pitch_4".to_owned()));
        assert!(iface.params.iter().any(|p| p.name == "polyphony"));
    }

    #[test]
    fn test_param_spec_lookup() {
        let registry = ProcRegistry::new();
        let spec = registry.param_spec("sine_osc", "frequency").unwrap();
        assert_eq!(spec.default, 440.0);
        assert!(registry.param_spec("sine_osc", "resonance").is_none());
        assert!(registry.param_spec("add", "gain").is_none());
    }

    #[test]
    fn test_register_shadows_builtin() {
        let mut registry = ProcRegistry::new();
        registry.register(
            ProcDescriptor {
                id: "gain",
                name: "Unity",
                description: "Gain fixed at one",
                category: ProcCategory::Arithmetic,
            },
            |_| Box::new(Gain::default()),
        );
        assert_eq!(registry.len(), 7);
        assert_eq!(registry.get("gain").unwrap().name, "Unity");
    }

    #[test]
    fn test_all_procs_can_run() {
        let registry = ProcRegistry::new();
        let ctx = BuildContext::default();
        let prep = PrepareContext {
            sample_rate: 48000.0,
            vector_size: 32,
            host_block_size: 256,
        };
        for descriptor in registry.all_procs() {
            let mut proc = registry.create(descriptor.id, &ctx).unwrap();
            proc.prepare(&prep).unwrap();
            let inputs = Signal::new(proc.inputs().len(), 32);
            let mut outputs = Signal::new(proc.outputs().len(), 32);
            proc.process(&inputs, &mut outputs);
            assert!(
                outputs.as_slice().iter().all(|s| s.is_finite()),
                "{} produced non-finite output",
                descriptor.id
            );
        }
    }
}
