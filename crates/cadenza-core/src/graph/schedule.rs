//! Compiled schedule types for the processing graph.
//!
//! A [`CompiledSchedule`] is produced by
//! [`ProcessingGraph::compile()`](super::ProcessingGraph::compile). It contains
//! a flat list of [`ProcessStep`] instructions that the audio thread executes
//! sequentially, once per vector. A new schedule replaces the old one
//! wholesale; the audio path never sees a half-built schedule.

use super::edge::SignalSource;

/// A single instruction in the compiled processing schedule.
///
/// All variants are plain indices (no heap pointers), so executing the
/// schedule never allocates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessStep {
    /// Zero every input row of a node before its connections are summed in.
    ClearInput {
        /// Index into the graph's node storage.
        node_idx: usize,
    },

    /// Add a source signal into one input port of a node.
    AccumulateInput {
        /// Signal to read.
        source: SignalSource,
        /// Consuming node.
        node_idx: usize,
        /// Input port index on that node.
        port: usize,
    },

    /// Run a node's proc for one vector. Disabled nodes write silence.
    Process {
        /// Index into the graph's node storage.
        node_idx: usize,
    },

    /// Zero a host output channel.
    ClearOutput {
        /// Host output channel, zero-based.
        channel: usize,
    },

    /// Add a source signal into a host output channel.
    AccumulateOutput {
        /// Signal to read.
        source: SignalSource,
        /// Host output channel, zero-based.
        channel: usize,
    },
}

impl core::fmt::Display for ProcessStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fn src(f: &mut core::fmt::Formatter<'_>, s: &SignalSource) -> core::fmt::Result {
            match s {
                SignalSource::HostInput(ch) => write!(f, "in[{ch}]"),
                SignalSource::Node { node, port } => write!(f, "node[{}].out[{port}]", node.0),
            }
        }
        match self {
            ProcessStep::ClearInput { node_idx } => write!(f, "ClearInput node[{node_idx}]"),
            ProcessStep::AccumulateInput {
                source,
                node_idx,
                port,
            } => {
                write!(f, "AccumulateInput ")?;
                src(f, source)?;
                write!(f, " → node[{node_idx}].in[{port}]")
            }
            ProcessStep::Process { node_idx } => write!(f, "Process node[{node_idx}]"),
            ProcessStep::ClearOutput { channel } => write!(f, "ClearOutput out[{channel}]"),
            ProcessStep::AccumulateOutput { source, channel } => {
                write!(f, "AccumulateOutput ")?;
                src(f, source)?;
                write!(f, " → out[{channel}]")
            }
        }
    }
}

/// Compiled snapshot of the processing graph.
#[derive(Clone, Debug, Default)]
pub struct CompiledSchedule {
    /// Flat list of processing instructions, in execution order.
    pub(crate) steps: Vec<ProcessStep>,
    /// Node indices in topological order.
    pub(crate) order: Vec<usize>,
}

impl CompiledSchedule {
    /// Returns the number of processing steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// The steps in execution order.
    pub fn steps(&self) -> &[ProcessStep] {
        &self.steps
    }

    /// Node arena indices in execution order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }
}
