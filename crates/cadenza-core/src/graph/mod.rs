//! Signal graph: procs, connections, and the compiled schedule.
//!
//! A graph is edited (add procs, connect ports), compiled into a flat
//! [`CompiledSchedule`], prepared for a vector size, and then executed one
//! vector at a time with zero allocations.
//!
//! # Architecture
//!
//! - [`ProcessingGraph`] owns the node arena and the connections. Nodes are
//!   referred to only by [`NodeId`] index, never by pointer.
//! - [`CompiledSchedule`] is a flat [`Vec<ProcessStep>`](ProcessStep) in
//!   topological order. Compilation replaces it wholesale.
//! - [`Proc`] is the capability every node implements: compute one vector
//!   from its input rows into its output rows.
//! - [`GraphBuilder`] turns an abstract [`GraphDescription`] into nodes and
//!   connections, creating procs by class name through a [`ProcFactory`].
//!
//! # Example
//!
//! ```rust,ignore
//! use cadenza_core::graph::{BuildContext, DescNode, GraphBuilder, ProcessingGraph};
//!
//! let desc = DescNode::graph()
//!     .child(DescNode::proc("sine_osc", "osc").attr("frequency", 220.0))
//!     .child(DescNode::connect("osc", "outputs"));
//!
//! let mut graph = ProcessingGraph::new(0, 1);
//! GraphBuilder::new(&registry, BuildContext::default()).build(&desc, &mut graph)?;
//! graph.compile()?;
//! graph.prepare(&ctx)?;
//! graph.process_chunk(&host_inputs);
//! ```

pub mod builder;
pub mod description;
pub mod edge;
pub mod node;
mod proc;
mod processing;
pub mod schedule;

pub use builder::{GraphBuilder, HOST_INPUTS, HOST_OUTPUTS};
pub use description::{
    AttrValue, DEFAULT_SIGNAL_LENGTH, DescNode, GraphDescription, SignalDecl, TriggerMode,
};
pub use edge::{Connection, SignalDest, SignalSource};
pub use node::{NodeId, NodeView, path_matches};
pub use proc::{BuildContext, ParamSpec, PrepareContext, Proc, ProcFactory, port_names};
pub use processing::ProcessingGraph;
pub use schedule::{CompiledSchedule, ProcessStep};
