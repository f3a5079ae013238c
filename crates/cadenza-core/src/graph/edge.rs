//! Connection types for the processing graph.
//!
//! A [`Connection`] carries one port's signal from a [`SignalSource`] to a
//! [`SignalDest`]. Sources are node outputs or host input channels;
//! destinations are node inputs or host output channels. Several
//! connections into the same destination are summed.

use super::node::NodeId;

/// Where a connection reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalSource {
    /// A host input channel, zero-based.
    HostInput(usize),
    /// A node output port.
    Node {
        /// Producing node.
        node: NodeId,
        /// Output port index.
        port: usize,
    },
}

/// Where a connection writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalDest {
    /// A host output channel, zero-based.
    HostOutput(usize),
    /// A node input port.
    Node {
        /// Consuming node.
        node: NodeId,
        /// Input port index.
        port: usize,
    },
}

/// A directed connection between two ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    /// Signal origin.
    pub source: SignalSource,
    /// Signal destination.
    pub dest: SignalDest,
}

impl Connection {
    /// The producing node, if the source is not a host channel.
    pub fn source_node(&self) -> Option<NodeId> {
        match self.source {
            SignalSource::Node { node, .. } => Some(node),
            SignalSource::HostInput(_) => None,
        }
    }

    /// The consuming node, if the destination is not a host channel.
    pub fn dest_node(&self) -> Option<NodeId> {
        match self.dest {
            SignalDest::Node { node, .. } => Some(node),
            SignalDest::HostOutput(_) => None,
        }
    }
}
