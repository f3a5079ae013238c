//! Processing graph: node arena, connections, compilation, and execution.
//!
//! [`ProcessingGraph`] owns the nodes (boxed [`Proc`]s in an arena indexed by
//! [`NodeId`]), the connections between their ports, per-node port buffers,
//! and the compiled schedule. Mutation and compilation happen between audio
//! calls; [`process_chunk()`](ProcessingGraph::process_chunk) runs the
//! schedule for exactly one vector without allocating.

use std::collections::VecDeque;

use crate::{GraphError, Signal};

use super::edge::{Connection, SignalDest, SignalSource};
use super::node::{NodeData, NodeId, NodeView, path_matches};
use super::proc::{PrepareContext, Proc};
use super::schedule::{CompiledSchedule, ProcessStep};

/// Directed acyclic graph of procs, executed one vector at a time.
///
/// # Usage
///
/// 1. Create a graph with [`new()`](Self::new)
/// 2. Add procs: [`add_proc()`](Self::add_proc)
/// 3. Connect ports: [`connect()`](Self::connect)
/// 4. Compile: [`compile()`](Self::compile)
/// 5. Size buffers: [`prepare()`](Self::prepare)
/// 6. Process: [`process_chunk()`](Self::process_chunk)
pub struct ProcessingGraph {
    nodes: Vec<NodeData>,
    /// One signal per node, one row per input port.
    node_inputs: Vec<Signal>,
    /// One signal per node, one row per output port.
    node_outputs: Vec<Signal>,
    connections: Vec<Connection>,
    compiled: Option<CompiledSchedule>,
    input_channels: usize,
    output_channels: usize,
    host_out: Signal,
    vector_size: usize,
    prepared: bool,
}

impl core::fmt::Debug for ProcessingGraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcessingGraph")
            .field("nodes", &self.nodes.iter().map(|n| &n.path).collect::<Vec<_>>())
            .field("connections", &self.connections)
            .field("compiled", &self.compiled.is_some())
            .field("input_channels", &self.input_channels)
            .field("output_channels", &self.output_channels)
            .field("vector_size", &self.vector_size)
            .field("prepared", &self.prepared)
            .finish_non_exhaustive()
    }
}

impl Default for ProcessingGraph {
    fn default() -> Self {
        Self::new(0, 2)
    }
}

impl ProcessingGraph {
    /// Creates an empty graph with the given host channel counts.
    pub fn new(input_channels: usize, output_channels: usize) -> Self {
        Self {
            nodes: Vec::new(),
            node_inputs: Vec::new(),
            node_outputs: Vec::new(),
            connections: Vec::new(),
            compiled: None,
            input_channels,
            output_channels,
            host_out: Signal::default(),
            vector_size: 0,
            prepared: false,
        }
    }

    /// Removes every node and connection and drops the schedule.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.node_inputs.clear();
        self.node_outputs.clear();
        self.connections.clear();
        self.compiled = None;
        self.prepared = false;
    }

    // --- Host channels ---

    /// Sets the number of host input channels. Requires a recompile.
    pub fn set_input_channels(&mut self, channels: usize) {
        if channels != self.input_channels {
            self.input_channels = channels;
            self.invalidate();
        }
    }

    /// Sets the number of host output channels. Requires a recompile.
    pub fn set_output_channels(&mut self, channels: usize) {
        if channels != self.output_channels {
            self.output_channels = channels;
            self.invalidate();
        }
    }

    /// Number of host input channels.
    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    /// Number of host output channels.
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    // --- Node mutations ---

    /// Adds a proc under `path`. Returns the new node's ID.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidAttribute`] if a node with the same path
    /// already exists.
    pub fn add_proc(
        &mut self,
        path: impl Into<String>,
        proc: Box<dyn Proc>,
    ) -> Result<NodeId, GraphError> {
        let path = path.into();
        if self.node_by_path(&path).is_some() {
            return Err(GraphError::invalid_attribute(
                path,
                "name",
                "duplicate node path",
            ));
        }
        let id = NodeId(self.nodes.len() as u32);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {} '{}' as {id}", proc.class_name(), path);
        self.nodes.push(NodeData::new(path, proc));
        self.node_inputs.push(Signal::default());
        self.node_outputs.push(Signal::default());
        self.invalidate();
        Ok(id)
    }

    /// Connects a source to a destination.
    ///
    /// Node IDs and port indices are checked here; host channel indices are
    /// checked by [`compile()`](Self::compile) because channel counts may
    /// still change.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MissingTarget`] if a node or port does not exist.
    pub fn connect(&mut self, source: SignalSource, dest: SignalDest) -> Result<(), GraphError> {
        if let SignalSource::Node { node, port } = source {
            let data = self.get_node(node)?;
            if port >= data.outputs.len() {
                return Err(GraphError::missing_target(format!(
                    "output {} of '{}'",
                    port + 1,
                    data.path
                )));
            }
        }
        if let SignalDest::Node { node, port } = dest {
            let data = self.get_node(node)?;
            if port >= data.inputs.len() {
                return Err(GraphError::missing_target(format!(
                    "input {} of '{}'",
                    port + 1,
                    data.path
                )));
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_connect: {source:?} → {dest:?}");
        self.connections.push(Connection { source, dest });
        self.compiled = None;
        Ok(())
    }

    /// Enables or disables a node. Disabled nodes are skipped and output
    /// silence. Returns false if the node does not exist.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> bool {
        match self.nodes.get_mut(id.0 as usize) {
            Some(node) => {
                node.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Whether a node is enabled. Unknown nodes report false.
    pub fn is_enabled(&self, id: NodeId) -> bool {
        self.nodes.get(id.0 as usize).is_some_and(|n| n.enabled)
    }

    /// Sets a named parameter on a node's proc. Returns false if either the
    /// node or the parameter is unknown.
    pub fn set_param(&mut self, id: NodeId, name: &str, value: f32) -> bool {
        self.nodes
            .get_mut(id.0 as usize)
            .is_some_and(|n| n.proc.set_param(name, value))
    }

    /// Mutable access to a node's proc.
    pub fn proc_mut(&mut self, id: NodeId) -> Option<&mut (dyn Proc + 'static)> {
        self.nodes.get_mut(id.0 as usize).map(|n| n.proc.as_mut())
    }

    /// Mutable access to a node's proc as its concrete type.
    pub fn proc_as<T: Proc + 'static>(&mut self, id: NodeId) -> Option<&mut T> {
        self.proc_mut(id)?.as_any_mut().downcast_mut::<T>()
    }

    // --- Queries ---

    /// Looks up a node by its full path.
    pub fn node_by_path(&self, path: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.path == path)
            .map(|i| NodeId(i as u32))
    }

    /// All nodes whose path matches `pattern`, in insertion order.
    /// A `*` segment matches any single path segment.
    pub fn nodes_matching(&self, pattern: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| path_matches(pattern, &n.path))
            .map(|(i, _)| NodeId(i as u32))
            .collect()
    }

    /// Read-only view of one node.
    pub fn node(&self, id: NodeId) -> Option<NodeView<'_>> {
        self.nodes.get(id.0 as usize).map(|n| NodeView {
            id,
            path: &n.path,
            class: n.proc.class_name(),
            inputs: &n.inputs,
            outputs: &n.outputs,
            enabled: n.enabled,
        })
    }

    /// Views of every node in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeView<'_>> {
        (0..self.nodes.len()).filter_map(|i| self.node(NodeId(i as u32)))
    }

    /// Index of a named input port.
    pub fn input_port(&self, id: NodeId, name: &str) -> Option<usize> {
        self.nodes
            .get(id.0 as usize)?
            .inputs
            .iter()
            .position(|p| p == name)
    }

    /// Index of a named output port.
    pub fn output_port(&self, id: NodeId, name: &str) -> Option<usize> {
        self.nodes
            .get(id.0 as usize)?
            .outputs
            .iter()
            .position(|p| p == name)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All connections in the order they were made.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The current schedule, if the graph has compiled since its last change.
    pub fn schedule(&self) -> Option<&CompiledSchedule> {
        self.compiled.as_ref()
    }

    /// True once [`compile()`](Self::compile) has succeeded and nothing has
    /// changed since.
    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    /// True once [`prepare()`](Self::prepare) has succeeded for the current
    /// node set.
    pub fn is_prepared(&self) -> bool {
        self.prepared && self.compiled.is_some()
    }

    /// Frames per vector set by the last successful prepare.
    pub fn vector_size(&self) -> usize {
        self.vector_size
    }

    // --- Compilation ---

    /// Compiles the graph into a [`CompiledSchedule`].
    ///
    /// Checks every host channel reference, orders nodes with Kahn's
    /// algorithm, and emits the step list. On success the previous schedule
    /// is replaced; on failure it is left as it was.
    ///
    /// # Errors
    ///
    /// - [`GraphError::MissingTarget`] if a connection names a host channel
    ///   that does not exist
    /// - [`GraphError::Cycle`] if the connections contain a cycle
    pub fn compile(&mut self) -> Result<(), GraphError> {
        for conn in &self.connections {
            match conn.source {
                SignalSource::HostInput(ch) if ch >= self.input_channels => {
                    return Err(GraphError::missing_target(format!("host input {}", ch + 1)));
                }
                _ => {}
            }
            match conn.dest {
                SignalDest::HostOutput(ch) if ch >= self.output_channels => {
                    return Err(GraphError::missing_target(format!(
                        "host output {}",
                        ch + 1
                    )));
                }
                _ => {}
            }
        }

        let order = self.kahn_sort()?;
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_sort: {} nodes in topo order", order.len());

        let steps = self.emit_steps(&order);

        #[cfg(feature = "tracing")]
        for (i, step) in steps.iter().enumerate() {
            tracing::debug!("  step[{i}]: {step}");
        }

        self.compiled = Some(CompiledSchedule { steps, order });
        Ok(())
    }

    /// Performs Kahn's algorithm for topological sorting.
    ///
    /// Ready nodes are taken in arena order, so independent nodes run in the
    /// order they were added.
    fn kahn_sort(&self) -> Result<Vec<usize>, GraphError> {
        let n = self.nodes.len();
        let mut in_degree = vec![0u32; n];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); n];

        for conn in &self.connections {
            if let (Some(from), Some(to)) = (conn.source_node(), conn.dest_node()) {
                in_degree[to.0 as usize] += 1;
                outgoing[from.0 as usize].push(to.0 as usize);
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut sorted = Vec::with_capacity(n);

        while let Some(idx) = queue.pop_front() {
            sorted.push(idx);
            for &to_idx in &outgoing[idx] {
                in_degree[to_idx] -= 1;
                if in_degree[to_idx] == 0 {
                    queue.push_back(to_idx);
                }
            }
        }

        if sorted.len() != n {
            return Err(GraphError::Cycle(n - sorted.len()));
        }
        Ok(sorted)
    }

    /// Emits the step list for a topological order.
    fn emit_steps(&self, order: &[usize]) -> Vec<ProcessStep> {
        let mut steps = Vec::new();
        for &node_idx in order {
            steps.push(ProcessStep::ClearInput { node_idx });
            for conn in &self.connections {
                match conn.dest {
                    SignalDest::Node { node, port } if node.0 as usize == node_idx => {
                        steps.push(ProcessStep::AccumulateInput {
                            source: conn.source,
                            node_idx,
                            port,
                        });
                    }
                    _ => {}
                }
            }
            steps.push(ProcessStep::Process { node_idx });
        }
        for channel in 0..self.output_channels {
            steps.push(ProcessStep::ClearOutput { channel });
            for conn in &self.connections {
                if conn.dest == SignalDest::HostOutput(channel) {
                    steps.push(ProcessStep::AccumulateOutput {
                        source: conn.source,
                        channel,
                    });
                }
            }
        }
        steps
    }

    // --- Preparation ---

    /// Sizes every port buffer to one vector and prepares every proc.
    ///
    /// Stops at the first failure and leaves the graph unprepared.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NotReady`] if the graph has not compiled
    /// - [`GraphError::Allocation`] if a buffer cannot be sized
    pub fn prepare(&mut self, ctx: &PrepareContext) -> Result<(), GraphError> {
        if self.compiled.is_none() {
            return Err(GraphError::NotReady("prepare"));
        }
        self.prepared = false;
        let frames = ctx.vector_size;
        for ((node, input), output) in self
            .nodes
            .iter_mut()
            .zip(self.node_inputs.iter_mut())
            .zip(self.node_outputs.iter_mut())
        {
            input.resize(node.inputs.len(), frames)?;
            output.resize(node.outputs.len(), frames)?;
            node.proc.prepare(ctx)?;
        }
        self.host_out.resize(self.output_channels, frames)?;
        self.vector_size = frames;
        self.prepared = true;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_prepare: {} nodes, vector {frames}, sr {}",
            self.nodes.len(),
            ctx.sample_rate
        );
        Ok(())
    }

    // --- Execution ---

    /// Runs the compiled schedule for one vector.
    ///
    /// `host_inputs` holds one row per host input channel, each one vector
    /// long. Missing rows read as silence. Does nothing if the graph is not
    /// prepared.
    pub fn process_chunk(&mut self, host_inputs: &Signal) {
        if !self.is_prepared() {
            return;
        }
        let Some(schedule) = self.compiled.as_ref() else {
            return;
        };
        for step in &schedule.steps {
            match *step {
                ProcessStep::ClearInput { node_idx } => {
                    self.node_inputs[node_idx].clear();
                }
                ProcessStep::AccumulateInput {
                    source,
                    node_idx,
                    port,
                } => {
                    if let Some(src) = read_source(&self.node_outputs, host_inputs, source) {
                        accumulate(self.node_inputs[node_idx].row_mut(port), src);
                    }
                }
                ProcessStep::Process { node_idx } => {
                    let node = &mut self.nodes[node_idx];
                    let outputs = &mut self.node_outputs[node_idx];
                    if node.enabled {
                        node.proc.process(&self.node_inputs[node_idx], outputs);
                    } else {
                        outputs.clear();
                    }
                }
                ProcessStep::ClearOutput { channel } => {
                    self.host_out.row_mut(channel).fill(0.0);
                }
                ProcessStep::AccumulateOutput { source, channel } => {
                    if let Some(src) = read_source(&self.node_outputs, host_inputs, source) {
                        accumulate(self.host_out.row_mut(channel), src);
                    }
                }
            }
        }
    }

    /// One vector of a host output channel, as left by the last chunk.
    pub fn host_output(&self, channel: usize) -> &[f32] {
        self.host_out.row(channel)
    }

    /// Mutable access to a host output channel (for post-gain).
    pub fn host_output_mut(&mut self, channel: usize) -> &mut [f32] {
        self.host_out.row_mut(channel)
    }

    /// One vector of a node output port, as left by the last chunk.
    pub fn node_output(&self, id: NodeId, port: usize) -> Option<&[f32]> {
        let sig = self.node_outputs.get(id.0 as usize)?;
        (port < sig.rows()).then(|| sig.row(port))
    }

    /// Resets every proc and silences every buffer.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.proc.reset();
        }
        for sig in self.node_inputs.iter_mut().chain(self.node_outputs.iter_mut()) {
            sig.clear();
        }
        self.host_out.clear();
    }

    // --- Internal helpers ---

    fn invalidate(&mut self) {
        self.compiled = None;
        self.prepared = false;
    }

    fn get_node(&self, id: NodeId) -> Result<&NodeData, GraphError> {
        self.nodes
            .get(id.0 as usize)
            .ok_or_else(|| GraphError::missing_target(id.to_string()))
    }
}

fn read_source<'a>(
    node_outputs: &'a [Signal],
    host_inputs: &'a Signal,
    source: SignalSource,
) -> Option<&'a [f32]> {
    match source {
        SignalSource::HostInput(ch) => (ch < host_inputs.rows()).then(|| host_inputs.row(ch)),
        SignalSource::Node { node, port } => Some(node_outputs[node.0 as usize].row(port)),
    }
}

fn accumulate(dst: &mut [f32], src: &[f32]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d += *s;
    }
}
