//! Builds a [`ProcessingGraph`] from a [`GraphDescription`].
//!
//! Procs and containers are instantiated while walking the tree; connections
//! are collected and resolved once every proc exists, so a `connect` may
//! refer to a proc declared after it. Names in a `connect` are looked up
//! relative to the enclosing container first, then as absolute paths.
//!
//! The reserved names `inputs` and `outputs` stand for the host channels;
//! their port attribute is the 1-based channel number.

use crate::GraphError;

use super::description::{
    AttrValue, DescNode, GraphDescription, SignalDecl, TAG_CONNECT, TAG_CONTAINER, TAG_PROC,
    TAG_SIGNAL,
};
use super::edge::{SignalDest, SignalSource};
use super::node::NodeId;
use super::processing::ProcessingGraph;
use super::proc::{BuildContext, ProcFactory};

/// Reserved source name for host input channels.
pub const HOST_INPUTS: &str = "inputs";
/// Reserved destination name for host output channels.
pub const HOST_OUTPUTS: &str = "outputs";

const RESERVED_PROC_ATTRS: [&str; 3] = ["class", "name", "enabled"];

/// Naming scope while walking the tree.
#[derive(Clone, Debug, Default)]
struct Scope {
    prefix: String,
    copy: Option<usize>,
}

impl Scope {
    fn join(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_owned()
        } else {
            format!("{}/{name}", self.prefix)
        }
    }
}

/// A `connect` element with its names already substituted.
#[derive(Debug)]
struct PendingConnect {
    prefix: String,
    from: String,
    output: Option<String>,
    to: String,
    input: Option<String>,
}

/// Instantiates procs through a [`ProcFactory`] and wires them up.
///
/// # Example
///
/// ```rust,ignore
/// let builder = GraphBuilder::new(&registry, BuildContext::default());
/// let signals = builder.build(&description, &mut graph)?;
/// graph.compile()?;
/// ```
pub struct GraphBuilder<'a> {
    factory: &'a dyn ProcFactory,
    ctx: BuildContext,
    host_inputs: bool,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder. Host inputs are routable by default.
    pub fn new(factory: &'a dyn ProcFactory, ctx: BuildContext) -> Self {
        Self {
            factory,
            ctx,
            host_inputs: true,
        }
    }

    /// Whether connections from [`HOST_INPUTS`] are allowed.
    #[must_use]
    pub fn host_inputs(mut self, allowed: bool) -> Self {
        self.host_inputs = allowed;
        self
    }

    /// Adds every proc and connection in `desc` to `graph`.
    ///
    /// Nodes already in the graph stay and can be named in connections.
    /// Returns the top-level `signal` declarations, unresolved.
    ///
    /// # Errors
    ///
    /// - [`GraphError::MissingClass`] for an unknown proc class
    /// - [`GraphError::MissingTarget`] for a connection naming an unknown
    ///   node, port, or host channel
    /// - [`GraphError::InvalidAttribute`] for malformed elements
    pub fn build(
        &self,
        desc: &GraphDescription,
        graph: &mut ProcessingGraph,
    ) -> Result<Vec<SignalDecl>, GraphError> {
        let mut pending = Vec::new();
        let mut signals = Vec::new();
        self.walk(desc, &Scope::default(), true, graph, &mut pending, &mut signals)?;
        for conn in &pending {
            self.resolve_connect(conn, graph)?;
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_build: {} nodes, {} connections, {} published",
            graph.node_count(),
            pending.len(),
            signals.len()
        );
        Ok(signals)
    }

    fn walk(
        &self,
        parent: &DescNode,
        scope: &Scope,
        top_level: bool,
        graph: &mut ProcessingGraph,
        pending: &mut Vec<PendingConnect>,
        signals: &mut Vec<SignalDecl>,
    ) -> Result<(), GraphError> {
        for child in &parent.children {
            match child.tag.as_str() {
                TAG_PROC => self.add_proc(child, scope, graph)?,
                TAG_CONTAINER => {
                    let name = child.require_text("name", scope.copy)?;
                    let base = scope.join(&name);
                    match child.get("copies") {
                        None => {
                            let inner = Scope {
                                prefix: base,
                                copy: scope.copy,
                            };
                            self.walk(child, &inner, false, graph, pending, signals)?;
                        }
                        Some(v) => {
                            let copies = v.as_usize().filter(|&n| n > 0).ok_or_else(|| {
                                GraphError::invalid_attribute(
                                    &base,
                                    "copies",
                                    format!("expected a positive integer, got {v}"),
                                )
                            })?;
                            for k in 1..=copies {
                                let inner = Scope {
                                    prefix: format!("{base}/{k}"),
                                    copy: Some(k),
                                };
                                self.walk(child, &inner, false, graph, pending, signals)?;
                            }
                        }
                    }
                }
                TAG_CONNECT => pending.push(PendingConnect {
                    prefix: scope.prefix.clone(),
                    from: child.require_text("from", scope.copy)?,
                    output: child.text("output", scope.copy),
                    to: child.require_text("to", scope.copy)?,
                    input: child.text("input", scope.copy),
                }),
                TAG_SIGNAL if top_level => signals.push(SignalDecl::from_desc(child)?),
                TAG_SIGNAL => {
                    return Err(GraphError::invalid_attribute(
                        &scope.prefix,
                        TAG_SIGNAL,
                        "only allowed at the top level",
                    ));
                }
                other => {
                    return Err(GraphError::invalid_attribute(
                        &scope.prefix,
                        other,
                        "unknown element",
                    ));
                }
            }
        }
        Ok(())
    }

    fn add_proc(
        &self,
        desc: &DescNode,
        scope: &Scope,
        graph: &mut ProcessingGraph,
    ) -> Result<(), GraphError> {
        let class = desc.require_text("class", scope.copy)?;
        let name = desc.require_text("name", scope.copy)?;
        let path = scope.join(&name);
        let mut proc = self
            .factory
            .create(&class, &self.ctx)
            .ok_or_else(|| GraphError::MissingClass(class.clone()))?;

        for (attr, value) in &desc.attrs {
            if RESERVED_PROC_ATTRS.contains(&attr.as_str()) {
                continue;
            }
            let number = value.as_f32().ok_or_else(|| {
                GraphError::invalid_attribute(&path, attr, format!("expected a number, got {value}"))
            })?;
            if !proc.set_param(attr, number) {
                return Err(GraphError::invalid_attribute(
                    &path,
                    attr,
                    format!("'{class}' has no such parameter"),
                ));
            }
        }

        let enabled = match desc.get("enabled") {
            None => true,
            Some(v) => v.as_bool().ok_or_else(|| {
                GraphError::invalid_attribute(&path, "enabled", format!("expected a bool, got {v}"))
            })?,
        };
        let id = graph.add_proc(path, proc)?;
        graph.set_enabled(id, enabled);
        Ok(())
    }

    fn resolve_connect(
        &self,
        conn: &PendingConnect,
        graph: &mut ProcessingGraph,
    ) -> Result<(), GraphError> {
        let source = if conn.from == HOST_INPUTS {
            if !self.host_inputs {
                return Err(GraphError::missing_target(HOST_INPUTS));
            }
            SignalSource::HostInput(host_channel(&conn.from, conn.output.as_deref())?)
        } else {
            let node = resolve_node(graph, &conn.prefix, &conn.from)?;
            let port = resolve_port(graph, node, conn.output.as_deref(), true)?;
            SignalSource::Node { node, port }
        };

        let dest = if conn.to == HOST_OUTPUTS {
            SignalDest::HostOutput(host_channel(&conn.to, conn.input.as_deref())?)
        } else {
            let node = resolve_node(graph, &conn.prefix, &conn.to)?;
            let port = resolve_port(graph, node, conn.input.as_deref(), false)?;
            SignalDest::Node { node, port }
        };

        graph.connect(source, dest)
    }
}

/// Looks `name` up inside `prefix` first, then as an absolute path.
fn resolve_node(graph: &ProcessingGraph, prefix: &str, name: &str) -> Result<NodeId, GraphError> {
    if !prefix.is_empty() {
        if let Some(id) = graph.node_by_path(&format!("{prefix}/{name}")) {
            return Ok(id);
        }
    }
    graph
        .node_by_path(name)
        .ok_or_else(|| GraphError::missing_target(format!("proc '{name}'")))
}

/// A port given by name or by 1-based index; the first port if omitted.
fn resolve_port(
    graph: &ProcessingGraph,
    node: NodeId,
    port: Option<&str>,
    output: bool,
) -> Result<usize, GraphError> {
    let Some(view) = graph.node(node) else {
        return Err(GraphError::missing_target(node.to_string()));
    };
    let names = if output { view.outputs } else { view.inputs };
    let kind = if output { "output" } else { "input" };
    let found = match port {
        None => (!names.is_empty()).then_some(0),
        Some(p) => names.iter().position(|n| n == p).or_else(|| {
            AttrValue::Text(p.to_owned())
                .as_usize()
                .filter(|&i| i >= 1 && i <= names.len())
                .map(|i| i - 1)
        }),
    };
    found.ok_or_else(|| {
        GraphError::missing_target(format!(
            "{kind} '{}' of '{}'",
            port.unwrap_or("<first>"),
            view.path
        ))
    })
}

/// Parses a 1-based host channel number; channel 1 if omitted.
fn host_channel(endpoint: &str, port: Option<&str>) -> Result<usize, GraphError> {
    match port {
        None => Ok(0),
        Some(p) => p
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&c| c >= 1)
            .map(|c| c - 1)
            .ok_or_else(|| {
                GraphError::invalid_attribute(
                    endpoint,
                    "channel",
                    format!("expected a 1-based channel number, got '{p}'"),
                )
            }),
    }
}
