//! Abstract graph description tree.
//!
//! A description is a tree of [`DescNode`]s: a tag, ordered attributes, and
//! children. It carries no syntax of its own; front ends (such as the TOML
//! loader in `cadenza-config`) produce it and the
//! [`GraphBuilder`](super::GraphBuilder) consumes it.
//!
//! Recognised tags:
//!
//! | tag         | attributes                                              |
//! |-------------|---------------------------------------------------------|
//! | `graph`     | root of a description                                   |
//! | `proc`      | `class`, `name`, `enabled`; other numbers are params    |
//! | `container` | `name`, `copies`                                        |
//! | `connect`   | `from`, `output`, `to`, `input`                         |
//! | `signal`    | `proc`, `output`, `alias`, `mode`, `length`, `frame_size` |

use core::fmt;

use crate::GraphError;

/// Tag of a description root.
pub const TAG_GRAPH: &str = "graph";
/// Tag of a proc declaration.
pub const TAG_PROC: &str = "proc";
/// Tag of a container declaration.
pub const TAG_CONTAINER: &str = "container";
/// Tag of a connection.
pub const TAG_CONNECT: &str = "connect";
/// Tag of a published signal declaration.
pub const TAG_SIGNAL: &str = "signal";

/// Default ring length of a published signal, in samples.
pub const DEFAULT_SIGNAL_LENGTH: usize = 4096;

/// A typed attribute value.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// Free text.
    Text(String),
}

impl AttrValue {
    /// Numeric value, if this is an `Int` or `Float`.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            AttrValue::Int(i) => Some(i as f32),
            AttrValue::Float(f) => Some(f as f32),
            _ => None,
        }
    }

    /// Non-negative integer value. Text holding digits is accepted.
    pub fn as_usize(&self) -> Option<usize> {
        match self {
            AttrValue::Int(i) => usize::try_from(*i).ok(),
            AttrValue::Text(t) => t.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            AttrValue::Bool(b) => Some(b),
            AttrValue::Int(i) => Some(i != 0),
            _ => None,
        }
    }

    /// Text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Text(t) => f.write_str(t),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Text(v)
    }
}

/// One element of a description tree.
///
/// # Example
///
/// ```rust
/// use cadenza_core::graph::DescNode;
///
/// let graph = DescNode::graph()
///     .child(DescNode::proc("sine_osc", "osc").attr("frequency", 220.0))
///     .child(DescNode::connect("osc", "outputs").attr("input", 1_i64));
/// assert_eq!(graph.children.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DescNode {
    /// Element kind.
    pub tag: String,
    /// Attributes in declaration order.
    pub attrs: Vec<(String, AttrValue)>,
    /// Nested elements.
    pub children: Vec<DescNode>,
}

/// The root of a graph description.
pub type GraphDescription = DescNode;

impl DescNode {
    /// Create an element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// An empty `graph` root.
    pub fn graph() -> Self {
        Self::new(TAG_GRAPH)
    }

    /// A `proc` element with class and name set.
    pub fn proc(class: &str, name: &str) -> Self {
        Self::new(TAG_PROC).attr("class", class).attr("name", name)
    }

    /// A `container` element with its name set.
    pub fn container(name: &str) -> Self {
        Self::new(TAG_CONTAINER).attr("name", name)
    }

    /// A `connect` element with `from` and `to` set.
    pub fn connect(from: &str, to: &str) -> Self {
        Self::new(TAG_CONNECT).attr("from", from).attr("to", to)
    }

    /// A `signal` element publishing `output` of `proc` as `alias`.
    pub fn signal(proc: &str, output: &str, alias: &str) -> Self {
        Self::new(TAG_SIGNAL)
            .attr("proc", proc)
            .attr("output", output)
            .attr("alias", alias)
    }

    /// Builder: append an attribute.
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.push((name.to_owned(), value.into()));
        self
    }

    /// Builder: append a child.
    #[must_use]
    pub fn child(mut self, child: DescNode) -> Self {
        self.children.push(child);
        self
    }

    /// Looks up an attribute by name. The last declaration wins.
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Text attribute, with `{copy}` replaced by `copy` when set.
    pub fn text(&self, name: &str, copy: Option<usize>) -> Option<String> {
        let value = self.get(name)?;
        let raw = match value {
            AttrValue::Text(t) => t.clone(),
            other => other.to_string(),
        };
        Some(match copy {
            Some(n) => raw.replace("{copy}", &n.to_string()),
            None => raw,
        })
    }

    /// Required text attribute.
    pub fn require_text(&self, name: &str, copy: Option<usize>) -> Result<String, GraphError> {
        self.text(name, copy)
            .ok_or_else(|| GraphError::invalid_attribute(&self.tag, name, "missing"))
    }
}

/// How a published signal treats its ring when the reader falls behind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerMode {
    /// Keep only the newest samples: writes and reads drop the oldest data
    /// so the reader always sees the most recent window.
    #[default]
    MostRecent,
    /// Never overwrite: samples that do not fit are dropped.
    NoTrash,
}

impl TriggerMode {
    /// Parse a mode name as written in descriptions.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "most_recent" | "mostRecent" => Some(TriggerMode::MostRecent),
            "no_trash" | "noTrash" => Some(TriggerMode::NoTrash),
            _ => None,
        }
    }
}

/// A parsed top-level `signal` declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalDecl {
    /// Path of the source proc; `*` segments match any name.
    pub proc: String,
    /// Output port name on the source.
    pub output: String,
    /// Name observers read the signal by.
    pub alias: String,
    /// Overflow behavior.
    pub mode: TriggerMode,
    /// Ring length in samples.
    pub length: usize,
    /// Samples per frame.
    pub frame_size: usize,
}

impl SignalDecl {
    /// Parse a `signal` element.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidAttribute`] for missing required
    /// attributes, an unknown mode, or a zero length or frame size.
    pub fn from_desc(node: &DescNode) -> Result<Self, GraphError> {
        let proc = node.require_text("proc", None)?;
        let output = node.require_text("output", None)?;
        let alias = node.require_text("alias", None)?;
        let mode = match node.text("mode", None) {
            Some(m) => TriggerMode::parse(&m)
                .ok_or_else(|| GraphError::invalid_attribute(&alias, "mode", m))?,
            None => TriggerMode::default(),
        };
        let length = positive(node, &alias, "length", DEFAULT_SIGNAL_LENGTH)?;
        let frame_size = positive(node, &alias, "frame_size", 1)?;
        Ok(Self {
            proc,
            output,
            alias,
            mode,
            length,
            frame_size,
        })
    }
}

fn positive(node: &DescNode, owner: &str, name: &str, default: usize) -> Result<usize, GraphError> {
    match node.get(name) {
        None => Ok(default),
        Some(v) => match v.as_usize() {
            Some(n) if n > 0 => Ok(n),
            _ => Err(GraphError::invalid_attribute(
                owner,
                name,
                format!("expected a positive integer, got {v}"),
            )),
        },
    }
}
