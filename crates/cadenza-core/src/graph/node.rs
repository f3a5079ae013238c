//! Graph node storage.
//!
//! Each node in the processing graph has a [`NodeId`] and wraps a boxed
//! [`Proc`]. The `NodeData` struct bundles the proc with its path name, its
//! cached port names, and the enabled flag. Port buffers live beside the
//! nodes in the graph so the audio loop can borrow them independently.

use super::proc::Proc;

/// Unique identifier for a node in the processing graph.
///
/// Node IDs are arena indices, assigned sequentially. They stay valid until
/// the graph is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Internal bookkeeping for a node in the graph.
pub(crate) struct NodeData {
    pub path: String,
    pub proc: Box<dyn Proc>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub enabled: bool,
}

impl NodeData {
    pub fn new(path: String, proc: Box<dyn Proc>) -> Self {
        let inputs = proc.inputs();
        let outputs = proc.outputs();
        Self {
            path,
            proc,
            inputs,
            outputs,
            enabled: true,
        }
    }
}

/// Read-only view of a node for inspection.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    /// Arena identifier.
    pub id: NodeId,
    /// Full `/`-separated path.
    pub path: &'a str,
    /// Registry class.
    pub class: &'static str,
    /// Input port names.
    pub inputs: &'a [String],
    /// Output port names.
    pub outputs: &'a [String],
    /// Whether the node runs.
    pub enabled: bool,
}

/// Returns true if `path` matches `pattern`, where a `*` segment in the
/// pattern matches any single segment.
///
/// # Example
///
/// ```rust
/// use cadenza_core::graph::path_matches;
///
/// assert!(path_matches("voices/*/osc", "voices/3/osc"));
/// assert!(!path_matches("voices/*/osc", "voices/3/env"));
/// assert!(!path_matches("voices/*", "voices/3/osc"));
/// ```
pub fn path_matches(pattern: &str, path: &str) -> bool {
    let mut p = pattern.split('/');
    let mut s = path.split('/');
    loop {
        match (p.next(), s.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if a == "*" || a == b => {}
            _ => return false,
        }
    }
}
