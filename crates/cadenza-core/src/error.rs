//! Error type shared by graph construction, compilation, and preparation.
//!
//! Every fallible lifecycle stage (build, compile, prepare) returns a
//! [`GraphError`]. A failed stage leaves the graph unusable for processing
//! until the stage is retried successfully. The audio path itself never
//! returns errors: underruns and overflows are reported by count.

use thiserror::Error;

/// Errors that can occur while building, compiling, or preparing a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A description declared a proc class the factory does not know.
    #[error("unknown proc class '{0}'")]
    MissingClass(String),

    /// A connection or published signal refers to something that does not exist.
    #[error("unresolved target: {0}")]
    MissingTarget(String),

    /// The connections contain a dependency cycle; no execution order exists.
    #[error("graph contains a cycle through {0} node(s)")]
    Cycle(usize),

    /// A buffer could not be allocated or resized.
    #[error("failed to allocate {0} samples")]
    Allocation(usize),

    /// An attribute in the description has the wrong type or an invalid value.
    #[error("invalid attribute '{name}' on '{node}': {reason}")]
    InvalidAttribute {
        /// Name of the node (or tag) carrying the attribute.
        node: String,
        /// Attribute name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A lifecycle stage was invoked before the stage it depends on succeeded.
    #[error("{0} called before the previous stage succeeded")]
    NotReady(&'static str),
}

impl GraphError {
    /// Create an invalid attribute error.
    pub fn invalid_attribute(
        node: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        GraphError::InvalidAttribute {
            node: node.into(),
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing target error.
    pub fn missing_target(what: impl Into<String>) -> Self {
        GraphError::MissingTarget(what.into())
    }
}
