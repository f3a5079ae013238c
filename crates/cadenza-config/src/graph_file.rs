//! TOML front end for graph descriptions.
//!
//! A graph file holds an optional `[engine]` table of [`EngineConfig`]
//! settings and the graph itself as arrays of tables, one array per
//! description tag:
//!
//! ```toml
//! [engine]
//! polyphony = 4
//!
//! [[container]]
//! name = "voices"
//! copies = 4
//!
//!   [[container.proc]]
//!   class = "sine_osc"
//!   name = "osc"
//!
//!   [[container.proc]]
//!   class = "multiply"
//!   name = "vca"
//!
//!   [[container.connect]]
//!   from = "control_inputs"
//!   output = "pitch_{copy}"
//!   to = "osc"
//!
//! [[connect]]
//! from = "voices/1/vca"
//! to = "outputs"
//!
//! [[signal]]
//! proc = "voices/*/vca"
//! output = "out"
//! alias = "voice_out"
//! ```
//!
//! Children are emitted tag by tag in the order `proc`, `container`,
//! `connect`, `signal`, each array in file order. Scalar keys become
//! attributes; the builder decides what they mean.

use std::path::Path;

use cadenza_core::graph::description::{TAG_CONNECT, TAG_CONTAINER, TAG_PROC, TAG_SIGNAL};
use cadenza_core::graph::{AttrValue, DescNode, GraphDescription};
use toml::{Table, Value};

use crate::engine_config::EngineConfig;
use crate::error::ConfigError;

/// Key of the engine settings table.
pub const ENGINE_KEY: &str = "engine";

const CHILD_TAGS: [&str; 4] = [TAG_PROC, TAG_CONTAINER, TAG_CONNECT, TAG_SIGNAL];

/// A parsed graph file.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphFile {
    /// Engine settings; defaults when the file has no `[engine]` table.
    pub engine: EngineConfig,
    /// The graph description.
    pub description: GraphDescription,
}

impl GraphFile {
    /// Load a graph file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a graph file from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut table: Table = toml::from_str(toml_str)?;
        let engine = match table.remove(ENGINE_KEY) {
            Some(value) => {
                let engine: EngineConfig = value.try_into()?;
                engine.validate()?;
                engine
            }
            None => EngineConfig::default(),
        };
        let description = description_from_table(&table)?;
        Ok(Self {
            engine,
            description,
        })
    }
}

/// Convert a TOML table into a `graph` description root.
pub fn description_from_table(table: &Table) -> Result<GraphDescription, ConfigError> {
    for key in table.keys() {
        if !CHILD_TAGS.contains(&key.as_str()) {
            return Err(ConfigError::invalid_graph(
                key,
                format!("unknown top-level key (expected one of {CHILD_TAGS:?})"),
            ));
        }
    }
    let mut root = DescNode::graph();
    root.children = children(table, "")?;
    Ok(root)
}

fn children(table: &Table, at: &str) -> Result<Vec<DescNode>, ConfigError> {
    let mut out = Vec::new();
    for tag in CHILD_TAGS {
        let Some(value) = table.get(tag) else {
            continue;
        };
        let here = format!("{at}{tag}");
        let Value::Array(items) = value else {
            return Err(ConfigError::invalid_graph(here, "expected an array of tables"));
        };
        for (i, item) in items.iter().enumerate() {
            let item_at = format!("{here}[{i}]");
            let Value::Table(t) = item else {
                return Err(ConfigError::invalid_graph(item_at, "expected a table"));
            };
            out.push(element(tag, t, &item_at)?);
        }
    }
    Ok(out)
}

fn element(tag: &str, table: &Table, at: &str) -> Result<DescNode, ConfigError> {
    let mut node = DescNode::new(tag);
    for (key, value) in table {
        let attr = match value {
            Value::String(s) => AttrValue::Text(s.clone()),
            Value::Integer(i) => AttrValue::Int(*i),
            Value::Float(f) => AttrValue::Float(*f),
            Value::Boolean(b) => AttrValue::Bool(*b),
            Value::Array(_) | Value::Table(_) if tag == TAG_CONTAINER => {
                if CHILD_TAGS.contains(&key.as_str()) {
                    continue;
                }
                return Err(ConfigError::invalid_graph(
                    format!("{at}.{key}"),
                    "unknown nested key",
                ));
            }
            _ => {
                return Err(ConfigError::invalid_graph(
                    format!("{at}.{key}"),
                    "expected a string, number or boolean",
                ));
            }
        };
        node.attrs.push((key.clone(), attr));
    }
    if tag == TAG_CONTAINER {
        node.children = children(table, &format!("{at}."))?;
    }
    Ok(node)
}
