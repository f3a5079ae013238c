//! Configuration front end for cadenza.
//!
//! This crate reads the TOML files the rest of the workspace runs from:
//! engine settings, graph descriptions and event scores. Parsing stops at
//! the abstract description tree; the graph builder owns what the
//! attributes mean.
//!
//! # Features
//!
//! - **Engine Settings**: [`EngineConfig`] with defaults for every field
//! - **Graph Files**: [`GraphFile`] turns arrays of tables into a
//!   [`GraphDescription`](cadenza_core::graph::GraphDescription)
//! - **Scores**: [`Score`] lists events stamped in seconds
//!
//! # Example
//!
//! ```rust
//! use cadenza_config::GraphFile;
//!
//! let file = GraphFile::from_toml(r#"
//!     [engine]
//!     chunk_size = 32
//!
//!     [[proc]]
//!     class = "sine_osc"
//!     name = "osc"
//!
//!     [[connect]]
//!     from = "osc"
//!     to = "outputs"
//! "#).unwrap();
//!
//! assert_eq!(file.engine.chunk_size, 32);
//! assert_eq!(file.description.children.len(), 2);
//! ```

mod engine_config;
mod error;
mod graph_file;
mod score;

pub use engine_config::{EngineConfig, ProtocolSetting};
pub use error::ConfigError;
pub use graph_file::{ENGINE_KEY, GraphFile, description_from_table};
pub use score::{ScheduledEvent, Score, ScoreEntry};
