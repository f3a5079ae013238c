//! Cadenza Core - signal graph and DSP primitives
//!
//! This crate provides the foundational building blocks of the cadenza engine,
//! designed for real-time audio processing with zero allocation in the audio
//! path.
//!
//! # Core Abstractions
//!
//! ## Signal Graph
//!
//! - [`graph::ProcessingGraph`] - Node arena, connections, compiled schedule
//! - [`graph::Proc`] - Object-safe trait for one unit of DSP work
//! - [`graph::GraphBuilder`] - Builds a graph from an abstract description tree
//!
//! ## Buffers
//!
//! - [`RingBuffer`] - Single-writer/single-reader sample queue
//! - [`Signal`] - Row-major 2-D sample buffer
//!
//! ## Filters
//!
//! - [`OnePole`] - One-pole lowpass for smoothing and tone shaping
//!
//! ## Built-in Procs
//!
//! See [`procs`]: oscillator, gain, arithmetic, lowpass, transport phasor.
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`flush_denormal`], etc.
//! - Transport: [`TransportInfo`]
//!
//! # Feature Flags
//!
//! - `tracing` - emit graph lifecycle diagnostics through the `tracing` facade
//!
//! # Example
//!
//! ```rust
//! use cadenza_core::RingBuffer;
//!
//! let mut ring = RingBuffer::with_capacity(8);
//! assert_eq!(ring.write(&[0.5, -0.5, 0.25]), 3);
//!
//! let mut out = [0.0; 3];
//! assert_eq!(ring.read(&mut out), 3);
//! assert_eq!(out, [0.5, -0.5, 0.25]);
//! ```

pub mod error;
pub mod graph;
pub mod math;
pub mod one_pole;
pub mod procs;
pub mod ring_buffer;
pub mod signal;
pub mod transport;

pub use error::GraphError;
pub use math::{
    db_to_linear, flush_denormal, linear_to_db, log_pitch_to_hz, multiply_in_place, peak, rms,
};
pub use one_pole::OnePole;
pub use ring_buffer::RingBuffer;
pub use signal::Signal;
pub use transport::{TransportInfo, TransportState};
