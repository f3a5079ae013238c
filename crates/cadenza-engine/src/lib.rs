//! Real-time processing engine for cadenza signal graphs.
//!
//! This crate provides:
//!
//! - **[`DspEngine`]**: builds a graph from a description, compiles and
//!   prepares it, then runs it in fixed-size chunks under any host block
//!   size, with a smoothed master volume and per-chunk event forwarding
//! - **Published signals**: named taps on node outputs, read back between
//!   `process` calls
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for offline renders
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadenza_engine::{ClientIo, DspEngine};
//!
//! let mut engine = DspEngine::new();
//! engine.build(&description, false, true)?;
//! engine.compile()?;
//! engine.prepare(48000.0, 512, 64)?;
//!
//! let mut left = vec![0.0; 512];
//! let mut right = vec![0.0; 512];
//! let mut outputs = [left.as_mut_slice(), right.as_mut_slice()];
//! let mut io = ClientIo::new(&[], &mut outputs);
//! engine.process(&mut io, 512, &events, &transport);
//! ```

mod client_io;
mod engine;
pub mod published;
mod stats;
mod wav;

pub use client_io::ClientIo;
pub use engine::{
    CONTROL_INPUTS, DspEngine, EngineStage, HOST_PHASOR, MASTER_VOLUME_SLEW_HZ,
};
pub use published::{PublishedSignal, PublishedSignals};
pub use stats::EngineStats;
pub use wav::{WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for engine file I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Channel buffers disagree in length.
    #[error("channel {channel} has {got} frames, expected {expected}")]
    ChannelLength {
        /// Offending channel index.
        channel: usize,
        /// Frames in that channel.
        got: usize,
        /// Frames in channel 0.
        expected: usize,
    },

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for engine file I/O.
pub type Result<T> = std::result::Result<T, Error>;
