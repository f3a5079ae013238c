//! Built-in procs.
//!
//! | class         | inputs     | outputs | params              |
//! |---------------|------------|---------|---------------------|
//! | `sine_osc`    | `pitch`    | `out`   | `frequency`, `gain` |
//! | `gain`        | `in`       | `out`   | `gain`              |
//! | `add`         | `a`, `b`   | `out`   |                     |
//! | `multiply`    | `a`, `b`   | `out`   |                     |
//! | `lowpass`     | `in`       | `out`   | `frequency`         |
//! | `host_phasor` |            | `out`   |                     |
//!
//! `sine_osc` reads `pitch` in octaves relative to `frequency`, so an
//! unconnected pitch input plays `frequency` itself.

mod arith;
mod host_phasor;
mod lowpass;
mod oscillator;

pub use arith::{Add, Gain, Multiply};
pub use host_phasor::HostPhasor;
pub use lowpass::Lowpass;
pub use oscillator::SineOsc;
