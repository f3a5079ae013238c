//! CLI subcommands.

pub mod common;
pub mod inspect;
pub mod procs;
pub mod render;
