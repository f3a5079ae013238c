//! Cadenza CLI - offline renders and graph inspection.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadenza")]
#[command(author, version, about = "Cadenza signal graph CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a graph file, driven by an event score, to a WAV file
    Render(commands::render::RenderArgs),

    /// Build a graph file and show its nodes, connections and published signals
    Inspect(commands::inspect::InspectArgs),

    /// List available proc classes and their ports
    Procs(commands::procs::ProcsArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Inspect(args) => commands::inspect::run(args),
        Commands::Procs(args) => commands::procs::run(args),
    }
}
