//! Graph file inspection command.

use crate::commands::common::build_engine;
use cadenza_config::GraphFile;
use cadenza_core::graph::{Connection, ProcessingGraph, SignalDest, SignalSource, TriggerMode};
use cadenza_engine::DspEngine;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;

#[derive(Args)]
pub struct InspectArgs {
    /// Graph file (TOML)
    #[arg(value_name = "GRAPH")]
    graph: PathBuf,

    /// Print machine-readable JSON instead of a listing
    #[arg(long)]
    json: bool,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let file = GraphFile::load(&args.graph)?;
    let engine = build_engine(&file)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&file, &engine))?);
        return Ok(());
    }

    let graph = engine.graph();
    let cfg = &file.engine;
    println!("{}", args.graph.display());
    println!(
        "  {} Hz, block {}, chunk {}, {} in / {} out, polyphony {}",
        cfg.sample_rate,
        cfg.block_size,
        cfg.chunk_size,
        cfg.input_channels,
        cfg.output_channels,
        engine.polyphony()
    );

    println!("\nNodes ({}):", graph.node_count());
    for node in graph.nodes() {
        let state = if node.enabled { "" } else { " (disabled)" };
        println!("  {:24} {:16}{}", node.path, node.class, state);
        if !node.inputs.is_empty() {
            println!("    in:  {}", node.inputs.join(", "));
        }
        if !node.outputs.is_empty() {
            println!("    out: {}", summarize(node.outputs));
        }
    }

    println!("\nConnections ({}):", graph.connections().len());
    for conn in graph.connections() {
        let (from, to) = describe(graph, conn);
        println!("  {from} -> {to}");
    }

    if let Some(schedule) = graph.schedule() {
        println!("\nSchedule: {} steps", schedule.step_count());
    }

    let published = engine.published();
    if !published.names().is_empty() {
        println!("\nPublished signals:");
        for alias in published.names() {
            if let Some(signal) = published.get(alias) {
                println!(
                    "  {:16} {} voice(s), {} samples, frame {}, {}",
                    alias,
                    signal.buffers().len(),
                    signal.length(),
                    signal.frame_size(),
                    mode_name(signal.mode())
                );
            }
        }
    }

    Ok(())
}

fn to_json(file: &GraphFile, engine: &DspEngine) -> serde_json::Value {
    let graph = engine.graph();
    let cfg = &file.engine;
    let nodes: Vec<_> = graph
        .nodes()
        .map(|n| {
            json!({
                "path": n.path,
                "class": n.class,
                "enabled": n.enabled,
                "inputs": n.inputs,
                "outputs": n.outputs,
            })
        })
        .collect();
    let connections: Vec<_> = graph
        .connections()
        .iter()
        .map(|c| {
            let (from, to) = describe(graph, c);
            json!({ "from": from, "to": to })
        })
        .collect();
    let published: Vec<_> = engine
        .published()
        .names()
        .into_iter()
        .filter_map(|alias| engine.published().get(alias))
        .map(|s| {
            json!({
                "alias": s.alias(),
                "sources": s.buffers().iter().map(|b| b.path()).collect::<Vec<_>>(),
                "length": s.length(),
                "frame_size": s.frame_size(),
                "mode": mode_name(s.mode()),
            })
        })
        .collect();

    json!({
        "engine": {
            "sample_rate": cfg.sample_rate,
            "block_size": cfg.block_size,
            "chunk_size": cfg.chunk_size,
            "input_channels": cfg.input_channels,
            "output_channels": cfg.output_channels,
            "polyphony": engine.polyphony(),
        },
        "nodes": nodes,
        "connections": connections,
        "schedule_steps": graph.schedule().map(|s| s.step_count()),
        "published": published,
    })
}

/// Endpoints of a connection as `path.port` strings.
fn describe(graph: &ProcessingGraph, conn: &Connection) -> (String, String) {
    let from = match conn.source {
        SignalSource::HostInput(ch) => format!("inputs.{}", ch + 1),
        SignalSource::Node { node, port } => graph.node(node).map_or_else(
            || node.to_string(),
            |v| format!("{}.{}", v.path, port_name(v.outputs, port)),
        ),
    };
    let to = match conn.dest {
        SignalDest::HostOutput(ch) => format!("outputs.{}", ch + 1),
        SignalDest::Node { node, port } => graph.node(node).map_or_else(
            || node.to_string(),
            |v| format!("{}.{}", v.path, port_name(v.inputs, port)),
        ),
    };
    (from, to)
}

fn port_name(ports: &[String], port: usize) -> &str {
    ports.get(port).map_or("?", String::as_str)
}

fn summarize(ports: &[String]) -> String {
    const SHOWN: usize = 9;
    if ports.len() <= SHOWN {
        ports.join(", ")
    } else {
        format!(
            "{}, ... ({} total)",
            ports[..SHOWN].join(", "),
            ports.len()
        )
    }
}

fn mode_name(mode: TriggerMode) -> &'static str {
    match mode {
        TriggerMode::MostRecent => "most_recent",
        TriggerMode::NoTrash => "no_trash",
    }
}
