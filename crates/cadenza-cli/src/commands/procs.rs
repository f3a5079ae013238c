//! Proc class listing and information command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use cadenza_core::graph::BuildContext;
use cadenza_registry::{ProcCategory, ProcRegistry};
use clap::Args;

const CATEGORIES: [ProcCategory; 4] = [
    ProcCategory::Source,
    ProcCategory::Control,
    ProcCategory::Arithmetic,
    ProcCategory::Filter,
];

#[derive(Args)]
pub struct ProcsArgs {
    /// Show ports and parameters for a specific class
    #[arg(value_name = "CLASS")]
    class: Option<String>,

    /// Voices to assume for classes with per-voice ports
    #[arg(long, default_value = "2")]
    voices: usize,
}

pub fn run(args: ProcsArgs) -> anyhow::Result<()> {
    let registry = ProcRegistry::new();

    let Some(class) = &args.class else {
        println!("Available Procs");
        println!("===============");
        for category in CATEGORIES {
            let procs = registry.procs_in_category(category);
            if procs.is_empty() {
                continue;
            }
            println!();
            println!("{} - {}", category.name(), category.description());
            for p in procs {
                println!("  {:18} - {}", p.id, p.description);
            }
        }
        println!();
        println!("Use 'cadenza procs <class>' for ports and parameters.");
        return Ok(());
    };

    let descriptor = registry
        .get(class)
        .ok_or_else(|| anyhow::anyhow!("Unknown proc class: {}", class))?;
    let ctx = BuildContext {
        max_voices: args.voices.max(1),
        ..BuildContext::default()
    };
    let iface = registry
        .interface(descriptor.id, &ctx)
        .ok_or_else(|| anyhow::anyhow!("Cannot instantiate: {}", class))?;

    println!("{} ({})", descriptor.name, descriptor.id);
    println!("{}", "=".repeat(descriptor.name.len() + descriptor.id.len() + 3));
    println!();
    println!("{}", descriptor.description);
    println!();
    println!("Inputs:  {}", list_or_none(&iface.inputs));
    println!("Outputs: {}", list_or_none(&iface.outputs));

    if !iface.params.is_empty() {
        println!();
        println!("Parameters:");
        println!();
        println!("  {:12}  {}", "Name", "Default");
        println!("  {:12}  {}", "----", "-------");
        for param in iface.params {
            println!("  {:12}  {}", param.name, param.default);
        }
    }

    Ok(())
}

fn list_or_none(ports: &[String]) -> String {
    if ports.is_empty() {
        "(none)".to_owned()
    } else {
        ports.join(", ")
    }
}
