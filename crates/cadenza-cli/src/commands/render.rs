//! Offline render of a graph file to WAV.

use crate::commands::common::{ParamOverride, build_engine, parse_param};
use cadenza_config::{GraphFile, ScheduledEvent, Score};
use cadenza_core::{TransportInfo, TransportState, linear_to_db, peak, rms};
use cadenza_engine::{ClientIo, WavSpec, read_wav, write_wav};
use cadenza_synth::Event;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Graph file (TOML)
    #[arg(value_name = "GRAPH")]
    graph: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Event score (TOML)
    #[arg(short, long)]
    score: Option<PathBuf>,

    /// WAV file fed to the host inputs
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Render length in seconds (default: score or input length plus tail)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Seconds rendered after the last score event
    #[arg(long, default_value = "1.0")]
    tail: f64,

    /// Override the sample rate
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Override the host block size
    #[arg(long)]
    block_size: Option<usize>,

    /// Override the graph chunk size
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Transport tempo for the host phasor
    #[arg(long, default_value = "120")]
    bpm: f64,

    /// Parameter overrides (e.g., "voice/1/osc:gain=0.5")
    #[arg(long, value_parser = parse_param, number_of_values = 1)]
    param: Vec<ParamOverride>,

    /// Log engine load once per second of audio
    #[arg(long)]
    stats: bool,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    println!("Loading {}...", args.graph.display());
    let mut file = GraphFile::load(&args.graph)?;
    if let Some(sr) = args.sample_rate {
        file.engine.sample_rate = sr;
    }
    if let Some(block) = args.block_size {
        file.engine.block_size = block;
    }
    if let Some(chunk) = args.chunk_size {
        file.engine.chunk_size = chunk;
    }
    if args.stats {
        file.engine.collect_stats = true;
    }

    let input = match &args.input {
        Some(path) => {
            let (channels, spec) = read_wav(path)?;
            if spec.sample_rate != file.engine.sample_rate {
                tracing::warn!(
                    "{} is {} Hz, rendering at {} Hz without resampling",
                    path.display(),
                    spec.sample_rate,
                    file.engine.sample_rate
                );
            }
            file.engine.audio_input = true;
            if file.engine.input_channels == 0 {
                file.engine.input_channels = channels.len();
            }
            Some(channels)
        }
        None => None,
    };
    file.engine.validate()?;

    let cfg = file.engine.clone();
    let sample_rate = cfg.sample_rate_hz();
    let block = cfg.block_size;

    let mut engine = build_engine(&file)?;
    for p in &args.param {
        if !engine.set_param(&p.path, &p.name, p.value) {
            anyhow::bail!("No parameter '{}' on '{}'", p.name, p.path);
        }
    }
    engine.prepare(sample_rate, block, cfg.chunk_size)?;

    let score = match &args.score {
        Some(path) => Score::load(path)?,
        None => Score::default(),
    };
    let events = score.schedule(sample_rate)?;

    let total = render_length(&args, &score, input.as_deref(), sample_rate, cfg.chunk_size)?;
    println!(
        "  {} frames, {} Hz, {} -> {} channels, block {}, chunk {}, {} events",
        total,
        cfg.sample_rate,
        cfg.input_channels,
        cfg.output_channels,
        block,
        cfg.chunk_size,
        events.len()
    );

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut rendered = vec![Vec::with_capacity(total); cfg.output_channels];
    let mut in_block = vec![vec![0.0; block]; cfg.input_channels];
    let mut out_block = vec![vec![0.0; block]; cfg.output_channels];
    let mut block_events: Vec<Event> = Vec::new();
    let mut pending = events.iter().peekable();
    let mut transport = TransportInfo::new(0.0, 0.0, args.bpm, TransportState::Playing);

    let mut pos = 0;
    while pos < total {
        let frames = block.min(total - pos);

        block_events.clear();
        while let Some(ScheduledEvent { frame, event }) =
            pending.next_if(|s| s.frame < (pos + frames) as u64)
        {
            let offset = frame.saturating_sub(pos as u64) as usize;
            block_events.push(event.at(offset));
        }

        for (ch, dst) in in_block.iter_mut().enumerate() {
            dst.fill(0.0);
            let src = input.as_ref().and_then(|i| i.get(ch));
            if let Some(src) = src.filter(|s| s.len() > pos) {
                let n = frames.min(src.len() - pos);
                dst[..n].copy_from_slice(&src[pos..pos + n]);
            }
        }

        {
            let inputs: Vec<&[f32]> = in_block.iter().map(|c| &c[..frames]).collect();
            let mut outputs: Vec<&mut [f32]> =
                out_block.iter_mut().map(|c| &mut c[..frames]).collect();
            let mut io = ClientIo::new(&inputs, &mut outputs);
            engine.process(&mut io, frames, &block_events, &transport);
        }
        for (dst, src) in rendered.iter_mut().zip(&out_block) {
            dst.extend_from_slice(&src[..frames]);
        }

        transport = transport.advanced_by(frames, sample_rate);
        pos += frames;
        pb.set_position(pos as u64);
    }
    pb.finish_with_message("done");

    println!("\nStats:");
    for (ch, samples) in rendered.iter().enumerate() {
        println!(
            "  Channel {}: RMS {:.1} dB, Peak {:.1} dB",
            ch + 1,
            linear_to_db(rms(samples)),
            linear_to_db(peak(samples))
        );
    }
    if engine.dropped_events() > 0 {
        println!("  {} events dropped (queue full)", engine.dropped_events());
    }
    if engine.underruns() > 0 {
        println!("  {} output underruns", engine.underruns());
    }

    let spec = WavSpec {
        channels: cfg.output_channels as u16,
        sample_rate: cfg.sample_rate,
        bits_per_sample: args.bit_depth,
    };
    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &rendered, spec)?;
    println!("Done!");

    Ok(())
}

/// Frames to render: the explicit duration, else the longer of the score
/// plus tail and the input plus one chunk of latency.
fn render_length(
    args: &RenderArgs,
    score: &Score,
    input: Option<&[Vec<f32>]>,
    sample_rate: f32,
    chunk: usize,
) -> anyhow::Result<usize> {
    let to_frames = |secs: f64| (secs.max(0.0) * f64::from(sample_rate)).round() as usize;
    if let Some(d) = args.duration {
        return Ok(to_frames(d));
    }
    let from_score = (!score.is_empty()).then(|| to_frames(score.duration_seconds() + args.tail));
    let from_input = input
        .and_then(|chs| chs.iter().map(Vec::len).max())
        .map(|n| n + chunk);
    match from_score.max(from_input) {
        Some(n) => Ok(n),
        None => anyhow::bail!("Nothing to render: pass --duration, --score or --input"),
    }
}
