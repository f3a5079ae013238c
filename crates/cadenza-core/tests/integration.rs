//! Integration tests for cadenza-core.
//!
//! Builds graphs from description trees with the built-in procs, compiles and
//! runs them, and checks the rendered signals: oscillator pitch tracking,
//! summing at shared inputs, enable/disable, and cycle rejection.

use cadenza_core::graph::{
    BuildContext, DescNode, GraphBuilder, PrepareContext, Proc, ProcFactory, ProcessingGraph,
};
use cadenza_core::procs::{Add, Gain, HostPhasor, Lowpass, Multiply, SineOsc};
use cadenza_core::{GraphError, Signal, TransportInfo, TransportState, rms};

const SAMPLE_RATE: f32 = 48000.0;
const VECTOR: usize = 64;

/// Factory over the built-in procs.
struct Builtins;

impl ProcFactory for Builtins {
    fn create(&self, class: &str, ctx: &BuildContext) -> Option<Box<dyn Proc>> {
        let proc: Box<dyn Proc> = match class {
            "sine_osc" => Box::new(SineOsc::new(ctx.sample_rate)),
            "gain" => Box::new(Gain::default()),
            "add" => Box::new(Add),
            "multiply" => Box::new(Multiply),
            "lowpass" => Box::new(Lowpass::new(ctx.sample_rate)),
            "host_phasor" => Box::new(HostPhasor::new(ctx.sample_rate)),
            _ => return None,
        };
        Some(proc)
    }
}

fn compile(desc: &DescNode, inputs: usize, outputs: usize) -> Result<ProcessingGraph, GraphError> {
    let mut graph = ProcessingGraph::new(inputs, outputs);
    GraphBuilder::new(&Builtins, BuildContext::default()).build(desc, &mut graph)?;
    graph.compile()?;
    graph.prepare(&PrepareContext {
        sample_rate: SAMPLE_RATE,
        vector_size: VECTOR,
        host_block_size: 512,
    })?;
    Ok(graph)
}

/// Render `vectors` vectors of host output channel 0.
fn render(graph: &mut ProcessingGraph, host: &Signal, vectors: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(vectors * VECTOR);
    for _ in 0..vectors {
        graph.process_chunk(host);
        out.extend_from_slice(graph.host_output(0));
    }
    out
}

/// Count positive-going zero crossings.
fn rising_crossings(samples: &[f32]) -> usize {
    samples
        .windows(2)
        .filter(|w| w[0] <= 0.0 && w[1] > 0.0)
        .count()
}

#[test]
fn sine_frequency_follows_parameter() {
    let desc = DescNode::graph()
        .child(DescNode::proc("sine_osc", "osc").attr("frequency", 750.0))
        .child(DescNode::connect("osc", "outputs"));
    let mut graph = compile(&desc, 0, 1).unwrap();

    // 750 vectors of 64 = one second
    let out = render(&mut graph, &Signal::default(), 750);
    let crossings = rising_crossings(&out);
    assert!((749..=751).contains(&crossings), "got {crossings}");
    assert!((rms(&out) - core::f32::consts::FRAC_1_SQRT_2).abs() < 0.01);
}

#[test]
fn pitch_input_from_host_raises_octave() {
    let desc = DescNode::graph()
        .child(DescNode::proc("sine_osc", "osc").attr("frequency", 375.0))
        .child(DescNode::connect("inputs", "osc").attr("input", "pitch"))
        .child(DescNode::connect("osc", "outputs"));
    let mut graph = compile(&desc, 1, 1).unwrap();

    let mut host = Signal::new(1, VECTOR);
    host.row_mut(0).fill(1.0);
    let out = render(&mut graph, &host, 750);
    let crossings = rising_crossings(&out);
    assert!((749..=751).contains(&crossings), "got {crossings}");
}

#[test]
fn copied_voices_sum_into_one_output() {
    let desc = DescNode::graph().child(
        DescNode::container("voices")
            .attr("copies", 4_i64)
            .child(DescNode::proc("gain", "amp").attr("gain", 0.25))
            .child(DescNode::connect("inputs", "amp"))
            .child(DescNode::connect("amp", "outputs")),
    );
    let mut graph = compile(&desc, 1, 1).unwrap();
    assert_eq!(graph.nodes_matching("voices/*/amp").len(), 4);

    let mut host = Signal::new(1, VECTOR);
    host.row_mut(0).fill(0.8);
    graph.process_chunk(&host);
    for &s in graph.host_output(0) {
        assert!((s - 0.8).abs() < 1e-6);
    }
}

#[test]
fn disabling_a_branch_removes_its_contribution() {
    let desc = DescNode::graph()
        .child(DescNode::proc("gain", "dry").attr("gain", 1.0))
        .child(
            DescNode::proc("gain", "wet")
                .attr("gain", 2.0)
                .attr("enabled", false),
        )
        .child(DescNode::connect("inputs", "dry"))
        .child(DescNode::connect("inputs", "wet"))
        .child(DescNode::connect("dry", "outputs"))
        .child(DescNode::connect("wet", "outputs"));
    let mut graph = compile(&desc, 1, 1).unwrap();

    let mut host = Signal::new(1, VECTOR);
    host.row_mut(0).fill(1.0);
    graph.process_chunk(&host);
    assert_eq!(graph.host_output(0)[0], 1.0);

    let wet = graph.node_by_path("wet").unwrap();
    graph.set_enabled(wet, true);
    graph.process_chunk(&host);
    assert_eq!(graph.host_output(0)[0], 3.0);
}

#[test]
fn ring_modulation_through_multiply() {
    let desc = DescNode::graph()
        .child(DescNode::proc("multiply", "vca"))
        .child(DescNode::connect("inputs", "vca").attr("input", "a"))
        .child(
            DescNode::connect("inputs", "vca")
                .attr("output", 2_i64)
                .attr("input", "b"),
        )
        .child(DescNode::connect("vca", "outputs"));
    let mut graph = compile(&desc, 2, 1).unwrap();

    let mut host = Signal::new(2, VECTOR);
    host.row_mut(0).fill(0.5);
    host.row_mut(1).fill(-0.5);
    graph.process_chunk(&host);
    assert_eq!(graph.host_output(0)[VECTOR - 1], -0.25);
}

#[test]
fn feedback_loop_is_a_cycle() {
    let desc = DescNode::graph()
        .child(DescNode::proc("lowpass", "a"))
        .child(DescNode::proc("lowpass", "b"))
        .child(DescNode::proc("gain", "c"))
        .child(DescNode::connect("a", "b"))
        .child(DescNode::connect("b", "c"))
        .child(DescNode::connect("c", "a"));
    assert_eq!(compile(&desc, 0, 1).err(), Some(GraphError::Cycle(3)));
}

#[test]
fn phasor_tracks_transport() {
    let desc = DescNode::graph()
        .child(DescNode::proc("host_phasor", "clock"))
        .child(DescNode::connect("clock", "outputs"));
    let mut graph = compile(&desc, 0, 1).unwrap();
    let clock = graph.node_by_path("clock").unwrap();

    // 120 BPM at 48 kHz: 24000 samples per beat
    let transport = TransportInfo::new(0.0, 0.5, 120.0, TransportState::Playing);
    graph
        .proc_as::<HostPhasor>(clock)
        .unwrap()
        .set_transport(transport);
    graph.process_chunk(&Signal::default());
    let out = graph.host_output(0);
    assert!((out[0] - 0.5).abs() < 1e-6);
    assert!((out[1] - out[0] - 1.0 / 24000.0).abs() < 1e-6);
}
