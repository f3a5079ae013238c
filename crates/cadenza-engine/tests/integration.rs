//! Integration tests for the cadenza engine: chunking, master volume, event
//! forwarding, published signals and WAV output of a render.

use cadenza_core::graph::{DescNode, GraphDescription};
use cadenza_core::{GraphError, OnePole, Signal, TransportInfo, TransportState};
use cadenza_engine::{
    CONTROL_INPUTS, ClientIo, DspEngine, MASTER_VOLUME_SLEW_HZ, WavSpec, read_wav, write_wav,
};
use cadenza_synth::Event;
use tempfile::NamedTempFile;

const SR: f32 = 48000.0;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn engine_for(desc: &GraphDescription, inputs: usize, outputs: usize) -> DspEngine {
    let mut engine = DspEngine::new();
    engine.set_input_channels(inputs);
    engine.set_output_channels(outputs);
    engine.build(desc, inputs > 0, true).unwrap();
    engine.compile().unwrap();
    engine
}

fn passthrough() -> GraphDescription {
    DescNode::graph().child(DescNode::connect("inputs", "outputs"))
}

/// Run one block of constant input through a mono engine.
fn run_mono(engine: &mut DspEngine, input: f32, frames: usize, events: &[Event]) -> Vec<f32> {
    let src = vec![input; frames];
    let inputs = [src.as_slice()];
    let mut out = vec![0.0; frames];
    {
        let mut outputs = [out.as_mut_slice()];
        let mut io = ClientIo::new(&inputs, &mut outputs);
        engine.process(&mut io, frames, events, &TransportInfo::default());
    }
    out
}

/// Expected master volume `n` samples after prepare with the target at 1.
fn volume_at(n: usize) -> f32 {
    let mut filter = OnePole::new(SR, MASTER_VOLUME_SLEW_HZ);
    let mut v = 0.0;
    for _ in 0..=n {
        v = filter.process(1.0);
    }
    v
}

// ---------------------------------------------------------------------------
// Chunking and master volume
// ---------------------------------------------------------------------------

#[test]
fn master_volume_follows_one_pole_after_one_chunk() {
    let mut engine = engine_for(&passthrough(), 1, 1);
    engine.prepare(SR, 512, 64).unwrap();
    engine.set_master_volume(1.0);

    let out = run_mono(&mut engine, 1.0, 512, &[]);

    assert!(out[..64].iter().all(|&s| s == 0.0), "first chunk is latency");
    let c = (-2.0 * std::f64::consts::PI * f64::from(MASTER_VOLUME_SLEW_HZ) / f64::from(SR)).exp();
    for n in 0..448 {
        let expected = 1.0 - c.powi(n as i32 + 1);
        let got = f64::from(out[64 + n]);
        assert!(
            (got - expected).abs() < 1e-4,
            "sample {}: expected {expected}, got {got}",
            64 + n
        );
    }
}

#[test]
fn odd_host_blocks_keep_one_chunk_latency() {
    let mut engine = engine_for(&passthrough(), 1, 1);
    engine.prepare(SR, 512, 64).unwrap();

    let mut rendered = Vec::new();
    for frames in [100, 37, 400, 1, 250] {
        rendered.extend(run_mono(&mut engine, 1.0, frames, &[]));
    }
    assert_eq!(engine.underruns(), 0);
    assert!(rendered[..64].iter().all(|&s| s == 0.0));
    for (k, &s) in rendered.iter().enumerate().skip(64) {
        assert!((s - volume_at(k - 64)).abs() < 1e-6, "frame {k}");
    }
}

#[test]
fn steady_blocks_off_the_chunk_grid_lose_nothing() {
    let mut engine = engine_for(&passthrough(), 1, 1);
    engine.prepare(SR, 100, 64).unwrap();

    let mut rendered = Vec::new();
    for _ in 0..6 {
        rendered.extend(run_mono(&mut engine, 1.0, 100, &[]));
    }
    assert_eq!(engine.underruns(), 0);
    assert!(rendered[..64].iter().all(|&s| s == 0.0));
    for (k, &s) in rendered.iter().enumerate().skip(64) {
        assert!((s - volume_at(k - 64)).abs() < 1e-6, "frame {k}: {s}");
    }
}

#[test]
fn short_input_buffer_is_padded_with_silence() {
    let mut engine = engine_for(&passthrough(), 1, 1);
    engine.prepare(SR, 128, 64).unwrap();

    let src = vec![1.0; 32];
    let inputs = [src.as_slice()];
    let mut first = vec![0.0; 128];
    {
        let mut outputs = [first.as_mut_slice()];
        let mut io = ClientIo::new(&inputs, &mut outputs);
        engine.process(&mut io, 128, &[], &TransportInfo::default());
    }
    let second = run_mono(&mut engine, 0.0, 128, &[]);

    assert_eq!(engine.underruns(), 0);
    assert!(first[64..96].iter().all(|&s| s > 0.0));
    assert!(first[96..].iter().all(|&s| s == 0.0));
    assert!(second[..64].iter().all(|&s| s == 0.0));
}

#[test]
fn zero_volume_silences_output() {
    let mut engine = engine_for(&passthrough(), 1, 1);
    engine.prepare(SR, 256, 64).unwrap();
    engine.set_master_volume(0.0);
    let out = run_mono(&mut engine, 1.0, 256, &[]);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn missing_output_buffers_are_skipped() {
    let mut engine = engine_for(&passthrough(), 1, 2);
    engine.prepare(SR, 128, 64).unwrap();
    let src = vec![1.0; 128];
    let inputs = [src.as_slice()];
    let mut left = vec![9.0; 128];
    let mut outputs = [left.as_mut_slice()];
    let mut io = ClientIo::new(&inputs, &mut outputs);
    engine.process(&mut io, 128, &[], &TransportInfo::default());
    assert_eq!(engine.underruns(), 0);
    assert_eq!(left[0], 0.0);
}

// ---------------------------------------------------------------------------
// Build errors
// ---------------------------------------------------------------------------

#[test]
fn audio_input_must_be_requested() {
    let mut engine = DspEngine::new();
    engine.set_input_channels(1);
    engine.set_output_channels(1);
    let err = engine.build(&passthrough(), false, true).unwrap_err();
    assert!(matches!(err, GraphError::MissingTarget(_)), "got {err:?}");
}

#[test]
fn unresolved_published_signal_fails_build() {
    let desc = DescNode::graph().child(DescNode::signal("nowhere/*", "out", "taps"));
    let mut engine = DspEngine::new();
    let err = engine.build(&desc, false, true).unwrap_err();
    assert!(matches!(err, GraphError::MissingTarget(_)), "got {err:?}");
}

#[test]
fn cyclic_graph_fails_compile() {
    let desc = DescNode::graph()
        .child(DescNode::proc("gain", "a"))
        .child(DescNode::proc("gain", "b"))
        .child(DescNode::connect("a", "b"))
        .child(DescNode::connect("b", "a"));
    let mut engine = DspEngine::new();
    engine.build(&desc, false, true).unwrap();
    assert!(matches!(engine.compile(), Err(GraphError::Cycle(_))));
    assert!(!engine.is_prepared());
}

// ---------------------------------------------------------------------------
// Event forwarding and published signals
// ---------------------------------------------------------------------------

fn velocity_tap() -> GraphDescription {
    DescNode::graph().child(
        DescNode::signal(CONTROL_INPUTS, "velocity_1", "vel")
            .attr("mode", "no_trash")
            .attr("length", 512_i64),
    )
}

#[test]
fn events_are_retimed_to_their_chunk() {
    let mut engine = engine_for(&velocity_tap(), 0, 1);
    engine.prepare(SR, 512, 64).unwrap();
    run_mono(&mut engine, 0.0, 128, &[Event::note_on(60, 60.0, 0.8, 70)]);

    let mut out = Signal::new(1, 128);
    assert_eq!(engine.read_published_signal("vel", &mut out), 128);
    let vel = out.row(0);
    assert_eq!(vel[69], 0.0);
    assert_eq!(vel[70], 0.8);
    assert_eq!(vel[127], 0.8);
}

#[test]
fn events_past_the_last_chunk_are_not_delivered() {
    let mut engine = engine_for(&velocity_tap(), 0, 1);
    engine.prepare(SR, 512, 64).unwrap();
    run_mono(&mut engine, 0.0, 100, &[Event::note_on(60, 60.0, 0.8, 90)]);

    let mut out = Signal::new(1, 64);
    assert_eq!(engine.read_published_signal("vel", &mut out), 64);
    assert!(out.row(0).iter().all(|&v| v == 0.0));
}

#[test]
fn full_control_queue_counts_drops() {
    let mut engine = engine_for(&DescNode::graph(), 0, 1);
    engine.prepare(SR, 512, 64).unwrap();
    let events: Vec<_> = (0..600).map(|_| Event::controller(1, 0.5, 0)).collect();
    run_mono(&mut engine, 0.0, 64, &events);
    assert_eq!(engine.dropped_events(), 88);
}

const VOICES: &str = "voices";

fn voice_graph() -> GraphDescription {
    DescNode::graph()
        .child(
            DescNode::container("voice")
                .attr("copies", 2_i64)
                .child(DescNode::proc("sine_osc", "osc"))
                .child(DescNode::proc("multiply", "vca"))
                .child(
                    DescNode::connect(CONTROL_INPUTS, "osc")
                        .attr("output", "pitch_{copy}")
                        .attr("input", "pitch"),
                )
                .child(DescNode::connect("osc", "vca").attr("input", "a"))
                .child(
                    DescNode::connect(CONTROL_INPUTS, "vca")
                        .attr("output", "velocity_{copy}")
                        .attr("input", "b"),
                )
                .child(DescNode::connect("vca", "outputs")),
        )
        .child(DescNode::signal("voice/*/vca", "out", VOICES).attr("length", 256_i64))
}

#[test]
fn wildcard_publishes_every_voice() {
    let mut engine = engine_for(&voice_graph(), 0, 1);
    engine.set_polyphony(2);
    engine.prepare(SR, 512, 64).unwrap();

    assert_eq!(engine.published_signal_names(), [VOICES]);
    assert_eq!(engine.published_signal_voices(VOICES), 2);
    assert_eq!(engine.published_signal_buffer_size(VOICES), 256);

    let out = run_mono(&mut engine, 0.0, 512, &[Event::note_on(69, 69.0, 1.0, 0)]);
    assert!(out.iter().skip(64).any(|&s| s.abs() > 1e-4), "note is audible");

    let mut taps = Signal::new(2, 128);
    assert_eq!(engine.read_published_signal(VOICES, &mut taps), 128);
    assert!(taps.row(0).iter().any(|&s| s.abs() > 1e-4));
    assert!(taps.row(1).iter().all(|&s| s == 0.0), "second voice idle");

    assert!(engine.set_node_enabled("voice/1/vca", false));
    assert_eq!(engine.published_signal_voices_enabled(VOICES), 1);
    assert_eq!(engine.read_published_signal("unknown", &mut taps), 0);
}

#[test]
fn phasor_follows_transport() {
    let desc = DescNode::graph().child(
        DescNode::signal("host_phasor", "out", "beat")
            .attr("mode", "no_trash")
            .attr("length", 256_i64),
    );
    let mut engine = engine_for(&desc, 0, 1);
    engine.prepare(SR, 256, 64).unwrap();

    let transport = TransportInfo::new(0.0, 0.25, 120.0, TransportState::Playing);
    let mut out = vec![0.0; 128];
    {
        let mut outputs = [out.as_mut_slice()];
        let mut io = ClientIo::new(&[], &mut outputs);
        engine.process(&mut io, 128, &[], &transport);
    }

    let mut beat = Signal::new(1, 128);
    assert_eq!(engine.read_published_signal("beat", &mut beat), 128);
    let row = beat.row(0);
    let step = 120.0 / 60.0 / SR;
    assert!((row[0] - 0.25).abs() < 1e-6);
    // second chunk continues where the first left off
    assert!((row[64] - (0.25 + 64.0 * step)).abs() < 1e-5);
    assert!(row.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn stats_report_once_per_second() {
    let mut engine = engine_for(&passthrough(), 1, 1);
    engine.prepare(SR, 512, 64).unwrap();
    engine.set_collect_stats(true);
    for _ in 0..94 {
        run_mono(&mut engine, 0.5, 512, &[]);
    }
    assert_eq!(engine.stats().reports(), 1);
}

// ---------------------------------------------------------------------------
// Rendering to disk
// ---------------------------------------------------------------------------

#[test]
fn rendered_block_survives_wav_roundtrip() {
    let mut engine = engine_for(&passthrough(), 1, 1);
    engine.prepare(SR, 512, 64).unwrap();
    let out = run_mono(&mut engine, 0.25, 512, &[]);

    let file = NamedTempFile::new().unwrap();
    let spec = WavSpec {
        channels: 1,
        sample_rate: SR as u32,
        bits_per_sample: 32,
    };
    write_wav(file.path(), &[out.clone()], spec).unwrap();
    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
    assert_eq!(loaded_spec.channels, 1);
    assert_eq!(loaded[0], out);
}
