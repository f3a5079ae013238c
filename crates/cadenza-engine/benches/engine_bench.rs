//! Criterion benchmarks for `DspEngine::process`.
//!
//! Renders a 16-voice sine patch driven by the control adapter at several
//! host block sizes with a fixed 64-frame chunk.
//!
//! Run with: `cargo bench -p cadenza-engine -- engine/`
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use cadenza_core::TransportInfo;
use cadenza_core::graph::{DescNode, GraphDescription};
use cadenza_engine::{CONTROL_INPUTS, ClientIo, DspEngine};
use cadenza_synth::{Event, MAX_VOICES};

const SAMPLE_RATE: f32 = 48000.0;
const CHUNK: usize = 64;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn voice_patch() -> GraphDescription {
    DescNode::graph().child(
        DescNode::container("voice")
            .attr("copies", MAX_VOICES as i64)
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
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/process");
    for &block in BLOCK_SIZES {
        let mut engine = DspEngine::new();
        engine.set_output_channels(1);
        engine.build(&voice_patch(), false, true).unwrap();
        engine.compile().unwrap();
        engine.prepare(SAMPLE_RATE, block, CHUNK).unwrap();

        let chord: Vec<Event> = (0..MAX_VOICES as u32)
            .map(|i| Event::note_on(48 + i, 48.0 + i as f32, 0.5, 0))
            .collect();
        let mut out = vec![0.0; block];
        {
            let mut outputs = [out.as_mut_slice()];
            let mut io = ClientIo::new(&[], &mut outputs);
            engine.process(&mut io, block, &chord, &TransportInfo::default());
        }

        group.throughput(Throughput::Elements(block as u64));
        group.bench_with_input(BenchmarkId::from_parameter(block), &block, |b, &block| {
            b.iter(|| {
                let mut outputs = [out.as_mut_slice()];
                let mut io = ClientIo::new(&[], &mut outputs);
                engine.process(&mut io, block, &[], &TransportInfo::default());
                black_box(&out);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_process);
criterion_main!(benches);
