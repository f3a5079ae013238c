//! Criterion benchmarks for cadenza-synth
//!
//! Run with: cargo bench -p cadenza-synth

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use cadenza_synth::{Event, EventsToSignals, MAX_VOICES};

const SAMPLE_RATE: f32 = 48000.0;
const VECTOR_SIZES: &[usize] = &[16, 64, 256];

// ============================================================================
// Converter benchmarks
// ============================================================================

fn bench_idle_vector(c: &mut Criterion) {
    let mut group = c.benchmark_group("Converter_idle");

    for &frames in VECTOR_SIZES {
        let mut conv = EventsToSignals::new(SAMPLE_RATE);
        conv.set_vector_size(frames).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, _| {
            b.iter(|| {
                conv.process();
                black_box(conv.voice(0).row(1)[0])
            })
        });
    }

    group.finish();
}

fn bench_note_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("Converter_churn");

    for &frames in VECTOR_SIZES {
        let mut conv = EventsToSignals::new(SAMPLE_RATE);
        conv.set_vector_size(frames).unwrap();
        conv.set_polyphony(MAX_VOICES / 2);
        let mut note = 0_u32;

        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, &n| {
            b.iter(|| {
                // more notes than voices, so half of these steal
                for i in 0..MAX_VOICES {
                    note = (note + 7) % 48;
                    let creator = 36 + note;
                    let _ = conv.add_event(Event::note_on(creator, creator as f32, 0.8, i % n));
                }
                conv.add_event(Event::pitch_wheel(0.1, 0)).unwrap();
                conv.add_event(Event::controller(123, 0.0, n - 1)).unwrap();
                conv.process();
                black_box(conv.active_voices())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_idle_vector, bench_note_churn);
criterion_main!(benches);
