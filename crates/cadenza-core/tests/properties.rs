//! Property-based tests for cadenza-core buffers and filters.
//!
//! Tests ring buffer integrity under arbitrary transfer patterns and one-pole
//! stability using proptest for randomized input generation.

use proptest::prelude::*;
use cadenza_core::{OnePole, RingBuffer};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Writing K <= capacity samples and reading K back returns exactly the
    /// same bits, whatever the read/write positions were beforehand.
    #[test]
    fn ring_round_trip_is_bit_identical(
        capacity in 1usize..512,
        pre in 0usize..512,
        data in prop::collection::vec(any::<f32>(), 0..512),
    ) {
        let mut ring = RingBuffer::with_capacity(capacity);
        // move the cursors to an arbitrary offset first
        let pre = pre % capacity;
        ring.write_silence(pre);
        ring.discard(pre);

        let k = data.len().min(capacity);
        prop_assert_eq!(ring.write(&data[..k]), k);
        let mut out = vec![0.0f32; k];
        prop_assert_eq!(ring.read(&mut out), k);
        for (a, b) in data[..k].iter().zip(out.iter()) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
        prop_assert!(ring.is_empty());
    }

    /// Arbitrary interleaved writes and reads never lose count: the readable
    /// total always equals written minus read, bounded by capacity.
    #[test]
    fn ring_accounting(
        capacity in 1usize..64,
        ops in prop::collection::vec((any::<bool>(), 0usize..80), 1..100),
    ) {
        let mut ring = RingBuffer::with_capacity(capacity);
        let mut scratch = vec![0.0f32; 80];
        let mut expected = 0usize;
        for (is_write, n) in ops {
            if is_write {
                let moved = ring.write(&scratch[..n]);
                prop_assert_eq!(moved, n.min(capacity - expected));
                expected += moved;
            } else {
                let moved = ring.read(&mut scratch[..n]);
                prop_assert_eq!(moved, n.min(expected));
                expected -= moved;
            }
            prop_assert_eq!(ring.remaining(), expected);
            prop_assert_eq!(ring.space(), capacity - expected);
        }
    }

    /// For any cutoff and bounded input, the one-pole stays bounded by the
    /// input's peak.
    #[test]
    fn one_pole_is_bounded(
        freq in 1.0f32..20000.0f32,
        input in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let mut lp = OnePole::new(48000.0, freq);
        for _ in 0..32 {
            for &x in &input {
                let y = lp.process(x);
                prop_assert!(y.is_finite());
                prop_assert!(y.abs() <= 1.0 + 1e-5);
            }
        }
    }
}
