//! Benchmarks for the DAHDSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_chip::dsp::{envelope::Envelope, EnvelopeParams};

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let sample_rate = 48_000.0;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (linear ramp)
        let mut env = Envelope::new(sample_rate);
        env.trigger(&EnvelopeParams::adsr(10.0, 0.1, 0.7, 0.3));
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Decay phase (exponential)
        let mut env = Envelope::new(sample_rate);
        env.trigger(&EnvelopeParams::adsr(0.0, 30.0, 0.0, 0.3));
        group.bench_with_input(BenchmarkId::new("decay", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Sustain phase (holding steady)
        let mut env = Envelope::new(sample_rate);
        env.trigger(&EnvelopeParams::adsr(0.001, 0.001, 0.7, 0.3));
        // Advance past attack/decay
        for _ in 0..200 {
            env.next_sample();
        }
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
