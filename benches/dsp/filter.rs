//! Benchmarks for the bounded resonant low-pass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_chip::dsp::filter::LowPassFilter;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let sample_rate = 48_000.0;

    for &size in BLOCK_SIZES {
        // Generate a test signal (sawtooth-like ramp)
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        // Fixed coefficients
        let mut filter = LowPassFilter::new(sample_rate);
        filter.set_params(1_000.0, 0.5, sample_rate);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                filter.render(black_box(&mut buffer));
            })
        });

        // Coefficients recomputed every 16 samples, as the voice chain does
        let mut filter = LowPassFilter::new(sample_rate);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("swept", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                for (i, block) in buffer.chunks_mut(16).enumerate() {
                    let cutoff = 400.0 + (i as f32 * 0.3).sin().abs() * 4_000.0;
                    filter.set_params(black_box(cutoff), 0.7, sample_rate);
                    filter.render(block);
                }
            })
        });
    }

    group.finish();
}
