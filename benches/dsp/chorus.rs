//! Benchmarks for the stereo chorus.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_chip::dsp::chorus::StereoChorus;

use crate::BLOCK_SIZES;

pub fn bench_chorus(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/chorus");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.07).sin() * 0.5).collect();

        let mut chorus = StereoChorus::new(48_000.0, 0.8, 2.0, 15.0, 0.2);
        group.bench_with_input(BenchmarkId::new("process", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    let (l, r) = chorus.process(black_box(sample));
                    sum += l + r;
                }
                sum
            })
        });
    }

    group.finish();
}
