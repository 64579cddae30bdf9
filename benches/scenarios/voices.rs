//! Benchmarks for the voice pool.
//!
//! Renders the voice manager alone (no effects, no scheduling) with a
//! growing number of sounding voices.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use saavy_chip::{
    diagnostics::Diagnostics,
    synth::{VoiceBus, VoiceManager},
    EngineConfig, CHIP_VOICES,
};

use crate::{scenarios::bench_bank, BLOCK_SIZES};

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let config = EngineConfig::default();

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];
        let mut reverb = vec![0.0f32; size];
        let mut chorus = vec![0.0f32; size];

        for (name, program, count) in [
            ("single", 0, 1),
            ("eight", 0, 8),
            ("full_chip", 0, CHIP_VOICES),
            ("full_chip_layered", 1, CHIP_VOICES),
        ] {
            let mut manager = VoiceManager::new(&config, bench_bank(), Arc::new(Diagnostics::new()));
            let _ = manager.program_change(0, program);
            for i in 0..count {
                let _ = manager.note_on(0, 36 + i as u8, 100, 0);
            }

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    let mut bus = VoiceBus {
                        left: &mut left,
                        right: &mut right,
                        reverb: &mut reverb,
                        chorus: &mut chorus,
                    };
                    manager.render(black_box(&mut bus));
                })
            });
        }
    }

    group.finish();
}
