//! Benchmarks for the complete engine: scheduling, voices and effects.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_chip::{io::MidiEvent, ChipEngine, EngineConfig, CHIP_VOICES};

use crate::{scenarios::bench_bank, BLOCK_SIZES};

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut out = vec![0.0f32; size * 2];

        // Every voice held, effects running
        let (mut engine, mut sender) =
            ChipEngine::new(EngineConfig::default(), bench_bank()).expect("valid config");
        for i in 0..CHIP_VOICES {
            sender.submit(
                MidiEvent::NoteOn {
                    channel: (i % 8) as u8,
                    key: 40 + i as u8,
                    velocity: 100,
                },
                0,
            );
        }
        engine.process(&mut out);

        group.bench_with_input(BenchmarkId::new("full_chip", size), &size, |b, _| {
            b.iter(|| {
                engine.process(black_box(&mut out));
            })
        });

        // 16 events per block: constant stealing and block splitting
        let (mut engine, mut sender) =
            ChipEngine::new(EngineConfig::default(), bench_bank()).expect("valid config");
        let mut key = 0u8;
        group.bench_with_input(BenchmarkId::new("event_storm", size), &size, |b, _| {
            b.iter(|| {
                let now = engine.current_sample();
                for i in 0..16u64 {
                    key = (key + 7) % 96;
                    sender.submit(
                        MidiEvent::NoteOn {
                            channel: 0,
                            key: 24 + key,
                            velocity: 90,
                        },
                        now + i * size as u64 / 16,
                    );
                }
                engine.process(black_box(&mut out));
            })
        });
    }

    group.finish();
}
