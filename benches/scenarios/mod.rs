//! Real-world scenario benchmarks.
//!
//! These model the chip under load: every voice sounding, layered zones
//! with modulation routed, and blocks split by dense event streams.

mod engine;
mod voices;

use std::{f32::consts::TAU, sync::Arc};

use saavy_chip::{
    bank::{InstrumentBank, LoopMode, Preset, ProgramId, Sample, Zone, ZoneParams},
    dsp::{EnvelopeParams, LfoParams},
};

pub use engine::bench_engine;
pub use voices::bench_voices;

/// Program 0 plays a looped sine with every modulation routing in use;
/// program 1 stacks the same zone four times.
pub fn bench_bank() -> Arc<InstrumentBank> {
    let data = (0..48_000)
        .map(|i| (TAU * 440.0 * i as f32 / 48_000.0).sin() * 0.5)
        .collect();
    let sample = Arc::new(Sample::new("sine", data, 48_000.0).expect("valid sample"));

    let params = ZoneParams {
        root_key: 69,
        loop_mode: LoopMode::Continuous,
        volume_envelope: EnvelopeParams::adsr(0.01, 0.2, 0.7, 0.3),
        modulation_envelope: EnvelopeParams::adsr(0.0, 0.5, 0.2, 0.3),
        mod_env_to_filter: 2400.0,
        filter_cutoff_hz: 1_500.0,
        filter_resonance: 0.6,
        modulation_lfo: LfoParams {
            delay: 0.0,
            frequency_hz: 3.0,
        },
        mod_lfo_to_filter: 600.0,
        mod_lfo_to_volume: 1.5,
        vibrato_lfo: LfoParams {
            delay: 0.0,
            frequency_hz: 5.5,
        },
        vib_lfo_to_pitch: 15.0,
        reverb_send: 0.3,
        chorus_send: 0.2,
        ..ZoneParams::default()
    };

    let zone = Zone::new(sample).with_params(params);
    let mut layered = Preset::new("layered");
    for _ in 0..4 {
        layered = layered.with_zone(zone.clone());
    }

    Arc::new(
        InstrumentBank::new()
            .with_preset(ProgramId::new(0, 0), Preset::new("sine").with_zone(zone))
            .with_preset(ProgramId::new(0, 1), layered),
    )
}
