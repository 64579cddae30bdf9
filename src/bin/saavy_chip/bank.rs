//! A tiny synthesized instrument bank for the demo.

use std::{f32::consts::TAU, sync::Arc};

use saavy_chip::{
    bank::{InstrumentBank, LoopMode, Preset, ProgramId, Sample, Zone, ZoneParams, PERCUSSION_BANK},
    dsp::{EnvelopeParams, LfoParams},
    error::BankError,
};

pub const LEAD: u8 = 80;
pub const KICK: u8 = 36;
pub const HAT: u8 = 42;

const RATE: f32 = 44_100.0;

pub fn demo_bank() -> Result<InstrumentBank, BankError> {
    Ok(InstrumentBank::new()
        .with_preset(ProgramId::new(0, LEAD), lead()?)
        .with_preset(ProgramId::new(PERCUSSION_BANK, 0), drums()?))
}

/// One band-limited square cycle, looped.
fn lead() -> Result<Preset, BankError> {
    let period = 100;
    let data = (0..period)
        .map(|i| {
            let phase = TAU * i as f32 / period as f32;
            (1..12)
                .step_by(2)
                .map(|h| (phase * h as f32).sin() / h as f32)
                .sum::<f32>()
                * 0.6
        })
        .collect();
    let sample = Sample::new("square", data, RATE)?;

    // 441 Hz at the root; tune down to A440
    let params = ZoneParams {
        root_key: 69,
        fine_tune: -3.93,
        loop_mode: LoopMode::Continuous,
        volume_envelope: EnvelopeParams::adsr(0.005, 0.3, 0.6, 0.25),
        modulation_envelope: EnvelopeParams::adsr(0.0, 0.4, 0.0, 0.2),
        mod_env_to_filter: 2400.0,
        filter_cutoff_hz: 1_200.0,
        filter_resonance: 0.4,
        vibrato_lfo: LfoParams {
            delay: 0.3,
            frequency_hz: 5.5,
        },
        vib_lfo_to_pitch: 12.0,
        ..ZoneParams::default()
    };

    Ok(Preset::new("square lead").with_zone(Zone::new(Arc::new(sample)).with_params(params)))
}

fn drums() -> Result<Preset, BankError> {
    let kick: Vec<f32> = (0..8_000)
        .map(|i| {
            let t = i as f32 / RATE;
            let sweep = 50.0 + 120.0 * (-t * 40.0).exp();
            (TAU * sweep * t).sin() * (-t * 12.0).exp()
        })
        .collect();

    let mut noise = 0x1234_5678u32;
    let hat: Vec<f32> = (0..3_000)
        .map(|i| {
            noise ^= noise << 13;
            noise ^= noise >> 17;
            noise ^= noise << 5;
            let white = noise as f32 / u32::MAX as f32 * 2.0 - 1.0;
            white * (-(i as f32) / 400.0).exp() * 0.4
        })
        .collect();

    let one_shot = |root_key, pan| ZoneParams {
        root_key,
        pan,
        volume_envelope: EnvelopeParams::adsr(0.0, 0.0, 1.0, 0.05),
        ..ZoneParams::default()
    };

    Ok(Preset::new("drums")
        .with_zone(
            Zone::new(Arc::new(Sample::new("kick", kick, RATE)?))
                .with_keys(KICK, KICK)
                .with_params(one_shot(KICK, 0.0)),
        )
        .with_zone(
            Zone::new(Arc::new(Sample::new("hat", hat, RATE)?))
                .with_keys(HAT, HAT)
                .with_params(ZoneParams {
                    filter_cutoff_hz: 8_000.0,
                    ..one_shot(HAT, 0.3)
                }),
        ))
}
