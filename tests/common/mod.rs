#![allow(dead_code)]

use std::{f32::consts::TAU, sync::Arc};

use saavy_chip::{
    bank::{InstrumentBank, LoopMode, Preset, ProgramId, Sample, Zone, ZoneParams},
    dsp::EnvelopeParams,
    io::MidiEvent,
    ChipEngine, EngineConfig, EventSender,
};

pub const SAMPLE_RATE: f32 = 48_000.0;

/// Looped 440 Hz sine on program 0, rooted at A4.
pub fn sine_bank(volume_envelope: EnvelopeParams) -> Arc<InstrumentBank> {
    sine_bank_with(ZoneParams {
        volume_envelope,
        ..ZoneParams::default()
    })
}

pub fn sine_bank_with(params: ZoneParams) -> Arc<InstrumentBank> {
    let data = (0..48_000)
        .map(|i| (TAU * 440.0 * i as f32 / SAMPLE_RATE).sin() * 0.5)
        .collect();
    let sample = Arc::new(Sample::new("sine", data, SAMPLE_RATE).unwrap());
    let params = ZoneParams {
        root_key: 69,
        loop_mode: LoopMode::Continuous,
        ..params
    };
    let preset = Preset::new("sine").with_zone(Zone::new(sample).with_params(params));
    Arc::new(InstrumentBank::new().with_preset(ProgramId::new(0, 0), preset))
}

/// Instant attack, full sustain, short release.
pub fn organ() -> EnvelopeParams {
    EnvelopeParams::adsr(0.0, 0.0, 1.0, 0.01)
}

pub fn engine(config: EngineConfig) -> (ChipEngine, EventSender) {
    ChipEngine::new(config, sine_bank(organ())).unwrap()
}

pub fn note_on(channel: u8, key: u8, velocity: u8) -> MidiEvent {
    MidiEvent::NoteOn {
        channel,
        key,
        velocity,
    }
}

pub fn note_off(channel: u8, key: u8) -> MidiEvent {
    MidiEvent::NoteOff {
        channel,
        key,
        velocity: 0,
    }
}

/// Render `frames` of interleaved stereo in blocks of `block` frames.
pub fn render(engine: &mut ChipEngine, frames: usize, block: usize) -> Vec<f32> {
    let mut out = vec![0.0; frames * 2];
    for chunk in out.chunks_mut(block * 2) {
        engine.process(chunk);
    }
    out
}
