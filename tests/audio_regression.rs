mod common;

use common::*;
use saavy_chip::{
    bank::ZoneParams,
    dsp::{EnvelopeParams, EnvelopeStage, LfoParams},
    io::MidiEvent,
    synth::VoiceState,
    ChipEngine, EngineConfig,
};

#[test]
fn renders_silence_without_events() {
    let (mut engine, _sender) = engine(EngineConfig::default());
    let out = render(&mut engine, 4_096, 256);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn identical_history_renders_identical_output() {
    let play = || {
        let (mut engine, mut sender) = engine(EngineConfig::default());
        for (i, key) in [60u8, 64, 67, 72, 76].into_iter().enumerate() {
            let t = i as u64 * 1_337;
            sender.submit(note_on(0, key, 90 + i as u8), t);
            sender.submit(note_off(0, key), t + 9_000);
        }
        sender.submit(MidiEvent::PitchBend { channel: 0, value: 3_000 }, 4_000);
        sender.submit(
            MidiEvent::ControlChange {
                channel: 0,
                controller: 93,
                value: 100,
            },
            0,
        );
        render(&mut engine, 24_000, 256)
    };

    let a = play();
    let b = play();
    assert!(a.iter().any(|&s| s != 0.0));
    assert!(a == b, "output differs between identical runs");
}

#[test]
fn output_does_not_depend_on_block_size() {
    let play = |block: usize| {
        let (mut engine, mut sender) = engine(EngineConfig::default());
        sender.submit(note_on(0, 57, 100), 100);
        sender.submit(note_on(0, 64, 100), 700);
        sender.submit(note_off(0, 57), 3_001);
        render(&mut engine, 8_192, block)
    };

    let small = play(64);
    let large = play(512);
    assert!(small == large, "block size changed the output");
}

#[test]
fn full_chip_with_modulation_stays_finite() {
    let params = ZoneParams {
        volume_envelope: EnvelopeParams::adsr(0.01, 0.1, 0.5, 0.2),
        modulation_envelope: EnvelopeParams::adsr(0.0, 0.3, 0.0, 0.1),
        mod_env_to_pitch: 200.0,
        mod_env_to_filter: 6_000.0,
        filter_cutoff_hz: 300.0,
        filter_resonance: 1.0,
        modulation_lfo: LfoParams {
            delay: 0.0,
            frequency_hz: 12.0,
        },
        mod_lfo_to_filter: 2_400.0,
        mod_lfo_to_volume: 6.0,
        vibrato_lfo: LfoParams {
            delay: 0.05,
            frequency_hz: 7.0,
        },
        vib_lfo_to_pitch: 50.0,
        reverb_send: 1.0,
        chorus_send: 1.0,
        ..ZoneParams::default()
    };
    let (mut engine, mut sender) =
        ChipEngine::new(EngineConfig::default(), sine_bank_with(params)).unwrap();

    for key in 30..70u8 {
        sender.submit(note_on(0, key, 127), u64::from(key) * 10);
    }
    let out = render(&mut engine, 48_000, 512);

    assert!(out.iter().all(|s| s.is_finite()));
    assert!(out.iter().any(|s| s.abs() > 0.01));
}

#[test]
fn instant_envelope_is_at_full_level_after_100_samples() {
    let bank = sine_bank(EnvelopeParams::adsr(0.0, 0.0, 1.0, 0.1));
    let (mut engine, mut sender) = ChipEngine::new(EngineConfig::default(), bank).unwrap();
    sender.submit(note_on(0, 60, 100), 0);

    render(&mut engine, 100, 100);
    let voice = &engine.voice_manager().voices()[0];
    assert_eq!(voice.state(), VoiceState::Active);
    assert_eq!(voice.envelope_level(), 1.0);
}

#[test]
fn reused_voice_starts_from_reset_state_without_click() {
    let config = EngineConfig::default().with_polyphony(1);
    let (mut engine, mut sender) = engine(config);

    // Full volume, dry
    for (controller, value) in [(7, 127), (91, 0)] {
        sender.submit(
            MidiEvent::ControlChange {
                channel: 0,
                controller,
                value,
            },
            0,
        );
    }
    sender.submit(note_on(0, 69, 127), 0);
    sender.submit(note_off(0, 69), 4_000);
    let first = render(&mut engine, 8_000, 256);

    let voice = &engine.voice_manager().voices()[0];
    assert_eq!(voice.state(), VoiceState::Idle);
    assert_eq!(voice.envelope_stage(), EnvelopeStage::Idle);
    assert_eq!(voice.filter().state(), (0.0, 0.0));
    assert_eq!(voice.lfo_phases(), (0.0, 0.0));

    sender.submit(note_on(0, 76, 127), engine.current_sample() + 37);
    let second = render(&mut engine, 4_000, 256);

    let max_jump = |buf: &[f32]| {
        buf.chunks_exact(2)
            .map(|f| f[0])
            .collect::<Vec<_>>()
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .fold(0.0f32, f32::max)
    };
    assert!(max_jump(&first) < 0.02, "click in first note: {}", max_jump(&first));
    assert!(max_jump(&second) < 0.02, "click at reuse: {}", max_jump(&second));
}

#[test]
fn extreme_pitch_depth_renders_in_bounded_time() {
    let params = ZoneParams {
        modulation_envelope: EnvelopeParams::adsr(0.0, 0.0, 1.0, 0.1),
        mod_env_to_pitch: 100_000.0,
        ..ZoneParams::default()
    };
    let (mut engine, mut sender) =
        ChipEngine::new(EngineConfig::default(), sine_bank_with(params)).unwrap();
    sender.submit(note_on(0, 127, 127), 0);

    let out = render(&mut engine, 4_096, 64);
    assert!(out.iter().all(|s| s.is_finite()));
}

#[test]
fn non_finite_generators_never_reach_the_output() {
    let params = ZoneParams {
        volume_envelope: organ(),
        fine_tune: f32::NAN,
        mod_lfo_to_volume: f32::INFINITY,
        reverb_send: 1.0,
        ..ZoneParams::default()
    };
    let (mut engine, mut sender) =
        ChipEngine::new(EngineConfig::default(), sine_bank_with(params)).unwrap();
    sender.submit(note_on(0, 69, 100), 0);
    sender.submit(note_off(0, 69), 100);

    let during = render(&mut engine, 2_000, 256);
    assert!(engine.voice_manager().voices()[0].is_idle());
    let after = render(&mut engine, 48_000, 256);

    assert!(during.iter().chain(after.iter()).all(|s| s.is_finite()));
    assert!(during.iter().any(|&s| s != 0.0));
}
