//! saavy-chip - plays a short phrase through the default output device
//!
//! Run with: cargo run --bin saavy-chip

mod bank;

use std::{sync::Arc, time::Duration};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use saavy_chip::{io::MidiEvent, ChipEngine, EngineConfig, EventSender, MAX_BLOCK_SIZE};

const BPM: f64 = 112.0;

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| eyre!("no default output device available"))?;
    let config = device
        .default_output_config()
        .wrap_err("failed to fetch default output config")?;

    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    tracing::info!(sample_rate, channels, "output device ready");

    let engine_config = EngineConfig::default().with_sample_rate(sample_rate);
    let (mut engine, mut sender) = ChipEngine::new(engine_config, Arc::new(bank::demo_bank()?))?;

    let end = schedule_phrase(&mut sender, f64::from(sample_rate));

    let mut scratch = vec![0.0f32; MAX_BLOCK_SIZE * 2];
    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _| {
            // Render stereo blocks and spread them over the device channels
            for out in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                let frames = out.len() / channels;
                let block = &mut scratch[..frames * 2];
                engine.process(block);

                for (frame, stereo) in out.chunks_exact_mut(channels).zip(block.chunks_exact(2)) {
                    for (ch, sample) in frame.iter_mut().enumerate() {
                        *sample = match ch {
                            0 => stereo[0],
                            1 => stereo[1],
                            _ => 0.0,
                        };
                    }
                }
            }
        },
        |err| tracing::error!(%err, "audio stream error"),
        None,
    )?;

    stream.play()?;
    tracing::info!(seconds = end as f64 / f64::from(sample_rate), "playing");

    while sender.engine_time() < end {
        std::thread::sleep(Duration::from_millis(100));
        sender.report();
    }

    let totals = sender.diagnostics();
    tracing::info!(?totals, "done");
    Ok(())
}

/// Queue the whole phrase up front. Returns the sample time the last
/// release tail has died away by.
fn schedule_phrase(sender: &mut EventSender, sample_rate: f64) -> u64 {
    let beat = sample_rate * 60.0 / BPM;
    let at = |beats: f64| (beats * beat).round() as u64;

    let lead = 0;
    let drums = 9;

    sender.submit(
        MidiEvent::ProgramChange {
            channel: lead,
            program: bank::LEAD,
        },
        0,
    );
    sender.submit(
        MidiEvent::ControlChange {
            channel: lead,
            controller: 93,
            value: 70,
        },
        0,
    );

    let melody: [(f64, u8, f64); 8] = [
        (0.0, 60, 0.5),
        (0.5, 63, 0.5),
        (1.0, 67, 1.0),
        (2.0, 65, 0.5),
        (2.5, 63, 0.5),
        (3.0, 62, 0.75),
        (3.75, 58, 0.25),
        (4.0, 60, 2.0),
    ];
    for (start, key, length) in melody {
        sender.submit(
            MidiEvent::NoteOn {
                channel: lead,
                key,
                velocity: 100,
            },
            at(start),
        );
        sender.submit(
            MidiEvent::NoteOff {
                channel: lead,
                key,
                velocity: 0,
            },
            at(start + length),
        );
    }

    // Bend the last note up a whole tone and back
    for step in 0..=16u8 {
        let value = i16::from(step) * 512 - 1;
        sender.submit(
            MidiEvent::PitchBend {
                channel: lead,
                value: value.max(0),
            },
            at(4.5 + f64::from(step) / 32.0),
        );
    }
    sender.submit(MidiEvent::PitchBend { channel: lead, value: 0 }, at(5.5));

    for beat in 0..12 {
        let time = at(f64::from(beat) * 0.5);
        sender.submit(
            MidiEvent::NoteOn {
                channel: drums,
                key: if beat % 2 == 0 { bank::KICK } else { bank::HAT },
                velocity: 110,
            },
            time,
        );
    }

    at(8.0)
}
