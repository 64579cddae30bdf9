//! A realtime-safe, sample-accurate synthesis core modelled on a fixed
//! 32-voice sample-playback chip.
//!
//! The crate is split the same way the signal flows:
//!
//! ```text
//! EventSender ──rtrb──→ Scheduler ──→ VoiceManager ──→ Voice × N ──→ Mixer ──→ out
//!   (control thread)      (audio thread, once per block)              reverb/chorus
//! ```
//!
//! `dsp` holds the allocation-free primitives, `synth` the voice pool and
//! per-voice chain, `engine` the block loop, and `bank` the in-memory
//! instrument model the voice layer plays from.

pub mod bank;
pub mod config;
pub mod diagnostics;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod io; // MIDI wire format
pub mod synth; // Voice management and polyphony

pub use config::EngineConfig;
pub use engine::{ChipEngine, EventSender};
pub use error::{NoteError, SynthError};

/// Largest block rendered in one pass. Host buffers above this are chunked.
pub const MAX_BLOCK_SIZE: usize = 2048;
/// Voice count of the emulated chip.
pub const CHIP_VOICES: usize = 32;
/// Upper bound accepted for `EngineConfig::polyphony`.
pub const MAX_POLYPHONY: usize = 256;
/// Zones a single note-on may layer onto one voice.
pub const MAX_LAYERS: usize = 4;
pub const MIDI_CHANNELS: usize = 16;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
