use thiserror::Error;

use crate::bank::ProgramId;

/// Rejected engine configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("polyphony must be between 1 and {max}, got {got}")]
    InvalidPolyphony { got: usize, max: usize },

    #[error("event queue capacity must be non-zero")]
    ZeroQueueCapacity,

    #[error("pitch bend range must be within 0..=24 semitones, got {0}")]
    InvalidBendRange(f32),

    #[error("`{name}` must be finite and within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

/// Rejected instrument data. Raised while a bank is being built, never
/// during playback.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BankError {
    #[error("sample `{0}` has no frames")]
    EmptySample(String),

    #[error("sample `{name}` has invalid sample rate {rate}")]
    InvalidSampleRate { name: String, rate: f32 },

    #[error("sample `{name}` loop {start}..{end} does not fit in {len} frames")]
    InvalidLoop {
        name: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Why a note-on or program change was ignored.
///
/// Small and `Copy` so the audio thread can produce it without allocating.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NoteError {
    #[error("instrument not found: bank {}, program {}", .program.bank, .program.program)]
    InstrumentNotFound { program: ProgramId },

    #[error("no zone of bank {}, program {} covers key {key} at velocity {velocity}", .program.bank, .program.program)]
    NoMatchingZone {
        program: ProgramId,
        key: u8,
        velocity: u8,
    },
}

/// Errors from the fallible constructors of the crate.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bank(#[from] BankError),
}

pub type Result<T, E = SynthError> = std::result::Result<T, E>;
