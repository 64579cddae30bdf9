//! Low-level DSP primitives used by the voice chain and the global effects.
//!
//! These components are allocation-free and realtime-safe once built,
//! making them safe to embed directly inside voice structs. They stay
//! focused on the signal-processing math; lifecycle and routing live in
//! `synth` and `engine`.

/// Stereo modulated-delay chorus.
pub mod chorus;
/// Fixed-length circular delay line with fractional reads.
pub mod delay;
/// Delay/attack/hold/decay/sustain/release envelope generator.
pub mod envelope;
/// Bounded resonant low-pass filter.
pub mod filter;
/// 4-point sample interpolation.
pub mod interpolate;
/// Triangle LFO with start delay.
pub mod lfo;
/// Summing and equal-power panning.
pub mod mix;
/// Stereo Schroeder reverb.
pub mod reverb;
/// Cents, decibels and MIDI-value conversions.
pub mod units;

pub use envelope::{EnvelopeParams, EnvelopeStage};
pub use lfo::LfoParams;
