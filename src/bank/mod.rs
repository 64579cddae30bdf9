//! In-memory instrument model the voices play from.
//!
//! A parser for some bank file format (out of scope here) builds
//! [`Sample`]s, groups them into [`Zone`]s with generator values, and
//! collects zones into [`Preset`]s addressed by [`ProgramId`]. The engine
//! only sees the [`SampleStore`] trait, so any container can back it.
//!
//! Sample data is shared through `Arc`: a voice holds a reference for as
//! long as it plays, the store owns the rest of the lifetime.

mod params;

use std::{collections::HashMap, sync::Arc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use params::{LoopMode, ZoneParams, MAX_LEVEL_DB, MAX_PITCH_CENTS};

use crate::error::BankError;

/// Bank used by the percussion channel by default.
pub const PERCUSSION_BANK: u16 = 128;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProgramId {
    pub bank: u16,
    pub program: u8,
}

impl ProgramId {
    pub const fn new(bank: u16, program: u8) -> Self {
        Self { bank, program }
    }
}

/// Mono PCM data plus its loop region.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    name: String,
    data: Box<[f32]>,
    sample_rate: f32,
    loop_start: usize,
    loop_end: usize,
}

impl Sample {
    /// The loop region defaults to the whole sample.
    pub fn new(
        name: impl Into<String>,
        data: Vec<f32>,
        sample_rate: f32,
    ) -> Result<Self, BankError> {
        let name = name.into();
        if data.is_empty() {
            return Err(BankError::EmptySample(name));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(BankError::InvalidSampleRate {
                name,
                rate: sample_rate,
            });
        }

        let len = data.len();
        Ok(Self {
            name,
            data: data.into_boxed_slice(),
            sample_rate,
            loop_start: 0,
            loop_end: len,
        })
    }

    /// Set the loop to frames `start..end`.
    pub fn with_loop(mut self, start: usize, end: usize) -> Result<Self, BankError> {
        if start >= end || end > self.data.len() {
            return Err(BankError::InvalidLoop {
                name: self.name,
                start,
                end,
                len: self.data.len(),
            });
        }
        self.loop_start = start;
        self.loop_end = end;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn loop_start(&self) -> usize {
        self.loop_start
    }

    pub fn loop_end(&self) -> usize {
        self.loop_end
    }
}

/// Inclusive range of MIDI key or velocity values.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub low: u8,
    pub high: u8,
}

impl KeyRange {
    pub const FULL: KeyRange = KeyRange { low: 0, high: 127 };

    pub const fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        self.low <= value && value <= self.high
    }
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::FULL
    }
}

/// A sample bound to a key/velocity region with its generator values.
#[derive(Debug, Clone)]
pub struct Zone {
    pub sample: Arc<Sample>,
    pub keys: KeyRange,
    pub velocities: KeyRange,
    pub params: ZoneParams,
}

impl Zone {
    pub fn new(sample: Arc<Sample>) -> Self {
        Self {
            sample,
            keys: KeyRange::FULL,
            velocities: KeyRange::FULL,
            params: ZoneParams::default(),
        }
    }

    pub fn with_keys(mut self, low: u8, high: u8) -> Self {
        self.keys = KeyRange::new(low, high);
        self
    }

    pub fn with_velocities(mut self, low: u8, high: u8) -> Self {
        self.velocities = KeyRange::new(low, high);
        self
    }

    /// Out-of-range generators are clamped, see [`ZoneParams::sanitized`].
    pub fn with_params(mut self, params: ZoneParams) -> Self {
        self.params = params.sanitized();
        self
    }

    #[inline]
    pub fn matches(&self, key: u8, velocity: u8) -> bool {
        self.keys.contains(key) && self.velocities.contains(velocity)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Preset {
    name: String,
    zones: Vec<Zone>,
}

impl Preset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zones: Vec::new(),
        }
    }

    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zones.push(zone);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Zones that sound for `key` at `velocity`, in declaration order.
    pub fn zones_for(&self, key: u8, velocity: u8) -> impl Iterator<Item = &Zone> + '_ {
        self.zones.iter().filter(move |z| z.matches(key, velocity))
    }
}

/// Lookup the voice layer uses on every note-on and program change.
///
/// Implementations are called from the audio thread and must not block
/// or allocate inside `preset`.
pub trait SampleStore: Send + Sync {
    fn preset(&self, program: ProgramId) -> Option<&Preset>;

    fn contains(&self, program: ProgramId) -> bool {
        self.preset(program).is_some()
    }
}

/// Hash-map backed [`SampleStore`].
#[derive(Debug, Default)]
pub struct InstrumentBank {
    presets: HashMap<ProgramId, Preset>,
}

impl InstrumentBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, program: ProgramId, preset: Preset) -> Option<Preset> {
        tracing::debug!(
            bank = program.bank,
            program = program.program,
            name = preset.name(),
            zones = preset.zones().len(),
            "preset registered"
        );
        self.presets.insert(program, preset)
    }

    pub fn with_preset(mut self, program: ProgramId, preset: Preset) -> Self {
        self.insert(program, preset);
        self
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl SampleStore for InstrumentBank {
    fn preset(&self, program: ProgramId) -> Option<&Preset> {
        self.presets.get(&program)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_samples() {
        assert_eq!(
            Sample::new("empty", vec![], 44_100.0),
            Err(BankError::EmptySample("empty".into()))
        );
        assert!(matches!(
            Sample::new("rate", vec![0.0; 4], 0.0),
            Err(BankError::InvalidSampleRate { .. })
        ));
    }

    #[test]
    fn loop_must_fit_inside_data() {
        let sample = Sample::new("s", vec![0.0; 100], 44_100.0).unwrap();
        assert_eq!(sample.loop_start(), 0);
        assert_eq!(sample.loop_end(), 100);

        assert!(sample.clone().with_loop(10, 101).is_err());
        assert!(sample.clone().with_loop(50, 50).is_err());

        let looped = sample.with_loop(10, 90).unwrap();
        assert_eq!((looped.loop_start(), looped.loop_end()), (10, 90));
    }

    #[test]
    fn zones_filter_by_key_and_velocity() {
        let sample = Arc::new(Sample::new("s", vec![0.0; 8], 44_100.0).unwrap());
        let preset = Preset::new("split")
            .with_zone(Zone::new(sample.clone()).with_keys(0, 59))
            .with_zone(Zone::new(sample.clone()).with_keys(60, 127).with_velocities(0, 63))
            .with_zone(Zone::new(sample).with_keys(60, 127).with_velocities(64, 127));

        assert_eq!(preset.zones_for(40, 100).count(), 1);
        assert_eq!(preset.zones_for(72, 30).count(), 1);
        let loud: Vec<_> = preset.zones_for(72, 100).collect();
        assert_eq!(loud.len(), 1);
        assert_eq!(loud[0].velocities, KeyRange::new(64, 127));
    }

    #[test]
    fn bank_lookup_by_program() {
        let bank = testing::sine_bank(Default::default());
        assert!(bank.contains(ProgramId::new(0, 0)));
        assert!(!bank.contains(ProgramId::new(0, 1)));
        assert!(!bank.contains(ProgramId::new(PERCUSSION_BANK, 0)));
        assert_eq!(bank.len(), 1);
    }
}
