//! Engine configuration.
//!
//! Everything here is read once at construction. Nothing in the block loop
//! consults the config again, so changing it means building a new engine.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, CHIP_VOICES, MAX_POLYPHONY};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Size of the voice pool. The chip has 32; smaller pools are useful in tests.
    pub polyphony: usize,
    /// Events held between the control thread and the audio thread.
    pub queue_capacity: usize,
    /// Initial pitch-bend range for every channel (RPN 0 can change it).
    pub bend_range_semitones: f32,
    /// Length of the ramp a stolen voice fades through before it is reused.
    pub steal_release_ms: f32,
    pub master_gain: f32,
    pub reverb: ReverbConfig,
    pub chorus: ChorusConfig,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbConfig {
    /// 0.0 = small room, 1.0 = large hall
    pub room_size: f32,
    /// 0.0 = bright, 1.0 = dark
    pub damping: f32,
    /// Stereo spread of the return (0.0 = mono)
    pub width: f32,
    pub return_level: f32,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChorusConfig {
    pub rate_hz: f32,
    pub depth_ms: f32,
    pub base_delay_ms: f32,
    pub feedback: f32,
    pub return_level: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            polyphony: CHIP_VOICES,
            queue_capacity: 1024,
            bend_range_semitones: 2.0,
            steal_release_ms: 3.0,
            master_gain: 0.5,
            reverb: ReverbConfig::default(),
            chorus: ChorusConfig::default(),
        }
    }
}

impl Default for ReverbConfig {
    fn default() -> Self {
        Self {
            room_size: 0.5,
            damping: 0.5,
            width: 1.0,
            return_level: 0.6,
        }
    }
}

impl Default for ChorusConfig {
    fn default() -> Self {
        Self {
            rate_hz: 0.8,
            depth_ms: 2.0,
            base_delay_ms: 15.0,
            feedback: 0.2,
            return_level: 0.6,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_polyphony(mut self, polyphony: usize) -> Self {
        self.polyphony = polyphony;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_bend_range(mut self, semitones: f32) -> Self {
        self.bend_range_semitones = semitones;
        self
    }

    pub fn with_reverb(mut self, reverb: ReverbConfig) -> Self {
        self.reverb = reverb;
        self
    }

    pub fn with_chorus(mut self, chorus: ChorusConfig) -> Self {
        self.chorus = chorus;
        self
    }

    /// Steal ramp length in samples, never less than one.
    pub fn steal_release_samples(&self) -> u32 {
        (self.steal_release_ms * 0.001 * self.sample_rate).round().max(1.0) as u32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.polyphony == 0 || self.polyphony > MAX_POLYPHONY {
            return Err(ConfigError::InvalidPolyphony {
                got: self.polyphony,
                max: MAX_POLYPHONY,
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if !(0.0..=24.0).contains(&self.bend_range_semitones) {
            return Err(ConfigError::InvalidBendRange(self.bend_range_semitones));
        }

        check("steal_release_ms", self.steal_release_ms, 0.0, 100.0)?;
        check("master_gain", self.master_gain, 0.0, 4.0)?;
        check("reverb.room_size", self.reverb.room_size, 0.0, 1.0)?;
        check("reverb.damping", self.reverb.damping, 0.0, 1.0)?;
        check("reverb.width", self.reverb.width, 0.0, 1.0)?;
        check("reverb.return_level", self.reverb.return_level, 0.0, 4.0)?;
        check("chorus.rate_hz", self.chorus.rate_hz, 0.0, 10.0)?;
        check("chorus.depth_ms", self.chorus.depth_ms, 0.0, 10.0)?;
        check("chorus.base_delay_ms", self.chorus.base_delay_ms, 1.0, 50.0)?;
        check("chorus.feedback", self.chorus.feedback, 0.0, 0.95)?;
        check("chorus.return_level", self.chorus.return_level, 0.0, 4.0)?;
        Ok(())
    }
}

fn check(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    // NaN fails the range test as well
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}
