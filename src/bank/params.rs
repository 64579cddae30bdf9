#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::{
    filter::{MAX_CUTOFF_HZ, MIN_CUTOFF_HZ},
    units::bounded,
    EnvelopeParams, LfoParams,
};

/// Widest pitch offset a tuning value or modulation depth may carry.
pub const MAX_PITCH_CENTS: f32 = 12_000.0;
/// Widest level offset an attenuation or tremolo depth may carry.
pub const MAX_LEVEL_DB: f32 = 96.0;

/// How a sample's loop region is used.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Play once to the end of the data.
    #[default]
    NoLoop,
    /// Loop for as long as the voice sounds.
    Continuous,
    /// Loop while the key is held, then play through to the end.
    UntilRelease,
}

/// Generator values of one zone: tuning, levels, and the defaults for the
/// voice's envelopes, filter and LFOs.
///
/// Pitch depths are in cents, level depths in decibels.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneParams {
    /// Key at which the sample plays at its recorded pitch.
    pub root_key: u8,
    pub coarse_tune: i8,
    pub fine_tune: f32,
    /// Cents per key away from the root. 100 = chromatic, 0 = fixed pitch.
    pub scale_tuning: f32,
    pub loop_mode: LoopMode,

    pub attenuation_db: f32,
    /// -1.0 (left) to 1.0 (right)
    pub pan: f32,
    pub reverb_send: f32,
    pub chorus_send: f32,

    pub volume_envelope: EnvelopeParams,
    pub modulation_envelope: EnvelopeParams,
    pub mod_env_to_pitch: f32,
    pub mod_env_to_filter: f32,

    pub filter_cutoff_hz: f32,
    /// 0.0 (flat) to 1.0; the filter caps it.
    pub filter_resonance: f32,

    pub modulation_lfo: LfoParams,
    pub mod_lfo_to_pitch: f32,
    pub mod_lfo_to_filter: f32,
    pub mod_lfo_to_volume: f32,

    pub vibrato_lfo: LfoParams,
    pub vib_lfo_to_pitch: f32,
}

impl Default for ZoneParams {
    fn default() -> Self {
        Self {
            root_key: 60,
            coarse_tune: 0,
            fine_tune: 0.0,
            scale_tuning: 100.0,
            loop_mode: LoopMode::NoLoop,
            attenuation_db: 0.0,
            pan: 0.0,
            reverb_send: 0.0,
            chorus_send: 0.0,
            volume_envelope: EnvelopeParams::default(),
            modulation_envelope: EnvelopeParams::default(),
            mod_env_to_pitch: 0.0,
            mod_env_to_filter: 0.0,
            filter_cutoff_hz: MAX_CUTOFF_HZ,
            filter_resonance: 0.0,
            modulation_lfo: LfoParams::default(),
            mod_lfo_to_pitch: 0.0,
            mod_lfo_to_filter: 0.0,
            mod_lfo_to_volume: 0.0,
            vibrato_lfo: LfoParams::default(),
            vib_lfo_to_pitch: 0.0,
        }
    }
}

impl ZoneParams {
    /// Cents between `key` and the sample's recorded pitch, within
    /// `±MAX_PITCH_CENTS`.
    pub fn key_offset_cents(&self, key: u8) -> f32 {
        let cents = (f32::from(key) - f32::from(self.root_key)) * self.scale_tuning
            + f32::from(self.coarse_tune) * 100.0
            + self.fine_tune;
        bounded(cents, 0.0, -MAX_PITCH_CENTS, MAX_PITCH_CENTS)
    }

    /// Every generator clamped to a range the voice chain can run with.
    /// NaN and infinite values fall back to their defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let cents = |value, fallback| bounded(value, fallback, -MAX_PITCH_CENTS, MAX_PITCH_CENTS);
        let db = |value, fallback| bounded(value, fallback, -MAX_LEVEL_DB, MAX_LEVEL_DB);

        Self {
            root_key: self.root_key.min(127),
            coarse_tune: self.coarse_tune.clamp(-120, 120),
            fine_tune: cents(self.fine_tune, d.fine_tune),
            scale_tuning: bounded(self.scale_tuning, d.scale_tuning, 0.0, 1200.0),
            loop_mode: self.loop_mode,

            attenuation_db: bounded(self.attenuation_db, d.attenuation_db, 0.0, MAX_LEVEL_DB),
            pan: bounded(self.pan, d.pan, -1.0, 1.0),
            reverb_send: bounded(self.reverb_send, d.reverb_send, 0.0, 1.0),
            chorus_send: bounded(self.chorus_send, d.chorus_send, 0.0, 1.0),

            volume_envelope: self.volume_envelope.sanitized(),
            modulation_envelope: self.modulation_envelope.sanitized(),
            mod_env_to_pitch: cents(self.mod_env_to_pitch, d.mod_env_to_pitch),
            mod_env_to_filter: cents(self.mod_env_to_filter, d.mod_env_to_filter),

            filter_cutoff_hz: bounded(
                self.filter_cutoff_hz,
                d.filter_cutoff_hz,
                MIN_CUTOFF_HZ,
                MAX_CUTOFF_HZ,
            ),
            filter_resonance: bounded(self.filter_resonance, d.filter_resonance, 0.0, 1.0),

            modulation_lfo: self.modulation_lfo.sanitized(),
            mod_lfo_to_pitch: cents(self.mod_lfo_to_pitch, d.mod_lfo_to_pitch),
            mod_lfo_to_filter: cents(self.mod_lfo_to_filter, d.mod_lfo_to_filter),
            mod_lfo_to_volume: db(self.mod_lfo_to_volume, d.mod_lfo_to_volume),

            vibrato_lfo: self.vibrato_lfo.sanitized(),
            vib_lfo_to_pitch: cents(self.vib_lfo_to_pitch, d.vib_lfo_to_pitch),
        }
    }
}
