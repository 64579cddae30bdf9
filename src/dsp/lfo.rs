//! Low Frequency Oscillator (LFO) for per-voice modulation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::units::bounded;

/*
Low Frequency Oscillators
=========================

Each voice carries two of these. The modulation LFO can reach pitch, filter
cutoff and volume (tremolo); the vibrato LFO reaches pitch only. Both are
triangle waves, as on the hardware.

Vocabulary
----------

  control-rate    Frequencies below human hearing: ~0.01 Hz to ~20 Hz.

  bipolar         Output swings positive AND negative: -1.0 to +1.0.
                  Vibrato goes sharp and flat, tremolo louder and softer.

  delay           Time after note-on before the LFO starts moving. Output
                  holds at 0.0 until then, so notes start on pitch and
                  vibrato fades in naturally.

  phase           Position within one cycle, 0.0 to 1.0.


Shape
-----

    +1 ┤    ╱╲
     0 ┼───╱──╲──────╱──
    -1 ┤        ╲  ╱
             ╲╱
       0   .25  .5  .75  1.0  phase

The triangle starts at zero heading up, so a note-on never introduces a
pitch or volume jump. The LFO is synced: every note-on resets phase to zero.
*/

pub const MAX_LFO_HZ: f32 = 50.0;
const MAX_LFO_DELAY: f32 = 20.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoParams {
    /// Seconds before the LFO starts.
    pub delay: f32,
    pub frequency_hz: f32,
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            delay: 0.0,
            frequency_hz: 8.0,
        }
    }
}

impl LfoParams {
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            delay: bounded(self.delay, d.delay, 0.0, MAX_LFO_DELAY),
            frequency_hz: bounded(self.frequency_hz, d.frequency_hz, 0.0, MAX_LFO_HZ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lfo {
    phase: f32,
    increment: f32,
    delay_samples: u32,
    elapsed: u32,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Lfo {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            increment: 0.0,
            delay_samples: 0,
            elapsed: 0,
        }
    }

    /// Restart at phase zero with new timing.
    pub fn trigger(&mut self, params: &LfoParams, sample_rate: f32) {
        let frequency = if params.frequency_hz.is_finite() {
            params.frequency_hz.clamp(0.0, MAX_LFO_HZ)
        } else {
            0.0
        };
        self.increment = frequency / sample_rate;
        self.delay_samples = (params.delay.max(0.0) * sample_rate).round() as u32;
        self.elapsed = 0;
        self.phase = 0.0;
    }

    /// Advance one sample and return the bipolar output.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.elapsed < self.delay_samples {
            self.elapsed += 1;
            return 0.0;
        }

        let out = triangle(self.phase);
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

/// Bipolar triangle, zero at phase 0 heading upward.
#[inline]
fn triangle(phase: f32) -> f32 {
    let shifted = (phase + 0.25).fract();
    1.0 - 4.0 * (shifted - 0.5).abs()
}
