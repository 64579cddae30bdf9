#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::units::bounded, MIN_TIME};

/*
DAHDSR Envelope Implementation
==============================

The chip drives every voice with two of these: one for amplitude and one
for modulation (pitch and filter cutoff). Both run the same state machine.

Vocabulary
----------

  level       The envelope's current output value (0.0 to 1.0).

  stage       Which phase of the envelope we're in. Six timed stages plus
              Idle: Delay, Attack, Hold, Decay, Sustain, Release.

  gate        Note on/off. Gate high triggers Delay (or Attack if there is
              no delay). Gate low triggers Release from wherever we are.

  coefficient Per-sample multiplier for the exponential stages. Calculated
              once when the stage is entered.


The Shape: Linear Rise, Exponential Fall
----------------------------------------

  Level
    1.0 ┐        ┌──┐
        │       ╱    ╲_
    S   │      ╱       ‾‾‾‾‾‾‾‾‾‾╲
        │     ╱                   ╲__
    0.0 └────╱───────────────────────‾‾──→ Time
          D    A   H   D      S       R

Attack is a straight line from 0 to 1. Decay and release are exponential:
the level is multiplied by a constant each sample, which is a straight line
in decibels. That is how the hardware behaves and why its releases sound
natural rather than "chopped off".


The Math: Time to Coefficient
-----------------------------

The stage time is the time the level needs to fall from full scale to
SILENCE (-80 dB). For n = time * sample_rate samples:

    coefficient = SILENCE ^ (1 / n)

Each sample, we do: level *= coefficient
After n samples from 1.0: level = SILENCE ✓

Decay stops early when it crosses the sustain level. Release stops when it
crosses SILENCE, and the envelope goes Idle. That crossing is what frees a
voice for reuse.


The State Machine
-----------------

    Idle ─gate on→ Delay → Attack → Hold → Decay → Sustain
                     │        │        │      │        │
                     └────────┴─gate off──────┴────────┴─→ Release → Idle

Zero-length stages are skipped in the same sample, so attack = 0 jumps
straight to full level. A sustain level at or below SILENCE means the
envelope is finished once decay is done, so percussive zones free their
voice without waiting for a note-off.
*/

/// Level treated as inaudible (-80 dB).
pub const SILENCE: f32 = 1.0e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Delay,
    Attack,
    Hold,
    Decay,
    Sustain,
    Release,
}

/// Longest accepted stage time, in seconds.
pub const MAX_STAGE_SECONDS: f32 = 100.0;

/// Stage times in seconds, sustain as a level.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    pub delay: f32,
    pub attack: f32,
    pub hold: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            delay: 0.0,
            attack: 0.001,
            hold: 0.0,
            decay: 0.0,
            sustain: 1.0,
            release: 0.1,
        }
    }
}

impl EnvelopeParams {
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            delay: 0.0,
            attack,
            hold: 0.0,
            decay,
            sustain,
            release,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_hold(mut self, hold: f32) -> Self {
        self.hold = hold;
        self
    }

    /// Stage times within `0..=MAX_STAGE_SECONDS` and sustain within
    /// `0..=1`. Non-finite values take their defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let time = |value, fallback| bounded(value, fallback, 0.0, MAX_STAGE_SECONDS);
        Self {
            delay: time(self.delay, d.delay),
            attack: time(self.attack, d.attack),
            hold: time(self.hold, d.hold),
            decay: time(self.decay, d.decay),
            sustain: bounded(self.sustain, d.sustain, 0.0, 1.0),
            release: time(self.release, d.release),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    sample_rate: f32,

    // Stage lengths in samples, computed at trigger time
    delay_samples: u32,
    attack_samples: u32,
    hold_samples: u32,
    decay_coef: f32,
    sustain_level: f32,
    release_coef: f32,

    stage: EnvelopeStage,
    level: f32,
    elapsed: u32, // samples spent in the current stage
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            delay_samples: 0,
            attack_samples: 0,
            hold_samples: 0,
            decay_coef: 0.0,
            sustain_level: 1.0,
            release_coef: 0.0,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            elapsed: 0,
        }
    }

    /// Gate high: restart from zero with a new shape.
    pub fn trigger(&mut self, params: &EnvelopeParams) {
        self.delay_samples = self.samples(params.delay);
        self.attack_samples = self.samples(params.attack);
        self.hold_samples = self.samples(params.hold);
        self.decay_coef = self.coefficient(params.decay);
        self.sustain_level = params.sustain.clamp(0.0, 1.0);
        self.release_coef = self.coefficient(params.release);

        self.level = 0.0;
        self.enter(EnvelopeStage::Delay);
    }

    /// Gate low: start the release phase from the current level.
    pub fn release(&mut self) {
        match self.stage {
            EnvelopeStage::Idle | EnvelopeStage::Release => {}
            _ => self.enter(EnvelopeStage::Release),
        }
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Delay => {
                self.elapsed += 1;
                if self.elapsed >= self.delay_samples {
                    self.enter(EnvelopeStage::Attack);
                }
            }
            EnvelopeStage::Attack => {
                self.elapsed += 1;
                self.level = self.elapsed as f32 / self.attack_samples as f32;
                if self.elapsed >= self.attack_samples {
                    self.level = 1.0;
                    self.enter(EnvelopeStage::Hold);
                }
            }
            EnvelopeStage::Hold => {
                self.elapsed += 1;
                if self.elapsed >= self.hold_samples {
                    self.enter(EnvelopeStage::Decay);
                }
            }
            EnvelopeStage::Decay => {
                self.level *= self.decay_coef;
                if self.level <= self.sustain_level.max(SILENCE) {
                    self.enter(EnvelopeStage::Sustain);
                }
            }
            EnvelopeStage::Sustain => {
                self.level = self.sustain_level;
            }
            EnvelopeStage::Release => {
                self.level *= self.release_coef;
                if self.level < SILENCE {
                    self.enter(EnvelopeStage::Idle);
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Move into `stage`, falling through any stage that has zero length.
    fn enter(&mut self, stage: EnvelopeStage) {
        self.elapsed = 0;
        self.stage = stage;
        loop {
            match self.stage {
                EnvelopeStage::Delay if self.delay_samples == 0 => {
                    self.stage = EnvelopeStage::Attack;
                }
                EnvelopeStage::Attack if self.attack_samples == 0 => {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Hold;
                }
                EnvelopeStage::Hold if self.hold_samples == 0 => {
                    self.stage = EnvelopeStage::Decay;
                }
                EnvelopeStage::Decay if self.level <= self.sustain_level => {
                    self.stage = EnvelopeStage::Sustain;
                }
                EnvelopeStage::Sustain => {
                    self.level = self.sustain_level;
                    if self.sustain_level <= SILENCE {
                        self.level = 0.0;
                        self.stage = EnvelopeStage::Idle;
                    }
                    return;
                }
                EnvelopeStage::Release if self.level < SILENCE => {
                    self.stage = EnvelopeStage::Idle;
                }
                EnvelopeStage::Idle => {
                    self.level = 0.0;
                    return;
                }
                _ => return,
            }
        }
    }

    fn samples(&self, seconds: f32) -> u32 {
        if seconds < MIN_TIME {
            0
        } else {
            (seconds * self.sample_rate).round() as u32
        }
    }

    fn coefficient(&self, seconds: f32) -> f32 {
        let n = self.samples(seconds);
        if n == 0 {
            // Instant: a single multiply lands below SILENCE
            0.0
        } else {
            SILENCE.powf(1.0 / n as f32)
        }
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// True while the envelope produces output (not idle).
    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeStage::Idle)
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        *self = Self::new(self.sample_rate);
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
