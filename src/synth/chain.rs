use crate::{
    bank::{ZoneParams, MAX_LEVEL_DB, MAX_PITCH_CENTS},
    dsp::{
        envelope::Envelope, filter::LowPassFilter, lfo::Lfo, units, EnvelopeStage,
    },
};

/*
Per-Voice Chain
===============

Every voice owns one fixed chain. There is no graph and no dynamic
dispatch: each sample runs the same steps in the same order.

    ┌──────────── modulation sources (ticked first) ────────────┐
    │  mod envelope     mod LFO       vibrato LFO               │
    └────┬─────────────────┬──────────────┬─────────────────────┘
         │ →pitch →filter  │ →pitch →filter →volume │ →pitch
         ▼                 ▼              ▼
    sample read ──→ low-pass filter ──→ × volume envelope × tremolo ──→ out
    (rate · 2^(cents/1200))  (cutoff · 2^(cents/1200))

Vocabulary
----------

  cents       Pitch and cutoff offsets are summed in cents and converted
              once per sample: ratio = 2^(cents / 1200).

  tremolo     The modulation LFO routed to volume, in decibels.

  control     Filter coefficients involve a tan(). They are recomputed
  rate        every FILTER_UPDATE_INTERVAL samples rather than every sample,
              from a per-voice counter, so every voice updates on its own
              schedule.
*/

/// Samples between filter coefficient updates.
pub const FILTER_UPDATE_INTERVAL: u32 = 16;

/// Offsets produced by the modulation sources for one sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Modulation {
    pub pitch_cents: f32,
    pub filter_cents: f32,
    pub volume_db: f32,
}

#[derive(Debug, Clone)]
pub struct VoiceChain {
    sample_rate: f32,
    params: ZoneParams,
    vibrato_cents: f32,

    volume_envelope: Envelope,
    modulation_envelope: Envelope,
    modulation_lfo: Lfo,
    vibrato_lfo: Lfo,

    filter: LowPassFilter,
    filter_countdown: u32,
}

impl VoiceChain {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            params: ZoneParams::default(),
            vibrato_cents: 0.0,
            volume_envelope: Envelope::new(sample_rate),
            modulation_envelope: Envelope::new(sample_rate),
            modulation_lfo: Lfo::new(),
            vibrato_lfo: Lfo::new(),
            filter: LowPassFilter::new(sample_rate),
            filter_countdown: 0,
        }
    }

    /// Start every source from the zone's defaults. `extra_vibrato_cents`
    /// adds to the zone's vibrato depth (mod wheel).
    pub fn trigger(&mut self, params: &ZoneParams, extra_vibrato_cents: f32) {
        self.params = *params;
        self.vibrato_cents = params.vib_lfo_to_pitch + extra_vibrato_cents;

        self.volume_envelope.trigger(&params.volume_envelope);
        self.modulation_envelope.trigger(&params.modulation_envelope);
        self.modulation_lfo.trigger(&params.modulation_lfo, self.sample_rate);
        self.vibrato_lfo.trigger(&params.vibrato_lfo, self.sample_rate);

        self.filter.reset();
        self.filter.set_params(
            params.filter_cutoff_hz,
            params.filter_resonance,
            self.sample_rate,
        );
        self.filter_countdown = 0;
    }

    pub fn release(&mut self) {
        self.volume_envelope.release();
        self.modulation_envelope.release();
    }

    /// Tick the modulation sources and sum their routings. Each sum stays
    /// within `±MAX_PITCH_CENTS` or `±MAX_LEVEL_DB`.
    #[inline]
    pub fn modulate(&mut self) -> Modulation {
        let env = self.modulation_envelope.next_sample();
        let lfo = self.modulation_lfo.next_sample();
        let vibrato = self.vibrato_lfo.next_sample();
        let p = &self.params;

        let pitch_cents =
            env * p.mod_env_to_pitch + lfo * p.mod_lfo_to_pitch + vibrato * self.vibrato_cents;
        let filter_cents = env * p.mod_env_to_filter + lfo * p.mod_lfo_to_filter;
        let volume_db = lfo * p.mod_lfo_to_volume;

        Modulation {
            pitch_cents: pitch_cents.clamp(-MAX_PITCH_CENTS, MAX_PITCH_CENTS),
            filter_cents: filter_cents.clamp(-MAX_PITCH_CENTS, MAX_PITCH_CENTS),
            volume_db: volume_db.clamp(-MAX_LEVEL_DB, MAX_LEVEL_DB),
        }
    }

    #[inline]
    pub fn filter(&mut self, input: f32, filter_cents: f32) -> f32 {
        if self.filter_countdown == 0 {
            self.filter_countdown = FILTER_UPDATE_INTERVAL;
            let cutoff = self.params.filter_cutoff_hz * units::cents_to_ratio(filter_cents);
            self.filter
                .set_params(cutoff, self.params.filter_resonance, self.sample_rate);
        }
        self.filter_countdown -= 1;
        self.filter.process(input)
    }

    /// Volume envelope × tremolo.
    #[inline]
    pub fn amplify(&mut self, input: f32, volume_db: f32) -> f32 {
        let level = self.volume_envelope.next_sample();
        let tremolo = if volume_db == 0.0 {
            1.0
        } else {
            units::db_to_gain(volume_db)
        };
        input * level * tremolo
    }

    /// True once the volume envelope has reached silence.
    pub fn is_finished(&self) -> bool {
        !self.volume_envelope.is_active()
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.sample_rate);
    }

    pub fn envelope_level(&self) -> f32 {
        self.volume_envelope.level()
    }

    pub fn envelope_stage(&self) -> EnvelopeStage {
        self.volume_envelope.stage()
    }

    pub fn modulation_level(&self) -> f32 {
        self.modulation_envelope.level()
    }

    pub fn lfo_phases(&self) -> (f32, f32) {
        (self.modulation_lfo.phase(), self.vibrato_lfo.phase())
    }

    pub fn filter_state(&self) -> &LowPassFilter {
        &self.filter
    }

    pub fn params(&self) -> &ZoneParams {
        &self.params
    }
}
