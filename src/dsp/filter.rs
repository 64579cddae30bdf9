use std::f32::consts::PI;

/*
Bounded Resonant Low-Pass
=========================

Every voice runs its sample through one of these before the amplitude
envelope. It is a topology-preserving-transform state-variable filter
(Zavalishin / Simper), reduced to its low-pass output:

    input ──→ (+) ──→ [∫ g] ──┬──→ [∫ g] ──┬──→ low-pass out
               ↑              │             │
               └── -k·band ───┘── -1·low ───┘

The emulated hardware only ever sweeps its filter between roughly 100 Hz
and 8 kHz and caps resonance well below self-oscillation. Both limits are
enforced here, so no modulation routing upstream can push the filter into
an unstable region.

Vocabulary
----------

  cutoff_hz   Corner frequency. Clamped to MIN_CUTOFF_HZ..=MAX_CUTOFF_HZ
              (and below Nyquist for low sample rates).

  resonance   0.0 = flat (Q ≈ 0.5), MAX_RESONANCE = strong peak. Mapped to
              the damping term k = 2 - 2·resonance, so k never reaches 0.

  g           Prewarped integrator gain, tan(π·fc / fs).
*/

pub const MIN_CUTOFF_HZ: f32 = 100.0;
pub const MAX_CUTOFF_HZ: f32 = 8_000.0;
pub const MAX_RESONANCE: f32 = 0.9;

#[derive(Debug, Clone, PartialEq)]
pub struct LowPassFilter {
    ic1eq: f32, // First integrator's memory
    ic2eq: f32, // Second integrator's memory

    cutoff_hz: f32,
    resonance: f32,

    // Coefficients derived from cutoff/resonance
    g: f32,
    k: f32,
    h: f32,
}

impl LowPassFilter {
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            ic1eq: 0.0,
            ic2eq: 0.0,
            cutoff_hz: MAX_CUTOFF_HZ,
            resonance: 0.0,
            g: 0.0,
            k: 2.0,
            h: 0.0,
        };
        filter.set_params(MAX_CUTOFF_HZ, 0.0, sample_rate);
        filter
    }

    /// Clamp and store cutoff/resonance, then recompute coefficients.
    pub fn set_params(&mut self, cutoff_hz: f32, resonance: f32, sample_rate: f32) {
        let nyquist_guard = sample_rate * 0.45;
        self.cutoff_hz = clamp_finite(
            cutoff_hz,
            MIN_CUTOFF_HZ.min(nyquist_guard),
            MAX_CUTOFF_HZ.min(nyquist_guard),
        );
        self.resonance = clamp_finite(resonance, 0.0, MAX_RESONANCE);

        self.g = Self::compute_g(self.cutoff_hz, sample_rate);
        self.k = 2.0 - 2.0 * self.resonance;
        self.h = 1.0 / (1.0 + self.g * (self.g + self.k));
    }

    #[inline]
    fn compute_g(cutoff_hz: f32, sample_rate: f32) -> f32 {
        (PI * cutoff_hz / sample_rate).tan()
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let v3 = sample - self.ic2eq;
        let v1 = self.h * (self.ic1eq + self.g * v3);
        let v2 = self.ic2eq + self.g * v1;

        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        v2
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    pub fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Integrator memories; both zero after `reset`.
    pub fn state(&self) -> (f32, f32) {
        (self.ic1eq, self.ic2eq)
    }
}

#[inline]
fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        max
    } else {
        value.clamp(min, max)
    }
}
