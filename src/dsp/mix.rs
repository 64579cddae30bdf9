//! Summing and panning primitives.

use std::f32::consts::FRAC_PI_2;

/*
Summing and Panning
===================

Every voice ends up as a mono signal. The mixer places it in the stereo
field with a pan law and adds it onto the output bus.

Vocabulary
----------

  summing       Adding signals at equal levels. 32 voices at full scale
                can sum far beyond ±1.0; the master gain accounts for that.

  pan           Stereo position, -1.0 (hard left) to +1.0 (hard right).

  pan law       How the left/right gains change as a sound moves across
                the field.


Linear vs Equal-Power Panning
-----------------------------

LINEAR:

    left  = (1 - p) / 2
    right = (1 + p) / 2

    At centre both sides get 0.5 and the sound dips by ~3 dB compared to
    the edges, because power adds rather than amplitude.

EQUAL-POWER (what we implement):

    θ     = (p + 1) · π/4
    left  = cos θ
    right = sin θ

    left² + right² = 1 everywhere, so a voice keeps the same loudness as
    it moves. At centre both sides are √½ ≈ 0.707 (-3 dB).

    Gain
     1.0 ┤╲               ╱
         │  ╲           ╱
    .707 ┤    ╲ _ _ _ ╱
         │      ╱   ╲
     0.0 ┼────────────────────
        -1.0     0     +1.0  pan
*/

/// Equal-power pan gains `(left, right)` for `pan` in -1.0..=1.0.
#[inline]
pub fn equal_power_pan(pan: f32) -> (f32, f32) {
    let pan = if pan.is_nan() { 0.0 } else { pan.clamp(-1.0, 1.0) };
    let theta = (pan + 1.0) * 0.5 * FRAC_PI_2;
    (theta.cos(), theta.sin())
}

/// Add `b` onto `a` sample by sample.
#[inline]
pub fn sum_in_place(a: &mut [f32], b: &[f32]) {
    debug_assert_eq!(a.len(), b.len());

    for (a, b) in a.iter_mut().zip(b.iter()) {
        *a += *b;
    }
}

/// Add `b · gain` onto `a` sample by sample.
#[inline]
pub fn sum_scaled_in_place(a: &mut [f32], b: &[f32], gain: f32) {
    debug_assert_eq!(a.len(), b.len());

    for (a, b) in a.iter_mut().zip(b.iter()) {
        *a += *b * gain;
    }
}
