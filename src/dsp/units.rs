//! Unit conversions shared by the voice chain.
//!
//! Pitch offsets travel through the chain in cents and level offsets in
//! decibels. Both are summed in the log domain and converted to linear
//! ratios once per sample.

/// 2^(cents / 1200)
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    (cents / 1200.0).exp2()
}

/// 10^(db / 20)
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// `value` clamped to `min..=max`, or `fallback` when it is NaN or infinite.
#[inline]
pub fn bounded(value: f32, fallback: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// MIDI 7-bit value to a squared 0.0..=1.0 gain, the curve used for
/// velocity, channel volume and expression.
#[inline]
pub fn midi_to_gain(value: u8) -> f32 {
    let x = f32::from(value.min(127)) / 127.0;
    x * x
}
