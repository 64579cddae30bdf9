//! Fractional sample reads.

/*
Why Interpolate
===============

A sample played back at any pitch other than its root lands between
stored frames. Rounding to the nearest frame ("drop-sample") produces
harsh aliasing and zipper noise when the pitch is modulated. The hardware
interpolates across four neighbouring frames, and so do we:

    x[-1]   x[0]  ·  x[1]   x[2]
                  ↑
              frac (0.0 - 1.0)

The 4-point, 3rd-order Hermite curve passes exactly through x[0] and x[1]
and matches the slope at both ends, so a linear ramp is reproduced without
error and the curve never jumps at frame boundaries.
*/

/// 4-point Hermite interpolation between `x0` and `x1`.
#[inline]
pub fn hermite4(xm1: f32, x0: f32, x1: f32, x2: f32, frac: f32) -> f32 {
    let c0 = x0;
    let c1 = 0.5 * (x1 - xm1);
    let c2 = xm1 - 2.5 * x0 + 2.0 * x1 - 0.5 * x2;
    let c3 = 0.5 * (x2 - xm1) + 1.5 * (x0 - x1);
    ((c3 * frac + c2) * frac + c1) * frac + c0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_frames() {
        assert_eq!(hermite4(0.3, -0.2, 0.9, 0.1, 0.0), -0.2);
        assert!((hermite4(0.3, -0.2, 0.9, 0.1, 1.0) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn reproduces_linear_ramps() {
        for i in 0..10 {
            let frac = i as f32 / 10.0;
            let y = hermite4(-1.0, 0.0, 1.0, 2.0, frac);
            assert!((y - frac).abs() < 1e-6, "frac {frac} → {y}");
        }
    }

    #[test]
    fn stays_near_bounds_on_a_step() {
        for i in 0..=10 {
            let y = hermite4(0.0, 0.0, 1.0, 1.0, i as f32 / 10.0);
            assert!((-0.1..=1.1).contains(&y));
        }
    }
}
