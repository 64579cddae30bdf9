use std::f32::consts::TAU;

use crate::dsp::delay::DelayLine;

/*
Chorus Effect
=============

The global chorus every voice sends into. Only the wet signal comes out:
the dry path is each voice's own output, so the engine just adds the
return on top.

How It Works
------------

1. The send bus is written into two short delay lines (left, right)
2. One slow LFO modulates both read positions, the right side a quarter
   cycle behind the left
3. As the read position moves, the delayed copy is pitch shifted up and
   down a little. Mixed against the dry voices that reads as several
   players slightly out of tune.
4. A touch of feedback thickens the effect

      send ──┬──→ [delay L] ──→ L
             │       ↑ base + depth·sin(φ)
             └──→ [delay R] ──→ R
                     ↑ base + depth·sin(φ + π/2)

Parameters
----------

Rate (0.1 - 5.0 Hz):       LFO speed. Classic chorus: 0.5-1.5 Hz
Depth (0.5 - 5.0 ms):      How far the delay time swings.
Base Delay (~15ms):        Centre delay. Too short: flanging. Too long: echo.
Feedback (0.0 - 0.95):     Wet signal fed back into the lines.

Both lines are sized for base + depth at construction, so the parameters
are fixed for the life of the effect.
*/

#[derive(Debug, Clone)]
pub struct StereoChorus {
    left: DelayLine,
    right: DelayLine,
    lfo_phase: f32,
    phase_inc: f32,
    base_delay: f32, // samples
    depth: f32,      // samples
    feedback: f32,
}

impl StereoChorus {
    /// - `rate_hz`: LFO speed
    /// - `depth_ms`: modulation depth in milliseconds
    /// - `base_delay_ms`: centre delay in milliseconds
    /// - `feedback`: 0.0 - 0.95
    pub fn new(
        sample_rate: f32,
        rate_hz: f32,
        depth_ms: f32,
        base_delay_ms: f32,
        feedback: f32,
    ) -> Self {
        let base_delay = base_delay_ms.clamp(1.0, 50.0) * sample_rate / 1000.0;
        let depth = depth_ms.clamp(0.0, 10.0) * sample_rate / 1000.0;
        let max_delay = (base_delay + depth).ceil() as usize + 2;

        Self {
            left: DelayLine::new(max_delay),
            right: DelayLine::new(max_delay),
            lfo_phase: 0.0,
            phase_inc: TAU * rate_hz.clamp(0.0, 10.0) / sample_rate,
            base_delay,
            depth: depth.min(base_delay - 1.0).max(0.0),
            feedback: feedback.clamp(0.0, 0.95),
        }
    }

    /// Process one sample of the send bus into a stereo return.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let delay_l = self.base_delay + self.lfo_phase.sin() * self.depth;
        let delay_r = self.base_delay + self.lfo_phase.cos() * self.depth;

        let wet_l = self.left.read_interpolated(delay_l);
        let wet_r = self.right.read_interpolated(delay_r);

        self.left.write(input + wet_l * self.feedback);
        self.right.write(input + wet_r * self.feedback);

        self.lfo_phase += self.phase_inc;
        if self.lfo_phase >= TAU {
            self.lfo_phase -= TAU;
        }

        (wet_l, wet_r)
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.lfo_phase = 0.0;
    }

    pub fn lfo_phase(&self) -> f32 {
        self.lfo_phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chorus() -> StereoChorus {
        StereoChorus::new(48_000.0, 1.0, 3.0, 15.0, 0.2)
    }

    #[test]
    fn test_chorus_delays_input() {
        let mut node = chorus();
        // 15ms - 3ms = 12ms minimum delay = 576 samples
        let (l, r) = node.process(1.0);
        assert_eq!((l, r), (0.0, 0.0));
        for _ in 0..500 {
            let (l, r) = node.process(0.0);
            assert_eq!((l, r), (0.0, 0.0));
        }

        let mut heard = false;
        for _ in 0..1_000 {
            let (l, r) = node.process(0.0);
            heard |= l.abs() > 0.1 || r.abs() > 0.1;
        }
        assert!(heard, "impulse should come back out of the delay lines");
    }

    #[test]
    fn test_chorus_output_bounded() {
        let mut node = StereoChorus::new(48_000.0, 2.0, 5.0, 20.0, 0.95);
        for i in 0..48_000 {
            let (l, r) = node.process((i as f32 * 0.1).sin());
            assert!(l.abs() < 25.0 && r.abs() < 25.0);
            assert!(l.is_finite() && r.is_finite());
        }
    }

    #[test]
    fn test_lfo_keeps_running_across_calls() {
        let mut node = chorus();
        for _ in 0..100 {
            node.process(0.0);
        }
        let phase = node.lfo_phase();
        assert!(phase > 0.0);
        node.process(0.0);
        assert!(node.lfo_phase() > phase);
    }

    #[test]
    fn test_reset_clears_lines() {
        let mut node = chorus();
        for _ in 0..2_000 {
            node.process(0.5);
        }
        node.reset();
        assert_eq!(node.lfo_phase(), 0.0);
        for _ in 0..2_000 {
            assert_eq!(node.process(0.0), (0.0, 0.0));
        }
    }
}
