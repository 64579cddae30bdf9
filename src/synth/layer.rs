use std::sync::Arc;

use crate::{
    bank::{LoopMode, Sample, ZoneParams},
    dsp::{interpolate::hermite4, units},
};

/*
Sample Playback
===============

A layer walks through one sample's frames at a fractional rate:

    rate = 2^(key offset cents / 1200) · sample rate / engine rate

then multiplied every sample by the pitch modulation and bend ratio the
chain hands in. The read position is kept in f64 so that long loops do
not drift.

Reads use 4-point Hermite interpolation around the position:

    frames   x[-1]   x[0]   x[1]   x[2]
                       ^ position (frac between x[0] and x[1])

Near the loop end the neighbours wrap to the loop start while the layer
is looping. Past the end of the data they read as silence.

    NoLoop         ▶━━━━━━━━━━━━━━━━━━━━━━━━━━▏ stop
    Continuous     ▶━━━━━━━[━━━━━loop━━━━━━]↺
    UntilRelease   ▶━━━━━━━[━━━━━loop━━━━━━]↺ ... key up ... ━━━━▏ stop
*/

/// Where a layer reads from and how it is tuned.
#[derive(Debug, Clone)]
pub struct LayerSource {
    pub sample: Arc<Sample>,
    pub params: ZoneParams,
}

#[derive(Debug, Clone, Default)]
pub struct Layer {
    sample: Option<Arc<Sample>>,
    position: f64,
    base_rate: f64,
    gain: f32,
    loop_mode: LoopMode,
    looping: bool,
    finished: bool,
}

impl Layer {
    pub fn start(&mut self, source: &LayerSource, key: u8, engine_rate: f32) {
        let params = &source.params;
        let sample = &source.sample;

        let tuning = f64::from(units::cents_to_ratio(params.key_offset_cents(key)));
        self.base_rate = tuning * f64::from(sample.sample_rate()) / f64::from(engine_rate);
        self.gain = units::db_to_gain(-params.attenuation_db.max(0.0));
        self.loop_mode = params.loop_mode;
        self.looping = params.loop_mode != LoopMode::NoLoop;
        self.position = 0.0;
        self.finished = false;
        self.sample = Some(Arc::clone(sample));
    }

    /// Key up: an until-release loop plays through to the end.
    pub fn release(&mut self) {
        if self.loop_mode == LoopMode::UntilRelease {
            self.looping = false;
        }
    }

    /// Read one interpolated frame and advance by `base_rate · ratio`.
    #[inline]
    pub fn next_sample(&mut self, ratio: f32) -> f32 {
        let Some(sample) = self.sample.as_deref() else {
            return 0.0;
        };
        if self.finished {
            return 0.0;
        }

        let index = self.position.floor();
        let frac = (self.position - index) as f32;
        let i = index as isize;

        let out = hermite4(
            self.frame(sample, i - 1),
            self.frame(sample, i),
            self.frame(sample, i + 1),
            self.frame(sample, i + 2),
            frac,
        ) * self.gain;

        self.position += self.base_rate * f64::from(ratio);

        if self.looping {
            let start = sample.loop_start() as f64;
            let end = sample.loop_end() as f64;
            if self.position >= end {
                self.position = start + (self.position - start).rem_euclid(end - start);
            }
        } else if self.position >= sample.len() as f64 {
            self.finished = true;
        }

        out
    }

    #[inline]
    fn frame(&self, sample: &Sample, index: isize) -> f32 {
        let data = sample.data();
        let mut index = index;

        if self.looping {
            let start = sample.loop_start() as isize;
            let end = sample.loop_end() as isize;
            if index >= end {
                index -= end - start;
            } else if index < 0 {
                index += end - start;
            }
        }

        if index < 0 {
            return 0.0;
        }
        data.get(index as usize).copied().unwrap_or(0.0)
    }

    /// Drop the sample reference and return to the unused state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_playing(&self) -> bool {
        self.sample.is_some() && !self.finished
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::testing;

    fn ramp_source(len: usize, rate: f32, loop_mode: LoopMode) -> LayerSource {
        let data = (0..len).map(|i| i as f32).collect();
        LayerSource {
            sample: Arc::new(Sample::new("ramp", data, rate).unwrap()),
            params: ZoneParams {
                loop_mode,
                ..ZoneParams::default()
            },
        }
    }

    #[test]
    fn test_root_key_plays_at_recorded_rate() {
        let source = ramp_source(64, 48_000.0, LoopMode::NoLoop);
        let mut layer = Layer::default();
        layer.start(&source, 60, 48_000.0);
        assert_eq!(layer.base_rate(), 1.0);

        // Integer positions land exactly on the data
        for expected in 0..10 {
            let out = layer.next_sample(1.0);
            assert!((out - expected as f32).abs() < 1e-4, "frame {expected}: {out}");
        }
    }

    #[test]
    fn test_octave_up_doubles_rate() {
        let source = ramp_source(64, 48_000.0, LoopMode::NoLoop);
        let mut layer = Layer::default();
        layer.start(&source, 72, 48_000.0);
        assert!((layer.base_rate() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_sample_rate_conversion() {
        let source = ramp_source(64, 24_000.0, LoopMode::NoLoop);
        let mut layer = Layer::default();
        layer.start(&source, 60, 48_000.0);
        assert!((layer.base_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_loop_finishes_at_end() {
        let source = ramp_source(16, 48_000.0, LoopMode::NoLoop);
        let mut layer = Layer::default();
        layer.start(&source, 60, 48_000.0);

        for _ in 0..16 {
            layer.next_sample(1.0);
        }
        assert!(!layer.is_playing());
        assert_eq!(layer.next_sample(1.0), 0.0);
    }

    #[test]
    fn test_continuous_loop_wraps() {
        let source = ramp_source(16, 48_000.0, LoopMode::Continuous);
        let mut layer = Layer::default();
        layer.start(&source, 60, 48_000.0);

        for _ in 0..1_000 {
            layer.next_sample(1.0);
            assert!(layer.position() < 16.0);
        }
        assert!(layer.is_playing());
    }

    #[test]
    fn test_loop_wrap_handles_huge_steps() {
        let sample = Sample::new("ramp", (0..16).map(|i| i as f32).collect(), 48_000.0)
            .unwrap()
            .with_loop(4, 12)
            .unwrap();
        let source = LayerSource {
            sample: Arc::new(sample),
            params: ZoneParams {
                loop_mode: LoopMode::Continuous,
                ..ZoneParams::default()
            },
        };
        let mut layer = Layer::default();
        layer.start(&source, 60, 48_000.0);

        for ratio in [1.0e30, 3.0e7, 1.0e12, 12.5] {
            let out = layer.next_sample(ratio);
            assert!(out.is_finite());
            assert!((4.0..12.0).contains(&layer.position()), "{}", layer.position());
        }
    }

    #[test]
    fn test_until_release_stops_looping_on_release() {
        let source = ramp_source(16, 48_000.0, LoopMode::UntilRelease);
        let mut layer = Layer::default();
        layer.start(&source, 60, 48_000.0);

        for _ in 0..40 {
            layer.next_sample(1.0);
        }
        assert!(layer.is_playing());

        layer.release();
        assert!(!layer.is_looping());
        for _ in 0..16 {
            layer.next_sample(1.0);
        }
        assert!(!layer.is_playing());
    }

    #[test]
    fn test_attenuation_scales_output() {
        let mut source = ramp_source(64, 48_000.0, LoopMode::NoLoop);
        source.params.attenuation_db = 6.0;
        let mut layer = Layer::default();
        layer.start(&source, 60, 48_000.0);

        layer.next_sample(1.0);
        let out = layer.next_sample(1.0);
        assert!((out - 0.501).abs() < 1e-3, "expected ~0.5, got {out}");
    }

    #[test]
    fn test_sine_loop_stays_bounded() {
        let source = LayerSource {
            sample: testing::sine_sample(),
            params: testing::looped_params(Default::default()),
        };
        let mut layer = Layer::default();
        layer.start(&source, 81, 48_000.0);

        for _ in 0..100_000 {
            let out = layer.next_sample(1.03);
            assert!(out.abs() <= 0.55, "interpolated sine overshoot: {out}");
        }
    }

    #[test]
    fn test_clear_drops_sample() {
        let source = ramp_source(16, 48_000.0, LoopMode::Continuous);
        let mut layer = Layer::default();
        layer.start(&source, 60, 48_000.0);
        assert_eq!(Arc::strong_count(&source.sample), 2);

        layer.clear();
        assert_eq!(Arc::strong_count(&source.sample), 1);
        assert!(!layer.is_playing());
    }
}
