//! Reverb - Room Simulation via Delay Networks
//!
//! The global reverb every voice sends into. It is a stereo Schroeder
//! network: each side runs four parallel damped comb filters followed by two
//! series allpass filters. The right side's delays are offset by a few
//! samples so the two tails decorrelate into a wide stereo image.
//!
//! ```text
//!             ┌→ [Comb L1..L4] ─(+)→ [Allpass L1] → [Allpass L2] ─→ L ┐
//! send bus ───┤                                                      ├─ width ─→ (L, R)
//!             └→ [Comb R1..R4] ─(+)→ [Allpass R1] → [Allpass R2] ─→ R ┘
//! ```
//!
//! ## Comb Filters
//!
//! ```text
//! y[n] = x[n] + feedback * lowpass(y[n - delay])
//! ```
//!
//! The delay times are mutually prime so the echoes never pile up on one
//! resonant frequency. The one-pole low-pass in the loop absorbs highs, the
//! way soft walls do.
//!
//! ## Allpass Filters
//!
//! ```text
//! y[n] = -g * x[n] + x[n - delay] + g * y[n - delay]
//! ```
//!
//! Flat magnitude, smeared phase: they thicken the echo density without
//! colouring the sound.
//!
//! All buffers are sized once from the sample rate in [`StereoReverb::new`];
//! processing never allocates.

/// Comb delay times in ms (mutually prime ratios)
const COMB_DELAYS_MS: [f32; 4] = [29.7, 37.1, 41.1, 43.7];
/// Allpass delay times in ms
const ALLPASS_DELAYS_MS: [f32; 2] = [5.0, 1.7];
/// Right-channel offset, in samples at 44.1 kHz
const STEREO_SPREAD: f32 = 23.0;
/// Input attenuation so a full-scale send can't saturate the combs
const INPUT_GAIN: f32 = 0.1;

/// A damped comb filter (pre-allocated, RT-safe)
#[derive(Debug, Clone)]
pub struct CombFilter {
    buffer: Box<[f32]>,
    write_pos: usize,
    feedback: f32,
    damp: f32,
    filter_state: f32,
}

impl CombFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)].into_boxed_slice(),
            write_pos: 0,
            feedback: 0.5,
            damp: 0.5,
            filter_state: 0.0,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.99);
    }

    pub fn set_damp(&mut self, damp: f32) {
        self.damp = damp.clamp(0.0, 1.0);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];

        // One-pole lowpass filter for damping (absorbs high frequencies)
        self.filter_state = output * (1.0 - self.damp) + self.filter_state * self.damp;

        self.buffer[self.write_pos] = input + self.filter_state * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.write_pos = 0;
    }
}

/// An allpass filter for reverb diffusion (pre-allocated, RT-safe)
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    buffer: Box<[f32]>,
    write_pos: usize,
    feedback: f32,
}

impl AllpassFilter {
    pub fn new(delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)].into_boxed_slice(),
            write_pos: 0,
            feedback: 0.5,
        }
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.9);
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        let output = -self.feedback * input + delayed;

        self.buffer[self.write_pos] = input + self.feedback * output;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

/// One side of the stereo network.
#[derive(Debug, Clone)]
struct ReverbTank {
    combs: [CombFilter; 4],
    allpasses: [AllpassFilter; 2],
}

impl ReverbTank {
    fn new(sample_rate: f32, offset_samples: usize) -> Self {
        let ms = |delay_ms: f32| (delay_ms * sample_rate / 1000.0) as usize + offset_samples;
        Self {
            combs: COMB_DELAYS_MS.map(|d| CombFilter::new(ms(d))),
            allpasses: ALLPASS_DELAYS_MS.map(|d| AllpassFilter::new(ms(d))),
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mut output = 0.0;
        for comb in &mut self.combs {
            output += comb.process(input);
        }
        output *= 0.25; // Normalize for 4 combs

        for allpass in &mut self.allpasses {
            output = allpass.process(output);
        }
        output
    }

    fn reset(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::reset);
        self.allpasses.iter_mut().for_each(AllpassFilter::reset);
    }
}

/// Stereo Schroeder reverb fed from a mono send bus.
#[derive(Debug, Clone)]
pub struct StereoReverb {
    left: ReverbTank,
    right: ReverbTank,
    wet1: f32,
    wet2: f32,
}

impl StereoReverb {
    pub fn new(sample_rate: f32) -> Self {
        let spread = (STEREO_SPREAD * sample_rate / 44_100.0).round() as usize;
        let mut reverb = Self {
            left: ReverbTank::new(sample_rate, 0),
            right: ReverbTank::new(sample_rate, spread),
            wet1: 1.0,
            wet2: 0.0,
        };
        reverb.set_room_size(0.5);
        reverb.set_damping(0.5);
        reverb.set_width(1.0);
        reverb
    }

    /// Set the room size (scales feedback for longer/shorter decay)
    pub fn set_room_size(&mut self, size: f32) {
        let feedback = 0.7 + size.clamp(0.0, 1.0) * 0.28; // 0.7 to 0.98
        for comb in self.left.combs.iter_mut().chain(self.right.combs.iter_mut()) {
            comb.set_feedback(feedback);
        }
        for allpass in self
            .left
            .allpasses
            .iter_mut()
            .chain(self.right.allpasses.iter_mut())
        {
            allpass.set_feedback(0.5);
        }
    }

    /// Set damping (high frequency absorption)
    pub fn set_damping(&mut self, damp: f32) {
        for comb in self.left.combs.iter_mut().chain(self.right.combs.iter_mut()) {
            comb.set_damp(damp);
        }
    }

    /// 0.0 folds both tails to mono, 1.0 keeps them fully apart.
    pub fn set_width(&mut self, width: f32) {
        let width = width.clamp(0.0, 1.0);
        self.wet1 = 0.5 + width * 0.5;
        self.wet2 = (1.0 - width) * 0.5;
    }

    /// Process one sample of the send bus into a stereo return.
    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let input = input * INPUT_GAIN;
        let l = self.left.process(input);
        let r = self.right.process(input);
        (l * self.wet1 + r * self.wet2, r * self.wet1 + l * self.wet2)
    }

    /// Reset all filter states
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}
