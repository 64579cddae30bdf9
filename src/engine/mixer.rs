use std::ops::Range;

use crate::{
    config::EngineConfig,
    dsp::{chorus::StereoChorus, mix::sum_scaled_in_place, reverb::StereoReverb},
    synth::VoiceBus,
    MAX_BLOCK_SIZE,
};

/*
Output Mixing
=============

    voices ──┬──→ dry L/R ─────────────────────────────┐
             ├──→ reverb send (mono) ──→ StereoReverb ──┤ × return
             └──→ chorus send (mono) ──→ StereoChorus ──┤ × return
                                                        ▼
                                                 × master gain ──→ out

All four buses are preallocated at MAX_BLOCK_SIZE. The voices add into
them; the effects run once per block over the whole send bus, and never
get rebuilt between blocks.
*/

pub struct Mixer {
    left: Box<[f32]>,
    right: Box<[f32]>,
    reverb_send: Box<[f32]>,
    chorus_send: Box<[f32]>,
    wet_left: Box<[f32]>,
    wet_right: Box<[f32]>,

    reverb: StereoReverb,
    chorus: StereoChorus,
    reverb_return: f32,
    chorus_return: f32,
    master_gain: f32,
}

impl Mixer {
    pub fn new(config: &EngineConfig) -> Self {
        let mut reverb = StereoReverb::new(config.sample_rate);
        reverb.set_room_size(config.reverb.room_size);
        reverb.set_damping(config.reverb.damping);
        reverb.set_width(config.reverb.width);

        let chorus = StereoChorus::new(
            config.sample_rate,
            config.chorus.rate_hz,
            config.chorus.depth_ms,
            config.chorus.base_delay_ms,
            config.chorus.feedback,
        );

        let bus = || vec![0.0; MAX_BLOCK_SIZE].into_boxed_slice();
        Self {
            left: bus(),
            right: bus(),
            reverb_send: bus(),
            chorus_send: bus(),
            wet_left: bus(),
            wet_right: bus(),
            reverb,
            chorus,
            reverb_return: config.reverb.return_level,
            chorus_return: config.chorus.return_level,
            master_gain: config.master_gain,
        }
    }

    /// Zero the first `frames` samples of every bus.
    pub fn begin(&mut self, frames: usize) {
        debug_assert!(frames <= MAX_BLOCK_SIZE);
        for bus in [
            &mut self.left,
            &mut self.right,
            &mut self.reverb_send,
            &mut self.chorus_send,
        ] {
            bus[..frames].fill(0.0);
        }
    }

    /// The part of the buses voices write to for `range`.
    pub fn bus(&mut self, range: Range<usize>) -> VoiceBus<'_> {
        VoiceBus {
            left: &mut self.left[range.clone()],
            right: &mut self.right[range.clone()],
            reverb: &mut self.reverb_send[range.clone()],
            chorus: &mut self.chorus_send[range],
        }
    }

    /// Run the send effects over the block and apply the master gain.
    pub fn finish(&mut self, frames: usize) {
        let (left, right) = (&mut self.left[..frames], &mut self.right[..frames]);
        let (wet_l, wet_r) = (&mut self.wet_left[..frames], &mut self.wet_right[..frames]);

        for ((input, l), r) in self.reverb_send[..frames]
            .iter()
            .zip(wet_l.iter_mut())
            .zip(wet_r.iter_mut())
        {
            (*l, *r) = self.reverb.process(*input);
        }
        sum_scaled_in_place(left, wet_l, self.reverb_return);
        sum_scaled_in_place(right, wet_r, self.reverb_return);

        for ((input, l), r) in self.chorus_send[..frames]
            .iter()
            .zip(wet_l.iter_mut())
            .zip(wet_r.iter_mut())
        {
            (*l, *r) = self.chorus.process(*input);
        }
        sum_scaled_in_place(left, wet_l, self.chorus_return);
        sum_scaled_in_place(right, wet_r, self.chorus_return);

        for sample in left.iter_mut().chain(right.iter_mut()) {
            *sample *= self.master_gain;
        }
    }

    /// Copy the finished block out as interleaved stereo.
    pub fn write_interleaved(&self, out: &mut [f32]) {
        for (i, frame) in out.chunks_exact_mut(2).enumerate() {
            frame[0] = self.left[i];
            frame[1] = self.right[i];
        }
    }

    pub fn write_planar(&self, left: &mut [f32], right: &mut [f32]) {
        left.copy_from_slice(&self.left[..left.len()]);
        right.copy_from_slice(&self.right[..right.len()]);
    }

    /// Clear the effect tails.
    pub fn reset(&mut self) {
        self.reverb.reset();
        self.chorus.reset();
    }

    pub fn left(&self) -> &[f32] {
        &self.left
    }

    pub fn right(&self) -> &[f32] {
        &self.right
    }
}
