use crate::{
    dsp::{filter::LowPassFilter, mix::equal_power_pan, EnvelopeStage},
    synth::{
        chain::VoiceChain,
        layer::{Layer, LayerSource},
        VoiceBus,
    },
    MAX_LAYERS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Idle,      // Available for allocation
    Active,    // Key held, envelope in delay..sustain
    Releasing, // Key released, envelope in release (or held by the pedal)
}

/// Channel controller values captured when a note starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteControls {
    /// Velocity × channel volume × expression, already curved.
    pub gain: f32,
    pub pan: f32,
    pub reverb_send: f32,
    pub chorus_send: f32,
    /// Added to the zone's vibrato depth.
    pub vibrato_cents: f32,
    pub bend_ratio: f32,
}

impl Default for NoteControls {
    fn default() -> Self {
        Self {
            gain: 1.0,
            pan: 0.0,
            reverb_send: 0.0,
            chorus_send: 0.0,
            vibrato_cents: 0.0,
            bend_ratio: 1.0,
        }
    }
}

/// Everything a voice needs to start sounding a note.
///
/// The first layer drives the modulation chain; every layer contributes
/// its own sample, tuning and attenuation.
#[derive(Debug, Clone, Default)]
pub struct NoteStart {
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
    pub layers: [Option<LayerSource>; MAX_LAYERS],
    pub controls: NoteControls,
}

impl NoteStart {
    pub fn layer_count(&self) -> usize {
        self.layers.iter().filter(|l| l.is_some()).count()
    }
}

/// Linear ramp to silence used when a voice is stolen or killed.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    remaining: u32,
    length: u32,
}

impl Fade {
    fn new(samples: u32) -> Self {
        let length = samples.max(1);
        Self {
            remaining: length,
            length,
        }
    }

    #[inline]
    fn next_gain(&mut self) -> f32 {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining as f32 / self.length as f32
    }

    fn is_done(&self) -> bool {
        self.remaining == 0
    }
}

/// One sounding unit of the chip.
///
/// A stolen voice is bound to its new note immediately; the old note fades
/// out over the steal ramp and the new note starts on the sample after the
/// ramp ends.
#[derive(Debug, Clone)]
pub struct Voice {
    state: VoiceState,
    channel: u8,
    note: u8,
    velocity: u8,
    age: u64,
    sample_rate: f32,

    layers: [Layer; MAX_LAYERS],
    chain: VoiceChain,

    gain: f32,
    bend_ratio: f32,
    pan: f32,
    pan_gains: (f32, f32),
    reverb_send: f32,
    chorus_send: f32,

    // Key released while the pedal was down; release on pedal-up
    sustained: bool,
    fade: Option<Fade>,
    fade_samples: u32,
    pending: Option<NoteStart>,
}

impl Voice {
    pub fn new(sample_rate: f32, fade_samples: u32) -> Self {
        Self {
            state: VoiceState::Idle,
            channel: 0,
            note: 0,
            velocity: 0,
            age: 0,
            sample_rate,
            layers: Default::default(),
            chain: VoiceChain::new(sample_rate),
            gain: 0.0,
            bend_ratio: 1.0,
            pan: 0.0,
            pan_gains: equal_power_pan(0.0),
            reverb_send: 0.0,
            chorus_send: 0.0,
            sustained: false,
            fade: None,
            fade_samples,
            pending: None,
        }
    }

    /// Bind the voice to a new note. An idle voice starts at once; a busy
    /// one fades its current note first.
    pub fn start(&mut self, note: NoteStart, age: u64) {
        self.channel = note.channel;
        self.note = note.note;
        self.velocity = note.velocity;
        self.age = age;
        self.sustained = false;

        if self.state == VoiceState::Idle {
            self.state = VoiceState::Active;
            self.begin(&note);
        } else {
            self.state = VoiceState::Active;
            if self.fade.is_none() {
                self.fade = Some(Fade::new(self.fade_samples));
            }
            self.pending = Some(note);
        }
    }

    fn begin(&mut self, note: &NoteStart) {
        self.chain.reset();
        for layer in &mut self.layers {
            layer.clear();
        }

        let mut first = true;
        for (layer, source) in self.layers.iter_mut().zip(note.layers.iter()) {
            let Some(source) = source else { continue };
            if first {
                self.chain
                    .trigger(&source.params, note.controls.vibrato_cents);
                self.pan = (source.params.pan + note.controls.pan).clamp(-1.0, 1.0);
                self.reverb_send =
                    (source.params.reverb_send + note.controls.reverb_send).clamp(0.0, 1.0);
                self.chorus_send =
                    (source.params.chorus_send + note.controls.chorus_send).clamp(0.0, 1.0);
                first = false;
            }
            layer.start(source, note.note, self.sample_rate);
        }

        self.pan_gains = equal_power_pan(self.pan);
        self.gain = note.controls.gain;
        self.bend_ratio = note.controls.bend_ratio;

        // Key already up by the time the steal ramp finished
        if self.state == VoiceState::Releasing && !self.sustained {
            self.release_sources();
        }
    }

    /// Key up. With `hold` the voice is marked releasing but its envelope
    /// keeps sustaining until [`Voice::pedal_up`].
    pub fn release(&mut self, hold: bool) {
        if self.state != VoiceState::Active {
            return;
        }
        self.state = VoiceState::Releasing;
        if hold {
            self.sustained = true;
        } else if self.pending.is_none() {
            self.release_sources();
        }
    }

    pub fn pedal_up(&mut self) {
        if self.sustained {
            self.sustained = false;
            if self.pending.is_none() {
                self.release_sources();
            }
        }
    }

    fn release_sources(&mut self) {
        self.chain.release();
        for layer in &mut self.layers {
            layer.release();
        }
    }

    /// All sound off: fade to silence without starting anything after.
    pub fn kill(&mut self) {
        if self.state == VoiceState::Idle {
            return;
        }
        self.state = VoiceState::Releasing;
        self.sustained = false;
        self.pending = None;
        if self.fade.is_none() {
            self.fade = Some(Fade::new(self.fade_samples));
        }
    }

    /// While a steal ramp runs the sounding note belongs to the previous
    /// owner, so the bend only reaches the pending note.
    pub fn set_bend_ratio(&mut self, ratio: f32) {
        match &mut self.pending {
            Some(pending) => pending.controls.bend_ratio = ratio,
            None => self.bend_ratio = ratio,
        }
    }

    /// Add this voice's output onto the bus. Every slice of `bus` must have
    /// the same length.
    pub fn render(&mut self, bus: &mut VoiceBus<'_>) {
        let frames = bus.left.len();

        for i in 0..frames {
            if self.state == VoiceState::Idle {
                break;
            }

            let mut out = self.next_sample();

            if let Some(fade) = &mut self.fade {
                out *= fade.next_gain();
                if fade.is_done() {
                    self.finish();
                }
            } else if self.chain.is_finished() || !self.layers.iter().any(Layer::is_playing) {
                self.finish();
            }

            let (l, r) = self.pan_gains;
            bus.left[i] += out * l;
            bus.right[i] += out * r;
            bus.reverb[i] += out * self.reverb_send;
            bus.chorus[i] += out * self.chorus_send;
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        let m = self.chain.modulate();
        let ratio = crate::dsp::units::cents_to_ratio(m.pitch_cents) * self.bend_ratio;

        let mut mixed = 0.0;
        for layer in &mut self.layers {
            mixed += layer.next_sample(ratio);
        }

        let filtered = self.chain.filter(mixed, m.filter_cents);
        self.chain.amplify(filtered, m.volume_db) * self.gain
    }

    /// Current note is over: start the pending one or go idle.
    fn finish(&mut self) {
        self.fade = None;
        match self.pending.take() {
            Some(next) => self.begin(&next),
            None => self.clear(),
        }
    }

    /// Return to idle with every source at its reset value.
    pub fn clear(&mut self) {
        let (sample_rate, fade_samples) = (self.sample_rate, self.fade_samples);
        let (channel, note) = (self.channel, self.note);
        *self = Self::new(sample_rate, fade_samples);
        self.channel = channel;
        self.note = note;
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == VoiceState::Idle
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Sample time at which the voice was last allocated.
    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn is_sustained(&self) -> bool {
        self.sustained
    }

    /// True while the steal or kill ramp is running.
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn envelope_level(&self) -> f32 {
        self.chain.envelope_level()
    }

    pub fn envelope_stage(&self) -> EnvelopeStage {
        self.chain.envelope_stage()
    }

    pub fn bend_ratio(&self) -> f32 {
        self.bend_ratio
    }

    /// Rate of the primary layer before modulation, bend applied.
    pub fn playback_rate(&self) -> f64 {
        self.layers
            .iter()
            .find(|l| l.is_playing())
            .map_or(0.0, |l| l.base_rate() * f64::from(self.bend_ratio))
    }

    pub fn layer_count(&self) -> usize {
        self.layers.iter().filter(|l| l.is_playing()).count()
    }

    pub fn filter(&self) -> &LowPassFilter {
        self.chain.filter_state()
    }

    /// `(modulation, vibrato)` LFO phases.
    pub fn lfo_phases(&self) -> (f32, f32) {
        self.chain.lfo_phases()
    }

    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// `(reverb, chorus)` send levels.
    pub fn sends(&self) -> (f32, f32) {
        (self.reverb_send, self.chorus_send)
    }
}
