use std::sync::Arc;

use crate::{
    bank::SampleStore,
    config::EngineConfig,
    diagnostics::{DiagnosticKind, Diagnostics},
    error::NoteError,
    io::midi::MidiEvent,
    synth::{
        channel::{ChannelState, ControlEffect},
        layer::LayerSource,
        voice::{NoteStart, Voice, VoiceState},
        VoiceBus,
    },
    MAX_LAYERS, MIDI_CHANNELS,
};

/*
Voice Allocation
================

The pool is allocated once and voices are reused by index. A note-on
takes the first Idle voice. When none is left, a victim is stolen by
priority:

    1. Releasing voice with the lowest envelope level (quietest tail)
    2. else the oldest Active voice (lowest activation time)
    3. ties go to the lowest index

The victim is rebound to the new note at once and fades its old note out
over the steal ramp, so the pool never holds more sounding notes than it
has voices.

Channel controllers are captured when a note starts. Only pitch bend,
the sustain pedal and the all-notes/all-sound mode messages reach voices
that are already sounding.
*/

pub struct VoiceManager {
    voices: Vec<Voice>,
    channels: Vec<ChannelState>,
    store: Arc<dyn SampleStore>,
    diagnostics: Arc<Diagnostics>,
}

impl VoiceManager {
    pub fn new(
        config: &EngineConfig,
        store: Arc<dyn SampleStore>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        let fade = config.steal_release_samples();
        let voices = (0..config.polyphony)
            .map(|_| Voice::new(config.sample_rate, fade))
            .collect();
        let channels = (0..MIDI_CHANNELS as u8)
            .map(|index| ChannelState::new(index, config.bend_range_semitones))
            .collect();

        Self {
            voices,
            channels,
            store,
            diagnostics,
        }
    }

    /// Apply one event at sample time `now`.
    pub fn dispatch(&mut self, event: MidiEvent, now: u64) {
        match event {
            MidiEvent::NoteOn {
                channel,
                key,
                velocity,
            } => {
                // Failures are already counted
                let _ = self.note_on(channel, key, velocity, now);
            }
            MidiEvent::NoteOff { channel, key, .. } => {
                self.note_off(channel, key);
            }
            MidiEvent::ControlChange {
                channel,
                controller,
                value,
            } => self.control_change(channel, controller, value),
            MidiEvent::PitchBend { channel, value } => self.pitch_bend(channel, value),
            MidiEvent::ProgramChange { channel, program } => {
                let _ = self.program_change(channel, program);
            }
        }
    }

    /// Start `key` on `channel`. Returns the voice index, or `None` when a
    /// zero velocity turned the message into a note-off.
    pub fn note_on(
        &mut self,
        channel: u8,
        key: u8,
        velocity: u8,
        now: u64,
    ) -> Result<Option<usize>, NoteError> {
        if velocity == 0 {
            self.note_off(channel, key);
            return Ok(None);
        }

        let ch = channel_index(channel);
        let state = &self.channels[ch];
        let program = state.program();

        let Some(preset) = self.store.preset(program) else {
            self.diagnostics.record(DiagnosticKind::InvalidReference);
            return Err(NoteError::InstrumentNotFound { program });
        };

        let mut layers: [Option<LayerSource>; MAX_LAYERS] = Default::default();
        for (slot, zone) in layers.iter_mut().zip(preset.zones_for(key, velocity)) {
            *slot = Some(LayerSource {
                sample: Arc::clone(&zone.sample),
                params: zone.params.sanitized(),
            });
        }
        if layers[0].is_none() {
            self.diagnostics.record(DiagnosticKind::InvalidReference);
            return Err(NoteError::NoMatchingZone {
                program,
                key,
                velocity,
            });
        }

        let note = NoteStart {
            channel: ch as u8,
            note: key,
            velocity,
            layers,
            controls: state.note_controls(velocity),
        };
        let hold = state.sustain;

        // Retriggering a held key releases the previous instance
        for voice in &mut self.voices {
            if voice.state() == VoiceState::Active
                && voice.channel() == ch as u8
                && voice.note() == key
            {
                voice.release(hold);
            }
        }

        let index = self.select_voice();
        if !self.voices[index].is_idle() {
            self.diagnostics.record(DiagnosticKind::VoiceStolen);
        }
        self.voices[index].start(note, now);
        Ok(Some(index))
    }

    /// Release every Active voice bound to `(channel, key)`. Returns how
    /// many were released; a repeated note-off releases none.
    pub fn note_off(&mut self, channel: u8, key: u8) -> usize {
        let ch = channel_index(channel);
        let hold = self.channels[ch].sustain;

        let mut released = 0;
        for voice in &mut self.voices {
            if voice.state() == VoiceState::Active
                && voice.channel() == ch as u8
                && voice.note() == key
            {
                voice.release(hold);
                released += 1;
            }
        }
        released
    }

    /// Signed bend, 0 = centre. Applies to every sounding voice on the
    /// channel and to later notes.
    pub fn pitch_bend(&mut self, channel: u8, value: i16) {
        let ch = channel_index(channel);
        self.channels[ch].set_bend(value);
        self.apply_bend(ch);
    }

    fn apply_bend(&mut self, ch: usize) {
        let ratio = self.channels[ch].bend_ratio();
        for voice in self.voices_on(ch) {
            voice.set_bend_ratio(ratio);
        }
    }

    pub fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        let ch = channel_index(channel);
        match self.channels[ch].control_change(controller, value) {
            ControlEffect::None => {}
            ControlEffect::Bend => self.apply_bend(ch),
            ControlEffect::PedalUp => {
                for voice in self.voices_on(ch) {
                    voice.pedal_up();
                }
                self.apply_bend(ch);
            }
            ControlEffect::AllNotesOff => {
                let hold = self.channels[ch].sustain;
                for voice in self.voices_on(ch) {
                    voice.release(hold);
                }
            }
            ControlEffect::AllSoundOff => {
                for voice in self.voices_on(ch) {
                    voice.kill();
                }
            }
        }
    }

    /// Select an instrument for later note-ons. An unknown program leaves
    /// the channel unchanged.
    pub fn program_change(&mut self, channel: u8, program: u8) -> Result<(), NoteError> {
        let ch = channel_index(channel);
        let program = self.channels[ch].program_for(program);
        if !self.store.contains(program) {
            self.diagnostics.record(DiagnosticKind::InvalidReference);
            return Err(NoteError::InstrumentNotFound { program });
        }
        self.channels[ch].set_program(program);
        Ok(())
    }

    /// Index of the voice the next note-on would take.
    pub fn select_voice(&self) -> usize {
        if let Some(index) = self.voices.iter().position(Voice::is_idle) {
            return index;
        }

        let quietest_release = self
            .voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by(|(_, a), (_, b)| a.envelope_level().total_cmp(&b.envelope_level()))
            .map(|(index, _)| index);
        if let Some(index) = quietest_release {
            return index;
        }

        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age())
            .map_or(0, |(index, _)| index)
    }

    /// Add every sounding voice onto the bus.
    pub fn render(&mut self, bus: &mut VoiceBus<'_>) {
        for voice in &mut self.voices {
            if !voice.is_idle() {
                voice.render(bus);
            }
        }
    }

    /// Silence everything at once and restore channel defaults.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.clear();
        }
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    fn voices_on(&mut self, ch: usize) -> impl Iterator<Item = &mut Voice> + '_ {
        self.voices
            .iter_mut()
            .filter(move |v| !v.is_idle() && usize::from(v.channel()) == ch)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    pub fn polyphony(&self) -> usize {
        self.voices.len()
    }

    pub fn active_count(&self) -> usize {
        self.count(VoiceState::Active)
    }

    pub fn count(&self, state: VoiceState) -> usize {
        self.voices.iter().filter(|v| v.state() == state).count()
    }

    pub fn channel(&self, channel: u8) -> &ChannelState {
        &self.channels[channel_index(channel)]
    }
}

#[inline]
fn channel_index(channel: u8) -> usize {
    usize::from(channel).min(MIDI_CHANNELS - 1)
}
