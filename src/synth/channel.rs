use crate::{
    bank::{ProgramId, PERCUSSION_BANK},
    dsp::units::midi_to_gain,
    io::midi::{pitch_bend_ratio, BEND_MAX, BEND_MIN},
    synth::voice::NoteControls,
};

/// Channel index the percussion bank is selected on by default.
pub const PERCUSSION_CHANNEL: u8 = 9;
/// Vibrato depth added by a fully raised mod wheel.
pub const MOD_WHEEL_VIBRATO_CENTS: f32 = 50.0;
pub const MAX_BEND_RANGE_SEMITONES: u8 = 24;

const RPN_NULL: u8 = 127;

/// What a controller message asks of the voices on its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEffect {
    /// Stored for later note-ons only.
    None,
    /// Release every voice the pedal was holding.
    PedalUp,
    /// Bend ratio changed; re-apply it to sounding voices.
    Bend,
    AllNotesOff,
    AllSoundOff,
}

/// Controller state of one MIDI channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    index: u8,
    bank_msb: u8,
    bank_lsb: u8,
    program: ProgramId,

    pub volume: u8,
    pub expression: u8,
    pub pan: u8,
    pub modulation: u8,
    pub reverb: u8,
    pub chorus: u8,
    pub sustain: bool,

    bend: i16,
    bend_range_semitones: u8,
    bend_range_cents: u8,
    default_bend_range: f32,
    rpn: (u8, u8),
}

impl ChannelState {
    pub fn new(index: u8, bend_range_semitones: f32) -> Self {
        let bank = if index == PERCUSSION_CHANNEL {
            PERCUSSION_BANK
        } else {
            0
        };
        let semitones = bend_range_semitones.clamp(0.0, f32::from(MAX_BEND_RANGE_SEMITONES));

        Self {
            index,
            bank_msb: (bank >> 7) as u8,
            bank_lsb: (bank & 0x7F) as u8,
            program: ProgramId::new(bank, 0),
            volume: 100,
            expression: 127,
            pan: 64,
            modulation: 0,
            reverb: 40,
            chorus: 0,
            sustain: false,
            bend: 0,
            bend_range_semitones: semitones.trunc() as u8,
            bend_range_cents: (semitones.fract() * 100.0).round() as u8,
            default_bend_range: semitones,
            rpn: (RPN_NULL, RPN_NULL),
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Currently selected instrument.
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Instrument a program change to `program` would select, using the
    /// pending bank-select values.
    pub fn program_for(&self, program: u8) -> ProgramId {
        let bank = (u16::from(self.bank_msb) << 7) | u16::from(self.bank_lsb);
        ProgramId::new(bank, program)
    }

    pub fn set_program(&mut self, program: ProgramId) {
        self.program = program;
    }

    pub fn bend(&self) -> i16 {
        self.bend
    }

    pub fn set_bend(&mut self, value: i16) {
        self.bend = value.clamp(BEND_MIN, BEND_MAX);
    }

    pub fn bend_range(&self) -> f32 {
        f32::from(self.bend_range_semitones) + f32::from(self.bend_range_cents) / 100.0
    }

    pub fn bend_ratio(&self) -> f32 {
        pitch_bend_ratio(self.bend, self.bend_range())
    }

    pub fn control_change(&mut self, controller: u8, value: u8) -> ControlEffect {
        let value = value.min(127);
        match controller {
            0 => self.bank_msb = value,
            32 => self.bank_lsb = value,
            1 => self.modulation = value,
            7 => self.volume = value,
            10 => self.pan = value,
            11 => self.expression = value,
            91 => self.reverb = value,
            93 => self.chorus = value,
            101 => self.rpn.0 = value,
            100 => self.rpn.1 = value,
            6 if self.rpn == (0, 0) => {
                self.bend_range_semitones = value.min(MAX_BEND_RANGE_SEMITONES);
                return ControlEffect::Bend;
            }
            38 if self.rpn == (0, 0) => {
                self.bend_range_cents = value.min(99);
                return ControlEffect::Bend;
            }
            64 => {
                let down = value >= 64;
                let was_down = std::mem::replace(&mut self.sustain, down);
                if was_down && !down {
                    return ControlEffect::PedalUp;
                }
            }
            120 => return ControlEffect::AllSoundOff,
            121 => return self.reset_controllers(),
            123 => return ControlEffect::AllNotesOff,
            _ => {}
        }
        ControlEffect::None
    }

    /// CC121. Program, volume, pan and the effect sends are kept.
    fn reset_controllers(&mut self) -> ControlEffect {
        let was_down = self.sustain;
        self.modulation = 0;
        self.expression = 127;
        self.sustain = false;
        self.bend = 0;
        self.rpn = (RPN_NULL, RPN_NULL);

        if was_down {
            ControlEffect::PedalUp
        } else {
            ControlEffect::Bend
        }
    }

    /// Back to power-on state, including program and bend range.
    pub fn reset(&mut self) {
        *self = Self::new(self.index, self.default_bend_range);
    }

    /// Controller values a note-on on this channel captures.
    pub fn note_controls(&self, velocity: u8) -> NoteControls {
        NoteControls {
            gain: midi_to_gain(velocity) * midi_to_gain(self.volume) * midi_to_gain(self.expression),
            pan: ((f32::from(self.pan) - 64.0) / 63.0).clamp(-1.0, 1.0),
            reverb_send: f32::from(self.reverb) / 127.0,
            chorus_send: f32::from(self.chorus) / 127.0,
            vibrato_cents: f32::from(self.modulation) / 127.0 * MOD_WHEEL_VIBRATO_CENTS,
            bend_ratio: self.bend_ratio(),
        }
    }
}
