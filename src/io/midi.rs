//! MIDI channel-voice messages.

/*
Wire Format
===========

    status byte    1sss cccc      s = message kind, c = channel 0..15
    data bytes     0ddd dddd      7 bits each

    kind   status  data
    ----   ------  -------------------------------
    8x     NoteOff key, velocity
    9x     NoteOn  key, velocity   (velocity 0 = NoteOff)
    Bx     CC      controller, value
    Cx     Program program
    Ex     Bend    lsb, msb        (14-bit, centre 8192)

Pitch bend is carried as a 14-bit unsigned value split across two 7-bit
bytes, least significant first. Internally we keep it signed, centred on
zero, so "no bend" is 0 and the range is -8192..=8191:

    wire    0 ─────── 8192 ─────── 16383
    signed  -8192 ───── 0 ──────── 8191
*/

pub const BEND_CENTER: u16 = 8192;
pub const BEND_MIN: i16 = -8192;
pub const BEND_MAX: i16 = 8191;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Signed bend, 0 = centre.
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Decode one channel-voice message. Running status and system
    /// messages are not handled.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        if status & 0x80 == 0 {
            return None;
        }
        let channel = status & 0x0F;
        let d0 = data.first().map(|b| b & 0x7F);
        let d1 = data.get(1).map(|b| b & 0x7F);

        match status & 0xF0 {
            0x80 => Some(Self::NoteOff {
                channel,
                key: d0?,
                velocity: d1?,
            }),
            0x90 => {
                let (key, velocity) = (d0?, d1?);
                if velocity == 0 {
                    Some(Self::NoteOff {
                        channel,
                        key,
                        velocity: 0,
                    })
                } else {
                    Some(Self::NoteOn {
                        channel,
                        key,
                        velocity,
                    })
                }
            }
            0xB0 => Some(Self::ControlChange {
                channel,
                controller: d0?,
                value: d1?,
            }),
            0xC0 => Some(Self::ProgramChange {
                channel,
                program: d0?,
            }),
            0xE0 => Some(Self::PitchBend {
                channel,
                value: decode_pitch_bend(d0?, d1?),
            }),
            _ => None,
        }
    }

    /// Encode back to wire bytes. Returns the buffer and the used length.
    pub fn to_bytes(&self) -> ([u8; 3], usize) {
        match *self {
            Self::NoteOff {
                channel,
                key,
                velocity,
            } => ([0x80 | channel & 0x0F, key & 0x7F, velocity & 0x7F], 3),
            Self::NoteOn {
                channel,
                key,
                velocity,
            } => ([0x90 | channel & 0x0F, key & 0x7F, velocity & 0x7F], 3),
            Self::ControlChange {
                channel,
                controller,
                value,
            } => ([0xB0 | channel & 0x0F, controller & 0x7F, value & 0x7F], 3),
            Self::ProgramChange { channel, program } => {
                ([0xC0 | channel & 0x0F, program & 0x7F, 0], 2)
            }
            Self::PitchBend { channel, value } => {
                let (lsb, msb) = encode_pitch_bend(value);
                ([0xE0 | channel & 0x0F, lsb, msb], 3)
            }
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::PitchBend { channel, .. }
            | Self::ProgramChange { channel, .. } => channel,
        }
    }

    /// Clamp every field into its valid range. The flag is true when
    /// anything had to change.
    pub fn sanitize(self) -> (Self, bool) {
        let mut clamped = false;
        let mut fix = |value: u8, max: u8| {
            if value > max {
                clamped = true;
                max
            } else {
                value
            }
        };

        let event = match self {
            Self::NoteOn {
                channel,
                key,
                velocity,
            } => Self::NoteOn {
                channel: fix(channel, 15),
                key: fix(key, 127),
                velocity: fix(velocity, 127),
            },
            Self::NoteOff {
                channel,
                key,
                velocity,
            } => Self::NoteOff {
                channel: fix(channel, 15),
                key: fix(key, 127),
                velocity: fix(velocity, 127),
            },
            Self::ControlChange {
                channel,
                controller,
                value,
            } => Self::ControlChange {
                channel: fix(channel, 15),
                controller: fix(controller, 127),
                value: fix(value, 127),
            },
            Self::ProgramChange { channel, program } => Self::ProgramChange {
                channel: fix(channel, 15),
                program: fix(program, 127),
            },
            Self::PitchBend { channel, value } => {
                let bounded = value.clamp(BEND_MIN, BEND_MAX);
                let channel = fix(channel, 15);
                if bounded != value {
                    clamped = true;
                }
                Self::PitchBend {
                    channel,
                    value: bounded,
                }
            }
        };
        (event, clamped)
    }
}

/// Two 7-bit wire bytes to a signed bend, 0 = centre.
#[inline]
pub fn decode_pitch_bend(lsb: u8, msb: u8) -> i16 {
    let raw = (u16::from(msb & 0x7F) << 7) | u16::from(lsb & 0x7F);
    raw as i16 - BEND_CENTER as i16
}

/// Signed bend to `(lsb, msb)` wire bytes. Out-of-range values are clamped.
#[inline]
pub fn encode_pitch_bend(value: i16) -> (u8, u8) {
    let raw = (value.clamp(BEND_MIN, BEND_MAX) + BEND_CENTER as i16) as u16;
    ((raw & 0x7F) as u8, (raw >> 7) as u8)
}

/// Playback-rate multiplier for a signed bend.
///
/// cents = value / 8192 · range · 100, ratio = 2^(cents / 1200)
#[inline]
pub fn pitch_bend_ratio(value: i16, range_semitones: f32) -> f32 {
    let cents = f32::from(value) / f32::from(BEND_CENTER) * range_semitones * 100.0;
    (cents / 1200.0).exp2()
}
