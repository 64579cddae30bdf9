// Purpose: Voice management, polyphony, MIDI handling
// This layer sits between the scheduler and the mixer and owns every voice

pub mod allocator;
pub mod chain;
pub mod channel;
pub mod layer;
pub mod voice;

pub use allocator::VoiceManager;
pub use voice::{Voice, VoiceState};

/// Buses a voice adds its output onto for one block range: the dry
/// stereo pair plus the mono inputs of the two global effects.
pub struct VoiceBus<'a> {
    pub left: &'a mut [f32],
    pub right: &'a mut [f32],
    pub reverb: &'a mut [f32],
    pub chorus: &'a mut [f32],
}
