// Purpose - external interfaces, format conversions

pub mod midi;

pub use midi::MidiEvent;
