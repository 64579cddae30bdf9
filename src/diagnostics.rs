//! Side-channel error reporting.
//!
//! The audio thread can't log or return errors out of a block, so every
//! recoverable condition bumps a relaxed atomic counter instead. The control
//! thread reads snapshots and decides what to do with them (see
//! [`EventSender::report`](crate::engine::EventSender::report)).

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// An event was dropped because the queue was full.
    QueueOverflow,
    /// A note-on or program change named a missing instrument.
    InvalidReference,
    /// An event field was out of range and got clamped.
    MalformedEvent,
    /// A sounding voice was reassigned to a new note.
    VoiceStolen,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    queue_overflows: AtomicU64,
    invalid_references: AtomicU64,
    malformed_events: AtomicU64,
    voice_steals: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsSnapshot {
    pub queue_overflows: u64,
    pub invalid_references: u64,
    pub malformed_events: u64,
    pub voice_steals: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&self, kind: DiagnosticKind) {
        self.counter(kind).fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, kind: DiagnosticKind) -> u64 {
        self.counter(kind).load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            queue_overflows: self.count(DiagnosticKind::QueueOverflow),
            invalid_references: self.count(DiagnosticKind::InvalidReference),
            malformed_events: self.count(DiagnosticKind::MalformedEvent),
            voice_steals: self.count(DiagnosticKind::VoiceStolen),
        }
    }

    fn counter(&self, kind: DiagnosticKind) -> &AtomicU64 {
        match kind {
            DiagnosticKind::QueueOverflow => &self.queue_overflows,
            DiagnosticKind::InvalidReference => &self.invalid_references,
            DiagnosticKind::MalformedEvent => &self.malformed_events,
            DiagnosticKind::VoiceStolen => &self.voice_steals,
        }
    }
}

impl DiagnosticsSnapshot {
    /// Counts accumulated since `earlier`.
    pub fn since(&self, earlier: &DiagnosticsSnapshot) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            queue_overflows: self.queue_overflows.saturating_sub(earlier.queue_overflows),
            invalid_references: self
                .invalid_references
                .saturating_sub(earlier.invalid_references),
            malformed_events: self.malformed_events.saturating_sub(earlier.malformed_events),
            voice_steals: self.voice_steals.saturating_sub(earlier.voice_steals),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.queue_overflows == 0 && self.invalid_references == 0 && self.malformed_events == 0
    }
}
