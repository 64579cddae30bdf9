use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::{
    diagnostics::{DiagnosticKind, Diagnostics, DiagnosticsSnapshot},
    io::midi::MidiEvent,
};

/*
Event Handoff
=============

    control thread                         audio thread
    ──────────────                         ────────────
    EventSender::submit ──→ [ rtrb ring ] ──→ EventQueue::drain
         │                                       │
     backlog (only while                    pending, sorted by
     the ring is full)                      (time, seq)

The ring is the only thing the two threads share. The audio side empties
it completely at the start of every block and keeps undispatched events
in `pending`, ordered by scheduled time and then by submission order, so
events with the same time come out first-in first-out.

Both sides are bounded by the configured capacity. When either would
exceed it, the oldest event (lowest submission number) is dropped and
counted as a queue overflow. Nothing allocates after construction.
*/

/// An event and the absolute sample time it is due at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub time: u64,
    /// Submission order, used to break ties between equal times.
    pub seq: u64,
    pub event: MidiEvent,
}

impl TimedEvent {
    #[inline]
    fn key(&self) -> (u64, u64) {
        (self.time, self.seq)
    }
}

/// Build a connected sender/queue pair holding at most `capacity` events
/// on each side.
pub fn event_queue(
    capacity: usize,
    diagnostics: Arc<Diagnostics>,
    clock: Arc<AtomicU64>,
) -> (EventSender, EventQueue) {
    let capacity = capacity.max(1);
    let (producer, consumer) = RingBuffer::new(capacity);

    let sender = EventSender {
        producer,
        backlog: VecDeque::with_capacity(capacity),
        capacity,
        next_seq: 0,
        reported: diagnostics.snapshot(),
        diagnostics: diagnostics.clone(),
        clock,
    };
    let queue = EventQueue {
        consumer,
        pending: VecDeque::with_capacity(capacity),
        incoming: Vec::with_capacity(capacity),
        merged: VecDeque::with_capacity(capacity),
        seqs: Vec::with_capacity(capacity),
        capacity,
        diagnostics,
    };
    (sender, queue)
}

/// Control-thread end of the event queue.
pub struct EventSender {
    producer: Producer<TimedEvent>,
    backlog: VecDeque<TimedEvent>,
    capacity: usize,
    next_seq: u64,
    diagnostics: Arc<Diagnostics>,
    reported: DiagnosticsSnapshot,
    clock: Arc<AtomicU64>,
}

impl EventSender {
    /// Schedule `event` at absolute sample `time`. Times already in the
    /// past are played at the start of the next block. Out-of-range fields
    /// are clamped and counted.
    pub fn submit(&mut self, event: MidiEvent, time: u64) {
        let (event, clamped) = event.sanitize();
        if clamped {
            self.diagnostics.record(DiagnosticKind::MalformedEvent);
        }

        let timed = TimedEvent {
            time,
            seq: self.next_seq,
            event,
        };
        self.next_seq += 1;

        if self.backlog.len() == self.capacity {
            self.backlog.pop_front();
            self.diagnostics.record(DiagnosticKind::QueueOverflow);
        }
        self.backlog.push_back(timed);
        self.flush();
    }

    /// Parse raw MIDI bytes and schedule them. Returns false (and counts a
    /// malformed event) when the bytes are not a channel-voice message.
    pub fn submit_midi(&mut self, bytes: &[u8], time: u64) -> bool {
        match MidiEvent::parse(bytes) {
            Some(event) => {
                self.submit(event, time);
                true
            }
            None => {
                self.diagnostics.record(DiagnosticKind::MalformedEvent);
                false
            }
        }
    }

    /// Move backlog into the ring while it has room. Returns how many
    /// events are still waiting.
    pub fn flush(&mut self) -> usize {
        while let Some(&front) = self.backlog.front() {
            match self.producer.push(front) {
                Ok(()) => {
                    self.backlog.pop_front();
                }
                Err(PushError::Full(_)) => break,
            }
        }
        self.backlog.len()
    }

    /// First sample of the block the engine will render next.
    pub fn engine_time(&self) -> u64 {
        self.clock.load(Ordering::Relaxed)
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Log every counter that moved since the last report and return the
    /// deltas.
    pub fn report(&mut self) -> DiagnosticsSnapshot {
        let now = self.diagnostics.snapshot();
        let delta = now.since(&self.reported);
        self.reported = now;

        if delta.queue_overflows > 0 {
            tracing::warn!(dropped = delta.queue_overflows, "event queue overflowed, oldest events dropped");
        }
        if delta.invalid_references > 0 {
            tracing::warn!(count = delta.invalid_references, "events referenced missing instruments");
        }
        if delta.malformed_events > 0 {
            tracing::warn!(count = delta.malformed_events, "malformed events clamped or ignored");
        }
        if delta.voice_steals > 0 {
            tracing::debug!(count = delta.voice_steals, "voices stolen");
        }
        delta
    }
}

/// Audio-thread end of the event queue.
pub struct EventQueue {
    consumer: Consumer<TimedEvent>,
    pending: VecDeque<TimedEvent>,
    // Drain scratch, sized to `capacity` up front
    incoming: Vec<TimedEvent>,
    merged: VecDeque<TimedEvent>,
    seqs: Vec<u64>,
    capacity: usize,
    diagnostics: Arc<Diagnostics>,
}

impl EventQueue {
    /// Pull everything the sender has pushed into the time-ordered set.
    ///
    /// The new events are sorted as one batch and merged in, so a drain
    /// costs O(n log n) in the number of events however full the queue is.
    pub fn drain(&mut self) {
        self.incoming.clear();
        while self.incoming.len() < self.capacity {
            match self.consumer.pop() {
                Ok(event) => self.incoming.push(event),
                Err(_) => break,
            }
        }
        if self.incoming.is_empty() {
            return;
        }

        let overflow = (self.pending.len() + self.incoming.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.drop_oldest(overflow);
        }

        self.incoming.sort_unstable_by_key(TimedEvent::key);
        self.merge_incoming();
    }

    /// Drop the `count` events with the lowest submission numbers. Every
    /// pending event was submitted before every incoming one, and
    /// `incoming` is still in submission order here.
    fn drop_oldest(&mut self, count: usize) {
        if count >= self.pending.len() {
            let from_incoming = count - self.pending.len();
            self.pending.clear();
            self.incoming.drain(..from_incoming);
        } else {
            self.seqs.clear();
            self.seqs.extend(self.pending.iter().map(|e| e.seq));
            let (_, &mut newest_dropped, _) = self.seqs.select_nth_unstable(count - 1);
            self.pending.retain(|e| e.seq > newest_dropped);
        }

        for _ in 0..count {
            self.diagnostics.record(DiagnosticKind::QueueOverflow);
        }
    }

    fn merge_incoming(&mut self) {
        self.merged.clear();
        let mut incoming = self.incoming.iter().copied().peekable();
        while let Some(old) = self.pending.pop_front() {
            while let Some(new) = incoming.next_if(|e| e.key() < old.key()) {
                self.merged.push_back(new);
            }
            self.merged.push_back(old);
        }
        self.merged.extend(incoming);
        std::mem::swap(&mut self.pending, &mut self.merged);
    }

    /// Pop the next event if it is due before sample `end`.
    #[inline]
    pub fn pop_due(&mut self, end: u64) -> Option<TimedEvent> {
        match self.pending.front() {
            Some(e) if e.time < end => self.pending.pop_front(),
            _ => None,
        }
    }

    pub fn next_time(&self) -> Option<u64> {
        self.pending.front().map(|e| e.time)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop everything pending and everything still in the ring.
    pub fn clear(&mut self) {
        while self.consumer.pop().is_ok() {}
        self.pending.clear();
    }
}
