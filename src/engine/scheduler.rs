use std::ops::Range;

use crate::{engine::queue::EventQueue, io::midi::MidiEvent};

/*
Block Scheduling
================

The engine renders in blocks, but events land on exact samples. For a
block covering samples [now, now + n) the scheduler splits the block at
every due event:

    now                                              now + n
     │ render 0..17 │ ev@17 │ render 17..40 │ ev@40 ev@40 │ render 40..n │

Each event is dispatched before the samples from its offset onward are
rendered. Events whose time is already behind `now` are dispatched at
offset 0, in their queue order, ahead of anything scheduled later.
*/

/// One step of a block, in the order it must be performed.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockStep {
    /// Apply an event at absolute sample time `at`.
    Dispatch { at: u64, event: MidiEvent },
    /// Render this frame range of the current block.
    Render(Range<usize>),
}

pub struct Scheduler {
    queue: EventQueue,
    now: u64,
}

impl Scheduler {
    pub fn new(queue: EventQueue) -> Self {
        Self { queue, now: 0 }
    }

    /// Split the next `frames` samples into dispatch and render steps,
    /// then move the clock forward by `frames`.
    pub fn advance(&mut self, frames: usize, mut step: impl FnMut(BlockStep)) {
        self.queue.drain();

        let end = self.now + frames as u64;
        let mut cursor = 0;

        while let Some(timed) = self.queue.pop_due(end) {
            let offset = timed.time.saturating_sub(self.now) as usize;
            if offset > cursor {
                step(BlockStep::Render(cursor..offset));
                cursor = offset;
            }
            step(BlockStep::Dispatch {
                at: self.now + cursor as u64,
                event: timed.event,
            });
        }

        if cursor < frames {
            step(BlockStep::Render(cursor..frames));
        }
        self.now = end;
    }

    /// First sample of the next block.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Forget every undispatched event. The clock keeps running.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
