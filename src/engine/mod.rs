pub mod mixer;
pub mod queue;
pub mod scheduler;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

pub use self::queue::EventSender;
use self::{
    mixer::Mixer,
    queue::event_queue,
    scheduler::{BlockStep, Scheduler},
};
use crate::{
    bank::SampleStore,
    config::EngineConfig,
    diagnostics::{Diagnostics, DiagnosticsSnapshot},
    error::SynthError,
    synth::VoiceManager,
    MAX_BLOCK_SIZE,
};

/// The synthesis core: scheduler, voice pool and mixer behind one
/// realtime-safe `process` call.
///
/// Built together with the [`EventSender`] that feeds it. The engine
/// moves to the audio thread, the sender stays on the control side.
pub struct ChipEngine {
    config: EngineConfig,
    scheduler: Scheduler,
    voices: VoiceManager,
    mixer: Mixer,
    diagnostics: Arc<Diagnostics>,
    clock: Arc<AtomicU64>,
}

impl ChipEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn SampleStore>,
    ) -> Result<(Self, EventSender), SynthError> {
        config.validate()?;

        let diagnostics = Arc::new(Diagnostics::new());
        let clock = Arc::new(AtomicU64::new(0));
        let (sender, queue) =
            event_queue(config.queue_capacity, diagnostics.clone(), clock.clone());

        let engine = Self {
            scheduler: Scheduler::new(queue),
            voices: VoiceManager::new(&config, store, diagnostics.clone()),
            mixer: Mixer::new(&config),
            diagnostics,
            clock,
            config,
        };

        tracing::info!(
            sample_rate = engine.config.sample_rate,
            polyphony = engine.config.polyphony,
            queue_capacity = engine.config.queue_capacity,
            steal_release_samples = engine.config.steal_release_samples(),
            "chip engine ready"
        );
        Ok((engine, sender))
    }

    /// Render interleaved stereo into `out`. A trailing odd sample is
    /// zeroed.
    pub fn process(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE * 2) {
            let frames = chunk.len() / 2;
            self.render_block(frames);
            self.mixer.write_interleaved(chunk);
            if chunk.len() % 2 == 1 {
                chunk[chunk.len() - 1] = 0.0;
            }
        }
    }

    /// Render into separate left and right buffers. Only the shorter
    /// length is rendered; the rest of the longer buffer is zeroed.
    pub fn process_planar(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let (left, left_tail) = left.split_at_mut(frames);
        let (right, right_tail) = right.split_at_mut(frames);
        left_tail.fill(0.0);
        right_tail.fill(0.0);

        for (l, r) in left
            .chunks_mut(MAX_BLOCK_SIZE)
            .zip(right.chunks_mut(MAX_BLOCK_SIZE))
        {
            self.render_block(l.len());
            self.mixer.write_planar(l, r);
        }
    }

    fn render_block(&mut self, frames: usize) {
        if frames == 0 {
            return;
        }
        self.mixer.begin(frames);

        let voices = &mut self.voices;
        let mixer = &mut self.mixer;
        self.scheduler.advance(frames, |step| match step {
            BlockStep::Dispatch { at, event } => voices.dispatch(event, at),
            BlockStep::Render(range) => voices.render(&mut mixer.bus(range)),
        });

        self.mixer.finish(frames);
        self.clock.store(self.scheduler.now(), Ordering::Relaxed);
    }

    /// Silence every voice, drop undispatched events and clear the effect
    /// tails. The sample clock keeps running.
    pub fn reset(&mut self) {
        self.scheduler.clear();
        self.voices.reset();
        self.mixer.reset();
    }

    pub fn voice_manager(&self) -> &VoiceManager {
        &self.voices
    }

    /// Sample time of the next block's first frame.
    pub fn current_sample(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
