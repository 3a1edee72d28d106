// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use tracing::{info, span, Span};

use crate::{
    buffer::SampleBuffer,
    clock::Clock,
    error::EngineError,
    line::{Level, OutputLine},
    timer::{SamplePeriod, TickControl, Timer},
};

/// State shared between the playback tick and the control context.
#[derive(Default)]
struct Shared {
    playing: AtomicBool,
    cursor: AtomicUsize,
    completed: AtomicBool,
    /// Clock milliseconds at the instant the last run finished.
    last_completion: AtomicU64,
}

/// Everything a playback tick needs, moved onto the timer thread when a run starts.
struct Session {
    shared: Arc<Shared>,
    source: Arc<SampleBuffer>,
    length: usize,
    output: Arc<dyn OutputLine>,
    clock: Arc<dyn Clock>,
}

impl Session {
    fn tick(&self) -> TickControl {
        let shared = &self.shared;
        if !shared.playing.load(Ordering::Acquire) {
            return TickControl::Halt;
        }

        let mut cursor = shared.cursor.load(Ordering::Relaxed);
        if cursor < self.length {
            self.output.write(self.source.level(cursor));
            cursor += 1;
            shared.cursor.store(cursor, Ordering::Relaxed);
        }

        if cursor < self.length {
            return TickControl::Continue;
        }

        self.output.write(Level::Low);
        shared
            .last_completion
            .store(self.clock.now_millis(), Ordering::Release);
        shared.playing.store(false, Ordering::Release);
        shared.completed.store(true, Ordering::Release);
        TickControl::Halt
    }
}

/// Drains a buffer onto an output line at a fixed rate, then halts itself.
pub struct PlaybackEngine {
    output: Arc<dyn OutputLine>,
    timer: Box<dyn Timer>,
    period: SamplePeriod,
    clock: Arc<dyn Clock>,
    shared: Arc<Shared>,
    /// The buffer bound by the current run.
    source: Option<Arc<SampleBuffer>>,
    length: usize,
    span: Span,
}

impl PlaybackEngine {
    /// Creates an idle playback engine.
    pub fn new(
        output: Arc<dyn OutputLine>,
        timer: Box<dyn Timer>,
        period: SamplePeriod,
        clock: Arc<dyn Clock>,
    ) -> PlaybackEngine {
        PlaybackEngine {
            output,
            timer,
            period,
            clock,
            shared: Arc::new(Shared::default()),
            source: None,
            length: 0,
            span: span!(tracing::Level::INFO, "playback"),
        }
    }

    /// Starts playing the first length levels of source. Lengths past the source's capacity
    /// are clamped.
    pub fn start(&mut self, source: Arc<SampleBuffer>, length: usize) -> Result<(), EngineError> {
        let _enter = self.span.enter();

        if self.is_playing() {
            return Err(EngineError::AlreadyActive("playback"));
        }
        let length = length.min(source.capacity());
        if length == 0 {
            return Err(EngineError::EmptySource);
        }

        // Reaps a timer thread left over from a run that completed on its own.
        self.timer.disarm();
        self.shared.cursor.store(0, Ordering::Relaxed);
        self.shared.completed.store(false, Ordering::Relaxed);
        self.shared.playing.store(true, Ordering::Release);

        let session = Session {
            shared: self.shared.clone(),
            source: source.clone(),
            length,
            output: self.output.clone(),
            clock: self.clock.clone(),
        };
        if let Err(e) = self
            .timer
            .arm(self.period, Box::new(move || session.tick()))
        {
            self.shared.playing.store(false, Ordering::Release);
            return Err(e.into());
        }

        self.source = Some(source);
        self.length = length;
        info!(
            output = %self.output,
            samples = length,
            rate = self.period.rate(),
            "Playback started."
        );
        Ok(())
    }

    /// Stops playing and drives the output low. Safe to call at any time.
    pub fn stop(&mut self) {
        let _enter = self.span.enter();

        self.timer.disarm();
        if self.shared.playing.swap(false, Ordering::AcqRel) {
            self.output.write(Level::Low);
            info!(
                played = self.shared.cursor.load(Ordering::Relaxed),
                samples = self.length,
                "Playback stopped early."
            );
        }
        self.source = None;
        self.length = 0;
        self.shared.cursor.store(0, Ordering::Relaxed);
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Acquire)
    }

    /// The number of levels written so far in the current run.
    pub fn cursor(&self) -> usize {
        self.shared.cursor.load(Ordering::Relaxed)
    }

    /// The length bound by the current or last run, zero after stop.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Clock milliseconds at which the last run finished on its own. Zero if none has.
    pub fn last_completion_millis(&self) -> u64 {
        self.shared.last_completion.load(Ordering::Acquire)
    }

    /// Returns true once per run that finished on its own.
    pub fn take_completion(&self) -> bool {
        self.shared.completed.swap(false, Ordering::AcqRel)
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.timer.disarm();
    }
}
