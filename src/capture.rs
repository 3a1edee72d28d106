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
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use tracing::{info, span, Level, Span};

use crate::{
    buffer::{ContentsSource, SampleBuffer},
    error::EngineError,
    line::InputLine,
    timer::{SamplePeriod, TickControl, Timer},
};

/// State shared between the capture tick and the control context. The control context
/// only ever moves capturing to true; the tick owns the cursor and the move back to false
/// (stop may also force it false, but only after the timer is disarmed).
#[derive(Default)]
struct Shared {
    capturing: AtomicBool,
    cursor: AtomicUsize,
    completed: AtomicBool,
}

/// Fills the resident buffer from an input line at a fixed rate, then halts itself.
pub struct CaptureEngine {
    buffer: Arc<SampleBuffer>,
    input: Arc<dyn InputLine>,
    timer: Box<dyn Timer>,
    period: SamplePeriod,
    shared: Arc<Shared>,
    span: Span,
}

impl CaptureEngine {
    /// Creates an idle capture engine.
    pub fn new(
        buffer: Arc<SampleBuffer>,
        input: Arc<dyn InputLine>,
        timer: Box<dyn Timer>,
        period: SamplePeriod,
    ) -> CaptureEngine {
        CaptureEngine {
            buffer,
            input,
            timer,
            period,
            shared: Arc::new(Shared::default()),
            span: span!(Level::INFO, "capture"),
        }
    }

    /// Zero-fills the buffer and starts sampling.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let _enter = self.span.enter();

        if self.is_capturing() {
            return Err(EngineError::AlreadyActive("capture"));
        }

        // Reaps a timer thread left over from a capture that completed on its own.
        self.timer.disarm();
        self.buffer.reset();
        self.shared.cursor.store(0, Ordering::Relaxed);
        self.shared.completed.store(false, Ordering::Relaxed);
        self.shared.capturing.store(true, Ordering::Release);

        let shared = self.shared.clone();
        let buffer = self.buffer.clone();
        let input = self.input.clone();
        if let Err(e) = self.timer.arm(
            self.period,
            Box::new(move || CaptureEngine::tick(&shared, &buffer, input.as_ref())),
        ) {
            self.shared.capturing.store(false, Ordering::Release);
            return Err(e.into());
        }

        info!(
            input = %self.input,
            capacity = self.buffer.capacity(),
            rate = self.period.rate(),
            "Capture started."
        );
        Ok(())
    }

    /// One sample. Runs on the timer thread.
    fn tick(shared: &Shared, buffer: &SampleBuffer, input: &dyn InputLine) -> TickControl {
        if !shared.capturing.load(Ordering::Acquire) {
            return TickControl::Halt;
        }

        let mut cursor = shared.cursor.load(Ordering::Relaxed);
        if cursor < buffer.capacity() {
            buffer.store(cursor, input.read());
            cursor += 1;
            shared.cursor.store(cursor, Ordering::Relaxed);
        }

        if cursor < buffer.capacity() {
            return TickControl::Continue;
        }

        buffer.set_valid_length(cursor);
        buffer.set_source(ContentsSource::Captured);
        shared.capturing.store(false, Ordering::Release);
        shared.completed.store(true, Ordering::Release);
        TickControl::Halt
    }

    /// Stops sampling. Levels captured so far stay in the buffer as a partial capture.
    pub fn stop(&mut self) {
        let _enter = self.span.enter();

        self.timer.disarm();
        if self.shared.capturing.swap(false, Ordering::AcqRel) {
            let captured = self.shared.cursor.load(Ordering::Relaxed);
            self.buffer.set_valid_length(captured);
            self.buffer.set_source(ContentsSource::Captured);
            info!(captured, "Capture stopped early.");
        }
        self.shared.cursor.store(0, Ordering::Relaxed);
    }

    pub fn is_capturing(&self) -> bool {
        self.shared.capturing.load(Ordering::Acquire)
    }

    /// The number of levels captured so far in the running session.
    pub fn cursor(&self) -> usize {
        self.shared.cursor.load(Ordering::Relaxed)
    }

    /// Returns the captured length once per capture that ran to completion.
    pub fn take_completion(&self) -> Option<usize> {
        self.shared
            .completed
            .swap(false, Ordering::AcqRel)
            .then(|| self.buffer.valid_length())
    }
}

impl Drop for CaptureEngine {
    fn drop(&mut self) {
        self.timer.disarm();
    }
}
