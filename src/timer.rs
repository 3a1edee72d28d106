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
use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use thread_priority::ThreadPriorityValue;

#[cfg(test)]
pub mod mock;
pub mod priority;

/// Returned by a tick to tell its timer whether to keep firing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Halt,
}

/// The callback bound to a periodic timer.
pub type Tick = Box<dyn FnMut() -> TickControl + Send + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    #[error("unable to start timer thread: {0}")]
    Spawn(#[from] io::Error),

    #[error("timer is already armed")]
    AlreadyArmed,

    #[error("timer period must be non-zero")]
    ZeroPeriod,
}

/// A tick period of exactly one second divided by a whole rate.
///
/// Deadlines are computed from the tick count rather than by adding a rounded period,
/// so the fractional nanoseconds of rates like 300 kHz never accumulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplePeriod {
    rate: u32,
}

impl SamplePeriod {
    /// The period of a timer firing rate times per second.
    pub const fn from_rate(rate: u32) -> SamplePeriod {
        SamplePeriod { rate }
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn is_zero(&self) -> bool {
        self.rate == 0
    }

    /// The time from arming until the given tick is due, exact to the nanosecond.
    pub fn offset(&self, ticks: u64) -> Duration {
        if self.rate == 0 {
            return Duration::ZERO;
        }
        let nanos = u128::from(ticks) * 1_000_000_000 / u128::from(self.rate);
        Duration::new(
            u64::try_from(nanos / 1_000_000_000).unwrap_or(u64::MAX),
            (nanos % 1_000_000_000) as u32,
        )
    }
}

/// A periodic timer. Ticks never overlap with themselves.
pub trait Timer: Send {
    /// Starts calling the tick once per period until it halts or the timer is disarmed.
    fn arm(&mut self, period: SamplePeriod, tick: Tick) -> Result<(), TimerError>;

    /// Stops the timer. Blocks until any in-flight tick has returned; no tick runs afterwards.
    /// Calling this on a disarmed timer does nothing.
    fn disarm(&mut self);

    /// Returns true if the timer will fire again.
    fn is_armed(&self) -> bool;
}

/// A periodic timer backed by a dedicated thread that paces itself against absolute
/// deadlines, so sleep overshoot on one tick does not accumulate into drift.
pub struct ThreadTimer {
    /// The name given to the tick thread.
    name: String,
    /// The priority the tick thread asks for.
    priority: ThreadPriorityValue,
    /// Set to request the tick thread to exit.
    stop: Arc<AtomicBool>,
    /// The running tick thread, if any.
    handle: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    /// Creates a new, disarmed thread timer.
    pub fn new(name: &str, priority: ThreadPriorityValue) -> ThreadTimer {
        ThreadTimer {
            name: name.to_string(),
            priority,
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Joins a tick thread that halted itself. Returns false if the thread is still running.
    fn reap(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) if handle.is_finished() => {
                let _ = handle.join();
                true
            }
            Some(handle) => {
                self.handle = Some(handle);
                false
            }
            None => true,
        }
    }
}

impl Timer for ThreadTimer {
    fn arm(&mut self, period: SamplePeriod, mut tick: Tick) -> Result<(), TimerError> {
        if period.is_zero() {
            return Err(TimerError::ZeroPeriod);
        }
        if !self.reap() {
            return Err(TimerError::AlreadyArmed);
        }

        let stop = Arc::new(AtomicBool::new(false));
        self.stop = stop.clone();
        let priority = self.priority;
        let handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                priority::configure_tick_thread_priority(priority, priority::rt_enabled());

                let start = Instant::now();
                let mut ticks: u64 = 0;
                loop {
                    ticks += 1;
                    let deadline = start + period.offset(ticks);
                    spin_sleep::sleep(deadline.saturating_duration_since(Instant::now()));
                    if stop.load(Ordering::Acquire) {
                        return;
                    }
                    if tick() == TickControl::Halt {
                        return;
                    }
                }
            })?;
        self.handle = Some(handle);
        Ok(())
    }

    fn disarm(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            // A tick that disarms its own timer must not join itself.
            if handle.thread().id() == thread::current().id() {
                return;
            }
            let _ = handle.join();
        }
    }

    fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
