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
use std::{io, sync::Arc};

use parking_lot::Mutex;

use super::{SamplePeriod, Tick, TickControl, Timer, TimerError};

#[derive(Default)]
struct State {
    tick: Option<Tick>,
    period: Option<SamplePeriod>,
    arms: usize,
    fail: bool,
}

/// A timer that only fires when told to. Clones share the same state, so a test can keep
/// one clone and hand the other to an engine.
#[derive(Clone, Default)]
pub struct Manual {
    state: Arc<Mutex<State>>,
}

impl Manual {
    /// Creates a manual timer.
    pub fn new() -> Manual {
        Manual::default()
    }

    /// Creates a manual timer that refuses to arm.
    pub fn failing() -> Manual {
        let timer = Manual::default();
        timer.state.lock().fail = true;
        timer
    }

    /// Makes future arm calls fail or succeed.
    pub fn set_failing(&self, fail: bool) {
        self.state.lock().fail = fail;
    }

    /// Fires one tick. Returns false if the timer was not armed.
    pub fn fire(&self) -> bool {
        let mut state = self.state.lock();
        let Some(tick) = state.tick.as_mut() else {
            return false;
        };
        if tick() == TickControl::Halt {
            state.tick = None;
        }
        true
    }

    /// Fires up to count ticks and returns how many actually ran.
    pub fn fire_n(&self, count: usize) -> usize {
        (0..count).take_while(|_| self.fire()).count()
    }

    /// The period passed to the last successful arm.
    pub fn period(&self) -> Option<SamplePeriod> {
        self.state.lock().period
    }

    /// The number of successful arm calls.
    pub fn arms(&self) -> usize {
        self.state.lock().arms
    }
}

impl Timer for Manual {
    fn arm(&mut self, period: SamplePeriod, tick: Tick) -> Result<(), TimerError> {
        let mut state = self.state.lock();
        if state.fail {
            return Err(TimerError::Spawn(io::Error::other("mock timer failure")));
        }
        if state.tick.is_some() {
            return Err(TimerError::AlreadyArmed);
        }
        state.tick = Some(tick);
        state.period = Some(period);
        state.arms += 1;
        Ok(())
    }

    fn disarm(&mut self) {
        // Holding the lock waits out a tick that is firing on another thread.
        self.state.lock().tick = None;
    }

    fn is_armed(&self) -> bool {
        self.state.lock().tick.is_some()
    }
}
