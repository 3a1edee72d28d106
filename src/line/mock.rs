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
    collections::VecDeque,
    fmt,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;

use super::Level;

/// A mock input line. Reads come from a queued pattern first, then from the held level.
#[derive(Clone)]
pub struct Input {
    name: String,
    level: Arc<AtomicU8>,
    pattern: Arc<Mutex<VecDeque<Level>>>,
}

impl Input {
    /// Gets the given mock input.
    pub fn get(name: &str) -> Input {
        Input {
            name: name.to_string(),
            level: Arc::new(AtomicU8::new(Level::Low.as_byte())),
            pattern: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Holds the line at the given level.
    pub fn set(&self, level: Level) {
        self.level.store(level.as_byte(), Ordering::Relaxed);
    }

    /// Queues levels to be returned, one per read, before falling back to the held level.
    pub fn queue(&self, levels: &[Level]) {
        self.pattern.lock().extend(levels.iter().copied());
    }
}

impl super::InputLine for Input {
    fn read(&self) -> Level {
        if let Some(level) = self.pattern.lock().pop_front() {
            return level;
        }
        Level::from_byte(self.level.load(Ordering::Relaxed))
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

/// A mock output line. Keeps every level written to it.
#[derive(Clone)]
pub struct Output {
    name: String,
    written: Arc<Mutex<Vec<Level>>>,
}

impl Output {
    /// Gets the given mock output.
    pub fn get(name: &str) -> Output {
        Output {
            name: name.to_string(),
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns every level written so far, in order.
    pub fn written(&self) -> Vec<Level> {
        self.written.lock().clone()
    }

    /// Returns the last level written, if any.
    pub fn current(&self) -> Option<Level> {
        self.written.lock().last().copied()
    }

    /// Forgets all written levels.
    pub fn clear(&self) {
        self.written.lock().clear();
    }
}

impl super::OutputLine for Output {
    fn write(&self, level: Level) {
        self.written.lock().push(level);
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
