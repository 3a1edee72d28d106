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
use std::time::Duration;

use tracing::info;

use crate::line::{InputLine, Level};

/// Waits for an input line to reach a level before a capture is armed.
///
/// The wait yields to the runtime on every poll and has no timeout. It must not run while
/// a capture or playback session is active.
pub struct PinWaiter {
    /// Extra delay between polls. Zero only yields.
    poll_interval: Duration,
}

impl PinWaiter {
    pub fn new(poll_interval: Duration) -> PinWaiter {
        PinWaiter { poll_interval }
    }

    /// Returns once the line reads the target level. Returns the number of polls it took.
    pub async fn wait_for(&self, input: &dyn InputLine, target: Level) -> u64 {
        info!(input = %input, target = %target, "Waiting for input level.");

        let mut polls = 0u64;
        loop {
            polls += 1;
            if input.read() == target {
                return polls;
            }
            if self.poll_interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }
}

impl Default for PinWaiter {
    fn default() -> Self {
        PinWaiter::new(Duration::ZERO)
    }
}
