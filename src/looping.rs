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
use std::{fmt, sync::Arc};

use tracing::{error, info};

use crate::{buffer::SampleBuffer, error::EngineError, playback::PlaybackEngine};

/// Whether replays repeat, and how long to wait between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopPolicy {
    pub enabled: bool,
    pub pause_millis: u32,
}

impl LoopPolicy {
    pub fn new(pause_millis: u32) -> LoopPolicy {
        LoopPolicy {
            enabled: false,
            pause_millis,
        }
    }
}

impl fmt::Display for LoopPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loop {} (pause {} ms)",
            if self.enabled { "on" } else { "off" },
            self.pause_millis
        )
    }
}

/// Re-arms playback of the resident buffer once the pause after the last run has elapsed.
/// Evaluated from the control context once per iteration, never from a tick.
///
/// A failed re-arm leaves looping on and the completion timestamp untouched, so a timer
/// that keeps failing is retried on every later evaluation.
pub struct LoopScheduler {
    policy: LoopPolicy,
}

impl LoopScheduler {
    pub fn new(policy: LoopPolicy) -> LoopScheduler {
        LoopScheduler { policy }
    }

    pub fn policy(&self) -> LoopPolicy {
        self.policy
    }

    /// Flips looping on or off and returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.policy.enabled = !self.policy.enabled;
        self.policy.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.policy.enabled = enabled;
    }

    pub fn set_pause(&mut self, pause_millis: u32) {
        self.policy.pause_millis = pause_millis;
    }

    /// Returns true if playback should be re-armed at clock time now.
    pub fn is_due(&self, playback: &PlaybackEngine, buffer: &SampleBuffer, now: u64) -> bool {
        self.policy.enabled
            && !playback.is_playing()
            && buffer.valid_length() > 0
            && now.saturating_sub(playback.last_completion_millis())
                >= u64::from(self.policy.pause_millis)
    }

    /// Re-arms playback from the start of the resident buffer if it is due. Returns None
    /// when nothing was attempted.
    pub fn evaluate(
        &self,
        playback: &mut PlaybackEngine,
        buffer: &Arc<SampleBuffer>,
        now: u64,
    ) -> Option<Result<(), EngineError>> {
        if !self.is_due(playback, buffer, now) {
            return None;
        }

        let result = playback.start(buffer.clone(), buffer.valid_length());
        match &result {
            Ok(()) => info!(samples = buffer.valid_length(), "Loop replay started."),
            Err(e) => error!(err = %e, "Unable to start loop replay."),
        }
        Some(result)
    }
}
