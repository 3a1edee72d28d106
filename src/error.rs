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
use crate::timer::TimerError;

/// Errors from starting the capture and playback engines. None of these are fatal: the
/// engine is left idle and the caller decides what to do.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0} is already active")]
    AlreadyActive(&'static str),

    #[error("nothing to play: source is empty")]
    EmptySource,

    #[error("unable to arm sample timer: {0}")]
    TimerArmFailure(#[from] TimerError),
}
