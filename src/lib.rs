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
//! A fixed-rate recorder for a single binary signal line: capture the line into a
//! resident buffer, replay it, loop it and keep numbered records of it on disk.
pub mod buffer;
pub mod capture;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod line;
pub mod looping;
pub mod pinwait;
pub mod playback;
pub mod record;
pub mod recorder;
pub mod storage;
#[cfg(test)]
mod testutil;
pub mod timer;
pub mod util;
