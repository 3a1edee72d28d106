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
use std::{error::Error, fmt, sync::Arc};

pub mod mock;
pub mod sysfs;

/// A two-valued digital line state. Stored as one byte per sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    /// Returns the byte stored for this level.
    pub const fn as_byte(self) -> u8 {
        match self {
            Level::Low => 0x00,
            Level::High => 0x01,
        }
    }

    /// Any non-zero byte reads back as high.
    pub const fn from_byte(byte: u8) -> Level {
        if byte == 0 {
            Level::Low
        } else {
            Level::High
        }
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "1" => Ok(Level::High),
            "low" | "0" => Ok(Level::Low),
            _ => Err(format!("unknown level {}", s)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "low"),
            Level::High => write!(f, "high"),
        }
    }
}

/// A line that can be sampled. Reads happen from timer tick context, so they must not block.
pub trait InputLine: fmt::Display + Send + Sync {
    /// Reads the current level of the line.
    fn read(&self) -> Level;

    /// The number of reads that failed since the line was opened. A failed read samples low.
    fn errors(&self) -> u64 {
        0
    }
}

/// A line that can be driven. Writes happen from timer tick context, so they must not block.
pub trait OutputLine: fmt::Display + Send + Sync {
    /// Drives the line to the given level.
    fn write(&self, level: Level);

    /// The number of writes that failed since the line was opened.
    fn errors(&self) -> u64 {
        0
    }
}

/// Gets the input line described by the given spec.
pub fn get_input(spec: &str) -> Result<Arc<dyn InputLine>, Box<dyn Error>> {
    if spec.starts_with("mock") {
        return Ok(Arc::new(mock::Input::get(spec)));
    }

    Ok(Arc::new(sysfs::Input::get(sysfs::parse_spec(spec)?)?))
}

/// Gets the output line described by the given spec.
pub fn get_output(spec: &str) -> Result<Arc<dyn OutputLine>, Box<dyn Error>> {
    if spec.starts_with("mock") {
        return Ok(Arc::new(mock::Output::get(spec)));
    }

    Ok(Arc::new(sysfs::Output::get(sysfs::parse_spec(spec)?)?))
}
