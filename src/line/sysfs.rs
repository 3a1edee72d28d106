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
    error::Error,
    fmt,
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tracing::info;

use super::Level;

const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";
const SPEC_PREFIX: &str = "sysfs:";

/// Parses a line spec of the form sysfs:<N> into a GPIO number.
pub fn parse_spec(spec: &str) -> Result<u32, Box<dyn Error>> {
    let Some(number) = spec.strip_prefix(SPEC_PREFIX) else {
        return Err(format!("unrecognized line spec {}", spec).into());
    };
    number
        .parse::<u32>()
        .map_err(|e| format!("invalid GPIO number in {}: {}", spec, e).into())
}

fn value_path(gpio: u32) -> PathBuf {
    PathBuf::from(SYSFS_GPIO_ROOT)
        .join(format!("gpio{}", gpio))
        .join("value")
}

/// A GPIO input read through its sysfs value file. Exporting the pin and setting its
/// direction happen outside of this crate.
pub struct Input {
    gpio: u32,
    file: Mutex<File>,
    errors: AtomicU64,
}

impl Input {
    /// Opens the value file for the given GPIO.
    pub fn get(gpio: u32) -> Result<Input, io::Error> {
        Input::open(gpio, value_path(gpio))
    }

    pub(crate) fn open(gpio: u32, path: PathBuf) -> Result<Input, io::Error> {
        let file = File::open(&path)?;
        info!(gpio, path = ?path, "Opened sysfs input line.");
        Ok(Input {
            gpio,
            file: Mutex::new(file),
            errors: AtomicU64::new(0),
        })
    }

    fn read_value(&self) -> Result<Level, io::Error> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(0))?;
        let mut value = [0u8; 1];
        file.read_exact(&mut value)?;
        Ok(Level::from(value[0] == b'1'))
    }
}

impl super::InputLine for Input {
    fn read(&self) -> Level {
        match self.read_value() {
            Ok(level) => level,
            Err(_) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                Level::Low
            }
        }
    }

    fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio{} (sysfs)", self.gpio)
    }
}

/// A GPIO output driven through its sysfs value file.
pub struct Output {
    gpio: u32,
    file: Mutex<File>,
    errors: AtomicU64,
}

impl Output {
    /// Opens the value file for the given GPIO.
    pub fn get(gpio: u32) -> Result<Output, io::Error> {
        Output::open(gpio, value_path(gpio))
    }

    pub(crate) fn open(gpio: u32, path: PathBuf) -> Result<Output, io::Error> {
        let file = OpenOptions::new().write(true).open(&path)?;
        info!(gpio, path = ?path, "Opened sysfs output line.");
        Ok(Output {
            gpio,
            file: Mutex::new(file),
            errors: AtomicU64::new(0),
        })
    }

    fn write_value(&self, level: Level) -> Result<(), io::Error> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(0))?;
        file.write_all(match level {
            Level::Low => b"0",
            Level::High => b"1",
        })
    }
}

impl super::OutputLine for Output {
    fn write(&self, level: Level) {
        if self.write_value(level).is_err() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpio{} (sysfs)", self.gpio)
    }
}
