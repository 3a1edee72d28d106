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
use std::{path::Path, path::PathBuf, time::Duration};

use config::{Config, Environment, File};
use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;
use crate::recorder::Settings;

const DEFAULT_SAMPLE_RATE: u32 = 300_000;
const DEFAULT_CAPACITY: usize = 15_000;
const DEFAULT_LOOP_PAUSE: Duration = Duration::from_secs(1);
const DEFAULT_CONTROL_TICK: Duration = Duration::from_millis(1);
const DEFAULT_PIN_POLL_INTERVAL: Duration = Duration::ZERO;
const DEFAULT_PREFIX: &str = "rec";
const DEFAULT_SUFFIX: &str = ".bin";

#[derive(Deserialize, Clone, Debug)]
pub struct Storage {
    /// The directory records are kept in.
    directory: String,
    /// Prepended to the record index to form a file name (default: "rec").
    prefix: Option<String>,
    /// Appended to the record index to form a file name (default: ".bin").
    suffix: Option<String>,
}

impl Storage {
    pub fn directory(&self) -> PathBuf {
        PathBuf::from(&self.directory)
    }

    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }

    pub fn suffix(&self) -> &str {
        self.suffix.as_deref().unwrap_or(DEFAULT_SUFFIX)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Recorder {
    /// The line to capture from, e.g. "sysfs:17" or "mock".
    input: String,

    /// The line to play back on.
    output: String,

    /// Samples per second for both capture and playback (default: 300000).
    sample_rate: Option<u32>,

    /// The number of samples the resident buffer holds (default: 15000).
    capacity: Option<usize>,

    /// Pause between loop replays (default: 1s).
    loop_pause: Option<String>,

    /// How often the control loop runs housekeeping (default: 1ms).
    control_tick: Option<String>,

    /// Delay between polls while waiting for a trigger level. Zero only yields (default: 0s).
    pin_poll_interval: Option<String>,

    /// Priority of the tick threads, 0 through 99 (default: 70).
    tick_thread_priority: Option<u8>,

    /// Where records are stored.
    storage: Storage,
}

impl Recorder {
    /// Loads the recorder configuration from a YAML file. PINREC_* environment variables
    /// override file values, with __ separating nested keys (PINREC_STORAGE__DIRECTORY).
    pub fn deserialize(path: &Path) -> Result<Recorder, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix("PINREC")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Recorder>()?)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn sample_rate(&self) -> Result<u32, ConfigError> {
        match self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE) {
            0 => Err(ConfigError::InvalidValue {
                field: "sample_rate",
                message: "must be greater than zero".to_string(),
            }),
            rate => Ok(rate),
        }
    }

    pub fn capacity(&self) -> Result<usize, ConfigError> {
        match self.capacity.unwrap_or(DEFAULT_CAPACITY) {
            0 => Err(ConfigError::InvalidValue {
                field: "capacity",
                message: "must be greater than zero".to_string(),
            }),
            capacity if u32::try_from(capacity).is_err() => Err(ConfigError::InvalidValue {
                field: "capacity",
                message: format!("{} does not fit a record header", capacity),
            }),
            capacity => Ok(capacity),
        }
    }

    pub fn loop_pause(&self) -> Result<Duration, ConfigError> {
        parse_duration("loop_pause", &self.loop_pause, DEFAULT_LOOP_PAUSE)
    }

    pub fn control_tick(&self) -> Result<Duration, ConfigError> {
        let tick = parse_duration("control_tick", &self.control_tick, DEFAULT_CONTROL_TICK)?;
        if tick.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "control_tick",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(tick)
    }

    pub fn pin_poll_interval(&self) -> Result<Duration, ConfigError> {
        parse_duration(
            "pin_poll_interval",
            &self.pin_poll_interval,
            DEFAULT_PIN_POLL_INTERVAL,
        )
    }

    pub fn tick_thread_priority(&self) -> Option<u8> {
        self.tick_thread_priority
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The recorder settings described by this configuration.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let loop_pause = self.loop_pause()?;
        Ok(Settings {
            sample_rate: self.sample_rate()?,
            capacity: self.capacity()?,
            loop_pause_millis: u32::try_from(loop_pause.as_millis()).map_err(|_| {
                ConfigError::InvalidValue {
                    field: "loop_pause",
                    message: format!("{:?} is too long", loop_pause),
                }
            })?,
            pin_poll_interval: self.pin_poll_interval()?,
        })
    }
}

fn parse_duration(
    field: &'static str,
    value: &Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        Some(value) => DurationString::from_string(value.clone())
            .map(Into::into)
            .map_err(|e| ConfigError::InvalidDuration {
                field,
                message: e.to_string(),
            }),
        None => Ok(default),
    }
}
