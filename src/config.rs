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
use std::{error::Error, path::Path, sync::Arc};

use tracing::info;

use crate::{
    clock::SystemClock,
    controller::{keyboard, Controller},
    line,
    recorder::{Hardware, Recorder},
    storage::DirStorage,
    timer::{priority, ThreadTimer},
};

pub mod error;
pub mod recorder;

pub use self::error::ConfigError;

/// Builds a recorder with thread timers and directory storage from the configuration.
pub fn init_recorder(config: &recorder::Recorder) -> Result<Recorder, Box<dyn Error>> {
    let settings = config.settings()?;
    let input = line::get_input(config.input())?;
    let output = line::get_output(config.output())?;
    let priority = priority::tick_thread_priority(config.tick_thread_priority());
    let storage = DirStorage::new(
        &config.storage().directory(),
        config.storage().prefix(),
        config.storage().suffix(),
    )?;

    info!(
        input = %input,
        output = %output,
        sample_rate = settings.sample_rate,
        capacity = settings.capacity,
        directory = ?config.storage().directory(),
        "Recorder configured."
    );

    Ok(Recorder::new(
        settings,
        Hardware {
            input,
            output,
            capture_timer: Box::new(ThreadTimer::new("capture-tick", priority)),
            playback_timer: Box::new(ThreadTimer::new("playback-tick", priority)),
            clock: Arc::new(SystemClock::new()),
        },
        Box::new(storage),
    ))
}

/// Loads the configuration and starts a controller reading commands from the keyboard.
pub fn init_recorder_and_controller(config_path: &Path) -> Result<Controller, Box<dyn Error>> {
    let config = recorder::Recorder::deserialize(config_path)?;
    let recorder = init_recorder(&config)?;
    Controller::new(
        recorder,
        Arc::new(keyboard::Driver::new()),
        config.control_tick()?,
    )
}
