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
use std::{error::Error, io, sync::Arc, time::Duration};

use tokio::{
    sync::mpsc::{self, Sender},
    task::{JoinError, JoinHandle},
    time::MissedTickBehavior,
};
use tracing::{error, info, span, Instrument, Level as TraceLevel};

use crate::{
    buffer::samples_duration,
    line::Level,
    recorder::{Recorder, RecorderError},
    util::duration_millis,
};

pub mod keyboard;

#[derive(Debug, PartialEq, Eq)]
pub enum Event {
    /// Starts a capture, optionally after the input reaches the given level. The wait has
    /// no timeout and holds the controller, so no other event (stop included) is handled
    /// until the level is reached.
    Record(Option<Level>),

    /// Stops any capture or playback and turns looping off.
    Stop,

    /// Saves the resident buffer to the first free record index.
    Save,

    /// Plays the resident buffer, or the given record after loading it.
    Play(Option<u8>),

    /// Toggles looping of the resident buffer.
    Loop,

    /// Sets the pause between loop replays in milliseconds.
    Pause(u32),

    /// Lists stored records.
    List,

    /// Deletes the given record.
    Delete(u8),

    /// Reports the recorder status.
    Status,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller that applies driver events to the recorder and runs
    /// recorder housekeeping every control tick.
    pub fn new(
        recorder: Recorder,
        driver: Arc<dyn Driver>,
        control_tick: Duration,
    ) -> Result<Controller, Box<dyn Error>> {
        if control_tick.is_zero() {
            return Err("control tick must be greater than zero".into());
        }
        let span = span!(TraceLevel::INFO, "controller");
        Ok(Controller {
            handle: tokio::spawn(
                Controller::control_loop(recorder, driver, control_tick).instrument(span),
            ),
        })
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// One command per iteration, with housekeeping in between. Ends when the driver closes.
    async fn control_loop(mut recorder: Recorder, driver: Arc<dyn Driver>, control_tick: Duration) {
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);
        let mut ticker = tokio::time::interval(control_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            capacity = recorder.buffer().capacity(),
            sample_rate = recorder.settings().sample_rate,
            "Controller started."
        );

        loop {
            tokio::select! {
                event = events_rx.recv() => match event {
                    Some(event) => {
                        info!(event = ?event, "Received event.");
                        if let Err(e) = Controller::apply(&mut recorder, event).await {
                            error!(err = %e, "Command failed.");
                        }
                    }
                    None => {
                        info!("Controller closing.");
                        recorder.stop();
                        match join_handle.await {
                            Ok(Err(e)) => error!(err = %e, "Event monitor failed."),
                            Err(e) => error!(err = %e, "Error waiting for event monitor to stop."),
                            Ok(Ok(())) => {}
                        }
                        return;
                    }
                },
                _ = ticker.tick() => {
                    recorder.housekeeping();
                }
            }
        }
    }

    /// Applies a single event to the recorder.
    pub(crate) async fn apply(recorder: &mut Recorder, event: Event) -> Result<(), RecorderError> {
        match event {
            Event::Record(trigger) => recorder.record(trigger).await?,
            Event::Stop => recorder.stop(),
            Event::Save => {
                let saved = recorder.save()?;
                info!(index = saved.index, samples = ?saved.samples, "Record saved.");
            }
            Event::Play(index) => {
                let warnings = recorder.play(index)?;
                if !warnings.is_empty() {
                    info!(warnings = warnings.len(), "Playing with data loss.");
                }
            }
            Event::Loop => {
                recorder.toggle_loop();
            }
            Event::Pause(pause_millis) => {
                let policy = recorder.set_pause(pause_millis);
                info!(policy = %policy, "Loop pause set.");
            }
            Event::List => {
                let records = recorder.list();
                let sample_rate = recorder.settings().sample_rate;
                info!(count = records.len(), "Stored records.");
                for record in records {
                    match record.samples {
                        Some(samples) => info!(
                            index = record.index,
                            samples,
                            duration =
                                duration_millis(samples_duration(samples as usize, sample_rate)),
                            "Record."
                        ),
                        None => info!(index = record.index, "Record (unreadable header)."),
                    }
                }
            }
            Event::Delete(index) => recorder.delete(index)?,
            Event::Status => info!(status = %recorder.status(), "Status."),
        }
        Ok(())
    }
}
