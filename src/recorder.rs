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
use std::{fmt, sync::Arc, time::Duration};

use tracing::{error, info, span, warn, Level as TraceLevel, Span};

use crate::{
    buffer::{samples_duration, ContentsSource, SampleBuffer},
    capture::CaptureEngine,
    clock::Clock,
    error::EngineError,
    line::{InputLine, Level, OutputLine},
    looping::{LoopPolicy, LoopScheduler},
    pinwait::PinWaiter,
    playback::PlaybackEngine,
    record::{self, DecodeWarning, RecordError},
    storage::{Storage, StorageError},
    timer::{SamplePeriod, Timer},
    util::duration_millis,
};

/// The tunables that shape a recorder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub sample_rate: u32,
    pub capacity: usize,
    pub loop_pause_millis: u32,
    pub pin_poll_interval: Duration,
}

/// The lines, timers and clock a recorder drives.
pub struct Hardware {
    pub input: Arc<dyn InputLine>,
    pub output: Arc<dyn OutputLine>,
    pub capture_timer: Box<dyn Timer>,
    pub playback_timer: Box<dyn Timer>,
    pub clock: Arc<dyn Clock>,
}

/// A session that can block a command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activity {
    Capture,
    Playback,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Capture => write!(f, "capture"),
            Activity::Playback => write!(f, "playback"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("rejected: {0} in progress")]
    Busy(Activity),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("record {index}: {source}")]
    Record {
        index: u8,
        #[source]
        source: RecordError,
    },
}

/// A stored record as seen by list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordInfo {
    pub index: u8,
    /// The declared sample count, or None if the header could not be read.
    pub samples: Option<u32>,
}

/// What happened during one housekeeping pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Housekeeping {
    /// Set to the captured length when a capture completed since the last pass.
    pub capture_completed: Option<usize>,
    /// True when a playback run completed since the last pass.
    pub playback_completed: bool,
    /// True when the loop scheduler started a replay.
    pub loop_rearmed: bool,
    /// Line read and write failures first seen in this pass.
    pub line_errors: u64,
}

/// A snapshot of the recorder for status reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub capturing: bool,
    pub captured: usize,
    pub playing: bool,
    pub played: usize,
    pub playing_length: usize,
    pub valid_length: usize,
    pub capacity: usize,
    pub source: ContentsSource,
    pub policy: LoopPolicy,
    pub sample_rate: u32,
    /// Failed input reads since the line was opened.
    pub input_errors: u64,
    /// Failed output writes since the line was opened.
    pub output_errors: u64,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.capturing {
            format!("capturing {}/{}", self.captured, self.capacity)
        } else if self.playing {
            format!("playing {}/{}", self.played, self.playing_length)
        } else {
            "idle".to_string()
        };
        write!(
            f,
            "{}; buffer {}/{} samples ({}, {}); {}",
            state,
            self.valid_length,
            self.capacity,
            duration_millis(samples_duration(self.valid_length, self.sample_rate)),
            self.source,
            self.policy,
        )?;
        if self.input_errors > 0 || self.output_errors > 0 {
            write!(
                f,
                "; line errors {} in, {} out",
                self.input_errors, self.output_errors
            )?;
        }
        Ok(())
    }
}

/// The control-layer context: owns the resident buffer, both engines, the loop scheduler
/// and the record store, and refuses commands that would let two sessions touch the
/// buffer at once.
pub struct Recorder {
    settings: Settings,
    buffer: Arc<SampleBuffer>,
    capture: CaptureEngine,
    playback: PlaybackEngine,
    scheduler: LoopScheduler,
    storage: Box<dyn Storage>,
    input: Arc<dyn InputLine>,
    output: Arc<dyn OutputLine>,
    clock: Arc<dyn Clock>,
    waiter: PinWaiter,
    /// Line error counts already reported, input then output.
    reported_errors: (u64, u64),
    span: Span,
}

impl Recorder {
    /// Creates an idle recorder with an empty resident buffer.
    pub fn new(settings: Settings, hardware: Hardware, storage: Box<dyn Storage>) -> Recorder {
        let buffer = Arc::new(SampleBuffer::new(settings.capacity));
        let period = SamplePeriod::from_rate(settings.sample_rate);
        let capture = CaptureEngine::new(
            buffer.clone(),
            hardware.input.clone(),
            hardware.capture_timer,
            period,
        );
        let playback = PlaybackEngine::new(
            hardware.output.clone(),
            hardware.playback_timer,
            period,
            hardware.clock.clone(),
        );

        Recorder {
            scheduler: LoopScheduler::new(LoopPolicy::new(settings.loop_pause_millis)),
            waiter: PinWaiter::new(settings.pin_poll_interval),
            settings,
            buffer,
            capture,
            playback,
            storage,
            input: hardware.input,
            output: hardware.output,
            clock: hardware.clock,
            reported_errors: (0, 0),
            span: span!(TraceLevel::INFO, "recorder"),
        }
    }

    /// The resident buffer.
    pub fn buffer(&self) -> &Arc<SampleBuffer> {
        &self.buffer
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The session currently holding the buffer, if any.
    pub fn activity(&self) -> Option<Activity> {
        if self.capture.is_capturing() {
            Some(Activity::Capture)
        } else if self.playback.is_playing() {
            Some(Activity::Playback)
        } else {
            None
        }
    }

    fn ensure_idle(&self) -> Result<(), RecorderError> {
        match self.activity() {
            Some(activity) => Err(RecorderError::Busy(activity)),
            None => Ok(()),
        }
    }

    fn ensure_not_capturing(&self) -> Result<(), RecorderError> {
        if self.capture.is_capturing() {
            return Err(RecorderError::Busy(Activity::Capture));
        }
        Ok(())
    }

    /// Starts a capture, first waiting for the input to reach trigger if one is given.
    pub async fn record(&mut self, trigger: Option<Level>) -> Result<(), RecorderError> {
        self.ensure_idle()?;

        if let Some(level) = trigger {
            let polls = self.waiter.wait_for(self.input.as_ref(), level).await;
            let _enter = self.span.enter();
            info!(polls, level = %level, "Trigger level reached.");
        }

        self.capture.start()?;
        Ok(())
    }

    /// Stops both engines and turns looping off so a stopped replay stays stopped.
    pub fn stop(&mut self) {
        let _enter = self.span.enter();

        self.capture.stop();
        self.playback.stop();
        self.scheduler.set_enabled(false);
        Recorder::report_line_errors(
            self.input.as_ref(),
            self.output.as_ref(),
            &mut self.reported_errors,
        );
        info!(samples = self.buffer.valid_length(), "Stopped.");
    }

    /// Warns about line failures not reported yet. Returns how many were new.
    fn report_line_errors(
        input: &dyn InputLine,
        output: &dyn OutputLine,
        reported: &mut (u64, u64),
    ) -> u64 {
        let (input_seen, output_seen) = *reported;
        let (input_errors, output_errors) = (input.errors(), output.errors());
        if input_errors > input_seen {
            warn!(
                input = %input,
                failed = input_errors - input_seen,
                total = input_errors,
                "Input reads failed and were sampled low."
            );
        }
        if output_errors > output_seen {
            warn!(
                output = %output,
                failed = output_errors - output_seen,
                total = output_errors,
                "Output writes failed."
            );
        }
        *reported = (input_errors, output_errors);
        input_errors.saturating_sub(input_seen) + output_errors.saturating_sub(output_seen)
    }

    /// Writes the resident buffer to the first free record index.
    pub fn save(&mut self) -> Result<RecordInfo, RecorderError> {
        let _enter = self.span.enter();

        self.ensure_not_capturing()?;
        let samples = self.buffer.valid_length();
        if samples == 0 {
            return Err(EngineError::EmptySource.into());
        }
        let index = self
            .storage
            .first_free_index()
            .ok_or(StorageError::Full)?;

        let writer = self.storage.open_for_write(index)?;
        let written = match record::write_record(writer, &self.buffer) {
            Ok(written) => written,
            Err(source) => {
                // Never leave a half-written record behind.
                self.storage.remove(index);
                return Err(RecorderError::Record { index, source });
            }
        };

        info!(index, samples = written, "Saved record.");
        Ok(RecordInfo {
            index,
            samples: u32::try_from(written).ok(),
        })
    }

    /// Loads a record into the resident buffer. Decode anomalies are returned, not failed on.
    pub fn load(&mut self, index: u8) -> Result<Vec<DecodeWarning>, RecorderError> {
        let _enter = self.span.enter();

        self.ensure_idle()?;
        let reader = self.storage.open_for_read(index)?;
        let decoded = record::read_record(reader, self.buffer.capacity())
            .map_err(|source| RecorderError::Record { index, source })?;
        for warning in decoded.warnings.iter() {
            warn!(index, warning = %warning, "Record loaded with data loss.");
        }

        let samples = self.buffer.load(&decoded.levels, ContentsSource::Loaded(index));
        info!(index, samples, "Loaded record.");
        Ok(decoded.warnings)
    }

    /// Plays the resident buffer, or loads the given record into it first and plays that.
    pub fn play(&mut self, index: Option<u8>) -> Result<Vec<DecodeWarning>, RecorderError> {
        self.ensure_idle()?;

        let warnings = match index {
            Some(index) => self.load(index)?,
            None => Vec::new(),
        };
        self.playback
            .start(self.buffer.clone(), self.buffer.valid_length())?;
        Ok(warnings)
    }

    /// Removes a record.
    pub fn delete(&mut self, index: u8) -> Result<(), RecorderError> {
        let _enter = self.span.enter();

        if !self.storage.remove(index) {
            return Err(StorageError::NotFound(index).into());
        }
        info!(index, "Deleted record.");
        Ok(())
    }

    /// Lists stored records with their declared sample counts.
    pub fn list(&self) -> Vec<RecordInfo> {
        self.storage
            .list()
            .into_iter()
            .map(|index| RecordInfo {
                index,
                samples: self
                    .storage
                    .open_for_read(index)
                    .ok()
                    .and_then(|reader| record::read_count(reader).ok()),
            })
            .collect()
    }

    /// Flips looping and returns the new policy.
    pub fn toggle_loop(&mut self) -> LoopPolicy {
        let _enter = self.span.enter();

        self.scheduler.toggle();
        let policy = self.scheduler.policy();
        info!(policy = %policy, "Loop toggled.");
        policy
    }

    /// Sets the pause between loop replays.
    pub fn set_pause(&mut self, pause_millis: u32) -> LoopPolicy {
        self.scheduler.set_pause(pause_millis);
        self.scheduler.policy()
    }

    pub fn status(&self) -> Status {
        Status {
            capturing: self.capture.is_capturing(),
            captured: self.capture.cursor(),
            playing: self.playback.is_playing(),
            played: self.playback.cursor(),
            playing_length: self.playback.length(),
            valid_length: self.buffer.valid_length(),
            capacity: self.buffer.capacity(),
            source: self.buffer.source(),
            policy: self.scheduler.policy(),
            sample_rate: self.settings.sample_rate,
            input_errors: self.input.errors(),
            output_errors: self.output.errors(),
        }
    }

    /// Runs once per control-loop iteration: reports sessions that finished since the last
    /// pass and lets the loop scheduler re-arm playback.
    pub fn housekeeping(&mut self) -> Housekeeping {
        let _enter = self.span.enter();
        let mut report = Housekeeping::default();

        if let Some(samples) = self.capture.take_completion() {
            info!(
                samples,
                duration = duration_millis(self.buffer.duration(self.settings.sample_rate)),
                "Capture complete."
            );
            report.capture_completed = Some(samples);
        }
        if self.playback.take_completion() {
            info!(
                completed_at = self.playback.last_completion_millis(),
                "Playback complete."
            );
            report.playback_completed = true;
        }
        if report.capture_completed.is_some() || report.playback_completed {
            report.line_errors = Recorder::report_line_errors(
                self.input.as_ref(),
                self.output.as_ref(),
                &mut self.reported_errors,
            );
        }

        // Looping replays the resident buffer, which a running capture owns.
        if !self.capture.is_capturing() {
            let now = self.clock.now_millis();
            if let Some(result) = self
                .scheduler
                .evaluate(&mut self.playback, &self.buffer, now)
            {
                report.loop_rearmed = result.is_ok();
            }
        }

        if self.capture.is_capturing() && self.playback.is_playing() {
            error!("Capture and playback are both active.");
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::fs;

    use tempfile::tempdir;

    use crate::{
        clock::MockClock,
        line,
        storage::MemoryStorage,
        timer::mock::Manual,
    };

    use super::*;

    pub(crate) struct Fixture {
        pub recorder: Recorder,
        pub input: line::mock::Input,
        pub output: line::mock::Output,
        pub capture_timer: Manual,
        pub playback_timer: Manual,
        pub clock: MockClock,
        pub storage: MemoryStorage,
    }

    fn settings(capacity: usize) -> Settings {
        Settings {
            sample_rate: 1000,
            capacity,
            loop_pause_millis: 1000,
            pin_poll_interval: Duration::ZERO,
        }
    }

    pub(crate) fn fixture(capacity: usize) -> Fixture {
        let input = line::mock::Input::get("mock-in");
        let output = line::mock::Output::get("mock-out");
        let capture_timer = Manual::new();
        let playback_timer = Manual::new();
        let clock = MockClock::new(0);
        let storage = MemoryStorage::new();
        let recorder = Recorder::new(
            settings(capacity),
            Hardware {
                input: Arc::new(input.clone()),
                output: Arc::new(output.clone()),
                capture_timer: Box::new(capture_timer.clone()),
                playback_timer: Box::new(playback_timer.clone()),
                clock: Arc::new(clock.clone()),
            },
            Box::new(storage.clone()),
        );
        Fixture {
            recorder,
            input,
            output,
            capture_timer,
            playback_timer,
            clock,
            storage,
        }
    }

    /// Captures the given levels into the resident buffer.
    pub(crate) async fn capture(f: &mut Fixture, levels: &[Level]) {
        f.input.queue(levels);
        f.recorder.record(None).await.expect("capture should start");
        f.capture_timer.fire_n(levels.len());
    }

    use Level::{High, Low};

    #[tokio::test]
    async fn test_capture_completion_reported_once() {
        let mut f = fixture(4);
        capture(&mut f, &[High, Low, High, High]).await;

        let report = f.recorder.housekeeping();
        assert_eq!(Some(4), report.capture_completed);
        assert_eq!(None, f.recorder.housekeeping().capture_completed);
        assert_eq!(vec![1, 0, 1, 1], f.recorder.buffer().valid_bytes());
        assert_eq!(ContentsSource::Captured, f.recorder.buffer().source());
    }

    #[tokio::test]
    async fn test_record_waits_for_trigger() -> Result<(), RecorderError> {
        let mut f = fixture(4);
        f.input.queue(&[Low, Low, Low]);
        f.input.set(High);

        f.recorder.record(Some(High)).await?;
        assert_eq!(Some(Activity::Capture), f.recorder.activity());
        Ok(())
    }

    #[tokio::test]
    async fn test_rejections_while_capturing() -> Result<(), RecorderError> {
        let mut f = fixture(4);
        f.recorder.record(None).await?;

        assert!(matches!(
            f.recorder.record(None).await,
            Err(RecorderError::Busy(Activity::Capture))
        ));
        assert!(matches!(
            f.recorder.play(None),
            Err(RecorderError::Busy(Activity::Capture))
        ));
        assert!(matches!(
            f.recorder.save(),
            Err(RecorderError::Busy(Activity::Capture))
        ));
        assert!(matches!(
            f.recorder.load(0),
            Err(RecorderError::Busy(Activity::Capture))
        ));
        assert!(!f.recorder.status().playing);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejections_while_playing() -> Result<(), RecorderError> {
        let mut f = fixture(4);
        capture(&mut f, &[High, High]).await;
        f.recorder.stop();
        f.recorder.play(None)?;

        assert!(matches!(
            f.recorder.record(None).await,
            Err(RecorderError::Busy(Activity::Playback))
        ));
        assert!(matches!(
            f.recorder.play(None),
            Err(RecorderError::Busy(Activity::Playback))
        ));
        // Saving only reads the buffer.
        assert_eq!(0, f.recorder.save()?.index);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_and_play_record() -> Result<(), RecorderError> {
        let mut f = fixture(8);
        capture(&mut f, &[High, Low, High, Low, Low, Low, Low, High]).await;

        let saved = f.recorder.save()?;
        assert_eq!(
            RecordInfo {
                index: 0,
                samples: Some(8)
            },
            saved
        );
        assert_eq!(1, f.recorder.save()?.index);
        assert_eq!(
            Some(vec![8, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 1]),
            f.storage.get(0)
        );

        f.storage.insert(5, vec![3, 0, 0, 0, 0, 1, 1]);
        let warnings = f.recorder.play(Some(5))?;
        assert!(warnings.is_empty());
        assert_eq!(ContentsSource::Loaded(5), f.recorder.buffer().source());
        assert_eq!(3, f.recorder.buffer().valid_length());

        f.playback_timer.fire_n(3);
        assert_eq!(vec![Low, High, High, Low], f.output.written());
        assert!(f.recorder.housekeeping().playback_completed);
        Ok(())
    }

    #[test]
    fn test_save_empty_buffer() {
        let mut f = fixture(8);
        assert!(matches!(
            f.recorder.save(),
            Err(RecorderError::Engine(EngineError::EmptySource))
        ));
        assert!(f.storage.list().is_empty());
    }

    #[test]
    fn test_play_empty_buffer() {
        let mut f = fixture(8);
        assert!(matches!(
            f.recorder.play(None),
            Err(RecorderError::Engine(EngineError::EmptySource))
        ));
    }

    #[test]
    fn test_play_missing_and_damaged_records() -> Result<(), RecorderError> {
        let mut f = fixture(8);
        assert!(matches!(
            f.recorder.play(Some(9)),
            Err(RecorderError::Storage(StorageError::NotFound(9)))
        ));

        f.storage.insert(1, vec![2, 0]);
        assert!(matches!(
            f.recorder.play(Some(1)),
            Err(RecorderError::Record { index: 1, .. })
        ));

        f.storage.insert(2, vec![100, 0, 0, 0, 1, 1, 1]);
        let warnings = f.recorder.play(Some(2))?;
        assert_eq!(
            vec![
                DecodeWarning::Truncated {
                    declared: 100,
                    capacity: 8
                },
                DecodeWarning::ShortRead {
                    expected: 8,
                    actual: 3
                }
            ],
            warnings
        );
        assert_eq!(3, f.recorder.buffer().valid_length());
        Ok(())
    }

    #[test]
    fn test_delete_and_list() -> Result<(), RecorderError> {
        let mut f = fixture(8);
        f.storage.insert(0, vec![4, 0, 0, 0, 1, 1, 1, 1]);
        f.storage.insert(3, vec![1]);

        assert_eq!(
            vec![
                RecordInfo {
                    index: 0,
                    samples: Some(4)
                },
                RecordInfo {
                    index: 3,
                    samples: None
                }
            ],
            f.recorder.list()
        );

        f.recorder.delete(3)?;
        assert!(matches!(
            f.recorder.delete(3),
            Err(RecorderError::Storage(StorageError::NotFound(3)))
        ));
        assert_eq!(1, f.recorder.list().len());
        Ok(())
    }

    #[tokio::test]
    async fn test_loop_replays_after_pause() -> Result<(), RecorderError> {
        let mut f = fixture(4);
        capture(&mut f, &[High, Low, High]).await;
        f.recorder.stop();
        assert_eq!(3, f.recorder.buffer().valid_length());

        f.recorder.play(None)?;
        f.recorder.toggle_loop();
        f.clock.set(2000);
        f.playback_timer.fire_n(3);

        let report = f.recorder.housekeeping();
        assert!(report.playback_completed);
        assert!(!report.loop_rearmed);

        f.clock.set(2999);
        assert!(!f.recorder.housekeeping().loop_rearmed);
        f.clock.set(3000);
        assert!(f.recorder.housekeeping().loop_rearmed);
        assert_eq!(Some(Activity::Playback), f.recorder.activity());
        Ok(())
    }

    #[tokio::test]
    async fn test_stop_disables_loop() -> Result<(), RecorderError> {
        let mut f = fixture(4);
        capture(&mut f, &[High, High, High, High]).await;
        f.recorder.toggle_loop();
        assert!(f.recorder.status().policy.enabled);

        f.recorder.stop();
        assert!(!f.recorder.status().policy.enabled);
        f.clock.set(100_000);
        assert!(!f.recorder.housekeeping().loop_rearmed);
        Ok(())
    }

    #[tokio::test]
    async fn test_loop_waits_while_capturing() -> Result<(), RecorderError> {
        let mut f = fixture(4);
        capture(&mut f, &[High, High, High, High]).await;
        f.recorder.housekeeping();
        f.recorder.set_pause(0);
        f.recorder.toggle_loop();

        f.recorder.record(None).await?;
        let report = f.recorder.housekeeping();
        assert!(!report.loop_rearmed);
        assert!(!f.recorder.status().playing);
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_capture_is_loop_eligible() -> Result<(), RecorderError> {
        let mut f = fixture(10);
        f.input.set(High);
        f.recorder.record(None).await?;
        f.capture_timer.fire_n(3);
        f.recorder.stop();
        assert_eq!(3, f.recorder.buffer().valid_length());

        f.recorder.set_pause(0);
        f.recorder.toggle_loop();
        assert!(f.recorder.housekeeping().loop_rearmed);
        Ok(())
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut f = fixture(4);
        capture(&mut f, &[High, Low]).await;
        f.recorder.stop();
        let status = f.recorder.status();
        f.recorder.stop();
        assert_eq!(status, f.recorder.status());
    }

    #[tokio::test]
    async fn test_never_capturing_and_playing() -> Result<(), RecorderError> {
        let mut f = fixture(3);
        f.recorder.set_pause(0);
        f.recorder.toggle_loop();
        f.input.set(High);

        for step in 0..40 {
            match step % 5 {
                0 => {
                    let _ = f.recorder.record(None).await;
                }
                1 => {
                    let _ = f.recorder.play(None);
                }
                2 => {
                    f.capture_timer.fire();
                    f.playback_timer.fire();
                }
                3 => f.clock.advance(7),
                _ => {
                    f.recorder.housekeeping();
                }
            }
            let status = f.recorder.status();
            assert!(
                !(status.capturing && status.playing),
                "both sessions active at step {}",
                step
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_line_errors_reported() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("value");
        fs::write(&path, "1")?;
        let capture_timer = Manual::new();
        let mut recorder = Recorder::new(
            settings(4),
            Hardware {
                input: Arc::new(line::sysfs::Input::open(17, path.clone())?),
                output: Arc::new(line::mock::Output::get("mock-out")),
                capture_timer: Box::new(capture_timer.clone()),
                playback_timer: Box::new(Manual::new()),
                clock: Arc::new(MockClock::new(0)),
            },
            Box::new(MemoryStorage::new()),
        );

        recorder.record(None).await?;
        capture_timer.fire_n(2);
        // The value file goes away from under the open line.
        fs::write(&path, "")?;
        capture_timer.fire_n(2);

        let report = recorder.housekeeping();
        assert_eq!(Some(4), report.capture_completed);
        assert_eq!(2, report.line_errors);
        assert_eq!(vec![1, 1, 0, 0], recorder.buffer().valid_bytes());

        let status = recorder.status();
        assert_eq!(2, status.input_errors);
        assert_eq!(0, status.output_errors);
        assert!(status.to_string().ends_with("; line errors 2 in, 0 out"));

        // Each failure is reported once.
        recorder.record(None).await?;
        fs::write(&path, "1")?;
        capture_timer.fire_n(4);
        assert_eq!(0, recorder.housekeeping().line_errors);
        Ok(())
    }

    #[tokio::test]
    async fn test_replay_writes_buffer_again() -> Result<(), RecorderError> {
        let mut f = fixture(4);
        capture(&mut f, &[High, Low, High]).await;
        f.recorder.stop();
        f.recorder.set_pause(0);
        f.recorder.play(None)?;
        f.playback_timer.fire_n(3);
        f.output.clear();

        f.recorder.toggle_loop();
        assert!(f.recorder.housekeeping().loop_rearmed);
        f.playback_timer.fire_n(3);
        assert_eq!(vec![High, Low, High, Low], f.output.written());
        Ok(())
    }

    #[test]
    fn test_status_display() {
        let f = fixture(1000);
        f.recorder.buffer().load(&[1; 500], ContentsSource::Loaded(2));
        assert_eq!(
            "idle; buffer 500/1000 samples (500.000 ms, loaded from record 2); loop off (pause 1000 ms)",
            f.recorder.status().to_string()
        );
    }
}
