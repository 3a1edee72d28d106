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
    fmt,
    sync::atomic::{AtomicU16, AtomicU8, AtomicUsize, Ordering},
    time::Duration,
};

use crate::line::Level;

/// Where the resident buffer's current contents came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentsSource {
    Empty,
    Captured,
    Loaded(u8),
}

impl ContentsSource {
    fn encode(self) -> u16 {
        match self {
            ContentsSource::Empty => 0,
            ContentsSource::Captured => 1,
            ContentsSource::Loaded(index) => 0x100 | u16::from(index),
        }
    }

    fn decode(value: u16) -> ContentsSource {
        match value {
            0 => ContentsSource::Empty,
            1 => ContentsSource::Captured,
            // Truncation keeps the low byte, which holds the index.
            v => ContentsSource::Loaded(v as u8),
        }
    }
}

impl fmt::Display for ContentsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentsSource::Empty => write!(f, "empty"),
            ContentsSource::Captured => write!(f, "captured"),
            ContentsSource::Loaded(index) => write!(f, "loaded from record {}", index),
        }
    }
}

/// The fixed-capacity store of sample levels.
///
/// Every field is an atomic scalar: tick threads write levels and the valid length while
/// their session owns the buffer, and the control context reads them without taking a lock.
/// Which session may write is decided by the recorder, never by the buffer itself.
pub struct SampleBuffer {
    levels: Box<[AtomicU8]>,
    valid_length: AtomicUsize,
    source: AtomicU16,
}

impl SampleBuffer {
    /// Creates a zeroed buffer holding up to capacity levels.
    pub fn new(capacity: usize) -> SampleBuffer {
        SampleBuffer {
            levels: (0..capacity).map(|_| AtomicU8::new(0)).collect(),
            valid_length: AtomicUsize::new(0),
            source: AtomicU16::new(ContentsSource::Empty.encode()),
        }
    }

    /// The number of levels the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.levels.len()
    }

    /// Zero-fills every level and marks the buffer empty.
    pub fn reset(&self) {
        for level in self.levels.iter() {
            level.store(0, Ordering::Relaxed);
        }
        self.valid_length.store(0, Ordering::Release);
        self.set_source(ContentsSource::Empty);
    }

    /// Stores a level. Callers keep index below capacity; an index past the end panics.
    pub(crate) fn store(&self, index: usize, level: Level) {
        self.levels[index].store(level.as_byte(), Ordering::Relaxed);
    }

    /// Reads a level. Indexes past the end read as low.
    pub fn level(&self, index: usize) -> Level {
        self.levels
            .get(index)
            .map(|level| Level::from_byte(level.load(Ordering::Relaxed)))
            .unwrap_or(Level::Low)
    }

    /// The number of levels that hold meaningful data.
    pub fn valid_length(&self) -> usize {
        self.valid_length.load(Ordering::Acquire)
    }

    /// Sets the valid length, clamped to capacity.
    pub(crate) fn set_valid_length(&self, length: usize) {
        self.valid_length
            .store(length.min(self.capacity()), Ordering::Release);
    }

    pub fn source(&self) -> ContentsSource {
        ContentsSource::decode(self.source.load(Ordering::Relaxed))
    }

    pub(crate) fn set_source(&self, source: ContentsSource) {
        self.source.store(source.encode(), Ordering::Relaxed);
    }

    /// Copies out the valid levels as bytes.
    pub fn valid_bytes(&self) -> Vec<u8> {
        self.levels[..self.valid_length()]
            .iter()
            .map(|level| level.load(Ordering::Relaxed))
            .collect()
    }

    /// Overwrites the buffer in place with the given level bytes. Bytes past capacity are
    /// dropped and levels past the loaded data are zeroed. Returns the new valid length.
    pub(crate) fn load(&self, bytes: &[u8], source: ContentsSource) -> usize {
        let length = bytes.len().min(self.capacity());
        for (index, level) in self.levels.iter().enumerate() {
            let byte = bytes.get(index).copied().unwrap_or(0);
            level.store(Level::from_byte(byte).as_byte(), Ordering::Relaxed);
        }
        self.set_valid_length(length);
        self.set_source(source);
        length
    }

    /// How long the valid contents last at the given sample rate.
    pub fn duration(&self, sample_rate: u32) -> Duration {
        samples_duration(self.valid_length(), sample_rate)
    }
}

/// How long the given number of samples lasts at the given sample rate.
pub fn samples_duration(samples: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(
        (samples as u128 * 1_000_000_000 / u128::from(sample_rate))
            .try_into()
            .unwrap_or(u64::MAX),
    )
}
