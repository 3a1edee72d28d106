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
use std::io::{self, Read, Write};

pub mod dir;
#[cfg(test)]
pub mod memory;

pub use dir::DirStorage;
#[cfg(test)]
pub use memory::MemoryStorage;

/// Record slots are numbered 0 through 255.
pub const MAX_INDEX: u8 = u8::MAX;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable for record {index}: {source}")]
    Unavailable {
        index: u8,
        #[source]
        source: io::Error,
    },

    #[error("record {0} does not exist")]
    NotFound(u8),

    #[error("no free record index left")]
    Full,
}

impl StorageError {
    pub(crate) fn unavailable(index: u8, source: io::Error) -> StorageError {
        StorageError::Unavailable { index, source }
    }
}

/// The durable store for records. Implementations only move bytes; the record format lives
/// in the record module.
pub trait Storage: Send {
    /// Returns true if a record exists at the given index.
    fn exists(&self, index: u8) -> bool;

    /// Opens the record at the given index for writing, replacing anything already there.
    fn open_for_write(&mut self, index: u8) -> Result<Box<dyn Write + Send>, StorageError>;

    /// Opens the record at the given index for reading.
    fn open_for_read(&self, index: u8) -> Result<Box<dyn Read + Send>, StorageError>;

    /// Removes the record at the given index. Returns false if nothing was removed.
    fn remove(&mut self, index: u8) -> bool;

    /// Lists the indices that hold records, in ascending order.
    fn list(&self) -> Vec<u8>;

    /// The lowest index with no record, if any is left.
    fn first_free_index(&self) -> Option<u8> {
        (0..=MAX_INDEX).find(|index| !self.exists(*index))
    }
}
