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
    collections::BTreeMap,
    io::{self, Read, Write},
    sync::Arc,
};

use parking_lot::Mutex;

use super::{Storage, StorageError};

type Records = Arc<Mutex<BTreeMap<u8, Vec<u8>>>>;

/// Keeps records in process memory. Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    records: Records,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    /// Stores raw bytes at the given index, bypassing the record format.
    pub fn insert(&self, index: u8, bytes: Vec<u8>) {
        self.records.lock().insert(index, bytes);
    }

    /// Returns the raw bytes stored at the given index.
    pub fn get(&self, index: u8) -> Option<Vec<u8>> {
        self.records.lock().get(&index).cloned()
    }
}

/// Appends straight into the shared record.
struct Writer {
    index: u8,
    records: Records,
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.records
            .lock()
            .entry(self.index)
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, index: u8) -> bool {
        self.records.lock().contains_key(&index)
    }

    fn open_for_write(&mut self, index: u8) -> Result<Box<dyn Write + Send>, StorageError> {
        self.records.lock().insert(index, Vec::new());
        Ok(Box::new(Writer {
            index,
            records: self.records.clone(),
        }))
    }

    fn open_for_read(&self, index: u8) -> Result<Box<dyn Read + Send>, StorageError> {
        match self.records.lock().get(&index) {
            Some(bytes) => Ok(Box::new(io::Cursor::new(bytes.clone()))),
            None => Err(StorageError::NotFound(index)),
        }
    }

    fn remove(&mut self, index: u8) -> bool {
        self.records.lock().remove(&index).is_some()
    }

    fn list(&self) -> Vec<u8> {
        self.records.lock().keys().copied().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_write_read_remove() -> Result<(), Box<dyn std::error::Error>> {
        let mut storage = MemoryStorage::new();
        assert!(!storage.exists(7));
        assert!(matches!(
            storage.open_for_read(7),
            Err(StorageError::NotFound(7))
        ));

        let mut writer = storage.open_for_write(7)?;
        writer.write_all(&[1, 2])?;
        writer.write_all(&[3])?;
        drop(writer);

        assert!(storage.exists(7));
        let mut bytes = Vec::new();
        storage.open_for_read(7)?.read_to_end(&mut bytes)?;
        assert_eq!(vec![1, 2, 3], bytes);

        // Opening for write replaces the old contents.
        storage.open_for_write(7)?.write_all(&[9])?;
        assert_eq!(Some(vec![9]), storage.get(7));

        assert!(storage.remove(7));
        assert!(!storage.remove(7));
        Ok(())
    }

    #[test]
    fn test_list_sorted() {
        let storage = MemoryStorage::new();
        storage.insert(9, vec![]);
        storage.insert(2, vec![]);
        storage.insert(200, vec![]);
        assert_eq!(vec![2, 9, 200], storage.list());
    }
}
