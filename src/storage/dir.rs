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
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use super::{Storage, StorageError};

/// Keeps each record in its own file, named prefix + index + suffix, in one directory.
pub struct DirStorage {
    directory: PathBuf,
    prefix: String,
    suffix: String,
}

impl DirStorage {
    /// Creates a directory store, creating the directory if it is missing.
    pub fn new(directory: &Path, prefix: &str, suffix: &str) -> Result<DirStorage, io::Error> {
        fs::create_dir_all(directory)?;
        Ok(DirStorage {
            directory: directory.to_path_buf(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// The path of the record with the given index.
    pub fn path(&self, index: u8) -> PathBuf {
        self.directory
            .join(format!("{}{}{}", self.prefix, index, self.suffix))
    }

    /// Parses a file name back into an index. Names that do not match are not records.
    fn parse_index(&self, name: &str) -> Option<u8> {
        let digits = name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        // Leading zeros or signs would let two names map to one index.
        if digits.is_empty()
            || !digits.bytes().all(|b| b.is_ascii_digit())
            || (digits.len() > 1 && digits.starts_with('0'))
        {
            return None;
        }
        digits.parse::<u8>().ok()
    }
}

impl Storage for DirStorage {
    fn exists(&self, index: u8) -> bool {
        self.path(index).is_file()
    }

    fn open_for_write(&mut self, index: u8) -> Result<Box<dyn Write + Send>, StorageError> {
        let path = self.path(index);
        debug!(path = ?path, "Opening record for write.");
        let file = File::create(&path).map_err(|e| StorageError::unavailable(index, e))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn open_for_read(&self, index: u8) -> Result<Box<dyn Read + Send>, StorageError> {
        let path = self.path(index);
        debug!(path = ?path, "Opening record for read.");
        match File::open(&path) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound(index)),
            Err(e) => Err(StorageError::unavailable(index, e)),
        }
    }

    fn remove(&mut self, index: u8) -> bool {
        match fs::remove_file(self.path(index)) {
            Ok(()) => true,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(index, err = %e, "Unable to remove record.");
                }
                false
            }
        }
    }

    fn list(&self) -> Vec<u8> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(directory = ?self.directory, err = %e, "Unable to list records.");
                return Vec::new();
            }
        };

        let mut indices: Vec<u8> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| self.parse_index(name))
            })
            .collect();
        indices.sort_unstable();
        indices
    }
}
