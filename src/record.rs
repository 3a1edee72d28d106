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
//! The on-storage record format: a 4 byte little-endian sample count followed by exactly
//! that many level bytes, one per sample, each 0x00 or 0x01.

use std::{
    fmt,
    io::{self, Read, Write},
};

use crate::{buffer::SampleBuffer, line::Level};

pub const HEADER_LEN: usize = 4;

/// A non-fatal anomaly found while decoding. The load goes ahead with what was read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeWarning {
    /// The declared count exceeded capacity and was clamped.
    Truncated { declared: u32, capacity: usize },
    /// Fewer level bytes were present than the (clamped) count called for.
    ShortRead { expected: usize, actual: usize },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::Truncated { declared, capacity } => write!(
                f,
                "record declares {} samples, truncated to capacity {}",
                declared, capacity
            ),
            DecodeWarning::ShortRead { expected, actual } => {
                write!(f, "expected {} samples, only {} present", expected, actual)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record header is {0} bytes long, expected 4")]
    ShortHeader(usize),

    #[error("record I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    /// The number of levels actually obtained.
    pub sample_count: usize,
    /// The levels, normalized to 0x00 and 0x01.
    pub levels: Vec<u8>,
    pub warnings: Vec<DecodeWarning>,
}

impl DecodedRecord {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Encodes the valid contents of the buffer.
pub fn encode(buffer: &SampleBuffer) -> Vec<u8> {
    encode_levels(&buffer.valid_bytes())
}

/// Encodes raw level bytes.
pub fn encode_levels(levels: &[u8]) -> Vec<u8> {
    let count = u32::try_from(levels.len()).unwrap_or(u32::MAX);
    let mut bytes = Vec::with_capacity(HEADER_LEN + levels.len());
    bytes.extend_from_slice(&count.to_le_bytes());
    bytes.extend_from_slice(&levels[..count as usize]);
    bytes
}

/// Decodes a record held in memory.
pub fn decode(bytes: &[u8], capacity: usize) -> Result<DecodedRecord, RecordError> {
    read_record(bytes, capacity)
}

/// Writes the valid contents of the buffer as a record. Returns the sample count written.
pub fn write_record<W: Write>(mut writer: W, buffer: &SampleBuffer) -> Result<usize, RecordError> {
    let bytes = encode(buffer);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(bytes.len() - HEADER_LEN)
}

/// Reads a record from a stream, holding at most capacity levels.
pub fn read_record<R: Read>(mut reader: R, capacity: usize) -> Result<DecodedRecord, RecordError> {
    let declared = read_count(&mut reader)?;
    let mut warnings = Vec::new();
    let mut expected = usize::try_from(declared).unwrap_or(usize::MAX);
    if expected > capacity {
        warnings.push(DecodeWarning::Truncated { declared, capacity });
        expected = capacity;
    }

    let mut levels = Vec::with_capacity(expected);
    reader.take(expected as u64).read_to_end(&mut levels)?;
    if levels.len() < expected {
        warnings.push(DecodeWarning::ShortRead {
            expected,
            actual: levels.len(),
        });
    }
    for level in levels.iter_mut() {
        *level = Level::from_byte(*level).as_byte();
    }

    Ok(DecodedRecord {
        sample_count: levels.len(),
        levels,
        warnings,
    })
}

/// Reads only the declared sample count from the front of a record.
pub fn read_count<R: Read>(mut reader: R) -> Result<u32, RecordError> {
    let mut header = [0u8; HEADER_LEN];
    let read = read_full(&mut reader, &mut header)?;
    if read < HEADER_LEN {
        return Err(RecordError::ShortHeader(read));
    }
    Ok(u32::from_le_bytes(header))
}

/// Reads until buf is full or the stream ends. Returns the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, io::Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
