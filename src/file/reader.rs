// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Abstractions for reading ranges of bytes from a file-like source.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use bytes::Bytes;

use crate::errors::{ParquetError, Result};

/// Length of a file-like source in bytes.
pub trait Length {
    /// Total length in bytes.
    fn len(&self) -> u64;
}

/// A source that supports reading an arbitrary byte range.
pub trait ChunkReader: Length {
    /// Reads `length` bytes starting at `start`. Fails when fewer bytes are
    /// available.
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes>;
}

impl Length for Bytes {
    fn len(&self) -> u64 {
        self.as_ref().len() as u64
    }
}

impl ChunkReader for Bytes {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        let start = start as usize;
        if start + length > self.as_ref().len() {
            return Err(ParquetError::EOF(format!(
                "range {}..{} exceeds buffer of {} bytes",
                start,
                start + length,
                self.as_ref().len()
            )));
        }
        Ok(self.slice(start..start + length))
    }
}

impl Length for File {
    fn len(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0)
    }
}

impl ChunkReader for File {
    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        let mut file = self.try_clone()?;
        file.seek(SeekFrom::Start(start))?;
        let mut buf = vec![0u8; length];
        file.read_exact(&mut buf)?;
        Ok(buf.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_chunk_reader() {
        let data = Bytes::from_static(b"0123456789");
        assert_eq!(Length::len(&data), 10);
        assert_eq!(data.get_bytes(2, 3).unwrap().as_ref(), b"234");
        assert!(data.get_bytes(8, 3).is_err());
    }
}
