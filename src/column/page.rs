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

//! Page abstractions: the smallest independently compressible and
//! encryptable unit within a column chunk.

use bytes::Bytes;

use crate::basic::{Encoding, PageType};
use crate::errors::Result;
use crate::file::metadata::ColumnChunkMetaDataBuilder;
use crate::file::statistics::EncodedStatistics;

/// A decoded page read back from a column chunk. The buffer holds the
/// decrypted, decompressed page body.
#[derive(Clone, Debug)]
pub enum Page {
    /// A v1 data page: levels followed by encoded values.
    DataPage {
        buf: Bytes,
        num_values: u32,
        encoding: Encoding,
        def_level_encoding: Encoding,
        rep_level_encoding: Encoding,
        statistics: Option<EncodedStatistics>,
    },
    /// A dictionary page: the encoded dictionary values.
    DictionaryPage {
        buf: Bytes,
        num_values: u32,
        encoding: Encoding,
        is_sorted: bool,
    },
}

impl Page {
    /// The type of this page.
    pub fn page_type(&self) -> PageType {
        match self {
            Page::DataPage { .. } => PageType::DATA_PAGE,
            Page::DictionaryPage { .. } => PageType::DICTIONARY_PAGE,
        }
    }

    /// The page body.
    pub fn buffer(&self) -> &Bytes {
        match self {
            Page::DataPage { buf, .. } => buf,
            Page::DictionaryPage { buf, .. } => buf,
        }
    }

    /// Number of values in this page.
    pub fn num_values(&self) -> u32 {
        match self {
            Page::DataPage { num_values, .. } => *num_values,
            Page::DictionaryPage { num_values, .. } => *num_values,
        }
    }

    /// Value encoding of this page.
    pub fn encoding(&self) -> Encoding {
        match self {
            Page::DataPage { encoding, .. } => *encoding,
            Page::DictionaryPage { encoding, .. } => *encoding,
        }
    }
}

/// An already compressed data page, ready for the page writer. The buffer
/// holds levels and values after compression but before encryption.
#[derive(Clone, Debug)]
pub struct CompressedDataPage {
    buf: Bytes,
    num_values: u32,
    encoding: Encoding,
    def_level_encoding: Encoding,
    rep_level_encoding: Encoding,
    uncompressed_size: usize,
    statistics: EncodedStatistics,
}

impl CompressedDataPage {
    /// Creates a compressed data page.
    pub fn new(
        buf: Bytes,
        num_values: u32,
        encoding: Encoding,
        def_level_encoding: Encoding,
        rep_level_encoding: Encoding,
        uncompressed_size: usize,
        statistics: EncodedStatistics,
    ) -> Self {
        Self {
            buf,
            num_values,
            encoding,
            def_level_encoding,
            rep_level_encoding,
            uncompressed_size,
            statistics,
        }
    }

    /// The compressed page body.
    pub fn data(&self) -> &[u8] {
        &self.buf
    }

    /// Compressed size of the body in bytes.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Uncompressed size of the body in bytes.
    pub fn uncompressed_size(&self) -> usize {
        self.uncompressed_size
    }

    /// Number of values (including nulls) in this page.
    pub fn num_values(&self) -> u32 {
        self.num_values
    }

    /// Value encoding of this page.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Definition level encoding.
    pub fn def_level_encoding(&self) -> Encoding {
        self.def_level_encoding
    }

    /// Repetition level encoding.
    pub fn rep_level_encoding(&self) -> Encoding {
        self.rep_level_encoding
    }

    /// Page statistics.
    pub fn statistics(&self) -> &EncodedStatistics {
        &self.statistics
    }
}

/// A dictionary page ready for the page writer; the buffer is uncompressed.
#[derive(Clone, Debug)]
pub struct DictionaryPage {
    buf: Bytes,
    num_values: u32,
    encoding: Encoding,
    is_sorted: bool,
}

impl DictionaryPage {
    /// Creates a dictionary page.
    pub fn new(buf: Bytes, num_values: u32, encoding: Encoding) -> Self {
        Self {
            buf,
            num_values,
            encoding,
            is_sorted: false,
        }
    }

    /// The uncompressed dictionary body.
    pub fn data(&self) -> &[u8] {
        &self.buf
    }

    /// Size of the body in bytes.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Number of dictionary entries.
    pub fn num_values(&self) -> u32 {
        self.num_values
    }

    /// Encoding of the pages using this dictionary.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Whether the dictionary entries are sorted.
    pub fn is_sorted(&self) -> bool {
        self.is_sorted
    }
}

/// Write-side state machine for one column chunk (see the serialized and
/// buffered implementations in [`crate::file::writer`]).
///
/// Pages must be written in order; `close` finalizes the chunk metadata and
/// writes it after the last page, handing the finished metadata builder back
/// to the row group.
pub(crate) trait PageWriter {
    /// Writes a data page, returning the number of bytes written (header
    /// included).
    fn write_data_page(&mut self, page: &CompressedDataPage) -> Result<u64>;

    /// Writes a dictionary page, returning the number of bytes written
    /// (header included).
    fn write_dictionary_page(&mut self, page: &DictionaryPage) -> Result<u64>;

    /// Whether a compressor is configured for this chunk.
    fn has_compressor(&self) -> bool;

    /// Compresses `input`, appending to `output`.
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;

    /// Closes the chunk: attaches `chunk_statistics`, finalizes the column
    /// metadata, writes it after the last page, and returns the finished
    /// builder.
    fn close(
        &mut self,
        has_dictionary: bool,
        fallback: bool,
        chunk_statistics: Option<EncodedStatistics>,
    ) -> Result<ColumnChunkMetaDataBuilder>;
}
