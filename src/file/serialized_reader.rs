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

//! Serialized file reader: parses the footer into [`ParquetMetaData`] and
//! iterates the pages of a column chunk, decrypting and decompressing them.

use bytes::Bytes;

use crate::basic::PageType;
use crate::column::page::Page;
use crate::compression::{create_codec, Codec};
use crate::encryption::decrypt::Decryptor;
use crate::encryption::modules::{create_module_aad, ModuleType};
use crate::errors::{ParquetError, Result};
use crate::file::footer::parse_metadata;
use crate::file::metadata::ParquetMetaData;
use crate::file::properties::ReaderProperties;
use crate::file::reader::ChunkReader;
use crate::file::statistics::EncodedStatistics;
use crate::format;
use crate::thrift::read_thrift_object;

/// Reader for a Parquet file backed by a [`ChunkReader`].
pub struct SerializedFileReader<R: ChunkReader> {
    chunk_reader: R,
    metadata: ParquetMetaData,
}

impl<R: ChunkReader> std::fmt::Debug for SerializedFileReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializedFileReader").finish()
    }
}

impl<R: ChunkReader> SerializedFileReader<R> {
    /// Opens a file with default reader properties.
    pub fn new(chunk_reader: R) -> Result<Self> {
        Self::new_with_properties(chunk_reader, &ReaderProperties::default())
    }

    /// Opens a file, parsing and validating its footer.
    pub fn new_with_properties(chunk_reader: R, properties: &ReaderProperties) -> Result<Self> {
        let metadata = parse_metadata(&chunk_reader, properties)?;
        Ok(Self {
            chunk_reader,
            metadata,
        })
    }

    /// The parsed file metadata.
    pub fn metadata(&self) -> &ParquetMetaData {
        &self.metadata
    }

    /// Number of row groups in the file.
    pub fn num_row_groups(&self) -> usize {
        self.metadata.num_row_groups()
    }

    /// Returns a page reader over the pages of one column chunk.
    pub fn get_column_page_reader(
        &self,
        row_group: usize,
        column: usize,
    ) -> Result<SerializedPageReader> {
        let row_group_meta = self.metadata.row_group(row_group)?;
        let column_meta = row_group_meta.column(column)?;

        let (start, length) = column_meta.byte_range()?;
        let buffer = self.chunk_reader.get_bytes(start, length as usize)?;
        let codec = create_codec(column_meta.compression()?)?;
        let starts_with_dictionary = column_meta.has_dictionary_page()?;

        let crypto = match (column_meta.crypto_metadata(), self.metadata.file_decryptor()) {
            (Some(crypto_metadata), Some(file_decryptor)) => {
                let (meta_decryptor, data_decryptor) = match crypto_metadata {
                    format::ColumnCryptoMetaData::ENCRYPTION_WITH_FOOTER_KEY => (
                        file_decryptor.get_footer_decryptor()?,
                        file_decryptor.get_footer_data_decryptor()?,
                    ),
                    format::ColumnCryptoMetaData::ENCRYPTION_WITH_COLUMN_KEY(key_info) => {
                        let path = key_info.path_in_schema.join(".");
                        (
                            file_decryptor.get_column_meta_decryptor(&path)?,
                            file_decryptor.get_column_data_decryptor(&path)?,
                        )
                    }
                };
                Some(PageCryptoContext {
                    meta_decryptor,
                    data_decryptor,
                    row_group_ordinal: row_group_meta.ordinal() as usize,
                    column_ordinal: column,
                })
            }
            _ => None,
        };

        Ok(SerializedPageReader {
            buffer,
            offset: 0,
            codec,
            crypto,
            at_dictionary_page: starts_with_dictionary,
            page_ordinal: 0,
        })
    }
}

struct PageCryptoContext {
    meta_decryptor: Decryptor,
    data_decryptor: Decryptor,
    row_group_ordinal: usize,
    column_ordinal: usize,
}

/// Iterates the pages of one column chunk in file order.
///
/// For encrypted columns the page ordinal used in the AAD of the k-th data
/// page is exactly k, regardless of how the writer buffered its pages; the
/// dictionary page carries no ordinal.
pub struct SerializedPageReader {
    buffer: Bytes,
    offset: usize,
    codec: Option<Box<dyn Codec>>,
    crypto: Option<PageCryptoContext>,
    at_dictionary_page: bool,
    page_ordinal: usize,
}

impl SerializedPageReader {
    /// Reads the next page, or `None` after the last page of the chunk.
    pub fn get_next_page(&mut self) -> Result<Option<Page>> {
        if self.offset >= self.buffer.len() {
            return Ok(None);
        }
        let remaining = &self.buffer[self.offset..];

        let (header, header_len) = match &self.crypto {
            None => read_thrift_object::<format::PageHeader>(remaining, None, &[])?,
            Some(ctx) => {
                let module_type = if self.at_dictionary_page {
                    ModuleType::DictionaryPageHeader
                } else {
                    ModuleType::DataPageHeader
                };
                let page_ordinal = (!self.at_dictionary_page).then_some(self.page_ordinal);
                let aad = create_module_aad(
                    ctx.meta_decryptor.file_aad(),
                    module_type,
                    ctx.row_group_ordinal,
                    ctx.column_ordinal,
                    page_ordinal,
                )?;
                read_thrift_object::<format::PageHeader>(
                    remaining,
                    Some(&ctx.meta_decryptor),
                    &aad,
                )?
            }
        };
        self.offset += header_len;

        let body_len = header.compressed_page_size as usize;
        if self.offset + body_len > self.buffer.len() {
            return Err(ParquetError::EOF(
                "page body extends past the column chunk".to_owned(),
            ));
        }
        let stored_body = self.buffer.slice(self.offset..self.offset + body_len);
        self.offset += body_len;

        let compressed_body: Bytes = match &self.crypto {
            None => stored_body,
            Some(ctx) => {
                let module_type = if self.at_dictionary_page {
                    ModuleType::DictionaryPage
                } else {
                    ModuleType::DataPage
                };
                let page_ordinal = (!self.at_dictionary_page).then_some(self.page_ordinal);
                let aad = create_module_aad(
                    ctx.data_decryptor.file_aad(),
                    module_type,
                    ctx.row_group_ordinal,
                    ctx.column_ordinal,
                    page_ordinal,
                )?;
                ctx.data_decryptor.decrypt(&stored_body, &aad)?.into()
            }
        };

        let body: Bytes = match self.codec.as_mut() {
            Some(codec) => {
                let mut decompressed =
                    Vec::with_capacity(header.uncompressed_page_size as usize);
                codec.decompress(&compressed_body, &mut decompressed)?;
                decompressed.into()
            }
            None => compressed_body,
        };

        let page = match header.type_ {
            PageType::DICTIONARY_PAGE => {
                let dict_header = header.dictionary_page_header.as_ref().ok_or_else(|| {
                    ParquetError::DeserializeFailed(
                        "dictionary page header is missing".to_owned(),
                    )
                })?;
                self.at_dictionary_page = false;
                Page::DictionaryPage {
                    buf: body,
                    num_values: dict_header.num_values as u32,
                    encoding: dict_header.encoding,
                    is_sorted: dict_header.is_sorted.unwrap_or(false),
                }
            }
            PageType::DATA_PAGE => {
                let data_header = header.data_page_header.as_ref().ok_or_else(|| {
                    ParquetError::DeserializeFailed("data page header is missing".to_owned())
                })?;
                self.at_dictionary_page = false;
                self.page_ordinal += 1;
                Page::DataPage {
                    buf: body,
                    num_values: data_header.num_values as u32,
                    encoding: data_header.encoding,
                    def_level_encoding: data_header.definition_level_encoding,
                    rep_level_encoding: data_header.repetition_level_encoding,
                    statistics: convert_page_statistics(data_header.statistics.as_ref()),
                }
            }
            other => {
                return Err(nyi_err!("unsupported page type {}", other));
            }
        };

        Ok(Some(page))
    }
}

fn convert_page_statistics(stats: Option<&format::Statistics>) -> Option<EncodedStatistics> {
    stats.map(|stats| {
        let mut encoded = EncodedStatistics::default();
        encoded.min = stats.min_value.clone().or_else(|| stats.min.clone());
        encoded.max = stats.max_value.clone().or_else(|| stats.max.clone());
        encoded.null_count = stats.null_count;
        encoded.distinct_count = stats.distinct_count;
        encoded
    })
}
