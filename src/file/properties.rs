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

//! Configuration for the writer and reader.

use std::collections::HashMap;
use std::sync::Arc;

use crate::basic::{Compression, Encoding};
use crate::encryption::decrypt::FileDecryptionProperties;
use crate::encryption::encrypt::FileEncryptionProperties;
use crate::format::KeyValue;
use crate::schema::types::ColumnPath;

const DEFAULT_PAGE_SIZE: usize = 1024 * 1024;
const DEFAULT_WRITE_BATCH_SIZE: usize = 1024;
const DEFAULT_WRITER_VERSION: WriterVersion = WriterVersion::PARQUET_1_0;
const DEFAULT_COMPRESSION: Compression = Compression::UNCOMPRESSED;
const DEFAULT_DICTIONARY_ENABLED: bool = true;
const DEFAULT_DICTIONARY_PAGE_SIZE_LIMIT: usize = DEFAULT_PAGE_SIZE;
const DEFAULT_STATISTICS_ENABLED: bool = true;
const DEFAULT_MAX_STATISTICS_SIZE: usize = 4096;
const DEFAULT_CREATED_BY: &str = concat!("parquet-core version ", env!("CARGO_PKG_VERSION"));

/// Reference counted writer properties.
pub type WriterPropertiesPtr = Arc<WriterProperties>;

/// The Parquet format version to write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum WriterVersion {
    /// Parquet format version 1.0.
    PARQUET_1_0,
    /// Parquet format version 2.0.
    PARQUET_2_0,
}

impl WriterVersion {
    /// Number of the version as it appears in the file metadata.
    pub fn as_num(&self) -> i32 {
        match self {
            WriterVersion::PARQUET_1_0 => 1,
            WriterVersion::PARQUET_2_0 => 2,
        }
    }
}

// Per-column overrides of the file-wide defaults.
#[derive(Clone, Debug, Default, PartialEq)]
struct ColumnProperties {
    encoding: Option<Encoding>,
    compression: Option<Compression>,
    dictionary_enabled: Option<bool>,
    statistics_enabled: Option<bool>,
    max_statistics_size: Option<usize>,
}

/// Immutable configuration for the file writer: page sizing, per-column
/// encodings, compression, statistics, the producer string, and the optional
/// file encryption properties.
#[derive(Clone, Debug)]
pub struct WriterProperties {
    data_page_size_limit: usize,
    dictionary_page_size_limit: usize,
    write_batch_size: usize,
    writer_version: WriterVersion,
    created_by: String,
    key_value_metadata: Option<Vec<KeyValue>>,
    default_column_properties: ColumnProperties,
    column_properties: HashMap<ColumnPath, ColumnProperties>,
    file_encryption_properties: Option<FileEncryptionProperties>,
}

impl Default for WriterProperties {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WriterProperties {
    /// Returns a new default builder.
    pub fn builder() -> WriterPropertiesBuilder {
        WriterPropertiesBuilder::with_defaults()
    }

    /// Data page size limit in bytes: a page is cut once the encoded values
    /// reach this size.
    pub fn data_page_size_limit(&self) -> usize {
        self.data_page_size_limit
    }

    /// Dictionary page size limit in bytes: once the dictionary grows past
    /// this, the writer falls back to PLAIN encoding.
    pub fn dictionary_page_size_limit(&self) -> usize {
        self.dictionary_page_size_limit
    }

    /// Number of values consumed per encoding pass, bounding how far the
    /// page size check can overshoot.
    pub fn write_batch_size(&self) -> usize {
        self.write_batch_size
    }

    /// The format version being written.
    pub fn writer_version(&self) -> WriterVersion {
        self.writer_version
    }

    /// The `created_by` string recorded in the file metadata.
    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    /// Optional key/value metadata recorded in the file metadata.
    pub fn key_value_metadata(&self) -> Option<&Vec<KeyValue>> {
        self.key_value_metadata.as_ref()
    }

    /// Encryption configuration, when writing an encrypted file.
    pub fn file_encryption_properties(&self) -> Option<&FileEncryptionProperties> {
        self.file_encryption_properties.as_ref()
    }

    /// Encoding for the dictionary indices in data pages.
    pub fn dictionary_index_encoding(&self) -> Encoding {
        match self.writer_version {
            WriterVersion::PARQUET_1_0 => Encoding::PLAIN_DICTIONARY,
            WriterVersion::PARQUET_2_0 => Encoding::RLE_DICTIONARY,
        }
    }

    /// Encoding for the dictionary page itself.
    pub fn dictionary_page_encoding(&self) -> Encoding {
        match self.writer_version {
            WriterVersion::PARQUET_1_0 => Encoding::PLAIN_DICTIONARY,
            WriterVersion::PARQUET_2_0 => Encoding::PLAIN,
        }
    }

    /// Encoding for values of the given column when dictionary encoding is
    /// not in use.
    pub fn encoding(&self, col: &ColumnPath) -> Encoding {
        self.column_properties
            .get(col)
            .and_then(|c| c.encoding)
            .or(self.default_column_properties.encoding)
            .unwrap_or(Encoding::PLAIN)
    }

    /// Compression codec for the given column.
    pub fn compression(&self, col: &ColumnPath) -> Compression {
        self.column_properties
            .get(col)
            .and_then(|c| c.compression)
            .or(self.default_column_properties.compression)
            .unwrap_or(DEFAULT_COMPRESSION)
    }

    /// Whether dictionary encoding is enabled for the given column.
    pub fn dictionary_enabled(&self, col: &ColumnPath) -> bool {
        self.column_properties
            .get(col)
            .and_then(|c| c.dictionary_enabled)
            .or(self.default_column_properties.dictionary_enabled)
            .unwrap_or(DEFAULT_DICTIONARY_ENABLED)
    }

    /// Whether statistics are collected for the given column.
    pub fn statistics_enabled(&self, col: &ColumnPath) -> bool {
        self.column_properties
            .get(col)
            .and_then(|c| c.statistics_enabled)
            .or(self.default_column_properties.statistics_enabled)
            .unwrap_or(DEFAULT_STATISTICS_ENABLED)
    }

    /// Maximum size in bytes of a single min/max statistics value for the
    /// given column.
    pub fn max_statistics_size(&self, col: &ColumnPath) -> usize {
        self.column_properties
            .get(col)
            .and_then(|c| c.max_statistics_size)
            .or(self.default_column_properties.max_statistics_size)
            .unwrap_or(DEFAULT_MAX_STATISTICS_SIZE)
    }
}

/// Builder for [`WriterProperties`].
pub struct WriterPropertiesBuilder {
    data_page_size_limit: usize,
    dictionary_page_size_limit: usize,
    write_batch_size: usize,
    writer_version: WriterVersion,
    created_by: String,
    key_value_metadata: Option<Vec<KeyValue>>,
    default_column_properties: ColumnProperties,
    column_properties: HashMap<ColumnPath, ColumnProperties>,
    file_encryption_properties: Option<FileEncryptionProperties>,
}

impl WriterPropertiesBuilder {
    fn with_defaults() -> Self {
        Self {
            data_page_size_limit: DEFAULT_PAGE_SIZE,
            dictionary_page_size_limit: DEFAULT_DICTIONARY_PAGE_SIZE_LIMIT,
            write_batch_size: DEFAULT_WRITE_BATCH_SIZE,
            writer_version: DEFAULT_WRITER_VERSION,
            created_by: DEFAULT_CREATED_BY.to_owned(),
            key_value_metadata: None,
            default_column_properties: ColumnProperties::default(),
            column_properties: HashMap::new(),
            file_encryption_properties: None,
        }
    }

    /// Finalizes the builder.
    pub fn build(self) -> WriterProperties {
        WriterProperties {
            data_page_size_limit: self.data_page_size_limit,
            dictionary_page_size_limit: self.dictionary_page_size_limit,
            write_batch_size: self.write_batch_size,
            writer_version: self.writer_version,
            created_by: self.created_by,
            key_value_metadata: self.key_value_metadata,
            default_column_properties: self.default_column_properties,
            column_properties: self.column_properties,
            file_encryption_properties: self.file_encryption_properties,
        }
    }

    /// Sets the format version to write.
    pub fn set_writer_version(mut self, value: WriterVersion) -> Self {
        self.writer_version = value;
        self
    }

    /// Sets the data page size limit.
    pub fn set_data_page_size_limit(mut self, value: usize) -> Self {
        self.data_page_size_limit = value;
        self
    }

    /// Sets the dictionary page size limit.
    pub fn set_dictionary_page_size_limit(mut self, value: usize) -> Self {
        self.dictionary_page_size_limit = value;
        self
    }

    /// Sets the write batch size.
    pub fn set_write_batch_size(mut self, value: usize) -> Self {
        self.write_batch_size = value;
        self
    }

    /// Sets the `created_by` string.
    pub fn set_created_by(mut self, value: String) -> Self {
        self.created_by = value;
        self
    }

    /// Sets the key/value metadata.
    pub fn set_key_value_metadata(mut self, value: Option<Vec<KeyValue>>) -> Self {
        self.key_value_metadata = value;
        self
    }

    /// Sets the file encryption properties.
    pub fn set_file_encryption_properties(mut self, value: FileEncryptionProperties) -> Self {
        self.file_encryption_properties = Some(value);
        self
    }

    /// Sets the default value encoding for all columns.
    pub fn set_encoding(mut self, value: Encoding) -> Self {
        self.default_column_properties.encoding = Some(value);
        self
    }

    /// Sets the default compression codec for all columns.
    pub fn set_compression(mut self, value: Compression) -> Self {
        self.default_column_properties.compression = Some(value);
        self
    }

    /// Enables or disables dictionary encoding for all columns.
    pub fn set_dictionary_enabled(mut self, value: bool) -> Self {
        self.default_column_properties.dictionary_enabled = Some(value);
        self
    }

    /// Enables or disables statistics for all columns.
    pub fn set_statistics_enabled(mut self, value: bool) -> Self {
        self.default_column_properties.statistics_enabled = Some(value);
        self
    }

    /// Sets the default maximum statistics size for all columns.
    pub fn set_max_statistics_size(mut self, value: usize) -> Self {
        self.default_column_properties.max_statistics_size = Some(value);
        self
    }

    fn column_mut(&mut self, col: ColumnPath) -> &mut ColumnProperties {
        self.column_properties.entry(col).or_default()
    }

    /// Sets the value encoding for a specific column.
    pub fn set_column_encoding(mut self, col: ColumnPath, value: Encoding) -> Self {
        self.column_mut(col).encoding = Some(value);
        self
    }

    /// Sets the compression codec for a specific column.
    pub fn set_column_compression(mut self, col: ColumnPath, value: Compression) -> Self {
        self.column_mut(col).compression = Some(value);
        self
    }

    /// Enables or disables dictionary encoding for a specific column.
    pub fn set_column_dictionary_enabled(mut self, col: ColumnPath, value: bool) -> Self {
        self.column_mut(col).dictionary_enabled = Some(value);
        self
    }

    /// Enables or disables statistics for a specific column.
    pub fn set_column_statistics_enabled(mut self, col: ColumnPath, value: bool) -> Self {
        self.column_mut(col).statistics_enabled = Some(value);
        self
    }

    /// Sets the maximum statistics size for a specific column.
    pub fn set_column_max_statistics_size(mut self, col: ColumnPath, value: usize) -> Self {
        self.column_mut(col).max_statistics_size = Some(value);
        self
    }
}

/// Configuration for the file reader.
#[derive(Clone, Debug, Default)]
pub struct ReaderProperties {
    file_decryption_properties: Option<Arc<FileDecryptionProperties>>,
}

impl ReaderProperties {
    /// Returns a new default builder.
    pub fn builder() -> ReaderPropertiesBuilder {
        ReaderPropertiesBuilder::default()
    }

    /// Decryption configuration, when reading encrypted files.
    pub fn file_decryption_properties(&self) -> Option<&Arc<FileDecryptionProperties>> {
        self.file_decryption_properties.as_ref()
    }
}

/// Builder for [`ReaderProperties`].
#[derive(Default)]
pub struct ReaderPropertiesBuilder {
    file_decryption_properties: Option<Arc<FileDecryptionProperties>>,
}

impl ReaderPropertiesBuilder {
    /// Finalizes the builder.
    pub fn build(self) -> ReaderProperties {
        ReaderProperties {
            file_decryption_properties: self.file_decryption_properties,
        }
    }

    /// Sets the file decryption properties.
    pub fn set_file_decryption_properties(
        mut self,
        value: Arc<FileDecryptionProperties>,
    ) -> Self {
        self.file_decryption_properties = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let props = WriterProperties::default();
        let col = ColumnPath::from("a");
        assert_eq!(props.compression(&col), Compression::UNCOMPRESSED);
        assert_eq!(props.encoding(&col), Encoding::PLAIN);
        assert!(props.dictionary_enabled(&col));
        assert!(props.statistics_enabled(&col));
        assert_eq!(props.max_statistics_size(&col), DEFAULT_MAX_STATISTICS_SIZE);
        assert!(props.created_by().starts_with("parquet-core version"));
    }

    #[test]
    fn test_column_overrides() {
        let a = ColumnPath::from("a");
        let b = ColumnPath::from("b");
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_column_compression(a.clone(), Compression::ZSTD)
            .set_column_dictionary_enabled(a.clone(), false)
            .build();
        assert_eq!(props.compression(&a), Compression::ZSTD);
        assert_eq!(props.compression(&b), Compression::SNAPPY);
        assert!(!props.dictionary_enabled(&a));
        assert!(props.dictionary_enabled(&b));
    }

    #[test]
    fn test_dictionary_encodings_by_version() {
        let v1 = WriterProperties::builder().build();
        assert_eq!(v1.dictionary_index_encoding(), Encoding::PLAIN_DICTIONARY);
        assert_eq!(v1.dictionary_page_encoding(), Encoding::PLAIN_DICTIONARY);
        let v2 = WriterProperties::builder()
            .set_writer_version(WriterVersion::PARQUET_2_0)
            .build();
        assert_eq!(v2.dictionary_index_encoding(), Encoding::RLE_DICTIONARY);
        assert_eq!(v2.dictionary_page_encoding(), Encoding::PLAIN);
    }
}
