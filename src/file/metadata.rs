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

//! Parquet metadata: the read-only accessor hierarchy, the producer-version
//! statistics predicate, and the builders assembling fresh metadata on the
//! write path.
//!
//! [`ParquetMetaData`] owns the parsed thrift structure and hands out
//! borrowed [`RowGroupMetaData`] and [`ColumnChunkMetaData`] views on demand.
//! Column chunks whose metadata is encrypted with a column key are decrypted
//! into a private field during view construction; when the key is absent the
//! view stays constructible but metadata field access fails with
//! [`ParquetError::MissingColumnKey`].

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::basic::{ColumnOrder, Compression, Encoding, SortOrder, Type};
use crate::encryption::decrypt::InternalFileDecryptor;
use crate::encryption::encrypt::{ColumnEncryptionSetup, Encryptor};
use crate::encryption::modules::{create_module_aad, ModuleType};
use crate::errors::{ParquetError, Result};
use crate::file::properties::{WriterPropertiesPtr, WriterVersion};
use crate::file::statistics::{from_thrift as statistics_from_thrift, EncodedStatistics, Statistics};
use crate::format;
use crate::schema::types::{
    from_thrift as schema_from_thrift, to_thrift as schema_to_thrift, ColumnDescPtr, ColumnPath,
    SchemaDescPtr, SchemaDescriptor,
};
use crate::thrift::serialize_thrift_object;

// ----------------------------------------------------------------------
// ApplicationVersion

// major . minor . patch unknown - prerelease + build info
// e.g. 1.5.0ab-cdh5.5.0+cd
const VERSION_FORMAT: &str = r"^(\d+)\.(\d+)\.(\d+)([^-+]*)?(?:-([^+]*))?(?:\+(.*))?$";
// application_name version VERSION (build build_name)
// e.g. parquet-cpp version 1.5.0ab-xyz5.5.0+cd (build abcd)
const APPLICATION_FORMAT: &str =
    r"^(.*?)\s*(?:(version\s*(?:([^(]*?)\s*(?:\(\s*build\s*([^)]*?)\s*\))?)?)?)$";

fn application_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(APPLICATION_FORMAT).unwrap())
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VERSION_FORMAT).unwrap())
}

/// Semantic version of the application that produced a file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Version {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    /// Trailing garbage directly after the patch number.
    pub unknown: String,
    /// Pre-release tag after `-`.
    pub pre_release: String,
    /// Build info after `+`.
    pub build_info: String,
}

/// Identity of the application that wrote a file, parsed from the free-form
/// `created_by` string. Drives the statistics-correctness predicate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApplicationVersion {
    /// Application name, lowercased; `"unknown"` when unparseable.
    pub application: String,
    /// Build name, when present.
    pub build: String,
    /// Parsed version numbers; 0.0.0 when unparseable.
    pub version: Version,
}

impl ApplicationVersion {
    /// Version of parquet-mr with PARQUET-251 fixed.
    fn parquet_251_fixed() -> &'static ApplicationVersion {
        static V: OnceLock<ApplicationVersion> = OnceLock::new();
        V.get_or_init(|| ApplicationVersion::new("parquet-mr", 1, 8, 0))
    }

    /// First parquet-cpp version computing statistics correctly for all types.
    fn parquet_cpp_fixed_stats() -> &'static ApplicationVersion {
        static V: OnceLock<ApplicationVersion> = OnceLock::new();
        V.get_or_init(|| ApplicationVersion::new("parquet-cpp", 1, 3, 0))
    }

    /// First parquet-mr version computing statistics correctly for all types.
    fn parquet_mr_fixed_stats() -> &'static ApplicationVersion {
        static V: OnceLock<ApplicationVersion> = OnceLock::new();
        V.get_or_init(|| ApplicationVersion::new("parquet-mr", 1, 10, 0))
    }

    /// Creates a version from known parts.
    pub fn new(application: &str, major: i32, minor: i32, patch: i32) -> Self {
        Self {
            application: application.to_owned(),
            build: String::new(),
            version: Version {
                major,
                minor,
                patch,
                ..Default::default()
            },
        }
    }

    /// Parses a `created_by` string. Unparseable inputs yield
    /// `"unknown"` 0.0.0.
    pub fn parse(created_by: &str) -> Self {
        let created_by_lower = created_by.to_lowercase();

        let mut application = "unknown".to_owned();
        let mut build = String::new();
        let mut version = Version::default();

        if let Some(caps) = application_regex().captures(&created_by_lower) {
            if let Some(app) = caps.get(1) {
                application = app.as_str().to_owned();
            }
            if let Some(b) = caps.get(4) {
                build = b.as_str().to_owned();
            }
            if let Some(version_str) = caps.get(3) {
                if let Some(ver) = version_regex().captures(version_str.as_str()) {
                    version.major = ver.get(1).unwrap().as_str().parse().unwrap_or(0);
                    version.minor = ver.get(2).unwrap().as_str().parse().unwrap_or(0);
                    version.patch = ver.get(3).unwrap().as_str().parse().unwrap_or(0);
                    version.unknown = ver.get(4).map(|m| m.as_str().to_owned()).unwrap_or_default();
                    version.pre_release =
                        ver.get(5).map(|m| m.as_str().to_owned()).unwrap_or_default();
                    version.build_info =
                        ver.get(6).map(|m| m.as_str().to_owned()).unwrap_or_default();
                }
            }
        }

        Self {
            application,
            build,
            version,
        }
    }

    /// True when `self` precedes `other`. Versions of different applications
    /// do not compare.
    pub fn version_lt(&self, other: &ApplicationVersion) -> bool {
        if self.application != other.application {
            return false;
        }
        let lhs = (self.version.major, self.version.minor, self.version.patch);
        let rhs = (
            other.version.major,
            other.version.minor,
            other.version.patch,
        );
        lhs < rhs
    }

    /// True when `self` and `other` denote the same application version.
    pub fn version_eq(&self, other: &ApplicationVersion) -> bool {
        self.application == other.application
            && self.version.major == other.version.major
            && self.version.minor == other.version.minor
            && self.version.patch == other.version.patch
    }

    /// Whether statistics written by this producer can be trusted for a
    /// column of `col_type` with the given encoded statistics and sort order.
    ///
    /// Encodes the known producer bugs: PARQUET-251 (bad byte-array
    /// truncation in old parquet-mr) and the pre-1.3.0 parquet-cpp /
    /// pre-1.10.0 parquet-mr min/max comparison that was only correct for
    /// signed orders.
    ///
    /// Reference: `parquet-mr/.../CorruptStatistics.java`; PARQUET-686 has
    /// more discussion on statistics.
    pub fn has_correct_statistics(
        &self,
        col_type: Type,
        statistics: &EncodedStatistics,
        sort_order: SortOrder,
    ) -> bool {
        // parquet-cpp 1.3.0 and parquet-mr 1.10.0 onwards compute statistics
        // correctly for all types
        if (self.application == "parquet-cpp"
            && self.version_lt(Self::parquet_cpp_fixed_stats()))
            || (self.application == "parquet-mr" && self.version_lt(Self::parquet_mr_fixed_stats()))
        {
            // only SIGNED orders are valid, unless max and min are the same
            // (in which case the sort order does not matter)
            let max_equals_min = match (&statistics.min, &statistics.max) {
                (Some(min), Some(max)) => min == max,
                _ => false,
            };
            if sort_order != SortOrder::SIGNED && !max_equals_min {
                return false;
            }

            // statistics of non-byte-array types are OK
            if col_type != Type::FIXED_LEN_BYTE_ARRAY && col_type != Type::BYTE_ARRAY {
                return true;
            }
        }

        // created_by is not populated, which could have been caused by
        // parquet-mr during the same time as PARQUET-251, see PARQUET-297
        if self.application == "unknown" {
            return true;
        }

        if SortOrder::UNKNOWN == sort_order {
            return false;
        }

        // PARQUET-251
        if self.version_lt(Self::parquet_251_fixed()) {
            return false;
        }

        true
    }
}

// ----------------------------------------------------------------------
// Accessors

/// Parsed metadata of one Parquet file.
///
/// Owns the thrift structure, the schema descriptor derived from it, the
/// producer identity, and (for encrypted files) the decryption context used
/// by lazily constructed column views.
pub struct ParquetMetaData {
    metadata: format::FileMetaData,
    schema_descr: SchemaDescPtr,
    column_orders: Vec<ColumnOrder>,
    writer_version: ApplicationVersion,
    file_decryptor: Option<InternalFileDecryptor>,
}

impl ParquetMetaData {
    /// Builds the accessor from a decoded thrift structure.
    pub(crate) fn new(
        metadata: format::FileMetaData,
        file_decryptor: Option<InternalFileDecryptor>,
    ) -> Result<Self> {
        let schema = schema_from_thrift(&metadata.schema)?;
        let schema_descr = Arc::new(SchemaDescriptor::new(schema));

        // resolve the per-column orders against the schema
        let column_orders = match metadata.column_orders.as_ref() {
            Some(orders) => {
                if orders.len() != schema_descr.num_columns() {
                    return Err(general_err!(
                        "Column order length mismatch: {} orders for {} columns",
                        orders.len(),
                        schema_descr.num_columns()
                    ));
                }
                orders
                    .iter()
                    .zip(schema_descr.columns())
                    .map(|(order, column)| match order {
                        ColumnOrder::TYPE_DEFINED_ORDER(_) => {
                            ColumnOrder::TYPE_DEFINED_ORDER(column.sort_order())
                        }
                        other => *other,
                    })
                    .collect()
            }
            None => vec![ColumnOrder::UNDEFINED; schema_descr.num_columns()],
        };

        let writer_version = match metadata.created_by.as_deref() {
            Some(created_by) => ApplicationVersion::parse(created_by),
            None => ApplicationVersion::parse("unknown 0.0.0"),
        };

        Ok(Self {
            metadata,
            schema_descr,
            column_orders,
            writer_version,
            file_decryptor,
        })
    }

    /// File format version.
    pub fn version(&self) -> i32 {
        self.metadata.version
    }

    /// Total number of rows in the file.
    pub fn num_rows(&self) -> i64 {
        self.metadata.num_rows
    }

    /// The raw `created_by` string, when recorded.
    pub fn created_by(&self) -> Option<&str> {
        self.metadata.created_by.as_deref()
    }

    /// Parsed producer identity.
    pub fn writer_version(&self) -> &ApplicationVersion {
        &self.writer_version
    }

    /// Key/value metadata, when recorded.
    pub fn key_value_metadata(&self) -> Option<&Vec<format::KeyValue>> {
        self.metadata.key_value_metadata.as_ref()
    }

    /// The schema descriptor.
    pub fn schema_descr(&self) -> &SchemaDescriptor {
        &self.schema_descr
    }

    /// Reference counted clone of the schema descriptor.
    pub fn schema_descr_ptr(&self) -> SchemaDescPtr {
        self.schema_descr.clone()
    }

    /// Number of leaf columns.
    pub fn num_columns(&self) -> usize {
        self.schema_descr.num_columns()
    }

    /// Number of row groups.
    pub fn num_row_groups(&self) -> usize {
        self.metadata.row_groups.len()
    }

    /// Column order of the `i`-th leaf column.
    pub fn column_order(&self, i: usize) -> ColumnOrder {
        self.column_orders[i]
    }

    /// Whether the footer carries an encryption algorithm, i.e. the file is
    /// encrypted with a plaintext footer.
    pub fn is_encryption_algorithm_set(&self) -> bool {
        self.metadata.encryption_algorithm.is_some()
    }

    pub(crate) fn encryption_algorithm(&self) -> Option<&format::EncryptionAlgorithm> {
        self.metadata.encryption_algorithm.as_ref()
    }

    pub(crate) fn footer_signing_key_metadata(&self) -> Option<&[u8]> {
        self.metadata.footer_signing_key_metadata.as_deref()
    }

    pub(crate) fn file_decryptor(&self) -> Option<&InternalFileDecryptor> {
        self.file_decryptor.as_ref()
    }

    pub(crate) fn set_file_decryptor(&mut self, file_decryptor: InternalFileDecryptor) {
        self.file_decryptor = Some(file_decryptor);
    }

    /// Wipes the decryption keys held by this metadata's context, if any.
    pub fn wipe_decryption_keys(&mut self) {
        if let Some(decryptor) = self.file_decryptor.as_mut() {
            decryptor.wipe_out_decryption_keys();
        }
    }

    /// Returns the view of the `i`-th row group.
    pub fn row_group(&self, i: usize) -> Result<RowGroupMetaData<'_>> {
        if i >= self.num_row_groups() {
            return Err(ParquetError::IndexOutOfBound(i, self.num_row_groups()));
        }
        Ok(RowGroupMetaData {
            parent: self,
            row_group: &self.metadata.row_groups[i],
            index: i,
        })
    }
}

impl std::fmt::Debug for ParquetMetaData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetMetaData")
            .field("version", &self.version())
            .field("num_rows", &self.num_rows())
            .field("num_row_groups", &self.num_row_groups())
            .finish()
    }
}

/// Borrowed view of one row group's metadata.
#[derive(Clone, Copy)]
pub struct RowGroupMetaData<'a> {
    parent: &'a ParquetMetaData,
    row_group: &'a format::RowGroup,
    index: usize,
}

impl<'a> RowGroupMetaData<'a> {
    /// Number of columns in this row group.
    pub fn num_columns(&self) -> usize {
        self.row_group.columns.len()
    }

    /// Number of rows in this row group.
    pub fn num_rows(&self) -> i64 {
        self.row_group.num_rows
    }

    /// Total uncompressed byte size recorded for this row group.
    pub fn total_byte_size(&self) -> i64 {
        self.row_group.total_byte_size
    }

    /// Total compressed byte size, when recorded.
    pub fn total_compressed_size(&self) -> Option<i64> {
        self.row_group.total_compressed_size
    }

    /// Byte offset of the first page in this row group, when recorded.
    pub fn file_offset(&self) -> Option<i64> {
        self.row_group.file_offset
    }

    /// Ordinal of this row group: the recorded one, or the position in the
    /// row group list.
    pub fn ordinal(&self) -> i16 {
        self.row_group.ordinal.unwrap_or(self.index as i16)
    }

    /// The schema descriptor.
    pub fn schema_descr(&self) -> &SchemaDescriptor {
        self.parent.schema_descr()
    }

    /// Returns the view of the `i`-th column chunk, decrypting its metadata
    /// when necessary.
    pub fn column(&self, i: usize) -> Result<ColumnChunkMetaData<'a>> {
        if i >= self.num_columns() {
            return Err(ParquetError::IndexOutOfBound(i, self.num_columns()));
        }
        ColumnChunkMetaData::new(
            self.parent,
            &self.row_group.columns[i],
            self.parent.schema_descr.column(i),
            self.ordinal(),
            i,
        )
    }
}

/// Borrowed view of one column chunk's metadata.
///
/// When the chunk's metadata is encrypted with a column key, the plaintext is
/// decrypted into `decrypted_metadata` at construction; if the key is not
/// available the view is still returned, and metadata field accessors fail
/// with [`ParquetError::MissingColumnKey`].
pub struct ColumnChunkMetaData<'a> {
    column: &'a format::ColumnChunk,
    descr: ColumnDescPtr,
    column_order: ColumnOrder,
    writer_version: &'a ApplicationVersion,
    decrypted_metadata: Option<format::ColumnMetaData>,
}

impl<'a> ColumnChunkMetaData<'a> {
    fn new(
        parent: &'a ParquetMetaData,
        column: &'a format::ColumnChunk,
        descr: ColumnDescPtr,
        row_group_ordinal: i16,
        column_ordinal: usize,
    ) -> Result<Self> {
        let mut decrypted_metadata = None;

        if let Some(format::ColumnCryptoMetaData::ENCRYPTION_WITH_COLUMN_KEY(key_info)) =
            column.crypto_metadata.as_ref()
        {
            if let (Some(ciphertext), Some(decryptor)) = (
                column.encrypted_column_metadata.as_deref(),
                parent.file_decryptor(),
            ) {
                let path = key_info.path_in_schema.join(".");
                match decryptor.get_column_meta_decryptor(&path) {
                    Err(ParquetError::MissingColumnKey(_)) => {
                        // leave the metadata unreadable; other columns stay usable
                    }
                    Err(e) => return Err(e),
                    Ok(column_decryptor) => {
                        let aad = create_module_aad(
                            decryptor.file_aad(),
                            ModuleType::ColumnMetaData,
                            row_group_ordinal as usize,
                            column_ordinal,
                            None,
                        )?;
                        let plaintext =
                            column_decryptor.decrypt(ciphertext, &aad).map_err(|_| {
                                ParquetError::DecryptFailed(format!(
                                    "unable to decrypt metadata of column '{path}', \
                                     perhaps the column key is wrong"
                                ))
                            })?;
                        let mut prot = crate::thrift::ThriftSliceInputProtocol::new(&plaintext);
                        decrypted_metadata = Some(
                            <format::ColumnMetaData as crate::thrift::ReadThrift>::read_thrift(
                                &mut prot,
                            )?,
                        );
                    }
                }
            }
        }

        Ok(Self {
            column,
            descr,
            column_order: parent.column_order(column_ordinal),
            writer_version: &parent.writer_version,
            decrypted_metadata,
        })
    }

    /// Whether the column metadata is readable (present, and decrypted when
    /// it was encrypted with a column key).
    pub fn is_metadata_set(&self) -> bool {
        if self.is_encrypted_with_column_key() {
            self.decrypted_metadata.is_some()
        } else {
            self.column.meta_data.is_some()
        }
    }

    fn is_encrypted_with_column_key(&self) -> bool {
        matches!(
            self.column.crypto_metadata,
            Some(format::ColumnCryptoMetaData::ENCRYPTION_WITH_COLUMN_KEY(_))
        )
    }

    // All metadata fields route through here so that the missing-key state
    // surfaces uniformly.
    fn meta_data(&self) -> Result<&format::ColumnMetaData> {
        if self.is_encrypted_with_column_key() {
            return self
                .decrypted_metadata
                .as_ref()
                .ok_or_else(|| ParquetError::MissingColumnKey(self.descr.path().string()));
        }
        self.column
            .meta_data
            .as_ref()
            .ok_or_else(|| general_err!("Expected to have column metadata"))
    }

    /// File where the column chunk is stored, when different from the file
    /// holding the metadata.
    pub fn file_path(&self) -> Option<&str> {
        self.column.file_path.as_deref()
    }

    /// Byte offset recorded in the `file_offset` field of the chunk.
    pub fn file_offset(&self) -> i64 {
        self.column.file_offset
    }

    /// Descriptor of this column.
    pub fn column_descr(&self) -> &ColumnDescPtr {
        &self.descr
    }

    /// Path of this column in the schema.
    pub fn column_path(&self) -> &ColumnPath {
        self.descr.path()
    }

    /// Crypto metadata of this column, when encrypted.
    pub fn crypto_metadata(&self) -> Option<&format::ColumnCryptoMetaData> {
        self.column.crypto_metadata.as_ref()
    }

    /// Physical type of this column.
    pub fn column_type(&self) -> Result<Type> {
        Ok(self.meta_data()?.type_)
    }

    /// Total number of values in this column chunk.
    pub fn num_values(&self) -> Result<i64> {
        Ok(self.meta_data()?.num_values)
    }

    /// Compression codec of this column chunk.
    pub fn compression(&self) -> Result<Compression> {
        Ok(self.meta_data()?.codec)
    }

    /// All encodings used in this column chunk.
    pub fn encodings(&self) -> Result<&[Encoding]> {
        Ok(&self.meta_data()?.encodings)
    }

    /// Byte offset of the first data page.
    pub fn data_page_offset(&self) -> Result<i64> {
        Ok(self.meta_data()?.data_page_offset)
    }

    /// Whether this chunk starts with a dictionary page.
    pub fn has_dictionary_page(&self) -> Result<bool> {
        Ok(self.meta_data()?.dictionary_page_offset.is_some())
    }

    /// Byte offset of the dictionary page, when present.
    pub fn dictionary_page_offset(&self) -> Result<Option<i64>> {
        Ok(self.meta_data()?.dictionary_page_offset)
    }

    /// Byte offset of the index page, when present.
    pub fn index_page_offset(&self) -> Result<Option<i64>> {
        Ok(self.meta_data()?.index_page_offset)
    }

    /// Total compressed (and potentially encrypted) size of all pages
    /// including headers.
    pub fn total_compressed_size(&self) -> Result<i64> {
        Ok(self.meta_data()?.total_compressed_size)
    }

    /// Total uncompressed size of all pages including headers.
    pub fn total_uncompressed_size(&self) -> Result<i64> {
        Ok(self.meta_data()?.total_uncompressed_size)
    }

    /// Byte range `(offset, length)` of this chunk's pages within the file.
    pub fn byte_range(&self) -> Result<(u64, u64)> {
        let meta = self.meta_data()?;
        let start = match meta.dictionary_page_offset {
            Some(dict_offset) => dict_offset,
            None => meta.data_page_offset,
        };
        Ok((start as u64, meta.total_compressed_size as u64))
    }

    /// Whether valid statistics are present for this column chunk.
    ///
    /// Statistics must be recorded, the sort order must be known, and the
    /// producer must be one whose statistics are trustworthy for this column
    /// (see [`ApplicationVersion::has_correct_statistics`]).
    pub fn is_stats_set(&self) -> Result<bool> {
        let meta = self.meta_data()?;
        if meta.statistics.is_none() || self.descr.sort_order() == SortOrder::UNKNOWN {
            return Ok(false);
        }
        let stats = statistics_from_thrift(
            meta.type_,
            meta.statistics.as_ref(),
            self.column_order,
        )?;
        let encoded = match stats {
            Some(stats) => {
                let mut encoded = EncodedStatistics::default();
                encoded.min = stats.min_bytes_opt();
                encoded.max = stats.max_bytes_opt();
                encoded.null_count = Some(stats.null_count());
                encoded
            }
            None => return Ok(false),
        };
        Ok(self.writer_version.has_correct_statistics(
            meta.type_,
            &encoded,
            self.descr.sort_order(),
        ))
    }

    /// Statistics for this column chunk, or `None` when absent or judged
    /// untrustworthy. Untrustworthy statistics are suppressed, not an error.
    pub fn statistics(&self) -> Result<Option<Statistics>> {
        if !self.is_stats_set()? {
            return Ok(None);
        }
        let meta = self.meta_data()?;
        statistics_from_thrift(meta.type_, meta.statistics.as_ref(), self.column_order)
    }
}

// ----------------------------------------------------------------------
// Builders

/// Per-column inputs for [`ColumnChunkMetaDataBuilder::finish`].
pub(crate) struct ColumnChunkFinishArgs<'a> {
    pub num_values: i64,
    pub dictionary_page_offset: Option<i64>,
    pub index_page_offset: Option<i64>,
    pub data_page_offset: i64,
    pub compressed_size: i64,
    pub uncompressed_size: i64,
    pub has_dictionary: bool,
    pub dictionary_fallback: bool,
    /// Encryptor and column-metadata AAD, when the column metadata must be
    /// encrypted.
    pub meta_encryptor: Option<(&'a Encryptor, Vec<u8>)>,
}

/// Assembles the thrift `ColumnChunk` for one column on the write path.
#[derive(Debug)]
pub(crate) struct ColumnChunkMetaDataBuilder {
    column_chunk: format::ColumnChunk,
    // kept outside the chunk so sizes stay queryable after the plaintext
    // metadata was erased for encryption
    meta: format::ColumnMetaData,
    descr: ColumnDescPtr,
    props: WriterPropertiesPtr,
    finished: bool,
}

impl ColumnChunkMetaDataBuilder {
    pub(crate) fn new(props: WriterPropertiesPtr, descr: ColumnDescPtr) -> Self {
        let meta = format::ColumnMetaData {
            type_: descr.physical_type(),
            encodings: Vec::new(),
            path_in_schema: descr.path().parts().to_vec(),
            codec: props.compression(descr.path()),
            num_values: 0,
            total_uncompressed_size: 0,
            total_compressed_size: 0,
            data_page_offset: 0,
            index_page_offset: None,
            dictionary_page_offset: None,
            statistics: None,
            encoding_stats: None,
            bloom_filter_offset: None,
        };
        Self {
            column_chunk: format::ColumnChunk::default(),
            meta,
            descr,
            props,
            finished: false,
        }
    }

    /// Descriptor of the column being built.
    pub(crate) fn descr(&self) -> &ColumnDescPtr {
        &self.descr
    }

    /// Sets the file path of this column chunk.
    #[allow(dead_code)]
    pub(crate) fn set_file_path(&mut self, path: String) {
        self.column_chunk.file_path = Some(path);
    }

    /// Attaches chunk statistics. Must be called before [`Self::finish`].
    pub(crate) fn set_statistics(&mut self, statistics: &EncodedStatistics) {
        self.meta.statistics = statistics.to_thrift();
    }

    /// Total compressed size, readable even after the plaintext metadata was
    /// erased for encryption.
    pub(crate) fn total_compressed_size(&self) -> i64 {
        self.meta.total_compressed_size
    }

    /// Whether [`Self::finish`] has run.
    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    /// Finalizes the column chunk: offsets, sizes, the deterministic
    /// encodings list, crypto metadata, and (when required) the encrypted
    /// column metadata with plaintext erasure or redaction.
    pub(crate) fn finish(&mut self, args: ColumnChunkFinishArgs<'_>) -> Result<()> {
        if self.finished {
            return Err(ParquetError::BuilderMisuse(format!(
                "column '{}' was already finished",
                self.descr.path()
            )));
        }

        match args.dictionary_page_offset {
            Some(dictionary_page_offset) => {
                self.meta.dictionary_page_offset = Some(dictionary_page_offset);
                self.column_chunk.file_offset = dictionary_page_offset + args.compressed_size;
            }
            None => {
                self.column_chunk.file_offset = args.data_page_offset + args.compressed_size;
            }
        }
        self.meta.num_values = args.num_values;
        self.meta.index_page_offset = args.index_page_offset;
        self.meta.data_page_offset = args.data_page_offset;
        self.meta.total_uncompressed_size = args.uncompressed_size;
        self.meta.total_compressed_size = args.compressed_size;

        // The encodings list is fully determined by the dictionary state,
        // the fallback flag, the writer version and the column encoding.
        let mut encodings = Vec::new();
        if args.has_dictionary {
            encodings.push(self.props.dictionary_index_encoding());
            if self.props.writer_version() == WriterVersion::PARQUET_1_0 {
                encodings.push(Encoding::PLAIN);
            } else {
                encodings.push(self.props.dictionary_page_encoding());
            }
        } else {
            encodings.push(self.props.encoding(self.descr.path()));
        }
        encodings.push(Encoding::RLE);
        // only PLAIN is supported for dictionary fallback
        if args.dictionary_fallback {
            encodings.push(Encoding::PLAIN);
        }
        self.meta.encodings = encodings;

        let encryption_setup = self
            .props
            .file_encryption_properties()
            .map(|p| (p.encrypt_footer(), p.column_setup(&self.descr.path().string())));

        match encryption_setup {
            Some((encrypted_footer, setup)) if setup.is_encrypted() => {
                self.column_chunk.crypto_metadata = Some(match &setup {
                    ColumnEncryptionSetup::FooterKey => {
                        format::ColumnCryptoMetaData::ENCRYPTION_WITH_FOOTER_KEY
                    }
                    ColumnEncryptionSetup::ColumnKey(column_props) => {
                        format::ColumnCryptoMetaData::ENCRYPTION_WITH_COLUMN_KEY(
                            format::EncryptionWithColumnKey {
                                path_in_schema: self.descr.path().parts().to_vec(),
                                key_metadata: column_props.key_metadata().map(|m| m.to_vec()),
                            },
                        )
                    }
                    ColumnEncryptionSetup::Plaintext => unreachable!(),
                });

                // Column metadata must be encrypted whenever the plaintext
                // footer would otherwise expose it, or the column uses its
                // own key.
                let encrypt_metadata =
                    !encrypted_footer || !setup.is_encrypted_with_footer_key();
                if encrypt_metadata {
                    let (encryptor, aad) = args.meta_encryptor.as_ref().ok_or_else(|| {
                        general_err!(
                            "column '{}' requires a metadata encryptor",
                            self.descr.path()
                        )
                    })?;
                    let plaintext = serialize_thrift_object(&self.meta)?;
                    let ciphertext = encryptor.encrypt(&plaintext, aad)?;
                    self.column_chunk.encrypted_column_metadata = Some(ciphertext);

                    if encrypted_footer {
                        self.column_chunk.meta_data = None;
                    } else {
                        // keep a redacted copy for old readers
                        let mut redacted = self.meta.clone();
                        redacted.statistics = None;
                        redacted.encoding_stats = None;
                        self.column_chunk.meta_data = Some(redacted);
                    }
                } else {
                    self.column_chunk.meta_data = Some(self.meta.clone());
                }
            }
            _ => {
                self.column_chunk.meta_data = Some(self.meta.clone());
            }
        }

        self.finished = true;
        Ok(())
    }

    /// The finished thrift structure.
    pub(crate) fn column_chunk(&self) -> &format::ColumnChunk {
        &self.column_chunk
    }

    fn take_column_chunk(&mut self) -> format::ColumnChunk {
        std::mem::take(&mut self.column_chunk)
    }
}

/// Assembles the thrift `RowGroup` on the write path.
///
/// Column chunk builders are handed out in schema order through
/// [`Self::take_next_column`]; the page writer owns the builder for the
/// duration of the chunk and gives it back through [`Self::return_column`]
/// once finished.
pub(crate) struct RowGroupMetaDataBuilder {
    schema_descr: SchemaDescPtr,
    props: WriterPropertiesPtr,
    column_builders: Vec<ColumnChunkMetaDataBuilder>,
    columns_taken: usize,
    num_rows: i64,
}

impl RowGroupMetaDataBuilder {
    pub(crate) fn new(props: WriterPropertiesPtr, schema_descr: SchemaDescPtr) -> Self {
        Self {
            schema_descr,
            props,
            column_builders: Vec::new(),
            columns_taken: 0,
            num_rows: 0,
        }
    }

    /// Index of the next column to be taken.
    pub(crate) fn current_column(&self) -> usize {
        self.columns_taken
    }

    /// Whether all taken column builders have been returned.
    pub(crate) fn all_columns_returned(&self) -> bool {
        self.column_builders.len() == self.columns_taken
    }

    /// Creates the builder for the next column in schema order.
    pub(crate) fn take_next_column(&mut self) -> Result<ColumnChunkMetaDataBuilder> {
        if self.columns_taken >= self.schema_descr.num_columns() {
            return Err(ParquetError::BuilderMisuse(format!(
                "the schema only has {} columns, requested metadata builder for column {}",
                self.schema_descr.num_columns(),
                self.columns_taken
            )));
        }
        if !self.all_columns_returned() {
            return Err(ParquetError::BuilderMisuse(
                "previous column writer was not closed".to_owned(),
            ));
        }
        let descr = self.schema_descr.column(self.columns_taken);
        self.columns_taken += 1;
        Ok(ColumnChunkMetaDataBuilder::new(self.props.clone(), descr))
    }

    /// Returns a finished column builder.
    pub(crate) fn return_column(&mut self, builder: ColumnChunkMetaDataBuilder) {
        self.column_builders.push(builder);
    }

    /// Sets the number of rows in this row group.
    pub(crate) fn set_num_rows(&mut self, num_rows: i64) {
        self.num_rows = num_rows;
    }

    /// Validates that every column was finished, then assembles the thrift
    /// row group. `total_byte_size` records the writer's byte tally (page
    /// headers and encryption overhead included); `total_compressed_size` is
    /// accumulated from the column builders, since the per-chunk metadata may
    /// have been erased for encryption.
    pub(crate) fn finish(
        &mut self,
        total_bytes_written: i64,
        row_group_ordinal: i16,
    ) -> Result<format::RowGroup> {
        if self.columns_taken != self.schema_descr.num_columns()
            || !self.all_columns_returned()
        {
            return Err(ParquetError::BuilderMisuse(format!(
                "only {} out of {} columns are initialized",
                self.column_builders.len(),
                self.schema_descr.num_columns()
            )));
        }

        let mut total_compressed_size = 0i64;
        for (i, builder) in self.column_builders.iter().enumerate() {
            if !builder.is_finished() {
                return Err(ParquetError::BuilderMisuse(format!(
                    "column {i} is not complete"
                )));
            }
            total_compressed_size += builder.total_compressed_size();
        }
        let file_offset = self
            .column_builders
            .first()
            .map(|b| b.column_chunk().file_offset)
            .unwrap_or(0);

        let columns = self
            .column_builders
            .iter_mut()
            .map(|b| b.take_column_chunk())
            .collect();

        Ok(format::RowGroup {
            columns,
            total_byte_size: total_bytes_written,
            num_rows: self.num_rows,
            file_offset: Some(file_offset),
            total_compressed_size: Some(total_compressed_size),
            ordinal: Some(row_group_ordinal),
        })
    }
}

/// Assembles the thrift `FileMetaData` (and, for encrypted-footer files, the
/// `FileCryptoMetaData`) at the end of a write.
pub(crate) struct FileMetaDataBuilder {
    schema_descr: SchemaDescPtr,
    props: WriterPropertiesPtr,
    row_groups: Vec<format::RowGroup>,
}

impl FileMetaDataBuilder {
    pub(crate) fn new(props: WriterPropertiesPtr, schema_descr: SchemaDescPtr) -> Self {
        Self {
            schema_descr,
            props,
            row_groups: Vec::new(),
        }
    }

    /// Appends a finished row group.
    pub(crate) fn add_row_group(&mut self, row_group: format::RowGroup) {
        self.row_groups.push(row_group);
    }

    /// Assembles the file metadata: accumulated rows, key/value metadata,
    /// the format version, default type-defined column orders, the flattened
    /// schema, and (for plaintext-footer encrypted files) the GCM signing
    /// algorithm.
    pub(crate) fn finish(&mut self) -> Result<format::FileMetaData> {
        let num_rows = self.row_groups.iter().map(|rg| rg.num_rows).sum();

        // Always default to TYPE_DEFINED_ORDER: there are no user defined
        // sort orders in the format.
        let column_orders = vec![
            ColumnOrder::TYPE_DEFINED_ORDER(SortOrder::SIGNED);
            self.schema_descr.num_columns()
        ];

        let mut metadata = format::FileMetaData {
            version: self.props.writer_version().as_num(),
            schema: schema_to_thrift(self.schema_descr.root_schema())?,
            num_rows,
            row_groups: std::mem::take(&mut self.row_groups),
            key_value_metadata: self.props.key_value_metadata().cloned(),
            created_by: Some(self.props.created_by().to_owned()),
            column_orders: Some(column_orders),
            encryption_algorithm: None,
            footer_signing_key_metadata: None,
        };

        // only plaintext-footer encrypted files record the signing algorithm
        // in the footer itself
        if let Some(encryption_props) = self.props.file_encryption_properties() {
            if !encryption_props.encrypt_footer() {
                metadata.encryption_algorithm = Some(encryption_props.signing_algorithm());
                metadata.footer_signing_key_metadata =
                    encryption_props.footer_key_metadata().map(|m| m.to_vec());
            }
        }

        Ok(metadata)
    }

    /// The crypto metadata written before the encrypted footer, or `None`
    /// when the footer is not encrypted.
    pub(crate) fn crypto_metadata(&self) -> Option<format::FileCryptoMetaData> {
        let encryption_props = self.props.file_encryption_properties()?;
        if !encryption_props.encrypt_footer() {
            return None;
        }
        Some(format::FileCryptoMetaData {
            encryption_algorithm: encryption_props.algorithm(),
            key_metadata: encryption_props.footer_key_metadata().map(|m| m.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::properties::WriterProperties;
    use crate::schema::types::Type as SchemaType;

    fn test_schema_descr() -> SchemaDescPtr {
        let a = Arc::new(
            SchemaType::primitive_type_builder("a", Type::INT32)
                .with_repetition(crate::basic::Repetition::REQUIRED)
                .build()
                .unwrap(),
        );
        let b = Arc::new(
            SchemaType::primitive_type_builder("b", Type::INT32)
                .with_repetition(crate::basic::Repetition::REQUIRED)
                .build()
                .unwrap(),
        );
        let root = Arc::new(
            SchemaType::group_type_builder("schema")
                .with_fields(vec![a, b])
                .build()
                .unwrap(),
        );
        Arc::new(SchemaDescriptor::new(root))
    }

    #[test]
    fn test_application_version_parse() {
        let v = ApplicationVersion::parse(
            "parquet-mr version 1.8.0 (build 0fda28af84b9746396014ad6a415b90592a98b3b)",
        );
        assert_eq!(v.application, "parquet-mr");
        assert_eq!((v.version.major, v.version.minor, v.version.patch), (1, 8, 0));
        assert_eq!(v.build, "0fda28af84b9746396014ad6a415b90592a98b3b");

        let v = ApplicationVersion::parse("impala version 1.0 (build abc)");
        assert_eq!(v.application, "impala");
        // "1.0" does not match the three-part version format
        assert_eq!((v.version.major, v.version.minor, v.version.patch), (0, 0, 0));

        let v = ApplicationVersion::parse("parquet-cpp version 1.5.0ab-cdh5.5.0+cd");
        assert_eq!(v.application, "parquet-cpp");
        assert_eq!((v.version.major, v.version.minor, v.version.patch), (1, 5, 0));
        assert_eq!(v.version.unknown, "ab");
        assert_eq!(v.version.pre_release, "cdh5.5.0");
        assert_eq!(v.version.build_info, "cd");

        let v = ApplicationVersion::parse("unknown");
        assert_eq!(v.application, "unknown");

        let v = ApplicationVersion::parse("");
        assert_eq!(v.application, "");
    }

    #[test]
    fn test_version_lt() {
        let a = ApplicationVersion::new("parquet-mr", 1, 9, 9);
        let b = ApplicationVersion::new("parquet-mr", 1, 10, 0);
        assert!(a.version_lt(&b));
        assert!(!b.version_lt(&a));
        let c = ApplicationVersion::new("parquet-cpp", 1, 9, 9);
        // versions of different applications never compare
        assert!(!c.version_lt(&b));
        assert!(b.version_eq(&ApplicationVersion::new("parquet-mr", 1, 10, 0)));
    }

    fn encoded_stats(min: &[u8], max: &[u8]) -> EncodedStatistics {
        let mut stats = EncodedStatistics::default();
        stats.min = Some(min.to_vec());
        stats.max = Some(max.to_vec());
        stats.null_count = Some(0);
        stats
    }

    #[test]
    fn test_has_correct_statistics() {
        let stats = encoded_stats(b"a", b"z");

        // old parquet-mr, unsigned byte array, min != max: untrusted
        let v = ApplicationVersion::parse("parquet-mr version 1.9.0");
        assert!(!v.has_correct_statistics(Type::BYTE_ARRAY, &stats, SortOrder::UNSIGNED));
        // same but min == max: sort order is irrelevant
        let same = encoded_stats(b"a", b"a");
        assert!(v.has_correct_statistics(Type::BYTE_ARRAY, &same, SortOrder::UNSIGNED));
        // non-byte-array types are always fine for old writers
        assert!(v.has_correct_statistics(Type::INT32, &stats, SortOrder::SIGNED));

        // fixed parquet-mr: trusted for any known sort order
        let v = ApplicationVersion::parse("parquet-mr version 1.10.0");
        assert!(v.has_correct_statistics(Type::BYTE_ARRAY, &stats, SortOrder::UNSIGNED));
        assert!(v.has_correct_statistics(Type::INT32, &stats, SortOrder::SIGNED));
        assert!(!v.has_correct_statistics(Type::INT32, &stats, SortOrder::UNKNOWN));

        // unknown producer: trusted (PARQUET-297)
        let v = ApplicationVersion::parse("unknown");
        assert!(v.has_correct_statistics(Type::BYTE_ARRAY, &stats, SortOrder::UNSIGNED));

        // pre-PARQUET-251 parquet-mr: untrusted
        let v = ApplicationVersion::parse("parquet-mr version 1.6.0");
        assert!(!v.has_correct_statistics(Type::INT32, &stats, SortOrder::UNSIGNED));

        // old parquet-cpp byte arrays under signed order fall through to the
        // 251 check, which passes for parquet-cpp
        let v = ApplicationVersion::parse("parquet-cpp version 1.2.0");
        assert!(v.has_correct_statistics(Type::BYTE_ARRAY, &stats, SortOrder::SIGNED));
    }

    #[test]
    fn test_encodings_list_determinism() {
        let props = Arc::new(WriterProperties::builder().build());
        let descr = test_schema_descr().column(0);

        let finish = |has_dictionary: bool, fallback: bool| {
            let mut builder = ColumnChunkMetaDataBuilder::new(props.clone(), descr.clone());
            builder
                .finish(ColumnChunkFinishArgs {
                    num_values: 10,
                    dictionary_page_offset: has_dictionary.then_some(4),
                    index_page_offset: None,
                    data_page_offset: 100,
                    compressed_size: 200,
                    uncompressed_size: 300,
                    has_dictionary,
                    dictionary_fallback: fallback,
                    meta_encryptor: None,
                })
                .unwrap();
            builder.column_chunk().meta_data.as_ref().unwrap().encodings.clone()
        };

        assert_eq!(
            finish(true, false),
            vec![Encoding::PLAIN_DICTIONARY, Encoding::PLAIN, Encoding::RLE]
        );
        assert_eq!(
            finish(true, true),
            vec![
                Encoding::PLAIN_DICTIONARY,
                Encoding::PLAIN,
                Encoding::RLE,
                Encoding::PLAIN
            ]
        );
        assert_eq!(finish(false, false), vec![Encoding::PLAIN, Encoding::RLE]);
    }

    #[test]
    fn test_file_offset_from_finish() {
        let props = Arc::new(WriterProperties::builder().build());
        let descr = test_schema_descr().column(0);
        let mut builder = ColumnChunkMetaDataBuilder::new(props, descr);
        builder
            .finish(ColumnChunkFinishArgs {
                num_values: 5,
                dictionary_page_offset: Some(4),
                index_page_offset: None,
                data_page_offset: 40,
                compressed_size: 100,
                uncompressed_size: 120,
                has_dictionary: true,
                dictionary_fallback: false,
                meta_encryptor: None,
            })
            .unwrap();
        let chunk = builder.column_chunk();
        assert_eq!(chunk.file_offset, 104);
        let meta = chunk.meta_data.as_ref().unwrap();
        assert_eq!(meta.dictionary_page_offset, Some(4));
        assert_eq!(meta.data_page_offset, 40);
    }

    #[test]
    fn test_row_group_builder_validates_columns() {
        let props = Arc::new(WriterProperties::builder().build());
        let schema = test_schema_descr();
        let mut builder = RowGroupMetaDataBuilder::new(props, schema);
        let col = builder.take_next_column().unwrap();
        builder.return_column(col);
        // only one of two columns initialized
        let err = builder.finish(1000, 0).unwrap_err();
        assert!(matches!(err, ParquetError::BuilderMisuse(_)));
    }

    #[test]
    fn test_row_group_builder_rejects_unclosed_column() {
        let props = Arc::new(WriterProperties::builder().build());
        let schema = test_schema_descr();
        let mut builder = RowGroupMetaDataBuilder::new(props, schema);
        let _col = builder.take_next_column().unwrap();
        // the first column builder was never returned
        let err = builder.take_next_column().unwrap_err();
        assert!(matches!(err, ParquetError::BuilderMisuse(_)));
    }

    #[test]
    fn test_row_group_builder_requires_finished_columns() {
        let props = Arc::new(WriterProperties::builder().build());
        let schema = test_schema_descr();
        let mut builder = RowGroupMetaDataBuilder::new(props, schema);
        for _ in 0..2 {
            let col = builder.take_next_column().unwrap();
            builder.return_column(col);
        }
        // columns were returned but never finished
        let err = builder.finish(1000, 0).unwrap_err();
        assert!(matches!(err, ParquetError::BuilderMisuse(_)));
    }

    #[test]
    fn test_file_metadata_builder() {
        let props = Arc::new(WriterProperties::builder().build());
        let schema = test_schema_descr();
        let mut builder = FileMetaDataBuilder::new(props.clone(), schema.clone());
        builder.add_row_group(format::RowGroup {
            columns: vec![],
            total_byte_size: 10,
            num_rows: 3,
            ..Default::default()
        });
        builder.add_row_group(format::RowGroup {
            columns: vec![],
            total_byte_size: 10,
            num_rows: 4,
            ..Default::default()
        });
        let metadata = builder.finish().unwrap();
        assert_eq!(metadata.num_rows, 7);
        assert_eq!(metadata.version, 1);
        assert_eq!(metadata.column_orders.as_ref().unwrap().len(), 2);
        assert!(metadata.encryption_algorithm.is_none());
        assert!(builder.crypto_metadata().is_none());
    }
}
