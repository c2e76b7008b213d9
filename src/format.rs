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

//! Owned Rust mirrors of the thrift structures from the Parquet IDL, with
//! hand-written compact-protocol codecs.
//!
//! Unknown fields are skipped on read so that files written by newer
//! implementations still parse. Only the structures the core needs are
//! materialized; everything else (page indexes, bloom filter headers,
//! DataPageHeaderV2 payloads) is skipped.

use std::io::Write;

use crate::basic::{ColumnOrder, Compression, ConvertedType, Encoding, PageType, Repetition, Type};
use crate::errors::{ParquetError, Result};
use crate::thrift::{
    read_thrift_vec, FieldType, ReadThrift, ThriftCompactOutputProtocol,
    ThriftSliceInputProtocol, WriteThrift, WriteThriftField, ELEM_STRUCT,
};

fn missing(strct: &str, field: &str) -> ParquetError {
    ParquetError::DeserializeFailed(format!("required field {strct}.{field} is missing"))
}

/// Wrapper for a key/value pair in the file metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: Option<String>,
}

impl KeyValue {
    /// Creates a new key/value pair.
    pub fn new(key: String, value: impl Into<Option<String>>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

impl ReadThrift for KeyValue {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut key: Option<String> = None;
        let mut value: Option<String> = None;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => key = Some(prot.read_string()?),
                2 => value = Some(prot.read_string()?),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        Ok(Self {
            key: key.ok_or_else(|| missing("KeyValue", "key"))?,
            value,
        })
    }
}

impl WriteThrift for KeyValue {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let last_field_id = self.key.write_thrift_field(writer, 1, 0)?;
        if let Some(value) = self.value.as_ref() {
            value.write_thrift_field(writer, 2, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

impl WriteThriftField for KeyValue {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

/// One element of the flattened schema tree.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SchemaElement {
    /// Data type for this field. Not set for non-leaf nodes.
    pub type_: Option<Type>,
    /// Byte length of FIXED_LEN_BYTE_ARRAY values.
    pub type_length: Option<i32>,
    /// Repetition of the field. The root of the schema has none.
    pub repetition_type: Option<Repetition>,
    /// Name of the field.
    pub name: String,
    /// Number of nested fields; unset for leaves.
    pub num_children: Option<i32>,
    pub converted_type: Option<ConvertedType>,
    pub scale: Option<i32>,
    pub precision: Option<i32>,
    /// Original field id when the source schema supports them.
    pub field_id: Option<i32>,
}

impl ReadThrift for SchemaElement {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut elem = SchemaElement::default();
        let mut has_name = false;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => elem.type_ = Some(Type::read_thrift(prot)?),
                2 => elem.type_length = Some(prot.read_i32()?),
                3 => elem.repetition_type = Some(Repetition::read_thrift(prot)?),
                4 => {
                    elem.name = prot.read_string()?;
                    has_name = true;
                }
                5 => elem.num_children = Some(prot.read_i32()?),
                6 => elem.converted_type = Some(ConvertedType::read_thrift(prot)?),
                7 => elem.scale = Some(prot.read_i32()?),
                8 => elem.precision = Some(prot.read_i32()?),
                9 => elem.field_id = Some(prot.read_i32()?),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        if !has_name {
            return Err(missing("SchemaElement", "name"));
        }
        Ok(elem)
    }
}

impl WriteThrift for SchemaElement {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = 0i16;
        if let Some(t) = self.type_ {
            last_field_id = t.write_thrift_field(writer, 1, last_field_id)?;
        }
        if let Some(len) = self.type_length {
            last_field_id = len.write_thrift_field(writer, 2, last_field_id)?;
        }
        if let Some(rep) = self.repetition_type {
            last_field_id = rep.write_thrift_field(writer, 3, last_field_id)?;
        }
        last_field_id = self.name.write_thrift_field(writer, 4, last_field_id)?;
        if let Some(n) = self.num_children {
            last_field_id = n.write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(ct) = self.converted_type {
            if let Some(v) = ct.as_i32() {
                last_field_id = v.write_thrift_field(writer, 6, last_field_id)?;
            }
        }
        if let Some(scale) = self.scale {
            last_field_id = scale.write_thrift_field(writer, 7, last_field_id)?;
        }
        if let Some(precision) = self.precision {
            last_field_id = precision.write_thrift_field(writer, 8, last_field_id)?;
        }
        if let Some(id) = self.field_id {
            id.write_thrift_field(writer, 9, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

/// Statistics per row group and per page.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Statistics {
    /// DEPRECATED max value, determined by signed comparison.
    pub max: Option<Vec<u8>>,
    /// DEPRECATED min value, determined by signed comparison.
    pub min: Option<Vec<u8>>,
    /// Count of null values.
    pub null_count: Option<i64>,
    /// Count of distinct values.
    pub distinct_count: Option<i64>,
    /// Max value determined by the column's sort order.
    pub max_value: Option<Vec<u8>>,
    /// Min value determined by the column's sort order.
    pub min_value: Option<Vec<u8>>,
}

impl ReadThrift for Statistics {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut stats = Statistics::default();
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => stats.max = Some(prot.read_bytes()?.to_vec()),
                2 => stats.min = Some(prot.read_bytes()?.to_vec()),
                3 => stats.null_count = Some(prot.read_i64()?),
                4 => stats.distinct_count = Some(prot.read_i64()?),
                5 => stats.max_value = Some(prot.read_bytes()?.to_vec()),
                6 => stats.min_value = Some(prot.read_bytes()?.to_vec()),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        Ok(stats)
    }
}

impl WriteThrift for Statistics {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = 0i16;
        if let Some(v) = self.max.as_deref() {
            last_field_id = v.write_thrift_field(writer, 1, last_field_id)?;
        }
        if let Some(v) = self.min.as_deref() {
            last_field_id = v.write_thrift_field(writer, 2, last_field_id)?;
        }
        if let Some(v) = self.null_count {
            last_field_id = v.write_thrift_field(writer, 3, last_field_id)?;
        }
        if let Some(v) = self.distinct_count {
            last_field_id = v.write_thrift_field(writer, 4, last_field_id)?;
        }
        if let Some(v) = self.max_value.as_deref() {
            last_field_id = v.write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(v) = self.min_value.as_deref() {
            v.write_thrift_field(writer, 6, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

impl WriteThriftField for Statistics {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

/// Statistics of a given page type and encoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageEncodingStats {
    /// The page type (data/dic/...).
    pub page_type: PageType,
    /// Encoding of the page.
    pub encoding: Encoding,
    /// Number of pages of this type with this encoding.
    pub count: i32,
}

impl ReadThrift for PageEncodingStats {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut page_type: Option<PageType> = None;
        let mut encoding: Option<Encoding> = None;
        let mut count: Option<i32> = None;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => page_type = Some(PageType::read_thrift(prot)?),
                2 => encoding = Some(Encoding::read_thrift(prot)?),
                3 => count = Some(prot.read_i32()?),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        Ok(Self {
            page_type: page_type.ok_or_else(|| missing("PageEncodingStats", "page_type"))?,
            encoding: encoding.ok_or_else(|| missing("PageEncodingStats", "encoding"))?,
            count: count.ok_or_else(|| missing("PageEncodingStats", "count"))?,
        })
    }
}

impl WriteThrift for PageEncodingStats {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.page_type.write_thrift_field(writer, 1, 0)?;
        last_field_id = self.encoding.write_thrift_field(writer, 2, last_field_id)?;
        self.count.write_thrift_field(writer, 3, last_field_id)?;
        writer.write_struct_end()
    }
}

/// Description for column metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnMetaData {
    /// Type of this column.
    pub type_: Type,
    /// Set of all encodings used for this column.
    pub encodings: Vec<Encoding>,
    /// Path in schema.
    pub path_in_schema: Vec<String>,
    /// Compression codec.
    pub codec: Compression,
    /// Number of values in this column.
    pub num_values: i64,
    /// Total byte size of all uncompressed pages in this column chunk,
    /// including the headers.
    pub total_uncompressed_size: i64,
    /// Total byte size of all compressed, and potentially encrypted, pages in
    /// this column chunk, including the headers.
    pub total_compressed_size: i64,
    /// Byte offset from beginning of file to first data page.
    pub data_page_offset: i64,
    /// Byte offset from beginning of file to root index page.
    pub index_page_offset: Option<i64>,
    /// Byte offset from the beginning of file to first (only) dictionary page.
    pub dictionary_page_offset: Option<i64>,
    /// optional statistics for this column chunk.
    pub statistics: Option<Statistics>,
    /// Set of all encodings used for pages in this column chunk.
    pub encoding_stats: Option<Vec<PageEncodingStats>>,
    /// Byte offset from beginning of file to Bloom filter data.
    pub bloom_filter_offset: Option<i64>,
}

impl ReadThrift for ColumnMetaData {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut type_: Option<Type> = None;
        let mut encodings: Option<Vec<Encoding>> = None;
        let mut path_in_schema: Option<Vec<String>> = None;
        let mut codec: Option<Compression> = None;
        let mut num_values: Option<i64> = None;
        let mut total_uncompressed_size: Option<i64> = None;
        let mut total_compressed_size: Option<i64> = None;
        let mut data_page_offset: Option<i64> = None;
        let mut index_page_offset: Option<i64> = None;
        let mut dictionary_page_offset: Option<i64> = None;
        let mut statistics: Option<Statistics> = None;
        let mut encoding_stats: Option<Vec<PageEncodingStats>> = None;
        let mut bloom_filter_offset: Option<i64> = None;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => type_ = Some(Type::read_thrift(prot)?),
                2 => encodings = Some(read_thrift_vec::<Encoding>(prot)?),
                3 => path_in_schema = Some(read_thrift_vec::<String>(prot)?),
                4 => codec = Some(Compression::read_thrift(prot)?),
                5 => num_values = Some(prot.read_i64()?),
                6 => total_uncompressed_size = Some(prot.read_i64()?),
                7 => total_compressed_size = Some(prot.read_i64()?),
                // 8: key_value_metadata is not exposed
                9 => data_page_offset = Some(prot.read_i64()?),
                10 => index_page_offset = Some(prot.read_i64()?),
                11 => dictionary_page_offset = Some(prot.read_i64()?),
                12 => statistics = Some(Statistics::read_thrift(prot)?),
                13 => encoding_stats = Some(read_thrift_vec::<PageEncodingStats>(prot)?),
                14 => bloom_filter_offset = Some(prot.read_i64()?),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        Ok(Self {
            type_: type_.ok_or_else(|| missing("ColumnMetaData", "type"))?,
            encodings: encodings.ok_or_else(|| missing("ColumnMetaData", "encodings"))?,
            path_in_schema: path_in_schema
                .ok_or_else(|| missing("ColumnMetaData", "path_in_schema"))?,
            codec: codec.ok_or_else(|| missing("ColumnMetaData", "codec"))?,
            num_values: num_values.ok_or_else(|| missing("ColumnMetaData", "num_values"))?,
            total_uncompressed_size: total_uncompressed_size
                .ok_or_else(|| missing("ColumnMetaData", "total_uncompressed_size"))?,
            total_compressed_size: total_compressed_size
                .ok_or_else(|| missing("ColumnMetaData", "total_compressed_size"))?,
            data_page_offset: data_page_offset
                .ok_or_else(|| missing("ColumnMetaData", "data_page_offset"))?,
            index_page_offset,
            dictionary_page_offset,
            statistics,
            encoding_stats,
            bloom_filter_offset,
        })
    }
}

impl WriteThrift for ColumnMetaData {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.type_.write_thrift_field(writer, 1, 0)?;
        last_field_id = self.encodings.write_thrift_field(writer, 2, last_field_id)?;
        last_field_id = self
            .path_in_schema
            .write_thrift_field(writer, 3, last_field_id)?;
        last_field_id = self.codec.write_thrift_field(writer, 4, last_field_id)?;
        last_field_id = self.num_values.write_thrift_field(writer, 5, last_field_id)?;
        last_field_id = self
            .total_uncompressed_size
            .write_thrift_field(writer, 6, last_field_id)?;
        last_field_id = self
            .total_compressed_size
            .write_thrift_field(writer, 7, last_field_id)?;
        last_field_id = self
            .data_page_offset
            .write_thrift_field(writer, 9, last_field_id)?;
        if let Some(v) = self.index_page_offset {
            last_field_id = v.write_thrift_field(writer, 10, last_field_id)?;
        }
        if let Some(v) = self.dictionary_page_offset {
            last_field_id = v.write_thrift_field(writer, 11, last_field_id)?;
        }
        if let Some(v) = self.statistics.as_ref() {
            last_field_id = v.write_thrift_field(writer, 12, last_field_id)?;
        }
        if let Some(v) = self.encoding_stats.as_ref() {
            last_field_id = v.write_thrift_field(writer, 13, last_field_id)?;
        }
        if let Some(v) = self.bloom_filter_offset {
            v.write_thrift_field(writer, 14, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

impl WriteThriftField for ColumnMetaData {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

/// Encryption metadata for a column encrypted with a column-specific key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncryptionWithColumnKey {
    /// Column path in schema.
    pub path_in_schema: Vec<String>,
    /// Retrieval metadata of the column encryption key.
    pub key_metadata: Option<Vec<u8>>,
}

impl ReadThrift for EncryptionWithColumnKey {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut path_in_schema: Option<Vec<String>> = None;
        let mut key_metadata: Option<Vec<u8>> = None;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => path_in_schema = Some(read_thrift_vec::<String>(prot)?),
                2 => key_metadata = Some(prot.read_bytes()?.to_vec()),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        Ok(Self {
            path_in_schema: path_in_schema
                .ok_or_else(|| missing("EncryptionWithColumnKey", "path_in_schema"))?,
            key_metadata,
        })
    }
}

impl WriteThrift for EncryptionWithColumnKey {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let last_field_id = self.path_in_schema.write_thrift_field(writer, 1, 0)?;
        if let Some(v) = self.key_metadata.as_deref() {
            v.write_thrift_field(writer, 2, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

impl WriteThriftField for EncryptionWithColumnKey {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

/// Crypto metadata attached to a column chunk.
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum ColumnCryptoMetaData {
    /// The column is encrypted with the footer key.
    ENCRYPTION_WITH_FOOTER_KEY,
    /// The column is encrypted with its own key.
    ENCRYPTION_WITH_COLUMN_KEY(EncryptionWithColumnKey),
}

impl ReadThrift for ColumnCryptoMetaData {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let field_ident = prot.read_field_begin(0)?;
        if field_ident.field_type == FieldType::Stop {
            return Err(ParquetError::DeserializeFailed(
                "empty ColumnCryptoMetaData union".to_owned(),
            ));
        }
        let ret = match field_ident.id {
            1 => {
                prot.skip_empty_struct()?;
                Self::ENCRYPTION_WITH_FOOTER_KEY
            }
            2 => Self::ENCRYPTION_WITH_COLUMN_KEY(EncryptionWithColumnKey::read_thrift(prot)?),
            id => {
                return Err(ParquetError::DeserializeFailed(format!(
                    "unexpected ColumnCryptoMetaData variant {id}"
                )))
            }
        };
        let field_ident = prot.read_field_begin(0)?;
        if field_ident.field_type != FieldType::Stop {
            return Err(ParquetError::DeserializeFailed(
                "multiple fields in ColumnCryptoMetaData union".to_owned(),
            ));
        }
        Ok(ret)
    }
}

impl WriteThrift for ColumnCryptoMetaData {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        match self {
            Self::ENCRYPTION_WITH_FOOTER_KEY => {
                writer.write_empty_struct(1, 0)?;
            }
            Self::ENCRYPTION_WITH_COLUMN_KEY(v) => {
                v.write_thrift_field(writer, 2, 0)?;
            }
        }
        writer.write_struct_end()
    }
}

impl WriteThriftField for ColumnCryptoMetaData {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

/// Description for a column chunk.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnChunk {
    /// File where the column chunk is stored. If not set, it is in the same
    /// file as the metadata.
    pub file_path: Option<String>,
    /// Byte offset in `file_path`.
    pub file_offset: i64,
    /// Column metadata for this chunk.
    pub meta_data: Option<ColumnMetaData>,
    pub offset_index_offset: Option<i64>,
    pub offset_index_length: Option<i32>,
    pub column_index_offset: Option<i64>,
    pub column_index_length: Option<i32>,
    /// Crypto metadata of encrypted columns.
    pub crypto_metadata: Option<ColumnCryptoMetaData>,
    /// Encrypted column metadata for this chunk.
    pub encrypted_column_metadata: Option<Vec<u8>>,
}

impl ReadThrift for ColumnChunk {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut chunk = ColumnChunk::default();
        let mut has_file_offset = false;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => chunk.file_path = Some(prot.read_string()?),
                2 => {
                    chunk.file_offset = prot.read_i64()?;
                    has_file_offset = true;
                }
                3 => chunk.meta_data = Some(ColumnMetaData::read_thrift(prot)?),
                4 => chunk.offset_index_offset = Some(prot.read_i64()?),
                5 => chunk.offset_index_length = Some(prot.read_i32()?),
                6 => chunk.column_index_offset = Some(prot.read_i64()?),
                7 => chunk.column_index_length = Some(prot.read_i32()?),
                8 => chunk.crypto_metadata = Some(ColumnCryptoMetaData::read_thrift(prot)?),
                9 => chunk.encrypted_column_metadata = Some(prot.read_bytes()?.to_vec()),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        if !has_file_offset {
            return Err(missing("ColumnChunk", "file_offset"));
        }
        Ok(chunk)
    }
}

impl WriteThrift for ColumnChunk {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = 0i16;
        if let Some(v) = self.file_path.as_ref() {
            last_field_id = v.write_thrift_field(writer, 1, last_field_id)?;
        }
        last_field_id = self.file_offset.write_thrift_field(writer, 2, last_field_id)?;
        if let Some(v) = self.meta_data.as_ref() {
            last_field_id = v.write_thrift_field(writer, 3, last_field_id)?;
        }
        if let Some(v) = self.offset_index_offset {
            last_field_id = v.write_thrift_field(writer, 4, last_field_id)?;
        }
        if let Some(v) = self.offset_index_length {
            last_field_id = v.write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(v) = self.column_index_offset {
            last_field_id = v.write_thrift_field(writer, 6, last_field_id)?;
        }
        if let Some(v) = self.column_index_length {
            last_field_id = v.write_thrift_field(writer, 7, last_field_id)?;
        }
        if let Some(v) = self.crypto_metadata.as_ref() {
            last_field_id = v.write_thrift_field(writer, 8, last_field_id)?;
        }
        if let Some(v) = self.encrypted_column_metadata.as_deref() {
            v.write_thrift_field(writer, 9, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

/// Description for a row group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowGroup {
    /// Metadata for each column chunk in this row group.
    pub columns: Vec<ColumnChunk>,
    /// Total byte size of all the uncompressed column data in this row group.
    pub total_byte_size: i64,
    /// Number of rows in this row group.
    pub num_rows: i64,
    /// Byte offset from beginning of file to first page (data or dictionary)
    /// in this row group.
    pub file_offset: Option<i64>,
    /// Total byte size of all compressed (and potentially encrypted) column
    /// data in this row group.
    pub total_compressed_size: Option<i64>,
    /// Row group ordinal in the file.
    pub ordinal: Option<i16>,
}

impl ReadThrift for RowGroup {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut rg = RowGroup::default();
        let mut has_columns = false;
        let mut has_total_byte_size = false;
        let mut has_num_rows = false;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => {
                    rg.columns = read_thrift_vec::<ColumnChunk>(prot)?;
                    has_columns = true;
                }
                2 => {
                    rg.total_byte_size = prot.read_i64()?;
                    has_total_byte_size = true;
                }
                3 => {
                    rg.num_rows = prot.read_i64()?;
                    has_num_rows = true;
                }
                // 4: sorting_columns is not exposed
                5 => rg.file_offset = Some(prot.read_i64()?),
                6 => rg.total_compressed_size = Some(prot.read_i64()?),
                7 => rg.ordinal = Some(prot.read_i16()?),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        if !has_columns {
            return Err(missing("RowGroup", "columns"));
        }
        if !has_total_byte_size {
            return Err(missing("RowGroup", "total_byte_size"));
        }
        if !has_num_rows {
            return Err(missing("RowGroup", "num_rows"));
        }
        Ok(rg)
    }
}

impl WriteThrift for RowGroup {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.columns.write_thrift_field(writer, 1, 0)?;
        last_field_id = self
            .total_byte_size
            .write_thrift_field(writer, 2, last_field_id)?;
        last_field_id = self.num_rows.write_thrift_field(writer, 3, last_field_id)?;
        if let Some(v) = self.file_offset {
            last_field_id = v.write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(v) = self.total_compressed_size {
            last_field_id = v.write_thrift_field(writer, 6, last_field_id)?;
        }
        if let Some(v) = self.ordinal {
            v.write_thrift_field(writer, 7, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

// ColumnOrder is a thrift union; field 1 (TypeDefinedOrder) is the only
// variant the format defines. The sort order is resolved against the schema
// after parsing.
impl ReadThrift for ColumnOrder {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        use crate::basic::SortOrder;
        let field_ident = prot.read_field_begin(0)?;
        if field_ident.field_type == FieldType::Stop {
            return Err(ParquetError::DeserializeFailed(
                "empty ColumnOrder union".to_owned(),
            ));
        }
        let ret = match field_ident.id {
            1 => {
                prot.skip_empty_struct()?;
                ColumnOrder::TYPE_DEFINED_ORDER(SortOrder::SIGNED)
            }
            _ => {
                prot.skip(field_ident.field_type)?;
                ColumnOrder::UNKNOWN
            }
        };
        let field_ident = prot.read_field_begin(0)?;
        if field_ident.field_type != FieldType::Stop {
            return Err(ParquetError::DeserializeFailed(
                "multiple fields in ColumnOrder union".to_owned(),
            ));
        }
        Ok(ret)
    }
}

impl WriteThrift for ColumnOrder {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        match self {
            ColumnOrder::TYPE_DEFINED_ORDER(_) => {
                writer.write_empty_struct(1, 0)?;
            }
            _ => return Err(general_err!("attempt to write undefined ColumnOrder")),
        }
        writer.write_struct_end()
    }
}

/// AAD carrier for the AES-GCM algorithm variant.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AesGcmV1 {
    /// AAD prefix.
    pub aad_prefix: Option<Vec<u8>>,
    /// Unique file identifier part of the AAD suffix.
    pub aad_file_unique: Option<Vec<u8>>,
    /// When true, readers must supply the prefix out of band.
    pub supply_aad_prefix: Option<bool>,
}

/// AAD carrier for the AES-GCM-CTR algorithm variant.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AesGcmCtrV1 {
    /// AAD prefix.
    pub aad_prefix: Option<Vec<u8>>,
    /// Unique file identifier part of the AAD suffix.
    pub aad_file_unique: Option<Vec<u8>>,
    /// When true, readers must supply the prefix out of band.
    pub supply_aad_prefix: Option<bool>,
}

fn read_aad_fields(
    prot: &mut ThriftSliceInputProtocol<'_>,
) -> Result<(Option<Vec<u8>>, Option<Vec<u8>>, Option<bool>)> {
    let mut aad_prefix: Option<Vec<u8>> = None;
    let mut aad_file_unique: Option<Vec<u8>> = None;
    let mut supply_aad_prefix: Option<bool> = None;
    let mut last_field_id = 0i16;
    loop {
        let field_ident = prot.read_field_begin(last_field_id)?;
        if field_ident.field_type == FieldType::Stop {
            break;
        }
        match field_ident.id {
            1 => aad_prefix = Some(prot.read_bytes()?.to_vec()),
            2 => aad_file_unique = Some(prot.read_bytes()?.to_vec()),
            3 => supply_aad_prefix = field_ident.bool_val,
            _ => prot.skip(field_ident.field_type)?,
        }
        last_field_id = field_ident.id;
    }
    Ok((aad_prefix, aad_file_unique, supply_aad_prefix))
}

fn write_aad_fields<W: Write>(
    writer: &mut ThriftCompactOutputProtocol<W>,
    aad_prefix: Option<&[u8]>,
    aad_file_unique: Option<&[u8]>,
    supply_aad_prefix: Option<bool>,
) -> Result<()> {
    let mut last_field_id = 0i16;
    if let Some(v) = aad_prefix {
        last_field_id = v.write_thrift_field(writer, 1, last_field_id)?;
    }
    if let Some(v) = aad_file_unique {
        last_field_id = v.write_thrift_field(writer, 2, last_field_id)?;
    }
    if let Some(v) = supply_aad_prefix {
        v.write_thrift_field(writer, 3, last_field_id)?;
    }
    writer.write_struct_end()
}

impl ReadThrift for AesGcmV1 {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let (aad_prefix, aad_file_unique, supply_aad_prefix) = read_aad_fields(prot)?;
        Ok(Self {
            aad_prefix,
            aad_file_unique,
            supply_aad_prefix,
        })
    }
}

impl WriteThrift for AesGcmV1 {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        write_aad_fields(
            writer,
            self.aad_prefix.as_deref(),
            self.aad_file_unique.as_deref(),
            self.supply_aad_prefix,
        )
    }
}

impl ReadThrift for AesGcmCtrV1 {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let (aad_prefix, aad_file_unique, supply_aad_prefix) = read_aad_fields(prot)?;
        Ok(Self {
            aad_prefix,
            aad_file_unique,
            supply_aad_prefix,
        })
    }
}

impl WriteThrift for AesGcmCtrV1 {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        write_aad_fields(
            writer,
            self.aad_prefix.as_deref(),
            self.aad_file_unique.as_deref(),
            self.supply_aad_prefix,
        )
    }
}

/// Algorithm used to encrypt a file.
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum EncryptionAlgorithm {
    AES_GCM_V1(AesGcmV1),
    AES_GCM_CTR_V1(AesGcmCtrV1),
}

impl ReadThrift for EncryptionAlgorithm {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let field_ident = prot.read_field_begin(0)?;
        if field_ident.field_type == FieldType::Stop {
            return Err(ParquetError::DeserializeFailed(
                "empty EncryptionAlgorithm union".to_owned(),
            ));
        }
        let ret = match field_ident.id {
            1 => Self::AES_GCM_V1(AesGcmV1::read_thrift(prot)?),
            2 => Self::AES_GCM_CTR_V1(AesGcmCtrV1::read_thrift(prot)?),
            id => {
                return Err(ParquetError::UnsupportedAlgorithm(format!(
                    "EncryptionAlgorithm variant {id}"
                )))
            }
        };
        let field_ident = prot.read_field_begin(0)?;
        if field_ident.field_type != FieldType::Stop {
            return Err(ParquetError::DeserializeFailed(
                "multiple fields in EncryptionAlgorithm union".to_owned(),
            ));
        }
        Ok(ret)
    }
}

impl WriteThrift for EncryptionAlgorithm {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        match self {
            Self::AES_GCM_V1(v) => {
                writer.write_field_begin(FieldType::Struct, 1, 0)?;
                v.write_thrift(writer)?;
            }
            Self::AES_GCM_CTR_V1(v) => {
                writer.write_field_begin(FieldType::Struct, 2, 0)?;
                v.write_thrift(writer)?;
            }
        }
        writer.write_struct_end()
    }
}

impl WriteThriftField for EncryptionAlgorithm {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

/// Crypto metadata stored in the tail of files with an encrypted footer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileCryptoMetaData {
    /// Encryption algorithm. Files with a plaintext footer store the
    /// algorithm id inside the footer instead.
    pub encryption_algorithm: EncryptionAlgorithm,
    /// Retrieval metadata of the key used for encryption of the footer and
    /// (possibly) columns.
    pub key_metadata: Option<Vec<u8>>,
}

impl ReadThrift for FileCryptoMetaData {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut encryption_algorithm: Option<EncryptionAlgorithm> = None;
        let mut key_metadata: Option<Vec<u8>> = None;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => encryption_algorithm = Some(EncryptionAlgorithm::read_thrift(prot)?),
                2 => key_metadata = Some(prot.read_bytes()?.to_vec()),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        Ok(Self {
            encryption_algorithm: encryption_algorithm
                .ok_or_else(|| missing("FileCryptoMetaData", "encryption_algorithm"))?,
            key_metadata,
        })
    }
}

impl WriteThrift for FileCryptoMetaData {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let last_field_id = self
            .encryption_algorithm
            .write_thrift_field(writer, 1, 0)?;
        if let Some(v) = self.key_metadata.as_deref() {
            v.write_thrift_field(writer, 2, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

/// Description for file metadata.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileMetaData {
    /// Version of this file.
    pub version: i32,
    /// Parquet schema for this file, flattened by depth-first traversal.
    pub schema: Vec<SchemaElement>,
    /// Number of rows in this file.
    pub num_rows: i64,
    /// Row groups in this file.
    pub row_groups: Vec<RowGroup>,
    /// Optional key/value metadata.
    pub key_value_metadata: Option<Vec<KeyValue>>,
    /// String for application that wrote this file.
    pub created_by: Option<String>,
    /// Sort order used for the min_value and max_value fields of each column.
    pub column_orders: Option<Vec<ColumnOrder>>,
    /// Set in encrypted files with plaintext footers only: the footer signing
    /// algorithm.
    pub encryption_algorithm: Option<EncryptionAlgorithm>,
    /// Retrieval metadata of the key used for signing the footer.
    pub footer_signing_key_metadata: Option<Vec<u8>>,
}

impl ReadThrift for FileMetaData {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut fmd = FileMetaData::default();
        let mut has_version = false;
        let mut has_schema = false;
        let mut has_num_rows = false;
        let mut has_row_groups = false;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => {
                    fmd.version = prot.read_i32()?;
                    has_version = true;
                }
                2 => {
                    fmd.schema = read_thrift_vec::<SchemaElement>(prot)?;
                    has_schema = true;
                }
                3 => {
                    fmd.num_rows = prot.read_i64()?;
                    has_num_rows = true;
                }
                4 => {
                    fmd.row_groups = read_thrift_vec::<RowGroup>(prot)?;
                    has_row_groups = true;
                }
                5 => fmd.key_value_metadata = Some(read_thrift_vec::<KeyValue>(prot)?),
                6 => fmd.created_by = Some(prot.read_string()?),
                7 => fmd.column_orders = Some(read_thrift_vec::<ColumnOrder>(prot)?),
                8 => fmd.encryption_algorithm = Some(EncryptionAlgorithm::read_thrift(prot)?),
                9 => fmd.footer_signing_key_metadata = Some(prot.read_bytes()?.to_vec()),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        if !has_version {
            return Err(missing("FileMetaData", "version"));
        }
        if !has_schema {
            return Err(missing("FileMetaData", "schema"));
        }
        if !has_num_rows {
            return Err(missing("FileMetaData", "num_rows"));
        }
        if !has_row_groups {
            return Err(missing("FileMetaData", "row_groups"));
        }
        Ok(fmd)
    }
}

impl WriteThrift for FileMetaData {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.version.write_thrift_field(writer, 1, 0)?;
        last_field_id = self.schema.write_thrift_field(writer, 2, last_field_id)?;
        last_field_id = self.num_rows.write_thrift_field(writer, 3, last_field_id)?;
        last_field_id = self.row_groups.write_thrift_field(writer, 4, last_field_id)?;
        if let Some(v) = self.key_value_metadata.as_ref() {
            last_field_id = v.write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(v) = self.created_by.as_ref() {
            last_field_id = v.write_thrift_field(writer, 6, last_field_id)?;
        }
        if let Some(v) = self.column_orders.as_ref() {
            last_field_id = v.write_thrift_field(writer, 7, last_field_id)?;
        }
        if let Some(v) = self.encryption_algorithm.as_ref() {
            last_field_id = v.write_thrift_field(writer, 8, last_field_id)?;
        }
        if let Some(v) = self.footer_signing_key_metadata.as_deref() {
            v.write_thrift_field(writer, 9, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

/// Data page header.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPageHeader {
    /// Number of values, including NULLs, in this data page.
    pub num_values: i32,
    /// Encoding used for this data page.
    pub encoding: Encoding,
    /// Encoding used for definition levels.
    pub definition_level_encoding: Encoding,
    /// Encoding used for repetition levels.
    pub repetition_level_encoding: Encoding,
    /// Optional statistics for the data in this page.
    pub statistics: Option<Statistics>,
}

impl ReadThrift for DataPageHeader {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut num_values: Option<i32> = None;
        let mut encoding: Option<Encoding> = None;
        let mut definition_level_encoding: Option<Encoding> = None;
        let mut repetition_level_encoding: Option<Encoding> = None;
        let mut statistics: Option<Statistics> = None;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => num_values = Some(prot.read_i32()?),
                2 => encoding = Some(Encoding::read_thrift(prot)?),
                3 => definition_level_encoding = Some(Encoding::read_thrift(prot)?),
                4 => repetition_level_encoding = Some(Encoding::read_thrift(prot)?),
                5 => statistics = Some(Statistics::read_thrift(prot)?),
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        Ok(Self {
            num_values: num_values.ok_or_else(|| missing("DataPageHeader", "num_values"))?,
            encoding: encoding.ok_or_else(|| missing("DataPageHeader", "encoding"))?,
            definition_level_encoding: definition_level_encoding
                .ok_or_else(|| missing("DataPageHeader", "definition_level_encoding"))?,
            repetition_level_encoding: repetition_level_encoding
                .ok_or_else(|| missing("DataPageHeader", "repetition_level_encoding"))?,
            statistics,
        })
    }
}

impl WriteThrift for DataPageHeader {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.num_values.write_thrift_field(writer, 1, 0)?;
        last_field_id = self.encoding.write_thrift_field(writer, 2, last_field_id)?;
        last_field_id = self
            .definition_level_encoding
            .write_thrift_field(writer, 3, last_field_id)?;
        last_field_id = self
            .repetition_level_encoding
            .write_thrift_field(writer, 4, last_field_id)?;
        if let Some(v) = self.statistics.as_ref() {
            v.write_thrift_field(writer, 5, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

impl WriteThriftField for DataPageHeader {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

/// Dictionary page header.
#[derive(Clone, Debug, PartialEq)]
pub struct DictionaryPageHeader {
    /// Number of values in the dictionary.
    pub num_values: i32,
    /// Encoding using this dictionary page.
    pub encoding: Encoding,
    /// If true, the entries in the dictionary are sorted in ascending order.
    pub is_sorted: Option<bool>,
}

impl ReadThrift for DictionaryPageHeader {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut num_values: Option<i32> = None;
        let mut encoding: Option<Encoding> = None;
        let mut is_sorted: Option<bool> = None;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => num_values = Some(prot.read_i32()?),
                2 => encoding = Some(Encoding::read_thrift(prot)?),
                3 => is_sorted = field_ident.bool_val,
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        Ok(Self {
            num_values: num_values.ok_or_else(|| missing("DictionaryPageHeader", "num_values"))?,
            encoding: encoding.ok_or_else(|| missing("DictionaryPageHeader", "encoding"))?,
            is_sorted,
        })
    }
}

impl WriteThrift for DictionaryPageHeader {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.num_values.write_thrift_field(writer, 1, 0)?;
        last_field_id = self.encoding.write_thrift_field(writer, 2, last_field_id)?;
        if let Some(v) = self.is_sorted {
            v.write_thrift_field(writer, 3, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

impl WriteThriftField for DictionaryPageHeader {
    fn write_thrift_field<W: Write>(
        &self,
        writer: &mut ThriftCompactOutputProtocol<W>,
        field_id: i16,
        last_field_id: i16,
    ) -> Result<i16> {
        writer.write_field_begin(FieldType::Struct, field_id, last_field_id)?;
        self.write_thrift(writer)?;
        Ok(field_id)
    }
}

/// Header for a data or dictionary page, preceding the page body in the
/// serialized stream.
#[derive(Clone, Debug, PartialEq)]
pub struct PageHeader {
    /// The type of the page, indicating which of the sub-headers is set.
    pub type_: PageType,
    /// Uncompressed page size in bytes (not including this header).
    pub uncompressed_page_size: i32,
    /// Compressed (and potentially encrypted) page size in bytes, not
    /// including this header.
    pub compressed_page_size: i32,
    /// 32-bit CRC checksum of the page.
    pub crc: Option<i32>,
    pub data_page_header: Option<DataPageHeader>,
    pub dictionary_page_header: Option<DictionaryPageHeader>,
}

impl ReadThrift for PageHeader {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        let mut type_: Option<PageType> = None;
        let mut uncompressed_page_size: Option<i32> = None;
        let mut compressed_page_size: Option<i32> = None;
        let mut crc: Option<i32> = None;
        let mut data_page_header: Option<DataPageHeader> = None;
        let mut dictionary_page_header: Option<DictionaryPageHeader> = None;
        let mut last_field_id = 0i16;
        loop {
            let field_ident = prot.read_field_begin(last_field_id)?;
            if field_ident.field_type == FieldType::Stop {
                break;
            }
            match field_ident.id {
                1 => type_ = Some(PageType::read_thrift(prot)?),
                2 => uncompressed_page_size = Some(prot.read_i32()?),
                3 => compressed_page_size = Some(prot.read_i32()?),
                4 => crc = Some(prot.read_i32()?),
                5 => data_page_header = Some(DataPageHeader::read_thrift(prot)?),
                7 => dictionary_page_header = Some(DictionaryPageHeader::read_thrift(prot)?),
                // 6: index page header, 8: data page header v2
                _ => prot.skip(field_ident.field_type)?,
            }
            last_field_id = field_ident.id;
        }
        Ok(Self {
            type_: type_.ok_or_else(|| missing("PageHeader", "type"))?,
            uncompressed_page_size: uncompressed_page_size
                .ok_or_else(|| missing("PageHeader", "uncompressed_page_size"))?,
            compressed_page_size: compressed_page_size
                .ok_or_else(|| missing("PageHeader", "compressed_page_size"))?,
            crc,
            data_page_header,
            dictionary_page_header,
        })
    }
}

impl WriteThrift for PageHeader {
    const ELEMENT_TYPE: u8 = ELEM_STRUCT;

    fn write_thrift<W: Write>(&self, writer: &mut ThriftCompactOutputProtocol<W>) -> Result<()> {
        let mut last_field_id = self.type_.write_thrift_field(writer, 1, 0)?;
        last_field_id = self
            .uncompressed_page_size
            .write_thrift_field(writer, 2, last_field_id)?;
        last_field_id = self
            .compressed_page_size
            .write_thrift_field(writer, 3, last_field_id)?;
        if let Some(v) = self.crc {
            last_field_id = v.write_thrift_field(writer, 4, last_field_id)?;
        }
        if let Some(v) = self.data_page_header.as_ref() {
            last_field_id = v.write_thrift_field(writer, 5, last_field_id)?;
        }
        if let Some(v) = self.dictionary_page_header.as_ref() {
            v.write_thrift_field(writer, 7, last_field_id)?;
        }
        writer.write_struct_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thrift::serialize_thrift_object;

    fn roundtrip<T>(val: &T) -> T
    where
        T: ReadThrift + WriteThrift,
    {
        let buf = serialize_thrift_object(val).unwrap();
        let mut prot = ThriftSliceInputProtocol::new(&buf);
        T::read_thrift(&mut prot).unwrap()
    }

    #[test]
    fn test_key_value_roundtrip() {
        let kv = KeyValue::new("key".to_owned(), Some("value".to_owned()));
        assert_eq!(roundtrip(&kv), kv);
        let kv = KeyValue::new("no_value".to_owned(), None);
        assert_eq!(roundtrip(&kv), kv);
    }

    #[test]
    fn test_column_chunk_roundtrip() {
        let chunk = ColumnChunk {
            file_path: None,
            file_offset: 1234,
            meta_data: Some(ColumnMetaData {
                type_: Type::INT32,
                encodings: vec![Encoding::RLE_DICTIONARY, Encoding::PLAIN, Encoding::RLE],
                path_in_schema: vec!["a".to_owned()],
                codec: Compression::SNAPPY,
                num_values: 5,
                total_uncompressed_size: 200,
                total_compressed_size: 100,
                data_page_offset: 4,
                index_page_offset: None,
                dictionary_page_offset: Some(4),
                statistics: Some(Statistics {
                    min_value: Some(vec![1, 0, 0, 0]),
                    max_value: Some(vec![5, 0, 0, 0]),
                    null_count: Some(0),
                    ..Default::default()
                }),
                encoding_stats: None,
                bloom_filter_offset: None,
            }),
            crypto_metadata: Some(ColumnCryptoMetaData::ENCRYPTION_WITH_COLUMN_KEY(
                EncryptionWithColumnKey {
                    path_in_schema: vec!["a".to_owned()],
                    key_metadata: Some(b"kc1".to_vec()),
                },
            )),
            encrypted_column_metadata: Some(vec![0xde, 0xad]),
            ..Default::default()
        };
        assert_eq!(roundtrip(&chunk), chunk);
    }

    #[test]
    fn test_file_crypto_metadata_roundtrip() {
        let fcmd = FileCryptoMetaData {
            encryption_algorithm: EncryptionAlgorithm::AES_GCM_V1(AesGcmV1 {
                aad_prefix: Some(b"prefix".to_vec()),
                aad_file_unique: Some(vec![1, 2, 3, 4, 5, 6, 7, 8]),
                supply_aad_prefix: Some(false),
            }),
            key_metadata: Some(b"kf".to_vec()),
        };
        assert_eq!(roundtrip(&fcmd), fcmd);
    }

    #[test]
    fn test_page_header_roundtrip() {
        let header = PageHeader {
            type_: PageType::DATA_PAGE,
            uncompressed_page_size: 100,
            compressed_page_size: 80,
            crc: None,
            data_page_header: Some(DataPageHeader {
                num_values: 10,
                encoding: Encoding::PLAIN,
                definition_level_encoding: Encoding::RLE,
                repetition_level_encoding: Encoding::RLE,
                statistics: None,
            }),
            dictionary_page_header: None,
        };
        assert_eq!(roundtrip(&header), header);

        let header = PageHeader {
            type_: PageType::DICTIONARY_PAGE,
            uncompressed_page_size: 44,
            compressed_page_size: 44,
            crc: None,
            data_page_header: None,
            dictionary_page_header: Some(DictionaryPageHeader {
                num_values: 9,
                encoding: Encoding::PLAIN,
                is_sorted: Some(false),
            }),
        };
        assert_eq!(roundtrip(&header), header);
    }

    #[test]
    fn test_file_metadata_roundtrip() {
        let fmd = FileMetaData {
            version: 1,
            schema: vec![
                SchemaElement {
                    name: "schema".to_owned(),
                    num_children: Some(1),
                    ..Default::default()
                },
                SchemaElement {
                    name: "a".to_owned(),
                    type_: Some(Type::INT32),
                    repetition_type: Some(Repetition::REQUIRED),
                    ..Default::default()
                },
            ],
            num_rows: 5,
            row_groups: vec![RowGroup {
                columns: vec![ColumnChunk {
                    file_offset: 4,
                    ..Default::default()
                }],
                total_byte_size: 99,
                num_rows: 5,
                file_offset: Some(4),
                total_compressed_size: Some(88),
                ordinal: Some(0),
            }],
            key_value_metadata: Some(vec![KeyValue::new("k".to_owned(), Some("v".to_owned()))]),
            created_by: Some("parquet-core version 0.4.0".to_owned()),
            column_orders: Some(vec![ColumnOrder::TYPE_DEFINED_ORDER(
                crate::basic::SortOrder::SIGNED,
            )]),
            encryption_algorithm: None,
            footer_signing_key_metadata: None,
        };
        assert_eq!(roundtrip(&fmd), fmd);
    }
}
