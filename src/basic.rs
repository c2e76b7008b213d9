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

//! Rust mappings for the thrift enums and the sort-order machinery.
//! Refer to the [`parquet.thrift`] file for the raw definitions.
//!
//! [`parquet.thrift`]: https://github.com/apache/parquet-format/blob/master/src/main/thrift/parquet.thrift

use std::fmt;
use std::io::Write;

use crate::errors::{ParquetError, Result};
use crate::thrift::{
    FieldType, ReadThrift, ThriftCompactOutputProtocol, ThriftSliceInputProtocol, WriteThrift,
    WriteThriftField, ELEM_I32,
};

// Generates a Rust enum for a thrift i32 enum together with the codec impls.
macro_rules! thrift_enum {
    ($(#[$attr:meta])* $name:ident { $($(#[$vattr:meta])* $variant:ident = $value:literal,)* }) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[allow(non_camel_case_types)]
        pub enum $name {
            $($(#[$vattr])* $variant,)*
        }

        impl $name {
            /// The raw thrift value for this variant.
            pub fn as_i32(self) -> i32 {
                match self {
                    $(Self::$variant => $value,)*
                }
            }
        }

        impl TryFrom<i32> for $name {
            type Error = ParquetError;

            fn try_from(value: i32) -> Result<Self> {
                match value {
                    $($value => Ok(Self::$variant),)*
                    _ => Err(general_err!("unexpected {} {}", stringify!($name), value)),
                }
            }
        }

        impl ReadThrift for $name {
            fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
                Self::try_from(prot.read_i32()?)
            }
        }

        impl WriteThrift for $name {
            const ELEMENT_TYPE: u8 = ELEM_I32;

            fn write_thrift<W: Write>(
                &self,
                writer: &mut ThriftCompactOutputProtocol<W>,
            ) -> Result<()> {
                writer.write_i32(self.as_i32())
            }
        }

        impl WriteThriftField for $name {
            fn write_thrift_field<W: Write>(
                &self,
                writer: &mut ThriftCompactOutputProtocol<W>,
                field_id: i16,
                last_field_id: i16,
            ) -> Result<i16> {
                writer.write_field_begin(FieldType::I32, field_id, last_field_id)?;
                writer.write_i32(self.as_i32())?;
                Ok(field_id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{self:?}")
            }
        }
    }
}

thrift_enum!(
/// Physical types supported by Parquet.
///
/// These are intended to be used in combination with the encodings to control
/// the on-disk storage format.
Type {
    BOOLEAN = 0,
    INT32 = 1,
    INT64 = 2,
    /// Deprecated, only used by legacy implementations.
    INT96 = 3,
    FLOAT = 4,
    DOUBLE = 5,
    BYTE_ARRAY = 6,
    FIXED_LEN_BYTE_ARRAY = 7,
}
);

thrift_enum!(
/// Representation of field repetition in a schema.
Repetition {
    /// Field is required (can not be null) and each row has exactly one value.
    REQUIRED = 0,
    /// Field is optional (can be null) and each row has zero or one value.
    OPTIONAL = 1,
    /// Field is repeated and can contain zero or more values.
    REPEATED = 2,
}
);

thrift_enum!(
/// Encodings supported by Parquet.
///
/// Not all encodings are valid for all types.
Encoding {
    /// The default encoding. Values are stored back to back.
    PLAIN = 0,
    /// **Deprecated** dictionary encoding for data pages; the dictionary page
    /// itself is PLAIN encoded.
    PLAIN_DICTIONARY = 2,
    /// Group packed run length encoding, combining RLE and bit packing.
    /// Used for definition and repetition levels and dictionary indices.
    RLE = 3,
    /// Bit packed encoding, only used for levels. Deprecated.
    BIT_PACKED = 4,
    /// Delta encoding for integers.
    DELTA_BINARY_PACKED = 5,
    /// Encoding for byte arrays with delta-encoded prefix lengths.
    DELTA_LENGTH_BYTE_ARRAY = 6,
    /// Incremental-style encoding for byte arrays.
    DELTA_BYTE_ARRAY = 7,
    /// Dictionary encoding: the ids are RLE/bit-packed encoded.
    RLE_DICTIONARY = 8,
    /// Encoding for floating point data, splitting values into byte streams.
    BYTE_STREAM_SPLIT = 9,
}
);

thrift_enum!(
/// Supported block compression algorithms.
Compression {
    UNCOMPRESSED = 0,
    SNAPPY = 1,
    GZIP = 2,
    LZO = 3,
    BROTLI = 4,
    LZ4 = 5,
    ZSTD = 6,
    LZ4_RAW = 7,
}
);

thrift_enum!(
/// Available data pages for Parquet file format.
PageType {
    DATA_PAGE = 0,
    INDEX_PAGE = 1,
    DICTIONARY_PAGE = 2,
    DATA_PAGE_V2 = 3,
}
);

/// Common types (converted types) used by frameworks when using Parquet.
///
/// This helps map between types in those frameworks to the base types in
/// Parquet. This is only metadata and not needed to read or write the data.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[allow(non_camel_case_types)]
pub enum ConvertedType {
    /// No type conversion.
    NONE,
    /// A BYTE_ARRAY that actually contains UTF8 encoded chars.
    UTF8,
    /// A map is converted as an optional field containing a repeated key/value pair.
    MAP,
    /// A key/value pair is converted into a group of two fields.
    MAP_KEY_VALUE,
    /// A list is converted into an optional field containing a repeated field
    /// for its values.
    LIST,
    /// An enum is converted into a binary field.
    ENUM,
    /// A decimal value annotating binary or fixed primitive types.
    DECIMAL,
    /// A date stored as days since the Unix epoch, as INT32.
    DATE,
    /// Milliseconds since midnight, as INT32.
    TIME_MILLIS,
    /// Microseconds since midnight, as INT64.
    TIME_MICROS,
    /// Milliseconds since the Unix epoch, as INT64.
    TIMESTAMP_MILLIS,
    /// Microseconds since the Unix epoch, as INT64.
    TIMESTAMP_MICROS,
    /// An unsigned 8 bit integer value.
    UINT_8,
    /// An unsigned 16 bit integer value.
    UINT_16,
    /// An unsigned 32 bit integer value.
    UINT_32,
    /// An unsigned 64 bit integer value.
    UINT_64,
    /// A signed 8 bit integer value.
    INT_8,
    /// A signed 16 bit integer value.
    INT_16,
    /// A signed 32 bit integer value.
    INT_32,
    /// A signed 64 bit integer value.
    INT_64,
    /// A JSON document embedded in a BYTE_ARRAY.
    JSON,
    /// A BSON document embedded in a BYTE_ARRAY.
    BSON,
    /// An interval of time, as a 12 byte fixed length byte array.
    INTERVAL,
}

impl ConvertedType {
    /// The raw thrift value, or `None` for [`Self::NONE`] which has no thrift
    /// representation (the field is simply absent).
    pub fn as_i32(self) -> Option<i32> {
        let v = match self {
            ConvertedType::NONE => return None,
            ConvertedType::UTF8 => 0,
            ConvertedType::MAP => 1,
            ConvertedType::MAP_KEY_VALUE => 2,
            ConvertedType::LIST => 3,
            ConvertedType::ENUM => 4,
            ConvertedType::DECIMAL => 5,
            ConvertedType::DATE => 6,
            ConvertedType::TIME_MILLIS => 7,
            ConvertedType::TIME_MICROS => 8,
            ConvertedType::TIMESTAMP_MILLIS => 9,
            ConvertedType::TIMESTAMP_MICROS => 10,
            ConvertedType::UINT_8 => 11,
            ConvertedType::UINT_16 => 12,
            ConvertedType::UINT_32 => 13,
            ConvertedType::UINT_64 => 14,
            ConvertedType::INT_8 => 15,
            ConvertedType::INT_16 => 16,
            ConvertedType::INT_32 => 17,
            ConvertedType::INT_64 => 18,
            ConvertedType::JSON => 19,
            ConvertedType::BSON => 20,
            ConvertedType::INTERVAL => 21,
        };
        Some(v)
    }
}

impl TryFrom<i32> for ConvertedType {
    type Error = ParquetError;

    fn try_from(value: i32) -> Result<Self> {
        Ok(match value {
            0 => ConvertedType::UTF8,
            1 => ConvertedType::MAP,
            2 => ConvertedType::MAP_KEY_VALUE,
            3 => ConvertedType::LIST,
            4 => ConvertedType::ENUM,
            5 => ConvertedType::DECIMAL,
            6 => ConvertedType::DATE,
            7 => ConvertedType::TIME_MILLIS,
            8 => ConvertedType::TIME_MICROS,
            9 => ConvertedType::TIMESTAMP_MILLIS,
            10 => ConvertedType::TIMESTAMP_MICROS,
            11 => ConvertedType::UINT_8,
            12 => ConvertedType::UINT_16,
            13 => ConvertedType::UINT_32,
            14 => ConvertedType::UINT_64,
            15 => ConvertedType::INT_8,
            16 => ConvertedType::INT_16,
            17 => ConvertedType::INT_32,
            18 => ConvertedType::INT_64,
            19 => ConvertedType::JSON,
            20 => ConvertedType::BSON,
            21 => ConvertedType::INTERVAL,
            _ => return Err(general_err!("unexpected ConvertedType {}", value)),
        })
    }
}

impl ReadThrift for ConvertedType {
    fn read_thrift(prot: &mut ThriftSliceInputProtocol<'_>) -> Result<Self> {
        Self::try_from(prot.read_i32()?)
    }
}

impl fmt::Display for ConvertedType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The cipher variant of the Parquet modular encryption scheme.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum ParquetCipher {
    /// Page bodies, page headers and metadata modules all use AES-GCM.
    AES_GCM_V1,
    /// Page bodies use unauthenticated AES-CTR; headers and metadata modules
    /// keep AES-GCM.
    AES_GCM_CTR_V1,
}

/// Sort order of page and column statistics.
///
/// Types are associated with sort orders; statistics are aggregated under a
/// sort order and one must be considered when comparing values against
/// min/max bounds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum SortOrder {
    /// Signed (either value or legacy byte-wise) comparison.
    SIGNED,
    /// Unsigned (depending on physical type either value or byte-wise) comparison.
    UNSIGNED,
    /// Comparison is undefined.
    UNKNOWN,
}

impl SortOrder {
    /// Returns true if this is [`Self::SIGNED`].
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::SIGNED)
    }
}

/// Column order that specifies what method was used to aggregate min/max
/// values for statistics.
///
/// If the column order is undefined, it is the legacy behaviour and all
/// values are compared as signed values/bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(non_camel_case_types)]
pub enum ColumnOrder {
    /// Column uses the order defined by its physical or converted type,
    /// parquet-format 2.4.0+.
    TYPE_DEFINED_ORDER(SortOrder),
    /// Undefined column order, means legacy behaviour before parquet-format
    /// 2.4.0. Sort order is always SIGNED.
    UNDEFINED,
    /// An unknown but present column order. Statistics under an unknown
    /// column order are ignored.
    UNKNOWN,
}

impl ColumnOrder {
    /// Returns the sort order for a converted/physical type pair.
    pub fn get_sort_order(converted_type: ConvertedType, physical_type: Type) -> SortOrder {
        match converted_type {
            // Unsigned byte-wise comparison.
            ConvertedType::UTF8
            | ConvertedType::JSON
            | ConvertedType::BSON
            | ConvertedType::ENUM => SortOrder::UNSIGNED,

            ConvertedType::INT_8
            | ConvertedType::INT_16
            | ConvertedType::INT_32
            | ConvertedType::INT_64 => SortOrder::SIGNED,

            ConvertedType::UINT_8
            | ConvertedType::UINT_16
            | ConvertedType::UINT_32
            | ConvertedType::UINT_64 => SortOrder::UNSIGNED,

            // Signed comparison of the represented value.
            ConvertedType::DECIMAL | ConvertedType::DATE => SortOrder::SIGNED,

            ConvertedType::TIME_MILLIS
            | ConvertedType::TIME_MICROS
            | ConvertedType::TIMESTAMP_MILLIS
            | ConvertedType::TIMESTAMP_MICROS => SortOrder::SIGNED,

            ConvertedType::INTERVAL => SortOrder::UNKNOWN,

            ConvertedType::LIST | ConvertedType::MAP | ConvertedType::MAP_KEY_VALUE => {
                SortOrder::UNKNOWN
            }

            // Fall back to the physical type.
            ConvertedType::NONE => Self::get_default_sort_order(physical_type),
        }
    }

    /// Returns the default sort order for a physical type.
    fn get_default_sort_order(physical_type: Type) -> SortOrder {
        match physical_type {
            // Order: false, true
            Type::BOOLEAN => SortOrder::UNSIGNED,
            Type::INT32 | Type::INT64 => SortOrder::SIGNED,
            Type::INT96 => SortOrder::UNKNOWN,
            Type::FLOAT | Type::DOUBLE => SortOrder::SIGNED,
            // Unsigned byte-wise comparison.
            Type::BYTE_ARRAY | Type::FIXED_LEN_BYTE_ARRAY => SortOrder::UNSIGNED,
        }
    }

    /// Returns the sort order associated with this column order.
    pub fn sort_order(&self) -> SortOrder {
        match *self {
            ColumnOrder::TYPE_DEFINED_ORDER(order) => order,
            ColumnOrder::UNDEFINED => SortOrder::SIGNED,
            ColumnOrder::UNKNOWN => SortOrder::UNKNOWN,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl fmt::Display for ColumnOrder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_thrift_values() {
        assert_eq!(Type::BOOLEAN.as_i32(), 0);
        assert_eq!(Type::FIXED_LEN_BYTE_ARRAY.as_i32(), 7);
        assert_eq!(Type::try_from(2).unwrap(), Type::INT64);
        assert!(Type::try_from(42).is_err());
    }

    #[test]
    fn test_converted_type_offsets() {
        assert_eq!(ConvertedType::NONE.as_i32(), None);
        assert_eq!(ConvertedType::UTF8.as_i32(), Some(0));
        assert_eq!(ConvertedType::INTERVAL.as_i32(), Some(21));
        assert_eq!(ConvertedType::try_from(0).unwrap(), ConvertedType::UTF8);
    }

    #[test]
    fn test_sort_order_for_types() {
        assert_eq!(
            ColumnOrder::get_sort_order(ConvertedType::NONE, Type::INT32),
            SortOrder::SIGNED
        );
        assert_eq!(
            ColumnOrder::get_sort_order(ConvertedType::NONE, Type::BYTE_ARRAY),
            SortOrder::UNSIGNED
        );
        assert_eq!(
            ColumnOrder::get_sort_order(ConvertedType::UTF8, Type::BYTE_ARRAY),
            SortOrder::UNSIGNED
        );
        assert_eq!(
            ColumnOrder::get_sort_order(ConvertedType::UINT_32, Type::INT32),
            SortOrder::UNSIGNED
        );
        assert_eq!(
            ColumnOrder::get_sort_order(ConvertedType::NONE, Type::INT96),
            SortOrder::UNKNOWN
        );
    }

    #[test]
    fn test_column_order_sort_order() {
        assert_eq!(
            ColumnOrder::TYPE_DEFINED_ORDER(SortOrder::UNSIGNED).sort_order(),
            SortOrder::UNSIGNED
        );
        assert_eq!(ColumnOrder::UNDEFINED.sort_order(), SortOrder::SIGNED);
        assert_eq!(ColumnOrder::UNKNOWN.sort_order(), SortOrder::UNKNOWN);
    }
}
