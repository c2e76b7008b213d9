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

//! Data types that connect the physical Parquet types with their Rust-native
//! representations.

use std::cmp::Ordering;
use std::fmt;

use bytes::Bytes;

use crate::basic::Type;
use crate::errors::{ParquetError, Result};

/// Byte array representation. Keeps a reference-counted buffer, so cloning is
/// cheap.
#[derive(Clone, Default)]
pub struct ByteArray {
    data: Bytes,
}

impl ByteArray {
    /// Creates a new empty byte array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the length of the underlying byte buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the slice of data in this byte array.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the UTF-8 string view of the data, when valid.
    pub fn as_utf8(&self) -> Result<&str> {
        std::str::from_utf8(self.data()).map_err(|e| e.into())
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(buf: Vec<u8>) -> ByteArray {
        Self { data: buf.into() }
    }
}

impl From<&[u8]> for ByteArray {
    fn from(b: &[u8]) -> ByteArray {
        Self {
            data: Bytes::copy_from_slice(b),
        }
    }
}

impl From<&str> for ByteArray {
    fn from(s: &str) -> ByteArray {
        Self {
            data: Bytes::copy_from_slice(s.as_bytes()),
        }
    }
}

impl From<Bytes> for ByteArray {
    fn from(data: Bytes) -> ByteArray {
        Self { data }
    }
}

impl PartialEq for ByteArray {
    fn eq(&self, other: &ByteArray) -> bool {
        self.data() == other.data()
    }
}

impl PartialOrd for ByteArray {
    fn partial_cmp(&self, other: &ByteArray) -> Option<Ordering> {
        // byte arrays compare unsigned byte-wise
        self.data().partial_cmp(other.data())
    }
}

impl fmt::Debug for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ByteArray({:?})", self.data())
    }
}

impl fmt::Display for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.as_utf8() {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "{:?}", self.data()),
        }
    }
}

/// A native value that can be stored in a Parquet leaf column.
pub trait ParquetValueType: Clone + Default + fmt::Debug + PartialEq + PartialOrd + 'static {
    /// The physical type of this value.
    const PHYSICAL_TYPE: Type;

    /// Appends the PLAIN page encoding of `self` to `buf` (byte arrays carry
    /// their little-endian u32 length prefix).
    fn encode_plain(&self, buf: &mut Vec<u8>);

    /// The statistics encoding of `self`: PLAIN, except that byte arrays omit
    /// the length prefix.
    fn stat_bytes(&self) -> Vec<u8>;

    /// Decodes a single PLAIN encoded value from the front of `buf`, returning
    /// the value and the number of bytes consumed.
    fn decode_plain(buf: &[u8]) -> Result<(Self, usize)>;

    /// Ordering used when aggregating statistics. `None` for incomparable
    /// values (NaN), which are ignored by min/max updates.
    fn compare(&self, other: &Self) -> Option<Ordering> {
        self.partial_cmp(other)
    }
}

macro_rules! impl_fixed_value_type {
    ($ty:ty, $physical:expr, $size:literal) => {
        impl ParquetValueType for $ty {
            const PHYSICAL_TYPE: Type = $physical;

            fn encode_plain(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_le_bytes());
            }

            fn stat_bytes(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn decode_plain(buf: &[u8]) -> Result<(Self, usize)> {
                let bytes = buf
                    .get(..$size)
                    .ok_or_else(|| eof_err!("not enough bytes to decode PLAIN value"))?;
                Ok((<$ty>::from_le_bytes(bytes.try_into().unwrap()), $size))
            }
        }
    };
}

impl_fixed_value_type!(i32, Type::INT32, 4);
impl_fixed_value_type!(i64, Type::INT64, 8);
impl_fixed_value_type!(f32, Type::FLOAT, 4);
impl_fixed_value_type!(f64, Type::DOUBLE, 8);

impl ParquetValueType for ByteArray {
    const PHYSICAL_TYPE: Type = Type::BYTE_ARRAY;

    fn encode_plain(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.data());
    }

    fn stat_bytes(&self) -> Vec<u8> {
        self.data().to_vec()
    }

    fn decode_plain(buf: &[u8]) -> Result<(Self, usize)> {
        let len_bytes = buf
            .get(..4)
            .ok_or_else(|| eof_err!("not enough bytes to decode byte array length"))?;
        let len = u32::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
        let data = buf
            .get(4..4 + len)
            .ok_or_else(|| eof_err!("not enough bytes to decode byte array"))?;
        Ok((ByteArray::from(data), 4 + len))
    }
}

/// Contains the Parquet physical type information as well as the Rust value
/// type. The column writer and the decoders are parameterized over this trait.
pub trait DataType: 'static {
    /// The native value type.
    type T: ParquetValueType;

    /// Returns the physical type for this data type.
    fn get_physical_type() -> Type {
        Self::T::PHYSICAL_TYPE
    }
}

macro_rules! make_datatype {
    ($name:ident, $native_ty:ty) => {
        #[doc = concat!("Marker type for `", stringify!($native_ty), "` columns.")]
        #[derive(Clone, Debug)]
        pub struct $name;

        impl DataType for $name {
            type T = $native_ty;
        }
    };
}

make_datatype!(Int32Type, i32);
make_datatype!(Int64Type, i64);
make_datatype!(FloatType, f32);
make_datatype!(DoubleType, f64);
make_datatype!(ByteArrayType, ByteArray);

/// Decodes `num_values` PLAIN encoded values from `buf`.
pub fn decode_plain_values<T: ParquetValueType>(buf: &[u8], num_values: usize) -> Result<Vec<T>> {
    let mut values = Vec::with_capacity(num_values);
    let mut offset = 0;
    for _ in 0..num_values {
        let (value, consumed) = T::decode_plain(&buf[offset..])?;
        values.push(value);
        offset += consumed;
    }
    if offset > buf.len() {
        return Err(ParquetError::EOF("PLAIN values overran buffer".to_owned()));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_roundtrip_i32() {
        let mut buf = Vec::new();
        for v in [1i32, -5, 0, i32::MAX] {
            v.encode_plain(&mut buf);
        }
        let decoded: Vec<i32> = decode_plain_values(&buf, 4).unwrap();
        assert_eq!(decoded, vec![1, -5, 0, i32::MAX]);
    }

    #[test]
    fn test_plain_roundtrip_byte_array() {
        let mut buf = Vec::new();
        ByteArray::from("hello").encode_plain(&mut buf);
        ByteArray::from("").encode_plain(&mut buf);
        let decoded: Vec<ByteArray> = decode_plain_values(&buf, 2).unwrap();
        assert_eq!(decoded[0].as_utf8().unwrap(), "hello");
        assert!(decoded[1].is_empty());
    }

    #[test]
    fn test_stat_bytes_omits_length_prefix() {
        assert_eq!(ByteArray::from("abc").stat_bytes(), b"abc".to_vec());
        assert_eq!(7i32.stat_bytes(), vec![7, 0, 0, 0]);
    }

    #[test]
    fn test_nan_is_incomparable() {
        assert_eq!(f64::NAN.compare(&1.0), None);
        assert_eq!(1.0f64.compare(&2.0), Some(Ordering::Less));
    }
}
