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

//! Value encoders feeding the column writer.
//!
//! Encoders are opaque producers of byte buffers: values go in through
//! [`Encoder::put`], encoded pages come out of [`Encoder::flush_values`].
//! The dictionary encoder is reachable through [`Encoder::as_dictionary`],
//! replacing the dynamic downcast of the original design with a tagged
//! narrowing.

use std::collections::HashMap;

use bytes::Bytes;

use crate::data_type::DataType;
use crate::encodings::rle::rle_encode;
use crate::errors::{ParquetError, Result};
use crate::util::bit_util::num_required_bits;

/// Write-side value encoder for one column chunk.
pub trait Encoder<T: DataType> {
    /// Buffers a batch of values.
    fn put(&mut self, values: &[T::T]) -> Result<()>;

    /// Size in bytes the buffered values would occupy once encoded.
    fn estimated_data_encoded_size(&self) -> usize;

    /// Encodes and returns the buffered values, resetting the buffer.
    fn flush_values(&mut self) -> Result<Bytes>;

    /// Narrows this encoder to the dictionary encoder, when it is one.
    fn as_dictionary(&self) -> Option<&DictEncoder<T>>;
}

/// PLAIN encoder: values are laid out back to back in their little-endian
/// (or length-prefixed, for byte arrays) form.
pub struct PlainEncoder<T: DataType> {
    buffer: Vec<u8>,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: DataType> PlainEncoder<T> {
    /// Creates a new PLAIN encoder.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: DataType> Default for PlainEncoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DataType> Encoder<T> for PlainEncoder<T> {
    fn put(&mut self, values: &[T::T]) -> Result<()> {
        for value in values {
            crate::data_type::ParquetValueType::encode_plain(value, &mut self.buffer);
        }
        Ok(())
    }

    fn estimated_data_encoded_size(&self) -> usize {
        self.buffer.len()
    }

    fn flush_values(&mut self) -> Result<Bytes> {
        Ok(std::mem::take(&mut self.buffer).into())
    }

    fn as_dictionary(&self) -> Option<&DictEncoder<T>> {
        None
    }
}

/// Dictionary encoder: interns values and emits their indices, RLE/bit-packed
/// with a leading bit-width byte. The dictionary page itself is written
/// PLAIN through [`DictEncoder::write_dict`].
pub struct DictEncoder<T: DataType> {
    // values in first-seen order, and their PLAIN encodings
    uniques: Vec<T::T>,
    // interner keyed on the PLAIN encoding, which is cheap and hashable for
    // every physical type including floats
    dedup: HashMap<Vec<u8>, u32>,
    dict_encoded_size: usize,
    indices: Vec<u32>,
}

impl<T: DataType> DictEncoder<T> {
    /// Creates a new dictionary encoder.
    pub fn new() -> Self {
        Self {
            uniques: Vec::new(),
            dedup: HashMap::new(),
            dict_encoded_size: 0,
            indices: Vec::new(),
        }
    }

    /// Number of distinct values interned so far.
    pub fn num_entries(&self) -> usize {
        self.uniques.len()
    }

    /// Size in bytes of the PLAIN-encoded dictionary.
    pub fn dict_encoded_size(&self) -> usize {
        self.dict_encoded_size
    }

    /// PLAIN-encodes the dictionary in first-seen order.
    pub fn write_dict(&self) -> Result<Bytes> {
        let mut buffer = Vec::with_capacity(self.dict_encoded_size);
        for value in &self.uniques {
            crate::data_type::ParquetValueType::encode_plain(value, &mut buffer);
        }
        Ok(buffer.into())
    }

    fn bit_width(&self) -> u8 {
        num_required_bits(self.uniques.len().saturating_sub(1) as u64)
    }
}

impl<T: DataType> Default for DictEncoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DataType> Encoder<T> for DictEncoder<T> {
    fn put(&mut self, values: &[T::T]) -> Result<()> {
        for value in values {
            let mut key = Vec::new();
            crate::data_type::ParquetValueType::encode_plain(value, &mut key);
            let key_len = key.len();
            let next_index = self.uniques.len() as u32;
            let index = *self.dedup.entry(key).or_insert(next_index);
            if index == next_index {
                self.uniques.push(value.clone());
                self.dict_encoded_size += key_len;
            }
            self.indices.push(index);
        }
        Ok(())
    }

    fn estimated_data_encoded_size(&self) -> usize {
        1 + (self.indices.len() * self.bit_width() as usize).div_ceil(8)
    }

    fn flush_values(&mut self) -> Result<Bytes> {
        let bit_width = self.bit_width();
        let values: Vec<u64> = self.indices.iter().map(|i| *i as u64).collect();
        self.indices.clear();
        let mut out = vec![bit_width];
        out.extend_from_slice(&rle_encode(&values, bit_width));
        Ok(out.into())
    }

    fn as_dictionary(&self) -> Option<&DictEncoder<T>> {
        Some(self)
    }
}

/// Creates the encoder for a column: the dictionary encoder when dictionary
/// encoding is in use, otherwise an encoder for the requested encoding.
pub fn make_encoder<T: DataType>(
    encoding: crate::basic::Encoding,
    use_dictionary: bool,
) -> Result<Box<dyn Encoder<T>>> {
    if use_dictionary {
        return Ok(Box::new(DictEncoder::<T>::new()));
    }
    match encoding {
        crate::basic::Encoding::PLAIN => Ok(Box::new(PlainEncoder::<T>::new())),
        other => Err(nyi_err!("encoding {} is not supported", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::{ByteArray, ByteArrayType, Int32Type};

    #[test]
    fn test_plain_encoder() {
        let mut encoder = PlainEncoder::<Int32Type>::new();
        encoder.put(&[1, 2, 3]).unwrap();
        assert_eq!(encoder.estimated_data_encoded_size(), 12);
        let buf = encoder.flush_values().unwrap();
        assert_eq!(buf.as_ref(), &[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
        assert_eq!(encoder.estimated_data_encoded_size(), 0);
    }

    #[test]
    fn test_dict_encoder_interns() {
        let mut encoder = DictEncoder::<Int32Type>::new();
        encoder.put(&[7, 7, 8, 7]).unwrap();
        assert_eq!(encoder.num_entries(), 2);
        assert_eq!(encoder.dict_encoded_size(), 8);
        let dict = encoder.write_dict().unwrap();
        assert_eq!(dict.as_ref(), &[7, 0, 0, 0, 8, 0, 0, 0]);
    }

    #[test]
    fn test_dict_encoder_byte_arrays() {
        let mut encoder = DictEncoder::<ByteArrayType>::new();
        encoder
            .put(&[
                ByteArray::from("aa"),
                ByteArray::from("bb"),
                ByteArray::from("aa"),
            ])
            .unwrap();
        assert_eq!(encoder.num_entries(), 2);
        // 4-byte length prefix plus the bytes, per entry
        assert_eq!(encoder.dict_encoded_size(), 12);
    }

    #[test]
    fn test_dict_indices_roundtrip() {
        use crate::encodings::rle::RleDecoder;
        let mut encoder = DictEncoder::<Int32Type>::new();
        encoder.put(&[5, 6, 5, 7, 5, 6]).unwrap();
        let buf = encoder.flush_values().unwrap();
        let bit_width = buf[0];
        assert_eq!(bit_width, 2);
        let mut decoder = RleDecoder::new(&buf[1..], bit_width);
        assert_eq!(decoder.get_batch(6).unwrap(), vec![0, 1, 0, 2, 0, 1]);
    }

    #[test]
    fn test_make_encoder_narrowing() {
        let dict = make_encoder::<Int32Type>(crate::basic::Encoding::PLAIN, true).unwrap();
        assert!(dict.as_dictionary().is_some());
        let plain = make_encoder::<Int32Type>(crate::basic::Encoding::PLAIN, false).unwrap();
        assert!(plain.as_dictionary().is_none());
    }
}
