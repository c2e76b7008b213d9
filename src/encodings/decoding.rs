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

//! Value decoders for the read path.

use crate::basic::Encoding;
use crate::column::page::Page;
use crate::data_type::{decode_plain_values, DataType, ParquetValueType};
use crate::encodings::levels::decode_rle_levels;
use crate::encodings::rle::RleDecoder;
use crate::errors::{ParquetError, Result};
use crate::schema::types::ColumnDescriptor;

/// Decodes the dictionary page of a column chunk into its values.
pub fn decode_dictionary_page<T: DataType>(page: &Page) -> Result<Vec<T::T>> {
    match page {
        Page::DictionaryPage {
            buf, num_values, ..
        } => decode_plain_values::<T::T>(buf, *num_values as usize),
        _ => Err(general_err!("expected a dictionary page")),
    }
}

/// Decoded content of one v1 data page.
pub struct DecodedDataPage<T: ParquetValueType> {
    /// Definition levels, one per value slot; empty for required columns.
    pub def_levels: Vec<i16>,
    /// Repetition levels; empty for non-repeated columns.
    pub rep_levels: Vec<i16>,
    /// The non-null values.
    pub values: Vec<T>,
}

/// Decodes a v1 data page: repetition levels, definition levels, then the
/// values in either PLAIN or dictionary encoding.
pub fn decode_data_page<T: DataType>(
    page: &Page,
    descr: &ColumnDescriptor,
    dictionary: Option<&[T::T]>,
) -> Result<DecodedDataPage<T::T>> {
    let (buf, num_values, encoding) = match page {
        Page::DataPage {
            buf,
            num_values,
            encoding,
            ..
        } => (buf, *num_values as usize, *encoding),
        _ => return Err(general_err!("expected a data page")),
    };

    let mut offset = 0;
    let mut rep_levels = Vec::new();
    let mut def_levels = Vec::new();

    if descr.max_rep_level() > 0 {
        let (levels, consumed) =
            decode_rle_levels(&buf[offset..], num_values, descr.max_rep_level())?;
        rep_levels = levels;
        offset += consumed;
    }
    if descr.max_def_level() > 0 {
        let (levels, consumed) =
            decode_rle_levels(&buf[offset..], num_values, descr.max_def_level())?;
        def_levels = levels;
        offset += consumed;
    }

    let num_non_null = if def_levels.is_empty() {
        num_values
    } else {
        def_levels
            .iter()
            .filter(|l| **l == descr.max_def_level())
            .count()
    };

    let values = match encoding {
        Encoding::PLAIN => decode_plain_values::<T::T>(&buf[offset..], num_non_null)?,
        Encoding::PLAIN_DICTIONARY | Encoding::RLE_DICTIONARY => {
            let dictionary = dictionary
                .ok_or_else(|| general_err!("dictionary-encoded page without a dictionary"))?;
            let data = &buf[offset..];
            let bit_width = *data
                .first()
                .ok_or_else(|| eof_err!("missing dictionary index bit width"))?;
            let mut decoder = RleDecoder::new(&data[1..], bit_width);
            decoder
                .get_batch(num_non_null)?
                .into_iter()
                .map(|index| {
                    dictionary
                        .get(index as usize)
                        .cloned()
                        .ok_or_else(|| general_err!("dictionary index {} out of range", index))
                })
                .collect::<Result<Vec<_>>>()?
        }
        other => return Err(nyi_err!("unsupported data page encoding {}", other)),
    };

    Ok(DecodedDataPage {
        def_levels,
        rep_levels,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::Int32Type;
    use bytes::Bytes;

    #[test]
    fn test_decode_plain_data_page() {
        use crate::basic::{Repetition, Type as PhysicalType};
        use crate::schema::types::{ColumnPath, Type};
        use std::sync::Arc;

        let leaf = Arc::new(
            Type::primitive_type_builder("v", PhysicalType::INT32)
                .with_repetition(Repetition::REQUIRED)
                .build()
                .unwrap(),
        );
        let descr = ColumnDescriptor::new(leaf, 0, 0, ColumnPath::from("v"));

        let mut body = Vec::new();
        for v in [4i32, 5, 6] {
            crate::data_type::ParquetValueType::encode_plain(&v, &mut body);
        }
        let page = Page::DataPage {
            buf: Bytes::from(body),
            num_values: 3,
            encoding: Encoding::PLAIN,
            def_level_encoding: Encoding::RLE,
            rep_level_encoding: Encoding::RLE,
            statistics: None,
        };
        let decoded = decode_data_page::<Int32Type>(&page, &descr, None).unwrap();
        assert_eq!(decoded.values, vec![4, 5, 6]);
        assert!(decoded.def_levels.is_empty());
    }
}
