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

//! Definition and repetition level encoding for v1 data pages: RLE data
//! preceded by its little-endian u32 byte length.

use crate::encodings::rle::{rle_encode, RleDecoder};
use crate::errors::{ParquetError, Result};
use crate::util::bit_util::num_required_bits;

/// Encodes `levels` with the RLE hybrid and the v1 length prefix.
pub fn encode_rle_levels(levels: &[i16], max_level: i16) -> Vec<u8> {
    let bit_width = num_required_bits(max_level as u64);
    let values: Vec<u64> = levels.iter().map(|l| *l as u64).collect();
    let encoded = rle_encode(&values, bit_width);
    let mut out = Vec::with_capacity(4 + encoded.len());
    out.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
    out.extend_from_slice(&encoded);
    out
}

/// Decodes `num_levels` levels from a v1 length-prefixed RLE section,
/// returning the levels and the number of bytes consumed.
pub fn decode_rle_levels(buf: &[u8], num_levels: usize, max_level: i16) -> Result<(Vec<i16>, usize)> {
    let len_bytes = buf
        .get(..4)
        .ok_or_else(|| eof_err!("not enough bytes for level length prefix"))?;
    let rle_len = u32::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
    let rle_data = buf
        .get(4..4 + rle_len)
        .ok_or_else(|| eof_err!("level data extends past the page"))?;

    let bit_width = num_required_bits(max_level as u64);
    let mut decoder = RleDecoder::new(rle_data, bit_width);
    let levels = decoder
        .get_batch(num_levels)?
        .into_iter()
        .map(|v| v as i16)
        .collect();
    Ok((levels, 4 + rle_len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_roundtrip() {
        let levels: Vec<i16> = vec![1, 1, 0, 1, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1];
        let encoded = encode_rle_levels(&levels, 1);
        let (decoded, consumed) = decode_rle_levels(&encoded, levels.len(), 1).unwrap();
        assert_eq!(decoded, levels);
        assert_eq!(consumed, encoded.len());
    }

    #[test]
    fn test_level_roundtrip_wide() {
        let levels: Vec<i16> = (0..1000).map(|i| (i % 4) as i16).collect();
        let encoded = encode_rle_levels(&levels, 3);
        let (decoded, _) = decode_rle_levels(&encoded, levels.len(), 3).unwrap();
        assert_eq!(decoded, levels);
    }
}
