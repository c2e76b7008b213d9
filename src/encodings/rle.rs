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

//! The RLE / bit-packed hybrid encoding used for definition and repetition
//! levels and for dictionary indices.
//!
//! The stream is a sequence of runs, each headed by a ULEB128 varint:
//! `header & 1 == 0` introduces an RLE run of `header >> 1` repetitions of a
//! single value stored in `ceil(bit_width / 8)` bytes; `header & 1 == 1`
//! introduces `header >> 1` groups of 8 bit-packed values. A trailing
//! bit-packed group may be padded; the padding values are never read.

use crate::errors::{ParquetError, Result};
use crate::util::bit_util::{ceil_bits_to_bytes, BitReader, BitWriter};

/// Encodes a complete value sequence with the RLE / bit-packed hybrid.
///
/// Runs of eight or more identical values become RLE runs; everything else
/// is collected into bit-packed groups. Encoding the full slice at once
/// keeps literal runs group-aligned without header back-patching.
pub fn rle_encode(values: &[u64], bit_width: u8) -> Vec<u8> {
    let mut writer = BitWriter::new();
    let value_bytes = ceil_bits_to_bytes(bit_width as usize).max(1);
    let mut pending: Vec<u64> = Vec::new();

    let flush_pending = |writer: &mut BitWriter, pending: &mut Vec<u64>| {
        if pending.is_empty() {
            return;
        }
        debug_assert_eq!(pending.len() % 8, 0);
        let groups = pending.len() / 8;
        write_vlq(writer, ((groups as u64) << 1) | 1);
        for v in pending.iter() {
            writer.put_value(*v, bit_width as usize);
        }
        writer.align_to_byte();
        pending.clear();
    };

    let mut i = 0;
    while i < values.len() {
        let mut run = 1;
        while i + run < values.len() && values[i + run] == values[i] {
            run += 1;
        }

        // round the pending literals up to a whole group before considering
        // an RLE run
        if !pending.is_empty() && pending.len() % 8 != 0 {
            let need = 8 - pending.len() % 8;
            let take = need.min(run);
            pending.extend(std::iter::repeat(values[i]).take(take));
            i += take;
            continue;
        }

        if run >= 8 {
            flush_pending(&mut writer, &mut pending);
            write_vlq(&mut writer, (run as u64) << 1);
            writer.put_aligned(values[i], value_bytes);
            i += run;
        } else {
            pending.extend(std::iter::repeat(values[i]).take(run));
            i += run;
        }
    }

    // pad the trailing group; padding is never decoded
    if !pending.is_empty() {
        while pending.len() % 8 != 0 {
            pending.push(0);
        }
        flush_pending(&mut writer, &mut pending);
    }

    writer.consume()
}

fn write_vlq(writer: &mut BitWriter, mut v: u64) {
    writer.align_to_byte();
    loop {
        if v > 0x7f {
            writer.put_aligned(v & 0x7f | 0x80, 1);
            v >>= 7;
        } else {
            writer.put_aligned(v, 1);
            return;
        }
    }
}

/// Worst-case encoded size for `num_values` values of `bit_width` bits:
/// every value in bit-packed groups plus per-group header room.
pub fn max_rle_buffer_size(bit_width: u8, num_values: usize) -> usize {
    let groups = num_values.div_ceil(8);
    // 2-byte headers cover up to 2^14 groups per run
    groups * bit_width as usize + 2 * groups.max(1)
}

enum Run {
    Rle { value: u64, remaining: usize },
    BitPacked { remaining: usize },
}

/// Decoder for the RLE / bit-packed hybrid.
pub struct RleDecoder<'a> {
    bit_width: u8,
    reader: BitReader<'a>,
    current: Option<Run>,
}

impl<'a> RleDecoder<'a> {
    /// Creates a decoder over `data` with the given bit width.
    pub fn new(data: &'a [u8], bit_width: u8) -> Self {
        Self {
            bit_width,
            reader: BitReader::new(data),
            current: None,
        }
    }

    fn next_run(&mut self) -> Result<()> {
        let header = self.reader.get_vlq_int()?;
        if header & 1 == 1 {
            self.current = Some(Run::BitPacked {
                remaining: (header >> 1) as usize * 8,
            });
        } else {
            let value_bytes = ceil_bits_to_bytes(self.bit_width as usize).max(1);
            let value = self
                .reader
                .get_aligned(value_bytes)
                .ok_or_else(|| eof_err!("unexpected end of RLE run"))?;
            self.current = Some(Run::Rle {
                value,
                remaining: (header >> 1) as usize,
            });
        }
        Ok(())
    }

    /// Decodes the next `num_values` values into a fresh vector.
    pub fn get_batch(&mut self, num_values: usize) -> Result<Vec<u64>> {
        let mut out = Vec::with_capacity(num_values);
        while out.len() < num_values {
            match self.current.as_mut() {
                None => self.next_run()?,
                Some(Run::Rle { value, remaining }) => {
                    let take = (*remaining).min(num_values - out.len());
                    out.extend(std::iter::repeat(*value).take(take));
                    *remaining -= take;
                    if *remaining == 0 {
                        self.current = None;
                    }
                }
                Some(Run::BitPacked { remaining }) => {
                    let take = (*remaining).min(num_values - out.len());
                    for _ in 0..take {
                        let v = self
                            .reader
                            .get_value(self.bit_width as usize)
                            .ok_or_else(|| eof_err!("unexpected end of bit-packed run"))?;
                        out.push(v);
                    }
                    *remaining -= take;
                    if *remaining == 0 {
                        // whole groups are byte aligned, so the reader now
                        // sits on the next run header
                        self.current = None;
                    }
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(values: &[u64], bit_width: u8) {
        let encoded = rle_encode(values, bit_width);
        let mut decoder = RleDecoder::new(&encoded, bit_width);
        let decoded = decoder.get_batch(values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_rle_runs() {
        roundtrip(&[1; 100], 1);
        roundtrip(&[5; 9], 3);
    }

    #[test]
    fn test_bit_packed_only() {
        let values: Vec<u64> = (0..100).map(|i| i % 7).collect();
        roundtrip(&values, 3);
    }

    #[test]
    fn test_mixed_runs() {
        let mut values = vec![0u64; 20];
        values.extend((0..13).map(|i| i % 5));
        values.extend(vec![3u64; 40]);
        values.push(1);
        roundtrip(&values, 3);
    }

    #[test]
    fn test_single_value() {
        roundtrip(&[2], 2);
    }

    #[test]
    fn test_empty() {
        let encoded = rle_encode(&[], 1);
        assert!(encoded.is_empty());
    }

    #[test]
    fn test_wide_values() {
        let values: Vec<u64> = (0..50).map(|i| i * 1000).collect();
        roundtrip(&values, 16);
    }
}
