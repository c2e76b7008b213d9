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

//! Block compression codecs for page data.
//!
//! A codec is an opaque byte-stream transform: `compress` appends the
//! compressed form of `input` to `output`, `decompress` appends the
//! decompressed form and returns the number of bytes produced.

use std::io::{Read, Write};

use crate::basic::Compression;
use crate::errors::{ParquetError, Result};

/// Parquet compression codec interface.
pub trait Codec: Send {
    /// Compresses data stored in slice `input` and appends the compressed
    /// result to `output`.
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;

    /// Decompresses data stored in slice `input` and appends output to
    /// `output`, returning the number of bytes appended.
    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize>;
}

/// Given the compression type `codec`, returns a codec used to compress and
/// decompress bytes, or `None` for [`Compression::UNCOMPRESSED`].
pub fn create_codec(codec: Compression) -> Result<Option<Box<dyn Codec>>> {
    match codec {
        Compression::UNCOMPRESSED => Ok(None),
        Compression::SNAPPY => Ok(Some(Box::new(SnappyCodec::new()))),
        Compression::GZIP => Ok(Some(Box::new(GZipCodec::new()))),
        Compression::ZSTD => Ok(Some(Box::new(ZstdCodec::new()))),
        codec => Err(nyi_err!("The codec {} is not supported", codec)),
    }
}

/// Codec for Snappy compression format.
pub struct SnappyCodec {
    decoder: snap::raw::Decoder,
    encoder: snap::raw::Encoder,
}

impl SnappyCodec {
    fn new() -> Self {
        Self {
            decoder: snap::raw::Decoder::new(),
            encoder: snap::raw::Encoder::new(),
        }
    }
}

impl Codec for SnappyCodec {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        let required_len = snap::raw::max_compress_len(input.len());
        let start = output.len();
        output.resize(start + required_len, 0);
        let n = self.encoder.compress(input, &mut output[start..])?;
        output.truncate(start + n);
        Ok(())
    }

    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let len = snap::raw::decompress_len(input)?;
        let start = output.len();
        output.resize(start + len, 0);
        self.decoder
            .decompress(input, &mut output[start..])
            .map_err(|e| e.into())
    }
}

/// Codec for GZIP compression algorithm.
pub struct GZipCodec {}

impl GZipCodec {
    fn new() -> Self {
        Self {}
    }
}

impl Codec for GZipCodec {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        encoder.write_all(input)?;
        encoder.try_finish().map_err(|e| e.into())
    }

    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let mut decoder = flate2::read::GzDecoder::new(input);
        decoder.read_to_end(output).map_err(|e| e.into())
    }
}

/// Codec for Zstandard compression algorithm.
pub struct ZstdCodec {}

impl ZstdCodec {
    fn new() -> Self {
        Self {}
    }
}

impl Codec for ZstdCodec {
    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        let mut encoder = zstd::Encoder::new(output, zstd::DEFAULT_COMPRESSION_LEVEL)
            .map_err(ParquetError::from)?;
        encoder.write_all(input)?;
        encoder.finish()?;
        Ok(())
    }

    fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<usize> {
        let mut decoder = zstd::Decoder::new(input)?;
        decoder.read_to_end(output).map_err(|e| e.into())
    }
}
