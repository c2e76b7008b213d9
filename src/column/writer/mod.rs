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

//! Typed column writer: buffers values and levels, cuts pages, and drives
//! the dictionary-fallback state machine.
//!
//! While dictionary encoding is active, finished data pages are held in
//! memory rather than flushed, so that the single dictionary page can
//! precede them in the file. When the dictionary outgrows its size limit the
//! writer emits the dictionary page, flushes the buffered pages, switches to
//! PLAIN encoding and streams every subsequent page directly.

use bytes::Bytes;

use crate::basic::Encoding;
use crate::column::page::{CompressedDataPage, DictionaryPage, PageWriter};
use crate::data_type::{
    ByteArrayType, DataType, DoubleType, FloatType, Int32Type, Int64Type,
};
use crate::encodings::encoding::{make_encoder, Encoder};
use crate::encodings::levels::encode_rle_levels;
use crate::errors::{ParquetError, Result};
use crate::file::metadata::ColumnChunkMetaDataBuilder;
use crate::file::properties::WriterPropertiesPtr;
use crate::file::statistics::{EncodedStatistics, ValueStatistics};
use crate::schema::types::ColumnDescPtr;

/// Column writer for a Parquet physical type.
pub enum ColumnWriter<'a> {
    /// Writer for INT32 columns.
    Int32ColumnWriter(ColumnWriterImpl<'a, Int32Type>),
    /// Writer for INT64 columns.
    Int64ColumnWriter(ColumnWriterImpl<'a, Int64Type>),
    /// Writer for FLOAT columns.
    FloatColumnWriter(ColumnWriterImpl<'a, FloatType>),
    /// Writer for DOUBLE columns.
    DoubleColumnWriter(ColumnWriterImpl<'a, DoubleType>),
    /// Writer for BYTE_ARRAY columns.
    ByteArrayColumnWriter(ColumnWriterImpl<'a, ByteArrayType>),
}

impl<'a> ColumnWriter<'a> {
    pub(crate) fn close(self) -> Result<(u64, i64, ColumnChunkMetaDataBuilder)> {
        match self {
            ColumnWriter::Int32ColumnWriter(w) => w.close(),
            ColumnWriter::Int64ColumnWriter(w) => w.close(),
            ColumnWriter::FloatColumnWriter(w) => w.close(),
            ColumnWriter::DoubleColumnWriter(w) => w.close(),
            ColumnWriter::ByteArrayColumnWriter(w) => w.close(),
        }
    }
}

/// Physical types that have a column writer variant; provides the projection
/// from the type-erased [`ColumnWriter`] back to the typed implementation.
pub trait ColumnWriterType: DataType + Sized {
    /// Projects the writer enum onto this type's implementation.
    fn project<'s, 'a>(writer: &'s mut ColumnWriter<'a>)
        -> Option<&'s mut ColumnWriterImpl<'a, Self>>;
}

macro_rules! impl_column_writer_type {
    ($ty:ident, $variant:ident) => {
        impl ColumnWriterType for $ty {
            fn project<'s, 'a>(
                writer: &'s mut ColumnWriter<'a>,
            ) -> Option<&'s mut ColumnWriterImpl<'a, Self>> {
                match writer {
                    ColumnWriter::$variant(w) => Some(w),
                    _ => None,
                }
            }
        }
    };
}

impl_column_writer_type!(Int32Type, Int32ColumnWriter);
impl_column_writer_type!(Int64Type, Int64ColumnWriter);
impl_column_writer_type!(FloatType, FloatColumnWriter);
impl_column_writer_type!(DoubleType, DoubleColumnWriter);
impl_column_writer_type!(ByteArrayType, ByteArrayColumnWriter);

/// Creates the column writer for the column's physical type.
pub(crate) fn get_column_writer<'a>(
    descr: ColumnDescPtr,
    props: WriterPropertiesPtr,
    pager: Box<dyn PageWriter + 'a>,
) -> Result<ColumnWriter<'a>> {
    use crate::basic::Type as PhysicalType;
    Ok(match descr.physical_type() {
        PhysicalType::INT32 => {
            ColumnWriter::Int32ColumnWriter(ColumnWriterImpl::new(descr, props, pager)?)
        }
        PhysicalType::INT64 => {
            ColumnWriter::Int64ColumnWriter(ColumnWriterImpl::new(descr, props, pager)?)
        }
        PhysicalType::FLOAT => {
            ColumnWriter::FloatColumnWriter(ColumnWriterImpl::new(descr, props, pager)?)
        }
        PhysicalType::DOUBLE => {
            ColumnWriter::DoubleColumnWriter(ColumnWriterImpl::new(descr, props, pager)?)
        }
        PhysicalType::BYTE_ARRAY => {
            ColumnWriter::ByteArrayColumnWriter(ColumnWriterImpl::new(descr, props, pager)?)
        }
        other => return Err(nyi_err!("column writer for type {} is not implemented", other)),
    })
}

/// Typed writer for one column chunk.
pub struct ColumnWriterImpl<'a, T: DataType> {
    descr: ColumnDescPtr,
    props: WriterPropertiesPtr,
    pager: Box<dyn PageWriter + 'a>,
    has_dictionary: bool,
    // value encoding recorded in data page headers; switches to PLAIN on
    // dictionary fallback
    encoding: Encoding,
    encoder: Box<dyn Encoder<T>>,
    def_levels_sink: Vec<i16>,
    rep_levels_sink: Vec<i16>,
    // level slots buffered for the current page (values plus nulls)
    num_buffered_values: usize,
    rows_written: i64,
    total_bytes_written: u64,
    // compressed bytes held in buffered pages while dictionary encoding is
    // active
    total_compressed_bytes: i64,
    data_pages: Vec<CompressedDataPage>,
    page_statistics: Option<ValueStatistics<T::T>>,
    chunk_statistics: Option<ValueStatistics<T::T>>,
    closed: bool,
    fallback: bool,
}

impl<'a, T: DataType> ColumnWriterImpl<'a, T> {
    pub(crate) fn new(
        descr: ColumnDescPtr,
        props: WriterPropertiesPtr,
        pager: Box<dyn PageWriter + 'a>,
    ) -> Result<Self> {
        let has_dictionary = props.dictionary_enabled(descr.path());
        let encoding = if has_dictionary {
            props.dictionary_index_encoding()
        } else {
            props.encoding(descr.path())
        };
        let encoder = make_encoder::<T>(props.encoding(descr.path()), has_dictionary)?;

        let statistics_enabled = props.statistics_enabled(descr.path())
            && descr.sort_order() != crate::basic::SortOrder::UNKNOWN;
        let (page_statistics, chunk_statistics) = if statistics_enabled {
            (
                Some(ValueStatistics::default()),
                Some(ValueStatistics::default()),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            descr,
            props,
            pager,
            has_dictionary,
            encoding,
            encoder,
            def_levels_sink: Vec::new(),
            rep_levels_sink: Vec::new(),
            num_buffered_values: 0,
            rows_written: 0,
            total_bytes_written: 0,
            total_compressed_bytes: 0,
            data_pages: Vec::new(),
            page_statistics,
            chunk_statistics,
            closed: false,
            fallback: false,
        })
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> i64 {
        self.rows_written
    }

    /// Whether the dictionary fell back to PLAIN encoding.
    pub fn fallback_occurred(&self) -> bool {
        self.fallback
    }

    /// Writes a batch of values with optional definition and repetition
    /// levels, returning the number of non-null values consumed.
    ///
    /// `values` holds only the non-null values; `def_levels` must be given
    /// for optional or repeated columns and `rep_levels` for repeated
    /// columns, one level per value slot.
    pub fn write_batch(
        &mut self,
        values: &[T::T],
        def_levels: Option<&[i16]>,
        rep_levels: Option<&[i16]>,
    ) -> Result<usize> {
        if self.closed {
            return Err(ParquetError::BuilderMisuse(format!(
                "column writer for '{}' was used after close",
                self.descr.path()
            )));
        }
        // Page size limits are only checked between mini batches; chunking
        // bounds how far a huge batch can overshoot them.
        let batch_size = self.props.write_batch_size();
        let num_levels = def_levels.map(|d| d.len()).unwrap_or(values.len());

        let mut values_offset = 0;
        let mut levels_offset = 0;
        while levels_offset < num_levels {
            let take = batch_size.min(num_levels - levels_offset);
            values_offset += self.write_mini_batch(
                &values[values_offset..],
                def_levels.map(|d| &d[levels_offset..levels_offset + take]),
                rep_levels.map(|r| &r[levels_offset..levels_offset + take]),
                take,
            )?;
            levels_offset += take;
        }
        Ok(values_offset)
    }

    fn write_mini_batch(
        &mut self,
        values: &[T::T],
        def_levels: Option<&[i16]>,
        rep_levels: Option<&[i16]>,
        num_levels: usize,
    ) -> Result<usize> {
        let max_def_level = self.descr.max_def_level();
        let max_rep_level = self.descr.max_rep_level();

        let values_to_write = match def_levels {
            Some(def_levels) => {
                let count = def_levels.iter().filter(|l| **l == max_def_level).count();
                self.def_levels_sink.extend_from_slice(def_levels);
                count
            }
            None => {
                if max_def_level > 0 {
                    return Err(general_err!(
                        "definition levels are required for column '{}'",
                        self.descr.path()
                    ));
                }
                num_levels
            }
        };

        match rep_levels {
            Some(rep_levels) => {
                // a new row starts wherever the repetition level drops to 0
                self.rows_written += rep_levels.iter().filter(|l| **l == 0).count() as i64;
                self.rep_levels_sink.extend_from_slice(rep_levels);
            }
            None => {
                if max_rep_level > 0 {
                    return Err(general_err!(
                        "repetition levels are required for column '{}'",
                        self.descr.path()
                    ));
                }
                self.rows_written += num_levels as i64;
            }
        }

        if values.len() < values_to_write {
            return Err(general_err!(
                "expected at least {} values, got {}",
                values_to_write,
                values.len()
            ));
        }
        let values = &values[..values_to_write];
        self.encoder.put(values)?;
        if let Some(stats) = self.page_statistics.as_mut() {
            stats.update(values, (num_levels - values_to_write) as i64);
        }
        self.num_buffered_values += num_levels;

        if self.encoder.estimated_data_encoded_size() >= self.props.data_page_size_limit() {
            self.add_data_page()?;
        }
        if self.has_dictionary && !self.fallback {
            self.check_dictionary_size_limit()?;
        }

        Ok(values_to_write)
    }

    // Cuts a page from the buffered levels and values. While dictionary
    // encoding is active the page is held back; otherwise it streams out.
    fn add_data_page(&mut self) -> Result<()> {
        let values_buf = self.encoder.flush_values()?;

        let mut page_buf = Vec::new();
        if self.descr.max_rep_level() > 0 {
            page_buf.extend(encode_rle_levels(
                &self.rep_levels_sink,
                self.descr.max_rep_level(),
            ));
        }
        if self.descr.max_def_level() > 0 {
            page_buf.extend(encode_rle_levels(
                &self.def_levels_sink,
                self.descr.max_def_level(),
            ));
        }
        page_buf.extend_from_slice(&values_buf);
        let uncompressed_size = page_buf.len();

        let statistics = match self.page_statistics.as_mut() {
            Some(page_stats) => {
                let mut encoded = page_stats.encode();
                encoded.apply_stat_size_limits(self.props.max_statistics_size(self.descr.path()));
                encoded.set_is_signed(self.descr.sort_order().is_signed());
                if let Some(chunk_stats) = self.chunk_statistics.as_mut() {
                    chunk_stats.merge(page_stats);
                }
                page_stats.reset();
                encoded
            }
            None => EncodedStatistics::default(),
        };

        let compressed: Bytes = if self.pager.has_compressor() {
            let mut out = Vec::new();
            self.pager.compress(&page_buf, &mut out)?;
            out.into()
        } else {
            page_buf.into()
        };

        let page = CompressedDataPage::new(
            compressed,
            self.num_buffered_values as u32,
            self.encoding,
            Encoding::RLE,
            Encoding::RLE,
            uncompressed_size,
            statistics,
        );

        if self.has_dictionary && !self.fallback {
            // hold pages until the dictionary page can precede them
            self.total_compressed_bytes += page.size() as i64;
            self.data_pages.push(page);
        } else {
            self.total_bytes_written += self.pager.write_data_page(&page)?;
        }

        self.rep_levels_sink.clear();
        self.def_levels_sink.clear();
        self.num_buffered_values = 0;
        Ok(())
    }

    // Only one dictionary page is ever written; once the dictionary exceeds
    // the configured limit, emit it, flush the buffered pages and fall back
    // to PLAIN.
    fn check_dictionary_size_limit(&mut self) -> Result<()> {
        let dict_size = match self.encoder.as_dictionary() {
            Some(dict) => dict.dict_encoded_size(),
            None => return Ok(()),
        };
        if dict_size < self.props.dictionary_page_size_limit() {
            return Ok(());
        }

        self.write_dictionary_page()?;
        self.flush_buffered_data_pages()?;
        self.fallback = true;
        self.encoder = make_encoder::<T>(Encoding::PLAIN, false)?;
        self.encoding = Encoding::PLAIN;
        Ok(())
    }

    fn write_dictionary_page(&mut self) -> Result<()> {
        let (buf, num_entries) = match self.encoder.as_dictionary() {
            Some(dict) => (dict.write_dict()?, dict.num_entries()),
            None => {
                return Err(general_err!(
                    "cannot write a dictionary page without a dictionary encoder"
                ))
            }
        };
        let page = DictionaryPage::new(
            buf,
            num_entries as u32,
            self.props.dictionary_page_encoding(),
        );
        self.total_bytes_written += self.pager.write_dictionary_page(&page)?;
        Ok(())
    }

    fn flush_buffered_data_pages(&mut self) -> Result<()> {
        // write any outstanding values as a final page first
        if self.num_buffered_values > 0 {
            self.add_data_page()?;
        }
        let pages = std::mem::take(&mut self.data_pages);
        for page in &pages {
            self.total_bytes_written += self.pager.write_data_page(page)?;
        }
        self.total_compressed_bytes = 0;
        Ok(())
    }

    /// Closes this column chunk: emits the dictionary page (when the
    /// dictionary never fell back), flushes the remaining pages, attaches the
    /// chunk statistics, and finalizes the metadata through the page writer.
    pub(crate) fn close(mut self) -> Result<(u64, i64, ColumnChunkMetaDataBuilder)> {
        if self.closed {
            return Err(ParquetError::BuilderMisuse(format!(
                "column writer for '{}' was closed twice",
                self.descr.path()
            )));
        }
        self.closed = true;

        if self.has_dictionary && !self.fallback {
            self.write_dictionary_page()?;
        }
        self.flush_buffered_data_pages()?;

        let chunk_statistics = match self.chunk_statistics.as_ref() {
            Some(stats) if self.rows_written > 0 => {
                let mut encoded = stats.encode();
                encoded.apply_stat_size_limits(self.props.max_statistics_size(self.descr.path()));
                encoded.set_is_signed(self.descr.sort_order().is_signed());
                encoded.is_set().then_some(encoded)
            }
            _ => None,
        };

        let metadata = self
            .pager
            .close(self.has_dictionary, self.fallback, chunk_statistics)?;
        Ok((self.total_bytes_written, self.rows_written, metadata))
    }
}
