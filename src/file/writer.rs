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

//! File writer API: magic bytes, row group sequencing, the per-column page
//! writer pipeline, and the three footer modes (plaintext, plaintext with
//! signature, encrypted).

use std::io::Write;
use std::sync::Arc;

use crate::basic::Compression;
use crate::column::page::{CompressedDataPage, DictionaryPage, PageWriter};
use crate::column::writer::{get_column_writer, ColumnWriter, ColumnWriterImpl, ColumnWriterType};
use crate::compression::{create_codec, Codec};
use crate::encryption::encrypt::{Encryptor, InternalFileEncryptor};
use crate::encryption::modules::{
    create_footer_aad, create_module_aad, quick_update_page_aad, ModuleType,
};
use crate::errors::{ParquetError, Result};
use crate::file::metadata::{
    ColumnChunkFinishArgs, ColumnChunkMetaDataBuilder, FileMetaDataBuilder,
    RowGroupMetaDataBuilder,
};
use crate::file::properties::WriterPropertiesPtr;
use crate::file::statistics::EncodedStatistics;
use crate::file::{PARQUET_EMAGIC, PARQUET_MAGIC};
use crate::format;
use crate::schema::types::{SchemaDescPtr, SchemaDescriptor, TypePtr};
use crate::thrift::{serialize_thrift_object, write_thrift_object};

/// A wrapper around a [`Write`] that keeps track of the number of bytes
/// written.
pub struct TrackedWrite<W: Write> {
    inner: W,
    bytes_written: usize,
}

impl<W: Write> TrackedWrite<W> {
    /// Create a new [`TrackedWrite`] from a [`Write`].
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Returns the number of bytes written to this instance.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Consumes the wrapper, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for TrackedWrite<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes = self.inner.write(buf)?;
        self.bytes_written += bytes;
        Ok(bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

// A writer that knows its current position, needed to record page offsets.
pub(crate) trait PositionedWrite: Write {
    fn pos(&self) -> u64;
}

impl<W: Write> PositionedWrite for TrackedWrite<W> {
    fn pos(&self) -> u64 {
        self.bytes_written as u64
    }
}

impl<T: PositionedWrite> PositionedWrite for &mut T {
    fn pos(&self) -> u64 {
        (**self).pos()
    }
}

/// Callback invoked when a column chunk closes: bytes written, rows written,
/// and the finished metadata builder.
type OnCloseColumnChunk<'a> =
    Box<dyn FnOnce(u64, i64, ColumnChunkMetaDataBuilder) -> Result<()> + 'a>;

/// Callback invoked when a row group closes, carrying its thrift metadata.
type OnCloseRowGroup<'a> = Box<dyn FnOnce(format::RowGroup) -> Result<()> + 'a>;

// ----------------------------------------------------------------------
// Serialized impl for file & row group writers

/// Parquet file writer. Row groups are written strictly sequentially; the
/// footer (in one of its three modes) is written on [`Self::close`].
pub struct SerializedFileWriter<W: Write> {
    buf: TrackedWrite<W>,
    descr: SchemaDescPtr,
    props: WriterPropertiesPtr,
    metadata_builder: FileMetaDataBuilder,
    file_encryptor: Option<InternalFileEncryptor>,
    row_group_index: usize,
    row_groups_closed: usize,
    closed: bool,
}

impl<W: Write> SerializedFileWriter<W> {
    /// Creates a new file writer, writing the leading magic bytes.
    pub fn new(buf: W, schema: TypePtr, props: WriterPropertiesPtr) -> Result<Self> {
        let mut buf = TrackedWrite::new(buf);
        buf.write_all(&PARQUET_MAGIC)?;
        let descr = Arc::new(SchemaDescriptor::new(schema));
        let file_encryptor = props
            .file_encryption_properties()
            .cloned()
            .map(InternalFileEncryptor::new);
        let metadata_builder = FileMetaDataBuilder::new(props.clone(), descr.clone());
        Ok(Self {
            buf,
            descr,
            props,
            metadata_builder,
            file_encryptor,
            row_group_index: 0,
            row_groups_closed: 0,
            closed: false,
        })
    }

    /// The schema descriptor being written.
    pub fn schema_descr(&self) -> &SchemaDescriptor {
        &self.descr
    }

    /// Opens the writer for the next row group. The previous row group must
    /// have been closed.
    pub fn next_row_group(&mut self) -> Result<SerializedRowGroupWriter<'_, W>> {
        self.assert_open()?;
        if self.row_groups_closed != self.row_group_index {
            return Err(ParquetError::BuilderMisuse(
                "previous row group writer was not closed".to_owned(),
            ));
        }
        let ordinal = self.row_group_index as i16;
        self.row_group_index += 1;

        let metadata_builder = &mut self.metadata_builder;
        let row_groups_closed = &mut self.row_groups_closed;
        let on_close = move |row_group: format::RowGroup| {
            metadata_builder.add_row_group(row_group);
            *row_groups_closed += 1;
            Ok(())
        };

        Ok(SerializedRowGroupWriter::new(
            self.descr.clone(),
            self.props.clone(),
            &mut self.buf,
            self.file_encryptor.as_ref(),
            ordinal,
            Box::new(on_close),
        ))
    }

    fn assert_open(&self) -> Result<()> {
        if self.closed {
            return Err(ParquetError::BuilderMisuse(
                "file writer was used after close".to_owned(),
            ));
        }
        Ok(())
    }

    /// Closes the writer: assembles the file metadata and writes the footer.
    /// All encryption keys held by the writer are wiped afterwards.
    pub fn close(mut self) -> Result<format::FileMetaData> {
        self.assert_open()?;
        if self.row_groups_closed != self.row_group_index {
            return Err(ParquetError::BuilderMisuse(
                "previous row group writer was not closed".to_owned(),
            ));
        }
        self.closed = true;

        let metadata = self.metadata_builder.finish()?;

        match self.file_encryptor.as_ref() {
            None => {
                // plaintext footer
                let start = self.buf.bytes_written();
                write_thrift_object(&metadata, &mut self.buf, None, &[])?;
                let metadata_len = (self.buf.bytes_written() - start) as u32;
                self.buf.write_all(&metadata_len.to_le_bytes())?;
                self.buf.write_all(&PARQUET_MAGIC)?;
            }
            Some(encryptor) if encryptor.properties().encrypt_footer() => {
                // encrypted footer: plaintext crypto metadata, then the
                // encrypted file metadata, then the combined length
                let crypto_metadata = self
                    .metadata_builder
                    .crypto_metadata()
                    .ok_or_else(|| general_err!("missing file crypto metadata"))?;
                let start = self.buf.bytes_written();
                write_thrift_object(&crypto_metadata, &mut self.buf, None, &[])?;

                let footer_encryptor = encryptor.get_footer_encryptor()?;
                let footer_aad = create_footer_aad(encryptor.properties().file_aad())?;
                write_thrift_object(&metadata, &mut self.buf, Some(&footer_encryptor), &footer_aad)?;

                let combined_len = (self.buf.bytes_written() - start) as u32;
                self.buf.write_all(&combined_len.to_le_bytes())?;
                self.buf.write_all(&PARQUET_EMAGIC)?;
            }
            Some(encryptor) => {
                // plaintext footer carrying a signature: the trailing length
                // covers the metadata and the 28 byte nonce-and-tag
                let serialized = serialize_thrift_object(&metadata)?;
                let signing_encryptor = encryptor.get_footer_signing_encryptor()?;
                let footer_aad = create_footer_aad(encryptor.properties().file_aad())?;
                let framed = signing_encryptor.encrypt(&serialized, &footer_aad)?;

                self.buf.write_all(&serialized)?;
                // signature = nonce || tag, lifted out of the module framing
                self.buf.write_all(&framed[4..16])?;
                self.buf.write_all(&framed[framed.len() - 16..])?;

                let metadata_len = (serialized.len() + 28) as u32;
                self.buf.write_all(&metadata_len.to_le_bytes())?;
                self.buf.write_all(&PARQUET_MAGIC)?;
            }
        }

        if let Some(mut encryptor) = self.file_encryptor.take() {
            encryptor.wipe_out_encryption_keys();
        }
        self.buf.flush()?;
        Ok(metadata)
    }
}

/// Writer for one row group. Columns are written strictly in schema order.
pub struct SerializedRowGroupWriter<'a, W: Write> {
    descr: SchemaDescPtr,
    props: WriterPropertiesPtr,
    buf: &'a mut TrackedWrite<W>,
    file_encryptor: Option<&'a InternalFileEncryptor>,
    row_group_builder: RowGroupMetaDataBuilder,
    row_group_ordinal: i16,
    total_bytes_written: u64,
    total_rows_written: Option<i64>,
    on_close: Option<OnCloseRowGroup<'a>>,
}

impl<'a, W: Write> SerializedRowGroupWriter<'a, W> {
    fn new(
        descr: SchemaDescPtr,
        props: WriterPropertiesPtr,
        buf: &'a mut TrackedWrite<W>,
        file_encryptor: Option<&'a InternalFileEncryptor>,
        row_group_ordinal: i16,
        on_close: OnCloseRowGroup<'a>,
    ) -> Self {
        let row_group_builder = RowGroupMetaDataBuilder::new(props.clone(), descr.clone());
        Self {
            descr,
            props,
            buf,
            file_encryptor,
            row_group_builder,
            row_group_ordinal,
            total_bytes_written: 0,
            total_rows_written: None,
            on_close: Some(on_close),
        }
    }

    /// Returns the writer for the next column, streaming pages directly to
    /// the file, or `None` when every column has been written.
    pub fn next_column(&mut self) -> Result<Option<SerializedColumnWriter<'_>>> {
        self.next_column_inner(false)
    }

    /// Like [`Self::next_column`], but pages are buffered in memory and
    /// flushed to the file when the column closes.
    pub fn next_column_buffered(&mut self) -> Result<Option<SerializedColumnWriter<'_>>> {
        self.next_column_inner(true)
    }

    fn next_column_inner(&mut self, buffered: bool) -> Result<Option<SerializedColumnWriter<'_>>> {
        let column_ordinal = self.row_group_builder.current_column();
        if column_ordinal >= self.descr.num_columns() {
            return Ok(None);
        }
        let metadata_builder = self.row_group_builder.take_next_column()?;
        let descr = metadata_builder.descr().clone();
        let path = descr.path().string();
        let compression = self.props.compression(descr.path());

        let (meta_encryptor, data_encryptor) = match self.file_encryptor {
            Some(encryptor) => (
                encryptor.get_column_meta_encryptor(&path)?,
                encryptor.get_column_data_encryptor(&path)?,
            ),
            None => (None, None),
        };

        let pager: Box<dyn PageWriter + '_> = if buffered {
            Box::new(BufferedPageWriter::new(
                &mut *self.buf,
                compression,
                metadata_builder,
                self.row_group_ordinal,
                column_ordinal as i16,
                meta_encryptor,
                data_encryptor,
            )?)
        } else {
            Box::new(SerializedPageWriter::new(
                &mut *self.buf,
                compression,
                metadata_builder,
                self.row_group_ordinal,
                column_ordinal as i16,
                meta_encryptor,
                data_encryptor,
            )?)
        };
        let writer = get_column_writer(descr, self.props.clone(), pager)?;

        let row_group_builder = &mut self.row_group_builder;
        let total_bytes_written = &mut self.total_bytes_written;
        let total_rows_written = &mut self.total_rows_written;
        let on_close = move |bytes_written: u64,
                             rows_written: i64,
                             metadata_builder: ColumnChunkMetaDataBuilder| {
            *total_bytes_written += bytes_written;
            match *total_rows_written {
                Some(rows) if rows != rows_written => {
                    return Err(general_err!(
                        "incorrect number of rows, expected {} != {} rows",
                        rows,
                        rows_written
                    ));
                }
                None => *total_rows_written = Some(rows_written),
                _ => {}
            }
            row_group_builder.return_column(metadata_builder);
            Ok(())
        };

        Ok(Some(SerializedColumnWriter::new(
            writer,
            Some(Box::new(on_close)),
        )))
    }

    /// Closes this row group: validates that every column was written and
    /// hands the row group metadata to the file writer.
    pub fn close(mut self) -> Result<()> {
        self.row_group_builder
            .set_num_rows(self.total_rows_written.unwrap_or(0));
        let row_group = self
            .row_group_builder
            .finish(self.total_bytes_written as i64, self.row_group_ordinal)?;
        if let Some(on_close) = self.on_close.take() {
            on_close(row_group)?;
        }
        Ok(())
    }
}

/// A wrapper around a [`ColumnWriter`] that reports back to its row group on
/// close.
pub struct SerializedColumnWriter<'a> {
    inner: ColumnWriter<'a>,
    on_close: Option<OnCloseColumnChunk<'a>>,
}

impl<'a> SerializedColumnWriter<'a> {
    fn new(inner: ColumnWriter<'a>, on_close: Option<OnCloseColumnChunk<'a>>) -> Self {
        Self { inner, on_close }
    }

    /// Returns a reference to the untyped column writer.
    pub fn untyped(&mut self) -> &mut ColumnWriter<'a> {
        &mut self.inner
    }

    /// Returns a reference to the typed column writer, panicking when `T`
    /// does not match the column's physical type.
    pub fn typed<T: ColumnWriterType>(&mut self) -> &mut ColumnWriterImpl<'a, T> {
        T::project(&mut self.inner)
            .expect("typed() called with a type not matching the column writer")
    }

    /// Closes this column writer.
    pub fn close(mut self) -> Result<()> {
        let (bytes_written, rows_written, metadata_builder) = self.inner.close()?;
        if let Some(on_close) = self.on_close.take() {
            on_close(bytes_written, rows_written, metadata_builder)?;
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Page writers

/// Streaming page writer: delimits pages in the output stream, each preceded
/// by a thrift page header, encrypting page bodies and headers per module
/// when encryptors are present.
pub(crate) struct SerializedPageWriter<S: PositionedWrite> {
    sink: S,
    metadata: Option<ColumnChunkMetaDataBuilder>,
    compressor: Option<Box<dyn Codec>>,
    row_group_ordinal: i16,
    column_ordinal: i16,
    num_values: i64,
    dictionary_page_offset: i64,
    data_page_offset: i64,
    total_uncompressed_size: i64,
    total_compressed_size: i64,
    page_ordinal: usize,
    meta_encryptor: Option<Encryptor>,
    data_encryptor: Option<Encryptor>,
    // AAD templates built once and page-ordinal-patched per page
    data_page_aad: Vec<u8>,
    data_page_header_aad: Vec<u8>,
}

impl<S: PositionedWrite> SerializedPageWriter<S> {
    fn new(
        sink: S,
        compression: Compression,
        metadata: ColumnChunkMetaDataBuilder,
        row_group_ordinal: i16,
        column_ordinal: i16,
        meta_encryptor: Option<Encryptor>,
        data_encryptor: Option<Encryptor>,
    ) -> Result<Self> {
        let data_page_aad = match data_encryptor.as_ref() {
            Some(encryptor) => create_module_aad(
                encryptor.file_aad(),
                ModuleType::DataPage,
                row_group_ordinal as usize,
                column_ordinal as usize,
                Some(0),
            )?,
            None => Vec::new(),
        };
        let data_page_header_aad = match meta_encryptor.as_ref() {
            Some(encryptor) => create_module_aad(
                encryptor.file_aad(),
                ModuleType::DataPageHeader,
                row_group_ordinal as usize,
                column_ordinal as usize,
                Some(0),
            )?,
            None => Vec::new(),
        };
        Ok(Self {
            sink,
            metadata: Some(metadata),
            compressor: create_codec(compression)?,
            row_group_ordinal,
            column_ordinal,
            num_values: 0,
            dictionary_page_offset: 0,
            data_page_offset: 0,
            total_uncompressed_size: 0,
            total_compressed_size: 0,
            page_ordinal: 0,
            meta_encryptor,
            data_encryptor,
            data_page_aad,
            data_page_header_aad,
        })
    }

    fn module_aad(&self, module_type: ModuleType) -> Result<Vec<u8>> {
        let encryptor = match module_type {
            ModuleType::DictionaryPage => self.data_encryptor.as_ref(),
            _ => self.meta_encryptor.as_ref(),
        }
        .ok_or_else(|| general_err!("module AAD requested without an encryptor"))?;
        create_module_aad(
            encryptor.file_aad(),
            module_type,
            self.row_group_ordinal as usize,
            self.column_ordinal as usize,
            None,
        )
    }
}

impl<S: PositionedWrite> PageWriter for SerializedPageWriter<S> {
    fn write_data_page(&mut self, page: &CompressedDataPage) -> Result<u64> {
        let uncompressed_size = page.uncompressed_size();

        let encrypted;
        let output_data: &[u8] = match self.data_encryptor.as_ref() {
            Some(encryptor) => {
                quick_update_page_aad(&mut self.data_page_aad, self.page_ordinal)?;
                encrypted = encryptor.encrypt(page.data(), &self.data_page_aad)?;
                &encrypted
            }
            None => page.data(),
        };

        let page_header = format::PageHeader {
            type_: crate::basic::PageType::DATA_PAGE,
            uncompressed_page_size: uncompressed_size as i32,
            compressed_page_size: output_data.len() as i32,
            crc: None,
            data_page_header: Some(format::DataPageHeader {
                num_values: page.num_values() as i32,
                encoding: page.encoding(),
                definition_level_encoding: page.def_level_encoding(),
                repetition_level_encoding: page.rep_level_encoding(),
                statistics: page.statistics().to_thrift(),
            }),
            dictionary_page_header: None,
        };

        let start_pos = self.sink.pos();
        if self.data_page_offset == 0 {
            self.data_page_offset = start_pos as i64;
        }

        if self.meta_encryptor.is_some() {
            quick_update_page_aad(&mut self.data_page_header_aad, self.page_ordinal)?;
        }
        let header_size = write_thrift_object(
            &page_header,
            &mut self.sink,
            self.meta_encryptor.as_ref(),
            &self.data_page_header_aad,
        )?;
        self.sink.write_all(output_data)?;

        self.total_uncompressed_size += (uncompressed_size + header_size) as i64;
        self.total_compressed_size += (output_data.len() + header_size) as i64;
        self.num_values += page.num_values() as i64;
        self.page_ordinal += 1;

        Ok(self.sink.pos() - start_pos)
    }

    fn write_dictionary_page(&mut self, page: &DictionaryPage) -> Result<u64> {
        let uncompressed_size = page.size();

        let compressed;
        let compressed_data: &[u8] = match self.compressor.as_mut() {
            Some(codec) => {
                let mut out = Vec::new();
                codec.compress(page.data(), &mut out)?;
                compressed = out;
                &compressed
            }
            None => page.data(),
        };

        let encrypted;
        let output_data: &[u8] = match self.data_encryptor.as_ref() {
            Some(encryptor) => {
                let aad = self.module_aad(ModuleType::DictionaryPage)?;
                encrypted = encryptor.encrypt(compressed_data, &aad)?;
                &encrypted
            }
            None => compressed_data,
        };

        let page_header = format::PageHeader {
            type_: crate::basic::PageType::DICTIONARY_PAGE,
            uncompressed_page_size: uncompressed_size as i32,
            compressed_page_size: output_data.len() as i32,
            crc: None,
            data_page_header: None,
            dictionary_page_header: Some(format::DictionaryPageHeader {
                num_values: page.num_values() as i32,
                encoding: page.encoding(),
                is_sorted: Some(page.is_sorted()),
            }),
        };

        let start_pos = self.sink.pos();
        if self.dictionary_page_offset == 0 {
            self.dictionary_page_offset = start_pos as i64;
        }

        let header_aad = match self.meta_encryptor.as_ref() {
            Some(_) => self.module_aad(ModuleType::DictionaryPageHeader)?,
            None => Vec::new(),
        };
        let header_size = write_thrift_object(
            &page_header,
            &mut self.sink,
            self.meta_encryptor.as_ref(),
            &header_aad,
        )?;
        self.sink.write_all(output_data)?;

        self.total_uncompressed_size += (uncompressed_size + header_size) as i64;
        self.total_compressed_size += (output_data.len() + header_size) as i64;

        Ok(self.sink.pos() - start_pos)
    }

    fn has_compressor(&self) -> bool {
        self.compressor.is_some()
    }

    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        match self.compressor.as_mut() {
            Some(codec) => codec.compress(input, output),
            None => Err(general_err!("page writer has no compressor")),
        }
    }

    fn close(
        &mut self,
        has_dictionary: bool,
        fallback: bool,
        chunk_statistics: Option<EncodedStatistics>,
    ) -> Result<ColumnChunkMetaDataBuilder> {
        let mut metadata = self.metadata.take().ok_or_else(|| {
            ParquetError::BuilderMisuse("page writer was closed twice".to_owned())
        })?;

        if let Some(statistics) = chunk_statistics.as_ref() {
            metadata.set_statistics(statistics);
        }

        let meta_encryptor = match self.meta_encryptor.as_ref() {
            Some(encryptor) => {
                let aad = self.module_aad(ModuleType::ColumnMetaData)?;
                Some((encryptor, aad))
            }
            None => None,
        };

        metadata.finish(ColumnChunkFinishArgs {
            num_values: self.num_values,
            dictionary_page_offset: (self.dictionary_page_offset != 0)
                .then_some(self.dictionary_page_offset),
            index_page_offset: None,
            data_page_offset: self.data_page_offset,
            compressed_size: self.total_compressed_size,
            uncompressed_size: self.total_uncompressed_size,
            has_dictionary,
            dictionary_fallback: fallback,
            meta_encryptor,
        })?;

        // the column metadata is also written at the end of the column chunk
        write_thrift_object(metadata.column_chunk(), &mut self.sink, None, &[])?;

        Ok(metadata)
    }
}

/// Buffered page writer: pages accumulate in an in-memory sink and reach the
/// file only when the column closes, with the recorded offsets shifted by
/// the flush position. Encryption happens in the wrapped streaming pager, so
/// the metadata finish is driven without an encryptor.
pub(crate) struct BufferedPageWriter<'a, W: Write> {
    final_sink: &'a mut TrackedWrite<W>,
    pager: SerializedPageWriter<TrackedWrite<Vec<u8>>>,
}

impl<'a, W: Write> BufferedPageWriter<'a, W> {
    fn new(
        final_sink: &'a mut TrackedWrite<W>,
        compression: Compression,
        metadata: ColumnChunkMetaDataBuilder,
        row_group_ordinal: i16,
        column_ordinal: i16,
        meta_encryptor: Option<Encryptor>,
        data_encryptor: Option<Encryptor>,
    ) -> Result<Self> {
        Ok(Self {
            final_sink,
            pager: SerializedPageWriter::new(
                TrackedWrite::new(Vec::new()),
                compression,
                metadata,
                row_group_ordinal,
                column_ordinal,
                meta_encryptor,
                data_encryptor,
            )?,
        })
    }
}

impl<'a, W: Write> PageWriter for BufferedPageWriter<'a, W> {
    fn write_data_page(&mut self, page: &CompressedDataPage) -> Result<u64> {
        self.pager.write_data_page(page)
    }

    fn write_dictionary_page(&mut self, page: &DictionaryPage) -> Result<u64> {
        self.pager.write_dictionary_page(page)
    }

    fn has_compressor(&self) -> bool {
        self.pager.has_compressor()
    }

    fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        self.pager.compress(input, output)
    }

    fn close(
        &mut self,
        has_dictionary: bool,
        fallback: bool,
        chunk_statistics: Option<EncodedStatistics>,
    ) -> Result<ColumnChunkMetaDataBuilder> {
        let mut metadata = self.pager.metadata.take().ok_or_else(|| {
            ParquetError::BuilderMisuse("page writer was closed twice".to_owned())
        })?;

        if let Some(statistics) = chunk_statistics.as_ref() {
            metadata.set_statistics(statistics);
        }

        // in-memory page offsets become file offsets once shifted by the
        // current position of the final sink
        let flush_position = self.final_sink.pos() as i64;
        metadata.finish(ColumnChunkFinishArgs {
            num_values: self.pager.num_values,
            dictionary_page_offset: has_dictionary
                .then_some(self.pager.dictionary_page_offset + flush_position),
            index_page_offset: None,
            data_page_offset: self.pager.data_page_offset + flush_position,
            compressed_size: self.pager.total_compressed_size,
            uncompressed_size: self.pager.total_uncompressed_size,
            has_dictionary,
            dictionary_fallback: fallback,
            meta_encryptor: None,
        })?;

        // write the column metadata into the buffer, then flush everything
        write_thrift_object(metadata.column_chunk(), &mut self.pager.sink, None, &[])?;
        let buffer = std::mem::replace(&mut self.pager.sink, TrackedWrite::new(Vec::new()));
        self.final_sink.write_all(&buffer.into_inner())?;

        Ok(metadata)
    }
}
