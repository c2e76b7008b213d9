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

//! Plaintext write/read round trips: row counts, statistics, compression
//! and the dictionary fallback machinery.

mod common;

use std::sync::Arc;

use bytes::Bytes;

use common::{optional_schema, read_column_pages, read_column_values, required_schema};
use parquet_core::basic::{Compression, Encoding, Type as PhysicalType};
use parquet_core::column::page::Page;
use parquet_core::data_type::{ByteArray, ByteArrayType, Int32Type, Int64Type};
use parquet_core::file::properties::{WriterProperties, WriterVersion};
use parquet_core::file::serialized_reader::SerializedFileReader;
use parquet_core::file::statistics::Statistics;
use parquet_core::file::writer::SerializedFileWriter;

fn write_single_i32_column(values: &[i32], props: WriterProperties) -> Vec<u8> {
    let mut buffer = Vec::new();
    let schema = required_schema(&[("col0", PhysicalType::INT32)]);
    let mut writer = SerializedFileWriter::new(&mut buffer, schema, Arc::new(props)).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    let mut column = row_group.next_column().unwrap().unwrap();
    column
        .typed::<Int32Type>()
        .write_batch(values, None, None)
        .unwrap();
    column.close().unwrap();
    row_group.close().unwrap();
    writer.close().unwrap();
    buffer
}

#[test]
fn test_snappy_roundtrip_with_statistics() {
    // S1: one INT32 column, snappy compression
    let buffer = write_single_i32_column(
        &[1, 2, 3, 4, 5],
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build(),
    );

    assert_eq!(&buffer[..4], b"PAR1");
    assert_eq!(&buffer[buffer.len() - 4..], b"PAR1");

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let metadata = reader.metadata();
    assert_eq!(metadata.num_rows(), 5);
    assert_eq!(metadata.num_row_groups(), 1);

    let row_group = metadata.row_group(0).unwrap();
    assert_eq!(row_group.num_rows(), 5);
    let column = row_group.column(0).unwrap();
    assert_eq!(column.compression().unwrap(), Compression::SNAPPY);
    // tiny pages can inflate slightly under compression framing, but the
    // compressed size must stay within the uncompressed size plus overhead
    assert!(
        column.total_compressed_size().unwrap()
            <= column.total_uncompressed_size().unwrap() + 64
    );

    match column.statistics().unwrap() {
        Some(Statistics::Int32(stats)) => {
            assert_eq!(stats.min_opt(), Some(&1));
            assert_eq!(stats.max_opt(), Some(&5));
            assert_eq!(stats.null_count(), 0);
        }
        other => panic!("expected INT32 statistics, got {other:?}"),
    }

    let values = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_multiple_row_groups() {
    let schema = required_schema(&[("v", PhysicalType::INT32)]);
    let props = Arc::new(WriterProperties::builder().build());
    let row_groups: Vec<Vec<i32>> = vec![vec![1, 2, 3], vec![4], vec![], vec![5, 6]];

    let mut buffer = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
    for values in &row_groups {
        let mut row_group = writer.next_row_group().unwrap();
        let mut column = row_group.next_column().unwrap().unwrap();
        column
            .typed::<Int32Type>()
            .write_batch(values, None, None)
            .unwrap();
        column.close().unwrap();
        row_group.close().unwrap();
    }
    writer.close().unwrap();

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    assert_eq!(reader.num_row_groups(), row_groups.len());
    assert_eq!(reader.metadata().num_rows(), 6);
    for (i, expected) in row_groups.iter().enumerate() {
        assert_eq!(
            reader.metadata().row_group(i).unwrap().num_rows(),
            expected.len() as i64
        );
        // the recorded ordinal matches the append order
        assert_eq!(reader.metadata().row_group(i).unwrap().ordinal(), i as i16);
        if !expected.is_empty() {
            let values = read_column_values::<Int32Type, _>(&reader, i, 0).unwrap();
            assert_eq!(&values, expected);
        }
    }
}

#[test]
fn test_byte_array_roundtrip() {
    let schema = required_schema(&[("s", PhysicalType::BYTE_ARRAY)]);
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::ZSTD)
            .build(),
    );
    let values: Vec<ByteArray> = ["foo", "bar", "", "baz"]
        .iter()
        .map(|s| ByteArray::from(*s))
        .collect();

    let mut buffer = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    let mut column = row_group.next_column().unwrap().unwrap();
    column
        .typed::<ByteArrayType>()
        .write_batch(&values, None, None)
        .unwrap();
    column.close().unwrap();
    row_group.close().unwrap();
    writer.close().unwrap();

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let read = read_column_values::<ByteArrayType, _>(&reader, 0, 0).unwrap();
    assert_eq!(read, values);

    // byte arrays sort unsigned; with a modern writer the statistics are
    // trusted and only the new min/max pair is populated
    let column = reader.metadata().row_group(0).unwrap().column(0).unwrap();
    match column.statistics().unwrap() {
        Some(Statistics::ByteArray(stats)) => {
            assert_eq!(stats.min_opt().unwrap().data(), b"");
            assert_eq!(stats.max_opt().unwrap().data(), b"foo");
        }
        other => panic!("expected byte array statistics, got {other:?}"),
    }
}

#[test]
fn test_optional_column_with_nulls() {
    let schema = optional_schema("v", PhysicalType::INT32);
    let props = Arc::new(WriterProperties::builder().build());

    let mut buffer = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    let mut column = row_group.next_column().unwrap().unwrap();
    // rows: 1, null, 3, null, null
    let def_levels = [1i16, 0, 1, 0, 0];
    column
        .typed::<Int32Type>()
        .write_batch(&[1, 3], Some(&def_levels), None)
        .unwrap();
    column.close().unwrap();
    row_group.close().unwrap();
    writer.close().unwrap();

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    assert_eq!(reader.metadata().num_rows(), 5);
    let column = reader.metadata().row_group(0).unwrap().column(0).unwrap();
    assert_eq!(column.num_values().unwrap(), 5);
    match column.statistics().unwrap() {
        Some(Statistics::Int32(stats)) => {
            assert_eq!(stats.null_count(), 3);
            assert_eq!(stats.min_opt(), Some(&1));
            assert_eq!(stats.max_opt(), Some(&3));
        }
        other => panic!("expected INT32 statistics, got {other:?}"),
    }
    let values = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(values, vec![1, 3]);
}

#[test]
fn test_dictionary_encoding_roundtrip() {
    // few distinct values: the dictionary never falls back
    let values: Vec<i32> = (0..1000).map(|i| i % 3).collect();
    let buffer = write_single_i32_column(&values, WriterProperties::builder().build());

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let column = reader.metadata().row_group(0).unwrap().column(0).unwrap();
    assert!(column.has_dictionary_page().unwrap());
    assert_eq!(
        column.encodings().unwrap(),
        &[Encoding::PLAIN_DICTIONARY, Encoding::PLAIN, Encoding::RLE]
    );

    let pages = read_column_pages(&reader, 0, 0).unwrap();
    assert!(matches!(pages[0], Page::DictionaryPage { num_values: 3, .. }));

    let read = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(read, values);
}

#[test]
fn test_dictionary_fallback() {
    // S6: 10,000 distinct INT64 values with a 4 KiB dictionary limit force
    // the fallback to PLAIN
    let values: Vec<i64> = (0..10_000).collect();
    let schema = required_schema(&[("v", PhysicalType::INT64)]);
    let props = Arc::new(
        WriterProperties::builder()
            .set_dictionary_page_size_limit(4096)
            .build(),
    );

    let mut buffer = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    let mut column = row_group.next_column().unwrap().unwrap();
    {
        let typed = column.typed::<Int64Type>();
        typed.write_batch(&values, None, None).unwrap();
        assert!(typed.fallback_occurred());
    }
    column.close().unwrap();
    row_group.close().unwrap();
    writer.close().unwrap();

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let column = reader.metadata().row_group(0).unwrap().column(0).unwrap();
    // fallback appends PLAIN to the deterministic encodings list
    assert_eq!(
        column.encodings().unwrap(),
        &[
            Encoding::PLAIN_DICTIONARY,
            Encoding::PLAIN,
            Encoding::RLE,
            Encoding::PLAIN
        ]
    );

    let pages = read_column_pages(&reader, 0, 0).unwrap();
    // exactly one dictionary page, and it comes first
    assert!(matches!(pages[0], Page::DictionaryPage { .. }));
    assert_eq!(
        pages
            .iter()
            .filter(|p| matches!(p, Page::DictionaryPage { .. }))
            .count(),
        1
    );
    // at least one PLAIN data page follows the fallback
    assert!(pages
        .iter()
        .any(|p| matches!(p, Page::DataPage { encoding: Encoding::PLAIN, .. })));

    // all buffered pages were emitted before the fallback pages, so the
    // values come back in write order
    let read = read_column_values::<Int64Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(read, values);
}

#[test]
fn test_writer_version_2_dictionary_encodings() {
    let values: Vec<i32> = (0..100).map(|i| i % 5).collect();
    let buffer = write_single_i32_column(
        &values,
        WriterProperties::builder()
            .set_writer_version(WriterVersion::PARQUET_2_0)
            .build(),
    );
    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    assert_eq!(reader.metadata().version(), 2);
    let column = reader.metadata().row_group(0).unwrap().column(0).unwrap();
    assert_eq!(
        column.encodings().unwrap(),
        &[Encoding::RLE_DICTIONARY, Encoding::PLAIN, Encoding::RLE]
    );
    let read = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(read, values);
}

#[test]
fn test_multi_page_column() {
    // a small page size limit forces several pages per chunk
    let values: Vec<i32> = (0..20_000).collect();
    let buffer = write_single_i32_column(
        &values,
        WriterProperties::builder()
            .set_data_page_size_limit(1024)
            .set_dictionary_enabled(false)
            .build(),
    );
    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let pages = read_column_pages(&reader, 0, 0).unwrap();
    assert!(pages.len() > 1);
    let read = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(read, values);
}

#[test]
fn test_row_count_mismatch_between_columns() {
    let schema = required_schema(&[("a", PhysicalType::INT32), ("b", PhysicalType::INT32)]);
    let props = Arc::new(WriterProperties::builder().build());
    let mut buffer = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();

    let mut column = row_group.next_column().unwrap().unwrap();
    column
        .typed::<Int32Type>()
        .write_batch(&[1, 2, 3], None, None)
        .unwrap();
    column.close().unwrap();

    let mut column = row_group.next_column().unwrap().unwrap();
    column
        .typed::<Int32Type>()
        .write_batch(&[1, 2], None, None)
        .unwrap();
    let err = column.close().unwrap_err();
    assert!(err.to_string().contains("incorrect number of rows"));
}

#[test]
fn test_file_backed_roundtrip() {
    let schema = required_schema(&[("v", PhysicalType::INT32)]);
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::GZIP)
            .build(),
    );
    let values: Vec<i32> = (0..500).collect();

    let file = tempfile::tempfile().unwrap();
    let mut writer =
        SerializedFileWriter::new(file.try_clone().unwrap(), schema, props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    let mut column = row_group.next_column().unwrap().unwrap();
    column
        .typed::<Int32Type>()
        .write_batch(&values, None, None)
        .unwrap();
    column.close().unwrap();
    row_group.close().unwrap();
    writer.close().unwrap();

    let reader = SerializedFileReader::new(file).unwrap();
    assert_eq!(reader.metadata().num_rows(), 500);
    let read = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(read, values);
}

#[test]
fn test_file_metadata_created_by() {
    let buffer = write_single_i32_column(&[1], WriterProperties::builder().build());
    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let created_by = reader.metadata().created_by().unwrap();
    assert!(created_by.starts_with("parquet-core version"));
    assert_eq!(
        reader.metadata().writer_version().application,
        "parquet-core"
    );
}
