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

//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;

use parquet_core::basic::{Repetition, Type as PhysicalType};
use parquet_core::column::page::Page;
use parquet_core::data_type::DataType;
use parquet_core::encodings::decoding::{decode_data_page, decode_dictionary_page};
use parquet_core::errors::Result;
use parquet_core::file::reader::ChunkReader;
use parquet_core::file::serialized_reader::SerializedFileReader;
use parquet_core::schema::types::{Type, TypePtr};

/// Builds a flat schema of required columns with the given names and types.
pub fn required_schema(columns: &[(&str, PhysicalType)]) -> TypePtr {
    let fields = columns
        .iter()
        .map(|(name, physical)| {
            Arc::new(
                Type::primitive_type_builder(name, *physical)
                    .with_repetition(Repetition::REQUIRED)
                    .build()
                    .unwrap(),
            )
        })
        .collect();
    Arc::new(
        Type::group_type_builder("schema")
            .with_fields(fields)
            .build()
            .unwrap(),
    )
}

/// Builds a flat schema with a single optional column.
pub fn optional_schema(name: &str, physical: PhysicalType) -> TypePtr {
    let field = Arc::new(
        Type::primitive_type_builder(name, physical)
            .with_repetition(Repetition::OPTIONAL)
            .build()
            .unwrap(),
    );
    Arc::new(
        Type::group_type_builder("schema")
            .with_fields(vec![field])
            .build()
            .unwrap(),
    )
}

/// Reads every value of one column chunk by walking its pages.
pub fn read_column_values<T: DataType, R: ChunkReader>(
    reader: &SerializedFileReader<R>,
    row_group: usize,
    column: usize,
) -> Result<Vec<T::T>> {
    let descr = reader.metadata().schema_descr().column(column);
    let mut page_reader = reader.get_column_page_reader(row_group, column)?;
    let mut dictionary: Option<Vec<T::T>> = None;
    let mut values = Vec::new();
    while let Some(page) = page_reader.get_next_page()? {
        match &page {
            Page::DictionaryPage { .. } => {
                dictionary = Some(decode_dictionary_page::<T>(&page)?);
            }
            Page::DataPage { .. } => {
                values.extend(decode_data_page::<T>(&page, &descr, dictionary.as_deref())?.values);
            }
        }
    }
    Ok(values)
}

/// Collects all pages of one column chunk.
pub fn read_column_pages<R: ChunkReader>(
    reader: &SerializedFileReader<R>,
    row_group: usize,
    column: usize,
) -> Result<Vec<Page>> {
    let mut page_reader = reader.get_column_page_reader(row_group, column)?;
    let mut pages = Vec::new();
    while let Some(page) = page_reader.get_next_page()? {
        pages.push(page);
    }
    Ok(pages)
}

/// Flips one byte of a serialized file.
pub fn flip_byte(data: &[u8], index: usize) -> Bytes {
    let mut corrupted = data.to_vec();
    corrupted[index] ^= 0xff;
    Bytes::from(corrupted)
}
