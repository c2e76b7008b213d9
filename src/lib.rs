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

//! Core reader and writer machinery for the [Apache Parquet] columnar file
//! format, including [Parquet Modular Encryption].
//!
//! The crate centers on four subsystems:
//!
//! * [`file::metadata`]: the typed read-only view over a file's thrift
//!   metadata, and the builders assembling fresh metadata during writes;
//! * [`file::footer`]: locating, validating and classifying the trailing
//!   footer (plaintext, plaintext-with-signature, or encrypted);
//! * [`encryption`]: the AES-GCM / AES-GCM-CTR primitives, AAD derivation,
//!   and the file encryptor/decryptor contexts with key-lifecycle handling;
//! * [`file::writer`]: the per-column-chunk page writer pipeline, covering
//!   level encoding, compression, statistics, dictionary fallback and
//!   per-page encryption.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use parquet_core::basic::{Repetition, Type as PhysicalType};
//! use parquet_core::data_type::Int32Type;
//! use parquet_core::file::properties::WriterProperties;
//! use parquet_core::file::serialized_reader::SerializedFileReader;
//! use parquet_core::file::writer::SerializedFileWriter;
//! use parquet_core::schema::types::Type;
//!
//! # fn main() -> parquet_core::errors::Result<()> {
//! let schema = Arc::new(
//!     Type::group_type_builder("schema")
//!         .with_fields(vec![Arc::new(
//!             Type::primitive_type_builder("v", PhysicalType::INT32)
//!                 .with_repetition(Repetition::REQUIRED)
//!                 .build()?,
//!         )])
//!         .build()?,
//! );
//!
//! let mut buffer = Vec::new();
//! let props = Arc::new(WriterProperties::builder().build());
//! let mut writer = SerializedFileWriter::new(&mut buffer, schema, props)?;
//! let mut row_group = writer.next_row_group()?;
//! let mut column = row_group.next_column()?.unwrap();
//! column.typed::<Int32Type>().write_batch(&[1, 2, 3], None, None)?;
//! column.close()?;
//! row_group.close()?;
//! writer.close()?;
//!
//! let reader = SerializedFileReader::new(Bytes::from(buffer))?;
//! assert_eq!(reader.metadata().num_rows(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! [Apache Parquet]: https://parquet.apache.org
//! [Parquet Modular Encryption]: https://parquet.apache.org/docs/file-format/data-pages/encryption/

#[macro_use]
pub mod errors;

pub mod basic;
pub mod column;
pub mod compression;
pub mod data_type;
pub mod encodings;
pub mod encryption;
pub mod file;
pub mod format;
pub mod schema;
pub mod util;

mod thrift;
