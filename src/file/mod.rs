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

//! File-level APIs: footer parsing, metadata, reader and writer plumbing.

pub mod footer;
pub mod metadata;
pub mod properties;
pub mod reader;
pub mod serialized_reader;
pub mod statistics;
pub mod writer;

/// Size of the fixed file footer: metadata length plus magic.
pub const FOOTER_SIZE: usize = 8;

/// Magic of plaintext (and plaintext-footer) Parquet files.
pub const PARQUET_MAGIC: [u8; 4] = *b"PAR1";

/// Magic of Parquet files with an encrypted footer.
pub const PARQUET_EMAGIC: [u8; 4] = *b"PARE";

// How many trailing bytes to read speculatively when parsing the footer.
pub(crate) const DEFAULT_FOOTER_READ_SIZE: u64 = 64 * 1024;
