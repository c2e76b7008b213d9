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

//! Modular encryption end-to-end: encrypted footers, plaintext signed
//! footers, per-column keys, AAD prefixes and tamper detection.

mod common;

use std::sync::Arc;

use bytes::Bytes;

use common::{flip_byte, read_column_values, required_schema};
use parquet_core::basic::{Compression, ParquetCipher, Type as PhysicalType};
use parquet_core::data_type::Int32Type;
use parquet_core::encryption::decrypt::FileDecryptionProperties;
use parquet_core::encryption::encrypt::FileEncryptionProperties;
use parquet_core::errors::ParquetError;
use parquet_core::file::properties::{ReaderProperties, WriterProperties};
use parquet_core::file::serialized_reader::SerializedFileReader;
use parquet_core::file::writer::SerializedFileWriter;

const FOOTER_KEY: [u8; 16] = [0u8; 16];
const COLUMN_KEY_B: [u8; 16] = [42u8; 16];

fn write_two_columns(
    encryption: FileEncryptionProperties,
    compression: Compression,
    buffered: bool,
) -> Vec<u8> {
    let schema = required_schema(&[("a", PhysicalType::INT32), ("b", PhysicalType::INT32)]);
    // a one-byte page limit with tiny batches cuts a page every two values,
    // so every chunk spans several page ordinals
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(compression)
            .set_file_encryption_properties(encryption)
            .set_data_page_size_limit(1)
            .set_write_batch_size(2)
            .set_dictionary_enabled(false)
            .build(),
    );

    let mut buffer = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    for _ in 0..2 {
        let mut column = if buffered {
            row_group.next_column_buffered().unwrap().unwrap()
        } else {
            row_group.next_column().unwrap().unwrap()
        };
        column
            .typed::<Int32Type>()
            .write_batch(&[1, 2, 3, 4, 5], None, None)
            .unwrap();
        column.close().unwrap();
    }
    row_group.close().unwrap();
    writer.close().unwrap();
    buffer
}

fn reader_props(decryption: FileDecryptionProperties) -> ReaderProperties {
    ReaderProperties::builder()
        .set_file_decryption_properties(Arc::new(decryption))
        .build()
}

#[test]
fn test_encrypted_footer_roundtrip() {
    // S2: uniform encryption under the footer key
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let buffer = write_two_columns(encryption, Compression::SNAPPY, false);

    // the trailing magic identifies the encrypted footer
    assert_eq!(&buffer[buffer.len() - 4..], b"PARE");
    assert_eq!(&buffer[..4], b"PAR1");

    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader = SerializedFileReader::new_with_properties(
        Bytes::from(buffer.clone()),
        &reader_props(decryption),
    )
    .unwrap();
    assert_eq!(reader.metadata().num_rows(), 5);
    let values = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
    let values = read_column_values::<Int32Type, _>(&reader, 0, 1).unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);

    // without any keys the footer cannot be read at all
    let err =
        SerializedFileReader::new(Bytes::from(buffer.clone())).unwrap_err();
    assert!(matches!(err, ParquetError::MissingFooterKey));

    // a wrong footer key fails the footer tag check
    let wrong = FileDecryptionProperties::builder()
        .with_footer_key(vec![1u8; 16])
        .build()
        .unwrap();
    let err = SerializedFileReader::new_with_properties(
        Bytes::from(buffer.clone()),
        &reader_props(wrong),
    )
    .unwrap_err();
    assert!(matches!(err, ParquetError::DecryptFailed(_)));

    // flipping one byte inside the encrypted footer region breaks the tag
    let tampered = flip_byte(&buffer, buffer.len() - 9);
    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let err =
        SerializedFileReader::new_with_properties(tampered, &reader_props(decryption))
            .unwrap_err();
    assert!(matches!(err, ParquetError::DecryptFailed(_)));
}

#[test]
fn test_encrypted_footer_gcm_ctr() {
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_algorithm(ParquetCipher::AES_GCM_CTR_V1)
        .build()
        .unwrap();
    let buffer = write_two_columns(encryption, Compression::UNCOMPRESSED, false);

    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader =
        SerializedFileReader::new_with_properties(Bytes::from(buffer), &reader_props(decryption))
            .unwrap();
    let values = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_per_column_key_isolation() {
    // S3: column b under its own key, footer encrypted
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_column_key_and_metadata("a", FOOTER_KEY.to_vec(), Some(b"kf".to_vec()))
        .with_column_key_and_metadata("b", COLUMN_KEY_B.to_vec(), Some(b"kb".to_vec()))
        .build()
        .unwrap();
    let buffer = write_two_columns(encryption, Compression::UNCOMPRESSED, false);

    // opening with the footer key and the key for column a only
    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .with_column_key("a", FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader = SerializedFileReader::new_with_properties(
        Bytes::from(buffer.clone()),
        &reader_props(decryption),
    )
    .unwrap();

    // column a is fully readable
    let values = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);

    // column b's metadata is unreadable, surfacing MissingColumnKey on
    // access rather than failing the open
    let column_b = reader.metadata().row_group(0).unwrap().column(1).unwrap();
    assert!(!column_b.is_metadata_set());
    match column_b.num_values().unwrap_err() {
        ParquetError::MissingColumnKey(path) => assert_eq!(path, "b"),
        other => panic!("unexpected error {other}"),
    }
    let err = read_column_values::<Int32Type, _>(&reader, 0, 1).unwrap_err();
    assert!(matches!(err, ParquetError::MissingColumnKey(_)));

    // with both keys everything is readable
    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .with_column_key("a", FOOTER_KEY.to_vec())
        .with_column_key("b", COLUMN_KEY_B.to_vec())
        .build()
        .unwrap();
    let reader =
        SerializedFileReader::new_with_properties(Bytes::from(buffer), &reader_props(decryption))
            .unwrap();
    let values = read_column_values::<Int32Type, _>(&reader, 0, 1).unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_plaintext_footer_signature() {
    // S4: plaintext footer carrying a footer-key signature
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_plaintext_footer()
        .build()
        .unwrap();
    let buffer = write_two_columns(encryption, Compression::UNCOMPRESSED, false);
    assert_eq!(&buffer[buffer.len() - 4..], b"PAR1");

    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader = SerializedFileReader::new_with_properties(
        Bytes::from(buffer.clone()),
        &reader_props(decryption),
    )
    .unwrap();
    assert!(reader.metadata().is_encryption_algorithm_set());
    let values = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);

    // flip a byte inside the serialized metadata without breaking the thrift
    // structure: a character of the created_by string
    let created_by_pos = buffer
        .windows(b"parquet-core".len())
        .rposition(|w| w == b"parquet-core")
        .unwrap();
    let tampered = flip_byte(&buffer, created_by_pos);
    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let err =
        SerializedFileReader::new_with_properties(tampered, &reader_props(decryption))
            .unwrap_err();
    assert!(matches!(err, ParquetError::DecryptFailed(_)));

    // replacing a byte of the signature's nonce also fails verification
    let nonce_pos = buffer.len() - 8 - 28;
    let tampered = flip_byte(&buffer, nonce_pos);
    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let err =
        SerializedFileReader::new_with_properties(tampered, &reader_props(decryption))
            .unwrap_err();
    assert!(matches!(err, ParquetError::DecryptFailed(_)));

    // with verification disabled the tampered footer still opens
    let tampered = flip_byte(&buffer, nonce_pos);
    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .disable_footer_signature_verification()
        .build()
        .unwrap();
    SerializedFileReader::new_with_properties(tampered, &reader_props(decryption)).unwrap();
}

#[test]
fn test_aad_prefix_mismatch() {
    // S5: the file was written with prefix "Y", the reader supplies "X"
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_aad_prefix(b"Y".to_vec())
        .build()
        .unwrap();
    let buffer = write_two_columns(encryption, Compression::UNCOMPRESSED, false);

    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .with_aad_prefix(b"X".to_vec())
        .build()
        .unwrap();
    let err = SerializedFileReader::new_with_properties(
        Bytes::from(buffer.clone()),
        &reader_props(decryption),
    )
    .unwrap_err();
    assert!(matches!(err, ParquetError::AadPrefixMismatch));

    // the matching prefix succeeds
    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .with_aad_prefix(b"Y".to_vec())
        .build()
        .unwrap();
    SerializedFileReader::new_with_properties(Bytes::from(buffer), &reader_props(decryption))
        .unwrap();
}

#[test]
fn test_aad_prefix_not_stored() {
    // the prefix is not stored, so reading without it must fail and
    // supplying it must succeed
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_aad_prefix(b"secret-prefix".to_vec())
        .with_aad_prefix_storage(false)
        .build()
        .unwrap();
    let buffer = write_two_columns(encryption, Compression::UNCOMPRESSED, false);

    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let err = SerializedFileReader::new_with_properties(
        Bytes::from(buffer.clone()),
        &reader_props(decryption),
    )
    .unwrap_err();
    assert!(matches!(err, ParquetError::MissingAadPrefix));

    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .with_aad_prefix(b"secret-prefix".to_vec())
        .build()
        .unwrap();
    let reader =
        SerializedFileReader::new_with_properties(Bytes::from(buffer), &reader_props(decryption))
            .unwrap();
    let values = read_column_values::<Int32Type, _>(&reader, 0, 0).unwrap();
    assert_eq!(values, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_page_ordinals_survive_buffered_writes() {
    // the AAD page ordinal of the k-th data page is k in both pager modes;
    // a successful decrypt of a multi-page buffered column proves it
    for buffered in [false, true] {
        let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
            .build()
            .unwrap();
        // a 64 byte page limit forces several pages per chunk
        let buffer = write_two_columns(encryption, Compression::UNCOMPRESSED, buffered);

        let decryption = FileDecryptionProperties::builder()
            .with_footer_key(FOOTER_KEY.to_vec())
            .build()
            .unwrap();
        let reader = SerializedFileReader::new_with_properties(
            Bytes::from(buffer),
            &reader_props(decryption),
        )
        .unwrap();
        for column in 0..2 {
            let values = read_column_values::<Int32Type, _>(&reader, 0, column).unwrap();
            assert_eq!(values, vec![1, 2, 3, 4, 5], "buffered={buffered}");
        }
    }
}

#[test]
fn test_plaintext_rejected_when_disallowed() {
    let schema = required_schema(&[("a", PhysicalType::INT32)]);
    let props = Arc::new(WriterProperties::builder().build());
    let mut buffer = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    let mut column = row_group.next_column().unwrap().unwrap();
    column
        .typed::<Int32Type>()
        .write_batch(&[1], None, None)
        .unwrap();
    column.close().unwrap();
    row_group.close().unwrap();
    writer.close().unwrap();

    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .disallow_plaintext_files()
        .build()
        .unwrap();
    let err = SerializedFileReader::new_with_properties(
        Bytes::from(buffer),
        &reader_props(decryption),
    )
    .unwrap_err();
    assert!(matches!(err, ParquetError::PlaintextNotAllowed));
}

#[test]
fn test_plaintext_footer_column_key_access() {
    // column-key columns in a plaintext-footer file: the real metadata lives
    // in the encrypted blob; the plaintext copy is redacted for readers that
    // predate encryption
    let encryption = FileEncryptionProperties::builder(FOOTER_KEY.to_vec())
        .with_plaintext_footer()
        .with_column_key("a", FOOTER_KEY.to_vec())
        .with_column_key("b", COLUMN_KEY_B.to_vec())
        .build()
        .unwrap();
    let buffer = write_two_columns(encryption, Compression::UNCOMPRESSED, false);

    // the plaintext footer opens without any keys, but metadata access for
    // the encrypted columns needs them
    let reader = SerializedFileReader::new(Bytes::from(buffer.clone())).unwrap();
    let column = reader.metadata().row_group(0).unwrap().column(0).unwrap();
    assert!(!column.is_metadata_set());
    assert!(matches!(
        column.num_values().unwrap_err(),
        ParquetError::MissingColumnKey(_)
    ));

    // with the column key, the decrypted metadata carries the statistics the
    // redacted copy omits
    let decryption = FileDecryptionProperties::builder()
        .with_footer_key(FOOTER_KEY.to_vec())
        .with_column_key("a", FOOTER_KEY.to_vec())
        .build()
        .unwrap();
    let reader = SerializedFileReader::new_with_properties(
        Bytes::from(buffer),
        &reader_props(decryption),
    )
    .unwrap();
    let column = reader.metadata().row_group(0).unwrap().column(0).unwrap();
    assert_eq!(column.num_values().unwrap(), 5);
    assert!(column.statistics().unwrap().is_some());
}
