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

//! Footer parsing: locates and validates the trailing footer, classifies the
//! file as plaintext, plaintext-with-signed-footer or encrypted-footer, and
//! constructs the matching decryption context.

use std::sync::Arc;

use crate::basic::ParquetCipher;
use crate::encryption::decrypt::{FileDecryptionProperties, InternalFileDecryptor};
use crate::encryption::modules::create_footer_aad;
use crate::errors::{ParquetError, Result};
use crate::file::metadata::ParquetMetaData;
use crate::file::properties::ReaderProperties;
use crate::file::reader::ChunkReader;
use crate::file::{DEFAULT_FOOTER_READ_SIZE, FOOTER_SIZE, PARQUET_EMAGIC, PARQUET_MAGIC};
use crate::format;
use crate::thrift::read_thrift_object;

// AAD-relevant parts of a parsed encryption algorithm.
struct AlgorithmParts {
    cipher: ParquetCipher,
    aad_prefix: Option<Vec<u8>>,
    aad_file_unique: Vec<u8>,
    supply_aad_prefix: bool,
}

fn algorithm_parts(algo: &format::EncryptionAlgorithm) -> Result<AlgorithmParts> {
    let (cipher, aad_prefix, aad_file_unique, supply_aad_prefix) = match algo {
        format::EncryptionAlgorithm::AES_GCM_V1(a) => (
            ParquetCipher::AES_GCM_V1,
            a.aad_prefix.clone(),
            a.aad_file_unique.clone(),
            a.supply_aad_prefix,
        ),
        format::EncryptionAlgorithm::AES_GCM_CTR_V1(a) => (
            ParquetCipher::AES_GCM_CTR_V1,
            a.aad_prefix.clone(),
            a.aad_file_unique.clone(),
            a.supply_aad_prefix,
        ),
    };
    let aad_file_unique = aad_file_unique
        .ok_or_else(|| general_err!("AAD unique file identifier is not set"))?;
    Ok(AlgorithmParts {
        cipher,
        aad_prefix: aad_prefix.filter(|p| !p.is_empty()),
        aad_file_unique,
        supply_aad_prefix: supply_aad_prefix.unwrap_or(false),
    })
}

/// Reconciles the AAD prefix stored in the file with the one supplied in the
/// decryption properties, returning the file AAD
/// (`aad_prefix || aad_file_unique`).
///
/// The handshake cases:
/// * prefix in file and in properties: must match, else
///   [`ParquetError::AadPrefixMismatch`];
/// * prefix in file only: accept the file's prefix, invoking a registered
///   verifier;
/// * `supply_aad_prefix` set but no prefix in the properties:
///   [`ParquetError::MissingAadPrefix`];
/// * prefix in properties only, with `supply_aad_prefix` unset:
///   [`ParquetError::UnexpectedAadPrefix`];
/// * verifier registered but no prefix in the file:
///   [`ParquetError::VerifierWithoutPrefix`].
fn handle_aad_prefix(
    properties: &FileDecryptionProperties,
    parts: &AlgorithmParts,
) -> Result<Vec<u8>> {
    let prefix_in_properties = properties.aad_prefix();

    if parts.supply_aad_prefix && prefix_in_properties.is_none() {
        return Err(ParquetError::MissingAadPrefix);
    }

    let aad_prefix: Vec<u8> = match parts.aad_prefix.as_deref() {
        Some(prefix_in_file) => {
            if let Some(prefix) = prefix_in_properties {
                if prefix != prefix_in_file {
                    return Err(ParquetError::AadPrefixMismatch);
                }
            }
            if let Some(verifier) = properties.aad_prefix_verifier() {
                verifier.verify(prefix_in_file)?;
            }
            prefix_in_file.to_vec()
        }
        None => {
            if !parts.supply_aad_prefix && prefix_in_properties.is_some() {
                return Err(ParquetError::UnexpectedAadPrefix);
            }
            if properties.aad_prefix_verifier().is_some() {
                return Err(ParquetError::VerifierWithoutPrefix);
            }
            prefix_in_properties.map(|p| p.to_vec()).unwrap_or_default()
        }
    };

    Ok([aad_prefix.as_slice(), parts.aad_file_unique.as_slice()].concat())
}

/// Reads and parses the metadata from the footer of a Parquet file,
/// dispatching on the trailing magic bytes.
pub fn parse_metadata<R: ChunkReader>(
    chunk_reader: &R,
    properties: &ReaderProperties,
) -> Result<ParquetMetaData> {
    let file_size = chunk_reader.len();
    if file_size == 0 {
        return Err(ParquetError::InvalidFooter("file size is 0 bytes".to_owned()));
    }
    if file_size < FOOTER_SIZE as u64 {
        return Err(ParquetError::InvalidFooter(format!(
            "file size {file_size} is smaller than the {FOOTER_SIZE} byte footer"
        )));
    }

    let footer_read_size = file_size.min(DEFAULT_FOOTER_READ_SIZE);
    let tail = chunk_reader.get_bytes(file_size - footer_read_size, footer_read_size as usize)?;

    let magic = &tail[tail.len() - 4..];
    if magic == PARQUET_MAGIC {
        parse_plaintext_footer(chunk_reader, properties, &tail, file_size)
    } else if magic == PARQUET_EMAGIC {
        parse_encrypted_footer(chunk_reader, properties, &tail, file_size)
    } else {
        Err(ParquetError::InvalidFooter("corrupt footer".to_owned()))
    }
}

// Reads the `len` bytes preceding the 8-byte footer, reusing the tail buffer
// when it already covers them.
fn read_metadata_bytes<R: ChunkReader>(
    chunk_reader: &R,
    tail: &[u8],
    file_size: u64,
    len: usize,
) -> Result<Vec<u8>> {
    if FOOTER_SIZE + len > file_size as usize {
        return Err(ParquetError::InvalidFooter(format!(
            "reported metadata length of {len} + {FOOTER_SIZE} byte footer, but file is \
             only {file_size} bytes"
        )));
    }
    if tail.len() >= len + FOOTER_SIZE {
        Ok(tail[tail.len() - FOOTER_SIZE - len..tail.len() - FOOTER_SIZE].to_vec())
    } else {
        let start = file_size - (len + FOOTER_SIZE) as u64;
        Ok(chunk_reader.get_bytes(start, len)?.to_vec())
    }
}

fn footer_len(tail: &[u8]) -> usize {
    let at = tail.len() - FOOTER_SIZE;
    u32::from_le_bytes(tail[at..at + 4].try_into().unwrap()) as usize
}

// Plaintext or plaintext-footer mode: the metadata itself is unencrypted,
// but may carry an encryption algorithm and a trailing signature.
fn parse_plaintext_footer<R: ChunkReader>(
    chunk_reader: &R,
    properties: &ReaderProperties,
    tail: &[u8],
    file_size: u64,
) -> Result<ParquetMetaData> {
    let metadata_len = footer_len(tail);
    let metadata_bytes = read_metadata_bytes(chunk_reader, tail, file_size, metadata_len)?;

    let (file_metadata, thrift_len) = read_thrift_object::<format::FileMetaData>(
        &metadata_bytes,
        None,
        &[],
    )
    .map_err(|e| ParquetError::DeserializeFailed(format!("could not parse metadata: {e}")))?;

    let mut metadata = ParquetMetaData::new(file_metadata, None)?;
    let decryption_properties = properties.file_decryption_properties();

    let algorithm = match metadata.encryption_algorithm() {
        None => {
            // non-encrypted file
            if let Some(props) = decryption_properties {
                if !props.plaintext_files_allowed() {
                    return Err(ParquetError::PlaintextNotAllowed);
                }
            }
            return Ok(metadata);
        }
        Some(algorithm) => algorithm.clone(),
    };

    // Encrypted file with plaintext footer. Decryption properties are not
    // mandatory here: a legacy reader can still read the plaintext columns.
    if let Some(props) = decryption_properties {
        let parts = algorithm_parts(&algorithm)?;
        let file_aad = handle_aad_prefix(props, &parts)?;
        let file_decryptor =
            InternalFileDecryptor::new(Arc::clone(props), file_aad, parts.cipher);

        if props.check_plaintext_footer_integrity() {
            let signature = &metadata_bytes[thrift_len..];
            file_decryptor
                .verify_plaintext_footer_signature(&metadata_bytes[..thrift_len], signature)?;
        }
        metadata.set_file_decryptor(file_decryptor);
    }

    Ok(metadata)
}

// Encrypted footer mode: FileCryptoMetaData (plaintext) is followed by the
// encrypted FileMetaData; the trailing length covers both.
fn parse_encrypted_footer<R: ChunkReader>(
    chunk_reader: &R,
    properties: &ReaderProperties,
    tail: &[u8],
    file_size: u64,
) -> Result<ParquetMetaData> {
    let combined_len = footer_len(tail);
    let combined = read_metadata_bytes(chunk_reader, tail, file_size, combined_len)?;

    let decryption_properties = properties
        .file_decryption_properties()
        .ok_or(ParquetError::MissingFooterKey)?;

    let (crypto_metadata, crypto_len) = read_thrift_object::<format::FileCryptoMetaData>(
        &combined,
        None,
        &[],
    )
    .map_err(|e| {
        ParquetError::DeserializeFailed(format!("could not parse crypto metadata: {e}"))
    })?;

    let parts = algorithm_parts(&crypto_metadata.encryption_algorithm)?;
    let file_aad = handle_aad_prefix(decryption_properties, &parts)?;
    let file_decryptor =
        InternalFileDecryptor::new(Arc::clone(decryption_properties), file_aad, parts.cipher);

    let footer_decryptor = file_decryptor.get_footer_decryptor()?;
    let footer_aad = create_footer_aad(file_decryptor.file_aad())?;

    let (file_metadata, _) = read_thrift_object::<format::FileMetaData>(
        &combined[crypto_len..],
        Some(&footer_decryptor),
        &footer_aad,
    )?;

    ParquetMetaData::new(file_metadata, Some(file_decryptor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn decryption_props(
        aad_prefix: Option<&[u8]>,
    ) -> Arc<FileDecryptionProperties> {
        let mut builder = FileDecryptionProperties::builder().with_footer_key(vec![0u8; 16]);
        if let Some(prefix) = aad_prefix {
            builder = builder.with_aad_prefix(prefix.to_vec());
        }
        Arc::new(builder.build().unwrap())
    }

    fn parts(
        aad_prefix: Option<&[u8]>,
        supply_aad_prefix: bool,
    ) -> AlgorithmParts {
        AlgorithmParts {
            cipher: ParquetCipher::AES_GCM_V1,
            aad_prefix: aad_prefix.map(|p| p.to_vec()),
            aad_file_unique: vec![1, 2, 3, 4, 5, 6, 7, 8],
            supply_aad_prefix,
        }
    }

    #[test]
    fn test_aad_prefix_both_match() {
        let file_aad =
            handle_aad_prefix(&decryption_props(Some(b"X")), &parts(Some(b"X"), false)).unwrap();
        assert_eq!(file_aad, [b"X".as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]].concat());
    }

    #[test]
    fn test_aad_prefix_mismatch() {
        let err = handle_aad_prefix(&decryption_props(Some(b"X")), &parts(Some(b"Y"), false))
            .unwrap_err();
        assert!(matches!(err, ParquetError::AadPrefixMismatch));
    }

    #[test]
    fn test_aad_prefix_from_file_only() {
        let file_aad =
            handle_aad_prefix(&decryption_props(None), &parts(Some(b"Z"), false)).unwrap();
        assert_eq!(file_aad, [b"Z".as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]].concat());
    }

    #[test]
    fn test_aad_prefix_must_be_supplied() {
        let err = handle_aad_prefix(&decryption_props(None), &parts(None, true)).unwrap_err();
        assert!(matches!(err, ParquetError::MissingAadPrefix));
    }

    #[test]
    fn test_aad_prefix_unexpected() {
        let err =
            handle_aad_prefix(&decryption_props(Some(b"X")), &parts(None, false)).unwrap_err();
        assert!(matches!(err, ParquetError::UnexpectedAadPrefix));
    }

    #[test]
    fn test_aad_prefix_supplied_out_of_band() {
        let file_aad =
            handle_aad_prefix(&decryption_props(Some(b"X")), &parts(None, true)).unwrap();
        assert_eq!(file_aad, [b"X".as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]].concat());
    }

    #[test]
    fn test_verifier_without_prefix() {
        struct Verifier;
        impl crate::encryption::decrypt::AadPrefixVerifier for Verifier {
            fn verify(&self, _aad_prefix: &[u8]) -> Result<()> {
                Ok(())
            }
        }
        let props = Arc::new(
            FileDecryptionProperties::builder()
                .with_footer_key(vec![0u8; 16])
                .with_aad_prefix_verifier(Arc::new(Verifier))
                .build()
                .unwrap(),
        );
        let err = handle_aad_prefix(&props, &parts(None, false)).unwrap_err();
        assert!(matches!(err, ParquetError::VerifierWithoutPrefix));
    }

    #[test]
    fn test_file_too_short() {
        let data = Bytes::from_static(b"PAR1");
        let err = parse_metadata(&data, &ReaderProperties::default()).unwrap_err();
        assert!(matches!(err, ParquetError::InvalidFooter(_)));
    }

    #[test]
    fn test_corrupt_magic() {
        let data = Bytes::from_static(b"PAR1junkjunkXXXX");
        let err = parse_metadata(&data, &ReaderProperties::default()).unwrap_err();
        assert!(matches!(err, ParquetError::InvalidFooter(_)));
    }

    #[test]
    fn test_metadata_length_exceeds_file() {
        let mut data = b"PAR1".to_vec();
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(b"PAR1");
        let err = parse_metadata(&Bytes::from(data), &ReaderProperties::default()).unwrap_err();
        assert!(matches!(err, ParquetError::InvalidFooter(_)));
    }

    #[test]
    fn test_encrypted_footer_without_keys() {
        let mut data = b"PAR1".to_vec();
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(b"PARE");
        let err = parse_metadata(&Bytes::from(data), &ReaderProperties::default()).unwrap_err();
        assert!(matches!(err, ParquetError::MissingFooterKey));
    }
}
