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

//! Read-side decryption context: file decryption properties and the internal
//! file decryptor that vends per-module decryptor handles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::basic::ParquetCipher;
use crate::encryption::ciphers::{
    AesCtrDecryptor, AesGcmDecryptor, AesGcmEncryptor, BlockDecryptor, BlockEncryptor,
    NONCE_LEN, SIGNATURE_LEN, TAG_LEN,
};
use crate::encryption::modules::create_footer_aad;
use crate::errors::{ParquetError, Result};

fn zeroize(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        unsafe { std::ptr::write_volatile(b, 0) };
    }
}

/// Callback verifying the AAD prefix of a file before it is trusted.
///
/// Registered through
/// [`DecryptionPropertiesBuilder::with_aad_prefix_verifier`]; invoked when a
/// file stores its own AAD prefix. Opening a file that stores no prefix while
/// a verifier is registered fails with
/// [`ParquetError::VerifierWithoutPrefix`].
pub trait AadPrefixVerifier {
    /// Verifies the prefix read from the file, failing to reject the file.
    fn verify(&self, aad_prefix: &[u8]) -> Result<()>;
}

/// Configuration for reading an encrypted Parquet file.
#[derive(Clone)]
pub struct FileDecryptionProperties {
    footer_key: Option<Vec<u8>>,
    column_keys: HashMap<String, Vec<u8>>,
    aad_prefix: Option<Vec<u8>>,
    aad_prefix_verifier: Option<Arc<dyn AadPrefixVerifier>>,
    footer_signature_verification: bool,
    plaintext_files_allowed: bool,
}

impl FileDecryptionProperties {
    /// Returns a new builder for decryption properties.
    pub fn builder() -> DecryptionPropertiesBuilder {
        DecryptionPropertiesBuilder::new()
    }

    /// Whether a footer key is configured.
    pub fn has_footer_key(&self) -> bool {
        self.footer_key.is_some()
    }

    /// The expected AAD prefix, when one was supplied.
    pub fn aad_prefix(&self) -> Option<&[u8]> {
        self.aad_prefix.as_deref()
    }

    /// The registered AAD prefix verifier, if any.
    pub fn aad_prefix_verifier(&self) -> Option<&Arc<dyn AadPrefixVerifier>> {
        self.aad_prefix_verifier.as_ref()
    }

    /// Whether plaintext footers must carry a verifiable signature.
    pub fn check_plaintext_footer_integrity(&self) -> bool {
        self.footer_signature_verification
    }

    /// Whether plaintext (unencrypted) files may be read with these
    /// properties at all.
    pub fn plaintext_files_allowed(&self) -> bool {
        self.plaintext_files_allowed
    }

    pub(crate) fn footer_key(&self) -> Result<&[u8]> {
        self.footer_key
            .as_deref()
            .ok_or(ParquetError::MissingFooterKey)
    }

    pub(crate) fn column_key(&self, path: &str) -> Result<&[u8]> {
        self.column_keys
            .get(path)
            .map(|k| k.as_slice())
            .ok_or_else(|| ParquetError::MissingColumnKey(path.to_owned()))
    }

    fn wipe_keys(&mut self) {
        if let Some(key) = self.footer_key.as_mut() {
            zeroize(key);
        }
        for key in self.column_keys.values_mut() {
            zeroize(key);
        }
    }
}

impl fmt::Debug for FileDecryptionProperties {
    // key material must never leak through Debug output
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileDecryptionProperties {{ }}")
    }
}

/// Builder for [`FileDecryptionProperties`].
pub struct DecryptionPropertiesBuilder {
    footer_key: Option<Vec<u8>>,
    column_keys: HashMap<String, Vec<u8>>,
    aad_prefix: Option<Vec<u8>>,
    aad_prefix_verifier: Option<Arc<dyn AadPrefixVerifier>>,
    footer_signature_verification: bool,
    plaintext_files_allowed: bool,
}

impl DecryptionPropertiesBuilder {
    fn new() -> Self {
        Self {
            footer_key: None,
            column_keys: HashMap::new(),
            aad_prefix: None,
            aad_prefix_verifier: None,
            footer_signature_verification: true,
            plaintext_files_allowed: true,
        }
    }

    /// Key for decrypting the footer, and column data under uniform
    /// encryption.
    pub fn with_footer_key(mut self, key: Vec<u8>) -> Self {
        self.footer_key = Some(key);
        self
    }

    /// Key for decrypting the column at `path` (dot-joined).
    pub fn with_column_key(mut self, path: &str, key: Vec<u8>) -> Self {
        self.column_keys.insert(path.to_owned(), key);
        self
    }

    /// The AAD prefix to use. Required when the file was written with a
    /// prefix that is not stored in the file.
    pub fn with_aad_prefix(mut self, aad_prefix: Vec<u8>) -> Self {
        self.aad_prefix = Some(aad_prefix);
        self
    }

    /// Register a verifier invoked on the AAD prefix stored in the file.
    pub fn with_aad_prefix_verifier(mut self, verifier: Arc<dyn AadPrefixVerifier>) -> Self {
        self.aad_prefix_verifier = Some(verifier);
        self
    }

    /// Disable verification of signatures in plaintext-footer files.
    /// Verification is enabled by default.
    pub fn disable_footer_signature_verification(mut self) -> Self {
        self.footer_signature_verification = false;
        self
    }

    /// Reject plaintext files: opening an unencrypted file with the built
    /// properties then fails with [`ParquetError::PlaintextNotAllowed`].
    pub fn disallow_plaintext_files(mut self) -> Self {
        self.plaintext_files_allowed = false;
        self
    }

    /// Finalize the builder. At least one key must be configured.
    pub fn build(self) -> Result<FileDecryptionProperties> {
        if self.footer_key.is_none() && self.column_keys.is_empty() {
            return Err(general_err!(
                "Footer key or at least one column key is required"
            ));
        }
        Ok(FileDecryptionProperties {
            footer_key: self.footer_key,
            column_keys: self.column_keys,
            aad_prefix: self.aad_prefix,
            aad_prefix_verifier: self.aad_prefix_verifier,
            footer_signature_verification: self.footer_signature_verification,
            plaintext_files_allowed: self.plaintext_files_allowed,
        })
    }
}

/// Non-owning handle to a keyed decryption primitive plus the per-file AAD.
#[derive(Clone, Debug)]
pub(crate) struct Decryptor {
    aes: Arc<dyn BlockDecryptor>,
    file_aad: Vec<u8>,
}

impl Decryptor {
    fn new(aes: Arc<dyn BlockDecryptor>, file_aad: Vec<u8>) -> Self {
        Self { aes, file_aad }
    }

    pub(crate) fn decrypt(&self, length_and_ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        self.aes.decrypt(length_and_ciphertext, aad)
    }

    pub(crate) fn ciphertext_size_delta(&self) -> usize {
        self.aes.ciphertext_size_delta()
    }

    pub(crate) fn file_aad(&self) -> &[u8] {
        &self.file_aad
    }
}

/// Read-side encryption context, constructed by the footer pipeline once the
/// file's algorithm and AAD are known.
///
/// Vends footer and per-column decryptor handles, caching them by column
/// path. A missing column key surfaces as
/// [`ParquetError::MissingColumnKey`] so that other columns stay readable.
/// Deliberately `!Sync`: a reader context belongs to one thread.
pub(crate) struct InternalFileDecryptor {
    properties: Arc<FileDecryptionProperties>,
    file_aad: Vec<u8>,
    cipher: ParquetCipher,
    footer_decryptor: RefCell<Option<Decryptor>>,
    column_metadata_decryptors: RefCell<HashMap<String, Decryptor>>,
    column_data_decryptors: RefCell<HashMap<String, Decryptor>>,
}

impl InternalFileDecryptor {
    pub(crate) fn new(
        properties: Arc<FileDecryptionProperties>,
        file_aad: Vec<u8>,
        cipher: ParquetCipher,
    ) -> Self {
        Self {
            properties,
            file_aad,
            cipher,
            footer_decryptor: RefCell::new(None),
            column_metadata_decryptors: RefCell::new(HashMap::new()),
            column_data_decryptors: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn properties(&self) -> &FileDecryptionProperties {
        &self.properties
    }

    pub(crate) fn file_aad(&self) -> &[u8] {
        &self.file_aad
    }

    /// The decryptor for the footer module, and for column modules encrypted
    /// with the footer key. Metadata modules are always GCM.
    pub(crate) fn get_footer_decryptor(&self) -> Result<Decryptor> {
        let mut cached = self.footer_decryptor.borrow_mut();
        if cached.is_none() {
            let key = self.properties.footer_key()?;
            let aes: Arc<dyn BlockDecryptor> = Arc::new(AesGcmDecryptor::new(key)?);
            *cached = Some(Decryptor::new(aes, self.file_aad.clone()));
        }
        Ok(cached.as_ref().unwrap().clone())
    }

    /// Decryptor for the data modules of a footer-key encrypted column.
    /// Under AES_GCM_CTR_V1 the page bodies use the CTR primitive.
    pub(crate) fn get_footer_data_decryptor(&self) -> Result<Decryptor> {
        match self.cipher {
            ParquetCipher::AES_GCM_V1 => self.get_footer_decryptor(),
            ParquetCipher::AES_GCM_CTR_V1 => {
                let key = self.properties.footer_key()?;
                let aes: Arc<dyn BlockDecryptor> = Arc::new(AesCtrDecryptor::new(key)?);
                Ok(Decryptor::new(aes, self.file_aad.clone()))
            }
        }
    }

    /// Decryptor for the column metadata and page-header modules of the
    /// column-key encrypted column at `path`.
    pub(crate) fn get_column_meta_decryptor(&self, path: &str) -> Result<Decryptor> {
        self.get_column_decryptor(path, true)
    }

    /// Decryptor for the page-body modules of the column-key encrypted column
    /// at `path`.
    pub(crate) fn get_column_data_decryptor(&self, path: &str) -> Result<Decryptor> {
        self.get_column_decryptor(path, false)
    }

    fn get_column_decryptor(&self, path: &str, metadata: bool) -> Result<Decryptor> {
        let cache = if metadata {
            &self.column_metadata_decryptors
        } else {
            &self.column_data_decryptors
        };
        let mut cache = cache.borrow_mut();
        if let Some(decryptor) = cache.get(path) {
            return Ok(decryptor.clone());
        }
        let key = self.properties.column_key(path)?;
        let aes: Arc<dyn BlockDecryptor> = if metadata {
            Arc::new(AesGcmDecryptor::new(key)?)
        } else {
            match self.cipher {
                ParquetCipher::AES_GCM_V1 => Arc::new(AesGcmDecryptor::new(key)?),
                ParquetCipher::AES_GCM_CTR_V1 => Arc::new(AesCtrDecryptor::new(key)?),
            }
        };
        let decryptor = Decryptor::new(aes, self.file_aad.clone());
        cache.insert(path.to_owned(), decryptor.clone());
        Ok(decryptor)
    }

    /// Verifies the 28-byte signature (`nonce || tag`) trailing a plaintext
    /// footer by re-encrypting the footer bytes with the stored nonce and
    /// comparing tags.
    pub(crate) fn verify_plaintext_footer_signature(
        &self,
        plaintext_footer: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        if signature.len() != SIGNATURE_LEN {
            return Err(ParquetError::InvalidSignatureLen(signature.len()));
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&signature[..NONCE_LEN]);
        let stored_tag = &signature[NONCE_LEN..];

        let aad = create_footer_aad(&self.file_aad)?;
        let encryptor = AesGcmEncryptor::new(self.properties.footer_key()?)?;
        let reencrypted = encryptor.signed_encrypt(plaintext_footer, &aad, &nonce)?;
        let computed_tag = &reencrypted[reencrypted.len() - TAG_LEN..];

        if computed_tag != stored_tag {
            return Err(ParquetError::DecryptFailed(
                "plaintext footer signature verification failed".to_owned(),
            ));
        }
        Ok(())
    }

    /// Drops every cached primitive and zeroizes the key material held by
    /// this context.
    pub(crate) fn wipe_out_decryption_keys(&mut self) {
        self.footer_decryptor.borrow_mut().take();
        self.column_metadata_decryptors.borrow_mut().clear();
        self.column_data_decryptors.borrow_mut().clear();
        // this context owns its own Arc; wipe a private copy when unshared
        if let Some(properties) = Arc::get_mut(&mut self.properties) {
            properties.wipe_keys();
        }
    }
}

impl fmt::Debug for InternalFileDecryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InternalFileDecryptor {{ }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_a_key() {
        assert!(FileDecryptionProperties::builder().build().is_err());
        assert!(FileDecryptionProperties::builder()
            .with_column_key("a", vec![0u8; 16])
            .build()
            .is_ok());
    }

    #[test]
    fn test_missing_footer_key() {
        let properties = Arc::new(
            FileDecryptionProperties::builder()
                .with_column_key("a", vec![0u8; 16])
                .build()
                .unwrap(),
        );
        let decryptor =
            InternalFileDecryptor::new(properties, b"aad".to_vec(), ParquetCipher::AES_GCM_V1);
        assert!(matches!(
            decryptor.get_footer_decryptor().unwrap_err(),
            ParquetError::MissingFooterKey
        ));
    }

    #[test]
    fn test_missing_column_key_is_recoverable_per_column() {
        let properties = Arc::new(
            FileDecryptionProperties::builder()
                .with_footer_key(vec![0u8; 16])
                .with_column_key("a", vec![1u8; 16])
                .build()
                .unwrap(),
        );
        let decryptor =
            InternalFileDecryptor::new(properties, b"aad".to_vec(), ParquetCipher::AES_GCM_V1);
        assert!(decryptor.get_column_meta_decryptor("a").is_ok());
        match decryptor.get_column_meta_decryptor("b").unwrap_err() {
            ParquetError::MissingColumnKey(path) => assert_eq!(path, "b"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_signature_roundtrip() {
        let key = vec![0u8; 16];
        let properties = Arc::new(
            FileDecryptionProperties::builder()
                .with_footer_key(key.clone())
                .build()
                .unwrap(),
        );
        let file_aad = b"unique".to_vec();
        let decryptor = InternalFileDecryptor::new(
            properties,
            file_aad.clone(),
            ParquetCipher::AES_GCM_V1,
        );

        // produce a signature the way the writer does
        let footer = b"serialized footer bytes";
        let aad = create_footer_aad(&file_aad).unwrap();
        let encryptor = AesGcmEncryptor::new(&key).unwrap();
        let framed = encryptor.encrypt(footer, &aad).unwrap();
        let nonce_start = 4;
        let mut signature = Vec::new();
        signature.extend_from_slice(&framed[nonce_start..nonce_start + NONCE_LEN]);
        signature.extend_from_slice(&framed[framed.len() - TAG_LEN..]);

        decryptor
            .verify_plaintext_footer_signature(footer, &signature)
            .unwrap();

        // tampering with the footer or the nonce breaks verification
        let mut tampered = footer.to_vec();
        tampered[0] ^= 1;
        assert!(decryptor
            .verify_plaintext_footer_signature(&tampered, &signature)
            .is_err());
        let mut bad_signature = signature.clone();
        bad_signature[0] ^= 1;
        assert!(decryptor
            .verify_plaintext_footer_signature(footer, &bad_signature)
            .is_err());

        // a signature of the wrong size is rejected outright
        assert!(matches!(
            decryptor
                .verify_plaintext_footer_signature(footer, &signature[1..])
                .unwrap_err(),
            ParquetError::InvalidSignatureLen(27)
        ));
    }
}
