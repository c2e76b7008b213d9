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

//! Write-side encryption context: file encryption properties and the
//! internal file encryptor that vends per-module encryptor handles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::basic::ParquetCipher;
use crate::encryption::ciphers::{
    AesCtrEncryptor, AesGcmEncryptor, BlockEncryptor, NONCE_LEN,
};
use crate::errors::{ParquetError, Result};
use crate::format::{AesGcmCtrV1, AesGcmV1, EncryptionAlgorithm};

const AAD_FILE_UNIQUE_LEN: usize = 8;

fn validate_key_length(key: &[u8]) -> Result<()> {
    match key.len() {
        16 | 24 | 32 => Ok(()),
        n => Err(general_err!(
            "Invalid AES key length {}, must be 16, 24 or 32 bytes",
            n
        )),
    }
}

fn zeroize(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        unsafe { std::ptr::write_volatile(b, 0) };
    }
}

/// Encryption key and retrieval metadata for one column.
#[derive(Clone, PartialEq, Eq)]
pub struct ColumnEncryptionProperties {
    key: Vec<u8>,
    key_metadata: Option<Vec<u8>>,
}

impl ColumnEncryptionProperties {
    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    pub(crate) fn key_metadata(&self) -> Option<&[u8]> {
        self.key_metadata.as_deref()
    }
}

impl fmt::Debug for ColumnEncryptionProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never print key bytes
        write!(f, "ColumnEncryptionProperties {{ }}")
    }
}

/// How a given column is encrypted under the current file properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ColumnEncryptionSetup {
    /// Column is written in plaintext.
    Plaintext,
    /// Column is encrypted with the footer key.
    FooterKey,
    /// Column is encrypted with its own key.
    ColumnKey(ColumnEncryptionProperties),
}

impl ColumnEncryptionSetup {
    pub(crate) fn is_encrypted(&self) -> bool {
        !matches!(self, Self::Plaintext)
    }

    pub(crate) fn is_encrypted_with_footer_key(&self) -> bool {
        matches!(self, Self::FooterKey)
    }
}

/// Configuration for writing an encrypted Parquet file.
///
/// Carries the cipher choice, the footer key, optional per-column keys,
/// whether the footer is encrypted or only signed, and the AAD prefix
/// discipline. The per-file unique AAD suffix is drawn at build time.
#[derive(Clone, PartialEq, Eq)]
pub struct FileEncryptionProperties {
    encrypt_footer: bool,
    cipher: ParquetCipher,
    footer_key: Vec<u8>,
    footer_key_metadata: Option<Vec<u8>>,
    column_keys: HashMap<String, ColumnEncryptionProperties>,
    aad_prefix: Option<Vec<u8>>,
    store_aad_prefix: bool,
    aad_file_unique: Vec<u8>,
    file_aad: Vec<u8>,
}

impl FileEncryptionProperties {
    /// Returns a new builder using `footer_key` to encrypt (or sign) the
    /// footer.
    pub fn builder(footer_key: Vec<u8>) -> EncryptionPropertiesBuilder {
        EncryptionPropertiesBuilder::new(footer_key)
    }

    /// Whether the footer is encrypted (as opposed to plaintext-with-signature).
    pub fn encrypt_footer(&self) -> bool {
        self.encrypt_footer
    }

    /// The configured cipher variant.
    pub fn cipher(&self) -> ParquetCipher {
        self.cipher
    }

    /// The per-file AAD: `aad_prefix || aad_file_unique`.
    pub fn file_aad(&self) -> &[u8] {
        &self.file_aad
    }

    /// Retrieval metadata for the footer key, if any.
    pub fn footer_key_metadata(&self) -> Option<&[u8]> {
        self.footer_key_metadata.as_deref()
    }

    pub(crate) fn footer_key(&self) -> &[u8] {
        &self.footer_key
    }

    /// How the column at `path` (dot-joined) is encrypted. When no per-column
    /// keys were configured, encryption is uniform and every column uses the
    /// footer key.
    pub(crate) fn column_setup(&self, path: &str) -> ColumnEncryptionSetup {
        if self.column_keys.is_empty() {
            return ColumnEncryptionSetup::FooterKey;
        }
        match self.column_keys.get(path) {
            Some(props) => ColumnEncryptionSetup::ColumnKey(props.clone()),
            None => ColumnEncryptionSetup::Plaintext,
        }
    }

    /// The algorithm descriptor written to the file, carrying the AAD
    /// metadata. The prefix is stored only when prefix storage is enabled;
    /// otherwise readers must supply it out of band.
    pub(crate) fn algorithm(&self) -> EncryptionAlgorithm {
        let stored_prefix = match (&self.aad_prefix, self.store_aad_prefix) {
            (Some(prefix), true) => Some(prefix.clone()),
            _ => None,
        };
        let supply_aad_prefix = self.aad_prefix.as_ref().map(|_| !self.store_aad_prefix);
        let aad_file_unique = Some(self.aad_file_unique.clone());
        match self.cipher {
            ParquetCipher::AES_GCM_V1 => EncryptionAlgorithm::AES_GCM_V1(AesGcmV1 {
                aad_prefix: stored_prefix,
                aad_file_unique,
                supply_aad_prefix,
            }),
            ParquetCipher::AES_GCM_CTR_V1 => EncryptionAlgorithm::AES_GCM_CTR_V1(AesGcmCtrV1 {
                aad_prefix: stored_prefix,
                aad_file_unique,
                supply_aad_prefix,
            }),
        }
    }

    /// The signing algorithm recorded in plaintext footers: always the GCM
    /// variant, regardless of the body cipher, with the same AAD metadata.
    pub(crate) fn signing_algorithm(&self) -> EncryptionAlgorithm {
        let stored_prefix = match (&self.aad_prefix, self.store_aad_prefix) {
            (Some(prefix), true) => Some(prefix.clone()),
            _ => None,
        };
        let supply_aad_prefix = self.aad_prefix.as_ref().map(|_| !self.store_aad_prefix);
        EncryptionAlgorithm::AES_GCM_V1(AesGcmV1 {
            aad_prefix: stored_prefix,
            aad_file_unique: Some(self.aad_file_unique.clone()),
            supply_aad_prefix,
        })
    }

    fn wipe_keys(&mut self) {
        zeroize(&mut self.footer_key);
        for props in self.column_keys.values_mut() {
            zeroize(&mut props.key);
        }
    }
}

impl fmt::Debug for FileEncryptionProperties {
    // key material must never leak through Debug output
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileEncryptionProperties {{ }}")
    }
}

/// Builder for [`FileEncryptionProperties`].
pub struct EncryptionPropertiesBuilder {
    encrypt_footer: bool,
    cipher: ParquetCipher,
    footer_key: Vec<u8>,
    footer_key_metadata: Option<Vec<u8>>,
    column_keys: HashMap<String, ColumnEncryptionProperties>,
    aad_prefix: Option<Vec<u8>>,
    store_aad_prefix: bool,
}

impl EncryptionPropertiesBuilder {
    fn new(footer_key: Vec<u8>) -> Self {
        Self {
            encrypt_footer: true,
            cipher: ParquetCipher::AES_GCM_V1,
            footer_key,
            footer_key_metadata: None,
            column_keys: HashMap::new(),
            aad_prefix: None,
            store_aad_prefix: true,
        }
    }

    /// Keep the footer in plaintext and only sign it with the footer key.
    pub fn with_plaintext_footer(mut self) -> Self {
        self.encrypt_footer = false;
        self
    }

    /// Choose the cipher variant. Defaults to AES_GCM_V1.
    pub fn with_algorithm(mut self, cipher: ParquetCipher) -> Self {
        self.cipher = cipher;
        self
    }

    /// Attach retrieval metadata for the footer key.
    pub fn with_footer_key_metadata(mut self, metadata: Vec<u8>) -> Self {
        self.footer_key_metadata = Some(metadata);
        self
    }

    /// Encrypt the column at `path` (dot-joined) with its own key. Columns
    /// without a key remain plaintext once any column key is configured.
    pub fn with_column_key(self, path: &str, key: Vec<u8>) -> Self {
        self.with_column_key_and_metadata(path, key, None)
    }

    /// Like [`Self::with_column_key`], with retrieval metadata for the key.
    pub fn with_column_key_and_metadata(
        mut self,
        path: &str,
        key: Vec<u8>,
        key_metadata: Option<Vec<u8>>,
    ) -> Self {
        self.column_keys.insert(
            path.to_owned(),
            ColumnEncryptionProperties { key, key_metadata },
        );
        self
    }

    /// Set the AAD prefix for the file.
    pub fn with_aad_prefix(mut self, aad_prefix: Vec<u8>) -> Self {
        self.aad_prefix = Some(aad_prefix);
        self
    }

    /// Control whether the AAD prefix is stored in the file. When disabled,
    /// readers must supply the prefix in their decryption properties.
    pub fn with_aad_prefix_storage(mut self, store_aad_prefix: bool) -> Self {
        self.store_aad_prefix = store_aad_prefix;
        self
    }

    /// Finalize the builder, drawing the per-file unique AAD suffix.
    pub fn build(self) -> Result<FileEncryptionProperties> {
        validate_key_length(&self.footer_key)?;
        for (path, props) in &self.column_keys {
            validate_key_length(&props.key)
                .map_err(|e| general_err!("column '{}': {}", path, e))?;
        }

        let mut aad_file_unique = vec![0u8; AAD_FILE_UNIQUE_LEN];
        OsRng.fill_bytes(&mut aad_file_unique);

        let file_aad = match self.aad_prefix.as_ref() {
            None => aad_file_unique.clone(),
            Some(prefix) => [prefix.as_slice(), aad_file_unique.as_slice()].concat(),
        };

        Ok(FileEncryptionProperties {
            encrypt_footer: self.encrypt_footer,
            cipher: self.cipher,
            footer_key: self.footer_key,
            footer_key_metadata: self.footer_key_metadata,
            column_keys: self.column_keys,
            aad_prefix: self.aad_prefix,
            store_aad_prefix: self.store_aad_prefix,
            aad_file_unique,
            file_aad,
        })
    }
}

/// Non-owning handle to a keyed cipher plus the per-file AAD. Handles are
/// cheap to clone; the underlying primitive is shared.
#[derive(Clone, Debug)]
pub(crate) struct Encryptor {
    aes: Arc<dyn BlockEncryptor>,
    file_aad: Vec<u8>,
}

impl Encryptor {
    fn new(aes: Arc<dyn BlockEncryptor>, file_aad: Vec<u8>) -> Self {
        Self { aes, file_aad }
    }

    pub(crate) fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        self.aes.encrypt(plaintext, aad)
    }

    pub(crate) fn signed_encrypt(
        &self,
        plaintext: &[u8],
        aad: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>> {
        self.aes.signed_encrypt(plaintext, aad, nonce)
    }

    pub(crate) fn ciphertext_size_delta(&self) -> usize {
        self.aes.ciphertext_size_delta()
    }

    pub(crate) fn file_aad(&self) -> &[u8] {
        &self.file_aad
    }
}

/// Write-side encryption context: owns all keyed primitives for a file and
/// vends [`Encryptor`] handles per module.
///
/// Metadata modules (footer, column metadata, page headers) always use GCM;
/// data modules use GCM or CTR depending on the configured cipher. Handles
/// are cached by column path so repeated lookups return the same primitive.
/// Deliberately `!Sync`: a writer context belongs to one thread.
pub(crate) struct InternalFileEncryptor {
    properties: FileEncryptionProperties,
    footer_encryptor: RefCell<Option<Encryptor>>,
    footer_signing_encryptor: RefCell<Option<Encryptor>>,
    column_metadata_encryptors: RefCell<HashMap<String, Encryptor>>,
    column_data_encryptors: RefCell<HashMap<String, Encryptor>>,
}

impl InternalFileEncryptor {
    pub(crate) fn new(properties: FileEncryptionProperties) -> Self {
        Self {
            properties,
            footer_encryptor: RefCell::new(None),
            footer_signing_encryptor: RefCell::new(None),
            column_metadata_encryptors: RefCell::new(HashMap::new()),
            column_data_encryptors: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn properties(&self) -> &FileEncryptionProperties {
        &self.properties
    }

    fn gcm_encryptor(&self, key: &[u8]) -> Result<Arc<dyn BlockEncryptor>> {
        Ok(Arc::new(AesGcmEncryptor::new(key)?))
    }

    fn data_encryptor_for(&self, key: &[u8]) -> Result<Arc<dyn BlockEncryptor>> {
        match self.properties.cipher {
            ParquetCipher::AES_GCM_V1 => self.gcm_encryptor(key),
            ParquetCipher::AES_GCM_CTR_V1 => Ok(Arc::new(AesCtrEncryptor::new(key)?)),
        }
    }

    /// The encryptor used for the footer module (GCM, footer key).
    pub(crate) fn get_footer_encryptor(&self) -> Result<Encryptor> {
        let mut cached = self.footer_encryptor.borrow_mut();
        if cached.is_none() {
            let aes = self.gcm_encryptor(self.properties.footer_key())?;
            *cached = Some(Encryptor::new(aes, self.properties.file_aad().to_vec()));
        }
        Ok(cached.as_ref().unwrap().clone())
    }

    /// The encryptor used to sign plaintext footers. Semantically distinct
    /// from [`Self::get_footer_encryptor`] even though both use the footer
    /// key with GCM.
    pub(crate) fn get_footer_signing_encryptor(&self) -> Result<Encryptor> {
        let mut cached = self.footer_signing_encryptor.borrow_mut();
        if cached.is_none() {
            let aes = self.gcm_encryptor(self.properties.footer_key())?;
            *cached = Some(Encryptor::new(aes, self.properties.file_aad().to_vec()));
        }
        Ok(cached.as_ref().unwrap().clone())
    }

    /// Encryptor for the column metadata and page-header modules of the
    /// column at `path`, or `None` when the column is plaintext.
    pub(crate) fn get_column_meta_encryptor(&self, path: &str) -> Result<Option<Encryptor>> {
        self.get_column_encryptor(path, true)
    }

    /// Encryptor for the page-body modules of the column at `path`, or `None`
    /// when the column is plaintext.
    pub(crate) fn get_column_data_encryptor(&self, path: &str) -> Result<Option<Encryptor>> {
        self.get_column_encryptor(path, false)
    }

    fn get_column_encryptor(&self, path: &str, metadata: bool) -> Result<Option<Encryptor>> {
        let setup = self.properties.column_setup(path);
        let key = match &setup {
            ColumnEncryptionSetup::Plaintext => return Ok(None),
            ColumnEncryptionSetup::FooterKey => self.properties.footer_key().to_vec(),
            ColumnEncryptionSetup::ColumnKey(props) => props.key().to_vec(),
        };
        let cache = if metadata {
            &self.column_metadata_encryptors
        } else {
            &self.column_data_encryptors
        };
        let mut cache = cache.borrow_mut();
        if let Some(encryptor) = cache.get(path) {
            return Ok(Some(encryptor.clone()));
        }
        let aes = if metadata {
            self.gcm_encryptor(&key)?
        } else {
            self.data_encryptor_for(&key)?
        };
        let encryptor = Encryptor::new(aes, self.properties.file_aad().to_vec());
        cache.insert(path.to_owned(), encryptor.clone());
        Ok(Some(encryptor))
    }

    /// Drops every cached primitive and zeroizes all key material held by
    /// this context. The context must not be used afterwards.
    pub(crate) fn wipe_out_encryption_keys(&mut self) {
        self.footer_encryptor.borrow_mut().take();
        self.footer_signing_encryptor.borrow_mut().take();
        self.column_metadata_encryptors.borrow_mut().clear();
        self.column_data_encryptors.borrow_mut().clear();
        self.properties.wipe_keys();
    }
}

impl fmt::Debug for InternalFileEncryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InternalFileEncryptor {{ }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> FileEncryptionProperties {
        FileEncryptionProperties::builder(vec![0u8; 16])
            .with_column_key("a", vec![1u8; 16])
            .build()
            .unwrap()
    }

    #[test]
    fn test_file_aad_layout() {
        let props = FileEncryptionProperties::builder(vec![0u8; 16])
            .with_aad_prefix(b"prefix".to_vec())
            .build()
            .unwrap();
        assert_eq!(&props.file_aad()[..6], b"prefix");
        assert_eq!(props.file_aad().len(), 6 + AAD_FILE_UNIQUE_LEN);
    }

    #[test]
    fn test_builder_rejects_bad_keys() {
        assert!(FileEncryptionProperties::builder(vec![0u8; 5]).build().is_err());
        assert!(FileEncryptionProperties::builder(vec![0u8; 16])
            .with_column_key("a", vec![0u8; 17])
            .build()
            .is_err());
    }

    #[test]
    fn test_uniform_encryption_uses_footer_key_everywhere() {
        let props = FileEncryptionProperties::builder(vec![0u8; 16]).build().unwrap();
        assert_eq!(props.column_setup("anything"), ColumnEncryptionSetup::FooterKey);
    }

    #[test]
    fn test_per_column_setup() {
        let props = props();
        assert!(matches!(
            props.column_setup("a"),
            ColumnEncryptionSetup::ColumnKey(_)
        ));
        assert_eq!(props.column_setup("b"), ColumnEncryptionSetup::Plaintext);
    }

    #[test]
    fn test_signing_algorithm_is_always_gcm() {
        let props = FileEncryptionProperties::builder(vec![0u8; 16])
            .with_algorithm(ParquetCipher::AES_GCM_CTR_V1)
            .with_plaintext_footer()
            .build()
            .unwrap();
        assert!(matches!(
            props.signing_algorithm(),
            EncryptionAlgorithm::AES_GCM_V1(_)
        ));
        assert!(matches!(
            props.algorithm(),
            EncryptionAlgorithm::AES_GCM_CTR_V1(_)
        ));
    }

    #[test]
    fn test_prefix_not_stored_when_storage_disabled() {
        let props = FileEncryptionProperties::builder(vec![0u8; 16])
            .with_aad_prefix(b"p".to_vec())
            .with_aad_prefix_storage(false)
            .build()
            .unwrap();
        match props.algorithm() {
            EncryptionAlgorithm::AES_GCM_V1(algo) => {
                assert_eq!(algo.aad_prefix, None);
                assert_eq!(algo.supply_aad_prefix, Some(true));
            }
            _ => panic!("expected GCM"),
        }
    }

    #[test]
    fn test_encryptor_cache_returns_same_handle() {
        let encryptor = InternalFileEncryptor::new(props());
        let a1 = encryptor.get_column_meta_encryptor("a").unwrap().unwrap();
        let a2 = encryptor.get_column_meta_encryptor("a").unwrap().unwrap();
        assert!(Arc::ptr_eq(&a1.aes, &a2.aes));
        assert!(encryptor.get_column_data_encryptor("b").unwrap().is_none());
    }

    #[test]
    fn test_wipe_clears_keys() {
        let mut encryptor = InternalFileEncryptor::new(props());
        let _ = encryptor.get_footer_encryptor().unwrap();
        encryptor.wipe_out_encryption_keys();
        assert!(encryptor.properties.footer_key().iter().all(|b| *b == 0));
        assert!(encryptor.footer_encryptor.borrow().is_none());
    }
}
