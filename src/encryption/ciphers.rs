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

//! AES-GCM and AES-CTR block primitives together with the on-disk ciphertext
//! framing.
//!
//! Every encrypted module is framed as `len:u32_le || nonce:12 ||
//! ciphertext [|| tag:16]`; the length field covers everything after itself.
//! GCM frames carry the 16-byte authentication tag, CTR frames (used for page
//! bodies under AES_GCM_CTR_V1) do not.

use std::fmt::Debug;

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::errors::{ParquetError, Result};

pub(crate) const NONCE_LEN: usize = 12;
pub(crate) const TAG_LEN: usize = 16;
pub(crate) const SIZE_LEN: usize = 4;

/// Total framing overhead of a GCM encrypted module.
pub(crate) const GCM_SIZE_DELTA: usize = SIZE_LEN + NONCE_LEN + TAG_LEN;
/// Total framing overhead of a CTR encrypted module.
pub(crate) const CTR_SIZE_DELTA: usize = SIZE_LEN + NONCE_LEN;

/// The plaintext-footer signature is the nonce and tag of the footer module.
pub(crate) const SIGNATURE_LEN: usize = NONCE_LEN + TAG_LEN;

type Aes192Gcm = AesGcm<Aes192, U12>;

fn invalid_key_len(len: usize) -> ParquetError {
    general_err!("Invalid AES key length {}, must be 16, 24 or 32 bytes", len)
}

// Overwrites key material before the buffer is released.
fn zeroize(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        // volatile so the wipe is not elided as a dead store
        unsafe { std::ptr::write_volatile(b, 0) };
    }
}

/// Encrypting side of a module cipher.
pub(crate) trait BlockEncryptor: Debug {
    /// Encrypts `plaintext` bound to `aad` with a fresh random nonce,
    /// returning the framed ciphertext. The output length is always
    /// `plaintext.len() + self.ciphertext_size_delta()`.
    fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>>;

    /// Re-encrypts `plaintext` with the caller-supplied `nonce`. Only used to
    /// compute or verify plaintext-footer signatures, never on the write path
    /// proper (which must draw fresh nonces).
    fn signed_encrypt(&self, plaintext: &[u8], aad: &[u8], nonce: &[u8; NONCE_LEN])
        -> Result<Vec<u8>>;

    /// Framing overhead added to the plaintext length.
    fn ciphertext_size_delta(&self) -> usize;
}

/// Decrypting side of a module cipher.
pub(crate) trait BlockDecryptor: Debug {
    /// Decrypts a framed module (`len || nonce || ciphertext [|| tag]`),
    /// returning the plaintext. Fails with [`ParquetError::DecryptFailed`]
    /// when the tag does not verify or the framing is malformed.
    fn decrypt(&self, length_and_ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>>;

    /// Framing overhead subtracted from the module length.
    fn ciphertext_size_delta(&self) -> usize;
}

enum GcmCipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl GcmCipher {
    fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Ok(Self::Aes128(
                Aes128Gcm::new_from_slice(key).map_err(|_| invalid_key_len(key.len()))?,
            )),
            24 => Ok(Self::Aes192(
                Aes192Gcm::new_from_slice(key).map_err(|_| invalid_key_len(key.len()))?,
            )),
            32 => Ok(Self::Aes256(
                Aes256Gcm::new_from_slice(key).map_err(|_| invalid_key_len(key.len()))?,
            )),
            n => Err(invalid_key_len(n)),
        }
    }

    fn encrypt(&self, nonce: &[u8], payload: Payload<'_, '_>) -> Result<Vec<u8>> {
        let nonce = Nonce::from_slice(nonce);
        match self {
            Self::Aes128(c) => c.encrypt(nonce, payload),
            Self::Aes192(c) => c.encrypt(nonce, payload),
            Self::Aes256(c) => c.encrypt(nonce, payload),
        }
        .map_err(|_| general_err!("AES-GCM encryption failed"))
    }

    fn decrypt(&self, nonce: &[u8], payload: Payload<'_, '_>) -> Result<Vec<u8>> {
        let nonce = Nonce::from_slice(nonce);
        match self {
            Self::Aes128(c) => c.decrypt(nonce, payload),
            Self::Aes192(c) => c.decrypt(nonce, payload),
            Self::Aes256(c) => c.decrypt(nonce, payload),
        }
        .map_err(|_| {
            ParquetError::DecryptFailed("AES-GCM tag verification failed".to_owned())
        })
    }
}

impl Debug for GcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GcmCipher {{ }}")
    }
}

/// AES-GCM module cipher, used for footers, metadata modules, page headers
/// and (under AES_GCM_V1) page bodies.
pub(crate) struct AesGcmEncryptor {
    cipher: GcmCipher,
    // retained only so the key can be wiped when the primitive is dropped
    key: Vec<u8>,
}

impl AesGcmEncryptor {
    pub(crate) fn new(key: &[u8]) -> Result<Self> {
        Ok(Self {
            cipher: GcmCipher::new(key)?,
            key: key.to_vec(),
        })
    }

    fn encrypt_with_nonce(
        &self,
        plaintext: &[u8],
        aad: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>> {
        let ciphertext = self.cipher.encrypt(nonce, Payload { msg: plaintext, aad })?;
        let frame_len = NONCE_LEN + ciphertext.len();
        let mut out = Vec::with_capacity(SIZE_LEN + frame_len);
        out.extend_from_slice(&(frame_len as u32).to_le_bytes());
        out.extend_from_slice(nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
}

impl Debug for AesGcmEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AesGcmEncryptor {{ }}")
    }
}

impl Drop for AesGcmEncryptor {
    fn drop(&mut self) {
        zeroize(&mut self.key);
    }
}

impl BlockEncryptor for AesGcmEncryptor {
    fn encrypt(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        self.encrypt_with_nonce(plaintext, aad, &nonce)
    }

    fn signed_encrypt(
        &self,
        plaintext: &[u8],
        aad: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>> {
        self.encrypt_with_nonce(plaintext, aad, nonce)
    }

    fn ciphertext_size_delta(&self) -> usize {
        GCM_SIZE_DELTA
    }
}

/// Decrypting counterpart of [`AesGcmEncryptor`].
pub(crate) struct AesGcmDecryptor {
    cipher: GcmCipher,
    key: Vec<u8>,
}

impl AesGcmDecryptor {
    pub(crate) fn new(key: &[u8]) -> Result<Self> {
        Ok(Self {
            cipher: GcmCipher::new(key)?,
            key: key.to_vec(),
        })
    }
}

impl Debug for AesGcmDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AesGcmDecryptor {{ }}")
    }
}

impl Drop for AesGcmDecryptor {
    fn drop(&mut self) {
        zeroize(&mut self.key);
    }
}

impl BlockDecryptor for AesGcmDecryptor {
    fn decrypt(&self, length_and_ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        if length_and_ciphertext.len() < GCM_SIZE_DELTA {
            return Err(ParquetError::DecryptFailed(format!(
                "GCM module too short: {} bytes",
                length_and_ciphertext.len()
            )));
        }
        let nonce = &length_and_ciphertext[SIZE_LEN..SIZE_LEN + NONCE_LEN];
        let ciphertext = &length_and_ciphertext[SIZE_LEN + NONCE_LEN..];
        self.cipher.decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
    }

    fn ciphertext_size_delta(&self) -> usize {
        GCM_SIZE_DELTA
    }
}

// CTR mode uses a 16 byte IV: the 12 byte nonce followed by a big-endian
// counter starting at 1.
fn ctr_apply_keystream(key: &[u8], nonce: &[u8], data: &mut [u8]) -> Result<()> {
    let mut iv = [0u8; 16];
    iv[..NONCE_LEN].copy_from_slice(nonce);
    iv[15] = 1;
    match key.len() {
        16 => ctr::Ctr128BE::<Aes128>::new_from_slices(key, &iv)
            .map_err(|_| invalid_key_len(key.len()))?
            .apply_keystream(data),
        24 => ctr::Ctr128BE::<Aes192>::new_from_slices(key, &iv)
            .map_err(|_| invalid_key_len(key.len()))?
            .apply_keystream(data),
        32 => ctr::Ctr128BE::<Aes256>::new_from_slices(key, &iv)
            .map_err(|_| invalid_key_len(key.len()))?
            .apply_keystream(data),
        n => return Err(invalid_key_len(n)),
    }
    Ok(())
}

/// AES-CTR page-body cipher for AES_GCM_CTR_V1 files. CTR frames are not
/// authenticated, so there is no tag and the AAD is ignored.
pub(crate) struct AesCtrEncryptor {
    key: Vec<u8>,
}

impl AesCtrEncryptor {
    pub(crate) fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 | 24 | 32 => Ok(Self { key: key.to_vec() }),
            n => Err(invalid_key_len(n)),
        }
    }
}

impl Debug for AesCtrEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AesCtrEncryptor {{ }}")
    }
}

impl Drop for AesCtrEncryptor {
    fn drop(&mut self) {
        zeroize(&mut self.key);
    }
}

impl BlockEncryptor for AesCtrEncryptor {
    fn encrypt(&self, plaintext: &[u8], _aad: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let frame_len = NONCE_LEN + plaintext.len();
        let mut out = Vec::with_capacity(SIZE_LEN + frame_len);
        out.extend_from_slice(&(frame_len as u32).to_le_bytes());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(plaintext);
        ctr_apply_keystream(&self.key, &nonce, &mut out[SIZE_LEN + NONCE_LEN..])?;
        Ok(out)
    }

    fn signed_encrypt(
        &self,
        _plaintext: &[u8],
        _aad: &[u8],
        _nonce: &[u8; NONCE_LEN],
    ) -> Result<Vec<u8>> {
        Err(general_err!(
            "Footer signing requires an authenticated cipher"
        ))
    }

    fn ciphertext_size_delta(&self) -> usize {
        CTR_SIZE_DELTA
    }
}

/// Decrypting counterpart of [`AesCtrEncryptor`].
pub(crate) struct AesCtrDecryptor {
    key: Vec<u8>,
}

impl AesCtrDecryptor {
    pub(crate) fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 | 24 | 32 => Ok(Self { key: key.to_vec() }),
            n => Err(invalid_key_len(n)),
        }
    }
}

impl Debug for AesCtrDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AesCtrDecryptor {{ }}")
    }
}

impl Drop for AesCtrDecryptor {
    fn drop(&mut self) {
        zeroize(&mut self.key);
    }
}

impl BlockDecryptor for AesCtrDecryptor {
    fn decrypt(&self, length_and_ciphertext: &[u8], _aad: &[u8]) -> Result<Vec<u8>> {
        if length_and_ciphertext.len() < CTR_SIZE_DELTA {
            return Err(ParquetError::DecryptFailed(format!(
                "CTR module too short: {} bytes",
                length_and_ciphertext.len()
            )));
        }
        let nonce = &length_and_ciphertext[SIZE_LEN..SIZE_LEN + NONCE_LEN];
        let mut plaintext = length_and_ciphertext[SIZE_LEN + NONCE_LEN..].to_vec();
        ctr_apply_keystream(&self.key, nonce, &mut plaintext)?;
        Ok(plaintext)
    }

    fn ciphertext_size_delta(&self) -> usize {
        CTR_SIZE_DELTA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gcm_roundtrip_all_key_sizes() {
        for key_len in [16usize, 24, 32] {
            let key = vec![7u8; key_len];
            let encryptor = AesGcmEncryptor::new(&key).unwrap();
            let decryptor = AesGcmDecryptor::new(&key).unwrap();
            let ciphertext = encryptor.encrypt(b"some plaintext", b"aad").unwrap();
            assert_eq!(ciphertext.len(), b"some plaintext".len() + GCM_SIZE_DELTA);
            let plaintext = decryptor.decrypt(&ciphertext, b"aad").unwrap();
            assert_eq!(plaintext, b"some plaintext");
        }
    }

    #[test]
    fn test_gcm_rejects_bad_key_length() {
        assert!(AesGcmEncryptor::new(&[0u8; 15]).is_err());
        assert!(AesGcmDecryptor::new(&[0u8; 33]).is_err());
        assert!(AesCtrEncryptor::new(&[0u8; 0]).is_err());
    }

    #[test]
    fn test_gcm_detects_tampering() {
        let key = [0u8; 16];
        let encryptor = AesGcmEncryptor::new(&key).unwrap();
        let decryptor = AesGcmDecryptor::new(&key).unwrap();
        let mut ciphertext = encryptor.encrypt(b"payload", b"aad").unwrap();
        ciphertext[SIZE_LEN + NONCE_LEN] ^= 0xff;
        let err = decryptor.decrypt(&ciphertext, b"aad").unwrap_err();
        assert!(matches!(err, ParquetError::DecryptFailed(_)));
    }

    #[test]
    fn test_gcm_binds_aad() {
        let key = [0u8; 16];
        let encryptor = AesGcmEncryptor::new(&key).unwrap();
        let decryptor = AesGcmDecryptor::new(&key).unwrap();
        let ciphertext = encryptor.encrypt(b"payload", b"aad one").unwrap();
        assert!(decryptor.decrypt(&ciphertext, b"aad two").is_err());
    }

    #[test]
    fn test_ctr_roundtrip() {
        let key = [3u8; 32];
        let encryptor = AesCtrEncryptor::new(&key).unwrap();
        let decryptor = AesCtrDecryptor::new(&key).unwrap();
        let ciphertext = encryptor.encrypt(b"page body bytes", &[]).unwrap();
        assert_eq!(ciphertext.len(), b"page body bytes".len() + CTR_SIZE_DELTA);
        assert_eq!(decryptor.decrypt(&ciphertext, &[]).unwrap(), b"page body bytes");
    }

    #[test]
    fn test_signed_encrypt_is_deterministic() {
        let key = [1u8; 16];
        let encryptor = AesGcmEncryptor::new(&key).unwrap();
        let nonce = [9u8; NONCE_LEN];
        let a = encryptor.signed_encrypt(b"footer", b"aad", &nonce).unwrap();
        let b = encryptor.signed_encrypt(b"footer", b"aad", &nonce).unwrap();
        assert_eq!(a, b);
        // and the random-nonce path differs between calls
        let c = encryptor.encrypt(b"footer", b"aad").unwrap();
        let d = encryptor.encrypt(b"footer", b"aad").unwrap();
        assert_ne!(c, d);
    }
}
