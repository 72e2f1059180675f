// Envelope encryption: AES-CBC with PKCS#7 padding, plus token fingerprints for logs

use crate::core::errors::CryptoError;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES block size; the IV is always one block
pub const BLOCK_SIZE: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Symmetric key and IV for one credential (or the whole deployment)
///
/// Lengths are validated on construction, and the bytes are wiped when the
/// value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    key: Vec<u8>,
    iv: Vec<u8>,
}

impl KeyMaterial {
    /// Build key material from raw bytes
    pub fn new(key: impl Into<Vec<u8>>, iv: impl Into<Vec<u8>>) -> Result<Self, CryptoError> {
        let key = key.into();
        let iv = iv.into();

        if !matches!(key.len(), 16 | 24 | 32) {
            return Err(CryptoError::InvalidKeyLength(key.len()));
        }
        if iv.len() != BLOCK_SIZE {
            return Err(CryptoError::InvalidIvLength(iv.len()));
        }

        Ok(Self { key, iv })
    }

    /// Build key material from hex-encoded text, as found in env vars and credential files
    pub fn from_hex(key_hex: &str, iv_hex: &str) -> Result<Self, CryptoError> {
        let key = hex::decode(key_hex.trim())
            .map_err(|e| CryptoError::HexDecode(format!("key: {}", e)))?;
        let iv = hex::decode(iv_hex.trim())
            .map_err(|e| CryptoError::HexDecode(format!("iv: {}", e)))?;
        Self::new(key, iv)
    }

    /// Key length in bytes (16, 24 or 32)
    pub fn key_len(&self) -> usize {
        self.key.len()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &format_args!("[REDACTED; {} bytes]", self.key.len()))
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

/// Encrypt a serialized payload into an envelope
///
/// Deterministic: the same plaintext and key material always yield the same
/// bytes. Output length is the plaintext rounded up to the next full block.
pub fn encrypt(plaintext: &[u8], material: &KeyMaterial) -> Result<Vec<u8>, CryptoError> {
    let key = material.key.as_slice();
    let iv = material.iv.as_slice();

    let envelope = match key.len() {
        16 => Aes128CbcEnc::new_from_slices(key, iv)
            .map_err(|_| CryptoError::InvalidIvLength(iv.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => Aes192CbcEnc::new_from_slices(key, iv)
            .map_err(|_| CryptoError::InvalidIvLength(iv.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(|_| CryptoError::InvalidIvLength(iv.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        other => return Err(CryptoError::InvalidKeyLength(other)),
    };

    Ok(envelope)
}

/// Decrypt an envelope back into the serialized payload
pub fn decrypt(envelope: &[u8], material: &KeyMaterial) -> Result<Vec<u8>, CryptoError> {
    let key = material.key.as_slice();
    let iv = material.iv.as_slice();
    let unpad = |e: aes::cipher::block_padding::UnpadError| CryptoError::Decryption(e.to_string());

    match key.len() {
        16 => Aes128CbcDec::new_from_slices(key, iv)
            .map_err(|_| CryptoError::InvalidIvLength(iv.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(envelope)
            .map_err(unpad),
        24 => Aes192CbcDec::new_from_slices(key, iv)
            .map_err(|_| CryptoError::InvalidIvLength(iv.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(envelope)
            .map_err(unpad),
        32 => Aes256CbcDec::new_from_slices(key, iv)
            .map_err(|_| CryptoError::InvalidIvLength(iv.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(envelope)
            .map_err(unpad),
        other => Err(CryptoError::InvalidKeyLength(other)),
    }
}

/// Short SHA-256 fingerprint of a bearer token
///
/// Used to tell credentials apart in logs without writing the token itself.
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}
