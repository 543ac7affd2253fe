//! Cryptographic primitives for `Lockbox`.
//!
//! Provides PBKDF2-HMAC-SHA512 key derivation, AES-256-GCM with a 16-byte
//! nonce and detached tag, and zeroize-on-drop newtypes for the master
//! password and derived keys.
//!
//! # Security model
//!
//! - Every envelope gets a fresh 64-byte salt and 16-byte IV from `OsRng`.
//! - Keys are derived per call from `(master password, salt)` with a fixed
//!   iteration count. Nothing is cached between calls.
//! - The parameters below are wire-format constants: stored envelopes only
//!   decrypt if they match exactly.

use std::fmt;

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{AeadInPlace, KeyInit, OsRng};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Key, Nonce, Tag};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::EnvelopeError;

/// Salt length in bytes. One salt per envelope.
pub const SALT_LEN: usize = 64;

/// AES-GCM nonce (IV) length in bytes.
pub const IV_LEN: usize = 16;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Derived key length in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// PBKDF2-HMAC-SHA512 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// AES-256-GCM instantiated with a 128-bit nonce.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// The user's master password.
///
/// Treated as opaque bytes: no trimming, case folding, or Unicode
/// normalization. Zeroized on drop and redacted in `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterPassword(String);

impl MasterPassword {
    /// Wrap a master password supplied by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::MissingCredential`] if the password is empty.
    pub fn new(password: impl Into<String>) -> Result<Self, EnvelopeError> {
        let password = password.into();
        if password.is_empty() {
            return Err(EnvelopeError::MissingCredential);
        }
        Ok(Self(password))
    }

    /// Borrow the raw password bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for MasterPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterPassword([REDACTED])")
    }
}

/// A 256-bit key derived from a master password and salt.
///
/// Lives only for the duration of one encrypt or decrypt call. Not `Clone`,
/// never serialized, and zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    /// Borrow the raw key bytes.
    ///
    /// The caller must not log or persist these bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive the AES-256 key for one envelope.
///
/// Deliberately slow: runs [`PBKDF2_ITERATIONS`] rounds of HMAC-SHA512 on
/// the calling thread.
#[must_use]
pub fn derive_key(master: &MasterPassword, salt: &[u8]) -> DerivedKey {
    let mut bytes = [0u8; KEY_LEN];
    pbkdf2_sha512(master.as_bytes(), salt, PBKDF2_ITERATIONS, &mut bytes);
    let key = DerivedKey(bytes);
    bytes.zeroize();
    key
}

fn pbkdf2_sha512(password: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) {
    pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, rounds, out);
}

/// Generate a fresh random salt.
#[must_use]
pub fn fresh_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Generate a fresh random IV.
#[must_use]
pub fn fresh_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypt `plaintext` under `key` and `iv` with empty associated data.
///
/// Returns `(ciphertext, tag)`. The ciphertext has the same length as the
/// plaintext.
///
/// # Errors
///
/// Returns [`EnvelopeError::Encryption`] if the AEAD operation fails.
pub fn seal_detached(
    key: &DerivedKey,
    iv: &[u8; IV_LEN],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN]), EnvelopeError> {
    let cipher = Aes256Gcm16::new(Key::<Aes256Gcm16>::from_slice(key.as_bytes()));
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::<U16>::from_slice(iv), b"", &mut buffer)
        .map_err(|e| EnvelopeError::Encryption {
            reason: e.to_string(),
        })?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);
    Ok((buffer, tag_bytes))
}

/// Decrypt and authenticate a ciphertext produced by [`seal_detached`].
///
/// # Errors
///
/// Returns [`EnvelopeError::AuthenticationFailure`] if the tag does not
/// verify (wrong key, corrupted data, or tampering). No partial plaintext
/// is ever returned.
pub fn open_detached(
    key: &DerivedKey,
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Vec<u8>, EnvelopeError> {
    let cipher = Aes256Gcm16::new(Key::<Aes256Gcm16>::from_slice(key.as_bytes()));
    let mut buffer = ciphertext.to_vec();
    match cipher.decrypt_in_place_detached(
        Nonce::<U16>::from_slice(iv),
        b"",
        &mut buffer,
        Tag::<U16>::from_slice(tag),
    ) {
        Ok(()) => Ok(buffer),
        Err(_) => {
            buffer.zeroize();
            Err(EnvelopeError::AuthenticationFailure)
        }
    }
}
