//! Record encryption envelope.
//!
//! An [`Envelope`] is the self-contained encrypted form of one plaintext
//! field: salt, IV, authentication tag, and ciphertext. It is only
//! meaningful together with the master password that produced it; the salt
//! and IV are not secret and travel alongside the ciphertext.
//!
//! Envelopes are never mutated. Updating a record means encrypting the whole
//! field again, which draws a new salt and IV.
//!
//! [`EncodedEnvelope`] is the boundary form: four lower-case hex strings as
//! persisted next to a record.

use serde::{Deserialize, Serialize};

use crate::crypto::{self, IV_LEN, MasterPassword, SALT_LEN, TAG_LEN};
use crate::error::EnvelopeError;

/// A decoded envelope holding raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
    auth_tag: [u8; TAG_LEN],
    ciphertext: Vec<u8>,
}

impl Envelope {
    /// Encrypt `plaintext` under a key derived from `master`.
    ///
    /// Draws a fresh salt and IV on every call, so encrypting the same
    /// plaintext twice with the same password yields unrelated envelopes.
    /// Empty plaintext is valid.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Encryption`] if the AEAD operation fails.
    pub fn encrypt(plaintext: &[u8], master: &MasterPassword) -> Result<Self, EnvelopeError> {
        let salt = crypto::fresh_salt();
        let iv = crypto::fresh_iv();
        let key = crypto::derive_key(master, &salt);
        let (ciphertext, auth_tag) = crypto::seal_detached(&key, &iv, plaintext)?;

        Ok(Self {
            salt,
            iv,
            auth_tag,
            ciphertext,
        })
    }

    /// Recover the exact plaintext bytes.
    ///
    /// Re-derives the key from the stored salt on every call.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::AuthenticationFailure`] if the password is
    /// wrong or any part of the envelope was altered.
    pub fn decrypt(&self, master: &MasterPassword) -> Result<Vec<u8>, EnvelopeError> {
        let key = crypto::derive_key(master, &self.salt);
        crypto::open_detached(&key, &self.iv, &self.ciphertext, &self.auth_tag)
    }

    /// Decrypt and require the plaintext to be UTF-8 text.
    ///
    /// # Errors
    ///
    /// Everything [`decrypt`](Self::decrypt) returns, plus
    /// [`EnvelopeError::MalformedEnvelope`] if the authenticated plaintext
    /// is not valid UTF-8.
    pub fn decrypt_to_string(&self, master: &MasterPassword) -> Result<String, EnvelopeError> {
        let plaintext = self.decrypt(master)?;
        String::from_utf8(plaintext).map_err(|e| {
            let mut bytes = e.into_bytes();
            zeroize::Zeroize::zeroize(&mut bytes);
            EnvelopeError::malformed("ciphertext", "plaintext is not valid UTF-8")
        })
    }

    #[must_use]
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    #[must_use]
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    #[must_use]
    pub fn auth_tag(&self) -> &[u8; TAG_LEN] {
        &self.auth_tag
    }

    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Encode to the hex boundary form.
    #[must_use]
    pub fn encode(&self) -> EncodedEnvelope {
        EncodedEnvelope {
            salt: Some(hex::encode(self.salt)),
            iv: hex::encode(self.iv),
            auth_tag: hex::encode(self.auth_tag),
            ciphertext: hex::encode(&self.ciphertext),
        }
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("salt", &hex::encode(self.salt))
            .field("iv", &hex::encode(self.iv))
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

/// Hex-encoded envelope fields as stored next to a record.
///
/// `salt` is optional because records written before per-record salts were
/// introduced do not have one; such envelopes fail to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    pub iv: String,
    pub auth_tag: String,
    #[serde(
        alias = "encrypted",
        alias = "encryptedPassword",
        alias = "encryptedData",
        alias = "encryptedContent"
    )]
    pub ciphertext: String,
}

impl EncodedEnvelope {
    /// Validate and decode the hex fields.
    ///
    /// No key derivation happens here, so rejecting a malformed record is
    /// cheap.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::MalformedEnvelope`] naming the first field
    /// that is missing, not hex, or of the wrong length.
    pub fn decode(&self) -> Result<Envelope, EnvelopeError> {
        let salt = self
            .salt
            .as_deref()
            .ok_or_else(|| EnvelopeError::malformed("salt", "missing"))?;

        Ok(Envelope {
            salt: decode_fixed("salt", salt)?,
            iv: decode_fixed("iv", &self.iv)?,
            auth_tag: decode_fixed("authTag", &self.auth_tag)?,
            ciphertext: hex::decode(&self.ciphertext)
                .map_err(|e| EnvelopeError::malformed("ciphertext", e.to_string()))?,
        })
    }
}

impl From<&Envelope> for EncodedEnvelope {
    fn from(envelope: &Envelope) -> Self {
        envelope.encode()
    }
}

impl TryFrom<&EncodedEnvelope> for Envelope {
    type Error = EnvelopeError;

    fn try_from(encoded: &EncodedEnvelope) -> Result<Self, Self::Error> {
        encoded.decode()
    }
}

fn decode_fixed<const N: usize>(field: &'static str, value: &str) -> Result<[u8; N], EnvelopeError> {
    let bytes = hex::decode(value).map_err(|e| EnvelopeError::malformed(field, e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| {
        EnvelopeError::malformed(field, format!("expected {} bytes, got {actual}", N))
    })
}
