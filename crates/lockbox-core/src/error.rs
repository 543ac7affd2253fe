//! Error types for `lockbox-core`.
//!
//! Errors never carry key material, master passwords, or plaintext. A failed
//! tag check is reported the same way whether the password was wrong or the
//! envelope was tampered with.

/// Errors from envelope encryption, decryption, and payload handling.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// No master password was supplied (absent or empty).
    #[error("master password is required")]
    MissingCredential,

    /// AES-256-GCM tag verification failed.
    #[error("decryption failed: wrong master password or corrupted envelope")]
    AuthenticationFailure,

    /// A stored envelope field is missing or structurally invalid.
    #[error("malformed envelope field '{field}': {reason}")]
    MalformedEnvelope { field: &'static str, reason: String },

    /// The AEAD encrypt operation itself failed.
    #[error("encryption failed: {reason}")]
    Encryption { reason: String },

    /// A record payload could not be serialized before sealing.
    #[error("payload serialization failed: {reason}")]
    Serialization { reason: String },
}

impl EnvelopeError {
    /// Short machine-readable name of the error kind, safe to log.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::AuthenticationFailure => "authentication_failure",
            Self::MalformedEnvelope { .. } => "malformed_envelope",
            Self::Encryption { .. } => "encryption",
            Self::Serialization { .. } => "serialization",
        }
    }

    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedEnvelope {
            field,
            reason: reason.into(),
        }
    }
}
