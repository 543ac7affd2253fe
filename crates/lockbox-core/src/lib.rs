//! Core library for `Lockbox`.
//!
//! Contains the record encryption envelope and the vault security analyzer.
//! Every envelope is keyed by a master password that is supplied per call
//! and never stored: each encryption draws a fresh salt and IV, derives a
//! key with PBKDF2-HMAC-SHA512, and seals the plaintext with AES-256-GCM.
//!
//! The crate is synchronous and holds no state between calls. Callers that
//! run inside an async runtime should move key derivation onto a blocking
//! thread pool.

pub mod analyzer;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod record;

pub use analyzer::{PasswordAssessment, VaultAnalysis, VaultRecord, analyze};
pub use crypto::MasterPassword;
pub use envelope::{EncodedEnvelope, Envelope};
pub use error::EnvelopeError;
pub use record::{PaymentData, PaymentKind, PersonalInfoData, RecordKind, RecordPayload};
