//! Typed record payloads.
//!
//! A vault holds four record types, each with exactly one encrypted field.
//! Passwords and note bodies are encrypted as raw UTF-8 text. Payment
//! instruments and personal information are field groups serialized to JSON
//! and encrypted as one unit, so updating any field re-encrypts the group.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::MasterPassword;
use crate::envelope::Envelope;
use crate::error::EnvelopeError;

/// The record type an envelope belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Password,
    Note,
    Payment,
    PersonalInfo,
}

impl RecordKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Note => "note",
            Self::Payment => "payment",
            Self::PersonalInfo => "personalInfo",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "password" => Ok(Self::Password),
            "note" => Ok(Self::Note),
            "payment" => Ok(Self::Payment),
            "personalInfo" | "personal-info" => Ok(Self::PersonalInfo),
            other => Err(format!("unknown record kind '{other}'")),
        }
    }
}

/// Which kind of payment instrument a [`PaymentData`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentKind {
    Card,
    BankAccount,
}

/// Encrypted field group of a payment record.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardholder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_holder_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
}

impl PaymentData {
    /// Infer the instrument kind from the populated fields.
    ///
    /// Card fields win when both groups are present. Returns `None` for an
    /// empty field group.
    #[must_use]
    pub fn kind(&self) -> Option<PaymentKind> {
        let card = [
            &self.cardholder_name,
            &self.card_number,
            &self.expiration_date,
            &self.cvv,
            &self.card_type,
        ];
        let bank = [
            &self.account_holder_name,
            &self.bank_name,
            &self.account_number,
            &self.routing_number,
            &self.account_type,
        ];
        if card.iter().any(|f| f.is_some()) {
            Some(PaymentKind::Card)
        } else if bank.iter().any(|f| f.is_some()) {
            Some(PaymentKind::BankAccount)
        } else {
            None
        }
    }
}

impl fmt::Debug for PaymentData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentData")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// Encrypted field group of a personal-information record.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfoData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passport_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_license_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl PersonalInfoData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Debug for PersonalInfoData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersonalInfoData").finish_non_exhaustive()
    }
}

/// The decrypted content of one record's encrypted field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum RecordPayload {
    Password(String),
    Note(String),
    Payment(PaymentData),
    PersonalInfo(PersonalInfoData),
}

impl RecordPayload {
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Password(_) => RecordKind::Password,
            Self::Note(_) => RecordKind::Note,
            Self::Payment(_) => RecordKind::Payment,
            Self::PersonalInfo(_) => RecordKind::PersonalInfo,
        }
    }

    /// Whether a field group carries no data at all.
    ///
    /// Text payloads are never considered empty: an empty note body is a
    /// legitimate value.
    #[must_use]
    pub fn is_empty_group(&self) -> bool {
        match self {
            Self::Password(_) | Self::Note(_) => false,
            Self::Payment(data) => data.kind().is_none(),
            Self::PersonalInfo(data) => data.is_empty(),
        }
    }

    /// Encrypt the whole payload into a new envelope.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Serialization`] if a field group cannot be
    /// serialized, or any error from [`Envelope::encrypt`].
    pub fn seal(&self, master: &MasterPassword) -> Result<Envelope, EnvelopeError> {
        match self {
            Self::Password(text) | Self::Note(text) => Envelope::encrypt(text.as_bytes(), master),
            Self::Payment(data) => seal_json(data, master),
            Self::PersonalInfo(data) => seal_json(data, master),
        }
    }

    /// Decrypt an envelope as a payload of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::AuthenticationFailure`] on a failed tag
    /// check, or [`EnvelopeError::MalformedEnvelope`] if the plaintext is
    /// not valid for `kind`.
    pub fn open(
        kind: RecordKind,
        envelope: &Envelope,
        master: &MasterPassword,
    ) -> Result<Self, EnvelopeError> {
        let mut text = envelope.decrypt_to_string(master)?;
        let payload = match kind {
            RecordKind::Password => return Ok(Self::Password(text)),
            RecordKind::Note => return Ok(Self::Note(text)),
            RecordKind::Payment => serde_json::from_str(&text).map(Self::Payment),
            RecordKind::PersonalInfo => serde_json::from_str(&text).map(Self::PersonalInfo),
        };
        text.zeroize();

        // serde_json errors can quote the input, so the reason stays generic.
        payload.map_err(|_| {
            EnvelopeError::malformed(
                "ciphertext",
                format!("decrypted payload is not a valid {kind} record"),
            )
        })
    }
}

impl fmt::Debug for RecordPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordPayload")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

fn seal_json<T: Serialize>(data: &T, master: &MasterPassword) -> Result<Envelope, EnvelopeError> {
    let mut json = serde_json::to_vec(data).map_err(|e| EnvelopeError::Serialization {
        reason: e.to_string(),
    })?;
    let sealed = Envelope::encrypt(&json, master);
    json.zeroize();
    sealed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn master(s: &str) -> MasterPassword {
        MasterPassword::new(s).unwrap()
    }

    fn card() -> PaymentData {
        PaymentData {
            cardholder_name: Some("Ada Lovelace".to_owned()),
            card_number: Some("4111111111111111".to_owned()),
            expiration_date: Some("12/29".to_owned()),
            cvv: Some("123".to_owned()),
            ..PaymentData::default()
        }
    }

    #[test]
    fn payment_group_roundtrips() {
        let m = master("m");
        let payload = RecordPayload::Payment(card());
        let envelope = payload.seal(&m).unwrap();
        let opened = RecordPayload::open(RecordKind::Payment, &envelope, &m).unwrap();
        assert_eq!(opened, payload);
    }

    #[test]
    fn payment_group_is_stored_as_camel_case_json() {
        let m = master("m");
        let envelope = RecordPayload::Payment(card()).seal(&m).unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&envelope.decrypt(&m).unwrap()).unwrap();
        assert_eq!(json["cardNumber"], "4111111111111111");
        assert!(json.get("bankName").is_none());
    }

    #[test]
    fn empty_note_roundtrips() {
        let m = master("m");
        let envelope = RecordPayload::Note(String::new()).seal(&m).unwrap();
        let opened = RecordPayload::open(RecordKind::Note, &envelope, &m).unwrap();
        assert_eq!(opened, RecordPayload::Note(String::new()));
    }

    #[test]
    fn opening_as_wrong_kind_is_malformed() {
        let m = master("m");
        let envelope = RecordPayload::Password("hunter22".to_owned()).seal(&m).unwrap();
        let err = RecordPayload::open(RecordKind::PersonalInfo, &envelope, &m).unwrap_err();
        assert!(matches!(err, EnvelopeError::MalformedEnvelope { .. }));
        assert!(!err.to_string().contains("hunter22"));
    }

    #[test]
    fn payment_kind_is_inferred_from_fields() {
        assert_eq!(card().kind(), Some(PaymentKind::Card));
        let bank = PaymentData {
            bank_name: Some("First Bank".to_owned()),
            account_number: Some("000123".to_owned()),
            ..PaymentData::default()
        };
        assert_eq!(bank.kind(), Some(PaymentKind::BankAccount));
        assert_eq!(PaymentData::default().kind(), None);
    }

    #[test]
    fn empty_groups_are_detected() {
        assert!(RecordPayload::Payment(PaymentData::default()).is_empty_group());
        assert!(RecordPayload::PersonalInfo(PersonalInfoData::default()).is_empty_group());
        assert!(!RecordPayload::Note(String::new()).is_empty_group());
    }

    #[test]
    fn payload_json_is_tagged_by_kind() {
        let json = serde_json::json!({
            "kind": "personalInfo",
            "data": { "firstName": "Grace", "country": "US" }
        });
        let payload: RecordPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.kind(), RecordKind::PersonalInfo);
        assert!(!payload.is_empty_group());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let debug = format!("{:?}", RecordPayload::Payment(card()));
        assert!(!debug.contains("4111"));
        let debug = format!("{:?}", RecordPayload::Password("hunter22".to_owned()));
        assert!(!debug.contains("hunter22"));
    }

    #[test]
    fn record_kind_parses_path_segments() {
        assert_eq!("personalInfo".parse::<RecordKind>().unwrap(), RecordKind::PersonalInfo);
        assert_eq!("note".parse::<RecordKind>().unwrap(), RecordKind::Note);
        assert!("wallet".parse::<RecordKind>().is_err());
    }
}
