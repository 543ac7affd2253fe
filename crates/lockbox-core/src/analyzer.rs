//! Vault security analysis.
//!
//! Decrypts every password record in a vault with the request's master
//! password and flags each one as weak, reused, or old. Records that fail to
//! decode or decrypt are skipped and logged; one bad record never aborts the
//! analysis of the rest.
//!
//! The work happens in two passes. The first decrypts every record in input
//! order, the second classifies the surviving plaintexts. Reuse can only be
//! decided once every plaintext is known, so the split keeps classification
//! order-independent while the result list keeps input order.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::crypto::MasterPassword;
use crate::envelope::EncodedEnvelope;
use crate::error::EnvelopeError;

/// Passwords shorter than this many UTF-16 code units are weak.
pub const WEAK_PASSWORD_MIN_LEN: usize = 8;

/// One stored password record as handed over by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRecord {
    pub id: String,
    /// Display label (site or account name). Not encrypted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub envelope: EncodedEnvelope,
    #[serde(alias = "updatedAt")]
    pub last_updated_at: DateTime<Utc>,
}

/// Risk flags and decrypted value for one record.
///
/// The plaintext is included for reveal-on-demand display by the caller.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAssessment {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub password: String,
    pub is_weak: bool,
    pub is_reused: bool,
    /// Last updated at least one calendar year before the reference time.
    pub is_old: bool,
}

impl fmt::Debug for PasswordAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordAssessment")
            .field("id", &self.id)
            .field("is_weak", &self.is_weak)
            .field("is_reused", &self.is_reused)
            .field("is_old", &self.is_old)
            .finish_non_exhaustive()
    }
}

/// Aggregate result of one analysis. Computed per request, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultAnalysis {
    pub overall_score: u8,
    pub total_passwords: usize,
    pub weak_count: usize,
    pub reused_count: usize,
    pub old_password_count: usize,
    /// Records that could not be decoded or decrypted and were left out.
    pub skipped_count: usize,
    pub passwords: Vec<PasswordAssessment>,
}

impl VaultAnalysis {
    /// Whether the result is more likely a wrong master password than a
    /// healthy vault: records were supplied but not one of them decrypted.
    ///
    /// Such a result scores 100 and must not be shown as "secure".
    #[must_use]
    pub fn looks_like_wrong_password(&self) -> bool {
        self.total_passwords == 0 && self.skipped_count > 0
    }
}

struct Decrypted<'a> {
    record: &'a VaultRecord,
    password: String,
}

/// Analyze a vault's password records.
///
/// Every record re-derives its own key from its own salt; nothing derived
/// from `master` is shared between records. `now` is the reference time for
/// the age check.
pub fn analyze(records: &[VaultRecord], master: &MasterPassword, now: DateTime<Utc>) -> VaultAnalysis {
    let mut decrypted = Vec::with_capacity(records.len());
    let mut skipped_count = 0usize;

    for record in records {
        match open(record, master) {
            Ok(password) => decrypted.push(Decrypted { record, password }),
            Err(e) => {
                skipped_count = skipped_count.saturating_add(1);
                warn!(
                    record_id = %record.id,
                    error = e.kind(),
                    "skipping password record that could not be decrypted"
                );
            }
        }
    }

    let analysis = classify(decrypted, skipped_count, now);
    debug!(
        total = analysis.total_passwords,
        weak = analysis.weak_count,
        reused = analysis.reused_count,
        old = analysis.old_password_count,
        skipped = analysis.skipped_count,
        score = analysis.overall_score,
        "vault analysis complete"
    );
    analysis
}

fn open(record: &VaultRecord, master: &MasterPassword) -> Result<String, EnvelopeError> {
    record.envelope.decode()?.decrypt_to_string(master)
}

fn classify(decrypted: Vec<Decrypted<'_>>, skipped_count: usize, now: DateTime<Utc>) -> VaultAnalysis {
    let mut occurrences: HashMap<&str, usize> = HashMap::with_capacity(decrypted.len());
    for entry in &decrypted {
        let count = occurrences.entry(entry.password.as_str()).or_insert(0);
        *count = count.saturating_add(1);
    }
    let reused: Vec<bool> = decrypted
        .iter()
        .map(|entry| occurrences.get(entry.password.as_str()).copied().unwrap_or(0) >= 2)
        .collect();
    drop(occurrences);

    let cutoff = one_year_before(now);
    let passwords: Vec<PasswordAssessment> = decrypted
        .into_iter()
        .zip(reused)
        .map(|(entry, is_reused)| PasswordAssessment {
            id: entry.record.id.clone(),
            name: entry.record.name.clone(),
            is_weak: entry.password.encode_utf16().count() < WEAK_PASSWORD_MIN_LEN,
            is_reused,
            is_old: entry.record.last_updated_at <= cutoff,
            password: entry.password,
        })
        .collect();

    let total_passwords = passwords.len();
    let weak_count = passwords.iter().filter(|p| p.is_weak).count();
    let reused_count = passwords.iter().filter(|p| p.is_reused).count();
    let old_password_count = passwords.iter().filter(|p| p.is_old).count();

    VaultAnalysis {
        overall_score: overall_score(total_passwords, weak_count, reused_count),
        total_passwords,
        weak_count,
        reused_count,
        old_password_count,
        skipped_count,
        passwords,
    }
}

/// `round((total - weak - reused) / total * 100)`, or 100 for an empty vault.
///
/// Old passwords do not lower the score. A record that is both weak and
/// reused counts twice, so the healthy count saturates at zero.
fn overall_score(total: usize, weak: usize, reused: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let healthy = total.saturating_sub(weak).saturating_sub(reused);
    // Integer round-half-up of healthy * 100 / total.
    let score = healthy.saturating_mul(200).saturating_add(total) / total.saturating_mul(2);
    u8::try_from(score).unwrap_or(100)
}

/// Subtract one calendar year. A leap day rolls forward to March 1st of the
/// previous year rather than back to February 28th.
fn one_year_before(now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(shifted) = now.checked_sub_months(Months::new(12)) else {
        return DateTime::<Utc>::MIN_UTC;
    };
    if now.month() == 2 && now.day() == 29 {
        shifted + Duration::days(1)
    } else {
        shifted
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::envelope::Envelope;

    fn master(s: &str) -> MasterPassword {
        MasterPassword::new(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 15, 12, 0, 0).unwrap()
    }

    fn stub_record(id: &str, updated: DateTime<Utc>) -> VaultRecord {
        VaultRecord {
            id: id.to_owned(),
            name: None,
            envelope: EncodedEnvelope {
                salt: None,
                iv: String::new(),
                auth_tag: String::new(),
                ciphertext: String::new(),
            },
            last_updated_at: updated,
        }
    }

    fn sealed_record(id: &str, password: &str, m: &MasterPassword) -> VaultRecord {
        VaultRecord {
            id: id.to_owned(),
            name: Some(format!("site-{id}")),
            envelope: Envelope::encrypt(password.as_bytes(), m).unwrap().encode(),
            last_updated_at: now() - Duration::days(10),
        }
    }

    /// Classify plaintexts directly, bypassing key derivation.
    fn classify_plain(entries: &[(&str, DateTime<Utc>)]) -> VaultAnalysis {
        let records: Vec<VaultRecord> = entries
            .iter()
            .enumerate()
            .map(|(i, (_, updated))| stub_record(&i.to_string(), *updated))
            .collect();
        let decrypted = records
            .iter()
            .zip(entries)
            .map(|(record, (password, _))| Decrypted {
                record,
                password: (*password).to_owned(),
            })
            .collect();
        classify(decrypted, 0, now())
    }

    #[test]
    fn seven_characters_is_weak_eight_is_not() {
        let fresh = now() - Duration::days(1);
        let analysis = classify_plain(&[("abcdefg", fresh), ("abcdefgh", fresh)]);
        assert!(analysis.passwords[0].is_weak);
        assert!(!analysis.passwords[1].is_weak);
        assert_eq!(analysis.weak_count, 1);
    }

    #[test]
    fn weakness_counts_utf16_code_units() {
        let fresh = now() - Duration::days(1);
        // Seven code units, fourteen bytes.
        let analysis = classify_plain(&[("ключключ", fresh), ("ключклю", fresh)]);
        assert!(!analysis.passwords[0].is_weak);
        assert!(analysis.passwords[1].is_weak);

        // Each emoji is a surrogate pair: four of them are eight units.
        let analysis = classify_plain(&[("🔑🔑🔑🔑", fresh), ("🔑🔑🔑", fresh)]);
        assert!(!analysis.passwords[0].is_weak);
        assert!(analysis.passwords[1].is_weak);
        assert_eq!(analysis.weak_count, 1);
    }

    #[test]
    fn every_record_sharing_a_value_is_reused() {
        let fresh = now() - Duration::days(1);
        let analysis = classify_plain(&[
            ("a1b2c3d4", fresh),
            ("x9y8z7w6", fresh),
            ("a1b2c3d4", fresh),
        ]);
        let flags: Vec<bool> = analysis.passwords.iter().map(|p| p.is_reused).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(analysis.reused_count, 2);
    }

    #[test]
    fn reuse_counts_records_not_groups() {
        let fresh = now() - Duration::days(1);
        let analysis = classify_plain(&[
            ("samesame", fresh),
            ("samesame", fresh),
            ("samesame", fresh),
            ("otherone", fresh),
            ("otherone", fresh),
        ]);
        assert_eq!(analysis.reused_count, 5);
    }

    #[test]
    fn older_than_one_year_is_old() {
        let analysis = classify_plain(&[
            ("longenough1", now() - Duration::days(366)),
            ("longenough2", now() - Duration::days(300)),
        ]);
        assert!(analysis.passwords[0].is_old);
        assert!(!analysis.passwords[1].is_old);
        assert_eq!(analysis.old_password_count, 1);
    }

    #[test]
    fn one_full_calendar_year_is_old() {
        let at_cutoff = Utc.with_ymd_and_hms(2022, 6, 15, 12, 0, 0).unwrap();
        let just_after = at_cutoff + Duration::seconds(1);
        let analysis = classify_plain(&[("longenough1", at_cutoff), ("longenough2", just_after)]);
        assert!(analysis.passwords[0].is_old);
        assert!(!analysis.passwords[1].is_old);
    }

    #[test]
    fn leap_spanning_366_days_is_old() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let records = [stub_record("0", now - Duration::days(366))];
        let decrypted = vec![Decrypted {
            record: &records[0],
            password: "longenough".to_owned(),
        }];
        assert!(classify(decrypted, 0, now).passwords[0].is_old);
    }

    #[test]
    fn one_year_is_calendar_based_across_leap_years() {
        // 2024 is a leap year: one calendar year spans 366 days here.
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        assert_eq!(one_year_before(now), now - Duration::days(366));

        let now = Utc.with_ymd_and_hms(2023, 6, 15, 0, 0, 0).unwrap();
        assert_eq!(one_year_before(now), now - Duration::days(365));
    }

    #[test]
    fn leap_day_rolls_forward_to_march_first() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 8, 30, 0).unwrap();
        assert_eq!(
            one_year_before(now),
            Utc.with_ymd_and_hms(2023, 3, 1, 8, 30, 0).unwrap()
        );
    }

    #[test]
    fn score_ignores_old_passwords() {
        let stale = now() - Duration::days(800);
        let analysis = classify_plain(&[("longenough1", stale), ("longenough2", stale)]);
        assert_eq!(analysis.old_password_count, 2);
        assert_eq!(analysis.overall_score, 100);
    }

    #[test]
    fn score_formula_rounds_half_up() {
        assert_eq!(overall_score(4, 1, 1), 50);
        assert_eq!(overall_score(3, 1, 0), 67);
        assert_eq!(overall_score(8, 7, 0), 13);
        assert_eq!(overall_score(3, 0, 0), 100);
    }

    #[test]
    fn score_never_goes_below_zero() {
        // Two identical short passwords: both weak and both reused.
        assert_eq!(overall_score(2, 2, 2), 0);
    }

    #[test]
    fn score_reflects_weak_and_reused_records() {
        let fresh = now() - Duration::days(1);
        let analysis = classify_plain(&[
            ("short", fresh),
            ("unique-one", fresh),
            ("unique-two", fresh),
            ("unique-three", fresh),
        ]);
        assert_eq!(analysis.weak_count, 1);
        assert_eq!(analysis.overall_score, 75);

        let analysis = classify_plain(&[
            ("short", fresh),
            ("dup-value", fresh),
            ("dup-value", fresh),
            ("unique-one", fresh),
        ]);
        assert_eq!((analysis.total_passwords, analysis.weak_count, analysis.reused_count), (4, 1, 2));
        assert_eq!(analysis.overall_score, 25);
    }

    #[test]
    fn empty_vault_scores_one_hundred() {
        let analysis = analyze(&[], &master("m"), now());
        assert_eq!(analysis.overall_score, 100);
        assert_eq!(analysis.total_passwords, 0);
        assert_eq!(analysis.weak_count, 0);
        assert_eq!(analysis.reused_count, 0);
        assert_eq!(analysis.old_password_count, 0);
        assert!(analysis.passwords.is_empty());
        assert!(!analysis.looks_like_wrong_password());
    }

    #[test]
    fn malformed_record_is_skipped_without_failing() {
        let m = master("vault master");
        let mut records: Vec<VaultRecord> = ["alpha-pass", "beta-pass", "gamma-pass", "delta-pass"]
            .iter()
            .enumerate()
            .map(|(i, p)| sealed_record(&i.to_string(), p, &m))
            .collect();
        let mut corrupt = sealed_record("legacy", "epsilon-pass", &m);
        corrupt.envelope.salt = Some("not-hex".to_owned());
        records.insert(2, corrupt);

        let analysis = analyze(&records, &m, now());
        assert_eq!(analysis.total_passwords, 4);
        assert_eq!(analysis.skipped_count, 1);
        let ids: Vec<&str> = analysis.passwords.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3"]);
        assert_eq!(analysis.passwords[2].password, "gamma-pass");
        assert_eq!(analysis.passwords[2].name.as_deref(), Some("site-2"));
    }

    #[test]
    fn wrong_master_password_degenerates_to_empty_result() {
        let records = vec![
            sealed_record("a", "first-password", &master("right")),
            sealed_record("b", "second-password", &master("right")),
        ];
        let analysis = analyze(&records, &master("wrong"), now());
        assert_eq!(analysis.total_passwords, 0);
        assert_eq!(analysis.overall_score, 100);
        assert_eq!(analysis.skipped_count, 2);
        assert!(analysis.looks_like_wrong_password());
    }

    #[test]
    fn end_to_end_reuse_detection_through_envelopes() {
        let m = master("m");
        let records = vec![
            sealed_record("0", "a1b2c3d4", &m),
            sealed_record("1", "x9y8z7w6", &m),
            sealed_record("2", "a1b2c3d4", &m),
        ];
        let analysis = analyze(&records, &m, now());
        assert_eq!(analysis.reused_count, 2);
        assert!(analysis.passwords[0].is_reused);
        assert!(!analysis.passwords[1].is_reused);
        assert!(analysis.passwords[2].is_reused);
        assert_eq!(analysis.overall_score, 33);
    }

    #[test]
    fn record_json_accepts_updated_at() {
        let json = serde_json::json!({
            "id": "42",
            "envelope": {
                "salt": "00".repeat(64),
                "iv": "11".repeat(16),
                "authTag": "22".repeat(16),
                "ciphertext": "",
            },
            "updatedAt": "2022-01-01T00:00:00Z",
        });
        let record: VaultRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.id, "42");
        assert_eq!(record.last_updated_at.year(), 2022);
    }

    #[test]
    fn assessment_json_uses_camel_case_flags() {
        let fresh = now() - Duration::days(1);
        let analysis = classify_plain(&[("abc", fresh)]);
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["overallScore"], 0);
        assert_eq!(json["oldPasswordCount"], 0);
        assert_eq!(json["passwords"][0]["isWeak"], true);
        assert_eq!(json["passwords"][0]["isReused"], false);
    }

    #[test]
    fn assessment_debug_hides_password() {
        let fresh = now() - Duration::days(1);
        let analysis = classify_plain(&[("topsecretvalue", fresh)]);
        assert!(!format!("{analysis:?}").contains("topsecretvalue"));
    }
}
