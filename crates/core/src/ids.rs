//! Record ID validation.
//!
//! Salesforce record IDs are 15 character case-sensitive keys, optionally
//! followed by a 3 character case-safe suffix. The first three characters are
//! the key prefix identifying the object type.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const SUFFIX_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ012345";

/// The kinds of record ID the package commands accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdKind {
    /// Package version a subscriber installs (`04t`)
    SubscriberPackageVersionId,
    /// `PackageInstallRequest` record (`0Hf`)
    PackageInstallRequestId,
    /// `SubscriberPackageVersionUninstallRequest` record (`06y`)
    PackageUninstallRequestId,
    /// Second-generation package (`0Ho`)
    PackageId,
    /// First-generation package (`033`)
    Package1Id,
}

impl IdKind {
    /// The three character key prefix for this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::SubscriberPackageVersionId => "04t",
            Self::PackageInstallRequestId => "0Hf",
            Self::PackageUninstallRequestId => "06y",
            Self::PackageId => "0Ho",
            Self::Package1Id => "033",
        }
    }

    /// The name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubscriberPackageVersionId => "SubscriberPackageVersionId",
            Self::PackageInstallRequestId => "PackageInstallRequestId",
            Self::PackageUninstallRequestId => "PackageUninstallRequestId",
            Self::PackageId => "PackageId",
            Self::Package1Id => "Package1Id",
        }
    }
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the case-safe suffix for the first 15 characters of `id`.
///
/// Returns `None` when `id` is shorter than 15 characters.
#[must_use]
pub fn case_safe_suffix(id: &str) -> Option<String> {
    let key = id.as_bytes().get(..15)?;
    let suffix = key
        .chunks(5)
        .map(|chunk| {
            let index = chunk
                .iter()
                .enumerate()
                .filter(|(_, c)| c.is_ascii_uppercase())
                .fold(0usize, |acc, (bit, _)| acc | (1 << bit));
            char::from(SUFFIX_ALPHABET[index])
        })
        .collect();
    Some(suffix)
}

/// Whether `id` is a well formed 15 or 18 character record ID.
///
/// 18 character IDs must carry the correct case-safe suffix.
#[must_use]
pub fn is_valid_record_id(id: &str) -> bool {
    if !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return false;
    }
    match id.len() {
        15 => true,
        18 => case_safe_suffix(id).is_some_and(|suffix| suffix == id[15..]),
        _ => false,
    }
}

/// Validate `id` as a record ID of the given kind.
///
/// # Errors
///
/// Returns [`Error::InvalidId`] when the prefix does not match `kind` or the
/// ID is not a well formed record ID.
pub fn validate_id(id: &str, kind: IdKind) -> Result<()> {
    if id.starts_with(kind.prefix()) && is_valid_record_id(id) {
        Ok(())
    } else {
        Err(Error::InvalidId {
            id: id.to_string(),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSION_ID: &str = "04t6A000002zgKSQAY";

    #[test]
    fn test_case_safe_suffix() {
        assert_eq!(case_safe_suffix("04t6A000002zgKS").as_deref(), Some("QAY"));
        assert_eq!(case_safe_suffix("0Hf1h0000006sh2").as_deref(), Some("CAA"));
        assert_eq!(case_safe_suffix("short"), None);
    }

    #[test]
    fn test_valid_ids() {
        assert!(validate_id(VERSION_ID, IdKind::SubscriberPackageVersionId).is_ok());
        assert!(validate_id("04t6A000002zgKS", IdKind::SubscriberPackageVersionId).is_ok());
        assert!(validate_id("0Hf1h0000006sh2CAA", IdKind::PackageInstallRequestId).is_ok());
    }

    #[test]
    fn test_wrong_prefix() {
        let err = validate_id(VERSION_ID, IdKind::PackageInstallRequestId).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidId {
                kind: IdKind::PackageInstallRequestId,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_checksum() {
        assert!(validate_id("04t6A000002zgKSAAA", IdKind::SubscriberPackageVersionId).is_err());
    }

    #[test]
    fn test_bad_length_and_characters() {
        assert!(validate_id("04t6A000002zgK", IdKind::SubscriberPackageVersionId).is_err());
        assert!(validate_id("04t6A000002zgKSQ", IdKind::SubscriberPackageVersionId).is_err());
        assert!(validate_id("04t6A000002zg-S", IdKind::SubscriberPackageVersionId).is_err());
        assert!(validate_id("", IdKind::SubscriberPackageVersionId).is_err());
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(IdKind::SubscriberPackageVersionId.prefix(), "04t");
        assert_eq!(IdKind::PackageUninstallRequestId.prefix(), "06y");
        assert_eq!(IdKind::Package1Id.to_string(), "Package1Id");
    }
}
