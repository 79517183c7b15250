//! Property-based tests for record ID validation and alias resolution

use proptest::prelude::*;
use sfpkg_core::ids::{case_safe_suffix, is_valid_record_id};
use sfpkg_core::project::ProjectJson;
use sfpkg_core::{Error, IdKind, SfProject, resolve_subscriber_package_version_id, validate_id};

const SUFFIX_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ012345";

fn empty_project() -> SfProject {
    let json: ProjectJson = serde_json::from_str(r#"{"packageDirectories":[]}"#).unwrap();
    SfProject::new("/tmp/sfpkg-proptest", json)
}

proptest! {
    #[test]
    fn test_generated_ids_validate(body in "[a-zA-Z0-9]{12}") {
        let key = format!("04t{body}");
        let suffix = case_safe_suffix(&key).unwrap();
        prop_assert_eq!(suffix.len(), 3);
        prop_assert!(suffix.chars().all(|c| SUFFIX_ALPHABET.contains(c)));

        prop_assert!(validate_id(&key, IdKind::SubscriberPackageVersionId).is_ok());
        let full = format!("{key}{suffix}");
        prop_assert!(validate_id(&full, IdKind::SubscriberPackageVersionId).is_ok());
        prop_assert!(validate_id(&full, IdKind::PackageInstallRequestId).is_err());
    }

    #[test]
    fn test_wrong_suffix_rejected(body in "[a-zA-Z0-9]{12}", replacement in "[A-Z0-5]") {
        let key = format!("04t{body}");
        let suffix = case_safe_suffix(&key).unwrap();
        let replacement_char = replacement.chars().next().unwrap();
        prop_assume!(!suffix.starts_with(replacement_char));

        let tampered = format!("{key}{replacement}{}", &suffix[1..]);
        prop_assert!(!is_valid_record_id(&tampered));
    }

    #[test]
    fn test_lengths_other_than_15_and_18_rejected(id in "04t[a-zA-Z0-9]{0,20}") {
        prop_assume!(id.len() != 15 && id.len() != 18);
        prop_assert!(!is_valid_record_id(&id));
    }

    #[test]
    fn test_unknown_alias_reports_token(alias in "[a-zA-Z][a-zA-Z0-9_@.]{0,30}") {
        prop_assume!(!alias.starts_with("04t"));
        let err = resolve_subscriber_package_version_id(&alias, &empty_project()).unwrap_err();
        match err {
            Error::PackageAliasNotFound { alias: reported } => prop_assert_eq!(reported, alias),
            other => prop_assert!(false, "unexpected error: {other:?}"),
        }
    }
}
