//! `package:install`, `package:install:report` and `package:installed:list`
//! against a fake org.

mod common;

use common::{Harness, USERNAME, no_project, project};
use serde_json::json;
use sfpkg_core::sobjects::InstallStatus;
use sfpkg_core::test_utils::{
    FakeCall, INSTALL_REQUEST_ID, PACKAGE_VERSION_ID, install_request, installed_package,
};
use sfpkg_core::{ApexCompileType, Error, SecurityType, UpgradeType};
use std::time::Duration;

fn failed_install() -> sfpkg_core::sobjects::PackageInstallRequest {
    let mut record = install_request(InstallStatus::Error);
    record.extra.insert(
        "Errors".to_string(),
        json!({ "errors": [
            { "message": "Dependent package not installed" },
            { "message": "Missing required field" }
        ]}),
    );
    record
}

#[tokio::test]
async fn test_install_success() {
    let h = Harness::new(false, project());
    h.client
        .push_install_progress(install_request(InstallStatus::InProgress));
    h.client
        .push_install(Ok(install_request(InstallStatus::Success)));

    let result = h
        .run(&["package:install", "-p", "MyPkg@1.0.0-1", "-w", "10"])
        .await
        .unwrap();

    assert_eq!(result["Status"], "SUCCESS");
    assert_eq!(
        h.lines(),
        vec![
            "Waiting for the package install request to complete. Status = IN_PROGRESS",
            "Successfully installed package [04t6A000002zgKSQAY]",
        ]
    );
    assert_eq!(
        h.client.calls(),
        vec![FakeCall::Install {
            subscriber_package_version_key: PACKAGE_VERSION_ID.to_string(),
            wait: Duration::from_secs(600),
            has_installation_key: false,
            security_type: SecurityType::AdminsOnly,
            upgrade_type: UpgradeType::Mixed,
            apex_compile_type: ApexCompileType::All,
        }]
    );
}

#[tokio::test]
async fn test_install_passes_options() {
    let h = Harness::new(false, no_project());
    h.client
        .push_install(Ok(install_request(InstallStatus::Success)));

    h.run(&[
        "package:install",
        "-p",
        PACKAGE_VERSION_ID,
        "-k",
        "s3cret",
        "-s",
        "AllUsers",
        "-t",
        "Delete",
        "-a",
        "package",
    ])
    .await
    .unwrap();

    assert_eq!(
        h.client.calls(),
        vec![FakeCall::Install {
            subscriber_package_version_key: PACKAGE_VERSION_ID.to_string(),
            wait: Duration::ZERO,
            has_installation_key: true,
            security_type: SecurityType::AllUsers,
            upgrade_type: UpgradeType::Delete,
            apex_compile_type: ApexCompileType::Package,
        }]
    );
}

#[tokio::test]
async fn test_install_in_progress_prints_report_hint() {
    let h = Harness::new(false, no_project());
    h.client
        .push_install(Ok(install_request(InstallStatus::InProgress)));

    h.run(&["package:install", "-p", PACKAGE_VERSION_ID])
        .await
        .unwrap();

    assert_eq!(
        h.lines(),
        vec![format!(
            "PackageInstallRequest is currently InProgress. You can continue to query the status using\n\
             sfpkg package:install:report -i {INSTALL_REQUEST_ID} -u {USERNAME}"
        )]
    );
}

#[tokio::test]
async fn test_install_error_lists_org_errors() {
    let h = Harness::new(false, no_project());
    h.client.push_install(Ok(failed_install()));

    let err = h
        .run(&["package:install", "-p", PACKAGE_VERSION_ID, "-w", "1"])
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Encountered errors installing the package! Installation errors: \n\
         1) Dependent package not installed\n\
         2) Missing required field"
    );
    assert!(h.lines().is_empty());
}

#[tokio::test]
async fn test_install_unknown_alias_never_reaches_org() {
    let h = Harness::new(false, project());

    let err = h
        .run(&["package:install", "-p", "Nope@1.0.0-1"])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::PackageAliasNotFound { .. }));
    assert!(h.client.calls().is_empty());
}

#[tokio::test]
async fn test_install_report() {
    let h = Harness::new(false, no_project());
    h.client
        .push_install_status(Ok(install_request(InstallStatus::Success)));

    let result = h
        .run(&["package:install:report", "-i", INSTALL_REQUEST_ID])
        .await
        .unwrap();

    assert_eq!(result["Id"], INSTALL_REQUEST_ID);
    assert_eq!(
        h.lines(),
        vec!["Successfully installed package [04t6A000002zgKSQAY]"]
    );
    assert_eq!(
        h.client.calls(),
        vec![FakeCall::InstallStatus {
            request_id: INSTALL_REQUEST_ID.to_string(),
        }]
    );
}

#[tokio::test]
async fn test_install_report_error() {
    let h = Harness::new(false, no_project());
    h.client.push_install_status(Ok(failed_install()));

    let err = h
        .run(&["package:install:report", "-i", INSTALL_REQUEST_ID])
        .await
        .unwrap_err();

    match err {
        Error::PackageInstall { messages } => assert_eq!(messages.len(), 2),
        other => panic!("expected PackageInstall, got {other:?}"),
    }
}

#[tokio::test]
async fn test_install_report_validates_request_id() {
    let h = Harness::new(false, no_project());

    let err = h
        .run(&["package:install:report", "-i", "0Hf1h0000006sh2"])
        .await;
    // 15 character IDs are accepted
    assert!(matches!(err, Err(Error::Remote { .. })));

    let err = h
        .run(&["package:install:report", "-i", "06y000000000001AAA"])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidId { .. }));

    assert_eq!(h.client.calls().len(), 1);
}

#[tokio::test]
async fn test_installed_list_table() {
    let h = Harness::new(false, no_project());
    h.client.push_installed(Ok(vec![
        installed_package("Widgets", Some("wdg"), "1.2.0.7"),
        installed_package("Gadgets", None, "3.0.0.1"),
    ]));

    let result = h.run(&["package:installed:list"]).await.unwrap();

    assert_eq!(result.as_array().map(Vec::len), Some(2));
    assert_eq!(result[0]["SubscriberPackageName"], "Widgets");

    let lines = h.lines();
    assert_eq!(lines.len(), 1);
    let table: Vec<&str> = lines[0].lines().collect();
    assert_eq!(table.len(), 4);
    assert!(table[0].starts_with("ID"));
    assert!(table[0].contains("Package Version ID"));
    assert!(table[0].ends_with("Version"));
    assert!(table[2].contains("Widgets"));
    assert!(table[2].contains("wdg"));
    assert!(table[3].ends_with("3.0.0.1"));
}

#[tokio::test]
async fn test_installed_list_json() {
    let h = Harness::new(true, no_project());
    h.client.push_installed(Ok(Vec::new()));

    h.run(&["package:installed:list", "-u", USERNAME])
        .await
        .unwrap();

    let lines = h.lines();
    assert_eq!(lines.len(), 1);
    let envelope: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(envelope, json!({ "status": 0, "result": [] }));
}

#[tokio::test]
async fn test_stubs_are_not_implemented() {
    let h = Harness::new(false, no_project());

    for args in [
        vec!["package:version:list"],
        vec!["package1:version:create", "-i", "0331h000000CpfKAAS", "-n", "Spring"],
        vec!["package1:version:list"],
    ] {
        let err = h.run(&args).await.unwrap_err();
        assert!(matches!(err, Error::NotImplemented { .. }), "{args:?}");
    }
    assert!(h.client.calls().is_empty());
}
