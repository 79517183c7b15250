//! Wire types and request builders for the Tooling API.

use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};
use sfpkg_core::ids::is_valid_record_id;
use sfpkg_core::sobjects::InstalledPackage;
use sfpkg_core::{Error, InstallOptions, Result};
use url::Url;

pub const UNINSTALL_SOBJECT: &str = "SubscriberPackageVersionUninstallRequest";
pub const INSTALL_SOBJECT: &str = "PackageInstallRequest";

pub const INSTALLED_PACKAGES_QUERY: &str = "SELECT Id, SubscriberPackageId, \
    SubscriberPackage.NamespacePrefix, SubscriberPackage.Name, \
    SubscriberPackageVersion.Id, SubscriberPackageVersion.Name, \
    SubscriberPackageVersion.MajorVersion, SubscriberPackageVersion.MinorVersion, \
    SubscriberPackageVersion.PatchVersion, SubscriberPackageVersion.BuildNumber \
    FROM InstalledSubscriberPackage ORDER BY SubscriberPackageId";

/// Response to an sobject create.
#[derive(Debug, Deserialize)]
pub struct CreateResponse {
    pub id: String,
}

/// One page of a query result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse<T> {
    pub records: Vec<T>,
    #[serde(default)]
    pub next_records_url: Option<String>,
}

/// A row of [`INSTALLED_PACKAGES_QUERY`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstalledRow {
    pub id: String,
    pub subscriber_package_id: String,
    #[serde(default)]
    pub subscriber_package: Option<PackageInfo>,
    #[serde(default)]
    pub subscriber_package_version: Option<VersionInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub major_version: Option<u32>,
    #[serde(default)]
    pub minor_version: Option<u32>,
    #[serde(default)]
    pub patch_version: Option<u32>,
    #[serde(default)]
    pub build_number: Option<u32>,
}

/// A row of the uninstall errors query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UninstallErrorRow {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteErrorItem {
    message: String,
    #[serde(default)]
    error_code: Option<String>,
}

impl From<InstalledRow> for InstalledPackage {
    fn from(row: InstalledRow) -> Self {
        let package = row.subscriber_package.unwrap_or_default();
        let version = row.subscriber_package_version.unwrap_or_default();
        let number = format!(
            "{}.{}.{}.{}",
            version.major_version.unwrap_or_default(),
            version.minor_version.unwrap_or_default(),
            version.patch_version.unwrap_or_default(),
            version.build_number.unwrap_or_default(),
        );
        Self {
            id: row.id,
            subscriber_package_id: row.subscriber_package_id,
            subscriber_package_name: package.name.unwrap_or_default(),
            subscriber_package_namespace: package.namespace_prefix,
            subscriber_package_version_id: version.id.unwrap_or_default(),
            subscriber_package_version_name: version.name.unwrap_or_default(),
            subscriber_package_version_number: number,
        }
    }
}

/// `{instance}/services/data/v{api}/tooling/`
pub fn tooling_base(instance_url: &str, api_version: &str) -> Result<Url> {
    let instance = Url::parse(instance_url).map_err(|e| {
        Error::configuration_with_help(
            format!("Invalid instance URL '{instance_url}': {e}"),
            "instance_url must be an absolute URL such as https://example.my.salesforce.com",
        )
    })?;
    if !matches!(instance.scheme(), "https" | "http") {
        return Err(Error::configuration(format!(
            "Invalid instance URL '{instance_url}': expected an http(s) URL"
        )));
    }
    join(&instance, &format!("services/data/v{api_version}/tooling/"))
}

pub fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| Error::configuration(format!("Invalid request path '{path}': {e}")))
}

/// Query for the messages of a failed uninstall request.
pub fn uninstall_errors_query(request_id: &str) -> Result<String> {
    if !is_valid_record_id(request_id) {
        return Err(Error::remote(
            None,
            format!("Org returned an invalid request ID [{request_id}]"),
        ));
    }
    Ok(format!(
        "SELECT Message FROM PackageVersionUninstallRequestError WHERE ParentRequest.Id = '{request_id}' ORDER BY Message"
    ))
}

/// Body of a `PackageInstallRequest` create.
pub fn install_body(options: &InstallOptions) -> Value {
    let mut body = json!({
        "SubscriberPackageVersionKey": options.subscriber_package_version_key,
        "SecurityType": options.security_type.wire_value(),
        "UpgradeType": options.upgrade_type.wire_value(),
        "ApexCompileType": options.apex_compile_type.wire_value(),
        "NameConflictResolution": "Block",
        "PackageInstallSource": "U",
    });
    if let (Some(key), Some(map)) = (&options.installation_key, body.as_object_mut()) {
        map.insert(
            "Password".to_string(),
            Value::String(key.expose_secret().to_string()),
        );
    }
    body
}

/// Message for a failed response.
///
/// The API answers errors with `[{"message", "errorCode"}]`; anything else is
/// passed through as text.
pub fn remote_message(status: u16, body: &str) -> String {
    if let Ok(items) = serde_json::from_str::<Vec<RemoteErrorItem>>(body)
        && !items.is_empty()
    {
        return items
            .into_iter()
            .map(|item| match item.error_code {
                Some(code) => format!("{code}: {}", item.message),
                None => item.message,
            })
            .collect::<Vec<_>>()
            .join("; ");
    }
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use sfpkg_core::{SecurityType, UpgradeType};

    #[test]
    fn test_tooling_base() {
        let url = tooling_base("https://example.my.salesforce.com", "55.0").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.my.salesforce.com/services/data/v55.0/tooling/"
        );
        let sobject = join(&url, "sobjects/PackageInstallRequest/0Hf1h0000006sh2CAA").unwrap();
        assert_eq!(
            sobject.path(),
            "/services/data/v55.0/tooling/sobjects/PackageInstallRequest/0Hf1h0000006sh2CAA"
        );
    }

    #[test]
    fn test_tooling_base_rejects_bad_urls() {
        assert!(tooling_base("example.my.salesforce.com", "55.0").is_err());
        assert!(tooling_base("ftp://example.com", "55.0").is_err());
    }

    #[test]
    fn test_install_body() {
        let options = InstallOptions {
            installation_key: Some(SecretString::from("hunter2")),
            security_type: SecurityType::AllUsers,
            upgrade_type: UpgradeType::Delete,
            ..InstallOptions::new("04t6A000002zgKSQAY")
        };
        let body = install_body(&options);
        assert_eq!(body["SubscriberPackageVersionKey"], "04t6A000002zgKSQAY");
        assert_eq!(body["Password"], "hunter2");
        assert_eq!(body["SecurityType"], "Full");
        assert_eq!(body["UpgradeType"], "delete-only");
        assert_eq!(body["ApexCompileType"], "all");
        assert_eq!(body["NameConflictResolution"], "Block");

        let body = install_body(&InstallOptions::new("04t6A000002zgKSQAY"));
        assert!(body.get("Password").is_none());
    }

    #[test]
    fn test_remote_message() {
        let body = r#"[{"message":"Session expired or invalid","errorCode":"INVALID_SESSION_ID"}]"#;
        assert_eq!(
            remote_message(401, body),
            "INVALID_SESSION_ID: Session expired or invalid"
        );
        assert_eq!(remote_message(502, ""), "HTTP 502");
        assert_eq!(remote_message(500, "oops\n"), "HTTP 500: oops");
    }

    #[test]
    fn test_installed_row_flattening() {
        let row: InstalledRow = serde_json::from_value(json!({
            "attributes": { "type": "InstalledSubscriberPackage" },
            "Id": "0A31h000000XY1aCAG",
            "SubscriberPackageId": "0331h000000CpfKAAS",
            "SubscriberPackage": { "NamespacePrefix": null, "Name": "Widgets" },
            "SubscriberPackageVersion": {
                "Id": "04t6A000002zgKSQAY",
                "Name": "Spring",
                "MajorVersion": 1,
                "MinorVersion": 2,
                "PatchVersion": 0,
                "BuildNumber": 7
            }
        }))
        .unwrap();
        let package = InstalledPackage::from(row);
        assert_eq!(package.subscriber_package_name, "Widgets");
        assert_eq!(package.subscriber_package_namespace, None);
        assert_eq!(package.subscriber_package_version_number, "1.2.0.7");
    }

    #[test]
    fn test_uninstall_errors_query() {
        let query = uninstall_errors_query("06y000000000001AAA").unwrap();
        assert!(query.ends_with("ParentRequest.Id = '06y000000000001AAA' ORDER BY Message"));
        assert!(uninstall_errors_query("06y' OR Id != '").is_err());
    }
}
