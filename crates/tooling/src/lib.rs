//! Tooling REST API client for sfpkg.
//!
//! [`ToolingClient`] implements [`PackagingClient`] for a single org
//! connection. Install and uninstall requests are created, then polled at
//! the configured interval until they leave their pending state or
//! the caller's `wait` budget runs out. Each pending observation is emitted
//! on the [`Lifecycle`].

mod api;

use api::{
    CreateResponse, INSTALL_SOBJECT, INSTALLED_PACKAGES_QUERY, InstalledRow, QueryResponse,
    UNINSTALL_SOBJECT, UninstallErrorRow,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use sfpkg_core::config::{DEFAULT_POLL_INTERVAL, OrgConnection};
use sfpkg_core::sobjects::{
    InstalledPackage, PackageInstallRequest, SubscriberPackageVersionUninstallRequest,
    UninstallStatus,
};
use sfpkg_core::{Error, InstallOptions, Lifecycle, LifecycleEvent, PackagingClient, Result};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

/// Longest wait honored; larger budgets are clamped to it.
const MAX_WAIT: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// When a wait of `wait` that starts now runs out.
fn deadline_after(wait: Duration) -> Instant {
    Instant::now() + wait.min(MAX_WAIT)
}

/// [`PackagingClient`] backed by the Tooling REST API.
pub struct ToolingClient {
    http: Client,
    instance: Url,
    base: Url,
    access_token: SecretString,
    username: String,
    poll_interval: Duration,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for ToolingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolingClient")
            .field("base", &self.base.as_str())
            .field("username", &self.username)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl ToolingClient {
    /// Create a client for `connection`, emitting progress on `lifecycle`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unusable instance URL, or a
    /// remote error if the HTTP client cannot be initialized.
    pub fn new(connection: OrgConnection, lifecycle: Lifecycle) -> Result<Self> {
        let base = api::tooling_base(&connection.instance_url, &connection.api_version)?;
        let instance = api::join(&base, "/")?;
        let http = Client::builder()
            .user_agent(concat!("sfpkg/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::remote(None, format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            instance,
            base,
            access_token: connection.access_token,
            username: connection.username,
            poll_interval: DEFAULT_POLL_INTERVAL,
            lifecycle,
        })
    }

    /// Set the interval between status checks.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| Error::remote(None, format!("Failed to reach {}: {e}", self.instance)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::remote(Some(status.as_u16()), format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "Tooling API request failed");
            return Err(Error::remote(
                Some(status.as_u16()),
                api::remote_message(status.as_u16(), &body),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::serialization(format!("Unexpected response from org: {e}")))
    }

    async fn create(&self, sobject: &str, body: serde_json::Value) -> Result<String> {
        let url = api::join(&self.base, &format!("sobjects/{sobject}"))?;
        debug!(%url, "Creating record");
        let created: CreateResponse = self.send(self.http.post(url).json(&body)).await?;
        Ok(created.id)
    }

    async fn retrieve<T: DeserializeOwned>(&self, sobject: &str, id: &str) -> Result<T> {
        let url = api::join(&self.base, &format!("sobjects/{sobject}/{id}"))?;
        debug!(%url, "Fetching record");
        self.send(self.http.get(url)).await
    }

    async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>> {
        let mut url = api::join(&self.base, "query/")?;
        url.query_pairs_mut().append_pair("q", soql);

        let mut records = Vec::new();
        loop {
            debug!(%url, "Running query");
            let page: QueryResponse<T> = self.send(self.http.get(url)).await?;
            records.extend(page.records);
            match page.next_records_url {
                Some(next) => url = api::join(&self.instance, &next)?,
                None => return Ok(records),
            }
        }
    }

    /// Sleep for one poll interval, never past `deadline`.
    async fn pause(&self, deadline: Instant) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        tokio::time::sleep(self.poll_interval.min(remaining)).await;
    }

    async fn uninstall_errors(&self, request_id: &str) -> Result<Vec<String>> {
        let rows: Vec<UninstallErrorRow> =
            self.query(&api::uninstall_errors_query(request_id)?).await?;
        Ok(rows.into_iter().map(|r| r.message).collect())
    }

    async fn check_uninstall(
        &self,
        record: SubscriberPackageVersionUninstallRequest,
    ) -> Result<SubscriberPackageVersionUninstallRequest> {
        if record.status != UninstallStatus::Error {
            return Ok(record);
        }
        let messages = self.uninstall_errors(&record.id).await?;
        let version_id = record.subscriber_package_version_id().map(str::to_string);
        Err(Error::PackageUninstall {
            request_id: record.id,
            version_id,
            messages,
        })
    }
}

#[async_trait]
impl PackagingClient for ToolingClient {
    fn username(&self) -> &str {
        &self.username
    }

    async fn uninstall(
        &self,
        subscriber_package_version_id: &str,
        wait: Duration,
    ) -> Result<SubscriberPackageVersionUninstallRequest> {
        let deadline = deadline_after(wait);
        let request_id = self
            .create(
                UNINSTALL_SOBJECT,
                json!({ "SubscriberPackageVersionId": subscriber_package_version_id }),
            )
            .await?;
        info!(%request_id, subscriber_package_version_id, "Uninstall requested");

        let mut record: SubscriberPackageVersionUninstallRequest =
            self.retrieve(UNINSTALL_SOBJECT, &request_id).await?;
        while record.status.is_pending() && Instant::now() < deadline {
            self.lifecycle
                .emit(&LifecycleEvent::PackageUninstall(record.clone()));
            self.pause(deadline).await;
            record = self.retrieve(UNINSTALL_SOBJECT, &request_id).await?;
        }
        debug!(%request_id, status = %record.status, "Uninstall request observed");
        self.check_uninstall(record).await
    }

    async fn uninstall_status(
        &self,
        request_id: &str,
    ) -> Result<SubscriberPackageVersionUninstallRequest> {
        let record = self.retrieve(UNINSTALL_SOBJECT, request_id).await?;
        self.check_uninstall(record).await
    }

    async fn install(
        &self,
        options: &InstallOptions,
        wait: Duration,
    ) -> Result<PackageInstallRequest> {
        let deadline = deadline_after(wait);
        let request_id = self
            .create(INSTALL_SOBJECT, api::install_body(options))
            .await?;
        info!(
            %request_id,
            package = %options.subscriber_package_version_key,
            "Install requested"
        );

        let mut record: PackageInstallRequest =
            self.retrieve(INSTALL_SOBJECT, &request_id).await?;
        while record.status.is_pending() && Instant::now() < deadline {
            self.lifecycle
                .emit(&LifecycleEvent::PackageInstall(record.clone()));
            self.pause(deadline).await;
            record = self.retrieve(INSTALL_SOBJECT, &request_id).await?;
        }
        debug!(%request_id, status = %record.status, "Install request observed");
        record.into_result()
    }

    async fn install_status(&self, request_id: &str) -> Result<PackageInstallRequest> {
        self.retrieve(INSTALL_SOBJECT, request_id).await
    }

    async fn installed_packages(&self) -> Result<Vec<InstalledPackage>> {
        let rows: Vec<InstalledRow> = self.query(INSTALLED_PACKAGES_QUERY).await?;
        debug!(count = rows.len(), "Fetched installed packages");
        Ok(rows.into_iter().map(InstalledPackage::from).collect())
    }
}
