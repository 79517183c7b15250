// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! Core types for sfpkg.
//!
//! This crate holds everything the package commands share:
//!
//! - [`ids`] - record ID validation (`04t`, `0Hf`, `06y`, ...)
//! - [`project`] - `sfdx-project.json` discovery and parsing
//! - [`resolve`] - turning a package alias or ID into a package version ID
//! - [`sobjects`] - the install/uninstall request records
//! - [`client`] - the [`PackagingClient`] boundary the commands call into
//! - [`lifecycle`] - progress notifications emitted while a request is polled
//! - [`config`] / [`paths`] - user configuration and org connections

pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod paths;
pub mod project;
pub mod resolve;
pub mod sobjects;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use client::{ApexCompileType, InstallOptions, PackagingClient, SecurityType, UpgradeType};
pub use error::{Error, Result};
pub use ids::{IdKind, validate_id};
pub use lifecycle::{Lifecycle, LifecycleEvent, LifecycleEventKind};
pub use project::SfProject;
pub use resolve::{ProjectSource, resolve_subscriber_package_version_id};
