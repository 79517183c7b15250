// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! sfpkg - Salesforce package commands
//!
//! The binary is a thin shell around this library: [`cli`] parses the
//! command line, [`commands`] turns the parsed command into a
//! [`commands::CommandHandler`] and runs it against a
//! [`commands::CommandContext`].
//!
//! Tests and embedders build their own context, swapping the org
//! connection and the project lookup:
//!
//! ```ignore
//! use sfpkg::commands::{CommandContext, StaticConnector, execute};
//! use sfpkg::output::Ux;
//!
//! let (ux, captured) = Ux::capture(false);
//! let ctx = CommandContext::new(ux, lifecycle, Arc::new(project), Arc::new(StaticConnector(client)));
//! execute(&ctx, cli.command).await?;
//! ```

/// CLI argument parsing, error envelopes and exit codes.
pub mod cli;
/// Command implementations.
pub mod commands;
/// Status lines printed by the package commands.
pub mod messages;
/// Human and JSON output.
pub mod output;
/// Diagnostic logging setup.
pub mod tracing;
