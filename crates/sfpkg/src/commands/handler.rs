//! Command handler trait and the runner that drives it.
//!
//! Each command implements [`CommandHandler`] and returns its JSON result.
//! [`CommandRunner::run_command`] wraps execution in a tracing span and writes
//! the success envelope in `--json` mode, so handlers only print status lines.

use async_trait::async_trait;
use serde_json::Value;
use sfpkg_core::Result;
use tracing::{Instrument, debug, info_span};

use super::CommandContext;
use crate::cli::OkEnvelope;

/// A runnable command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// The command ID, e.g. `package:uninstall`.
    fn command_name(&self) -> &'static str;

    /// Execute the command and return its result for `--json` output.
    async fn execute(&self, ctx: &CommandContext) -> Result<Value>;
}

/// Extension trait for running commands with span and output handling.
#[async_trait]
pub trait CommandRunner {
    /// Run `cmd`, writing the JSON envelope on success when requested.
    async fn run_command(&self, cmd: &dyn CommandHandler) -> Result<Value>;
}

#[async_trait]
impl CommandRunner for CommandContext {
    async fn run_command(&self, cmd: &dyn CommandHandler) -> Result<Value> {
        let name = cmd.command_name();
        let span = info_span!(
            "command",
            command = name,
            correlation_id = %crate::tracing::correlation_id(),
        );

        async {
            debug!("Command started");
            let result = cmd.execute(self).await;
            match &result {
                Ok(value) => {
                    debug!("Command completed");
                    if self.ux.is_json() {
                        self.ux.json(&OkEnvelope::new(value));
                    }
                }
                Err(e) => debug!(error = %e, "Command failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Serialize a command result.
pub(crate) fn to_result<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| sfpkg_core::Error::serialization(e.to_string()))
}
