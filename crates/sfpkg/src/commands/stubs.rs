//! Commands that parse their flags but are not implemented yet.

use async_trait::async_trait;
use serde_json::Value;
use sfpkg_core::{Error, Result};

use super::CommandContext;
use super::handler::CommandHandler;

/// Fails every run with [`Error::NotImplemented`].
#[derive(Debug, Clone, Copy)]
pub struct NotImplementedHandler {
    /// Command ID, e.g. `package:create`
    pub command: &'static str,
}

#[async_trait]
impl CommandHandler for NotImplementedHandler {
    fn command_name(&self) -> &'static str {
        self.command
    }

    async fn execute(&self, _ctx: &CommandContext) -> Result<Value> {
        Err(Error::not_implemented(self.command))
    }
}
