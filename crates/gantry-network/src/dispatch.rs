//! Invocation of other platform capabilities.
//!
//! Some hooks need an answer from another plugin (for example whether an
//! app's proxy is enabled). Those probes go through the platform's trigger
//! dispatch binary rather than any direct coupling between plugins.

use std::path::PathBuf;

use async_trait::async_trait;
use gantry_common::{GantryError, GantryResult};
use tokio::process::Command;

/// Environment variable naming the trigger dispatch binary.
pub const DISPATCH_ENV: &str = "GANTRY_DISPATCH";

/// Default trigger dispatch binary.
pub const DEFAULT_DISPATCH: &str = "gantry-dispatch";

/// Invokes named platform capabilities.
#[async_trait]
pub trait CapabilityDispatch: Send + Sync {
    /// Run a capability; `true` when it ran and exited successfully.
    ///
    /// # Errors
    ///
    /// Returns an error if the dispatch binary cannot be executed at all.
    async fn invoke(&self, capability: &str, args: &[&str]) -> GantryResult<bool>;
}

/// [`CapabilityDispatch`] backed by the platform dispatch binary.
#[derive(Debug, Clone)]
pub struct CommandDispatch {
    program: PathBuf,
}

impl CommandDispatch {
    /// Use a specific dispatch binary.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use the binary named by `GANTRY_DISPATCH`, or the default.
    #[must_use]
    pub fn from_env() -> Self {
        let program =
            std::env::var(DISPATCH_ENV).unwrap_or_else(|_| DEFAULT_DISPATCH.to_string());
        Self::new(program)
    }
}

#[async_trait]
impl CapabilityDispatch for CommandDispatch {
    async fn invoke(&self, capability: &str, args: &[&str]) -> GantryResult<bool> {
        tracing::debug!(capability, ?args, "Invoking platform capability");
        let status = Command::new(&self.program)
            .arg(capability)
            .args(args)
            .status()
            .await
            .map_err(|err| GantryError::Runtime {
                message: format!("Failed to execute {}: {}", self.program.display(), err),
            })?;
        Ok(status.success())
    }
}
