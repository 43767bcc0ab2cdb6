//! Container runtime adapter.
//!
//! The plugin never drives the runtime directly; everything goes through
//! [`ContainerRuntime`] so the attachment and listener logic can be tested
//! without a running daemon. [`DockerCli`] is the production
//! implementation, shelling out to the `docker` binary.

use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use gantry_common::{GantryError, GantryResult};
use serde_json::Value;
use tokio::process::Command;

/// Label holding the owning app name on platform containers.
pub const LABEL_APP_NAME: &str = "com.gantry.app-name";

/// Label holding the process type on platform containers.
pub const LABEL_PROCESS_TYPE: &str = "com.gantry.process-type";

/// Container runtime operations the plugin depends on.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Whether a named network exists.
    ///
    /// An absent network is a normal `false`; only a runtime communication
    /// failure is an error.
    async fn network_exists(&self, name: &str) -> GantryResult<bool>;

    /// Join a container to a named network.
    async fn connect_network(&self, container_id: &str, network: &str) -> GantryResult<()>;

    /// Value of a label on a container, empty when unset.
    async fn container_label(&self, container_id: &str, label: &str) -> GantryResult<String>;

    /// Current IP address of a container, empty when it has none.
    async fn container_ip(&self, container_id: &str) -> GantryResult<String>;

    /// IDs of running containers for an app, optionally narrowed to one
    /// process type.
    async fn running_containers(
        &self,
        app: &str,
        process_type: Option<&str>,
    ) -> GantryResult<Vec<String>>;
}

/// [`ContainerRuntime`] backed by the `docker` CLI.
#[derive(Debug, Clone)]
pub struct DockerCli {
    /// Docker binary to invoke.
    program: PathBuf,
}

impl DockerCli {
    /// Use the `docker` binary from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("docker"),
        }
    }

    /// Use a specific docker binary.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> GantryResult<Output> {
        tracing::debug!(program = %self.program.display(), ?args, "Invoking container runtime");
        Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|err| GantryError::Runtime {
                message: format!("Failed to execute {}: {}", self.program.display(), err),
            })
    }

    async fn run_checked(&self, args: &[&str]) -> GantryResult<String> {
        let output = self.run(args).await?;
        if !output.status.success() {
            return Err(GantryError::Runtime {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn inspect(&self, container_id: &str) -> GantryResult<Value> {
        let stdout = self
            .run_checked(&["inspect", "--type", "container", container_id])
            .await?;
        let docs: Vec<Value> = serde_json::from_str(&stdout)?;
        docs.into_iter().next().ok_or_else(|| GantryError::Runtime {
            message: format!("No such container: {container_id}"),
        })
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn network_exists(&self, name: &str) -> GantryResult<bool> {
        // Listing keeps "absent" distinct from "daemon unreachable", which
        // `network inspect` folds into one non-zero exit.
        let stdout = self
            .run_checked(&["network", "ls", "--format", "{{ .Name }}"])
            .await?;
        Ok(stdout.lines().any(|line| line.trim() == name))
    }

    async fn connect_network(&self, container_id: &str, network: &str) -> GantryResult<()> {
        self.run_checked(&["network", "connect", network, container_id])
            .await?;
        Ok(())
    }

    async fn container_label(&self, container_id: &str, label: &str) -> GantryResult<String> {
        let doc = self.inspect(container_id).await?;
        Ok(doc
            .pointer("/Config/Labels")
            .and_then(|labels| labels.get(label))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn container_ip(&self, container_id: &str) -> GantryResult<String> {
        let doc = self.inspect(container_id).await?;

        let top_level = doc
            .pointer("/NetworkSettings/IPAddress")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !top_level.is_empty() {
            return Ok(top_level.to_string());
        }

        // Containers on user-defined networks report per-network addresses.
        let from_networks = doc
            .pointer("/NetworkSettings/Networks")
            .and_then(Value::as_object)
            .and_then(|networks| {
                networks
                    .values()
                    .filter_map(|network| network.get("IPAddress").and_then(Value::as_str))
                    .find(|ip| !ip.is_empty())
            })
            .unwrap_or_default();
        Ok(from_networks.to_string())
    }

    async fn running_containers(
        &self,
        app: &str,
        process_type: Option<&str>,
    ) -> GantryResult<Vec<String>> {
        let app_filter = format!("label={LABEL_APP_NAME}={app}");
        let mut args: Vec<&str> = vec![
            "ps",
            "--quiet",
            "--no-trunc",
            "--filter",
            "status=running",
            "--filter",
            &app_filter,
        ];

        let process_filter;
        if let Some(process_type) = process_type {
            process_filter = format!("label={LABEL_PROCESS_TYPE}={process_type}");
            args.push("--filter");
            args.push(&process_filter);
        }

        let stdout = self.run_checked(&args).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}
