//! Listener discovery from persisted container network facts.
//!
//! Container start writes one IP fact and one port fact per
//! (app, process type, container index); a listener is the `ip:port` join
//! of the two. Facts are flat files holding a single raw scalar,
//! overwritten wholesale on each write.

use std::fs;
use std::path::Path;

use gantry_common::{GantryError, GantryPaths, GantryResult, PropertyStore, Scope};

use crate::config::NETWORK_NAMESPACE;

/// Process type assumed when none is given.
pub const DEFAULT_PROCESS_TYPE: &str = "web";

/// Property holding a fixed web listener for non-container deployments.
pub const STATIC_WEB_LISTENER: &str = "static-web-listener";

/// Derives reachable listeners for an app's processes.
pub struct ListenerResolver {
    paths: GantryPaths,
}

impl ListenerResolver {
    /// Create a resolver over the given data root.
    #[must_use]
    pub const fn new(paths: GantryPaths) -> Self {
        Self { paths }
    }

    /// `ip:port` listeners for a process type, in container index order.
    ///
    /// A container that has not reported both facts yet contributes
    /// nothing; an app without any facts yields an empty list.
    #[must_use]
    pub fn listeners(&self, app: &str, process_type: &str) -> Vec<String> {
        let mut indices = self.fact_indices(app, process_type);
        indices.sort_unstable();

        let mut listeners = Vec::new();
        for index in indices {
            let ip = read_fact(&self.paths.ip_fact(app, process_type, index));
            let port = read_fact(&self.paths.port_fact(app, process_type, index));
            if let (Some(ip), Some(port)) = (ip, port) {
                listeners.push(format!("{ip}:{port}"));
            }
        }
        listeners
    }

    /// Fixed web listener for the app, empty when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the property store cannot be read.
    pub fn static_web_listener(
        &self,
        store: &dyn PropertyStore,
        app: &str,
    ) -> GantryResult<String> {
        Ok(store
            .get(NETWORK_NAMESPACE, Scope::App(app), STATIC_WEB_LISTENER)?
            .unwrap_or_default())
    }

    /// Whether the app has reported at least one complete web listener.
    #[must_use]
    pub fn has_network_config(&self, app: &str) -> bool {
        !self.listeners(app, DEFAULT_PROCESS_TYPE).is_empty()
    }

    /// Remove every persisted network fact for an app.
    ///
    /// Nothing to clear is success; a fact that cannot be removed fails
    /// the whole operation so callers never proceed over stale state.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::ConfigClearFailed`] if any fact survives.
    pub fn clear_network_config(&self, app: &str) -> GantryResult<()> {
        let clear_failed = || GantryError::ConfigClearFailed {
            app: app.to_string(),
        };

        let entries = match fs::read_dir(self.paths.app_root(app)) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(_) => return Err(clear_failed()),
        };

        for entry in entries {
            let entry = entry.map_err(|_| clear_failed())?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if (name.starts_with("IP.") || name.starts_with("PORT."))
                && fs::remove_file(entry.path()).is_err()
            {
                return Err(clear_failed());
            }
        }
        Ok(())
    }

    /// Persist the IP fact for one container.
    ///
    /// # Errors
    ///
    /// Returns an error if the fact cannot be written.
    pub fn write_ip(
        &self,
        app: &str,
        process_type: &str,
        index: u32,
        ip: &str,
    ) -> GantryResult<()> {
        write_fact(&self.paths.ip_fact(app, process_type, index), ip)
    }

    /// Persist the port fact for one container.
    ///
    /// # Errors
    ///
    /// Returns an error if the fact cannot be written.
    pub fn write_port(
        &self,
        app: &str,
        process_type: &str,
        index: u32,
        port: &str,
    ) -> GantryResult<()> {
        write_fact(&self.paths.port_fact(app, process_type, index), port)
    }

    /// Container indices with an IP fact on disk for the process type.
    fn fact_indices(&self, app: &str, process_type: &str) -> Vec<u32> {
        let prefix = format!("IP.{process_type}.");
        let Ok(entries) = fs::read_dir(self.paths.app_root(app)) else {
            return Vec::new();
        };

        entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                name.strip_prefix(&prefix)?.parse().ok()
            })
            .collect()
    }
}

fn read_fact(path: &Path) -> Option<String> {
    let value = fs::read_to_string(path).ok()?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn write_fact(path: &Path, value: &str) -> GantryResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, value)?;
    Ok(())
}
