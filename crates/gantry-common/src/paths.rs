//! Standard filesystem paths under the Gantry data root.

use std::path::PathBuf;

use once_cell::sync::Lazy;

/// Default data root for Gantry.
pub static GANTRY_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("GANTRY_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/gantry"))
});

/// Standard paths used by the network plugin.
#[derive(Debug, Clone)]
pub struct GantryPaths {
    /// Data root directory (default: /var/lib/gantry).
    pub root: PathBuf,
}

impl GantryPaths {
    /// Create paths with the default root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding one subdirectory per app.
    #[must_use]
    pub fn apps(&self) -> PathBuf {
        self.root.join("apps")
    }

    /// Root directory for a specific app.
    #[must_use]
    pub fn app_root(&self, app: &str) -> PathBuf {
        self.apps().join(app)
    }

    /// IP fact file for one container of an app process.
    #[must_use]
    pub fn ip_fact(&self, app: &str, process_type: &str, index: u32) -> PathBuf {
        self.app_root(app).join(format!("IP.{process_type}.{index}"))
    }

    /// Port fact file for one container of an app process.
    #[must_use]
    pub fn port_fact(&self, app: &str, process_type: &str, index: u32) -> PathBuf {
        self.app_root(app)
            .join(format!("PORT.{process_type}.{index}"))
    }

    /// Directory for the property store.
    #[must_use]
    pub fn properties(&self) -> PathBuf {
        self.root.join("properties")
    }

    /// Directory holding one file per key for a property scope.
    #[must_use]
    pub fn property_scope(&self, namespace: &str, scope_dir: &str) -> PathBuf {
        self.properties().join(namespace).join(scope_dir)
    }

    /// File backing a single property.
    #[must_use]
    pub fn property_file(&self, namespace: &str, scope_dir: &str, key: &str) -> PathBuf {
        self.property_scope(namespace, scope_dir).join(key)
    }

    /// Names of all existing apps, sorted.
    ///
    /// A data root without an apps directory simply has no apps.
    ///
    /// # Errors
    ///
    /// Returns an error if the apps directory cannot be read.
    pub fn list_apps(&self) -> std::io::Result<Vec<String>> {
        let entries = match std::fs::read_dir(self.apps()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut apps = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    apps.push(name.to_string());
                }
            }
        }
        apps.sort();
        Ok(apps)
    }

    /// Create all necessary directories.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.apps())?;
        std::fs::create_dir_all(self.properties())?;
        Ok(())
    }
}

impl Default for GantryPaths {
    fn default() -> Self {
        Self {
            root: GANTRY_ROOT.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_paths() {
        let paths = GantryPaths::with_root("/var/lib/gantry");
        assert_eq!(
            paths.ip_fact("myapp", "web", 0),
            PathBuf::from("/var/lib/gantry/apps/myapp/IP.web.0")
        );
        assert_eq!(
            paths.port_fact("myapp", "worker", 3),
            PathBuf::from("/var/lib/gantry/apps/myapp/PORT.worker.3")
        );
    }

    #[test]
    fn property_paths() {
        let paths = GantryPaths::with_root("/tmp/gantry-test");
        assert_eq!(
            paths.property_file("network", "myapp", "initial-network"),
            PathBuf::from("/tmp/gantry-test/properties/network/myapp/initial-network")
        );
        assert_eq!(
            paths.property_scope("network", "--global"),
            PathBuf::from("/tmp/gantry-test/properties/network/--global")
        );
    }

    #[test]
    fn list_apps_filters_and_sorts() {
        let temp = tempfile::tempdir().unwrap();
        let paths = GantryPaths::with_root(temp.path());
        std::fs::create_dir_all(paths.app_root("beta")).unwrap();
        std::fs::create_dir_all(paths.app_root("alpha")).unwrap();
        std::fs::create_dir_all(paths.apps().join(".hidden")).unwrap();
        std::fs::write(paths.apps().join("stray-file"), "x").unwrap();

        assert_eq!(paths.list_apps().unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn list_apps_without_apps_dir() {
        let temp = tempfile::tempdir().unwrap();
        let paths = GantryPaths::with_root(temp.path().join("missing"));
        assert!(paths.list_apps().unwrap().is_empty());
    }
}
