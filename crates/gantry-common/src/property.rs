//! App-scoped property storage.
//!
//! The platform keeps per-app configuration as namespaced key/value
//! properties, with a separate global scope supplying defaults for apps
//! that carry no override of their own. The store is injected wherever
//! properties are read or written so callers can run against the
//! file-backed store in production and the in-memory store in tests.

use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use crate::error::GantryResult;
use crate::paths::GantryPaths;

/// Directory name backing the global scope.
pub const GLOBAL_SCOPE_DIR: &str = "--global";

/// Scope a property is stored under: one app, or the global defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Defaults applying to every app without an override of its own.
    Global,
    /// A single named app.
    App(&'a str),
}

impl<'a> Scope<'a> {
    /// Directory name backing this scope.
    #[must_use]
    pub const fn dir_name(self) -> &'a str {
        match self {
            Self::Global => GLOBAL_SCOPE_DIR,
            Self::App(name) => name,
        }
    }
}

/// Namespaced key/value property storage.
pub trait PropertyStore: Send + Sync {
    /// Whether a property is set in the given scope.
    fn exists(&self, namespace: &str, scope: Scope<'_>, key: &str) -> bool;

    /// Read a property, `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, namespace: &str, scope: Scope<'_>, key: &str) -> GantryResult<Option<String>>;

    /// Write a property, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&self, namespace: &str, scope: Scope<'_>, key: &str, value: &str) -> GantryResult<()>;

    /// Remove a property. Removing an absent property is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing value cannot be removed.
    fn delete(&self, namespace: &str, scope: Scope<'_>, key: &str) -> GantryResult<()>;

    /// Remove every property in the scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the scope cannot be removed.
    fn destroy(&self, namespace: &str, scope: Scope<'_>) -> GantryResult<()>;

    /// Copy all properties from one app to another.
    ///
    /// A source app without properties clones to nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if any property cannot be copied.
    fn clone_scope(&self, namespace: &str, src_app: &str, dst_app: &str) -> GantryResult<()>;
}

/// [`PropertyStore`] backed by one file per key under the data root.
#[derive(Debug, Clone)]
pub struct FilePropertyStore {
    paths: GantryPaths,
}

impl FilePropertyStore {
    /// Create a store over the given data root.
    #[must_use]
    pub const fn new(paths: GantryPaths) -> Self {
        Self { paths }
    }
}

impl PropertyStore for FilePropertyStore {
    fn exists(&self, namespace: &str, scope: Scope<'_>, key: &str) -> bool {
        self.paths
            .property_file(namespace, scope.dir_name(), key)
            .is_file()
    }

    fn get(&self, namespace: &str, scope: Scope<'_>, key: &str) -> GantryResult<Option<String>> {
        let path = self.paths.property_file(namespace, scope.dir_name(), key);
        match fs::read_to_string(path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, namespace: &str, scope: Scope<'_>, key: &str, value: &str) -> GantryResult<()> {
        let path = self.paths.property_file(namespace, scope.dir_name(), key);
        fs::create_dir_all(self.paths.property_scope(namespace, scope.dir_name()))?;
        fs::write(path, value)?;
        tracing::debug!(namespace, scope = scope.dir_name(), key, "Wrote property");
        Ok(())
    }

    fn delete(&self, namespace: &str, scope: Scope<'_>, key: &str) -> GantryResult<()> {
        let path = self.paths.property_file(namespace, scope.dir_name(), key);
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn destroy(&self, namespace: &str, scope: Scope<'_>) -> GantryResult<()> {
        let dir = self.paths.property_scope(namespace, scope.dir_name());
        match fs::remove_dir_all(dir) {
            Ok(()) => {
                tracing::debug!(namespace, scope = scope.dir_name(), "Destroyed property scope");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn clone_scope(&self, namespace: &str, src_app: &str, dst_app: &str) -> GantryResult<()> {
        let src_dir = self.paths.property_scope(namespace, src_app);
        let entries = match fs::read_dir(src_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        let dst_dir = self.paths.property_scope(namespace, dst_app);
        fs::create_dir_all(&dst_dir)?;
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::copy(entry.path(), dst_dir.join(entry.file_name()))?;
            }
        }
        Ok(())
    }
}

/// In-memory [`PropertyStore`] for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryPropertyStore {
    entries: Mutex<HashMap<(String, String, String), String>>,
}

impl MemoryPropertyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String, String), String>> {
        self.entries.lock().expect("property store lock poisoned")
    }

    fn entry_key(namespace: &str, scope: Scope<'_>, key: &str) -> (String, String, String) {
        (
            namespace.to_string(),
            scope.dir_name().to_string(),
            key.to_string(),
        )
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn exists(&self, namespace: &str, scope: Scope<'_>, key: &str) -> bool {
        self.lock()
            .contains_key(&Self::entry_key(namespace, scope, key))
    }

    fn get(&self, namespace: &str, scope: Scope<'_>, key: &str) -> GantryResult<Option<String>> {
        Ok(self
            .lock()
            .get(&Self::entry_key(namespace, scope, key))
            .cloned())
    }

    fn set(&self, namespace: &str, scope: Scope<'_>, key: &str, value: &str) -> GantryResult<()> {
        self.lock()
            .insert(Self::entry_key(namespace, scope, key), value.to_string());
        Ok(())
    }

    fn delete(&self, namespace: &str, scope: Scope<'_>, key: &str) -> GantryResult<()> {
        self.lock().remove(&Self::entry_key(namespace, scope, key));
        Ok(())
    }

    fn destroy(&self, namespace: &str, scope: Scope<'_>) -> GantryResult<()> {
        self.lock()
            .retain(|(ns, dir, _), _| !(ns == namespace && dir == scope.dir_name()));
        Ok(())
    }

    fn clone_scope(&self, namespace: &str, src_app: &str, dst_app: &str) -> GantryResult<()> {
        let mut entries = self.lock();
        let copied: Vec<(String, String)> = entries
            .iter()
            .filter(|((ns, dir, _), _)| ns == namespace && dir == src_app)
            .map(|((_, _, key), value)| (key.clone(), value.clone()))
            .collect();
        for (key, value) in copied {
            entries.insert(
                (namespace.to_string(), dst_app.to_string(), key),
                value,
            );
        }
        Ok(())
    }
}
