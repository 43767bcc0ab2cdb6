//! Lifecycle trigger entry points invoked by the platform.
//!
//! Each method is one named trigger. Methods return plain values and leave
//! printing to the CLI layer, so the same entry points can be driven
//! in-process against in-memory collaborators.

use gantry_common::{GantryError, GantryPaths, GantryResult, PropertyStore, Scope};

use crate::attach::Attacher;
use crate::config::{ConfigResolver, NETWORK_NAMESPACE, NetworkProperty};
use crate::dispatch::CapabilityDispatch;
use crate::listeners::{DEFAULT_PROCESS_TYPE, ListenerResolver};
use crate::runtime::ContainerRuntime;

/// Capability probed during install to pick the bind-all-interfaces value.
const PROXY_IS_ENABLED: &str = "proxy-is-enabled";

/// Container type handled by the create-time attachment hook.
const APP_CONTAINER_TYPE: &str = "app";

/// Lifecycle trigger entry points.
pub struct Triggers<'a> {
    store: &'a dyn PropertyStore,
    runtime: &'a dyn ContainerRuntime,
    dispatch: &'a dyn CapabilityDispatch,
    paths: GantryPaths,
}

impl<'a> Triggers<'a> {
    /// Wire the trigger entry points to their collaborators.
    #[must_use]
    pub fn new(
        store: &'a dyn PropertyStore,
        runtime: &'a dyn ContainerRuntime,
        dispatch: &'a dyn CapabilityDispatch,
        paths: GantryPaths,
    ) -> Self {
        Self {
            store,
            runtime,
            dispatch,
            paths,
        }
    }

    /// Install-time setup: seed `bind-all-interfaces` for existing apps.
    ///
    /// Apps that already carry an override are left alone; for the rest
    /// the proxy capability decides the value. A failed write only logs a
    /// warning so one app cannot block the rest of the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the data root cannot be prepared.
    pub async fn install(&self) -> GantryResult<()> {
        self.paths.create_dirs()?;

        let Ok(apps) = self.paths.list_apps() else {
            return Ok(());
        };

        for app in apps {
            let key = NetworkProperty::BindAllInterfaces.key();
            if self.store.exists(NETWORK_NAMESPACE, Scope::App(&app), key) {
                continue;
            }

            let enabled = match self.dispatch.invoke(PROXY_IS_ENABLED, &[app.as_str()]).await {
                Ok(enabled) => enabled,
                Err(err) => {
                    tracing::warn!(app = %app, error = %err, "Proxy probe failed, assuming disabled");
                    false
                }
            };

            let value = if enabled { "true" } else { "false" };
            tracing::info!(app = %app, value, "Setting network property 'bind-all-interfaces'");
            if let Err(err) = self
                .store
                .set(NETWORK_NAMESPACE, Scope::App(&app), key, value)
            {
                tracing::warn!(app = %app, error = %err, "Failed to set bind-all-interfaces");
            }
        }

        Ok(())
    }

    /// Copy network configuration when an app is cloned.
    ///
    /// The destination's persisted facts and any stale overrides are
    /// cleared before anything is copied, so a previously existing
    /// destination cannot leak old values into the clone.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::ConfigClearFailed`] when the destination
    /// cannot be cleared (fatal, nothing is copied), or a persistence
    /// error from the copy itself.
    pub fn post_app_clone_setup(&self, old_app: &str, new_app: &str) -> GantryResult<()> {
        self.clear_destination(new_app)?;
        self.store
            .clone_scope(NETWORK_NAMESPACE, old_app, new_app)
    }

    /// Move network configuration when an app is renamed.
    ///
    /// Clone semantics, then the old app's overrides are destroyed.
    ///
    /// # Errors
    ///
    /// Same as [`Self::post_app_clone_setup`], plus a persistence error if
    /// the old app's overrides cannot be removed.
    pub fn post_app_rename_setup(&self, old_app: &str, new_app: &str) -> GantryResult<()> {
        self.clear_destination(new_app)?;
        self.store
            .clone_scope(NETWORK_NAMESPACE, old_app, new_app)?;
        self.store.destroy(NETWORK_NAMESPACE, Scope::App(old_app))
    }

    /// Create-time attachment for a just-created container.
    ///
    /// Containers other than app containers are ignored.
    ///
    /// # Errors
    ///
    /// Propagates attachment errors per [`Attacher::attach_post_create`].
    pub async fn post_container_create(
        &self,
        container_type: &str,
        container_id: &str,
        app: &str,
        process_type: &str,
    ) -> GantryResult<()> {
        if container_type != APP_CONTAINER_TYPE {
            return Ok(());
        }

        Attacher::new(self.store, self.runtime)
            .attach_post_create(app, container_id, process_type)
            .await
    }

    /// Seed the bind-all-interfaces default for a new app.
    ///
    /// A failed write is logged, not fatal.
    pub fn post_create(&self, app: &str) {
        if let Err(err) = self.store.set(
            NETWORK_NAMESPACE,
            Scope::App(app),
            NetworkProperty::BindAllInterfaces.key(),
            "false",
        ) {
            tracing::warn!(app, error = %err, "Failed to set bind-all-interfaces default");
        }
    }

    /// Drop every network property when an app is deleted.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the overrides cannot be removed.
    pub fn post_delete(&self, app: &str) -> GantryResult<()> {
        self.store.destroy(NETWORK_NAMESPACE, Scope::App(app))
    }

    /// Deploy-time attachment across the app's running containers.
    ///
    /// # Errors
    ///
    /// Propagates attachment errors per [`Attacher::attach_post_deploy`].
    pub async fn core_post_deploy(&self, app: &str) -> GantryResult<()> {
        Attacher::new(self.store, self.runtime)
            .attach_post_deploy(app)
            .await
    }

    /// Whether the app has reported web listener facts.
    #[must_use]
    pub fn network_config_exists(&self, app: &str) -> bool {
        self.listener_resolver().has_network_config(app)
    }

    /// Listeners for a process type, in container index order.
    ///
    /// A missing process type defaults to `web` with a deprecation
    /// warning.
    #[must_use]
    pub fn listeners(&self, app: &str, process_type: Option<&str>) -> Vec<String> {
        let process_type = process_type.unwrap_or_else(|| {
            tracing::warn!(
                "Deprecated: please specify a process type for network-get-listeners"
            );
            DEFAULT_PROCESS_TYPE
        });
        self.listener_resolver().listeners(app, process_type)
    }

    /// The fixed web listener for the app, empty when unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the property store cannot be read.
    pub fn static_listeners(&self, app: &str) -> GantryResult<String> {
        self.listener_resolver()
            .static_web_listener(self.store, app)
    }

    /// Effective value of a property given by name.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::InvalidProperty`] for unrecognized names.
    pub fn get_property(&self, app: &str, property: &str) -> GantryResult<String> {
        ConfigResolver::new(self.store).resolve_named(property, app)
    }

    /// Current IP address of an app container.
    ///
    /// # Errors
    ///
    /// Propagates runtime errors as-is.
    pub async fn container_ip(&self, container_id: &str) -> GantryResult<String> {
        self.runtime.container_ip(container_id).await
    }

    /// Persist a container's IP fact.
    ///
    /// # Errors
    ///
    /// Returns an error if the fact cannot be written.
    pub fn write_ipaddr(
        &self,
        app: &str,
        process_type: &str,
        index: u32,
        ip: &str,
    ) -> GantryResult<()> {
        self.listener_resolver().write_ip(app, process_type, index, ip)
    }

    /// Persist a container's port fact.
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
        self.listener_resolver()
            .write_port(app, process_type, index, port)
    }

    /// Container runtime arguments for a starting container.
    ///
    /// Build-phase dockerfile invocations pass through untouched;
    /// everything else gets the initial network injected ahead of the
    /// inherited arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the property store cannot be read.
    pub fn docker_args_process(
        &self,
        stage: &str,
        app: &str,
        image_source_type: &str,
        inherited: &str,
    ) -> GantryResult<String> {
        if stage == "build" && image_source_type == "dockerfile" {
            return Ok(inherited.to_string());
        }

        let initial =
            ConfigResolver::new(self.store).resolve(NetworkProperty::InitialNetwork, app)?;
        if initial.is_empty() {
            Ok(inherited.to_string())
        } else {
            Ok(format!(" --network={initial} {inherited}"))
        }
    }

    fn clear_destination(&self, app: &str) -> GantryResult<()> {
        self.listener_resolver().clear_network_config(app)?;
        self.store
            .destroy(NETWORK_NAMESPACE, Scope::App(app))
            .map_err(|_| GantryError::ConfigClearFailed {
                app: app.to_string(),
            })
    }

    fn listener_resolver(&self) -> ListenerResolver {
        ListenerResolver::new(self.paths.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::fake::FakeRuntime;
    use async_trait::async_trait;
    use gantry_common::MemoryPropertyStore;

    struct FakeDispatch {
        enabled_apps: Vec<String>,
    }

    impl FakeDispatch {
        fn new(enabled_apps: &[&str]) -> Self {
            Self {
                enabled_apps: enabled_apps.iter().map(ToString::to_string).collect(),
            }
        }
    }

    #[async_trait]
    impl CapabilityDispatch for FakeDispatch {
        async fn invoke(&self, capability: &str, args: &[&str]) -> GantryResult<bool> {
            assert_eq!(capability, PROXY_IS_ENABLED);
            let app = args.first().copied().unwrap_or_default();
            Ok(self.enabled_apps.iter().any(|a| a.as_str() == app))
        }
    }

    struct Fixture {
        temp: tempfile::TempDir,
        store: MemoryPropertyStore,
        runtime: FakeRuntime,
        dispatch: FakeDispatch,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                temp: tempfile::tempdir().unwrap(),
                store: MemoryPropertyStore::new(),
                runtime: FakeRuntime::new(),
                dispatch: FakeDispatch::new(&[]),
            }
        }

        fn paths(&self) -> GantryPaths {
            GantryPaths::with_root(self.temp.path())
        }

        fn triggers(&self) -> Triggers<'_> {
            Triggers::new(&self.store, &self.runtime, &self.dispatch, self.paths())
        }

        fn set(&self, app: &str, key: &str, value: &str) {
            self.store
                .set(NETWORK_NAMESPACE, Scope::App(app), key, value)
                .unwrap();
        }

        fn get(&self, app: &str, key: &str) -> Option<String> {
            self.store
                .get(NETWORK_NAMESPACE, Scope::App(app), key)
                .unwrap()
        }
    }

    #[test]
    fn clone_copies_overrides_and_clears_stale_state() {
        let fixture = Fixture::new();
        fixture.set("src", "attach-post-deploy", "net-a");
        fixture.set("src", "tld", "example.com");
        // The destination existed before and left both kinds of state.
        fixture.set("dst", "initial-network", "stale-net");
        let facts = ListenerResolver::new(fixture.paths());
        facts.write_ip("dst", "web", 0, "10.0.0.9").unwrap();
        facts.write_port("dst", "web", 0, "9999").unwrap();

        fixture.triggers().post_app_clone_setup("src", "dst").unwrap();

        assert_eq!(fixture.get("dst", "attach-post-deploy").as_deref(), Some("net-a"));
        assert_eq!(fixture.get("dst", "tld").as_deref(), Some("example.com"));
        assert_eq!(fixture.get("dst", "initial-network"), None);
        assert!(facts.listeners("dst", "web").is_empty());
        // Source untouched.
        assert_eq!(fixture.get("src", "tld").as_deref(), Some("example.com"));
    }

    #[test]
    fn rename_also_destroys_the_source() {
        let fixture = Fixture::new();
        fixture.set("src", "attach-post-deploy", "net-a");
        fixture.set("src", "bind-all-interfaces", "true");

        fixture.triggers().post_app_rename_setup("src", "dst").unwrap();

        assert_eq!(fixture.get("dst", "attach-post-deploy").as_deref(), Some("net-a"));
        assert_eq!(fixture.get("dst", "bind-all-interfaces").as_deref(), Some("true"));
        assert_eq!(fixture.get("src", "attach-post-deploy"), None);
        assert_eq!(fixture.get("src", "bind-all-interfaces"), None);
    }

    #[test]
    fn post_create_seeds_the_default() {
        let fixture = Fixture::new();
        fixture.triggers().post_create("myapp");
        assert_eq!(
            fixture.get("myapp", "bind-all-interfaces").as_deref(),
            Some("false")
        );
    }

    #[test]
    fn post_delete_destroys_overrides() {
        let fixture = Fixture::new();
        fixture.set("myapp", "tld", "example.com");
        fixture.set("myapp", "initial-network", "net-a");

        fixture.triggers().post_delete("myapp").unwrap();
        assert_eq!(fixture.get("myapp", "tld"), None);
        assert_eq!(fixture.get("myapp", "initial-network"), None);
    }

    #[tokio::test]
    async fn install_probes_apps_without_an_override() {
        let mut fixture = Fixture::new();
        fixture.dispatch = FakeDispatch::new(&["proxied"]);
        let paths = fixture.paths();
        std::fs::create_dir_all(paths.app_root("proxied")).unwrap();
        std::fs::create_dir_all(paths.app_root("plain")).unwrap();
        std::fs::create_dir_all(paths.app_root("preset")).unwrap();
        fixture.set("preset", "bind-all-interfaces", "custom");

        fixture.triggers().install().await.unwrap();

        assert_eq!(fixture.get("proxied", "bind-all-interfaces").as_deref(), Some("true"));
        assert_eq!(fixture.get("plain", "bind-all-interfaces").as_deref(), Some("false"));
        // Existing overrides are never reprobed.
        assert_eq!(fixture.get("preset", "bind-all-interfaces").as_deref(), Some("custom"));
    }

    #[tokio::test]
    async fn non_app_containers_are_ignored_at_create() {
        let mut fixture = Fixture::new();
        fixture.set("myapp", "attach-post-create", "net-a");
        fixture.runtime = FakeRuntime::new().with_network("net-a");

        fixture
            .triggers()
            .post_container_create("build", "c1", "myapp", "web")
            .await
            .unwrap();
        assert!(fixture.runtime.attachments().is_empty());

        fixture
            .triggers()
            .post_container_create("app", "c1", "myapp", "web")
            .await
            .unwrap();
        assert_eq!(
            fixture.runtime.attachments(),
            vec![("c1".to_string(), "net-a".to_string())]
        );
    }

    #[test]
    fn listeners_default_to_web() {
        let fixture = Fixture::new();
        let facts = ListenerResolver::new(fixture.paths());
        facts.write_ip("foo", "web", 0, "10.0.0.1").unwrap();
        facts.write_port("foo", "web", 0, "5000").unwrap();

        assert_eq!(
            fixture.triggers().listeners("foo", None),
            vec!["10.0.0.1:5000"]
        );
        assert_eq!(
            fixture.triggers().listeners("foo", Some("worker")),
            Vec::<String>::new()
        );
    }

    #[test]
    fn docker_args_passthrough_for_dockerfile_builds() {
        let fixture = Fixture::new();
        fixture.set("myapp", "initial-network", "custom-net");

        let args = fixture
            .triggers()
            .docker_args_process("build", "myapp", "dockerfile", "--label x")
            .unwrap();
        assert_eq!(args, "--label x");
    }

    #[test]
    fn docker_args_inject_the_initial_network() {
        let fixture = Fixture::new();
        fixture.set("myapp", "initial-network", "custom-net");

        let args = fixture
            .triggers()
            .docker_args_process("deploy", "myapp", "pack", "--label x")
            .unwrap();
        assert_eq!(args, " --network=custom-net --label x");
    }

    #[test]
    fn docker_args_passthrough_without_initial_network() {
        let fixture = Fixture::new();
        let args = fixture
            .triggers()
            .docker_args_process("deploy", "myapp", "pack", "--label x")
            .unwrap();
        assert_eq!(args, "--label x");
    }

    #[test]
    fn unknown_property_query_fails() {
        let fixture = Fixture::new();
        let err = fixture
            .triggers()
            .get_property("myapp", "bogus")
            .unwrap_err();
        assert!(matches!(err, GantryError::InvalidProperty { .. }));
    }
}
