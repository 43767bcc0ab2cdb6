//! Effective network configuration resolution.
//!
//! Every recognized property resolves by layering an app-scoped override
//! over the global override over a built-in fallback. Resolution re-reads
//! the property store on each call so the result always reflects the
//! latest persisted state.

use std::fmt;
use std::str::FromStr;

use gantry_common::{GantryError, GantryResult, PropertyStore, Scope};

/// Property namespace used by the network plugin.
pub const NETWORK_NAMESPACE: &str = "network";

/// The closed set of computed network properties.
///
/// Anything outside this set is rejected at the boundary with
/// [`GantryError::InvalidProperty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkProperty {
    /// Networks to attach a container to right after creation.
    AttachPostCreate,
    /// Networks to attach all running containers to after a deploy.
    AttachPostDeploy,
    /// Whether container ports bind on all host interfaces.
    BindAllInterfaces,
    /// Network a container joins at creation instead of the runtime default.
    InitialNetwork,
    /// Top-level domain used when exposing the app.
    Tld,
}

impl NetworkProperty {
    /// Every recognized property.
    pub const ALL: [Self; 5] = [
        Self::AttachPostCreate,
        Self::AttachPostDeploy,
        Self::BindAllInterfaces,
        Self::InitialNetwork,
        Self::Tld,
    ];

    /// Property key as stored and reported.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::AttachPostCreate => "attach-post-create",
            Self::AttachPostDeploy => "attach-post-deploy",
            Self::BindAllInterfaces => "bind-all-interfaces",
            Self::InitialNetwork => "initial-network",
            Self::Tld => "tld",
        }
    }

    /// Built-in fallback when neither an app nor a global override is set.
    ///
    /// An empty attach list means nothing extra to attach; an empty initial
    /// network means the runtime default network.
    #[must_use]
    pub const fn fallback(self) -> &'static str {
        match self {
            Self::BindAllInterfaces => "false",
            Self::AttachPostCreate | Self::AttachPostDeploy | Self::InitialNetwork | Self::Tld => {
                ""
            }
        }
    }
}

impl fmt::Display for NetworkProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for NetworkProperty {
    type Err = GantryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attach-post-create" => Ok(Self::AttachPostCreate),
            "attach-post-deploy" => Ok(Self::AttachPostDeploy),
            "bind-all-interfaces" => Ok(Self::BindAllInterfaces),
            "initial-network" => Ok(Self::InitialNetwork),
            "tld" => Ok(Self::Tld),
            _ => Err(GantryError::InvalidProperty {
                name: s.to_string(),
            }),
        }
    }
}

/// Resolves effective property values for an app.
pub struct ConfigResolver<'a> {
    store: &'a dyn PropertyStore,
}

impl<'a> ConfigResolver<'a> {
    /// Create a resolver over the given property store.
    #[must_use]
    pub const fn new(store: &'a dyn PropertyStore) -> Self {
        Self { store }
    }

    /// Effective value of a property for an app.
    ///
    /// An app-scoped override wins over the global override, which wins
    /// over the built-in fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if the property store cannot be read.
    pub fn resolve(&self, property: NetworkProperty, app: &str) -> GantryResult<String> {
        let key = property.key();
        if let Some(value) = self.store.get(NETWORK_NAMESPACE, Scope::App(app), key)? {
            return Ok(value);
        }
        if let Some(value) = self.store.get(NETWORK_NAMESPACE, Scope::Global, key)? {
            return Ok(value);
        }
        Ok(property.fallback().to_string())
    }

    /// Resolve a property given by name, rejecting unrecognized names.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::InvalidProperty`] for names outside the
    /// recognized set, or an error if the property store cannot be read.
    pub fn resolve_named(&self, name: &str, app: &str) -> GantryResult<String> {
        self.resolve(name.parse()?, app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_common::MemoryPropertyStore;

    #[test]
    fn app_override_wins_over_global() {
        let store = MemoryPropertyStore::new();
        store
            .set(NETWORK_NAMESPACE, Scope::Global, "initial-network", "global-net")
            .unwrap();
        store
            .set(
                NETWORK_NAMESPACE,
                Scope::App("myapp"),
                "initial-network",
                "app-net",
            )
            .unwrap();

        let resolver = ConfigResolver::new(&store);
        assert_eq!(
            resolver
                .resolve(NetworkProperty::InitialNetwork, "myapp")
                .unwrap(),
            "app-net"
        );
        assert_eq!(
            resolver
                .resolve(NetworkProperty::InitialNetwork, "other")
                .unwrap(),
            "global-net"
        );
    }

    #[test]
    fn builtin_fallbacks() {
        let store = MemoryPropertyStore::new();
        let resolver = ConfigResolver::new(&store);

        assert_eq!(
            resolver
                .resolve(NetworkProperty::BindAllInterfaces, "myapp")
                .unwrap(),
            "false"
        );
        assert_eq!(
            resolver
                .resolve(NetworkProperty::InitialNetwork, "myapp")
                .unwrap(),
            ""
        );
        assert_eq!(
            resolver
                .resolve(NetworkProperty::AttachPostCreate, "myapp")
                .unwrap(),
            ""
        );
        assert_eq!(resolver.resolve(NetworkProperty::Tld, "myapp").unwrap(), "");
    }

    #[test]
    fn unknown_property_is_rejected() {
        let store = MemoryPropertyStore::new();
        let resolver = ConfigResolver::new(&store);
        let err = resolver
            .resolve_named("nonexistent-property", "myapp")
            .unwrap_err();
        assert!(matches!(err, GantryError::InvalidProperty { name } if name == "nonexistent-property"));
    }

    #[test]
    fn resolution_reflects_latest_state() {
        let store = MemoryPropertyStore::new();
        let resolver = ConfigResolver::new(&store);

        assert_eq!(
            resolver
                .resolve(NetworkProperty::AttachPostDeploy, "myapp")
                .unwrap(),
            ""
        );

        store
            .set(
                NETWORK_NAMESPACE,
                Scope::App("myapp"),
                "attach-post-deploy",
                "net-a,net-b",
            )
            .unwrap();
        assert_eq!(
            resolver
                .resolve(NetworkProperty::AttachPostDeploy, "myapp")
                .unwrap(),
            "net-a,net-b"
        );
    }

    #[test]
    fn property_keys_round_trip() {
        for property in NetworkProperty::ALL {
            let parsed: NetworkProperty = property.key().parse().unwrap();
            assert_eq!(parsed, property);
            assert_eq!(property.to_string(), property.key());
        }
    }
}
