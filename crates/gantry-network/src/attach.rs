//! Network attachment at container create and deploy time.
//!
//! Both attachment points resolve their network list from the property
//! store, confirm each network exists before touching the runtime, and
//! stop at the first failure. Attachment never creates networks.

use std::fmt;

use gantry_common::{GantryError, GantryResult, PropertyStore};

use crate::config::{ConfigResolver, NetworkProperty};
use crate::runtime::{ContainerRuntime, LABEL_PROCESS_TYPE};

/// Lifecycle moment an attachment happens at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachPhase {
    /// Right after a single container is created.
    Create,
    /// After a deploy, across all running containers.
    Deploy,
}

impl fmt::Display for AttachPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Deploy => write!(f, "deploy"),
        }
    }
}

/// One attach attempt; recorded for diagnostics, never persisted.
#[derive(Debug)]
pub struct AttachmentRequest<'a> {
    /// Target container.
    pub container_id: &'a str,
    /// Network to join.
    pub network: &'a str,
    /// Owning app.
    pub app: &'a str,
    /// Lifecycle moment of the request.
    pub phase: AttachPhase,
    /// Process type of the container.
    pub process_type: &'a str,
}

/// Attaches app containers to their configured networks.
pub struct Attacher<'a> {
    store: &'a dyn PropertyStore,
    runtime: &'a dyn ContainerRuntime,
}

impl<'a> Attacher<'a> {
    /// Create an attacher over the given collaborators.
    #[must_use]
    pub const fn new(store: &'a dyn PropertyStore, runtime: &'a dyn ContainerRuntime) -> Self {
        Self { store, runtime }
    }

    /// Create-time attachment for one just-created container.
    ///
    /// Only the first network of the configured `attach-post-create` list
    /// is joined; the rest of the list is ignored. An empty list is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::NetworkNotFound`] when the network is absent
    /// (nothing is attached in that case), or any runtime error as-is.
    pub async fn attach_post_create(
        &self,
        app: &str,
        container_id: &str,
        process_type: &str,
    ) -> GantryResult<()> {
        let networks =
            ConfigResolver::new(self.store).resolve(NetworkProperty::AttachPostCreate, app)?;
        if networks.is_empty() {
            return Ok(());
        }

        // Only the first listed network is joined at create time.
        let Some(network) = networks.split(',').next() else {
            return Ok(());
        };

        if !self.runtime.network_exists(network).await? {
            return Err(GantryError::NetworkNotFound {
                name: network.to_string(),
            });
        }

        self.attach(&AttachmentRequest {
            container_id,
            network,
            app,
            phase: AttachPhase::Create,
            process_type,
        })
        .await
    }

    /// Deploy-time attachment across all running containers of an app.
    ///
    /// Every network in the `attach-post-deploy` list is processed in
    /// order; within a network, every running container is attached in
    /// turn. The first failure aborts the remaining work, and nothing
    /// already attached is rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`GantryError::NetworkNotFound`] for an absent network, or
    /// any runtime error as-is.
    pub async fn attach_post_deploy(&self, app: &str) -> GantryResult<()> {
        let networks =
            ConfigResolver::new(self.store).resolve(NetworkProperty::AttachPostDeploy, app)?;
        if networks.is_empty() {
            return Ok(());
        }

        for network in networks.split(',') {
            tracing::info!(app, network, "Associating app with network");
            let container_ids = self.runtime.running_containers(app, None).await?;

            if !self.runtime.network_exists(network).await? {
                return Err(GantryError::NetworkNotFound {
                    name: network.to_string(),
                });
            }

            for container_id in &container_ids {
                let process_type = self
                    .runtime
                    .container_label(container_id, LABEL_PROCESS_TYPE)
                    .await?;
                self.attach(&AttachmentRequest {
                    container_id,
                    network,
                    app,
                    phase: AttachPhase::Deploy,
                    process_type: &process_type,
                })
                .await?;
            }
        }

        Ok(())
    }

    async fn attach(&self, request: &AttachmentRequest<'_>) -> GantryResult<()> {
        tracing::debug!(
            container = request.container_id,
            network = request.network,
            app = request.app,
            phase = %request.phase,
            process_type = request.process_type,
            "Attaching container to network"
        );
        self.runtime
            .connect_network(request.container_id, request.network)
            .await
    }
}
