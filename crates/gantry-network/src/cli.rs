//! gantry-network trigger CLI.
//!
//! The platform invokes the plugin binary once per trigger with plain
//! string arguments; results go to stdout as single-line plain text.

use std::io::Read;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

use gantry_common::{FilePropertyStore, GantryPaths};

use crate::dispatch::CommandDispatch;
use crate::runtime::DockerCli;
use crate::triggers::Triggers;

/// gantry-network - per-app container network configuration
#[derive(Parser)]
#[command(name = "gantry-network")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The trigger to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Trigger entry points.
#[derive(Subcommand)]
pub enum Commands {
    /// Seed bind-all-interfaces for existing apps
    Install,

    /// Copy network configuration to a cloned app
    PostAppCloneSetup {
        /// Source app
        old_app: String,
        /// Destination app
        new_app: String,
    },

    /// Move network configuration to a renamed app
    PostAppRenameSetup {
        /// Source app
        old_app: String,
        /// Destination app
        new_app: String,
    },

    /// Attach a just-created app container to its configured network
    PostContainerCreate {
        /// Container type (only "app" containers are handled)
        container_type: String,
        /// Container ID
        container_id: String,
        /// App name
        app: String,
        /// Build phase the container was created in
        phase: String,
        /// Process type of the container
        process_type: String,
    },

    /// Seed the bind-all-interfaces default for a new app
    PostCreate {
        /// App name
        app: String,
    },

    /// Drop all network properties for a deleted app
    PostDelete {
        /// App name
        app: String,
    },

    /// Attach all running containers to the configured deploy networks
    CorePostDeploy {
        /// App name
        app: String,
    },

    /// Report whether the app has web listener facts
    NetworkConfigExists {
        /// App name
        app: String,
    },

    /// Print the app's listeners for a process type
    NetworkGetListeners {
        /// App name
        app: String,
        /// Process type (defaults to web, deprecated)
        process_type: Option<String>,
    },

    /// Print the effective value of a network property
    NetworkGetProperty {
        /// App name
        app: String,
        /// Property name
        property: String,
    },

    /// Print the static web listener for the app
    NetworkGetStaticListeners {
        /// App name
        app: String,
        /// Process type (only web is supported)
        process_type: Option<String>,
    },

    /// Print the current IP address of an app container
    NetworkGetIpaddr {
        /// App name
        app: String,
        /// Process type
        process_type: String,
        /// Container ID
        container_id: String,
    },

    /// Persist the IP fact for one container
    NetworkWriteIpaddr {
        /// App name
        app: String,
        /// Process type
        process_type: String,
        /// Container index
        index: u32,
        /// IP address
        ip: String,
    },

    /// Persist the port fact for one container
    NetworkWritePort {
        /// App name
        app: String,
        /// Process type
        process_type: String,
        /// Container index
        index: u32,
        /// Port
        port: String,
    },

    /// Emit container runtime arguments for a starting container
    DockerArgsProcess {
        /// Build or deploy stage
        stage: String,
        /// App name
        app: String,
        /// Image source type
        image_source_type: String,
    },
}

impl Cli {
    /// Execute the trigger.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the trigger; the process exits
    /// non-zero and the report is printed to stderr.
    pub async fn execute(self) -> Result<()> {
        let paths = GantryPaths::new();
        let store = FilePropertyStore::new(paths.clone());
        let runtime = DockerCli::new();
        let dispatch = CommandDispatch::from_env();
        let triggers = Triggers::new(&store, &runtime, &dispatch, paths);

        match self.command {
            Commands::Install => triggers.install().await?,

            Commands::PostAppCloneSetup { old_app, new_app } => {
                triggers.post_app_clone_setup(&old_app, &new_app)?;
            }

            Commands::PostAppRenameSetup { old_app, new_app } => {
                triggers.post_app_rename_setup(&old_app, &new_app)?;
            }

            Commands::PostContainerCreate {
                container_type,
                container_id,
                app,
                phase: _,
                process_type,
            } => {
                triggers
                    .post_container_create(&container_type, &container_id, &app, &process_type)
                    .await?;
            }

            Commands::PostCreate { app } => triggers.post_create(&app),

            Commands::PostDelete { app } => triggers.post_delete(&app)?,

            Commands::CorePostDeploy { app } => triggers.core_post_deploy(&app).await?,

            Commands::NetworkConfigExists { app } => {
                println!("{}", triggers.network_config_exists(&app));
            }

            Commands::NetworkGetListeners { app, process_type } => {
                let listeners = triggers.listeners(&app, process_type.as_deref());
                println!("{}", listeners.join(" "));
            }

            Commands::NetworkGetProperty { app, property } => {
                println!("{}", triggers.get_property(&app, &property)?);
            }

            Commands::NetworkGetStaticListeners {
                app,
                process_type: _,
            } => {
                println!("{}", triggers.static_listeners(&app)?);
            }

            Commands::NetworkGetIpaddr {
                app: _,
                process_type: _,
                container_id,
            } => {
                println!("{}", triggers.container_ip(&container_id).await?);
            }

            Commands::NetworkWriteIpaddr {
                app,
                process_type,
                index,
                ip,
            } => triggers.write_ipaddr(&app, &process_type, index, &ip)?,

            Commands::NetworkWritePort {
                app,
                process_type,
                index,
                port,
            } => triggers.write_port(&app, &process_type, index, &port)?,

            Commands::DockerArgsProcess {
                stage,
                app,
                image_source_type,
            } => {
                let mut inherited = String::new();
                std::io::stdin().read_to_string(&mut inherited)?;
                print!(
                    "{}",
                    triggers.docker_args_process(&stage, &app, &image_source_type, &inherited)?
                );
            }
        }

        Ok(())
    }
}
