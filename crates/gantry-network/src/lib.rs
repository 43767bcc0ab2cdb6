//! # gantry-network
//!
//! Per-app container network configuration for the Gantry platform.
//!
//! The plugin answers two questions whenever an app's containers are
//! created or redeployed: which networks a container should join, and what
//! the effective value of a network setting is once global defaults,
//! app-level overrides and built-in fallbacks are layered. It also derives
//! the `ip:port` listeners an app's processes are reachable on from facts
//! persisted at container start.

#![warn(missing_docs)]

pub mod attach;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod listeners;
pub mod runtime;
pub mod triggers;

pub use attach::{AttachPhase, Attacher};
pub use config::{ConfigResolver, NetworkProperty};
pub use listeners::ListenerResolver;
pub use triggers::Triggers;
