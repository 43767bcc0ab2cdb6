//! # gantry-common
//!
//! Shared utilities and types for the Gantry network plugin.
//!
//! This crate provides the functionality shared across the plugin crates:
//! - Common error types
//! - Standard filesystem paths under the platform data root
//! - App-scoped property storage with file and in-memory backends

#![warn(missing_docs)]

pub mod error;
pub mod paths;
pub mod property;

pub use error::{GantryError, GantryResult};
pub use paths::GantryPaths;
pub use property::{FilePropertyStore, MemoryPropertyStore, PropertyStore, Scope};
