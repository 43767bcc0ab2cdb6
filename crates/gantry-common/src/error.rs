//! Common error types for the Gantry network plugin.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`GantryError`].
pub type GantryResult<T> = Result<T, GantryError>;

/// Errors raised by the network plugin.
#[derive(Error, Diagnostic, Debug)]
pub enum GantryError {
    /// Unrecognized network property.
    #[error("Invalid network property specified: {name}")]
    #[diagnostic(
        code(gantry::network::invalid_property),
        help(
            "Recognized properties: attach-post-create, attach-post-deploy, bind-all-interfaces, initial-network, tld"
        )
    )]
    InvalidProperty {
        /// The property name that was requested.
        name: String,
    },

    /// Named network absent at attach time.
    #[error("Network {name} does not exist")]
    #[diagnostic(
        code(gantry::network::not_found),
        help("Create the network with your container runtime before attaching containers to it")
    )]
    NetworkNotFound {
        /// The missing network name.
        name: String,
    },

    /// Container runtime unreachable or erroring.
    #[error("Container runtime error: {message}")]
    #[diagnostic(code(gantry::runtime))]
    Runtime {
        /// The underlying failure.
        message: String,
    },

    /// Destination app network config could not be cleared before clone/rename.
    #[error("Unable to clear network config for app {app}")]
    #[diagnostic(code(gantry::network::clear_failed))]
    ConfigClearFailed {
        /// The app whose config could not be cleared.
        app: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(gantry::io))]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    #[diagnostic(code(gantry::serialization))]
    Serialization(String),
}

impl From<serde_json::Error> for GantryError {
    fn from(err: serde_json::Error) -> Self {
        GantryError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GantryError::NetworkNotFound {
            name: "net-a".to_string(),
        };
        assert_eq!(err.to_string(), "Network net-a does not exist");

        let err = GantryError::InvalidProperty {
            name: "bogus".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid network property specified: bogus");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GantryError = io_err.into();
        assert!(matches!(err, GantryError::Io(_)));
    }
}
