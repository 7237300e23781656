use std::path::PathBuf;

use thiserror::Error;

use ntask_config::ConfigError;
use ntask_core::{ErrorCategory, NativeError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Init native object registry failed: {0}")]
    InitFailed(#[source] Box<RegistryError>),

    #[error("Failed to load library '{name}' from {path}: {source}")]
    LibraryLoad {
        name: String,
        path: PathBuf,
        #[source]
        source: Box<RegistryError>,
    },

    #[error("No module exporting '{symbol}' found at {path}")]
    ModuleNotFound { path: PathBuf, symbol: &'static str },

    #[error("Plugin registration failed: {0}")]
    Registration(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Native(#[from] NativeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RegistryError::Config(e) => e.category(),
            RegistryError::Native(e) => e.category(),
            _ => ErrorCategory::Io,
        }
    }
}
