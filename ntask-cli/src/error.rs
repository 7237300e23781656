use thiserror::Error;

use ntask_config::ConfigError;
use ntask_core::NativeError;
use ntask_registry::RegistryError;
use ntask_spill::SpillError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Spill(#[from] SpillError),

    #[error(transparent)]
    Native(#[from] NativeError),

    #[error("Invalid spill layout: {0}")]
    Layout(#[from] serde_yaml::Error),

    #[error("Invalid --set value '{0}': expected key=value")]
    HostPair(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
