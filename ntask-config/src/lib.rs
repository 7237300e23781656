//! # ntask Configuration System
//!
//! Layered configuration for the native task runtime.
//!
//! ## Features
//! - **Unified Configuration**: one `NativeConfig` shared by the registry,
//!   the memory arena and the spill writer
//! - **Validation**: runtime validation of sizes and devices
//! - **Host Pairs**: flat `native.*` key/value pairs from the host process

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
pub mod host;
mod log;
mod memory;
mod registry;
mod spill;
mod validation;

pub use error::ConfigError;
pub use log::LogConfig;
pub use memory::MemoryConfig;
pub use registry::RegistryConfig;
pub use spill::SpillConfig;

const DEFAULT_CONFIG_FILE: &str = "config/ntask.yaml";
const ENV_PREFIX: &str = "NTASK_";

/// Top-level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq)]
pub struct NativeConfig {
    /// Log device selection.
    #[serde(default)]
    #[validate(nested)]
    pub log: LogConfig,

    /// Plugin libraries and host identification.
    #[serde(default)]
    #[validate(nested)]
    pub registry: RegistryConfig,

    /// Memory arena sizing.
    #[serde(default)]
    #[validate(nested)]
    pub memory: MemoryConfig,

    /// Spill index output.
    #[serde(default)]
    #[validate(nested)]
    pub spill: SpillConfig,

    /// Host pairs with no typed home, available to plugins.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl NativeConfig {
    /// Load configuration from the default file and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/ntask.yaml`, if present
    /// 3. `NTASK_*` environment variables (`__` separates sections)
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(NativeConfig::default()));
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            figment = figment.merge(Yaml::file(DEFAULT_CONFIG_FILE));
        }
        Self::finish(figment)
    }

    /// Load configuration from a specific YAML file plus environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }
        let figment =
            Figment::from(Serialized::defaults(NativeConfig::default())).merge(Yaml::file(path));
        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.check()?;
        Ok(config)
    }

    /// Runs field validation.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Ok(())
    }
}
