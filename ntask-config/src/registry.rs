//! Object registry parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Plugin libraries and host identification.
#[derive(Default, Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Extra plugin libraries as a comma-separated `name=path` list.
    #[serde(default)]
    pub class_libraries: String,

    /// Version string of the host framework, only used for logging.
    #[serde(default)]
    pub host_version: Option<String>,
}
