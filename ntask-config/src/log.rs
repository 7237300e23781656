//! Log device selection.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

/// Where the native side writes its log lines.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct LogConfig {
    /// `stdout`, `stderr`, or a file path opened for writing.
    #[serde(default = "default_device")]
    #[validate(custom(function = validation::validate_log_device))]
    pub device: String,

    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_device() -> String {
    "stderr".into()
}

fn default_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            level: default_level(),
        }
    }
}
