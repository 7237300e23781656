//! Custom validation functions for configuration.

use validator::ValidationError;

/// A log device is `stdout`, `stderr` or a non-empty file path.
pub fn validate_log_device(device: &str) -> Result<(), ValidationError> {
    if device.trim().is_empty() {
        Err(ValidationError::new("empty_log_device"))
    } else {
        Ok(())
    }
}
