//! Spill index output parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

use ntask_core::ChecksumTrailer;

/// Spill index writer settings.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct SpillConfig {
    /// Width of the CRC trailer the merge phase expects.
    #[serde(default)]
    pub checksum_trailer: ChecksumTrailer,

    /// Staging buffer used while writing index records (bytes).
    #[serde(default = "default_buffer_size")]
    #[validate(range(min = 24))]
    pub buffer_size: usize,
}

fn default_buffer_size() -> usize {
    32 * 1024
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self {
            checksum_trailer: ChecksumTrailer::default(),
            buffer_size: default_buffer_size(),
        }
    }
}
