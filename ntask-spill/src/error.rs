use thiserror::Error;

use ntask_core::ErrorCategory;

#[derive(Debug, Error)]
pub enum SpillError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spill index checksum mismatch: stored {stored:#x}, computed {computed:#x}")]
    ChecksumMismatch { stored: u64, computed: u32 },

    #[error("Corrupt spill index: {0}")]
    Corrupt(String),

    #[error("Staging buffer of {len} bytes is smaller than the {required} byte minimum")]
    StagingTooSmall { len: usize, required: usize },
}

impl SpillError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SpillError::Io(_) => ErrorCategory::Io,
            SpillError::ChecksumMismatch { .. } | SpillError::Corrupt(_) => ErrorCategory::Format,
            SpillError::StagingTooSmall { .. } => ErrorCategory::Configuration,
        }
    }
}
