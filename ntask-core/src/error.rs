use thiserror::Error;

/// Failure classes the host cares about when deciding how to react.
///
/// Lookup misses are not represented here; they surface as `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    OutOfMemory,
    Io,
    Format,
    Configuration,
}

#[derive(Debug, Error)]
pub enum NativeError {
    #[error("Out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: u64, available: u64 },

    #[error("Memory block pool is not initialized")]
    NotInitialized,

    #[error("Block {block} overflow: requested {requested} bytes, {remaining} remaining")]
    BlockOverflow {
        block: usize,
        requested: usize,
        remaining: usize,
    },

    #[error("Unknown memory block handle {0}")]
    InvalidBlock(usize),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NativeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            NativeError::OutOfMemory { .. }
            | NativeError::NotInitialized
            | NativeError::BlockOverflow { .. } => ErrorCategory::OutOfMemory,
            NativeError::InvalidBlock(_) | NativeError::Format(_) => ErrorCategory::Format,
            NativeError::InvalidArgument(_) => ErrorCategory::Configuration,
            NativeError::Io(_) => ErrorCategory::Io,
        }
    }
}
