//! Key/value pairs forwarded by the host process.
//!
//! The host passes its job configuration as flat string pairs. Keys this
//! crate understands are folded into the typed sections; everything else is
//! kept verbatim in `NativeConfig::extra` for plugins to read.

use std::str::FromStr;

use ntask_core::ChecksumTrailer;

use crate::{ConfigError, NativeConfig};

pub const NATIVE_LOG_DEVICE: &str = "native.log.device";
pub const NATIVE_CLASS_LIBRARY: &str = "native.class.library";
pub const NATIVE_HADOOP_VERSION: &str = "native.hadoop.version";
pub const NATIVE_MIN_BLOCK_SIZE: &str = "native.min.block.size";
pub const NATIVE_SPILL_CHECKSUM_NARROW: &str = "native.spill.checksum.narrow";
/// Sort buffer size in MiB; sizes the memory arena.
pub const IO_SORT_MB: &str = "io.sort.mb";

impl NativeConfig {
    /// Folds host pairs into this configuration, then re-validates it.
    pub fn apply_host_pairs<I, K, V>(&mut self, pairs: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            let (key, value) = (key.into(), value.into());
            match key.as_str() {
                NATIVE_LOG_DEVICE => self.log.device = value,
                NATIVE_CLASS_LIBRARY => self.registry.class_libraries = value,
                NATIVE_HADOOP_VERSION => self.registry.host_version = Some(value),
                NATIVE_MIN_BLOCK_SIZE => self.memory.min_block_size = parse(&key, &value)?,
                NATIVE_SPILL_CHECKSUM_NARROW => {
                    let narrow: bool = parse(&key, &value)?;
                    self.spill.checksum_trailer = if narrow {
                        ChecksumTrailer::Narrow
                    } else {
                        ChecksumTrailer::Wide
                    };
                }
                IO_SORT_MB => {
                    let mb: u64 = parse(&key, &value)?;
                    self.memory.capacity = mb.saturating_mul(1024 * 1024);
                }
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
        self.check()
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}
