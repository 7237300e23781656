//! Fixed type tags shared between the registry, the spill writer and the host.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NativeError;

/// Abstract processing-stage role that can be resolved to a default class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    BatchHandler,
    Mapper,
    Reducer,
    Partitioner,
    /// Combiner role, called "folder" by the native libraries.
    Combiner,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::BatchHandler,
        ObjectKind::Mapper,
        ObjectKind::Reducer,
        ObjectKind::Partitioner,
        ObjectKind::Combiner,
    ];

    /// Name the host uses for this kind (`MapperType`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::BatchHandler => "BatchHandlerType",
            ObjectKind::Mapper => "MapperType",
            ObjectKind::Reducer => "ReducerType",
            ObjectKind::Partitioner => "PartitionerType",
            ObjectKind::Combiner => "CombinerType",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = NativeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BatchHandlerType" | "BatchHandler" => Ok(ObjectKind::BatchHandler),
            "MapperType" | "Mapper" => Ok(ObjectKind::Mapper),
            "ReducerType" | "Reducer" => Ok(ObjectKind::Reducer),
            "PartitionerType" | "Partitioner" => Ok(ObjectKind::Partitioner),
            "CombinerType" | "Combiner" | "FolderType" | "Folder" => Ok(ObjectKind::Combiner),
            other => Err(NativeError::Format(format!("unknown object kind '{other}'"))),
        }
    }
}

/// Declared type of a serialized key or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyValueType {
    Text,
    Bytes,
    Byte,
    Bool,
    Int,
    Long,
    Float,
    Double,
    Md5Hash,
    VInt,
    VLong,
    Unknown,
}

/// Width of the checksum trailer appended to spill index files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumTrailer {
    /// CRC written as a 4-byte big-endian integer.
    Narrow,
    /// CRC widened to a big-endian u64.
    #[default]
    Wide,
}

impl ChecksumTrailer {
    pub fn width(&self) -> usize {
        match self {
            ChecksumTrailer::Narrow => 4,
            ChecksumTrailer::Wide => 8,
        }
    }
}
