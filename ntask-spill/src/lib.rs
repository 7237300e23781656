//! # ntask-spill
//!
//! Spill descriptors and the consolidated spill index file.
//!
//! A map task spills sorted output to several files, each holding one
//! segment per partition. `PartitionIndex` writes a single index over all of
//! them so the merge phase can locate every partition; `IndexReader` reads
//! and verifies such a file.

mod append;
mod checksum;
mod error;
pub mod index;
pub mod reader;
pub mod segment;

pub use append::AppendBuffer;
pub use checksum::ChecksumWriter;
pub use error::SpillError;
pub use index::{IndexRecord, PartitionIndex, DEFAULT_STAGING_SIZE, RECORD_LEN};
pub use reader::IndexReader;
pub use segment::{IFileSegment, SpillInfo};
