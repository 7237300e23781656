//! ## ntask-spill::index
//! **Consolidated index over every spill of a task**
//!
//! File layout, all integers big-endian:
//!
//! ```text
//! N x { u64 start_offset, u64 raw_length, u64 part_length }
//! crc32 of the records, as u32 (narrow) or widened to u64 (wide)
//! ```
//!
//! Offsets are rebased as if all spill files were concatenated in order:
//! each range starts where the previous range's last real offset ended.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use byteorder::{BigEndian, WriteBytesExt};
use tracing::debug;

use ntask_core::ChecksumTrailer;

use crate::append::AppendBuffer;
use crate::checksum::ChecksumWriter;
use crate::segment::SpillInfo;
use crate::SpillError;

/// Staging size used when the caller does not supply one.
pub const DEFAULT_STAGING_SIZE: usize = 32 * 1024;

/// Encoded size of one `IndexRecord`.
pub const RECORD_LEN: usize = 24;

/// One partition's entry in the index file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    pub start_offset: u64,
    pub raw_length: u64,
    pub part_length: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionIndex {
    ranges: Vec<SpillInfo>,
}

impl PartitionIndex {
    pub fn new(ranges: Vec<SpillInfo>) -> Self {
        Self { ranges }
    }

    pub fn push(&mut self, range: SpillInfo) {
        self.ranges.push(range);
    }

    pub fn ranges(&self) -> &[SpillInfo] {
        &self.ranges
    }

    /// Records in file order. Offsets use wrapping arithmetic, so segments
    /// that go backwards produce wrapped values rather than an error.
    pub fn records(&self) -> Vec<IndexRecord> {
        let mut records = Vec::with_capacity(self.ranges.iter().map(|r| r.segments.len()).sum());
        let mut base = 0u64;
        for range in &self.ranges {
            let mut previous: Option<crate::segment::IFileSegment> = None;
            for segment in &range.segments {
                records.push(match previous {
                    None => IndexRecord {
                        start_offset: base,
                        raw_length: segment.uncompressed_end_offset,
                        part_length: segment.real_end_offset,
                    },
                    Some(prev) => IndexRecord {
                        start_offset: base.wrapping_add(prev.real_end_offset),
                        raw_length: segment
                            .uncompressed_end_offset
                            .wrapping_sub(prev.uncompressed_end_offset),
                        part_length: segment.real_end_offset.wrapping_sub(prev.real_end_offset),
                    },
                });
                previous = Some(*segment);
            }
            base = base.wrapping_add(range.real_length());
        }
        records
    }

    /// Encodes the index into `out`, staging records through `staging`.
    ///
    /// Returns the CRC written in the trailer. On error, whatever `out`
    /// already accepted stays written.
    pub fn write_to<W: Write>(
        &self,
        out: &mut W,
        trailer: ChecksumTrailer,
        staging: &mut [u8],
    ) -> Result<u32, SpillError> {
        let checksum = {
            let mut dest = ChecksumWriter::new(&mut *out);
            let mut buffer = AppendBuffer::new(staging, &mut dest)?;
            for record in self.records() {
                buffer.write_u64_be(record.start_offset)?;
                buffer.write_u64_be(record.raw_length)?;
                buffer.write_u64_be(record.part_length)?;
            }
            buffer.flush()?;
            drop(buffer);
            dest.checksum()
        };
        match trailer {
            ChecksumTrailer::Narrow => out.write_u32::<BigEndian>(checksum)?,
            ChecksumTrailer::Wide => out.write_u64::<BigEndian>(u64::from(checksum))?,
        }
        out.flush()?;
        Ok(checksum)
    }

    /// Writes the index file at `path`, replacing any existing file.
    pub fn write_ifile(&self, path: impl AsRef<Path>, trailer: ChecksumTrailer) -> Result<u32, SpillError> {
        let mut staging = vec![0u8; DEFAULT_STAGING_SIZE];
        self.write_ifile_staged(path, trailer, &mut staging)
    }

    /// Like `write_ifile`, staging through a caller-owned buffer such as an
    /// arena block.
    ///
    /// A failed write leaves the partial file in place.
    pub fn write_ifile_staged(
        &self,
        path: impl AsRef<Path>,
        trailer: ChecksumTrailer,
        staging: &mut [u8],
    ) -> Result<u32, SpillError> {
        let path = path.as_ref();
        let mut file = File::create(path)?;
        let checksum = self.write_to(&mut file, trailer, staging)?;
        file.sync_all()?;
        debug!(
            path = %path.display(),
            ranges = self.ranges.len(),
            checksum = format_args!("{checksum:#010x}"),
            "spill index written"
        );
        Ok(checksum)
    }
}
