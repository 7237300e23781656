//! Reading index files back, with checksum verification.

use std::fs;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};

use ntask_core::ChecksumTrailer;

use crate::index::{IndexRecord, RECORD_LEN};
use crate::SpillError;

/// A verified index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexReader {
    records: Vec<IndexRecord>,
    checksum: u32,
}

impl IndexReader {
    pub fn open(path: impl AsRef<Path>, trailer: ChecksumTrailer) -> Result<Self, SpillError> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_bytes(&bytes, trailer)
    }

    pub fn from_bytes(bytes: &[u8], trailer: ChecksumTrailer) -> Result<Self, SpillError> {
        let width = trailer.width();
        if bytes.len() < width || (bytes.len() - width) % RECORD_LEN != 0 {
            return Err(SpillError::Corrupt(format!(
                "{} bytes is not a whole number of records plus a {width} byte trailer",
                bytes.len()
            )));
        }
        let (body, tail) = bytes.split_at(bytes.len() - width);
        let stored = match trailer {
            ChecksumTrailer::Narrow => u64::from(BigEndian::read_u32(tail)),
            ChecksumTrailer::Wide => BigEndian::read_u64(tail),
        };
        let computed = crc32fast::hash(body);
        if stored != u64::from(computed) {
            return Err(SpillError::ChecksumMismatch { stored, computed });
        }

        let records = body
            .chunks_exact(RECORD_LEN)
            .map(|chunk| IndexRecord {
                start_offset: BigEndian::read_u64(&chunk[0..8]),
                raw_length: BigEndian::read_u64(&chunk[8..16]),
                part_length: BigEndian::read_u64(&chunk[16..24]),
            })
            .collect();
        Ok(Self {
            records,
            checksum: computed,
        })
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Record of `partition` within spill `range`, for a task with
    /// `partitions` partitions per spill.
    pub fn record(&self, range: usize, partition: usize, partitions: usize) -> Option<&IndexRecord> {
        if partition >= partitions {
            return None;
        }
        self.records.get(range.checked_mul(partitions)?.checked_add(partition)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::PartitionIndex;
    use crate::segment::{IFileSegment, SpillInfo};

    fn sample() -> PartitionIndex {
        PartitionIndex::new(vec![
            SpillInfo::new(
                "spill0.out",
                vec![IFileSegment::new(100, 90), IFileSegment::new(250, 200)],
            ),
            SpillInfo::new(
                "spill1.out",
                vec![IFileSegment::new(40, 30), IFileSegment::new(90, 70)],
            ),
        ])
    }

    #[test]
    fn reads_back_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.out.index");
        let index = sample();

        for trailer in [ChecksumTrailer::Narrow, ChecksumTrailer::Wide] {
            let checksum = index.write_ifile(&path, trailer).unwrap();
            let reader = IndexReader::open(&path, trailer).unwrap();
            assert_eq!(reader.checksum(), checksum);
            assert_eq!(reader.records(), index.records().as_slice());
            assert_eq!(
                reader.record(1, 1, 2),
                Some(&IndexRecord {
                    start_offset: 230,
                    raw_length: 50,
                    part_length: 40,
                })
            );
            assert!(reader.record(0, 2, 2).is_none());
        }
    }

    #[test]
    fn corrupted_record_fails_checksum() {
        let mut bytes = Vec::new();
        sample()
            .write_to(&mut bytes, ChecksumTrailer::Wide, &mut [0u8; 96])
            .unwrap();
        bytes[5] ^= 0x01;
        let err = IndexReader::from_bytes(&bytes, ChecksumTrailer::Wide).unwrap_err();
        assert!(matches!(err, SpillError::ChecksumMismatch { .. }));
        assert_eq!(err.category(), ntask_core::ErrorCategory::Format);
    }

    #[test]
    fn wrong_trailer_width_is_rejected() {
        let mut bytes = Vec::new();
        sample()
            .write_to(&mut bytes, ChecksumTrailer::Narrow, &mut [0u8; 96])
            .unwrap();
        assert!(matches!(
            IndexReader::from_bytes(&bytes, ChecksumTrailer::Wide),
            Err(SpillError::Corrupt(_))
        ));
        assert!(IndexReader::from_bytes(&[], ChecksumTrailer::Narrow).is_err());
    }
}
