//! Fixed-size staging buffer in front of a writer.

use std::io::Write;

use byteorder::{BigEndian, ByteOrder};

use crate::index::RECORD_LEN;
use crate::SpillError;

/// Batches small big-endian writes into `staging` and hands full batches to
/// `out`. Nothing reaches `out` until the staging area fills or `flush` is
/// called.
pub struct AppendBuffer<'a, W: Write> {
    staging: &'a mut [u8],
    len: usize,
    out: W,
}

impl<'a, W: Write> AppendBuffer<'a, W> {
    pub fn new(staging: &'a mut [u8], out: W) -> Result<Self, SpillError> {
        // Smallest staging area accepted: one index record.
        if staging.len() < RECORD_LEN {
            return Err(SpillError::StagingTooSmall {
                len: staging.len(),
                required: RECORD_LEN,
            });
        }
        Ok(Self {
            staging,
            len: 0,
            out,
        })
    }

    pub fn write_u64_be(&mut self, value: u64) -> Result<(), SpillError> {
        if self.staging.len() - self.len < 8 {
            self.flush()?;
        }
        BigEndian::write_u64(&mut self.staging[self.len..self.len + 8], value);
        self.len += 8;
        Ok(())
    }

    /// Writes out whatever is staged.
    pub fn flush(&mut self) -> Result<(), SpillError> {
        if self.len > 0 {
            self.out.write_all(&self.staging[..self.len])?;
            self.len = 0;
        }
        Ok(())
    }

    pub fn staged(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spills_when_staging_is_full() {
        let mut staging = [0u8; 28];
        let mut out = Vec::new();
        {
            let mut buffer = AppendBuffer::new(&mut staging, &mut out).unwrap();
            for value in 1..=3u64 {
                buffer.write_u64_be(value).unwrap();
            }
            assert_eq!(buffer.staged(), 24);
            buffer.write_u64_be(4).unwrap();
            assert_eq!(buffer.staged(), 8);
            buffer.flush().unwrap();
        }
        let expected: Vec<u8> = (1..=4u64).flat_map(u64::to_be_bytes).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn rejects_tiny_staging() {
        let mut staging = [0u8; 16];
        let err = AppendBuffer::new(&mut staging, Vec::new()).err().unwrap();
        assert!(matches!(err, SpillError::StagingTooSmall { len: 16, .. }));
    }
}
