//! Task status snapshots polled by the host.
//!
//! Wire layout, all integers big-endian:
//!
//! ```text
//! float32 progress
//! text    status          (vlong byte length + UTF-8)
//! uint32  counter_count
//! counter_count x { text group, text name, int64 delta }
//! ```

use std::io::Write;

use ntask_core::wire;
use ntask_core::NativeError;

/// Supplies the current task progress when a snapshot is taken.
pub trait ProgressSource: Send + Sync {
    fn progress(&self) -> f32;
}

impl<F> ProgressSource for F
where
    F: Fn() -> f32 + Send + Sync,
{
    fn progress(&self) -> f32 {
        self()
    }
}

/// Increment of one counter since the previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDelta {
    pub group: String,
    pub name: String,
    pub delta: i64,
}

/// One decoded status snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub progress: f32,
    pub status: String,
    pub counters: Vec<CounterDelta>,
}

impl StatusUpdate {
    pub fn encode<W: Write>(&self, out: &mut W) -> Result<(), NativeError> {
        wire::write_float(out, self.progress)?;
        wire::write_text(out, &self.status)?;
        let count = u32::try_from(self.counters.len()).map_err(|_| {
            NativeError::Format(format!("too many counters: {}", self.counters.len()))
        })?;
        wire::write_u32(out, count)?;
        for counter in &self.counters {
            wire::write_text(out, &counter.group)?;
            wire::write_text(out, &counter.name)?;
            wire::write_i64(out, counter.delta)?;
        }
        Ok(())
    }

    pub fn decode(mut bytes: &[u8]) -> Result<Self, NativeError> {
        let input = &mut bytes;
        let progress = wire::read_float(input)?;
        let status = wire::read_text(input)?;
        let count = wire::read_u32(input)?;
        let mut counters = Vec::new();
        for _ in 0..count {
            counters.push(CounterDelta {
                group: wire::read_text(input)?,
                name: wire::read_text(input)?,
                delta: wire::read_i64(input)?,
            });
        }
        if !input.is_empty() {
            return Err(NativeError::Format(format!(
                "{} trailing bytes after status update",
                input.len()
            )));
        }
        Ok(Self {
            progress,
            status,
            counters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_layout() {
        let update = StatusUpdate {
            progress: 0.5,
            status: "ok".into(),
            counters: vec![CounterDelta {
                group: "g".into(),
                name: "n".into(),
                delta: 3,
            }],
        };
        let mut buf = Vec::new();
        update.encode(&mut buf).unwrap();

        let mut expected = 0.5f32.to_be_bytes().to_vec();
        expected.extend_from_slice(&[2, b'o', b'k']);
        expected.extend_from_slice(&1u32.to_be_bytes());
        expected.extend_from_slice(&[1, b'g', 1, b'n']);
        expected.extend_from_slice(&3i64.to_be_bytes());
        assert_eq!(buf, expected);

        assert_eq!(StatusUpdate::decode(&buf).unwrap(), update);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut buf = Vec::new();
        StatusUpdate {
            progress: 0.0,
            status: String::new(),
            counters: Vec::new(),
        }
        .encode(&mut buf)
        .unwrap();
        buf.push(0);
        assert!(StatusUpdate::decode(&buf).is_err());
    }

    #[test]
    fn oversized_status_length_is_an_error() {
        let mut buf = 0.5f32.to_be_bytes().to_vec();
        buf.push(0x88);
        buf.extend_from_slice(&(1u64 << 62).to_be_bytes());
        let err = StatusUpdate::decode(&buf).unwrap_err();
        assert!(matches!(err, NativeError::Format(_)));
    }
}
