//! Writable-compatible encoding helpers.
//!
//! Fixed-width numbers are big-endian. Text is a zero-compressed variable
//! length integer byte count followed by UTF-8 bytes.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::NativeError;

pub fn write_float<W: Write>(out: &mut W, value: f32) -> Result<(), NativeError> {
    out.write_f32::<BigEndian>(value)?;
    Ok(())
}

pub fn read_float<R: Read>(input: &mut R) -> Result<f32, NativeError> {
    Ok(input.read_f32::<BigEndian>()?)
}

pub fn write_u32<W: Write>(out: &mut W, value: u32) -> Result<(), NativeError> {
    out.write_u32::<BigEndian>(value)?;
    Ok(())
}

pub fn read_u32<R: Read>(input: &mut R) -> Result<u32, NativeError> {
    Ok(input.read_u32::<BigEndian>()?)
}

pub fn write_i64<W: Write>(out: &mut W, value: i64) -> Result<(), NativeError> {
    out.write_i64::<BigEndian>(value)?;
    Ok(())
}

pub fn read_i64<R: Read>(input: &mut R) -> Result<i64, NativeError> {
    Ok(input.read_i64::<BigEndian>()?)
}

/// Zero-compressed variable-length integer.
///
/// Values in `-112..=127` take one byte. Larger values are a length marker
/// followed by the significant bytes, most significant first.
pub fn write_vlong<W: Write>(out: &mut W, value: i64) -> Result<(), NativeError> {
    if (-112..=127).contains(&value) {
        out.write_i8(value as i8)?;
        return Ok(());
    }

    let mut marker: i64 = -112;
    let mut magnitude = value;
    if magnitude < 0 {
        magnitude ^= -1;
        marker = -120;
    }
    let mut tmp = magnitude;
    while tmp != 0 {
        tmp >>= 8;
        marker -= 1;
    }
    out.write_i8(marker as i8)?;

    let len = if marker < -120 {
        -(marker + 120)
    } else {
        -(marker + 112)
    };
    for idx in (0..len).rev() {
        let shift = idx * 8;
        out.write_u8(((magnitude >> shift) & 0xFF) as u8)?;
    }
    Ok(())
}

pub fn read_vlong<R: Read>(input: &mut R) -> Result<i64, NativeError> {
    let first = input.read_i8()?;
    let len = vlong_size(first);
    if len == 1 {
        return Ok(first as i64);
    }
    let mut value: i64 = 0;
    for _ in 0..len - 1 {
        value = (value << 8) | input.read_u8()? as i64;
    }
    let negative = first < -120 || (-112..0).contains(&first);
    Ok(if negative { value ^ -1 } else { value })
}

fn vlong_size(first: i8) -> usize {
    if first >= -112 {
        1
    } else if first < -120 {
        (-119 - first as i32) as usize
    } else {
        (-111 - first as i32) as usize
    }
}

pub fn write_text<W: Write>(out: &mut W, text: &str) -> Result<(), NativeError> {
    write_vlong(out, text.len() as i64)?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

pub fn read_text<R: Read>(input: &mut R) -> Result<String, NativeError> {
    let len = read_vlong(input)?;
    let len = usize::try_from(len)
        .map_err(|_| NativeError::Format(format!("negative text length {len}")))?;
    let mut bytes = Vec::new();
    input.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(NativeError::Format(format!(
            "text length {len} exceeds the {} bytes left",
            bytes.len()
        )));
    }
    String::from_utf8(bytes).map_err(|e| NativeError::Format(format!("text is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_vlong(value: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        write_vlong(&mut buf, value).unwrap();
        buf
    }

    #[test]
    fn vlong_known_encodings() {
        assert_eq!(encode_vlong(0), vec![0x00]);
        assert_eq!(encode_vlong(127), vec![0x7f]);
        assert_eq!(encode_vlong(-112), vec![0x90]);
        assert_eq!(encode_vlong(128), vec![0x8f, 0x80]);
        assert_eq!(encode_vlong(300), vec![0x8e, 0x01, 0x2c]);
        assert_eq!(encode_vlong(-113), vec![0x87, 0x70]);
    }

    #[test]
    fn vlong_boundaries_decode() {
        for value in [i64::MIN, -129, -113, -1, 0, 128, 65_536, i64::MAX] {
            let buf = encode_vlong(value);
            assert_eq!(read_vlong(&mut buf.as_slice()).unwrap(), value);
        }
    }

    #[test]
    fn text_is_length_prefixed() {
        let mut buf = Vec::new();
        write_text(&mut buf, "running").unwrap();
        assert_eq!(buf[0], 7);
        assert_eq!(&buf[1..], b"running");
        assert_eq!(read_text(&mut buf.as_slice()).unwrap(), "running");
    }

    #[test]
    fn truncated_text_is_format_error() {
        let buf = [5u8, b'a', b'b'];
        let err = read_text(&mut buf.as_slice()).unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Format);
    }

    #[test]
    fn oversized_text_length_is_rejected() {
        let mut buf = encode_vlong(1 << 62);
        buf.extend_from_slice(b"short");
        let err = read_text(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, NativeError::Format(_)));
    }
}
