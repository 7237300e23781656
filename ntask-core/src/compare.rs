//! Built-in key comparators.
//!
//! The byte comparator defines the sort order of the whole pipeline, so it
//! must match unsigned big-endian byte ordering exactly.
//!
//! The float and double comparators are not three-way comparisons: they
//! answer `+1` when `src >= dest` and `-1` otherwise, so equal keys compare as
//! "greater" and a zero result never occurs.

use std::cmp::Ordering;

use crate::error::NativeError;
use crate::types::KeyValueType;

/// Signature shared by all key comparators, built-in or plugin-provided.
pub type ComparatorFn = fn(&[u8], &[u8]) -> Result<i32, NativeError>;

/// Unsigned lexicographic comparison; a common prefix sorts the shorter key
/// first.
pub fn bytes_comparator(src: &[u8], dest: &[u8]) -> Result<i32, NativeError> {
    let min = src.len().min(dest.len());
    Ok(match src[..min].cmp(&dest[..min]) {
        Ordering::Less => -1,
        Ordering::Greater => 1,
        Ordering::Equal => {
            let diff = src.len() as i64 - dest.len() as i64;
            diff.clamp(i32::MIN as i64, i32::MAX as i64) as i32
        }
    })
}

/// Compares two big-endian `f32` keys.
pub fn float_comparator(src: &[u8], dest: &[u8]) -> Result<i32, NativeError> {
    let src = f32::from_be_bytes(fixed_width::<4>("float", src)?);
    let dest = f32::from_be_bytes(fixed_width::<4>("float", dest)?);
    Ok(if src - dest >= 0.0 { 1 } else { -1 })
}

/// Compares two big-endian `f64` keys.
pub fn double_comparator(src: &[u8], dest: &[u8]) -> Result<i32, NativeError> {
    let src = f64::from_be_bytes(fixed_width::<8>("double", src)?);
    let dest = f64::from_be_bytes(fixed_width::<8>("double", dest)?);
    Ok(if src - dest >= 0.0 { 1 } else { -1 })
}

/// Built-in comparator for a declared key type, if there is one.
pub fn default_comparator(key_type: KeyValueType) -> Option<ComparatorFn> {
    match key_type {
        KeyValueType::Bytes
        | KeyValueType::Text
        | KeyValueType::Byte
        | KeyValueType::Bool
        | KeyValueType::Int
        | KeyValueType::Long => Some(bytes_comparator as ComparatorFn),
        KeyValueType::Float => Some(float_comparator as ComparatorFn),
        KeyValueType::Double => Some(double_comparator as ComparatorFn),
        _ => None,
    }
}

fn fixed_width<const N: usize>(what: &str, operand: &[u8]) -> Result<[u8; N], NativeError> {
    operand.try_into().map_err(|_| {
        NativeError::Format(format!(
            "{what} comparator expects {N}-byte operands, got {}",
            operand.len()
        ))
    })
}
