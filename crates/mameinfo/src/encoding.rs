//! Translation between domain values and their packed on-disk form.
//!
//! Absent values are stored as reserved sentinels rather than zero so that a
//! reader can tell "not specified" apart from a legitimate zero:
//!
//! | Domain value        | Stored as                        |
//! |---------------------|----------------------------------|
//! | `Option<bool>`      | `0` / `1`, `0xFF` when `None`    |
//! | `Option<u8>`        | the value, `0xFF` when `None`    |
//! | `Option<u32>`       | the value, `u32::MAX` when `None`|
//! | `Option<u64>`       | the value, `u64::MAX` when `None`|
//! | `Option<f32>`       | the value, NaN when `None`       |
//! | machine reference   | the index, [`NO_MACHINE`] when `None` |

use crate::types::WireEnum;

/// Stored byte for an unspecified tri-state boolean.
pub const BOOL_UNSPECIFIED: u8 = 0xFF;

/// Sentinel for "no such machine" in resolved clone-of / rom-of fields.
pub const NO_MACHINE: u32 = u32::MAX;

/// Encode a tri-state boolean.
#[inline]
pub const fn encode_bool(value: Option<bool>) -> u8 {
    match value {
        Some(true) => 1,
        Some(false) => 0,
        None => BOOL_UNSPECIFIED,
    }
}

/// Decode a tri-state boolean. Anything but `0` or `1` is unspecified.
#[inline]
pub const fn decode_bool(byte: u8) -> Option<bool> {
    match byte {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

/// Encode an optional enum, storing `default` when absent.
#[inline]
pub fn encode_enum<T: WireEnum>(value: Option<T>, default: u8) -> u8 {
    value.map_or(default, Into::into)
}

/// Decode an enum byte.
#[inline]
pub fn decode_enum<T: WireEnum>(byte: u8) -> Option<T> {
    T::from_u8(byte)
}

/// Decode a byte where `0xFF` means unknown.
#[inline]
pub const fn decode_u8(value: u8) -> Option<u8> {
    if value == u8::MAX {
        None
    } else {
        Some(value)
    }
}

/// Decode a u32 where all bits set means unknown.
#[inline]
pub const fn decode_u32(value: u32) -> Option<u32> {
    if value == u32::MAX {
        None
    } else {
        Some(value)
    }
}

/// Decode a u64 where all bits set means unknown.
#[inline]
pub const fn decode_u64(value: u64) -> Option<u64> {
    if value == u64::MAX {
        None
    } else {
        Some(value)
    }
}

/// Decode an f32 where NaN means unknown.
#[inline]
pub fn decode_f32(value: f32) -> Option<f32> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Decode a resolved machine index.
#[inline]
pub const fn decode_machine_index(value: u32) -> Option<u32> {
    if value == NO_MACHINE {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DumpStatus;

    #[test]
    fn test_tri_state_round_trip() {
        for value in [Some(true), Some(false), None] {
            assert_eq!(decode_bool(encode_bool(value)), value);
        }
        assert_eq!(decode_bool(7), None);
    }

    #[test]
    fn test_enum_default() {
        assert_eq!(encode_enum::<DumpStatus>(None, 0), 0);
        assert_eq!(encode_enum(Some(DumpStatus::NoDump), 0), 2);
        assert_eq!(decode_enum::<DumpStatus>(1), Some(DumpStatus::BadDump));
        assert_eq!(decode_enum::<DumpStatus>(0xFF), None);
    }

    #[test]
    fn test_numeric_sentinels() {
        assert_eq!(decode_u8(0xFF), None);
        assert_eq!(decode_u8(2), Some(2));
        assert_eq!(decode_u32(u32::MAX), None);
        assert_eq!(decode_u32(0), Some(0));
        assert_eq!(decode_u64(u64::MAX), None);
        assert_eq!(decode_f32(f32::NAN), None);
        assert_eq!(decode_f32(60.0), Some(60.0));
        assert_eq!(decode_machine_index(NO_MACHINE), None);
        assert_eq!(decode_machine_index(3), Some(3));
    }
}
