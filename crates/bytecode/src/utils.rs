//! Various utilities for the bytecode

/// Reads a big-endian `i16` from the first two bytes of `bytes`.
///
/// Returns `None` if `bytes` is shorter than two bytes.
#[inline]
pub fn read_i16(bytes: &[u8]) -> Option<i16> {
    read_u16(bytes).map(|value| value as i16)
}

/// Reads a big-endian `u16` from the first two bytes of `bytes`.
///
/// Returns `None` if `bytes` is shorter than two bytes.
#[inline]
pub fn read_u16(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [first, second, ..] => Some(u16::from_be_bytes([*first, *second])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_big_endian() {
        let data = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(read_u16(&data), Some(0x1234));
        assert_eq!(read_u16(&data[1..]), Some(0x3456));
        assert_eq!(read_u16(&data[2..]), Some(0x5678));
        assert_eq!(read_u16(&data[3..]), None);
    }

    #[test]
    fn test_read_i16_is_sign_extended() {
        let data = [0x12, 0x34, 0xFF, 0xFF, 0x80, 0x00, 0x7F, 0xFF];
        assert_eq!(read_i16(&data), Some(0x1234));
        assert_eq!(read_i16(&data[2..]), Some(-1));
        assert_eq!(read_i16(&data[4..]), Some(i16::MIN));
        assert_eq!(read_i16(&data[6..]), Some(i16::MAX));
        assert_eq!(read_i16(&[]), None);
    }
}
