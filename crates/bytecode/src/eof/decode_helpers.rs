/// Consumes a single byte from the input slice and returns a tuple containing the remaining input slice
/// and the consumed byte as a u8.
///
/// Returns `None` if the input slice is empty.
#[inline]
pub(crate) fn consume_u8(input: &[u8]) -> Option<(&[u8], u8)> {
    let (first, rest) = input.split_first()?;
    Some((rest, *first))
}

/// Consumes a big-endian u16 from the input.
///
/// Returns `None` if the input slice is less than 2 bytes.
#[inline]
pub(crate) fn consume_u16(input: &[u8]) -> Option<(&[u8], u16)> {
    if input.len() < 2 {
        return None;
    }
    let (int_bytes, rest) = input.split_at(2);
    Some((rest, u16::from_be_bytes([int_bytes[0], int_bytes[1]])))
}
