//! Hex digest decoding.
//!
//! ROM and disk digests arrive as hex text (`crc="deadbeef"`) and are stored
//! as fixed-width byte arrays. Decoding stops at the first malformed pair;
//! whatever was not decoded stays zero. The `hex` crate rejects short or
//! malformed input as a whole, so decoding is done here. Encoding for display
//! uses `hex::encode`.

/// Value of a single hex digit.
#[inline]
fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode hex pairs into `dest`, returning the number of bytes written.
pub fn decode_into(dest: &mut [u8], hex: &str) -> usize {
    let mut written = 0;
    for (slot, pair) in dest.iter_mut().zip(hex.as_bytes().chunks_exact(2)) {
        match (hex_digit(pair[0]), hex_digit(pair[1])) {
            (Some(hi), Some(lo)) => *slot = (hi << 4) | lo,
            _ => break,
        }
        written += 1;
    }
    written
}

/// Decode an optional hex attribute into a zero-filled digest.
pub fn digest<const N: usize>(hex: Option<&str>) -> [u8; N] {
    let mut dest = [0u8; N];
    if let Some(hex) = hex {
        decode_into(&mut dest, hex);
    }
    dest
}
