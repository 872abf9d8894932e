//! CRC32C hashing utilities.
//!
//! The database header carries a CRC32C over the sizes of every record
//! struct; a reader compiled against a different layout sees a different
//! fingerprint and rejects the file.

/// Continue a CRC32C computation with more data.
#[inline]
pub fn hash_bytes_with_seed(data: &[u8], seed: u32) -> u32 {
    crc32c::crc32c_append(seed, data)
}

/// Hash a sequence of sizes, each fed as a little-endian u32.
pub fn hash_sizes(sizes: &[usize]) -> u32 {
    sizes.iter().fold(0, |seed, &size| {
        hash_bytes_with_seed(&(size as u32).to_le_bytes(), seed)
    })
}
