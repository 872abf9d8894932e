//! Binary reader for zero-copy parsing of byte slices.
//!
//! [`BinaryReader`] keeps a position into a borrowed buffer and hands out
//! values, byte slices and slices of packed records without copying.

use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::{Error, Result};

/// A binary reader that provides zero-copy reading from a byte slice.
///
/// # Example
///
/// ```
/// use mameinfo_common::BinaryReader;
///
/// let data = [b'S', b'T', b'R', b'<', b'h', b'i', 0];
/// let mut reader = BinaryReader::new(&data);
///
/// reader.expect_magic(b"STR<").unwrap();
/// assert_eq!(reader.read_cstring().unwrap(), "hi");
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read a null-terminated UTF-8 string.
    pub fn read_cstring(&mut self) -> Result<&'a str> {
        let remaining = self.remaining_bytes();
        let null_pos = memchr::memchr(0, remaining).ok_or(Error::MissingNullTerminator)?;
        self.position += null_pos + 1;
        std::str::from_utf8(&remaining[..null_pos]).map_err(Error::Utf8)
    }

    /// Read a single struct by value.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Borrow `count` consecutive records without copying.
    ///
    /// Records must be `#[repr(C, packed)]` (alignment 1) so that any
    /// position in the buffer is a valid start.
    pub fn read_slice<T>(&mut self, count: usize) -> Result<&'a [T]>
    where
        T: FromBytes + KnownLayout + Immutable,
    {
        let record_size = std::mem::size_of::<T>();
        let len = count.checked_mul(record_size).ok_or(Error::UnexpectedEof {
            needed: usize::MAX,
            available: self.remaining(),
        })?;
        let bytes = self.read_bytes(len)?;
        <[T]>::ref_from_bytes(bytes).map_err(|_| Error::MisalignedRecords { len, record_size })
    }

    /// Expect specific magic bytes.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let actual = self.read_bytes(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    #[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
    #[repr(C, packed)]
    struct Pair {
        a: u8,
        b: u32,
    }

    #[test]
    fn test_read_slice_of_packed_records() {
        let records = [Pair { a: 1, b: 10 }, Pair { a: 2, b: 20 }];
        let mut data = vec![0xAA];
        data.extend_from_slice(records.as_bytes());

        let mut reader = BinaryReader::new(&data);
        reader.read_bytes(1).unwrap();
        let slice: &[Pair] = reader.read_slice(2).unwrap();

        assert_eq!(slice, &records[..]);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_slice_eof() {
        let data = [0u8; 9];
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(
            reader.read_slice::<Pair>(2),
            Err(Error::UnexpectedEof { needed: 10, available: 9 })
        ));
    }

    #[test]
    fn test_read_cstring() {
        let data = b"hello\0world\0";
        let mut reader = BinaryReader::new(data);

        assert_eq!(reader.read_cstring().unwrap(), "hello");
        assert_eq!(reader.read_cstring().unwrap(), "world");
        assert!(matches!(reader.read_cstring(), Err(Error::MissingNullTerminator)));
    }

    #[test]
    fn test_expect_magic() {
        let mut reader = BinaryReader::new(b"STR<rest");
        assert!(reader.expect_magic(b"STR<").is_ok());
        assert_eq!(reader.position(), 4);

        let mut reader = BinaryReader::new(b"NOPE");
        assert!(matches!(reader.expect_magic(b"STR<"), Err(Error::InvalidMagic { .. })));
    }
}
