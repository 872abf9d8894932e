//! 32-bit string references.
//!
//! A reference is either a byte offset into the string blob (bit 31 clear)
//! or a short string packed into the reference itself (bit 31 set). Inline
//! strings hold up to [`StringRef::INLINE_MAX_LEN`] characters from a
//! 63-symbol alphabet, six bits per character, with code 0 terminating.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Symbols representable inline; code `n` is `ALPHABET[n - 1]`.
const ALPHABET: &[u8; 63] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ?";

const BITS_PER_CHAR: u32 = 6;
const CHAR_MASK: u32 = (1 << BITS_PER_CHAR) - 1;

/// Inverse of [`ALPHABET`]; 0 marks bytes that cannot be inlined.
const CODES: [u8; 256] = {
    let mut codes = [0u8; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        codes[ALPHABET[i] as usize] = (i + 1) as u8;
        i += 1;
    }
    codes
};

/// Reference to a string in the database.
#[derive(Clone, Copy, PartialEq, Eq, Hash, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct StringRef(u32);

impl StringRef {
    /// Bit marking an inline string.
    pub const INLINE_FLAG: u32 = 0x8000_0000;

    /// Longest string that can be stored inline.
    pub const INLINE_MAX_LEN: usize = 5;

    /// The empty string.
    pub const EMPTY: StringRef = StringRef(Self::INLINE_FLAG);

    /// Wrap a raw stored value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw stored value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Reference a blob offset. Offsets must leave bit 31 clear.
    #[inline]
    pub(crate) const fn from_offset(offset: u32) -> Self {
        debug_assert!(offset & Self::INLINE_FLAG == 0);
        Self(offset)
    }

    /// Check whether the string is packed into the reference.
    #[inline]
    pub const fn is_inline(self) -> bool {
        self.0 & Self::INLINE_FLAG != 0
    }

    /// Byte offset into the string blob, or `None` for inline strings.
    #[inline]
    pub const fn offset(self) -> Option<usize> {
        if self.is_inline() {
            None
        } else {
            Some(self.0 as usize)
        }
    }

    /// Encode `s` inline if it is short enough and uses only inlineable symbols.
    pub fn try_inline(s: &str) -> Option<Self> {
        if s.len() > Self::INLINE_MAX_LEN {
            return None;
        }
        let mut raw = Self::INLINE_FLAG;
        for (i, &b) in s.as_bytes().iter().enumerate() {
            let code = CODES[b as usize];
            if code == 0 {
                return None;
            }
            raw |= (code as u32) << (i as u32 * BITS_PER_CHAR);
        }
        Some(Self(raw))
    }

    /// Decode an inline string.
    pub fn inline_str(self) -> Option<InlineStr> {
        if !self.is_inline() {
            return None;
        }
        let mut out = InlineStr::default();
        for i in 0..Self::INLINE_MAX_LEN {
            let code = (self.0 >> (i as u32 * BITS_PER_CHAR)) & CHAR_MASK;
            if code == 0 {
                break;
            }
            out.bytes[out.len as usize] = ALPHABET[code as usize - 1];
            out.len += 1;
        }
        Some(out)
    }
}

impl Default for StringRef {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::fmt::Debug for StringRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inline_str() {
            Some(s) => write!(f, "StringRef(inline {:?})", s.as_str()),
            None => write!(f, "StringRef(@{})", self.0),
        }
    }
}

/// A decoded inline string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStr {
    bytes: [u8; StringRef::INLINE_MAX_LEN],
    len: u8,
}

impl InlineStr {
    /// View as a string slice.
    pub fn as_str(&self) -> &str {
        // The alphabet is ASCII.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_inline() {
        let r = StringRef::try_inline("").unwrap();
        assert_eq!(r, StringRef::EMPTY);
        assert_eq!(r.raw(), 0x8000_0000);
        assert_eq!(r.inline_str().unwrap().as_str(), "");
    }

    #[test]
    fn test_inline_round_trip() {
        for s in ["1984", "cpu", "198?", "Z80", "a", "zZ9?q"] {
            let r = StringRef::try_inline(s).unwrap();
            assert!(r.is_inline());
            assert_eq!(r.offset(), None);
            assert_eq!(r.inline_str().unwrap().as_str(), s);
        }
    }

    #[test]
    fn test_not_inlineable() {
        assert!(StringRef::try_inline("abcdef").is_none());
        assert!(StringRef::try_inline("a-b").is_none());
        assert!(StringRef::try_inline("a b").is_none());
        assert!(StringRef::try_inline("é").is_none());
    }

    #[test]
    fn test_distinct_inline_strings_distinct_refs() {
        let a = StringRef::try_inline("ab").unwrap();
        let b = StringRef::try_inline("ba").unwrap();
        let c = StringRef::try_inline("ab0").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_offset_refs() {
        let r = StringRef::from_offset(4);
        assert!(!r.is_inline());
        assert_eq!(r.offset(), Some(4));
        assert!(r.inline_str().is_none());
    }
}
