//! Deduplicating string table used while building.

use std::borrow::Cow;
use std::hash::BuildHasherDefault;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use crate::structs::StringRef;
use crate::{Error, Result};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Marker at the start of the string region.
pub const STRINGS_BEGIN_MAGIC: [u8; 4] = *b"STR<";

/// Marker at the end of the string region.
pub const STRINGS_END_MAGIC: [u8; 4] = *b">STR";

/// Interns strings into a blob of NUL-terminated UTF-8.
///
/// Short strings never touch the blob; see [`StringRef`].
#[derive(Debug)]
pub struct StringTable {
    data: Vec<u8>,
    offsets: FxHashMap<String, StringRef>,
    finished: bool,
}

impl StringTable {
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a table pre-sized for `bytes` of string data and `strings` distinct strings.
    pub fn with_capacity(bytes: usize, strings: usize) -> Self {
        let mut data = Vec::with_capacity(bytes + STRINGS_BEGIN_MAGIC.len());
        data.extend_from_slice(&STRINGS_BEGIN_MAGIC);
        Self {
            data,
            offsets: FxHashMap::with_capacity_and_hasher(strings, Default::default()),
            finished: false,
        }
    }

    /// Intern a string and return its reference.
    pub fn get(&mut self, s: &str) -> Result<StringRef> {
        if let Some(inline) = StringRef::try_inline(s) {
            return Ok(inline);
        }
        if let Some(&existing) = self.offsets.get(s) {
            return Ok(existing);
        }
        debug_assert!(!self.finished, "string table already finished");

        let offset = self.data.len();
        let offset = u32::try_from(offset)
            .ok()
            .filter(|o| o & StringRef::INLINE_FLAG == 0)
            .ok_or(Error::IndexOverflow {
                what: "string table offset",
                value: offset as u64,
            })?;

        let r = StringRef::from_offset(offset);
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);
        self.offsets.insert(s.to_owned(), r);
        Ok(r)
    }

    /// Intern an optional string, treating `None` as empty.
    pub fn get_opt(&mut self, s: Option<&str>) -> Result<StringRef> {
        self.get(s.unwrap_or_default())
    }

    /// Resolve a reference produced by this table.
    ///
    /// # Panics
    ///
    /// Panics if `r` is an offset this table never produced.
    pub fn lookup(&self, r: StringRef) -> Cow<'_, str> {
        if let Some(inline) = r.inline_str() {
            return Cow::Owned(inline.as_str().to_owned());
        }
        let offset = r.raw() as usize;
        assert!(offset < self.data.len(), "string offset {offset} out of bounds");
        let bytes = &self.data[offset..];
        let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end])
    }

    /// Append the end marker. Further inserts are a programming error.
    pub fn finish(&mut self) {
        if !self.finished {
            self.data.extend_from_slice(&STRINGS_END_MAGIC);
            self.finished = true;
        }
    }

    /// The raw string region, including markers.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of distinct strings stored in the blob.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}
