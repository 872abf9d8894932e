//! Run of child records owned by a parent record.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Contiguous run of `count` records starting at `index` in a child table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct ChildRange {
    /// Index of the first child.
    pub index: u32,
    /// Number of children.
    pub count: u32,
}

impl ChildRange {
    /// An empty run beginning at `index`.
    #[inline]
    pub const fn starting_at(index: u32) -> Self {
        Self { index, count: 0 }
    }

    /// The run extended by one child, or `None` if the count would overflow.
    #[inline]
    pub fn grown(self) -> Option<Self> {
        let count = self.count.checked_add(1)?;
        Some(Self { index: self.index, count })
    }

    /// Indices covered by the run.
    #[inline]
    pub fn range(self) -> std::ops::Range<usize> {
        let start = self.index as usize;
        start..start + self.count as usize
    }

    /// Check whether the run is empty.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.count == 0
    }
}
