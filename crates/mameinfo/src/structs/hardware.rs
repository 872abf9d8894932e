//! Feature, chip, display, sample, software list and RAM option records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::StringRef;
use crate::encoding::{decode_bool, decode_enum, decode_f32, decode_u32, decode_u64};
use crate::types::{ChipType, DisplayType, FeatureQuality, FeatureType, Rotation, SoftwareListStatus};

/// Emulation status of one feature.
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Feature {
    pub feature_type: u8,
    pub status: u8,
    pub overall: u8,
}

impl Feature {
    pub fn feature_type(&self) -> FeatureType {
        decode_enum(self.feature_type).unwrap_or(FeatureType::Unknown)
    }

    pub fn status(&self) -> FeatureQuality {
        decode_enum(self.status).unwrap_or(FeatureQuality::Unknown)
    }

    pub fn overall(&self) -> FeatureQuality {
        decode_enum(self.overall).unwrap_or(FeatureQuality::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Chip {
    pub name: StringRef,
    pub tag: StringRef,
    /// Clock in Hz; 0 when not given.
    pub clock: u64,
    pub chip_type: u8,
}

impl Chip {
    pub fn chip_type(&self) -> ChipType {
        decode_enum(self.chip_type).unwrap_or(ChipType::Cpu)
    }
}

/// A screen. Unknown timings are stored with all bits set; see [`crate::encoding`].
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Display {
    pub tag: StringRef,
    pub width: u32,
    pub height: u32,
    pub refresh: f32,
    pub pixclock: u64,
    pub htotal: u32,
    pub hbend: u32,
    pub hbstart: u32,
    pub vtotal: u32,
    pub vbend: u32,
    pub vbstart: u32,
    pub display_type: u8,
    pub rotate: u8,
    pub flipx: u8,
}

impl Display {
    pub fn display_type(&self) -> DisplayType {
        decode_enum(self.display_type).unwrap_or(DisplayType::Unknown)
    }

    pub fn rotate(&self) -> Rotation {
        decode_enum(self.rotate).unwrap_or(Rotation::Rot0)
    }

    pub fn flipx(&self) -> Option<bool> {
        decode_bool(self.flipx)
    }

    pub fn width(&self) -> Option<u32> {
        decode_u32(self.width)
    }

    pub fn height(&self) -> Option<u32> {
        decode_u32(self.height)
    }

    pub fn refresh(&self) -> Option<f32> {
        decode_f32(self.refresh)
    }

    pub fn pixclock(&self) -> Option<u64> {
        decode_u64(self.pixclock)
    }

    /// `(htotal, hbend, hbstart)`, each `None` when unknown.
    pub fn horizontal(&self) -> [Option<u32>; 3] {
        [decode_u32(self.htotal), decode_u32(self.hbend), decode_u32(self.hbstart)]
    }

    /// `(vtotal, vbend, vbstart)`, each `None` when unknown.
    pub fn vertical(&self) -> [Option<u32>; 3] {
        [decode_u32(self.vtotal), decode_u32(self.vbend), decode_u32(self.vbstart)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Sample {
    pub name: StringRef,
}

#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct SoftwareList {
    pub name: StringRef,
    pub filter: StringRef,
    pub status: u8,
}

impl SoftwareList {
    pub fn status(&self) -> SoftwareListStatus {
        decode_enum(self.status).unwrap_or(SoftwareListStatus::Original)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct RamOption {
    pub name: StringRef,
    /// Size in bytes; 0 when the element text is not a number.
    pub value: u64,
    pub is_default: u8,
}

impl RamOption {
    pub fn is_default(&self) -> bool {
        decode_bool(self.is_default).unwrap_or(false)
    }
}
