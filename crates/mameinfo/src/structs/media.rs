//! BIOS set, ROM and disk records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::StringRef;
use crate::encoding::{decode_bool, decode_enum};
use crate::types::DumpStatus;

/// A selectable BIOS.
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BiosSet {
    pub name: StringRef,
    pub description: StringRef,
    pub default: u8,
}

impl BiosSet {
    pub fn is_default(&self) -> bool {
        decode_bool(self.default).unwrap_or(false)
    }
}

/// A ROM image.
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Rom {
    pub name: StringRef,
    pub bios: StringRef,
    pub merge: StringRef,
    pub region: StringRef,
    pub size: u32,
    /// Offset within the region (hex in `-listxml`).
    pub offset: u64,
    pub crc: [u8; 4],
    pub sha1: [u8; 20],
    pub status: u8,
    pub optional: u8,
}

impl Rom {
    pub fn status(&self) -> DumpStatus {
        decode_enum(self.status).unwrap_or(DumpStatus::Good)
    }

    pub fn is_optional(&self) -> bool {
        decode_bool(self.optional).unwrap_or(false)
    }

    /// CRC as a number, matching how it is usually displayed.
    pub fn crc32(&self) -> u32 {
        u32::from_be_bytes(self.crc)
    }
}

/// A CHD disk image.
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Disk {
    pub name: StringRef,
    pub merge: StringRef,
    pub region: StringRef,
    pub sha1: [u8; 20],
    pub index: u32,
    pub writable: u8,
    pub status: u8,
    pub optional: u8,
}

impl Disk {
    pub fn status(&self) -> DumpStatus {
        decode_enum(self.status).unwrap_or(DumpStatus::Good)
    }

    pub fn is_writable(&self) -> bool {
        decode_bool(self.writable).unwrap_or(false)
    }

    pub fn is_optional(&self) -> bool {
        decode_bool(self.optional).unwrap_or(false)
    }
}
