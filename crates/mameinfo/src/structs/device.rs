//! Device, slot and slot option records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::{ChildRange, StringRef};
use crate::encoding::decode_bool;

/// A media device (cartridge port, floppy drive, ...).
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Device {
    pub device_type: StringRef,
    pub tag: StringRef,
    pub interface: StringRef,
    pub instance_name: StringRef,
    /// Comma-terminated list of file extensions, e.g. `"bin,rom,"`.
    pub extensions: StringRef,
    pub mandatory: u8,
}

impl Device {
    pub fn is_mandatory(&self) -> bool {
        decode_bool(self.mandatory).unwrap_or(false)
    }
}

/// A slot that accepts one of several options.
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Slot {
    pub name: StringRef,
    pub options: ChildRange,
}

/// One choice for a slot.
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct SlotOption {
    pub name: StringRef,
    pub devname: StringRef,
    pub is_default: u8,
}

impl SlotOption {
    pub fn is_default(&self) -> bool {
        decode_bool(self.is_default).unwrap_or(false)
    }
}
