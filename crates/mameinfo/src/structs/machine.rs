//! Machine record.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::{ChildRange, StringRef};
use crate::encoding::{decode_bool, decode_enum, decode_machine_index, decode_u8};
use crate::types::DriverQuality;

/// A machine (driver) from `-listxml`.
///
/// `clone_of` and `rom_of` hold the raw [`StringRef`] of the parent's name
/// while building; the resolver replaces them with machine indices.
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Machine {
    pub name: StringRef,
    pub source_file: StringRef,
    pub description: StringRef,
    pub year: StringRef,
    pub manufacturer: StringRef,
    /// Parent machine index, or [`crate::encoding::NO_MACHINE`].
    pub clone_of: u32,
    /// ROM parent machine index, or [`crate::encoding::NO_MACHINE`].
    pub rom_of: u32,

    pub biossets: ChildRange,
    pub roms: ChildRange,
    pub disks: ChildRange,
    pub features: ChildRange,
    pub chips: ChildRange,
    pub displays: ChildRange,
    pub samples: ChildRange,
    pub configurations: ChildRange,
    pub software_lists: ChildRange,
    pub ram_options: ChildRange,
    pub devices: ChildRange,
    pub slots: ChildRange,

    pub runnable: u8,
    pub is_bios: u8,
    pub is_device: u8,
    pub is_mechanical: u8,
    pub quality_status: u8,
    pub quality_emulation: u8,
    pub quality_cocktail: u8,
    pub save_state_supported: u8,
    pub unofficial: u8,
    pub incomplete: u8,
    pub sound_channels: u8,
}

impl Machine {
    pub fn clone_of_index(&self) -> Option<u32> {
        decode_machine_index(self.clone_of)
    }

    pub fn rom_of_index(&self) -> Option<u32> {
        decode_machine_index(self.rom_of)
    }

    pub fn runnable(&self) -> Option<bool> {
        decode_bool(self.runnable)
    }

    pub fn is_bios(&self) -> Option<bool> {
        decode_bool(self.is_bios)
    }

    pub fn is_device(&self) -> Option<bool> {
        decode_bool(self.is_device)
    }

    pub fn is_mechanical(&self) -> Option<bool> {
        decode_bool(self.is_mechanical)
    }

    pub fn save_state_supported(&self) -> Option<bool> {
        decode_bool(self.save_state_supported)
    }

    pub fn unofficial(&self) -> Option<bool> {
        decode_bool(self.unofficial)
    }

    pub fn incomplete(&self) -> Option<bool> {
        decode_bool(self.incomplete)
    }

    pub fn quality_status(&self) -> Option<DriverQuality> {
        decode_enum(self.quality_status)
    }

    pub fn quality_emulation(&self) -> Option<DriverQuality> {
        decode_enum(self.quality_emulation)
    }

    pub fn quality_cocktail(&self) -> Option<DriverQuality> {
        decode_enum(self.quality_cocktail)
    }

    /// Number of sound channels, if the machine declares `<sound>`.
    pub fn sound_channels(&self) -> Option<u8> {
        decode_u8(self.sound_channels)
    }
}
