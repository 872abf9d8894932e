//! Database header and salting.
//!
//! The header is stored XORed against [`SALT`]. A file from another program,
//! a truncated file or a file written by an incompatible build unsalts to
//! garbage and fails the magic or fingerprint check.

use std::mem::size_of;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use mameinfo_common::crc;

use crate::structs::*;

/// Number of record tables in a database file.
pub const TABLE_COUNT: usize = 16;

/// Record counts, in table dump order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct TableCounts {
    pub machines: u32,
    pub biossets: u32,
    pub roms: u32,
    pub disks: u32,
    pub devices: u32,
    pub slots: u32,
    pub slot_options: u32,
    pub features: u32,
    pub chips: u32,
    pub displays: u32,
    pub samples: u32,
    pub configurations: u32,
    pub configuration_settings: u32,
    pub configuration_conditions: u32,
    pub software_lists: u32,
    pub ram_options: u32,
}

impl TableCounts {
    /// Counts paired with their record sizes, in dump order.
    pub fn extents(&self) -> [(&'static str, u32, usize); TABLE_COUNT] {
        [
            ("machines", self.machines, size_of::<Machine>()),
            ("biossets", self.biossets, size_of::<BiosSet>()),
            ("roms", self.roms, size_of::<Rom>()),
            ("disks", self.disks, size_of::<Disk>()),
            ("devices", self.devices, size_of::<Device>()),
            ("slots", self.slots, size_of::<Slot>()),
            ("slot_options", self.slot_options, size_of::<SlotOption>()),
            ("features", self.features, size_of::<Feature>()),
            ("chips", self.chips, size_of::<Chip>()),
            ("displays", self.displays, size_of::<Display>()),
            ("samples", self.samples, size_of::<Sample>()),
            ("configurations", self.configurations, size_of::<Configuration>()),
            (
                "configuration_settings",
                self.configuration_settings,
                size_of::<ConfigurationSetting>(),
            ),
            (
                "configuration_conditions",
                self.configuration_conditions,
                size_of::<ConfigurationCondition>(),
            ),
            ("software_lists", self.software_lists, size_of::<SoftwareList>()),
            ("ram_options", self.ram_options, size_of::<RamOption>()),
        ]
    }

    /// Total bytes occupied by all tables.
    pub fn tables_size(&self) -> u64 {
        self.extents()
            .iter()
            .map(|&(_, count, size)| count as u64 * size as u64)
            .sum()
    }
}

/// Database file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct InfoHeader {
    pub magic: [u8; 4],
    /// Fingerprint of the record layout; see [`sizes_hash`].
    pub sizes_hash: u32,
    pub counts: TableCounts,
    /// Emulator build string from `<mame build="...">`.
    pub build: StringRef,
}

impl InfoHeader {
    /// Magic bytes at the start of an unsalted header.
    pub const MAGIC: [u8; 4] = *b"MINF";

    /// Size of the header in bytes.
    pub const SIZE: usize = size_of::<InfoHeader>();

    /// A header for the current layout with the given counts.
    pub fn new(counts: TableCounts, build: StringRef) -> Self {
        Self {
            magic: Self::MAGIC,
            sizes_hash: sizes_hash(),
            counts,
            build,
        }
    }
}

/// Fingerprint over the size of the header and every record type, in dump order.
pub fn sizes_hash() -> u32 {
    crc::hash_sizes(&[
        size_of::<InfoHeader>(),
        size_of::<Machine>(),
        size_of::<BiosSet>(),
        size_of::<Rom>(),
        size_of::<Disk>(),
        size_of::<Device>(),
        size_of::<Slot>(),
        size_of::<SlotOption>(),
        size_of::<Feature>(),
        size_of::<Chip>(),
        size_of::<Display>(),
        size_of::<Sample>(),
        size_of::<Configuration>(),
        size_of::<ConfigurationSetting>(),
        size_of::<ConfigurationCondition>(),
        size_of::<SoftwareList>(),
        size_of::<RamOption>(),
    ])
}

/// Fixed salt, one byte per header byte (xorshift32 stream).
pub const SALT: [u8; InfoHeader::SIZE] = {
    let mut salt = [0u8; InfoHeader::SIZE];
    let mut state: u32 = 0x4D49_4E46;
    let mut i = 0;
    while i < salt.len() {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        salt[i] = (state >> 24) as u8;
        i += 1;
    }
    salt
};

/// XOR a header against [`SALT`].
pub fn salt(header: &InfoHeader) -> InfoHeader {
    let mut salted = *header;
    for (b, s) in salted.as_mut_bytes().iter_mut().zip(SALT.iter()) {
        *b ^= *s;
    }
    salted
}

/// Reverse [`salt`]. XOR is its own inverse.
pub fn unsalt(salted: &InfoHeader) -> InfoHeader {
    salt(salted)
}
