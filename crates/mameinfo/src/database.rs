//! Info database loader.
//!
//! Reads a file written by [`InfoBuilder`](crate::InfoBuilder): unsalts and
//! checks the header, then serves every table as a zero-copy slice over the
//! mapped file.

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::path::Path;

use mameinfo_common::BinaryReader;
use memmap2::Mmap;
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::header::{self, InfoHeader, TableCounts, TABLE_COUNT};
use crate::string_table::{STRINGS_BEGIN_MAGIC, STRINGS_END_MAGIC};
use crate::structs::*;
use crate::{Error, Result};

/// Bytes behind a database.
enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            Backing::Mapped(mmap) => mmap,
            Backing::Owned(data) => data,
        }
    }
}

/// Position of one table in the file.
#[derive(Debug, Clone, Copy, Default)]
struct Extent {
    offset: usize,
    count: usize,
}

// Table positions in dump order.
const MACHINES: usize = 0;
const BIOSSETS: usize = 1;
const ROMS: usize = 2;
const DISKS: usize = 3;
const DEVICES: usize = 4;
const SLOTS: usize = 5;
const SLOT_OPTIONS: usize = 6;
const FEATURES: usize = 7;
const CHIPS: usize = 8;
const DISPLAYS: usize = 9;
const SAMPLES: usize = 10;
const CONFIGURATIONS: usize = 11;
const CONFIGURATION_SETTINGS: usize = 12;
const CONFIGURATION_CONDITIONS: usize = 13;
const SOFTWARE_LISTS: usize = 14;
const RAM_OPTIONS: usize = 15;

/// A loaded info database.
///
/// # Example
///
/// ```no_run
/// use mameinfo::InfoDatabase;
///
/// let db = InfoDatabase::open("mame.info")?;
/// if let Some(machine) = db.find_machine("pacman") {
///     println!("{}", db.string(machine.description)?);
///     for rom in db.roms_of(machine) {
///         println!("  {} {:08x}", db.string(rom.name)?, rom.crc32());
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct InfoDatabase {
    backing: Backing,
    header: InfoHeader,
    tables: [Extent; TABLE_COUNT],
    strings_offset: usize,
}

impl fmt::Debug for InfoDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfoDatabase")
            .field("counts", &self.counts())
            .field("size", &self.backing.bytes().len())
            .finish()
    }
}

impl InfoDatabase {
    /// Open a database file (memory-mapped).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the map is read-only and owned by the database. Database
        // files are written once and replaced, never modified in place.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::load(Backing::Mapped(mmap))
    }

    /// Parse a database from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::load(Backing::Owned(data.to_vec()))
    }

    /// Parse a database, taking ownership of the bytes.
    pub fn from_vec(data: Vec<u8>) -> Result<Self> {
        Self::load(Backing::Owned(data))
    }

    fn load(backing: Backing) -> Result<Self> {
        let data = backing.bytes();
        let available = data.len() as u64;

        if data.len() < InfoHeader::SIZE {
            return Err(Error::Truncated {
                needed: InfoHeader::SIZE as u64,
                available,
            });
        }
        let mut reader = BinaryReader::new(data);
        let header = header::unsalt(&reader.read_struct::<InfoHeader>()?);

        let magic = header.magic;
        if magic != InfoHeader::MAGIC {
            return Err(Error::InvalidMagic { actual: magic });
        }
        let (expected, actual) = (header::sizes_hash(), header.sizes_hash);
        if actual != expected {
            return Err(Error::SchemaMismatch { expected, actual });
        }

        let counts = header.counts;
        let markers = (STRINGS_BEGIN_MAGIC.len() + STRINGS_END_MAGIC.len()) as u64;
        let needed = InfoHeader::SIZE as u64 + counts.tables_size() + markers;
        if needed > available {
            return Err(Error::Truncated { needed, available });
        }

        let mut tables = [Extent::default(); TABLE_COUNT];
        for (extent, (_, count, record_size)) in tables.iter_mut().zip(counts.extents()) {
            let count = count as usize;
            *extent = Extent {
                offset: reader.position(),
                count,
            };
            reader.read_bytes(count * record_size)?;
        }

        let strings_offset = reader.position();
        let strings = reader.remaining_bytes();
        BinaryReader::new(strings)
            .expect_magic(&STRINGS_BEGIN_MAGIC)
            .map_err(|_| Error::CorruptStringTable("missing begin marker"))?;
        if !strings.ends_with(&STRINGS_END_MAGIC) {
            return Err(Error::CorruptStringTable("missing end marker"));
        }

        tracing::debug!(
            machines = { counts.machines },
            string_bytes = strings.len(),
            "loaded info database"
        );

        Ok(Self {
            backing,
            header,
            tables,
            strings_offset,
        })
    }

    fn table<T>(&self, which: usize) -> &[T]
    where
        T: FromBytes + KnownLayout + Immutable,
    {
        let extent = self.tables[which];
        let mut reader = BinaryReader::new(self.backing.bytes());
        // Extents were bounds-checked in `load`.
        reader
            .read_bytes(extent.offset)
            .and_then(|_| reader.read_slice(extent.count))
            .unwrap_or_default()
    }

    /// The unsalted header.
    pub fn header(&self) -> InfoHeader {
        self.header
    }

    pub fn counts(&self) -> TableCounts {
        self.header.counts
    }

    /// Emulator build the database was made from.
    pub fn build(&self) -> Result<Cow<'_, str>> {
        self.string(self.header.build)
    }

    /// Raw string region, including markers.
    pub fn string_data(&self) -> &[u8] {
        &self.backing.bytes()[self.strings_offset..]
    }

    /// Resolve a string reference.
    pub fn string(&self, r: StringRef) -> Result<Cow<'_, str>> {
        if let Some(inline) = r.inline_str() {
            return Ok(Cow::Owned(inline.as_str().to_owned()));
        }
        let blob = self.string_data();
        let offset = r.raw() as usize;
        if offset < STRINGS_BEGIN_MAGIC.len() || offset >= blob.len() - STRINGS_END_MAGIC.len() {
            return Err(Error::StringOffsetOutOfBounds {
                offset,
                size: blob.len(),
            });
        }
        let mut reader = BinaryReader::new(&blob[offset..]);
        Ok(Cow::Borrowed(reader.read_cstring()?))
    }

    pub fn machines(&self) -> &[Machine] {
        self.table(MACHINES)
    }

    pub fn biossets(&self) -> &[BiosSet] {
        self.table(BIOSSETS)
    }

    pub fn roms(&self) -> &[Rom] {
        self.table(ROMS)
    }

    pub fn disks(&self) -> &[Disk] {
        self.table(DISKS)
    }

    pub fn devices(&self) -> &[Device] {
        self.table(DEVICES)
    }

    pub fn slots(&self) -> &[Slot] {
        self.table(SLOTS)
    }

    pub fn slot_options(&self) -> &[SlotOption] {
        self.table(SLOT_OPTIONS)
    }

    pub fn features(&self) -> &[Feature] {
        self.table(FEATURES)
    }

    pub fn chips(&self) -> &[Chip] {
        self.table(CHIPS)
    }

    pub fn displays(&self) -> &[Display] {
        self.table(DISPLAYS)
    }

    pub fn samples(&self) -> &[Sample] {
        self.table(SAMPLES)
    }

    pub fn configurations(&self) -> &[Configuration] {
        self.table(CONFIGURATIONS)
    }

    pub fn configuration_settings(&self) -> &[ConfigurationSetting] {
        self.table(CONFIGURATION_SETTINGS)
    }

    pub fn configuration_conditions(&self) -> &[ConfigurationCondition] {
        self.table(CONFIGURATION_CONDITIONS)
    }

    pub fn software_lists(&self) -> &[SoftwareList] {
        self.table(SOFTWARE_LISTS)
    }

    pub fn ram_options(&self) -> &[RamOption] {
        self.table(RAM_OPTIONS)
    }

    /// Machine at a resolved index.
    pub fn machine(&self, index: u32) -> Option<&Machine> {
        self.machines().get(index as usize)
    }

    /// Index of the machine named `name`. Machines are sorted by name.
    pub fn machine_index(&self, name: &str) -> Option<usize> {
        self.machines()
            .binary_search_by(|machine| {
                let machine_name = self.string(machine.name).unwrap_or_default();
                machine_name.as_bytes().cmp(name.as_bytes())
            })
            .ok()
    }

    /// Look up a machine by name.
    pub fn find_machine(&self, name: &str) -> Option<&Machine> {
        self.machine_index(name).map(|index| &self.machines()[index])
    }

    pub fn biossets_of(&self, machine: &Machine) -> &[BiosSet] {
        children(self.biossets(), machine.biossets)
    }

    pub fn roms_of(&self, machine: &Machine) -> &[Rom] {
        children(self.roms(), machine.roms)
    }

    pub fn disks_of(&self, machine: &Machine) -> &[Disk] {
        children(self.disks(), machine.disks)
    }

    pub fn devices_of(&self, machine: &Machine) -> &[Device] {
        children(self.devices(), machine.devices)
    }

    pub fn slots_of(&self, machine: &Machine) -> &[Slot] {
        children(self.slots(), machine.slots)
    }

    pub fn options_of(&self, slot: &Slot) -> &[SlotOption] {
        children(self.slot_options(), slot.options)
    }

    pub fn features_of(&self, machine: &Machine) -> &[Feature] {
        children(self.features(), machine.features)
    }

    pub fn chips_of(&self, machine: &Machine) -> &[Chip] {
        children(self.chips(), machine.chips)
    }

    pub fn displays_of(&self, machine: &Machine) -> &[Display] {
        children(self.displays(), machine.displays)
    }

    pub fn samples_of(&self, machine: &Machine) -> &[Sample] {
        children(self.samples(), machine.samples)
    }

    pub fn configurations_of(&self, machine: &Machine) -> &[Configuration] {
        children(self.configurations(), machine.configurations)
    }

    pub fn settings_of(&self, configuration: &Configuration) -> &[ConfigurationSetting] {
        children(self.configuration_settings(), configuration.settings)
    }

    pub fn conditions_of(&self, setting: &ConfigurationSetting) -> &[ConfigurationCondition] {
        children(self.configuration_conditions(), setting.conditions)
    }

    pub fn software_lists_of(&self, machine: &Machine) -> &[SoftwareList] {
        children(self.software_lists(), machine.software_lists)
    }

    pub fn ram_options_of(&self, machine: &Machine) -> &[RamOption] {
        children(self.ram_options(), machine.ram_options)
    }
}

/// The records a child range covers; empty if the range is out of bounds.
pub fn children<T>(table: &[T], range: ChildRange) -> &[T] {
    table.get(range.range()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use crate::{BuildOptions, InfoBuilder};
    use std::io::Write;
    use zerocopy::IntoBytes;

    const SAMPLE: &str = include_str!("../testdata/sample.xml");

    fn sample_bytes() -> Vec<u8> {
        let mut builder = InfoBuilder::new();
        builder
            .process_xml(SAMPLE.as_bytes(), &BuildOptions::default(), |_| {})
            .unwrap();
        builder.build().unwrap()
    }

    fn sample() -> InfoDatabase {
        InfoDatabase::from_vec(sample_bytes()).unwrap()
    }

    fn names<'a>(db: &'a InfoDatabase, refs: impl IntoIterator<Item = StringRef>) -> Vec<Cow<'a, str>> {
        refs.into_iter().map(|r| db.string(r).unwrap()).collect()
    }

    #[test]
    fn test_header_round_trip() {
        let db = sample();
        let counts = db.counts();
        let (machines, roms, biossets) = (counts.machines, counts.roms, counts.biossets);
        assert_eq!(machines, 7);
        assert_eq!(roms, 8);
        assert_eq!(biossets, 2);
        assert_eq!(db.build().unwrap(), "0.259 (mame0259)");
        assert_eq!(db.machines().len(), 7);
    }

    #[test]
    fn test_machines_sorted_and_searchable() {
        let db = sample();
        let all = names(&db, db.machines().iter().map(|m| m.name));
        assert_eq!(all, ["c64", "kof98", "mach3", "neogeo", "pacman", "puckman", "z80"]);
        assert!(all.windows(2).all(|w| w[0].as_bytes() < w[1].as_bytes()));

        for (index, name) in all.iter().enumerate() {
            assert_eq!(db.machine_index(name), Some(index));
        }
        assert!(db.find_machine("galaga").is_none());
        assert!(db.find_machine("").is_none());
    }

    #[test]
    fn test_machine_fields() {
        let db = sample();
        let pacman = db.find_machine("pacman").unwrap();
        assert_eq!(db.string(pacman.description).unwrap(), "Pac-Man (Midway)");
        assert_eq!(db.string(pacman.year).unwrap(), "1980");
        assert_eq!(db.string(pacman.manufacturer).unwrap(), "Namco (Midway license)");
        assert_eq!(db.string(pacman.source_file).unwrap(), "pacman/pacman.cpp");

        let parent = db.machine(pacman.clone_of_index().unwrap()).unwrap();
        assert_eq!(db.string(parent.name).unwrap(), "puckman");
        assert_eq!(pacman.rom_of_index(), pacman.clone_of_index());

        let kof98 = db.find_machine("kof98").unwrap();
        assert_eq!(kof98.clone_of_index(), None);
        assert_eq!(kof98.rom_of_index(), db.machine_index("neogeo").map(|i| i as u32));
        assert_eq!(kof98.save_state_supported(), Some(false));

        let neogeo = db.find_machine("neogeo").unwrap();
        assert_eq!(neogeo.is_bios(), Some(true));
        assert_eq!(neogeo.quality_status(), Some(DriverQuality::Imperfect));
        assert_eq!(neogeo.sound_channels(), Some(2));

        let z80 = db.find_machine("z80").unwrap();
        assert_eq!(z80.is_device(), Some(true));
        assert_eq!(z80.runnable(), Some(false));
        assert_eq!(z80.sound_channels(), None);

        let mach3 = db.find_machine("mach3").unwrap();
        assert_eq!(mach3.is_mechanical(), Some(false));
        assert_eq!(mach3.incomplete(), Some(true));
        assert_eq!(mach3.quality_emulation(), Some(DriverQuality::Preliminary));
    }

    #[test]
    fn test_rom_and_disk_round_trip() {
        let db = sample();
        let puckman = db.find_machine("puckman").unwrap();
        let roms = db.roms_of(puckman);
        assert_eq!(roms.len(), 3);
        assert_eq!(
            names(&db, roms.iter().map(|r| r.name)),
            ["pm1_prg1.6e", "pm1_prg2.6k", "pm1-3.1m"]
        );
        assert_eq!(roms[0].crc32(), 0xf36e_88ab);
        assert_eq!(
            hex::encode(&roms[0].sha1),
            "813cecf44bf5464b1aed64b36f5047e4c79ba176"
        );
        let offset = roms[1].offset;
        assert_eq!(offset, 0x800);
        assert_eq!(roms[2].status(), DumpStatus::BadDump);
        assert_eq!(db.string(roms[2].region).unwrap(), "namco");

        let pacman = db.find_machine("pacman").unwrap();
        let merged = db.roms_of(pacman)[1];
        assert_eq!(db.string(merged.merge).unwrap(), "pm1-3.1m");

        let neogeo = db.find_machine("neogeo").unwrap();
        let bios = db.roms_of(neogeo)[0];
        assert_eq!(db.string(bios.bios).unwrap(), "euro");
        let biossets = db.biossets_of(neogeo);
        assert_eq!(biossets.len(), 2);
        assert!(biossets[0].is_default());
        assert_eq!(db.string(biossets[1].description).unwrap(), "US MVS (Ver. 2?)");

        let mach3 = db.find_machine("mach3").unwrap();
        let disk = db.disks_of(mach3)[0];
        assert_eq!(db.string(disk.region).unwrap(), "laserdisc");
        assert_eq!(disk.status(), DumpStatus::BadDump);
        assert!(!disk.is_writable());
        assert_eq!(disk.sha1[0], 0x3e);
    }

    #[test]
    fn test_hardware_round_trip() {
        let db = sample();
        let puckman = db.find_machine("puckman").unwrap();

        let chips = db.chips_of(puckman);
        assert_eq!(names(&db, chips.iter().map(|c| c.name)), ["Zilog Z80", "Speaker", "Namco"]);
        assert_eq!(chips[1].chip_type(), ChipType::Audio);
        let clock = chips[1].clock;
        assert_eq!(clock, 0);

        let display = db.displays_of(puckman)[0];
        assert_eq!(display.rotate(), Rotation::Rot90);
        assert_eq!(display.display_type(), DisplayType::Raster);
        assert_eq!(display.width(), Some(288));
        assert_eq!(display.horizontal(), [Some(384), Some(0), Some(288)]);
        assert_eq!(display.vertical(), [Some(264), Some(0), Some(224)]);
        assert_eq!(display.pixclock(), Some(6_144_000));
        assert!((display.refresh().unwrap() - 60.606_06).abs() < 1e-3);

        let pacman = db.find_machine("pacman").unwrap();
        let display = db.displays_of(pacman)[0];
        assert_eq!(display.pixclock(), None);
        assert_eq!(display.vertical(), [None, None, None]);

        let features = db.features_of(puckman);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].feature_type(), FeatureType::Sound);

        let neogeo = db.find_machine("neogeo").unwrap();
        let timing = db.features_of(neogeo)[0];
        assert_eq!(timing.status(), FeatureQuality::Unemulated);
        assert_eq!(timing.overall(), FeatureQuality::Imperfect);
        assert_eq!(names(&db, db.samples_of(neogeo).iter().map(|s| s.name)), ["unused"]);
    }

    #[test]
    fn test_configuration_round_trip() {
        let db = sample();
        let puckman = db.find_machine("puckman").unwrap();
        let configurations = db.configurations_of(puckman);
        assert_eq!(
            names(&db, configurations.iter().map(|c| c.name)),
            ["Coinage", "Bonus Life", "Cabinet"]
        );

        let coinage = db.settings_of(&configurations[0]);
        assert_eq!(coinage.len(), 3);
        assert_eq!(db.string(coinage[2].name).unwrap(), "Free Play");

        let bonus = db.settings_of(&configurations[1]);
        assert!(db.conditions_of(&bonus[0]).is_empty());
        let conditions = db.conditions_of(&bonus[1]);
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].relation(), Relation::Ne);
        let (mask, value) = (conditions[0].mask, conditions[0].value);
        assert_eq!((mask, value), (12, 12));

        let cabinet = db.settings_of(&configurations[2]);
        let upright = cabinet[0].value;
        assert_eq!(upright, 128);
    }

    #[test]
    fn test_devices_and_slots_round_trip() {
        let db = sample();
        let c64 = db.find_machine("c64").unwrap();

        let devices = db.devices_of(c64);
        assert_eq!(devices.len(), 2);
        assert_eq!(db.string(devices[0].extensions).unwrap(), "p00,prg,t64,");
        assert_eq!(db.string(devices[0].instance_name).unwrap(), "quickload");
        assert_eq!(db.string(devices[0].interface).unwrap(), "cbm_quik");
        assert_eq!(db.string(devices[1].extensions).unwrap(), "");
        assert!(devices[1].is_mandatory());

        let slots = db.slots_of(c64);
        assert_eq!(slots.len(), 2);
        let options = db.options_of(&slots[0]);
        assert_eq!(names(&db, options.iter().map(|o| o.devname)), ["c64_1700_reu", "c64_standard_cartridge"]);
        assert!(options[1].is_default());
        assert!(db.options_of(&slots[1]).is_empty());

        let lists = db.software_lists_of(c64);
        assert_eq!(lists[1].status(), SoftwareListStatus::Compatible);
        assert_eq!(db.string(lists[0].filter).unwrap(), "NTSC");

        let ram = db.ram_options_of(c64);
        let values: Vec<u64> = ram.iter().map(|r| r.value).collect();
        assert_eq!(values, [65536, 4096]);
        assert!(ram[0].is_default());
    }

    #[test]
    fn test_child_ranges_partition_tables() {
        let db = sample();
        let mut next_rom = 0;
        let mut ranges: Vec<ChildRange> = db.machines().iter().map(|m| m.roms).collect();
        ranges.sort_by_key(|r| r.index);
        for range in ranges {
            assert_eq!(range.index as usize, next_rom);
            next_rom += range.count as usize;
        }
        assert_eq!(next_rom, db.roms().len());
    }

    #[test]
    fn test_open_mapped_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&sample_bytes()).unwrap();
        file.flush().unwrap();

        let db = InfoDatabase::open(file.path()).unwrap();
        assert_eq!(db.machines().len(), 7);
        assert!(db.find_machine("puckman").is_some());
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = sample_bytes();
        bytes[0] ^= 0xFF;
        let result = InfoDatabase::from_vec(bytes);
        assert!(matches!(result, Err(Error::InvalidMagic { .. })));
    }

    #[test]
    fn test_rejects_schema_mismatch() {
        let mut bytes = sample_bytes();
        let salted = BinaryReader::new(&bytes).read_struct::<InfoHeader>().unwrap();
        let mut header = header::unsalt(&salted);
        header.sizes_hash = header.sizes_hash ^ 1;
        bytes[..InfoHeader::SIZE].copy_from_slice(header::salt(&header).as_bytes());

        let result = InfoDatabase::from_vec(bytes);
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let bytes = sample_bytes();
        assert!(matches!(
            InfoDatabase::parse(&bytes[..InfoHeader::SIZE - 1]),
            Err(Error::Truncated { .. })
        ));
        assert!(matches!(
            InfoDatabase::parse(&bytes[..InfoHeader::SIZE + 10]),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_rejects_corrupt_string_table() {
        let mut bytes = sample_bytes();
        let last = bytes.len() - 1;
        bytes[last] = b'X';
        assert!(matches!(
            InfoDatabase::from_vec(bytes),
            Err(Error::CorruptStringTable(_))
        ));
    }

    #[test]
    fn test_string_out_of_bounds() {
        let db = sample();
        let size = db.string_data().len() as u32;
        assert!(matches!(
            db.string(StringRef::from_raw(size)),
            Err(Error::StringOffsetOutOfBounds { .. })
        ));
        assert!(matches!(
            db.string(StringRef::from_raw(0)),
            Err(Error::StringOffsetOutOfBounds { .. })
        ));
        assert_eq!(db.string(StringRef::EMPTY).unwrap(), "");
    }

    #[test]
    fn test_children_out_of_range_is_empty() {
        let table = [1, 2, 3];
        assert_eq!(children(&table, ChildRange { index: 1, count: 2 }), [2, 3]);
        assert!(children(&table, ChildRange { index: 2, count: 5 }).is_empty());
    }
}
