//! Info database builder.
//!
//! Streams `-listxml` output into flat record tables, resolves parent
//! machines and serializes the result.
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use mameinfo::{BuildOptions, InfoBuilder};
//!
//! let input = BufReader::new(File::open("listxml.xml")?);
//! let mut builder = InfoBuilder::new();
//! builder.process_xml(input, &BuildOptions::default(), |progress| {
//!     println!("{} {}", progress.machine_count, progress.name);
//! })?;
//! builder.write_to_file("mame.info")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use mameinfo_common::hex;
use zerocopy::IntoBytes;

use crate::encoding::{encode_bool, encode_enum, BOOL_UNSPECIFIED};
use crate::header::{self, InfoHeader, TableCounts};
use crate::resolve::{resolve_machine_references, ResolveReport};
use crate::string_table::StringTable;
use crate::structs::*;
use crate::types::*;
use crate::xml::{Attributes, Control, XmlParser};
use crate::{Error, Result};

/// Table reservations matching a full MAME 0.229 dump.
const RESERVATIONS: TableCounts = TableCounts {
    machines: 48_000,
    biossets: 36_000,
    roms: 350_000,
    disks: 1_400,
    devices: 11_000,
    slots: 12_000,
    slot_options: 90_000,
    features: 22_000,
    chips: 180_000,
    displays: 50_000,
    samples: 20_000,
    configurations: 600_000,
    configuration_settings: 1_700_000,
    configuration_conditions: 7_500,
    software_lists: 6_200,
    ram_options: 6_500,
};

const RESERVED_STRING_BYTES: usize = 8 << 20;
const RESERVED_STRINGS: usize = 400_000;

/// Options for a build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Pre-size tables for a full dump.
    pub reserve_capacity: bool,
    /// Raised by the caller to stop the build.
    pub abort: Option<Arc<AtomicBool>>,
}

/// Progress report sent after each machine.
#[derive(Debug, Clone, Copy)]
pub struct BuildProgress<'a> {
    /// Machines seen so far.
    pub machine_count: usize,
    pub name: &'a str,
    pub description: &'a str,
}

/// Convert a table size to a 32-bit index.
pub fn checked_index(value: usize, what: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::IndexOverflow {
        what,
        value: value as u64,
    })
}

/// Builder for info databases.
///
/// A builder is single-use: feed it one document with
/// [`process_xml`](Self::process_xml), then write it out.
#[derive(Debug, Default)]
pub struct InfoBuilder {
    machines: Vec<Machine>,
    biossets: Vec<BiosSet>,
    roms: Vec<Rom>,
    disks: Vec<Disk>,
    devices: Vec<Device>,
    slots: Vec<Slot>,
    slot_options: Vec<SlotOption>,
    features: Vec<Feature>,
    chips: Vec<Chip>,
    displays: Vec<Display>,
    samples: Vec<Sample>,
    configurations: Vec<Configuration>,
    configuration_settings: Vec<ConfigurationSetting>,
    configuration_conditions: Vec<ConfigurationCondition>,
    software_lists: Vec<SoftwareList>,
    ram_options: Vec<RamOption>,

    strings: StringTable,
    build: StringRef,
    salted_header: Option<InfoHeader>,
    resolve_report: ResolveReport,
}

impl InfoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn reserve(&mut self) {
        let r = RESERVATIONS;
        self.machines.reserve(r.machines as usize);
        self.biossets.reserve(r.biossets as usize);
        self.roms.reserve(r.roms as usize);
        self.disks.reserve(r.disks as usize);
        self.devices.reserve(r.devices as usize);
        self.slots.reserve(r.slots as usize);
        self.slot_options.reserve(r.slot_options as usize);
        self.features.reserve(r.features as usize);
        self.chips.reserve(r.chips as usize);
        self.displays.reserve(r.displays as usize);
        self.samples.reserve(r.samples as usize);
        self.configurations.reserve(r.configurations as usize);
        self.configuration_settings.reserve(r.configuration_settings as usize);
        self.configuration_conditions.reserve(r.configuration_conditions as usize);
        self.software_lists.reserve(r.software_lists as usize);
        self.ram_options.reserve(r.ram_options as usize);
        self.strings = StringTable::with_capacity(RESERVED_STRING_BYTES, RESERVED_STRINGS);
    }

    /// Parse a `-listxml` document, resolve machine references and compute the header.
    ///
    /// `progress` is called once per machine.
    ///
    /// # Panics
    ///
    /// Panics if the builder has already processed a document.
    pub fn process_xml<R, F>(&mut self, input: R, options: &BuildOptions, mut progress: F) -> Result<()>
    where
        R: BufRead,
        F: FnMut(&BuildProgress<'_>),
    {
        assert!(
            self.machines.is_empty() && self.devices.is_empty() && self.salted_header.is_none(),
            "InfoBuilder can only process one document"
        );

        if options.reserve_capacity {
            self.reserve();
        }

        let started = Instant::now();
        {
            let mut session = Session::new(self, &mut progress);
            Session::parser().parse(input, &mut session, options.abort.as_deref())?;
        }
        tracing::debug!(
            machines = self.machines.len(),
            roms = self.roms.len(),
            strings = self.strings.len(),
            elapsed = ?started.elapsed(),
            "parsed -listxml"
        );

        self.strings.finish();
        let counts = self.counts()?;

        let started = Instant::now();
        self.resolve_report = resolve_machine_references(&mut self.machines, &self.strings);
        tracing::debug!(
            resolved = self.resolve_report.resolved,
            dangling = self.resolve_report.dangling,
            elapsed = ?started.elapsed(),
            "resolved machine references"
        );

        self.salted_header = Some(header::salt(&InfoHeader::new(counts, self.build)));
        Ok(())
    }

    /// Current table sizes.
    pub fn counts(&self) -> Result<TableCounts> {
        Ok(TableCounts {
            machines: checked_index(self.machines.len(), "machine count")?,
            biossets: checked_index(self.biossets.len(), "biosset count")?,
            roms: checked_index(self.roms.len(), "rom count")?,
            disks: checked_index(self.disks.len(), "disk count")?,
            devices: checked_index(self.devices.len(), "device count")?,
            slots: checked_index(self.slots.len(), "slot count")?,
            slot_options: checked_index(self.slot_options.len(), "slot option count")?,
            features: checked_index(self.features.len(), "feature count")?,
            chips: checked_index(self.chips.len(), "chip count")?,
            displays: checked_index(self.displays.len(), "display count")?,
            samples: checked_index(self.samples.len(), "sample count")?,
            configurations: checked_index(self.configurations.len(), "configuration count")?,
            configuration_settings: checked_index(
                self.configuration_settings.len(),
                "configuration setting count",
            )?,
            configuration_conditions: checked_index(
                self.configuration_conditions.len(),
                "configuration condition count",
            )?,
            software_lists: checked_index(self.software_lists.len(), "software list count")?,
            ram_options: checked_index(self.ram_options.len(), "ram option count")?,
        })
    }

    /// The unsalted header, once a document has been processed.
    pub fn header(&self) -> Option<InfoHeader> {
        self.salted_header.as_ref().map(header::unsalt)
    }

    /// Outcome of machine reference resolution.
    pub fn resolve_report(&self) -> ResolveReport {
        self.resolve_report
    }

    /// Machines, sorted by name after processing.
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn strings(&self) -> &StringTable {
        &self.strings
    }

    /// Write the database to a writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let salted = self.salted_header.ok_or(Error::NotProcessed)?;

        writer.write_all(salted.as_bytes())?;
        writer.write_all(self.machines.as_bytes())?;
        writer.write_all(self.biossets.as_bytes())?;
        writer.write_all(self.roms.as_bytes())?;
        writer.write_all(self.disks.as_bytes())?;
        writer.write_all(self.devices.as_bytes())?;
        writer.write_all(self.slots.as_bytes())?;
        writer.write_all(self.slot_options.as_bytes())?;
        writer.write_all(self.features.as_bytes())?;
        writer.write_all(self.chips.as_bytes())?;
        writer.write_all(self.displays.as_bytes())?;
        writer.write_all(self.samples.as_bytes())?;
        writer.write_all(self.configurations.as_bytes())?;
        writer.write_all(self.configuration_settings.as_bytes())?;
        writer.write_all(self.configuration_conditions.as_bytes())?;
        writer.write_all(self.software_lists.as_bytes())?;
        writer.write_all(self.ram_options.as_bytes())?;
        writer.write_all(self.strings.data())?;
        Ok(())
    }

    /// Build the database and return the raw bytes.
    pub fn build(&self) -> Result<Vec<u8>> {
        let tables = self.counts()?.tables_size() as usize;
        let mut output = Vec::with_capacity(InfoHeader::SIZE + tables + self.strings.data().len());
        self.write_to(&mut output)?;
        Ok(output)
    }

    /// Write the database to a file, creating parent directories.
    ///
    /// A partially written file is removed.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let output_error = |source| Error::Output {
            path: path.to_path_buf(),
            source,
        };

        if self.salted_header.is_none() {
            return Err(Error::NotProcessed);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(output_error)?;
        }

        let file = File::create(path).map_err(output_error)?;
        let mut writer = BufWriter::new(file);
        let written = self
            .write_to(&mut writer)
            .and_then(|()| writer.flush().map_err(Error::Io));

        match written {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "wrote info database");
                Ok(())
            }
            Err(e) => {
                drop(writer);
                let _ = fs::remove_file(path);
                Err(match e {
                    Error::Io(source) => output_error(source),
                    other => other,
                })
            }
        }
    }
}

/// Parse state: the builder plus the current parent of each nesting level.
struct Session<'a> {
    db: &'a mut InfoBuilder,
    progress: &'a mut dyn FnMut(&BuildProgress<'_>),

    machine: Option<usize>,
    configuration: Option<usize>,
    setting: Option<usize>,
    slot: Option<usize>,
    device: Option<usize>,
    ram_option: Option<usize>,

    device_extensions: String,
    machine_name: String,
    machine_description: String,
}

fn push<T>(table: &mut Vec<T>, record: T, what: &'static str) -> Result<usize> {
    checked_index(table.len(), what)?;
    table.push(record);
    Ok(table.len() - 1)
}

fn current<'t, T>(table: &'t mut [T], cursor: Option<usize>, element: &str) -> Result<&'t mut T> {
    cursor
        .and_then(move |index| table.get_mut(index))
        .ok_or_else(|| Error::Xml {
            message: format!("<{element}> has no enclosing parent"),
        })
}

fn grow(range: ChildRange, what: &'static str) -> Result<ChildRange> {
    range.grown().ok_or(Error::IndexOverflow {
        what,
        value: u64::from(u32::MAX) + 1,
    })
}

fn start_of(len: usize, what: &'static str) -> Result<ChildRange> {
    checked_index(len, what).map(ChildRange::starting_at)
}

/// Flag attribute that defaults to false.
fn flag(attrs: &Attributes, name: &str) -> u8 {
    encode_bool(Some(attrs.get_bool(name).unwrap_or(false)))
}

const MACHINE: &[&str] = &["mame", "machine"];

impl<'a> Session<'a> {
    fn new(db: &'a mut InfoBuilder, progress: &'a mut dyn FnMut(&BuildProgress<'_>)) -> Self {
        Self {
            db,
            progress,
            machine: None,
            configuration: None,
            setting: None,
            slot: None,
            device: None,
            ram_option: None,
            device_extensions: String::new(),
            machine_name: String::new(),
            machine_description: String::new(),
        }
    }

    fn parser() -> XmlParser<Self> {
        let mut xml = XmlParser::new();
        xml.on_begin(&[&["mame"]], Self::begin_mame)
            .on_begin(&[MACHINE], Self::begin_machine)
            .on_end(&[MACHINE], Self::end_machine)
            .on_end(&[&["mame", "machine", "description"]], Self::end_description)
            .on_end(&[&["mame", "machine", "year"]], Self::end_year)
            .on_end(&[&["mame", "machine", "manufacturer"]], Self::end_manufacturer)
            .on_begin(&[&["mame", "machine", "biosset"]], Self::begin_biosset)
            .on_begin(&[&["mame", "machine", "rom"]], Self::begin_rom)
            .on_begin(&[&["mame", "machine", "disk"]], Self::begin_disk)
            .on_begin(&[&["mame", "machine", "device_ref"]], Self::skip)
            .on_begin(&[&["mame", "machine", "sample"]], Self::begin_sample)
            .on_begin(&[&["mame", "machine", "chip"]], Self::begin_chip)
            .on_begin(&[&["mame", "machine", "display"]], Self::begin_display)
            .on_begin(&[&["mame", "machine", "sound"]], Self::begin_sound)
            .on_begin(&[&["mame", "machine", "input"]], Self::skip)
            .on_begin(&[&["mame", "machine", "port"]], Self::skip)
            .on_begin(
                &[
                    &["mame", "machine", "configuration"],
                    &["mame", "machine", "dipswitch"],
                ],
                Self::begin_configuration,
            )
            .on_begin(
                &[
                    &["mame", "machine", "configuration", "confsetting"],
                    &["mame", "machine", "dipswitch", "dipvalue"],
                ],
                Self::begin_setting,
            )
            .on_begin(
                &[
                    &["mame", "machine", "configuration", "confsetting", "condition"],
                    &["mame", "machine", "dipswitch", "dipvalue", "condition"],
                ],
                Self::begin_condition,
            )
            .on_begin(&[&["mame", "machine", "driver"]], Self::begin_driver)
            .on_begin(&[&["mame", "machine", "feature"]], Self::begin_feature)
            .on_begin(&[&["mame", "machine", "device"]], Self::begin_device)
            .on_end(&[&["mame", "machine", "device"]], Self::end_device)
            .on_begin(&[&["mame", "machine", "device", "instance"]], Self::begin_instance)
            .on_begin(&[&["mame", "machine", "device", "extension"]], Self::begin_extension)
            .on_begin(&[&["mame", "machine", "slot"]], Self::begin_slot)
            .on_begin(&[&["mame", "machine", "slot", "slotoption"]], Self::begin_slot_option)
            .on_begin(&[&["mame", "machine", "softwarelist"]], Self::begin_software_list)
            .on_begin(&[&["mame", "machine", "ramoption"]], Self::begin_ram_option)
            .on_end(&[&["mame", "machine", "ramoption"]], Self::end_ram_option);
        xml
    }

    fn string(&mut self, attrs: &Attributes, name: &str) -> Result<StringRef> {
        self.db.strings.get_opt(attrs.get(name))
    }

    fn machine(&mut self, element: &str) -> Result<&mut Machine> {
        current(&mut self.db.machines, self.machine, element)
    }

    fn skip(&mut self, _: &Attributes) -> Result<Control> {
        Ok(Control::Skip)
    }

    fn begin_mame(&mut self, attrs: &Attributes) -> Result<Control> {
        self.db.build = self.string(attrs, "build")?;
        Ok(Control::Continue)
    }

    fn begin_machine(&mut self, attrs: &Attributes) -> Result<Control> {
        let name = self.string(attrs, "name")?;
        let source_file = self.string(attrs, "sourcefile")?;
        // Parent names stay string references until the resolver runs.
        let clone_of = self.string(attrs, "cloneof")?.raw();
        let rom_of = self.string(attrs, "romof")?.raw();

        let db = &mut *self.db;
        let machine = Machine {
            name,
            source_file,
            description: StringRef::EMPTY,
            year: StringRef::EMPTY,
            manufacturer: StringRef::EMPTY,
            clone_of,
            rom_of,
            biossets: start_of(db.biossets.len(), "biosset index")?,
            roms: start_of(db.roms.len(), "rom index")?,
            disks: start_of(db.disks.len(), "disk index")?,
            features: start_of(db.features.len(), "feature index")?,
            chips: start_of(db.chips.len(), "chip index")?,
            displays: start_of(db.displays.len(), "display index")?,
            samples: start_of(db.samples.len(), "sample index")?,
            configurations: start_of(db.configurations.len(), "configuration index")?,
            software_lists: start_of(db.software_lists.len(), "software list index")?,
            ram_options: start_of(db.ram_options.len(), "ram option index")?,
            devices: start_of(db.devices.len(), "device index")?,
            slots: start_of(db.slots.len(), "slot index")?,
            runnable: encode_bool(Some(attrs.get_bool("runnable").unwrap_or(true))),
            is_bios: encode_bool(attrs.get_bool("isbios")),
            is_device: encode_bool(attrs.get_bool("isdevice")),
            is_mechanical: encode_bool(attrs.get_bool("ismechanical")),
            quality_status: DriverQuality::Unknown.into(),
            quality_emulation: DriverQuality::Unknown.into(),
            quality_cocktail: DriverQuality::Unknown.into(),
            save_state_supported: BOOL_UNSPECIFIED,
            unofficial: BOOL_UNSPECIFIED,
            incomplete: BOOL_UNSPECIFIED,
            sound_channels: u8::MAX,
        };

        self.machine = Some(push(&mut db.machines, machine, "machine index")?);
        self.configuration = None;
        self.setting = None;
        self.slot = None;
        self.device = None;
        self.ram_option = None;
        self.machine_name.clear();
        self.machine_name.push_str(attrs.get("name").unwrap_or_default());
        self.machine_description.clear();
        Ok(Control::Continue)
    }

    fn end_machine(&mut self, _: String) -> Result<()> {
        (self.progress)(&BuildProgress {
            machine_count: self.db.machines.len(),
            name: &self.machine_name,
            description: &self.machine_description,
        });
        self.machine = None;
        Ok(())
    }

    fn end_description(&mut self, text: String) -> Result<()> {
        let r = self.db.strings.get(&text)?;
        self.machine("description")?.description = r;
        self.machine_description = text;
        Ok(())
    }

    fn end_year(&mut self, text: String) -> Result<()> {
        let r = self.db.strings.get(&text)?;
        self.machine("year")?.year = r;
        Ok(())
    }

    fn end_manufacturer(&mut self, text: String) -> Result<()> {
        let r = self.db.strings.get(&text)?;
        self.machine("manufacturer")?.manufacturer = r;
        Ok(())
    }

    fn begin_biosset(&mut self, attrs: &Attributes) -> Result<Control> {
        let biosset = BiosSet {
            name: self.string(attrs, "name")?,
            description: self.string(attrs, "description")?,
            default: flag(attrs, "default"),
        };
        push(&mut self.db.biossets, biosset, "biosset index")?;
        let machine = self.machine("biosset")?;
        machine.biossets = grow(machine.biossets, "biosset count")?;
        Ok(Control::Continue)
    }

    fn begin_rom(&mut self, attrs: &Attributes) -> Result<Control> {
        let rom = Rom {
            name: self.string(attrs, "name")?,
            bios: self.string(attrs, "bios")?,
            merge: self.string(attrs, "merge")?,
            region: self.string(attrs, "region")?,
            size: attrs.get_u32("size").unwrap_or(0),
            offset: attrs.get_u64_radix("offset", 16).unwrap_or(0),
            crc: hex::digest(attrs.get("crc")),
            sha1: hex::digest(attrs.get("sha1")),
            status: encode_enum(attrs.get_with("status", DumpStatus::from_attr), DumpStatus::Good.into()),
            optional: flag(attrs, "optional"),
        };
        push(&mut self.db.roms, rom, "rom index")?;
        let machine = self.machine("rom")?;
        machine.roms = grow(machine.roms, "rom count")?;
        Ok(Control::Continue)
    }

    fn begin_disk(&mut self, attrs: &Attributes) -> Result<Control> {
        let disk = Disk {
            name: self.string(attrs, "name")?,
            merge: self.string(attrs, "merge")?,
            region: self.string(attrs, "region")?,
            sha1: hex::digest(attrs.get("sha1")),
            index: attrs.get_u32("index").unwrap_or(0),
            writable: flag(attrs, "writable"),
            status: encode_enum(attrs.get_with("status", DumpStatus::from_attr), DumpStatus::Good.into()),
            optional: flag(attrs, "optional"),
        };
        push(&mut self.db.disks, disk, "disk index")?;
        let machine = self.machine("disk")?;
        machine.disks = grow(machine.disks, "disk count")?;
        Ok(Control::Continue)
    }

    fn begin_sample(&mut self, attrs: &Attributes) -> Result<Control> {
        let sample = Sample {
            name: self.string(attrs, "name")?,
        };
        push(&mut self.db.samples, sample, "sample index")?;
        let machine = self.machine("sample")?;
        machine.samples = grow(machine.samples, "sample count")?;
        Ok(Control::Continue)
    }

    fn begin_chip(&mut self, attrs: &Attributes) -> Result<Control> {
        let chip = Chip {
            name: self.string(attrs, "name")?,
            tag: self.string(attrs, "tag")?,
            clock: attrs.get_u64("clock").unwrap_or(0),
            chip_type: encode_enum(attrs.get_with("type", ChipType::from_attr), ChipType::Cpu.into()),
        };
        push(&mut self.db.chips, chip, "chip index")?;
        let machine = self.machine("chip")?;
        machine.chips = grow(machine.chips, "chip count")?;
        Ok(Control::Continue)
    }

    fn begin_display(&mut self, attrs: &Attributes) -> Result<Control> {
        let unknown = |name: &str| attrs.get_u32(name).unwrap_or(u32::MAX);
        let display = Display {
            tag: self.string(attrs, "tag")?,
            width: unknown("width"),
            height: unknown("height"),
            refresh: attrs.get_f32("refresh").unwrap_or(f32::NAN),
            pixclock: attrs.get_u64("pixclock").unwrap_or(u64::MAX),
            htotal: unknown("htotal"),
            hbend: unknown("hbend"),
            hbstart: unknown("hbstart"),
            vtotal: unknown("vtotal"),
            vbend: unknown("vbend"),
            vbstart: unknown("vbstart"),
            display_type: encode_enum(
                attrs.get_with("type", DisplayType::from_attr),
                DisplayType::Unknown.into(),
            ),
            rotate: encode_enum(attrs.get_with("rotate", Rotation::from_attr), Rotation::Rot0.into()),
            flipx: encode_bool(attrs.get_bool("flipx")),
        };
        push(&mut self.db.displays, display, "display index")?;
        let machine = self.machine("display")?;
        machine.displays = grow(machine.displays, "display count")?;
        Ok(Control::Continue)
    }

    fn begin_sound(&mut self, attrs: &Attributes) -> Result<Control> {
        self.machine("sound")?.sound_channels = attrs.get_u8("channels").unwrap_or(u8::MAX);
        Ok(Control::Continue)
    }

    fn begin_configuration(&mut self, attrs: &Attributes) -> Result<Control> {
        let configuration = Configuration {
            name: self.string(attrs, "name")?,
            tag: self.string(attrs, "tag")?,
            mask: attrs.get_u32("mask").unwrap_or(0),
            settings: start_of(self.db.configuration_settings.len(), "configuration setting index")?,
        };
        let index = push(&mut self.db.configurations, configuration, "configuration index")?;
        let machine = self.machine("configuration")?;
        machine.configurations = grow(machine.configurations, "configuration count")?;
        self.configuration = Some(index);
        self.setting = None;
        Ok(Control::Continue)
    }

    fn begin_setting(&mut self, attrs: &Attributes) -> Result<Control> {
        let setting = ConfigurationSetting {
            name: self.string(attrs, "name")?,
            value: attrs.get_u32("value").unwrap_or(0),
            conditions: start_of(self.db.configuration_conditions.len(), "configuration condition index")?,
        };
        let index = push(&mut self.db.configuration_settings, setting, "configuration setting index")?;
        let configuration = current(&mut self.db.configurations, self.configuration, "confsetting")?;
        configuration.settings = grow(configuration.settings, "configuration setting count")?;
        self.setting = Some(index);
        Ok(Control::Continue)
    }

    fn begin_condition(&mut self, attrs: &Attributes) -> Result<Control> {
        let condition = ConfigurationCondition {
            tag: self.string(attrs, "tag")?,
            mask: attrs.get_u32("mask").unwrap_or(0),
            value: attrs.get_u32("value").unwrap_or(0),
            relation: encode_enum(attrs.get_with("relation", Relation::from_attr), Relation::Eq.into()),
        };
        push(&mut self.db.configuration_conditions, condition, "configuration condition index")?;
        let setting = current(&mut self.db.configuration_settings, self.setting, "condition")?;
        setting.conditions = grow(setting.conditions, "configuration condition count")?;
        Ok(Control::Continue)
    }

    fn begin_driver(&mut self, attrs: &Attributes) -> Result<Control> {
        let machine = self.machine("driver")?;
        let quality = |name: &str, previous: u8| encode_enum(attrs.get_with(name, DriverQuality::from_attr), previous);
        let tri_state = |value: Option<bool>, previous: u8| value.map_or(previous, |b| encode_bool(Some(b)));

        machine.quality_status = quality("status", machine.quality_status);
        machine.quality_emulation = quality("emulation", machine.quality_emulation);
        machine.quality_cocktail = quality("cocktail", machine.quality_cocktail);
        machine.save_state_supported = tri_state(
            attrs.get_with("savestate", parse_supported),
            machine.save_state_supported,
        );
        machine.unofficial = tri_state(attrs.get_bool("unofficial"), machine.unofficial);
        machine.incomplete = tri_state(attrs.get_bool("incomplete"), machine.incomplete);
        Ok(Control::Continue)
    }

    fn begin_feature(&mut self, attrs: &Attributes) -> Result<Control> {
        let quality = |name: &str| {
            encode_enum(attrs.get_with(name, FeatureQuality::from_attr), FeatureQuality::Unknown.into())
        };
        let feature = Feature {
            feature_type: encode_enum(attrs.get_with("type", FeatureType::from_attr), FeatureType::Unknown.into()),
            status: quality("status"),
            overall: quality("overall"),
        };
        push(&mut self.db.features, feature, "feature index")?;
        let machine = self.machine("feature")?;
        machine.features = grow(machine.features, "feature count")?;
        Ok(Control::Continue)
    }

    fn begin_device(&mut self, attrs: &Attributes) -> Result<Control> {
        let device = Device {
            device_type: self.string(attrs, "type")?,
            tag: self.string(attrs, "tag")?,
            interface: self.string(attrs, "interface")?,
            instance_name: StringRef::EMPTY,
            extensions: StringRef::EMPTY,
            mandatory: flag(attrs, "mandatory"),
        };
        let index = push(&mut self.db.devices, device, "device index")?;
        let machine = self.machine("device")?;
        machine.devices = grow(machine.devices, "device count")?;
        self.device = Some(index);
        self.device_extensions.clear();
        Ok(Control::Continue)
    }

    fn end_device(&mut self, _: String) -> Result<()> {
        if !self.device_extensions.is_empty() {
            let r = self.db.strings.get(&self.device_extensions)?;
            current(&mut self.db.devices, self.device, "device")?.extensions = r;
        }
        self.device = None;
        Ok(())
    }

    fn begin_instance(&mut self, attrs: &Attributes) -> Result<Control> {
        let r = self.string(attrs, "name")?;
        current(&mut self.db.devices, self.device, "instance")?.instance_name = r;
        Ok(Control::Continue)
    }

    fn begin_extension(&mut self, attrs: &Attributes) -> Result<Control> {
        if let Some(name) = attrs.get("name") {
            self.device_extensions.push_str(name);
            self.device_extensions.push(',');
        }
        Ok(Control::Continue)
    }

    fn begin_slot(&mut self, attrs: &Attributes) -> Result<Control> {
        let slot = Slot {
            name: self.string(attrs, "name")?,
            options: start_of(self.db.slot_options.len(), "slot option index")?,
        };
        let index = push(&mut self.db.slots, slot, "slot index")?;
        let machine = self.machine("slot")?;
        machine.slots = grow(machine.slots, "slot count")?;
        self.slot = Some(index);
        Ok(Control::Continue)
    }

    fn begin_slot_option(&mut self, attrs: &Attributes) -> Result<Control> {
        let option = SlotOption {
            name: self.string(attrs, "name")?,
            devname: self.string(attrs, "devname")?,
            is_default: flag(attrs, "default"),
        };
        push(&mut self.db.slot_options, option, "slot option index")?;
        let slot = current(&mut self.db.slots, self.slot, "slotoption")?;
        slot.options = grow(slot.options, "slot option count")?;
        Ok(Control::Continue)
    }

    fn begin_software_list(&mut self, attrs: &Attributes) -> Result<Control> {
        let software_list = SoftwareList {
            name: self.string(attrs, "name")?,
            filter: self.string(attrs, "filter")?,
            status: encode_enum(
                attrs.get_with("status", SoftwareListStatus::from_attr),
                SoftwareListStatus::Original.into(),
            ),
        };
        push(&mut self.db.software_lists, software_list, "software list index")?;
        let machine = self.machine("softwarelist")?;
        machine.software_lists = grow(machine.software_lists, "software list count")?;
        Ok(Control::Continue)
    }

    fn begin_ram_option(&mut self, attrs: &Attributes) -> Result<Control> {
        let ram_option = RamOption {
            name: self.string(attrs, "name")?,
            value: 0,
            is_default: flag(attrs, "default"),
        };
        let index = push(&mut self.db.ram_options, ram_option, "ram option index")?;
        let machine = self.machine("ramoption")?;
        machine.ram_options = grow(machine.ram_options, "ram option count")?;
        self.ram_option = Some(index);
        Ok(Control::Continue)
    }

    fn end_ram_option(&mut self, text: String) -> Result<()> {
        let value = text.trim().parse::<u64>().unwrap_or(0);
        current(&mut self.db.ram_options, self.ram_option, "ramoption")?.value = value;
        self.ram_option = None;
        Ok(())
    }
}
