//! JSON rendering of machines for inspection.

use serde::Serialize;
use serde_json::Value;

use crate::database::InfoDatabase;
use crate::structs::*;
use crate::Result;

#[derive(Debug, Serialize)]
struct MachineJson {
    name: String,
    description: String,
    year: String,
    manufacturer: String,
    source_file: String,
    clone_of: Option<String>,
    rom_of: Option<String>,
    runnable: Option<bool>,
    is_bios: Option<bool>,
    is_device: Option<bool>,
    is_mechanical: Option<bool>,
    driver: DriverJson,
    sound_channels: Option<u8>,
    biossets: Vec<BiosSetJson>,
    roms: Vec<RomJson>,
    disks: Vec<DiskJson>,
    features: Vec<FeatureJson>,
    chips: Vec<ChipJson>,
    displays: Vec<DisplayJson>,
    samples: Vec<String>,
    configurations: Vec<ConfigurationJson>,
    devices: Vec<DeviceJson>,
    slots: Vec<SlotJson>,
    software_lists: Vec<SoftwareListJson>,
    ram_options: Vec<RamOptionJson>,
}

#[derive(Debug, Serialize)]
struct DriverJson {
    status: Option<&'static str>,
    emulation: Option<&'static str>,
    cocktail: Option<&'static str>,
    save_state_supported: Option<bool>,
    unofficial: Option<bool>,
    incomplete: Option<bool>,
}

#[derive(Debug, Serialize)]
struct BiosSetJson {
    name: String,
    description: String,
    default: bool,
}

#[derive(Debug, Serialize)]
struct RomJson {
    name: String,
    bios: String,
    merge: String,
    region: String,
    size: u32,
    offset: u64,
    crc: String,
    sha1: String,
    status: &'static str,
    optional: bool,
}

#[derive(Debug, Serialize)]
struct DiskJson {
    name: String,
    merge: String,
    region: String,
    sha1: String,
    index: u32,
    writable: bool,
    status: &'static str,
    optional: bool,
}

#[derive(Debug, Serialize)]
struct FeatureJson {
    #[serde(rename = "type")]
    feature_type: &'static str,
    status: &'static str,
    overall: &'static str,
}

#[derive(Debug, Serialize)]
struct ChipJson {
    name: String,
    tag: String,
    #[serde(rename = "type")]
    chip_type: &'static str,
    clock: u64,
}

#[derive(Debug, Serialize)]
struct DisplayJson {
    tag: String,
    #[serde(rename = "type")]
    display_type: &'static str,
    rotate: &'static str,
    flipx: Option<bool>,
    width: Option<u32>,
    height: Option<u32>,
    refresh: Option<f32>,
    pixclock: Option<u64>,
    horizontal: [Option<u32>; 3],
    vertical: [Option<u32>; 3],
}

#[derive(Debug, Serialize)]
struct ConfigurationJson {
    name: String,
    tag: String,
    mask: u32,
    settings: Vec<SettingJson>,
}

#[derive(Debug, Serialize)]
struct SettingJson {
    name: String,
    value: u32,
    conditions: Vec<ConditionJson>,
}

#[derive(Debug, Serialize)]
struct ConditionJson {
    tag: String,
    relation: &'static str,
    mask: u32,
    value: u32,
}

#[derive(Debug, Serialize)]
struct DeviceJson {
    #[serde(rename = "type")]
    device_type: String,
    tag: String,
    interface: String,
    instance: String,
    extensions: Vec<String>,
    mandatory: bool,
}

#[derive(Debug, Serialize)]
struct SlotJson {
    name: String,
    options: Vec<SlotOptionJson>,
}

#[derive(Debug, Serialize)]
struct SlotOptionJson {
    name: String,
    devname: String,
    default: bool,
}

#[derive(Debug, Serialize)]
struct SoftwareListJson {
    name: String,
    filter: String,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct RamOptionJson {
    name: String,
    value: u64,
    default: bool,
}

struct Exporter<'a> {
    db: &'a InfoDatabase,
}

impl Exporter<'_> {
    fn s(&self, r: StringRef) -> Result<String> {
        Ok(self.db.string(r)?.into_owned())
    }

    fn machine_name(&self, index: Option<u32>) -> Result<Option<String>> {
        index
            .and_then(|i| self.db.machine(i))
            .map(|parent| self.s(parent.name))
            .transpose()
    }

    fn machine(&self, m: &Machine) -> Result<MachineJson> {
        let db = self.db;
        Ok(MachineJson {
            name: self.s(m.name)?,
            description: self.s(m.description)?,
            year: self.s(m.year)?,
            manufacturer: self.s(m.manufacturer)?,
            source_file: self.s(m.source_file)?,
            clone_of: self.machine_name(m.clone_of_index())?,
            rom_of: self.machine_name(m.rom_of_index())?,
            runnable: m.runnable(),
            is_bios: m.is_bios(),
            is_device: m.is_device(),
            is_mechanical: m.is_mechanical(),
            driver: DriverJson {
                status: m.quality_status().map(|q| q.as_str()),
                emulation: m.quality_emulation().map(|q| q.as_str()),
                cocktail: m.quality_cocktail().map(|q| q.as_str()),
                save_state_supported: m.save_state_supported(),
                unofficial: m.unofficial(),
                incomplete: m.incomplete(),
            },
            sound_channels: m.sound_channels(),
            biossets: db
                .biossets_of(m)
                .iter()
                .map(|b| {
                    Ok(BiosSetJson {
                        name: self.s(b.name)?,
                        description: self.s(b.description)?,
                        default: b.is_default(),
                    })
                })
                .collect::<Result<_>>()?,
            roms: db.roms_of(m).iter().map(|r| self.rom(r)).collect::<Result<_>>()?,
            disks: db.disks_of(m).iter().map(|d| self.disk(d)).collect::<Result<_>>()?,
            features: db
                .features_of(m)
                .iter()
                .map(|f| FeatureJson {
                    feature_type: f.feature_type().as_str(),
                    status: f.status().as_str(),
                    overall: f.overall().as_str(),
                })
                .collect(),
            chips: db
                .chips_of(m)
                .iter()
                .map(|c| {
                    Ok(ChipJson {
                        name: self.s(c.name)?,
                        tag: self.s(c.tag)?,
                        chip_type: c.chip_type().as_str(),
                        clock: c.clock,
                    })
                })
                .collect::<Result<_>>()?,
            displays: db.displays_of(m).iter().map(|d| self.display(d)).collect::<Result<_>>()?,
            samples: db.samples_of(m).iter().map(|s| self.s(s.name)).collect::<Result<_>>()?,
            configurations: db
                .configurations_of(m)
                .iter()
                .map(|c| self.configuration(c))
                .collect::<Result<_>>()?,
            devices: db.devices_of(m).iter().map(|d| self.device(d)).collect::<Result<_>>()?,
            slots: db.slots_of(m).iter().map(|s| self.slot(s)).collect::<Result<_>>()?,
            software_lists: db
                .software_lists_of(m)
                .iter()
                .map(|l| {
                    Ok(SoftwareListJson {
                        name: self.s(l.name)?,
                        filter: self.s(l.filter)?,
                        status: l.status().as_str(),
                    })
                })
                .collect::<Result<_>>()?,
            ram_options: db
                .ram_options_of(m)
                .iter()
                .map(|r| {
                    Ok(RamOptionJson {
                        name: self.s(r.name)?,
                        value: r.value,
                        default: r.is_default(),
                    })
                })
                .collect::<Result<_>>()?,
        })
    }

    fn rom(&self, r: &Rom) -> Result<RomJson> {
        Ok(RomJson {
            name: self.s(r.name)?,
            bios: self.s(r.bios)?,
            merge: self.s(r.merge)?,
            region: self.s(r.region)?,
            size: r.size,
            offset: r.offset,
            crc: hex::encode(&r.crc),
            sha1: hex::encode(&r.sha1),
            status: r.status().as_str(),
            optional: r.is_optional(),
        })
    }

    fn disk(&self, d: &Disk) -> Result<DiskJson> {
        Ok(DiskJson {
            name: self.s(d.name)?,
            merge: self.s(d.merge)?,
            region: self.s(d.region)?,
            sha1: hex::encode(&d.sha1),
            index: d.index,
            writable: d.is_writable(),
            status: d.status().as_str(),
            optional: d.is_optional(),
        })
    }

    fn display(&self, d: &Display) -> Result<DisplayJson> {
        Ok(DisplayJson {
            tag: self.s(d.tag)?,
            display_type: d.display_type().as_str(),
            rotate: d.rotate().as_str(),
            flipx: d.flipx(),
            width: d.width(),
            height: d.height(),
            refresh: d.refresh(),
            pixclock: d.pixclock(),
            horizontal: d.horizontal(),
            vertical: d.vertical(),
        })
    }

    fn configuration(&self, c: &Configuration) -> Result<ConfigurationJson> {
        let settings = self
            .db
            .settings_of(c)
            .iter()
            .map(|setting| {
                let conditions = self
                    .db
                    .conditions_of(setting)
                    .iter()
                    .map(|condition| {
                        Ok(ConditionJson {
                            tag: self.s(condition.tag)?,
                            relation: condition.relation().as_str(),
                            mask: condition.mask,
                            value: condition.value,
                        })
                    })
                    .collect::<Result<_>>()?;
                Ok(SettingJson {
                    name: self.s(setting.name)?,
                    value: setting.value,
                    conditions,
                })
            })
            .collect::<Result<_>>()?;

        Ok(ConfigurationJson {
            name: self.s(c.name)?,
            tag: self.s(c.tag)?,
            mask: c.mask,
            settings,
        })
    }

    fn device(&self, d: &Device) -> Result<DeviceJson> {
        let extensions = self.s(d.extensions)?;
        Ok(DeviceJson {
            device_type: self.s(d.device_type)?,
            tag: self.s(d.tag)?,
            interface: self.s(d.interface)?,
            instance: self.s(d.instance_name)?,
            extensions: extensions
                .split(',')
                .filter(|ext| !ext.is_empty())
                .map(str::to_owned)
                .collect(),
            mandatory: d.is_mandatory(),
        })
    }

    fn slot(&self, s: &Slot) -> Result<SlotJson> {
        Ok(SlotJson {
            name: self.s(s.name)?,
            options: self
                .db
                .options_of(s)
                .iter()
                .map(|o| {
                    Ok(SlotOptionJson {
                        name: self.s(o.name)?,
                        devname: self.s(o.devname)?,
                        default: o.is_default(),
                    })
                })
                .collect::<Result<_>>()?,
        })
    }
}

/// Render a machine and all of its children as JSON.
pub fn machine_json(db: &InfoDatabase, machine: &Machine) -> Result<Value> {
    let json = Exporter { db }.machine(machine)?;
    Ok(serde_json::to_value(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BuildOptions, InfoBuilder};

    const SAMPLE: &str = include_str!("../testdata/sample.xml");

    fn sample() -> InfoDatabase {
        let mut builder = InfoBuilder::new();
        builder
            .process_xml(SAMPLE.as_bytes(), &BuildOptions::default(), |_| {})
            .unwrap();
        InfoDatabase::from_vec(builder.build().unwrap()).unwrap()
    }

    #[test]
    fn test_machine_json() {
        let db = sample();
        let pacman = db.find_machine("pacman").unwrap();
        let json = machine_json(&db, pacman).unwrap();

        assert_eq!(json["name"], "pacman");
        assert_eq!(json["clone_of"], "puckman");
        assert_eq!(json["rom_of"], "puckman");
        assert_eq!(json["driver"]["status"], "good");
        assert_eq!(json["driver"]["save_state_supported"], true);
        assert_eq!(json["is_bios"], Value::Null);
        assert_eq!(json["roms"][0]["crc"], "c1e6ab10");
        assert_eq!(json["roms"][1]["merge"], "pm1-3.1m");
        assert_eq!(json["roms"][1]["status"], "baddump");
        assert_eq!(json["displays"][0]["pixclock"], Value::Null);
        assert_eq!(json["displays"][0]["rotate"], "90");
    }

    #[test]
    fn test_serde_errors_propagate() {
        let err: crate::Error = serde_json::from_str::<Value>("{\"name\":").unwrap_err().into();
        assert!(matches!(err, crate::Error::Json(_)));
        assert!(err.to_string().starts_with("JSON error:"));
    }

    #[test]
    fn test_nested_children_json() {
        let db = sample();
        let c64 = db.find_machine("c64").unwrap();
        let json = machine_json(&db, c64).unwrap();

        assert_eq!(json["clone_of"], Value::Null);
        assert_eq!(json["devices"][0]["extensions"], serde_json::json!(["p00", "prg", "t64"]));
        assert_eq!(json["devices"][1]["extensions"], serde_json::json!([]));
        assert_eq!(json["slots"][0]["options"][1]["default"], true);
        assert_eq!(json["ram_options"][0]["value"], 65536);
        assert_eq!(json["software_lists"][1]["status"], "compatible");

        let puckman = db.find_machine("puckman").unwrap();
        let json = machine_json(&db, puckman).unwrap();
        let bonus = &json["configurations"][1];
        assert_eq!(bonus["name"], "Bonus Life");
        assert_eq!(bonus["settings"][1]["conditions"][0]["relation"], "ne");
    }
}
