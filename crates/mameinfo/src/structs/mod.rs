//! On-disk record definitions.
//!
//! Every record is `#[repr(C, packed)]`: the struct layout is the file
//! layout, and tables are dumped and mapped as plain arrays.

mod child_range;
mod configuration;
mod device;
mod hardware;
mod machine;
mod media;
mod string_ref;

pub use child_range::ChildRange;
pub use configuration::{Configuration, ConfigurationCondition, ConfigurationSetting};
pub use device::{Device, Slot, SlotOption};
pub use hardware::{Chip, Display, Feature, RamOption, Sample, SoftwareList};
pub use machine::Machine;
pub use media::{BiosSet, Disk, Rom};
pub use string_ref::{InlineStr, StringRef};
