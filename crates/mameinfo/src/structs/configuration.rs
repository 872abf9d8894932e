//! Configuration (DIP switch) records.
//!
//! `<configuration>`/`<dipswitch>` and `<confsetting>`/`<dipvalue>` share
//! these shapes.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::{ChildRange, StringRef};
use crate::encoding::decode_enum;
use crate::types::Relation;

#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct Configuration {
    pub name: StringRef,
    pub tag: StringRef,
    pub mask: u32,
    pub settings: ChildRange,
}

#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct ConfigurationSetting {
    pub name: StringRef,
    pub value: u32,
    pub conditions: ChildRange,
}

/// Condition gating a setting on another port's value.
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct ConfigurationCondition {
    pub tag: StringRef,
    pub mask: u32,
    pub value: u32,
    pub relation: u8,
}

impl ConfigurationCondition {
    pub fn relation(&self) -> Relation {
        decode_enum(self.relation).unwrap_or(Relation::Eq)
    }
}
