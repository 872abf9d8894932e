//! Post-pass that sorts machines and turns parent names into indices.

use std::hash::BuildHasherDefault;

use hashbrown::HashMap as FastHashMap;
use rustc_hash::FxHasher;

use crate::encoding::NO_MACHINE;
use crate::string_table::StringTable;
use crate::structs::{Machine, StringRef};

type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Outcome of [`resolve_machine_references`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// References that pointed at a machine in the set.
    pub resolved: usize,
    /// References naming a machine that does not exist; stored as [`NO_MACHINE`].
    pub dangling: usize,
}

/// Sort `machines` by name and rewrite `clone_of`/`rom_of` from name
/// references to machine indices.
///
/// The sort is stable and compares names byte-wise, so lookups can binary
/// search the table. An empty reference means "no parent".
pub fn resolve_machine_references(machines: &mut [Machine], strings: &StringTable) -> ResolveReport {
    machines.sort_by_cached_key(|machine| strings.lookup(machine.name).into_owned());

    let mut index_of: FxHashMap<u32, u32> =
        FxHashMap::with_capacity_and_hasher(machines.len() + 1, Default::default());
    index_of.insert(StringRef::EMPTY.raw(), NO_MACHINE);
    for (index, machine) in machines.iter().enumerate() {
        // Table size was already checked against 32 bits while building.
        index_of.entry(machine.name.raw()).or_insert(index as u32);
    }

    let mut report = ResolveReport::default();
    let mut resolve = |raw: u32, machine: StringRef, relation: &'static str| -> u32 {
        match index_of.get(&raw) {
            Some(&NO_MACHINE) => NO_MACHINE,
            Some(&index) => {
                report.resolved += 1;
                index
            }
            None => {
                report.dangling += 1;
                tracing::warn!(
                    machine = %strings.lookup(machine),
                    parent = %strings.lookup(StringRef::from_raw(raw)),
                    "unresolved {relation} reference"
                );
                NO_MACHINE
            }
        }
    };

    for machine in machines.iter_mut() {
        let name = machine.name;
        machine.clone_of = resolve(machine.clone_of, name, "cloneof");
        machine.rom_of = resolve(machine.rom_of, name, "romof");
    }

    report
}
