//! MAME machine info database compiler and loader.
//!
//! Turns the XML produced by `mame -listxml` into a compact binary file:
//! a salted header, sixteen fixed-size record tables and a deduplicated
//! string blob. The file can be memory-mapped back with [`InfoDatabase`]
//! and its tables read without copying.
//!
//! # Modules
//!
//! - [`string_table`] - Deduplicated strings with inline short references
//! - [`xml`] - Streaming XML dispatch keyed by element path
//! - [`builder`] - `-listxml` handlers filling the record tables
//! - [`resolve`] - Machine sorting and parent reference resolution
//! - [`header`] - File header, schema fingerprint and salt
//! - [`database`] - Loading and querying a written database
//!
//! # Example
//!
//! ```no_run
//! use std::io::BufReader;
//! use std::path::Path;
//!
//! use mameinfo::{build_info_file, BuildOptions, BuildOutcome, InfoDatabase};
//!
//! let xml = BufReader::new(std::fs::File::open("listxml.xml")?);
//! let outcome = build_info_file(xml, Path::new("mame.info"), &BuildOptions::default(), |_| {});
//! if let BuildOutcome::Success(summary) = outcome {
//!     println!("{} machines", { summary.counts.machines });
//! }
//!
//! let db = InfoDatabase::open("mame.info")?;
//! if let Some(machine) = db.find_machine("pacman") {
//!     println!("{}", db.string(machine.description)?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod database;
pub mod encoding;
pub mod error;
#[cfg(feature = "json-export")]
pub mod export;
pub mod header;
pub mod resolve;
pub mod string_table;
pub mod structs;
pub mod task;
pub mod types;
pub mod xml;

pub use builder::{checked_index, BuildOptions, BuildProgress, InfoBuilder};
pub use database::{children, InfoDatabase};
pub use encoding::NO_MACHINE;
pub use error::{Error, Result};
pub use header::{InfoHeader, TableCounts};
pub use resolve::{resolve_machine_references, ResolveReport};
pub use string_table::StringTable;
pub use structs::*;
pub use task::{build_info_file, BuildOutcome, BuildSummary, PARSE_ERROR_PREFIX};
pub use types::*;

#[cfg(feature = "json-export")]
pub use export::machine_json;

/// Re-export common crate.
pub use mameinfo_common as common;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
