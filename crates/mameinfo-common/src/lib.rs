//! Common utilities for mameinfo.
//!
//! This crate provides the low-level pieces shared by the database builder
//! and loader:
//!
//! - [`BinaryReader`] - Zero-copy cursor over byte slices, including slices of packed records
//! - [`crc`] - CRC32C hashing used for the schema fingerprint
//! - [`hex`] - Decoding of hex digests (CRC, SHA-1) into fixed-width byte arrays

mod error;
mod reader;

pub mod crc;
pub mod hex;

pub use error::{Error, Result};
pub use reader::BinaryReader;
