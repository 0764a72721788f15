//! Register file access: MAC derivation, register dumps and writes.
//!
//! The front-panel EEPROM exposes 128 registers of 8 bytes each. This
//! module provides:
//!
//! - [`RegisterFile`] - Reads registers and derives the [`MacAddress`]
//!   from the serial-number register.
//! - [`RegisterDump`] - A full snapshot of the register file with a hex /
//!   ASCII table rendering.
//!
//! [`MacAddress`]: crate::MacAddress

mod dump;
mod io;

pub use dump::RegisterDump;
pub use io::RegisterFile;
