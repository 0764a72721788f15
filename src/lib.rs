//! Read the MAC address and register file of the front-panel EEPROM found
//! in Crenova-built set-top boxes (Opticum HD 9600 family, Atemio 520).
//!
//! The EEPROM sits at I2C address `0x3d` and exposes 128 registers of 8
//! bytes each. The box MAC address is built from the vendor OUI `00:25:ff`
//! and the last three bytes of the serial-number register `0x76`. Access
//! goes through the Linux `/dev/i2c-N` character devices using combined
//! `I2C_RDWR` transactions.
//!
//! # Quick Start
//!
//! ```no_run
//! use crenova_eeprom::{board::BusSelection, i2c::LinuxBus, RegisterFile};
//!
//! let selected = BusSelection::new().resolve();
//! let mut bus = LinuxBus::open(selected.index)?;
//! let mac = RegisterFile::new().mac_address(&mut bus)?;
//! println!("{mac}");
//! # Ok::<(), crenova_eeprom::Error>(())
//! ```
//!
//! # Features
//!
//! - **Transaction engine**: two-message register reads and page-aligned
//!   writes over any [`I2cTransport`] ([`i2c`]).
//! - **Register file**: register reads, MAC derivation, full dumps
//!   ([`eeprom`]). Dumps, writes and the model-register MAC prefix are
//!   opt-in through [`Features`].
//! - **Bus selection**: box model to bus mapping ([`board`]).
//! - **`embedded-hal`**: with the `embedded-hal` cargo feature,
//!   [`LinuxBus`](i2c::LinuxBus) implements `embedded_hal::i2c::I2c` and
//!   any `embedded_hal::i2c::I2c` can carry the register file.
//! - **Testing**: with the `mock` cargo feature, `mock::MockBus` simulates
//!   the register file in memory.

pub mod board;
pub mod constants;
pub mod eeprom;
pub mod error;
#[cfg(feature = "embedded-hal")]
pub mod hal;
pub mod i2c;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;

// ---- Convenience re-exports ----

pub use eeprom::{RegisterDump, RegisterFile};
pub use error::{Error, Result};
pub use i2c::I2cTransport;
pub use types::*;

/// Derive the MAC address using the production configuration.
///
/// Shorthand for `RegisterFile::new().mac_address(bus)`.
pub fn mac_address<B: I2cTransport + ?Sized>(bus: &mut B) -> Result<MacAddress> {
    RegisterFile::new().mac_address(bus)
}
