//! Device constants for the Crenova front-panel register file.
//!
//! These constants describe the fixed layout of the EEPROM: its bus address,
//! the size of the register file, and the registers that carry identity
//! data. Most users should not need to use these directly.

use std::time::Duration;

// ---- Bus ----

/// 7-bit slave address of the register file.
pub const EEPROM_ADDR: u8 = 0x3d;

/// Highest valid 7-bit slave address.
pub(crate) const MAX_SLAVE_ADDR: u8 = 0x7f;

/// Device node prefix for Linux I2C buses (`/dev/i2c-N`).
pub const I2C_DEV_PREFIX: &str = "/dev/i2c-";

// ---- Register file ----

/// Number of registers in the register file.
pub const REGISTER_COUNT: usize = 128;

/// Size of a single register in bytes.
pub const REGISTER_SIZE: usize = 8;

/// Highest valid register index.
pub const MAX_REGISTER: u8 = (REGISTER_COUNT - 1) as u8;

/// Well-known registers.
pub mod reg {
    /// Model code register.
    pub const MODEL: u8 = 0x75;
    /// Serial number register.
    pub const SERIAL: u8 = 0x76;
}

/// Byte range of the model / serial registers that holds the
/// identifying bytes used for MAC construction.
pub(crate) const ID_BYTES: std::ops::Range<usize> = 5..8;

// ---- MAC ----

/// Vendor OUI used as the first three MAC bytes (Opticum).
pub const VENDOR_OUI: [u8; 3] = [0x00, 0x25, 0xff];

// ---- Page write ----

/// log2 of the EEPROM write page size.
pub const CFG_EEPROM_PAGE_WRITE_BITS: u32 = 4;

/// Page settling delay after each write chunk (datasheet says 10 ms).
pub const CFG_EEPROM_PAGE_WRITE_DELAY: Duration = Duration::from_millis(11);

// ---- Board detection ----

/// System file naming the running box model.
pub const BOXTYPE_PATH: &str = "/proc/stb/info/boxtype";
