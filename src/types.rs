//! Type definitions for the register file and the values derived from it.
//!
//! Wire data is modelled with fixed-size arrays: a [`Register`] is always
//! exactly [`REGISTER_SIZE`] bytes, a [`MacAddress`] is always six. A value
//! of either type only exists once every byte of it has been read.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    CFG_EEPROM_PAGE_WRITE_BITS, CFG_EEPROM_PAGE_WRITE_DELAY, ID_BYTES, REGISTER_SIZE,
};

/// A 48-bit Ethernet MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Create a MAC address from its six bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Join a three byte OUI and a three byte device suffix.
    pub const fn from_parts(oui: [u8; 3], suffix: [u8; 3]) -> Self {
        Self([oui[0], oui[1], oui[2], suffix[0], suffix[1], suffix[2]])
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// The Organizationally Unique Identifier (first three bytes).
    pub fn oui(&self) -> [u8; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

/// Lowercase, colon-separated: `00:25:ff:aa:bb:cc`.
impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Error returned when parsing a [`MacAddress`] from a string fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseMacError;

impl fmt::Display for ParseMacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected six colon-separated hex octets")
    }
}

impl std::error::Error for ParseMacError {}

impl FromStr for MacAddress {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or(ParseMacError)?;
            if part.len() != 2 {
                return Err(ParseMacError);
            }
            *byte = u8::from_str_radix(part, 16).map_err(|_| ParseMacError)?;
        }
        if parts.next().is_some() {
            return Err(ParseMacError);
        }
        Ok(Self(bytes))
    }
}

/// One 8-byte register read from the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register {
    index: u8,
    bytes: [u8; REGISTER_SIZE],
}

impl Register {
    /// Wrap the bytes read from register `index`.
    pub const fn new(index: u8, bytes: [u8; REGISTER_SIZE]) -> Self {
        Self { index, bytes }
    }

    /// Register index (0..=127).
    pub fn index(&self) -> u8 {
        self.index
    }

    /// The raw register contents.
    pub fn bytes(&self) -> &[u8; REGISTER_SIZE] {
        &self.bytes
    }

    /// Bytes 5..=7, the part of the model / serial registers that ends up
    /// in the MAC address.
    pub fn id_bytes(&self) -> [u8; 3] {
        let id = &self.bytes[ID_BYTES];
        [id[0], id[1], id[2]]
    }

    /// The contents as printable ASCII, with anything outside
    /// `0x20..=0x7e` replaced by `.`.
    pub fn ascii(&self) -> String {
        self.bytes.iter().map(|&b| printable(b)).collect()
    }
}

/// A hex dump row: ` 76  00 11 22 33 44 55 66 77  ."3DUfw`.
impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " {:02x} ", self.index)?;
        for b in &self.bytes {
            write!(f, " {b:02x}")?;
        }
        write!(f, "  {}", self.ascii())
    }
}

pub(crate) fn printable(b: u8) -> char {
    if (0x20..=0x7e).contains(&b) {
        b as char
    } else {
        '.'
    }
}

/// Optional register-file features, all disabled by default.
///
/// The production configuration only reads the serial register and builds
/// the MAC from the fixed vendor OUI. The remaining paths are kept behind
/// explicit flags.
///
/// # Example
///
/// ```
/// use crenova_eeprom::Features;
///
/// let features = Features::new().dump(true);
/// assert!(features.dump);
/// assert!(!features.write);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Features {
    /// Take the MAC prefix from the model register instead of the vendor OUI.
    pub model_prefix: bool,
    /// Allow reading the whole register file.
    pub dump: bool,
    /// Allow writing to the register file.
    pub write: bool,
}

impl Features {
    /// All optional features disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the model-register MAC prefix.
    pub fn model_prefix(mut self, enabled: bool) -> Self {
        self.model_prefix = enabled;
        self
    }

    /// Enable or disable full register-file dumps.
    pub fn dump(mut self, enabled: bool) -> Self {
        self.dump = enabled;
        self
    }

    /// Enable or disable the page-write path.
    pub fn write(mut self, enabled: bool) -> Self {
        self.write = enabled;
        self
    }
}

/// Write page geometry and settling time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWrite {
    /// log2 of the page size in bytes.
    pub page_bits: u32,
    /// Blocking pause after every chunk.
    pub delay: Duration,
}

impl PageWrite {
    /// Page size in bytes, or `None` if `2^page_bits` overflows a `usize`.
    pub fn page_size(&self) -> Option<usize> {
        1usize.checked_shl(self.page_bits)
    }
}

impl Default for PageWrite {
    fn default() -> Self {
        Self {
            page_bits: CFG_EEPROM_PAGE_WRITE_BITS,
            delay: CFG_EEPROM_PAGE_WRITE_DELAY,
        }
    }
}
