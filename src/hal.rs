//! `embedded-hal` 1.0 integration.
//!
//! Enable the `embedded-hal` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! crenova-eeprom = { version = "1", features = ["embedded-hal"] }
//! ```
//!
//! # Provided implementations
//!
//! | Trait | Type | Notes |
//! |-------|------|-------|
//! | `embedded_hal::i2c::I2c` | [`LinuxBus`] | `I2C_RDWR` on `/dev/i2c-N` |
//! | [`I2cTransport`] | [`HalBus`] | Any `embedded_hal::i2c::I2c` as a register-file bus |
//! | `embedded_hal::i2c::Error` | [`Error`] | NACK errno mapped to `NoAcknowledge` |

use std::io;

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource, Operation};
use i2cdev::core::{I2CMessage, I2CTransfer};
use i2cdev::linux::LinuxI2CMessage;

use crate::constants::MAX_SLAVE_ADDR;
use crate::error::{Error, ENXIO, EREMOTEIO};
use crate::i2c::{I2cTransport, LinuxBus};

// ---- Error conversion ----

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self.os_error() {
            Some(ENXIO) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Some(EREMOTEIO) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            _ => ErrorKind::Other,
        }
    }
}

fn hal_to_io<E: embedded_hal::i2c::Error>(e: E) -> io::Error {
    match e.kind() {
        ErrorKind::NoAcknowledge(_) => io::Error::from_raw_os_error(ENXIO),
        kind => io::Error::new(io::ErrorKind::Other, format!("{kind:?}")),
    }
}

// ---- embedded-hal I2C for LinuxBus ----

impl embedded_hal::i2c::ErrorType for LinuxBus {
    type Error = Error;
}

/// The whole operation list is sent as one `I2C_RDWR` transfer, so the
/// adapter inserts repeated STARTs between messages and a single STOP at
/// the end. Errors report the first written byte as the register.
impl embedded_hal::i2c::I2c for LinuxBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address > MAX_SLAVE_ADDR {
            return Err(Error::InvalidArgument(
                "I2C address must be 7-bit (0x00-0x7F)",
            ));
        }
        if operations.is_empty() {
            return Ok(());
        }

        let register = operations
            .iter()
            .find_map(|op| match op {
                Operation::Write(buf) => buf.first().copied(),
                Operation::Read(_) => None,
            })
            .unwrap_or_default();

        let mut msgs: Vec<LinuxI2CMessage<'_>> = operations
            .iter_mut()
            .map(|op| match op {
                Operation::Read(buf) => LinuxI2CMessage::read(&mut **buf),
                Operation::Write(buf) => LinuxI2CMessage::write(*buf),
            })
            .map(|msg| msg.with_address(address.into()))
            .collect();

        self.bus_mut()
            .transfer(&mut msgs[..])
            .map_err(|e| Error::TransactionFailed {
                register,
                source: e.into(),
            })?;
        Ok(())
    }
}

// ---- Register-file bus over any embedded-hal I2C ----

/// Adapter that lets the register file run on any `embedded_hal::i2c::I2c`.
///
/// # Example
///
/// ```ignore
/// use crenova_eeprom::{hal::HalBus, RegisterFile};
///
/// let mut bus = HalBus::new(some_hal_i2c);
/// let mac = RegisterFile::new().mac_address(&mut bus)?;
/// ```
#[derive(Debug)]
pub struct HalBus<T> {
    i2c: T,
}

impl<T> HalBus<T> {
    /// Wrap an I2C peripheral.
    pub fn new(i2c: T) -> Self {
        Self { i2c }
    }

    /// Mutably borrow the wrapped peripheral.
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.i2c
    }

    /// Give back the wrapped peripheral.
    pub fn into_inner(self) -> T {
        self.i2c
    }
}

impl<T: embedded_hal::i2c::I2c> I2cTransport for HalBus<T> {
    fn write_read(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> io::Result<usize> {
        self.i2c.write_read(address, &[reg], buf).map_err(hal_to_io)?;
        Ok(buf.len())
    }

    fn write(&mut self, address: u8, data: &[u8]) -> io::Result<()> {
        self.i2c.write(address, data).map_err(hal_to_io)
    }
}
