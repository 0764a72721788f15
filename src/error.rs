//! Error types for the crenova-eeprom crate.

use std::io;
use std::path::PathBuf;

/// The error type for EEPROM operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bus ioctl failed (bus error, NACK, missing device, short read).
    #[error("I2C transaction at register {register:#04x} failed")]
    TransactionFailed {
        /// Register selector (or start offset for writes) of the transaction.
        register: u8,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Reading a register from the EEPROM failed.
    #[error("read of register {register:#04x} failed")]
    RegisterReadFailed {
        /// The register that could not be read.
        register: u8,
        /// The engine error.
        #[source]
        source: Box<Error>,
    },

    /// Writing to the EEPROM failed.
    #[error("write at register {register:#04x} failed")]
    RegisterWriteFailed {
        /// The register the write started at.
        register: u8,
        /// The engine error.
        #[source]
        source: Box<Error>,
    },

    /// The bus device file could not be opened.
    #[error("unable to open I2C bus {}", path.display())]
    BusOpen {
        /// Path of the bus device.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Invalid argument(s) were provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// An optional code path was requested without being enabled.
    #[error("feature not enabled: {0}")]
    FeatureDisabled(&'static str),
}

impl Error {
    /// The raw OS error code at the bottom of this error, if any.
    ///
    /// Walks through the register-level wrappers down to the failed
    /// transaction.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            Error::TransactionFailed { source, .. } | Error::BusOpen { source, .. } => {
                source.raw_os_error()
            }
            Error::RegisterReadFailed { source, .. } | Error::RegisterWriteFailed { source, .. } => {
                source.os_error()
            }
            Error::InvalidArgument(_) | Error::FeatureDisabled(_) => None,
        }
    }

    /// Whether the device did not acknowledge (`ENXIO` / `EREMOTEIO`).
    pub fn is_nack(&self) -> bool {
        matches!(self.os_error(), Some(ENXIO) | Some(EREMOTEIO))
    }
}

/// `No such device or address`, returned by most bus drivers on address NACK.
pub(crate) const ENXIO: i32 = 6;
/// `Remote I/O error`, returned by some bus drivers on NACK.
pub(crate) const EREMOTEIO: i32 = 121;

/// A specialized `Result` type for EEPROM operations.
pub type Result<T> = std::result::Result<T, Error>;
