//! I2C transaction engine.
//!
//! Register reads are issued as one combined transaction of two messages:
//! a one-byte write that selects the register (no STOP), then a read of the
//! requested length from the same slave. The device only advances its
//! internal read pointer from a register given in that write phase, so a
//! plain read would return data from the wrong offset.
//!
//! Writes go through [`write`], which addresses the register file by
//! register index like reads do. It splits the data into page-aligned
//! chunks and blocks for the page settling time after each one. The
//! device's address counter wraps inside a page instead of carrying into
//! the next, so a write that crossed a page would land at the wrong offset.
//!
//! # Example
//!
//! ```no_run
//! use crenova_eeprom::i2c::{self, LinuxBus};
//! use crenova_eeprom::constants::{reg, EEPROM_ADDR};
//!
//! let mut bus = LinuxBus::open(0)?;
//! let serial = i2c::read(&mut bus, EEPROM_ADDR, reg::SERIAL, 8)?;
//! assert_eq!(serial.len(), 8);
//! # Ok::<(), crenova_eeprom::Error>(())
//! ```

use std::io;
use std::path::{Path, PathBuf};

use i2cdev::core::{I2CMessage, I2CTransfer};
use i2cdev::linux::{LinuxI2CBus, LinuxI2CMessage};

use crate::constants::{I2C_DEV_PREFIX, MAX_SLAVE_ADDR, REGISTER_COUNT, REGISTER_SIZE};
use crate::error::{Error, Result};
use crate::types::PageWrite;

/// A bus that can carry register transactions.
///
/// Implemented by [`LinuxBus`] for `/dev/i2c-N`, by
/// `mock::MockBus` for tests, and (with the
/// `embedded-hal` feature) by [`HalBus`](crate::hal::HalBus) for any
/// `embedded_hal::i2c::I2c`.
pub trait I2cTransport {
    /// Write `reg` to `address` without a STOP, then read `buf.len()` bytes
    /// from the same address with a repeated START.
    ///
    /// Returns the number of bytes actually read.
    fn write_read(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> io::Result<usize>;

    /// Write `data` to `address` as a single message.
    fn write(&mut self, address: u8, data: &[u8]) -> io::Result<()>;
}

impl<T: I2cTransport + ?Sized> I2cTransport for &mut T {
    fn write_read(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> io::Result<usize> {
        (**self).write_read(address, reg, buf)
    }

    fn write(&mut self, address: u8, data: &[u8]) -> io::Result<()> {
        (**self).write(address, data)
    }
}

/// Device node for bus `index`: `/dev/i2c-<index>`.
pub fn bus_device_path(index: u8) -> PathBuf {
    PathBuf::from(format!("{I2C_DEV_PREFIX}{index}"))
}

/// A Linux I2C bus character device driven through `I2C_RDWR`.
pub struct LinuxBus {
    bus: LinuxI2CBus,
    path: PathBuf,
}

impl std::fmt::Debug for LinuxBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinuxBus")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl LinuxBus {
    /// Open `/dev/i2c-<index>`.
    pub fn open(index: u8) -> Result<Self> {
        Self::open_path(bus_device_path(index))
    }

    /// Open a bus device by path.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let bus = LinuxI2CBus::new(&path).map_err(|e| Error::BusOpen {
            path: path.clone(),
            source: e.into(),
        })?;
        log::debug!("opened I2C bus {}", path.display());
        Ok(Self { bus, path })
    }

    /// Path of the opened device node.
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(feature = "embedded-hal")]
    pub(crate) fn bus_mut(&mut self) -> &mut LinuxI2CBus {
        &mut self.bus
    }
}

impl I2cTransport for LinuxBus {
    fn write_read(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        let selector = [reg];
        let mut msgs = [
            LinuxI2CMessage::write(&selector).with_address(address.into()),
            LinuxI2CMessage::read(buf).with_address(address.into()),
        ];
        let done = self.bus.transfer(&mut msgs).map_err(io::Error::from)?;
        if done != 2 {
            // The adapter stopped after the register select.
            return Ok(0);
        }
        Ok(len)
    }

    fn write(&mut self, address: u8, data: &[u8]) -> io::Result<()> {
        let mut msgs = [LinuxI2CMessage::write(data).with_address(address.into())];
        self.bus.transfer(&mut msgs).map_err(io::Error::from)?;
        Ok(())
    }
}

fn check_address(address: u8) -> Result<()> {
    if address > MAX_SLAVE_ADDR {
        return Err(Error::InvalidArgument(
            "I2C address must be 7-bit (0x00-0x7F)",
        ));
    }
    Ok(())
}

/// Read `len` bytes starting at register `reg` of the slave at `address`.
///
/// The result always holds exactly `len` bytes; a short transfer is reported
/// as [`Error::TransactionFailed`]. Failures are not retried.
pub fn read<B: I2cTransport + ?Sized>(
    bus: &mut B,
    address: u8,
    reg: u8,
    len: usize,
) -> Result<Vec<u8>> {
    if len == 0 {
        return Err(Error::InvalidArgument("read length must be at least 1"));
    }
    check_address(address)?;

    let mut buf = vec![0u8; len];
    transact(bus, address, reg, &mut buf)?;
    Ok(buf)
}

/// Read exactly `N` bytes starting at register `reg` into a fixed array.
pub fn read_array<const N: usize, B: I2cTransport + ?Sized>(
    bus: &mut B,
    address: u8,
    reg: u8,
) -> Result<[u8; N]> {
    if N == 0 {
        return Err(Error::InvalidArgument("read length must be at least 1"));
    }
    check_address(address)?;

    let mut buf = [0u8; N];
    transact(bus, address, reg, &mut buf)?;
    Ok(buf)
}

fn transact<B: I2cTransport + ?Sized>(
    bus: &mut B,
    address: u8,
    reg: u8,
    buf: &mut [u8],
) -> Result<()> {
    log::debug!(
        "i2c read: addr={address:#04x} reg={reg:#04x} len={}",
        buf.len()
    );

    match bus.write_read(address, reg, buf) {
        Ok(n) if n == buf.len() => Ok(()),
        Ok(n) => {
            log::warn!("i2c read of reg {reg:#04x} returned {n} of {} bytes", buf.len());
            Err(Error::TransactionFailed {
                register: reg,
                source: io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("short read: {n} of {} bytes", buf.len()),
                ),
            })
        }
        Err(source) => {
            log::warn!("i2c read of reg {reg:#04x} failed: {source}");
            Err(Error::TransactionFailed {
                register: reg,
                source,
            })
        }
    }
}

/// Iterator over `(start, len)` byte chunks of a write that never cross a page.
///
/// # Example
///
/// ```
/// use crenova_eeprom::i2c::PageChunks;
///
/// // 20 bytes from offset 0x0c with 16 byte pages.
/// let chunks: Vec<_> = PageChunks::new(0x0c, 20, 4).unwrap().collect();
/// assert_eq!(chunks, [(0x0c, 4), (0x10, 16)]);
/// ```
#[derive(Debug, Clone)]
pub struct PageChunks {
    offset: usize,
    end: usize,
    page_size: usize,
}

impl PageChunks {
    /// Plan a write of `len` bytes at `offset` with pages of `2^page_bits`.
    ///
    /// Returns `None` if the page size or the end offset does not fit in a
    /// `usize`.
    pub fn new(offset: usize, len: usize, page_bits: u32) -> Option<Self> {
        Some(Self {
            offset,
            end: offset.checked_add(len)?,
            page_size: 1usize.checked_shl(page_bits)?,
        })
    }
}

impl Iterator for PageChunks {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.end {
            return None;
        }
        let page_end = (self.offset | (self.page_size - 1)).saturating_add(1);
        let len = page_end.min(self.end) - self.offset;
        let chunk = (self.offset, len);
        self.offset += len;
        Some(chunk)
    }
}

/// Smallest page the register-indexed write path can address.
const MIN_PAGE_BITS: u32 = REGISTER_SIZE.trailing_zeros();
/// A page as large as the whole register file.
const MAX_PAGE_BITS: u32 = (REGISTER_COUNT * REGISTER_SIZE).trailing_zeros();

/// Write `data` starting at register `reg`, one page-aligned chunk at a time.
///
/// The selector byte is a register index, the same unit [`read`] uses:
/// byte `i` of `data` lands at byte `reg * 8 + i` of the register file.
/// Pages are measured in bytes (`2^page.page_bits`) and must hold at least
/// one whole register, so every chunk starts on a register boundary and is
/// sent as `[start / 8, bytes...]`. Each chunk is followed by a blocking
/// sleep of `page.delay`. The first failing chunk aborts the write; later
/// chunks are not sent.
pub fn write<B: I2cTransport + ?Sized>(
    bus: &mut B,
    address: u8,
    reg: u8,
    data: &[u8],
    page: &PageWrite,
) -> Result<()> {
    if data.is_empty() {
        return Err(Error::InvalidArgument("write data must not be empty"));
    }
    if !(MIN_PAGE_BITS..=MAX_PAGE_BITS).contains(&page.page_bits) {
        return Err(Error::InvalidArgument(
            "page size must be between one register and the whole register file",
        ));
    }
    let base = reg as usize * REGISTER_SIZE;
    if base + data.len() > REGISTER_COUNT * REGISTER_SIZE {
        return Err(Error::InvalidArgument(
            "write runs past the end of the register file",
        ));
    }
    check_address(address)?;

    let chunks = PageChunks::new(base, data.len(), page.page_bits)
        .ok_or(Error::InvalidArgument("page size out of range"))?;
    let mut msg = Vec::with_capacity(data.len().min(1 << page.page_bits) + 1);

    for (start, len) in chunks {
        let selector = (start / REGISTER_SIZE) as u8;
        let rel = start - base;
        msg.clear();
        msg.push(selector);
        msg.extend_from_slice(&data[rel..rel + len]);

        log::debug!("i2c write: addr={address:#04x} reg={selector:#04x} len={len}");
        bus.write(address, &msg).map_err(|source| {
            log::warn!("i2c write at reg {selector:#04x} failed: {source}");
            Error::TransactionFailed {
                register: selector,
                source,
            }
        })?;

        std::thread::sleep(page.delay);
    }

    Ok(())
}
