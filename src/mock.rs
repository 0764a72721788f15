//! In-memory register file for tests.
//!
//! [`MockBus`] answers combined transactions from a simulated 128 x 8 byte
//! register file and stores page writes into it. Every transaction is
//! recorded with the time it was issued. Specific registers can be made to
//! NACK or return short reads.
//!
//! Only built for this crate's own tests and with the `mock` cargo feature.
//!
//! ```
//! use crenova_eeprom::mock::MockBus;
//! use crenova_eeprom::{constants::reg, RegisterFile};
//!
//! let mut bus = MockBus::new();
//! bus.set_register(reg::SERIAL, [0, 0, 0, 0, 0, 0xAA, 0xBB, 0xCC]);
//!
//! let mac = RegisterFile::new().mac_address(&mut bus)?;
//! assert_eq!(mac.to_string(), "00:25:ff:aa:bb:cc");
//! # Ok::<(), crenova_eeprom::Error>(())
//! ```

use std::collections::{HashMap, HashSet};
use std::io;
use std::time::Instant;

use crate::constants::{
    CFG_EEPROM_PAGE_WRITE_BITS, EEPROM_ADDR, REGISTER_COUNT, REGISTER_SIZE,
};
use crate::error::ENXIO;
use crate::i2c::I2cTransport;

/// A transaction seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Register select followed by a read.
    WriteRead {
        /// Slave address.
        address: u8,
        /// Register selector.
        reg: u8,
        /// Requested read length.
        len: usize,
    },
    /// Plain write message.
    Write {
        /// Slave address.
        address: u8,
        /// Message bytes, selector first.
        data: Vec<u8>,
    },
}

/// A recorded transaction and when it was issued.
#[derive(Debug, Clone)]
pub struct Record {
    /// What was sent.
    pub op: Op,
    /// When it reached the bus.
    pub at: Instant,
}

/// Simulated register file on a simulated bus.
#[derive(Debug, Clone)]
pub struct MockBus {
    address: u8,
    memory: Vec<u8>,
    page_bits: u32,
    nack: HashSet<u8>,
    short: HashMap<u8, usize>,
    ops: Vec<Record>,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    /// An all-zero register file answering at [`EEPROM_ADDR`].
    pub fn new() -> Self {
        Self::with_address(EEPROM_ADDR)
    }

    /// An all-zero register file answering at `address`.
    pub fn with_address(address: u8) -> Self {
        Self {
            address,
            memory: vec![0; REGISTER_COUNT * REGISTER_SIZE],
            page_bits: CFG_EEPROM_PAGE_WRITE_BITS,
            nack: HashSet::new(),
            short: HashMap::new(),
            ops: Vec::new(),
        }
    }

    /// Set the contents of register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the register file.
    pub fn set_register(&mut self, index: u8, bytes: [u8; REGISTER_SIZE]) {
        let start = index as usize * REGISTER_SIZE;
        self.memory[start..start + REGISTER_SIZE].copy_from_slice(&bytes);
    }

    /// Fill every register with `f(index)`.
    pub fn fill_with(&mut self, mut f: impl FnMut(u8) -> [u8; REGISTER_SIZE]) {
        for index in 0..REGISTER_COUNT as u8 {
            self.set_register(index, f(index));
        }
    }

    /// Simulate a write page of `2^bits` bytes.
    ///
    /// Pages larger than the register file act as one page.
    pub fn set_page_bits(&mut self, bits: u32) {
        self.page_bits = bits;
    }

    /// Current contents of register `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the register file.
    pub fn register(&self, index: u8) -> [u8; REGISTER_SIZE] {
        let start = index as usize * REGISTER_SIZE;
        let mut bytes = [0; REGISTER_SIZE];
        bytes.copy_from_slice(&self.memory[start..start + REGISTER_SIZE]);
        bytes
    }

    fn page_size(&self) -> usize {
        1usize
            .checked_shl(self.page_bits)
            .map_or(self.memory.len(), |size| size.min(self.memory.len()))
    }

    /// NACK any transaction whose selector is `reg`.
    pub fn fail_register(&mut self, reg: u8) {
        self.nack.insert(reg);
    }

    /// Stop reads of `reg` after `len` bytes without reporting an error.
    pub fn short_read(&mut self, reg: u8, len: usize) {
        self.short.insert(reg, len);
    }

    /// All transactions so far, oldest first.
    pub fn ops(&self) -> &[Record] {
        &self.ops
    }

    /// Forget recorded transactions.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    fn record(&mut self, op: Op) {
        self.ops.push(Record {
            op,
            at: Instant::now(),
        });
    }

    fn check(&self, address: u8, reg: u8) -> io::Result<()> {
        if address != self.address || self.nack.contains(&reg) {
            return Err(io::Error::from_raw_os_error(ENXIO));
        }
        Ok(())
    }
}

impl I2cTransport for MockBus {
    fn write_read(&mut self, address: u8, reg: u8, buf: &mut [u8]) -> io::Result<usize> {
        self.record(Op::WriteRead {
            address,
            reg,
            len: buf.len(),
        });
        self.check(address, reg)?;
        if reg as usize >= REGISTER_COUNT {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "register outside the register file",
            ));
        }

        let n = self.short.get(&reg).map_or(buf.len(), |&n| n.min(buf.len()));
        let start = reg as usize * REGISTER_SIZE;
        for (i, byte) in buf[..n].iter_mut().enumerate() {
            // The read pointer wraps at the end of the register file.
            *byte = self.memory[(start + i) % self.memory.len()];
        }
        Ok(n)
    }

    fn write(&mut self, address: u8, data: &[u8]) -> io::Result<()> {
        self.record(Op::Write {
            address,
            data: data.to_vec(),
        });
        let Some((&reg, payload)) = data.split_first() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "write without a register selector",
            ));
        };
        self.check(address, reg)?;
        if reg as usize >= REGISTER_COUNT {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "register outside the register file",
            ));
        }

        // The write pointer wraps inside the page holding the selector.
        let page = self.page_size();
        let base = reg as usize * REGISTER_SIZE;
        let page_start = base - base % page;
        for (i, &byte) in payload.iter().enumerate() {
            self.memory[page_start + (base - page_start + i) % page] = byte;
        }
        Ok(())
    }
}
