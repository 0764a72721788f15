//! Register I/O on top of the transaction engine.

use crate::constants::*;
use crate::error::{Error, Result};
use crate::i2c::{self, I2cTransport};
use crate::types::{Features, MacAddress, PageWrite, Register};

use super::RegisterDump;

/// Accessor for the 128 x 8 byte register file at one slave address.
///
/// The accessor holds no bus; every operation takes the bus it should use,
/// so the caller decides which bus device is opened and for how long.
///
/// # Example
///
/// ```no_run
/// use crenova_eeprom::{i2c::LinuxBus, RegisterFile};
///
/// let mut bus = LinuxBus::open(1)?;
/// let mac = RegisterFile::new().mac_address(&mut bus)?;
/// println!("{mac}");
/// # Ok::<(), crenova_eeprom::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFile {
    address: u8,
    features: Features,
    page_write: PageWrite,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// Accessor for the device at [`EEPROM_ADDR`] with no optional features.
    pub fn new() -> Self {
        Self {
            address: EEPROM_ADDR,
            features: Features::default(),
            page_write: PageWrite::default(),
        }
    }

    /// Use a different slave address.
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Enable optional features.
    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    /// Override the page write geometry.
    pub fn with_page_write(mut self, page_write: PageWrite) -> Self {
        self.page_write = page_write;
        self
    }

    /// Slave address in use.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Enabled optional features.
    pub fn features(&self) -> Features {
        self.features
    }

    /// Read register `index` (0..=127).
    pub fn read_register<B: I2cTransport + ?Sized>(
        &self,
        bus: &mut B,
        index: u8,
    ) -> Result<Register> {
        if index > MAX_REGISTER {
            return Err(Error::InvalidArgument("register index must be 0-127"));
        }
        let bytes = i2c::read_array::<REGISTER_SIZE, _>(bus, self.address, index).map_err(
            |e| Error::RegisterReadFailed {
                register: index,
                source: Box::new(e),
            },
        )?;
        Ok(Register::new(index, bytes))
    }

    /// Read the serial number register.
    pub fn serial_number<B: I2cTransport + ?Sized>(&self, bus: &mut B) -> Result<Register> {
        self.read_register(bus, reg::SERIAL)
    }

    /// Read the model code register.
    pub fn model_code<B: I2cTransport + ?Sized>(&self, bus: &mut B) -> Result<Register> {
        self.read_register(bus, reg::MODEL)
    }

    /// Derive the MAC address of the box.
    ///
    /// The first three bytes are the vendor OUI `00:25:ff`, the last three
    /// are bytes 5..=7 of the serial number register. With
    /// [`Features::model_prefix`] the OUI is taken from bytes 5..=7 of the
    /// model code register instead; this path is not used in production.
    ///
    /// Either every register read succeeds and a complete address is
    /// returned, or the first failure is returned.
    pub fn mac_address<B: I2cTransport + ?Sized>(&self, bus: &mut B) -> Result<MacAddress> {
        let oui = if self.features.model_prefix {
            self.model_code(bus)?.id_bytes()
        } else {
            VENDOR_OUI
        };
        let serial = self.serial_number(bus)?;
        let mac = MacAddress::from_parts(oui, serial.id_bytes());
        log::debug!("derived MAC {mac} from serial register");
        Ok(mac)
    }

    /// Read all 128 registers in order.
    ///
    /// Requires [`Features::dump`]. Stops at the first register that cannot
    /// be read.
    pub fn dump_all<B: I2cTransport + ?Sized>(&self, bus: &mut B) -> Result<RegisterDump> {
        if !self.features.dump {
            return Err(Error::FeatureDisabled("dump"));
        }
        let mut registers = Vec::with_capacity(REGISTER_COUNT);
        for index in 0..=MAX_REGISTER {
            registers.push(self.read_register(bus, index)?);
        }
        Ok(RegisterDump::from_registers(registers))
    }

    /// Write `data` starting at register `index`.
    ///
    /// Byte `i` of `data` lands at byte `i % 8` of register `index + i / 8`,
    /// so a full 8 byte write reads back unchanged through
    /// [`read_register`](Self::read_register). Requires [`Features::write`].
    /// The data is written in page-aligned chunks with the configured
    /// settling delay after each one.
    pub fn write_register<B: I2cTransport + ?Sized>(
        &self,
        bus: &mut B,
        index: u8,
        data: &[u8],
    ) -> Result<()> {
        if !self.features.write {
            return Err(Error::FeatureDisabled("write"));
        }
        if index > MAX_REGISTER {
            return Err(Error::InvalidArgument("register index must be 0-127"));
        }
        if data.is_empty() {
            return Err(Error::InvalidArgument("write data must not be empty"));
        }
        log::info!("writing {} bytes at register {index:#04x}", data.len());
        i2c::write(bus, self.address, index, data, &self.page_write).map_err(|e| {
            Error::RegisterWriteFailed {
                register: index,
                source: Box::new(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBus, Op};
    use std::time::Duration;

    fn serial_bus(bytes: [u8; 8]) -> MockBus {
        let mut bus = MockBus::new();
        bus.set_register(reg::SERIAL, bytes);
        bus
    }

    #[test]
    fn mac_from_serial_register() {
        let mut bus = serial_bus([0, 0, 0, 0, 0, 0xAA, 0xBB, 0xCC]);
        let mac = RegisterFile::new().mac_address(&mut bus).unwrap();
        assert_eq!(mac.to_string(), "00:25:ff:aa:bb:cc");
    }

    #[test]
    fn mac_reads_only_the_serial_register() {
        let mut bus = serial_bus([1, 2, 3, 4, 5, 6, 7, 8]);
        bus.set_register(reg::MODEL, [0xFF; 8]);
        let mac = RegisterFile::new().mac_address(&mut bus).unwrap();
        assert_eq!(mac.as_bytes(), &[0x00, 0x25, 0xff, 6, 7, 8]);

        let ops = bus.ops();
        assert_eq!(ops.len(), 1);
        assert_eq!(
            ops[0].op,
            Op::WriteRead {
                address: EEPROM_ADDR,
                reg: reg::SERIAL,
                len: 8
            }
        );
    }

    #[test]
    fn mac_read_failure_is_wrapped() {
        let mut bus = MockBus::new();
        bus.fail_register(reg::SERIAL);
        let err = RegisterFile::new().mac_address(&mut bus).unwrap_err();
        match &err {
            Error::RegisterReadFailed { register, source } => {
                assert_eq!(*register, reg::SERIAL);
                assert!(matches!(**source, Error::TransactionFailed { .. }));
            }
            other => panic!("expected RegisterReadFailed, got {other:?}"),
        }
        assert!(err.is_nack());
    }

    #[test]
    fn model_prefix_feature_uses_model_register() {
        let mut bus = serial_bus([0, 0, 0, 0, 0, 0x10, 0x20, 0x30]);
        bus.set_register(reg::MODEL, [0, 0, 0, 0, 0, 0x00, 0x1A, 0x2B]);
        let file = RegisterFile::new().with_features(Features::new().model_prefix(true));
        let mac = file.mac_address(&mut bus).unwrap();
        assert_eq!(mac.to_string(), "00:1a:2b:10:20:30");
    }

    #[test]
    fn model_prefix_failure_skips_serial_read() {
        let mut bus = MockBus::new();
        bus.fail_register(reg::MODEL);
        let file = RegisterFile::new().with_features(Features::new().model_prefix(true));
        match file.mac_address(&mut bus) {
            Err(Error::RegisterReadFailed { register, .. }) => assert_eq!(register, reg::MODEL),
            other => panic!("expected RegisterReadFailed, got {other:?}"),
        }
        assert_eq!(bus.ops().len(), 1);
    }

    #[test]
    fn out_of_range_register_is_rejected() {
        let mut bus = MockBus::new();
        assert!(matches!(
            RegisterFile::new().read_register(&mut bus, 128),
            Err(Error::InvalidArgument(_))
        ));
        assert!(bus.ops().is_empty());
    }

    #[test]
    fn repeated_reads_are_identical() {
        let mut bus = serial_bus([9, 8, 7, 6, 5, 4, 3, 2]);
        let file = RegisterFile::new();
        let a = file.serial_number(&mut bus).unwrap();
        let b = file.serial_number(&mut bus).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dump_requires_feature() {
        let mut bus = MockBus::new();
        assert!(matches!(
            RegisterFile::new().dump_all(&mut bus),
            Err(Error::FeatureDisabled("dump"))
        ));
        assert!(bus.ops().is_empty());
    }

    #[test]
    fn dump_reads_every_register_in_order() {
        let mut bus = MockBus::new();
        bus.fill_with(|i| [i; 8]);
        let file = RegisterFile::new().with_features(Features::new().dump(true));
        let dump = file.dump_all(&mut bus).unwrap();

        assert_eq!(dump.len(), REGISTER_COUNT);
        for (i, record) in bus.ops().iter().enumerate() {
            assert_eq!(
                record.op,
                Op::WriteRead {
                    address: EEPROM_ADDR,
                    reg: i as u8,
                    len: 8
                }
            );
        }
        assert_eq!(dump.get(0x42).unwrap().bytes(), &[0x42; 8]);
    }

    #[test]
    fn dump_stops_at_first_failure() {
        let mut bus = MockBus::new();
        bus.fail_register(0x10);
        let file = RegisterFile::new().with_features(Features::new().dump(true));
        match file.dump_all(&mut bus) {
            Err(Error::RegisterReadFailed { register, .. }) => assert_eq!(register, 0x10),
            other => panic!("expected RegisterReadFailed, got {other:?}"),
        }
        assert_eq!(bus.ops().len(), 0x11);
    }

    #[test]
    fn write_requires_feature() {
        let mut bus = MockBus::new();
        assert!(matches!(
            RegisterFile::new().write_register(&mut bus, 0, &[1]),
            Err(Error::FeatureDisabled("write"))
        ));
        assert!(bus.ops().is_empty());
    }

    fn writable() -> RegisterFile {
        RegisterFile::new()
            .with_features(Features::new().write(true))
            .with_page_write(PageWrite {
                page_bits: 4,
                delay: Duration::from_millis(1),
            })
    }

    #[test]
    fn write_goes_through_page_writer() {
        let mut bus = MockBus::new();
        bus.set_page_bits(3);
        let file = RegisterFile::new()
            .with_features(Features::new().write(true))
            .with_page_write(PageWrite {
                page_bits: 3,
                delay: Duration::from_millis(1),
            });
        let data: Vec<u8> = (1..=12).collect();
        file.write_register(&mut bus, 0x06, &data).unwrap();

        let writes: Vec<_> = bus.ops().iter().map(|r| r.op.clone()).collect();
        assert_eq!(
            writes,
            [
                Op::Write {
                    address: EEPROM_ADDR,
                    data: vec![0x06, 1, 2, 3, 4, 5, 6, 7, 8]
                },
                Op::Write {
                    address: EEPROM_ADDR,
                    data: vec![0x07, 9, 10, 11, 12]
                },
            ]
        );
    }

    #[test]
    fn written_register_reads_back() {
        let mut bus = MockBus::new();
        let file = writable();
        let bytes = [1, 2, 3, 4, 5, 6, 7, 8];

        file.write_register(&mut bus, 0x0e, &bytes).unwrap();

        assert_eq!(file.read_register(&mut bus, 0x0e).unwrap().bytes(), &bytes);
        assert_eq!(file.read_register(&mut bus, 0x0f).unwrap().bytes(), &[0; 8]);
        assert_eq!(file.read_register(&mut bus, 0x0d).unwrap().bytes(), &[0; 8]);
    }

    #[test]
    fn multi_register_write_across_a_page_reads_back() {
        let mut bus = MockBus::new();
        let file = writable();
        let data: Vec<u8> = (0x40..0x50).collect();

        // Registers 0x0f and 0x10 sit in different 16 byte pages.
        file.write_register(&mut bus, 0x0f, &data).unwrap();

        assert_eq!(bus.ops().len(), 2);
        assert_eq!(file.read_register(&mut bus, 0x0f).unwrap().bytes(), &data[..8]);
        assert_eq!(file.read_register(&mut bus, 0x10).unwrap().bytes(), &data[8..]);
        assert_eq!(bus.register(0x0e), [0; 8]);
    }

    #[test]
    fn write_past_the_last_register_is_rejected() {
        let mut bus = MockBus::new();
        match writable().write_register(&mut bus, MAX_REGISTER, &[0; 9]) {
            Err(Error::RegisterWriteFailed { source, .. }) => {
                assert!(matches!(*source, Error::InvalidArgument(_)))
            }
            other => panic!("expected RegisterWriteFailed, got {other:?}"),
        }
        assert!(bus.ops().is_empty());
    }

    #[test]
    fn write_failure_is_wrapped() {
        let mut bus = MockBus::new();
        bus.fail_register(0x20);
        let file = writable();
        match file.write_register(&mut bus, 0x20, &[0; 4]) {
            Err(Error::RegisterWriteFailed { register, .. }) => assert_eq!(register, 0x20),
            other => panic!("expected RegisterWriteFailed, got {other:?}"),
        }
    }
}
