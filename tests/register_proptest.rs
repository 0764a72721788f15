//! Property-based tests for MAC derivation, page chunking and dumps.
//!
//! Uses `proptest` to generate register contents and write requests and
//! checks the invariants that must hold for every input.

use std::time::Duration;

use crenova_eeprom::constants::{reg, REGISTER_COUNT, REGISTER_SIZE, VENDOR_OUI};
use crenova_eeprom::i2c::{self, PageChunks};
use crenova_eeprom::mock::{MockBus, Op};
use crenova_eeprom::{Features, PageWrite, RegisterFile};
use proptest::prelude::*;

fn register_bytes() -> impl Strategy<Value = [u8; 8]> {
    any::<[u8; 8]>()
}

proptest! {
    /// The MAC is always the vendor OUI followed by serial bytes 5..=7.
    #[test]
    fn mac_is_oui_plus_serial_tail(serial in register_bytes()) {
        let mut bus = MockBus::new();
        bus.set_register(reg::SERIAL, serial);

        let mac = RegisterFile::new().mac_address(&mut bus).unwrap();
        let bytes = mac.as_bytes();
        prop_assert_eq!(&bytes[..3], &VENDOR_OUI[..]);
        prop_assert_eq!(&bytes[3..], &serial[5..]);

        let text = mac.to_string();
        prop_assert_eq!(text.len(), 17);
        prop_assert_eq!(text.to_lowercase(), text.clone());
        prop_assert_eq!(
            text,
            format!("00:25:ff:{:02x}:{:02x}:{:02x}", serial[5], serial[6], serial[7])
        );
    }

    /// Other registers never influence the default MAC.
    #[test]
    fn mac_ignores_other_registers(
        serial in register_bytes(),
        noise in register_bytes(),
    ) {
        let mut quiet = MockBus::new();
        quiet.set_register(reg::SERIAL, serial);

        let mut noisy = MockBus::new();
        noisy.fill_with(|_| noise);
        noisy.set_register(reg::SERIAL, serial);

        let file = RegisterFile::new();
        prop_assert_eq!(
            file.mac_address(&mut quiet).unwrap(),
            file.mac_address(&mut noisy).unwrap()
        );
    }

    /// Every valid register reads back as exactly 8 bytes, identical on repeat.
    #[test]
    fn register_reads_are_full_and_stable(index in 0u8..128, bytes in register_bytes()) {
        let mut bus = MockBus::new();
        bus.set_register(index, bytes);

        let file = RegisterFile::new();
        let first = file.read_register(&mut bus, index).unwrap();
        let second = file.read_register(&mut bus, index).unwrap();
        prop_assert_eq!(first.bytes(), &bytes);
        prop_assert_eq!(first, second);
    }

    /// Chunks cover the request exactly and never cross a page.
    #[test]
    fn chunks_stay_inside_pages(
        offset in 0usize..256,
        len in 1usize..256,
        page_bits in 0u32..=10,
    ) {
        let page = 1usize << page_bits;
        let mut expected = offset;
        for (start, n) in PageChunks::new(offset, len, page_bits).unwrap() {
            prop_assert_eq!(start, expected);
            prop_assert!(n >= 1);
            prop_assert_eq!(start / page, (start + n - 1) / page);
            expected += n;
        }
        prop_assert_eq!(expected, offset + len);
    }

    /// Every dump row shows the register index and masks unprintable bytes.
    #[test]
    fn dump_rows_mask_unprintable(fill in register_bytes()) {
        let mut bus = MockBus::new();
        bus.fill_with(|_| fill);
        let file = RegisterFile::new().with_features(Features::new().dump(true));
        let text = file.dump_all(&mut bus).unwrap().to_string();

        let rows: Vec<&str> = text.lines().skip(3).collect();
        prop_assert_eq!(rows.len(), REGISTER_COUNT);
        for (i, row) in rows.iter().enumerate() {
            let prefix = format!(" {:02x} ", i);
            prop_assert!(row.starts_with(&prefix));
            let ascii = &row[row.len() - 8..];
            prop_assert!(ascii.chars().all(|c| (' '..='~').contains(&c)));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Writes that span a page boundary are split on register boundaries,
    /// each chunk is followed by the settling delay, and the bytes read back
    /// from the registers they were written to.
    #[test]
    fn page_writes_are_split_and_delayed(index in 0u8..128, len in 2usize..40) {
        let base = index as usize * REGISTER_SIZE;
        prop_assume!(base + len <= REGISTER_COUNT * REGISTER_SIZE);
        let page = PageWrite { page_bits: 4, delay: Duration::from_millis(1) };
        let data: Vec<u8> = (1..=len as u8).collect();

        let mut bus = MockBus::new();
        i2c::write(&mut bus, 0x3d, index, &data, &page).unwrap();

        let ops = bus.ops().to_vec();
        let spans_pages = base / 16 != (base + len - 1) / 16;
        if spans_pages {
            prop_assert!(ops.len() >= 2);
        }

        for pair in ops.windows(2) {
            prop_assert!(pair[1].at.duration_since(pair[0].at) >= page.delay);
        }
        let mut written = Vec::new();
        for record in &ops {
            match &record.op {
                Op::Write { data, .. } => {
                    let start = data[0] as usize * REGISTER_SIZE;
                    let n = data.len() - 1;
                    prop_assert_eq!(start, base + written.len());
                    prop_assert_eq!(start / 16, (start + n - 1) / 16);
                    written.extend_from_slice(&data[1..]);
                }
                other => prop_assert!(false, "unexpected op {:?}", other),
            }
        }
        prop_assert_eq!(&written, &data);

        let read_back = i2c::read(&mut bus, 0x3d, index, len).unwrap();
        prop_assert_eq!(read_back, data);
    }
}
