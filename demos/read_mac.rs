//! MAC address and register dump example.
//!
//! Detects the box model, opens the matching I2C bus, prints the MAC
//! address and then the full register file.
//!
//! Usage: cargo run --example read_mac

use crenova_eeprom::board::BusSelection;
use crenova_eeprom::i2c::LinuxBus;
use crenova_eeprom::{Features, RegisterFile};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let selected = BusSelection::new().resolve();
    match &selected.model {
        Some(model) => println!("Box model: {model}"),
        None => println!("Box model: unknown"),
    }
    println!("Opening {}...", selected.device_path().display());
    let mut bus = LinuxBus::open(selected.index)?;

    let file = RegisterFile::new().with_features(Features::new().dump(true));

    let serial = file.serial_number(&mut bus)?;
    println!("Serial register: {serial}");
    println!("MAC address:     {}", file.mac_address(&mut bus)?);

    match file.model_code(&mut bus) {
        Ok(model) => println!("Model register:  {model}"),
        Err(e) => println!("Model register:  (error: {e})"),
    }

    println!();
    print!("{}", file.dump_all(&mut bus)?);

    Ok(())
}
