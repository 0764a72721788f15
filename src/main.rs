//! `crenova-eeprom`: print the box MAC address or dump the register file.
//!
//! ```sh
//! crenova-eeprom --mac
//! RUST_LOG=debug crenova-eeprom --dump --bus 1
//! ```

use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use crenova_eeprom::board::BusSelection;
use crenova_eeprom::i2c::LinuxBus;
use crenova_eeprom::{Features, RegisterFile};

/// Read the MAC address and register file of the front-panel EEPROM.
///
/// Without arguments, prints this usage.
#[derive(Parser, Debug)]
#[command(name = "crenova-eeprom", version)]
struct Cli {
    /// Show MAC address
    #[arg(short, long, conflicts_with = "dump")]
    mac: bool,

    /// Hex dump eeprom contents
    #[arg(short, long)]
    dump: bool,

    /// Use /dev/i2c-N instead of detecting the box model
    #[arg(short, long, value_name = "N")]
    bus: Option<u8>,

    /// Read the box model from PATH
    #[arg(long, value_name = "PATH")]
    boxtype: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Mac,
    Dump,
}

impl Cli {
    fn action(&self) -> Option<Action> {
        if self.mac {
            Some(Action::Mac)
        } else if self.dump {
            Some(Action::Dump)
        } else {
            None
        }
    }

    fn selection(&self) -> BusSelection {
        let mut selection = BusSelection::new();
        if let Some(path) = &self.boxtype {
            selection = selection.boxtype_path(path);
        }
        if let Some(index) = self.bus {
            selection = selection.bus(index);
        }
        selection
    }
}

fn run(action: Action, bus: &mut LinuxBus) -> crenova_eeprom::Result<()> {
    match action {
        Action::Mac => {
            let mac = RegisterFile::new().mac_address(bus)?;
            println!("{mac}");
        }
        Action::Dump => {
            let dump = RegisterFile::new()
                .with_features(Features::new().dump(true))
                .dump_all(bus)?;
            print!("{dump}");
        }
    }
    Ok(())
}

/// `outer: inner: innermost`
fn error_chain(err: &crenova_eeprom::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let Some(action) = cli.action() else {
        return match Cli::command().print_help() {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        };
    };

    let selected = cli.selection().resolve();
    match &selected.model {
        Some(model) => eprintln!("Boxtype is {model}."),
        None if cli.bus.is_none() => {
            eprintln!("Cannot determine boxtype, using i2c bus {}.", selected.index)
        }
        None => {}
    }

    let result =
        LinuxBus::open_path(selected.device_path()).and_then(|mut bus| run(action, &mut bus));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[eeprom] failed: {}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}
