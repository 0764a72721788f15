//! Box model detection and bus selection.
//!
//! The register file hangs off a different I2C bus depending on the box
//! model. The model is read from [`BOXTYPE_PATH`] and mapped to a bus with a
//! fixed prefix table. Use [`BusSelection`] to resolve the bus, or
//! [`bus_for_model`] to apply the table directly.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::constants::BOXTYPE_PATH;
use crate::i2c::bus_device_path;

/// Bus used when the model cannot be determined.
pub const FALLBACK_BUS: u8 = 0;

/// Bus used for models not listed in [`MODEL_BUSES`].
pub const OTHER_MODEL_BUS: u8 = 2;

/// Model prefixes and their bus, checked in order.
pub const MODEL_BUSES: &[(&str, u8)] = &[
    ("opt9600mini", 1),
    ("opt9600prima", 1),
    ("atemio520", 1),
    ("opt9600", 0),
];

/// Map a model identifier to its I2C bus.
///
/// # Example
///
/// ```
/// use crenova_eeprom::board::bus_for_model;
///
/// assert_eq!(bus_for_model("opt9600mini"), 1);
/// assert_eq!(bus_for_model("opt9600"), 0);
/// assert_eq!(bus_for_model("hs7810a"), 2);
/// ```
pub fn bus_for_model(model: &str) -> u8 {
    MODEL_BUSES
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map_or(OTHER_MODEL_BUS, |&(_, bus)| bus)
}

/// Read the model identifier: the first whitespace-delimited token of `path`.
///
/// Returns `Ok(None)` if the file holds no token.
pub fn read_boxtype(path: impl AsRef<Path>) -> io::Result<Option<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.split_whitespace().next().map(str::to_owned))
}

/// Where the bus index came from and what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedBus {
    /// Bus index.
    pub index: u8,
    /// The detected model, if the model file was read.
    pub model: Option<String>,
}

impl SelectedBus {
    /// Device node of the bus.
    pub fn device_path(&self) -> PathBuf {
        bus_device_path(self.index)
    }
}

/// How to pick the I2C bus for the register file.
///
/// # Example
///
/// ```no_run
/// use crenova_eeprom::board::BusSelection;
///
/// let selected = BusSelection::new().resolve();
/// println!("using {}", selected.device_path().display());
/// ```
#[derive(Debug, Clone)]
pub struct BusSelection {
    /// File naming the box model.
    pub boxtype_path: PathBuf,
    /// If set, use this bus and skip model detection.
    pub bus: Option<u8>,
}

impl Default for BusSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl BusSelection {
    /// Detect the model from [`BOXTYPE_PATH`].
    pub fn new() -> Self {
        Self {
            boxtype_path: PathBuf::from(BOXTYPE_PATH),
            bus: None,
        }
    }

    /// Read the model from a different file.
    pub fn boxtype_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.boxtype_path = path.into();
        self
    }

    /// Force a bus index.
    pub fn bus(mut self, index: u8) -> Self {
        self.bus = Some(index);
        self
    }

    /// Resolve the bus. Never fails: an unreadable model file selects
    /// [`FALLBACK_BUS`].
    pub fn resolve(&self) -> SelectedBus {
        if let Some(index) = self.bus {
            log::info!("using I2C bus {index} (explicit)");
            return SelectedBus { index, model: None };
        }

        match read_boxtype(&self.boxtype_path) {
            Ok(Some(model)) => {
                let index = bus_for_model(&model);
                log::info!("box model {model} uses I2C bus {index}");
                SelectedBus {
                    index,
                    model: Some(model),
                }
            }
            Ok(None) => {
                log::warn!(
                    "{} is empty, using I2C bus {FALLBACK_BUS}",
                    self.boxtype_path.display()
                );
                SelectedBus {
                    index: FALLBACK_BUS,
                    model: None,
                }
            }
            Err(e) => {
                log::warn!(
                    "cannot read {}: {e}, using I2C bus {FALLBACK_BUS}",
                    self.boxtype_path.display()
                );
                SelectedBus {
                    index: FALLBACK_BUS,
                    model: None,
                }
            }
        }
    }
}
