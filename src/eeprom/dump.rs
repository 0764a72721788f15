//! Register file snapshots.

use std::fmt;

use crate::constants::{REGISTER_COUNT, REGISTER_SIZE};
use crate::types::Register;

/// All 128 registers, in index order.
///
/// Produced by [`RegisterFile::dump_all`](super::RegisterFile::dump_all).
/// Formatting with `{}` renders the classic table:
///
/// ```text
/// Register file dump
/// Reg   0  1  2  3  4  5  6  7  ASCII
/// --------------------------------------
///  00  4f 50 54 39 36 30 30 00  OPT9600.
/// ...
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDump {
    registers: Vec<Register>,
}

impl RegisterDump {
    pub(crate) fn from_registers(registers: Vec<Register>) -> Self {
        debug_assert_eq!(registers.len(), REGISTER_COUNT);
        Self { registers }
    }

    /// Number of registers in the dump.
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// Whether the dump holds no registers.
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Register `index`, if present.
    pub fn get(&self, index: u8) -> Option<&Register> {
        self.registers.get(index as usize)
    }

    /// All registers as a slice.
    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    /// Iterate over the registers.
    pub fn iter(&self) -> std::slice::Iter<'_, Register> {
        self.registers.iter()
    }

    /// The whole register file as one flat image.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut image = Vec::with_capacity(self.registers.len() * REGISTER_SIZE);
        for register in &self.registers {
            image.extend_from_slice(register.bytes());
        }
        image
    }
}

impl<'a> IntoIterator for &'a RegisterDump {
    type Item = &'a Register;
    type IntoIter = std::slice::Iter<'a, Register>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for RegisterDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Register file dump")?;
        write!(f, "Reg ")?;
        for i in 0..REGISTER_SIZE {
            write!(f, " {i:2}")?;
        }
        writeln!(f, "  ASCII")?;
        writeln!(f, "{}", "-".repeat(38))?;
        for register in &self.registers {
            writeln!(f, "{register}")?;
        }
        Ok(())
    }
}
