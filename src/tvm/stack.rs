//! Typed TVM stack values exchanged with get-methods
//!
//! Get-method results are positional: entry 0 is the first value the method
//! returned. [`StackReader`] walks them in that order and reports the index
//! of the first entry that is missing or of the wrong type.

use crate::tvm::address::Address;
use crate::tvm::builder::Builder;
use crate::tvm::cell::Cell;
use crate::tvm::error::{TvmError, TvmResult};
use crate::tvm::slice::Slice;
use num_bigint::{BigInt, BigUint, Sign};
use std::fmt;
use std::sync::Arc;

/// A single TVM stack value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEntry {
    Null,
    /// 257-bit signed integer
    Int(BigInt),
    Cell(Arc<Cell>),
    /// Slice over the whole of the given cell
    Slice(Arc<Cell>),
}

impl StackEntry {
    /// Short type name used in decode errors
    pub fn type_name(&self) -> &'static str {
        match self {
            StackEntry::Null => "null",
            StackEntry::Int(_) => "int",
            StackEntry::Cell(_) => "cell",
            StackEntry::Slice(_) => "slice",
        }
    }

    /// Wraps an address as a slice argument
    pub fn from_address(address: &Address) -> TvmResult<Self> {
        let mut builder = Builder::new();
        builder.store_address(Some(address))?;
        Ok(StackEntry::Slice(builder.build()?))
    }
}

impl From<u128> for StackEntry {
    fn from(value: u128) -> Self {
        StackEntry::Int(BigInt::from(value))
    }
}

impl From<BigInt> for StackEntry {
    fn from(value: BigInt) -> Self {
        StackEntry::Int(value)
    }
}

impl From<bool> for StackEntry {
    /// TVM booleans are `-1` for true and `0` for false
    fn from(value: bool) -> Self {
        StackEntry::Int(BigInt::from(if value { -1 } else { 0 }))
    }
}

impl fmt::Display for StackEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackEntry::Null => write!(f, "null"),
            StackEntry::Int(value) => write!(f, "int {}", value),
            StackEntry::Cell(cell) => write!(f, "cell {}", cell.hash_hex()),
            StackEntry::Slice(cell) => write!(f, "slice {}", cell.hash_hex()),
        }
    }
}

/// Positional reader over a get-method result stack
#[derive(Debug, Clone)]
pub struct StackReader<'a> {
    entries: &'a [StackEntry],
    position: usize,
}

impl<'a> StackReader<'a> {
    pub fn new(entries: &'a [StackEntry]) -> Self {
        Self {
            entries,
            position: 0,
        }
    }

    /// Number of entries not read yet
    pub fn remaining(&self) -> usize {
        self.entries.len() - self.position
    }

    fn next(&mut self, expected: &str) -> TvmResult<&'a StackEntry> {
        let entry = self.entries.get(self.position).ok_or_else(|| TvmError::StackDecode {
            index: self.position,
            reason: format!(
                "expected {}, stack has only {} entries",
                expected,
                self.entries.len()
            ),
        })?;
        self.position += 1;
        Ok(entry)
    }

    fn mismatch(&self, expected: &str, found: &StackEntry) -> TvmError {
        TvmError::StackDecode {
            index: self.position - 1,
            reason: format!("expected {}, found {}", expected, found.type_name()),
        }
    }

    pub fn read_big_int(&mut self) -> TvmResult<BigInt> {
        match self.next("int")? {
            StackEntry::Int(value) => Ok(value.clone()),
            other => Err(self.mismatch("int", other)),
        }
    }

    /// Reads a non-negative integer
    pub fn read_big_uint(&mut self) -> TvmResult<BigUint> {
        let value = self.read_big_int()?;
        match value.to_biguint() {
            Some(unsigned) => Ok(unsigned),
            None => Err(TvmError::StackDecode {
                index: self.position - 1,
                reason: format!("expected a non-negative int, found {}", value),
            }),
        }
    }

    /// Reads an integer as a TVM boolean (any non-zero value is true)
    pub fn read_bool(&mut self) -> TvmResult<bool> {
        Ok(self.read_big_int()?.sign() != Sign::NoSign)
    }

    pub fn read_cell(&mut self) -> TvmResult<Arc<Cell>> {
        match self.next("cell")? {
            StackEntry::Cell(cell) => Ok(cell.clone()),
            other => Err(self.mismatch("cell", other)),
        }
    }

    /// Reads a slice; a cell is accepted in its place
    pub fn read_slice(&mut self) -> TvmResult<Slice> {
        match self.next("slice")? {
            StackEntry::Slice(cell) | StackEntry::Cell(cell) => Ok(Slice::new(cell.clone())),
            other => Err(self.mismatch("slice", other)),
        }
    }

    /// Reads a slice holding a message address; `addr_none` yields `None`
    pub fn read_address(&mut self) -> TvmResult<Option<Address>> {
        let mut slice = self.read_slice()?;
        let index = self.position - 1;
        slice.load_address().map_err(|e| TvmError::StackDecode {
            index,
            reason: format!("slice does not hold an address: {}", e),
        })
    }
}
