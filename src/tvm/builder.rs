//! Enhanced Builder for constructing cells with convenient methods
//!
//! This module provides a high-level builder (`Builder`) that wraps the low-level
//! `CellBuilder` with additional convenience methods for common TON operations.
//!
//! - **`CellBuilder`** (in `cell.rs`): low-level bit/byte operations.
//! - **`Builder`** (this module): addresses, coins, snake strings, dictionaries
//!   and big integers on top of `CellBuilder`. Recommended for application code.
//!
//! Every `store_*` call appends in call order and fails instead of truncating
//! when the cell's bit or reference budget would be exceeded. [`Builder::build`]
//! is the only way to obtain a cell.
//!
//! # Examples
//!
//! ```rust
//! use jettonutils_rs::tvm::{Builder, Address};
//!
//! let mut builder = Builder::new();
//!
//! let addr = Address::new(0, [0u8; 32]);
//! builder.store_address(Some(&addr)).unwrap();
//! builder.store_coins(1_000_000_000).unwrap();
//!
//! let cell = builder.build().unwrap();
//! assert_eq!(cell.bit_len(), 267 + 4 + 32);
//! ```

use crate::tvm::address::Address;
use crate::tvm::cell::{Cell, CellBuilder, MAX_CELL_BITS, MAX_CELL_DEPTH, MAX_CELL_REFS};
use crate::tvm::error::{TvmError, TvmResult};
use crate::tvm::slice::Slice;
use num_bigint::{BigInt, BigUint, Sign};
use std::sync::Arc;

/// Largest byte length a `Coins` (VarUInteger 16) value may occupy
pub const MAX_COINS_BYTES: usize = 15;

/// Extended builder with convenience methods
#[derive(Debug, Clone, Default)]
pub struct Builder {
    inner: CellBuilder,
}

impl Builder {
    /// Creates a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bits used
    pub fn bit_len(&self) -> usize {
        self.inner.bit_len()
    }

    /// Returns the number of available bits
    pub fn available_bits(&self) -> usize {
        MAX_CELL_BITS - self.bit_len()
    }

    /// Returns the number of available whole bytes
    pub fn available_bytes(&self) -> usize {
        self.available_bits() / 8
    }

    /// Returns the number of references
    pub fn ref_count(&self) -> usize {
        self.inner.ref_count()
    }

    /// Returns the number of available references
    pub fn available_refs(&self) -> usize {
        MAX_CELL_REFS - self.ref_count()
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> TvmResult<&mut Self> {
        self.inner.store_bit(bit)?;
        Ok(self)
    }

    /// Stores multiple bits from a byte slice
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> TvmResult<&mut Self> {
        self.inner.store_bits(bits, bit_len)?;
        Ok(self)
    }

    /// Stores a byte
    pub fn store_byte(&mut self, byte: u8) -> TvmResult<&mut Self> {
        self.inner.store_byte(byte)?;
        Ok(self)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> TvmResult<&mut Self> {
        self.inner.store_bytes(bytes)?;
        Ok(self)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> TvmResult<&mut Self> {
        self.inner.store_u32(value)?;
        Ok(self)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> TvmResult<&mut Self> {
        self.inner.store_u64(value)?;
        Ok(self)
    }

    /// Stores an unsigned integer with specific bit length
    pub fn store_uint(&mut self, value: u64, bits: usize) -> TvmResult<&mut Self> {
        self.inner.store_uint(value, bits)?;
        Ok(self)
    }

    /// Stores a signed integer with specific bit length (two's complement)
    pub fn store_int(&mut self, value: i64, bits: usize) -> TvmResult<&mut Self> {
        if bits == 0 || bits > 64 {
            return Err(TvmError::InvalidValue(format!(
                "cannot store a signed integer in {} bits",
                bits
            )));
        }

        if bits < 64 {
            let bound = 1i64 << (bits - 1);
            if value < -bound || value >= bound {
                return Err(TvmError::InvalidValue(format!(
                    "value {} does not fit in {} signed bits",
                    value, bits
                )));
            }
        }

        let mask = if bits == 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        };
        self.store_uint((value as u64) & mask, bits)
    }

    /// Stores an arbitrary-precision unsigned integer in exactly `bits` bits
    pub fn store_big_uint(&mut self, value: &BigUint, bits: usize) -> TvmResult<&mut Self> {
        if value.bits() as usize > bits {
            return Err(TvmError::InvalidValue(format!(
                "value {} does not fit in {} bits",
                value, bits
            )));
        }

        // Left-align so the most significant of the `bits` bits comes first
        let padded_len = bits.div_ceil(8);
        let aligned = value << (padded_len * 8 - bits);
        let bytes = aligned.to_bytes_be();
        let mut buf = vec![0u8; padded_len.saturating_sub(bytes.len())];
        buf.extend_from_slice(&bytes);
        self.store_bits(&buf, bits)
    }

    /// Stores an arbitrary-precision signed integer in exactly `bits` bits
    pub fn store_big_int(&mut self, value: &BigInt, bits: usize) -> TvmResult<&mut Self> {
        if bits == 0 {
            return Err(TvmError::InvalidValue(
                "cannot store a signed integer in 0 bits".to_string(),
            ));
        }

        let bound = BigInt::from(1u8) << (bits - 1);
        if *value < -bound.clone() || *value >= bound {
            return Err(TvmError::InvalidValue(format!(
                "value {} does not fit in {} signed bits",
                value, bits
            )));
        }

        let unsigned = match value.sign() {
            Sign::Minus => (BigInt::from(1u8) << bits) + value,
            _ => value.clone(),
        };
        let magnitude = unsigned.magnitude().clone();
        self.store_big_uint(&magnitude, bits)
    }

    /// Stores a reference to another cell
    pub fn store_ref(&mut self, cell: Arc<Cell>) -> TvmResult<&mut Self> {
        self.inner.store_reference(cell)?;
        Ok(self)
    }

    /// Stores an optional reference (Maybe ^Cell)
    pub fn store_maybe_ref(&mut self, cell: Option<Arc<Cell>>) -> TvmResult<&mut Self> {
        match cell {
            Some(c) => {
                self.store_bit(true)?;
                self.store_ref(c)?;
            }
            None => {
                self.store_bit(false)?;
            }
        }
        Ok(self)
    }

    /// Stores the contents (bits and references) of another cell
    pub fn store_cell(&mut self, cell: &Arc<Cell>) -> TvmResult<&mut Self> {
        if self.ref_count() + cell.reference_count() > MAX_CELL_REFS {
            return Err(TvmError::Overflow("builder refs overflow".to_string()));
        }

        self.store_bits(cell.data(), cell.bit_len())?;
        for reference in cell.references() {
            self.store_ref(reference.clone())?;
        }

        Ok(self)
    }

    /// Stores the unread remainder of a slice
    pub fn store_slice(&mut self, slice: &Slice) -> TvmResult<&mut Self> {
        let mut rest = slice.clone();
        if self.ref_count() + rest.remaining_refs() > MAX_CELL_REFS {
            return Err(TvmError::Overflow("builder refs overflow".to_string()));
        }

        let bit_len = rest.remaining_bits();
        let bits = rest.load_bits(bit_len)?;
        self.store_bits(&bits, bit_len)?;

        for reference in rest.load_remaining_refs()? {
            self.store_ref(reference)?;
        }

        Ok(self)
    }

    /// Stores coins (VarUInteger 16): a 4-bit byte length followed by the value
    pub fn store_coins(&mut self, amount: u128) -> TvmResult<&mut Self> {
        if amount == 0 {
            return self.store_uint(0, 4);
        }

        let byte_len = ((128 - amount.leading_zeros()) as usize).div_ceil(8);
        if byte_len > MAX_COINS_BYTES {
            return Err(TvmError::InvalidValue(format!(
                "coins value {} exceeds {} bytes",
                amount, MAX_COINS_BYTES
            )));
        }

        self.store_uint(byte_len as u64, 4)?;
        let bytes = amount.to_be_bytes();
        self.store_bytes(&bytes[16 - byte_len..])?;

        Ok(self)
    }

    /// Stores a string using snake encoding, optionally with a leading 0x00 tag
    pub fn store_snake_string(&mut self, s: &str, with_prefix: bool) -> TvmResult<&mut Self> {
        if with_prefix {
            self.store_byte(0x00)?;
        }
        self.store_snake_bytes(s.as_bytes())
    }

    /// Stores bytes using snake encoding (continues in a child cell when full)
    ///
    /// Fails when the chain of continuation cells would exceed the maximum
    /// cell depth.
    pub fn store_snake_bytes(&mut self, bytes: &[u8]) -> TvmResult<&mut Self> {
        if bytes.is_empty() {
            return Ok(self);
        }

        let available = self.available_bytes();
        if bytes.len() <= available {
            return self.store_bytes(bytes);
        }

        if self.available_refs() == 0 {
            return Err(TvmError::Overflow(
                "no reference left to continue snake data".to_string(),
            ));
        }

        let (head, tail) = bytes.split_at(available);
        let chunk = MAX_CELL_BITS / 8;
        let chained = tail.len().div_ceil(chunk);
        if chained > MAX_CELL_DEPTH as usize {
            return Err(TvmError::Overflow(format!(
                "snake data needs {} chained cells, maximum depth is {}",
                chained, MAX_CELL_DEPTH
            )));
        }

        // Build the chain from its last cell back to the first
        let mut next: Option<Arc<Cell>> = None;
        for piece in tail.chunks(chunk).rev() {
            let mut builder = Builder::new();
            builder.store_bytes(piece)?;
            if let Some(child) = next.take() {
                builder.store_ref(child)?;
            }
            next = Some(builder.build()?);
        }

        self.store_bytes(head)?;
        if let Some(child) = next {
            self.store_ref(child)?;
        }

        Ok(self)
    }

    /// Stores a message address: `addr_none$00` for `None`, otherwise `addr_std$10`
    pub fn store_address(&mut self, address: Option<&Address>) -> TvmResult<&mut Self> {
        match address {
            None => {
                self.store_uint(0b00, 2)?;
            }
            Some(addr) => {
                // addr_std$10 anycast:(Maybe Anycast) workchain_id:int8 address:bits256
                self.store_uint(0b10, 2)?;
                self.store_bit(false)?;
                self.store_int(addr.workchain as i64, 8)?;
                self.store_bytes(&addr.hash_part)?;
            }
        }
        Ok(self)
    }

    /// Stores a dictionary root (HashmapE: 0 for empty, 1 + ^root otherwise)
    pub fn store_dict(&mut self, dict: Option<Arc<Cell>>) -> TvmResult<&mut Self> {
        self.store_maybe_ref(dict)
    }

    /// Builds the cell
    pub fn build(self) -> TvmResult<Arc<Cell>> {
        self.inner.build()
    }

    /// Converts to a cell (alias for build)
    pub fn end_cell(self) -> TvmResult<Arc<Cell>> {
        self.build()
    }

    /// Converts to a slice
    pub fn to_slice(self) -> TvmResult<Slice> {
        let cell = self.build()?;
        Ok(Slice::new(cell))
    }
}
