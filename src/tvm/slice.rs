//! Slice implementation for reading data from cells
//!
//! A Slice provides a way to read data from a Cell sequentially,
//! tracking the current position in both bits and references. Reads never
//! pad: asking for more bits or references than remain is an underflow error.

use crate::tvm::address::Address;
use crate::tvm::builder::MAX_COINS_BYTES;
use crate::tvm::cell::Cell;
use crate::tvm::error::{TvmError, TvmResult};
use num_bigint::{BigInt, BigUint};
use std::sync::Arc;

/// A slice for reading data from a cell
#[derive(Debug, Clone)]
pub struct Slice {
    /// The cell being read
    cell: Arc<Cell>,
    /// Current bit position in the cell
    bit_pos: usize,
    /// Current reference position
    ref_pos: usize,
}

impl Slice {
    /// Creates a new slice from a cell
    pub fn new(cell: Arc<Cell>) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// Returns the number of remaining bits
    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len().saturating_sub(self.bit_pos)
    }

    /// Returns the number of remaining references
    pub fn remaining_refs(&self) -> usize {
        self.cell.reference_count().saturating_sub(self.ref_pos)
    }

    /// Checks if there are any remaining bits or references
    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0 && self.remaining_refs() == 0
    }

    fn ensure_bits(&self, n: usize) -> TvmResult<()> {
        if n > self.remaining_bits() {
            return Err(TvmError::bits_underflow(n, self.remaining_bits()));
        }
        Ok(())
    }

    fn ensure_refs(&self, n: usize) -> TvmResult<()> {
        if n > self.remaining_refs() {
            return Err(TvmError::refs_underflow(n, self.remaining_refs()));
        }
        Ok(())
    }

    /// Loads a single bit
    pub fn load_bit(&mut self) -> TvmResult<bool> {
        self.ensure_bits(1)?;

        let byte = self.cell.data()[self.bit_pos / 8];
        let bit = (byte >> (7 - (self.bit_pos % 8))) & 1;
        self.bit_pos += 1;

        Ok(bit == 1)
    }

    /// Loads multiple bits into a left-aligned byte vector
    pub fn load_bits(&mut self, n: usize) -> TvmResult<Vec<u8>> {
        self.ensure_bits(n)?;

        let mut result = vec![0u8; n.div_ceil(8)];
        for i in 0..n {
            if self.load_bit()? {
                result[i / 8] |= 1 << (7 - (i % 8));
            }
        }

        Ok(result)
    }

    /// Loads a byte (8 bits)
    pub fn load_byte(&mut self) -> TvmResult<u8> {
        Ok(self.load_uint(8)? as u8)
    }

    /// Loads multiple bytes
    pub fn load_bytes(&mut self, n: usize) -> TvmResult<Vec<u8>> {
        self.load_bits(n * 8)
    }

    /// Loads a u16 value (16 bits, big-endian)
    pub fn load_u16(&mut self) -> TvmResult<u16> {
        Ok(self.load_uint(16)? as u16)
    }

    /// Loads a u32 value (32 bits, big-endian)
    pub fn load_u32(&mut self) -> TvmResult<u32> {
        Ok(self.load_uint(32)? as u32)
    }

    /// Loads a u64 value (64 bits, big-endian)
    pub fn load_u64(&mut self) -> TvmResult<u64> {
        self.load_uint(64)
    }

    /// Loads a uint with a specific number of bits
    pub fn load_uint(&mut self, bits: usize) -> TvmResult<u64> {
        if bits > 64 {
            return Err(TvmError::InvalidValue(format!(
                "cannot load {} bits into u64",
                bits
            )));
        }
        self.ensure_bits(bits)?;

        let mut result = 0u64;
        for _ in 0..bits {
            result = (result << 1) | self.load_bit()? as u64;
        }

        Ok(result)
    }

    /// Loads a signed integer with a specific number of bits
    pub fn load_int(&mut self, bits: usize) -> TvmResult<i64> {
        if bits > 64 {
            return Err(TvmError::InvalidValue(format!(
                "cannot load {} bits into i64",
                bits
            )));
        }

        if bits == 0 {
            return Ok(0);
        }

        let unsigned = self.load_uint(bits)?;

        let sign_bit = 1u64 << (bits - 1);
        if bits < 64 && unsigned & sign_bit != 0 {
            let mask = !0u64 << bits;
            Ok((unsigned | mask) as i64)
        } else {
            Ok(unsigned as i64)
        }
    }

    /// Loads an arbitrary-precision unsigned integer of `bits` bits
    pub fn load_big_uint(&mut self, bits: usize) -> TvmResult<BigUint> {
        let bytes = self.load_bits(bits)?;
        let value = BigUint::from_bytes_be(&bytes);
        Ok(value >> (bytes.len() * 8 - bits))
    }

    /// Loads an arbitrary-precision two's complement integer of `bits` bits
    pub fn load_big_int(&mut self, bits: usize) -> TvmResult<BigInt> {
        if bits == 0 {
            return Ok(BigInt::from(0u8));
        }

        let unsigned = BigInt::from(self.load_big_uint(bits)?);
        let sign_bit = BigInt::from(1u8) << (bits - 1);
        if unsigned >= sign_bit {
            Ok(unsigned - (BigInt::from(1u8) << bits))
        } else {
            Ok(unsigned)
        }
    }

    /// Loads a reference to another cell
    pub fn load_reference(&mut self) -> TvmResult<Arc<Cell>> {
        self.ensure_refs(1)?;

        let reference = self.cell.references()[self.ref_pos].clone();
        self.ref_pos += 1;
        Ok(reference)
    }

    /// Loads an optional reference (Maybe ^Cell)
    pub fn load_maybe_ref(&mut self) -> TvmResult<Option<Arc<Cell>>> {
        if self.load_bit()? {
            Ok(Some(self.load_reference()?))
        } else {
            Ok(None)
        }
    }

    /// Preloads a reference without advancing the position
    pub fn preload_reference(&self, index: usize) -> TvmResult<Arc<Cell>> {
        self.ensure_refs(index + 1)?;
        Ok(self.cell.references()[self.ref_pos + index].clone())
    }

    /// Skips a number of bits
    pub fn skip_bits(&mut self, n: usize) -> TvmResult<()> {
        self.ensure_bits(n)?;
        self.bit_pos += n;
        Ok(())
    }

    /// Skips a number of references
    pub fn skip_refs(&mut self, n: usize) -> TvmResult<()> {
        self.ensure_refs(n)?;
        self.ref_pos += n;
        Ok(())
    }

    /// Gets the underlying cell
    pub fn cell(&self) -> &Arc<Cell> {
        &self.cell
    }

    /// Gets the current bit position
    pub fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Gets the current reference position
    pub fn ref_position(&self) -> usize {
        self.ref_pos
    }

    /// Resets the slice to the beginning
    pub fn reset(&mut self) {
        self.bit_pos = 0;
        self.ref_pos = 0;
    }

    /// Loads all remaining bits
    pub fn load_remaining_bits(&mut self) -> TvmResult<Vec<u8>> {
        let remaining = self.remaining_bits();
        self.load_bits(remaining)
    }

    /// Loads all remaining references
    pub fn load_remaining_refs(&mut self) -> TvmResult<Vec<Arc<Cell>>> {
        let mut refs = Vec::new();
        while self.remaining_refs() > 0 {
            refs.push(self.load_reference()?);
        }
        Ok(refs)
    }

    /// Fails unless every bit and reference has been consumed
    pub fn ensure_empty(&self) -> TvmResult<()> {
        if !self.is_empty() {
            return Err(TvmError::Format(format!(
                "{} bits and {} refs left unread",
                self.remaining_bits(),
                self.remaining_refs()
            )));
        }
        Ok(())
    }

    /// Loads coins (VarUInteger 16)
    pub fn load_coins(&mut self) -> TvmResult<u128> {
        let len = self.load_uint(4)? as usize;
        if len > MAX_COINS_BYTES {
            return Err(TvmError::Format(format!(
                "coins length {} exceeds maximum {}",
                len, MAX_COINS_BYTES
            )));
        }

        let bytes = self.load_bytes(len)?;
        Ok(bytes
            .iter()
            .fold(0u128, |acc, &byte| (acc << 8) | byte as u128))
    }

    /// Loads a message address; `addr_none` yields `None`
    pub fn load_address(&mut self) -> TvmResult<Option<Address>> {
        match self.load_uint(2)? {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(TvmError::Format(
                        "anycast addresses are not supported".to_string(),
                    ));
                }
                let workchain = self.load_int(8)? as i8;
                let bytes = self.load_bytes(32)?;
                let mut hash_part = [0u8; 32];
                hash_part.copy_from_slice(&bytes);
                Ok(Some(Address::new(workchain, hash_part)))
            }
            0b01 => Err(TvmError::Format(
                "external address where an internal one was expected".to_string(),
            )),
            _ => Err(TvmError::Format(
                "addr_var is not supported".to_string(),
            )),
        }
    }

    /// Loads an address that must be present (not `addr_none`)
    pub fn load_internal_address(&mut self) -> TvmResult<Address> {
        self.load_address()?
            .ok_or_else(|| TvmError::Format("expected an address, found addr_none".to_string()))
    }

    /// Loads snake-encoded bytes: the remaining bits of this cell followed by
    /// the chain of first references
    pub fn load_snake_bytes(&mut self) -> TvmResult<Vec<u8>> {
        if self.remaining_bits() % 8 != 0 {
            return Err(TvmError::Format(format!(
                "snake data has {} bits, not a whole number of bytes",
                self.remaining_bits()
            )));
        }

        let mut result = self.load_remaining_bits()?;
        if self.remaining_refs() > 0 {
            let mut next = Slice::new(self.load_reference()?);
            result.extend(next.load_snake_bytes()?);
        }

        Ok(result)
    }

    /// Loads a snake-encoded UTF-8 string
    pub fn load_snake_string(&mut self) -> TvmResult<String> {
        let bytes = self.load_snake_bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| TvmError::Format(format!("snake string is not UTF-8: {}", e)))
    }
}

impl From<Arc<Cell>> for Slice {
    fn from(cell: Arc<Cell>) -> Self {
        Self::new(cell)
    }
}
