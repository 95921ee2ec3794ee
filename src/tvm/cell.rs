//! Cell implementation for TON blockchain
//!
//! A cell is the fundamental data structure in TON: it stores up to 1023 bits
//! of data and up to 4 references to other cells. Cells are immutable once
//! built, and two cells are equal exactly when their representation hashes
//! are equal.

use crate::tvm::error::{TvmError, TvmResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Maximum number of bits a cell can store
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references a cell can have
pub const MAX_CELL_REFS: usize = 4;

/// Maximum depth of a cell tree
pub const MAX_CELL_DEPTH: u16 = 1024;

/// Represents an ordinary cell in the TON blockchain
#[derive(Debug, Clone)]
pub struct Cell {
    /// Cell data as bytes, bits past `bit_len` are always zero
    data: Vec<u8>,
    /// Number of bits in the cell (not necessarily a multiple of 8)
    bit_len: usize,
    /// References to other cells
    references: Vec<Arc<Cell>>,
    /// Representation hash, computed once at construction
    hash: [u8; 32],
    /// Depth of the subtree rooted at this cell
    depth: u16,
}

impl Cell {
    /// Creates a new empty cell
    pub fn new() -> Self {
        Self::assemble(Vec::new(), 0, Vec::new())
    }

    /// Creates a cell with the given data and bit length and no references
    pub fn with_data(data: Vec<u8>, bit_len: usize) -> TvmResult<Self> {
        Self::new_ordinary(data, bit_len, Vec::new())
    }

    /// Creates an ordinary cell from data, bit length and references
    pub fn new_ordinary(
        mut data: Vec<u8>,
        bit_len: usize,
        references: Vec<Arc<Cell>>,
    ) -> TvmResult<Self> {
        if bit_len > MAX_CELL_BITS {
            return Err(TvmError::Overflow(format!(
                "cell bit length {} exceeds maximum {}",
                bit_len, MAX_CELL_BITS
            )));
        }
        if references.len() > MAX_CELL_REFS {
            return Err(TvmError::Overflow(format!(
                "cell has {} references, maximum is {}",
                references.len(),
                MAX_CELL_REFS
            )));
        }

        if references.iter().any(|r| r.depth() >= MAX_CELL_DEPTH) {
            return Err(TvmError::Overflow(format!(
                "cell depth would exceed maximum {}",
                MAX_CELL_DEPTH
            )));
        }

        let required_bytes = bit_len.div_ceil(8);
        if data.len() < required_bytes {
            return Err(TvmError::InvalidValue(format!(
                "data length {} is insufficient for {} bits",
                data.len(),
                bit_len
            )));
        }

        data.truncate(required_bytes);
        if bit_len % 8 != 0 {
            let last = required_bytes - 1;
            data[last] &= 0xFFu8 << (8 - bit_len % 8);
        }

        Ok(Self::assemble(data, bit_len, references))
    }

    fn assemble(data: Vec<u8>, bit_len: usize, references: Vec<Arc<Cell>>) -> Self {
        let depth = references
            .iter()
            .map(|r| r.depth() + 1)
            .max()
            .unwrap_or(0);

        let mut cell = Self {
            data,
            bit_len,
            references,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = cell.compute_hash();
        cell
    }

    /// Returns the cell's data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bits in the cell
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the cell's references
    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    /// Returns the number of references
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Gets a reference by index
    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.references.get(index)
    }

    /// Computes the cell's descriptors (2 bytes)
    pub fn descriptors(&self) -> [u8; 2] {
        // d1 = r + 8*s + 32*l; ordinary level-0 cells only carry r
        let refs_descriptor = self.references.len() as u8;
        // d2 = floor(b/8) + ceil(b/8)
        let bits_descriptor = (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8;

        [refs_descriptor, bits_descriptor]
    }

    /// Serializes the cell data, appending the completion tag for partial bytes
    pub fn serialize_data(&self) -> Vec<u8> {
        let mut result = self.data.clone();

        if self.bit_len % 8 != 0 {
            let last_byte_idx = self.bit_len / 8;
            let bits_in_last_byte = self.bit_len % 8;
            result[last_byte_idx] |= 1 << (7 - bits_in_last_byte);
        }

        result
    }

    /// Returns the depth of the cell
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Returns the representation hash of the cell
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    /// Returns the representation hash as a hex string
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();

        hasher.update(self.descriptors());
        hasher.update(self.serialize_data());

        for reference in &self.references {
            hasher.update(reference.depth().to_be_bytes());
        }

        for reference in &self.references {
            hasher.update(Cell::hash(reference));
        }

        hasher.finalize().into()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cell{{bits: {}, refs: {}, hash: {}}}",
            self.bit_len,
            self.references.len(),
            self.hash_hex()
        )
    }
}

/// Low-level builder for constructing cells
///
/// This is the core, minimal builder that provides basic bit/byte operations.
/// For a higher-level API with TON-specific convenience methods, see [`Builder`](crate::tvm::Builder).
///
/// # Example
///
/// ```rust
/// use jettonutils_rs::tvm::CellBuilder;
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x12345678).unwrap();
/// builder.store_byte(0xFF).unwrap();
/// let cell = builder.build().unwrap();
/// assert_eq!(cell.bit_len(), 40);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Creates a new cell builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bits stored so far
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the number of references stored so far
    pub fn ref_count(&self) -> usize {
        self.references.len()
    }

    /// Stores the first `bit_len` bits of a byte slice
    pub fn store_bits(&mut self, bits: &[u8], bit_len: usize) -> TvmResult<&mut Self> {
        if self.bit_len + bit_len > MAX_CELL_BITS {
            return Err(TvmError::Overflow(format!(
                "cannot store {} bits: {} of {} already used",
                bit_len, self.bit_len, MAX_CELL_BITS
            )));
        }

        if bits.len() < bit_len.div_ceil(8) {
            return Err(TvmError::InvalidValue(format!(
                "insufficient data for {} bits",
                bit_len
            )));
        }

        for i in 0..bit_len {
            let bit = (bits[i / 8] >> (7 - (i % 8))) & 1;

            let target_byte_idx = self.bit_len / 8;
            if target_byte_idx >= self.data.len() {
                self.data.push(0);
            }
            if bit == 1 {
                self.data[target_byte_idx] |= 1 << (7 - (self.bit_len % 8));
            }

            self.bit_len += 1;
        }

        Ok(self)
    }

    /// Stores a byte
    pub fn store_byte(&mut self, byte: u8) -> TvmResult<&mut Self> {
        self.store_bits(&[byte], 8)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> TvmResult<&mut Self> {
        self.store_bits(bytes, bytes.len() * 8)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> TvmResult<&mut Self> {
        self.store_bits(&value.to_be_bytes(), 32)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> TvmResult<&mut Self> {
        self.store_bits(&value.to_be_bytes(), 64)
    }

    /// Stores `value` in exactly `bits` bits, big-endian bit order
    ///
    /// Fails if the value does not fit: nothing is ever silently truncated.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> TvmResult<&mut Self> {
        if bits > 64 {
            return Err(TvmError::InvalidValue(format!(
                "cannot store {} bits from u64",
                bits
            )));
        }
        if bits < 64 && value >> bits != 0 {
            return Err(TvmError::InvalidValue(format!(
                "value {} does not fit in {} bits",
                value, bits
            )));
        }
        if bits == 0 {
            return Ok(self);
        }

        let shifted = value << (64 - bits);
        self.store_bits(&shifted.to_be_bytes(), bits)
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> TvmResult<&mut Self> {
        self.store_bits(&[if bit { 0x80 } else { 0x00 }], 1)
    }

    /// Adds a reference to another cell
    pub fn store_reference(&mut self, cell: Arc<Cell>) -> TvmResult<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(TvmError::Overflow(format!(
                "cannot add reference: maximum {} references allowed",
                MAX_CELL_REFS
            )));
        }
        self.references.push(cell);
        Ok(self)
    }

    /// Builds the cell
    pub fn build(self) -> TvmResult<Arc<Cell>> {
        Ok(Arc::new(Cell::new_ordinary(
            self.data,
            self.bit_len,
            self.references,
        )?))
    }
}
