//! TVM (TON Virtual Machine) data structures and utilities
//!
//! This module provides implementations of fundamental TON blockchain data structures:
//! - Cell: The basic data structure that can store up to 1023 bits and up to 4 references
//! - Builder / Slice: sequential writer and reader over cells
//! - BoC: Bag of Cells serialization format for encoding cells into byte arrays
//! - Address: internal addresses and their text forms
//! - Dict: HashmapE dictionaries, including SHA-256 keyed ones
//! - StateInit: contract initial state and address derivation
//! - Stack: typed get-method results

pub mod address;
pub mod boc;
pub mod builder;
pub mod cell;
pub mod dict;
pub mod error;
pub mod slice;
pub mod stack;
pub mod state_init;

pub use address::Address;
pub use boc::{
    base64_to_boc, boc_to_base64, boc_to_hex, deserialize_boc, hex_to_boc, serialize_boc,
};
pub use builder::Builder;
pub use cell::{Cell, CellBuilder, MAX_CELL_BITS, MAX_CELL_DEPTH, MAX_CELL_REFS};
pub use dict::{Dict, DictKey, DictValue, HASHED_KEY_BITS};
pub use error::{ErrorKind, TvmError, TvmResult};
pub use slice::Slice;
pub use stack::{StackEntry, StackReader};
pub use state_init::{StateInit, derive_address};
