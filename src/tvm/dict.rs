//! TON Dictionary (HashmapE) implementation
//!
//! Dictionaries are binary Patricia tries stored in cells:
//!
//! ```text
//! hm_edge#_ label:(HmLabel ~l n) node:(HashmapNode m X) = Hashmap n X;
//! hmn_leaf#_ value:X = HashmapNode 0 X;
//! hmn_fork#_ left:^(Hashmap n X) right:^(Hashmap n X) = HashmapNode (n + 1) X;
//! hml_short$0 len:(Unary ~n) s:(n * Bit) = HmLabel ~n m;
//! hml_long$10 n:(#<= m) s:(n * Bit) = HmLabel ~n m;
//! hml_same$11 v:Bit n:(#<= m) = HmLabel ~n m;
//! hme_empty$0 = HashmapE n X;
//! hme_root$1 root:^(Hashmap n X) = HashmapE n X;
//! ```
//!
//! Entries live in a sorted map, so the serialized trie depends only on the
//! key set and never on insertion order. Each edge uses the shortest label
//! encoding, preferring short, then long, then same on ties.

use crate::tvm::address::Address;
use crate::tvm::builder::Builder;
use crate::tvm::cell::Cell;
use crate::tvm::error::{TvmError, TvmResult};
use crate::tvm::slice::Slice;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Key width of dictionaries keyed by SHA-256 of a name
pub const HASHED_KEY_BITS: usize = 256;

/// Dictionary key type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DictKey {
    /// Integer key
    Int(u64),
    /// Binary key (as bit string)
    Bits(Vec<u8>, usize), // data, bit_length
    /// Address key (267 bits)
    Address(Address),
}

impl DictKey {
    /// Builds a 256-bit key from the SHA-256 of `name`
    pub fn hashed(name: &[u8]) -> Self {
        let digest: [u8; 32] = Sha256::digest(name).into();
        DictKey::Bits(digest.to_vec(), HASHED_KEY_BITS)
    }
}

/// Dictionary value type
#[derive(Debug, Clone)]
pub enum DictValue {
    /// Cell value, stored as a reference in the leaf
    Cell(Arc<Cell>),
    /// Slice value, stored inline in the leaf
    Slice(Slice),
    /// Integer value
    Uint(u64, usize), // value, bit_length
    /// Coins value
    Coins(u128),
}

impl DictValue {
    fn store(&self, builder: &mut Builder) -> TvmResult<()> {
        match self {
            DictValue::Cell(cell) => {
                builder.store_ref(cell.clone())?;
            }
            DictValue::Slice(slice) => {
                builder.store_slice(slice)?;
            }
            DictValue::Uint(value, bits) => {
                builder.store_uint(*value, *bits)?;
            }
            DictValue::Coins(amount) => {
                builder.store_coins(*amount)?;
            }
        }
        Ok(())
    }

    /// Returns the referenced cell of a cell-valued entry
    ///
    /// Entries read back from a serialized dictionary are raw slices; for
    /// those the first remaining reference is the value.
    pub fn as_cell(&self) -> TvmResult<Arc<Cell>> {
        match self {
            DictValue::Cell(cell) => Ok(cell.clone()),
            DictValue::Slice(slice) => slice.preload_reference(0),
            other => Err(TvmError::InvalidValue(format!(
                "dictionary value is not a cell: {:?}",
                other
            ))),
        }
    }

    /// Returns a slice positioned at the start of the leaf value
    pub fn as_slice(&self) -> TvmResult<Slice> {
        match self {
            DictValue::Slice(slice) => Ok(slice.clone()),
            other => {
                let mut builder = Builder::new();
                other.store(&mut builder)?;
                builder.to_slice()
            }
        }
    }
}

/// TON Dictionary (HashmapE)
///
/// Represents a dictionary with fixed-size keys stored as a binary trie in cells.
#[derive(Debug, Clone)]
pub struct Dict {
    /// Key size in bits
    key_size: usize,
    /// Entries keyed by their bit string, kept sorted
    map: BTreeMap<Vec<bool>, DictValue>,
}

impl Dict {
    /// Creates a new dictionary with the specified key size
    pub fn new(key_size: usize) -> Self {
        Self {
            key_size,
            map: BTreeMap::new(),
        }
    }

    /// Builds a 256-bit dictionary keyed by the SHA-256 of each name
    pub fn from_hashed<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a [u8], DictValue)>,
    {
        let mut dict = Self::new(HASHED_KEY_BITS);
        for (name, value) in entries {
            dict.insert_bits(hash_bits(name), value);
        }
        dict
    }

    fn key_bits(&self, key: &DictKey) -> TvmResult<Vec<bool>> {
        match key {
            DictKey::Int(k) => {
                if self.key_size < 64 && k >> self.key_size != 0 {
                    return Err(TvmError::InvalidValue(format!(
                        "key {} does not fit in {} bits",
                        k, self.key_size
                    )));
                }
                Ok((0..self.key_size)
                    .rev()
                    .map(|i| i < 64 && (k >> i) & 1 == 1)
                    .collect())
            }
            DictKey::Bits(data, bit_len) => {
                if *bit_len != self.key_size {
                    return Err(TvmError::InvalidValue(format!(
                        "key has {} bits, dictionary uses {}",
                        bit_len, self.key_size
                    )));
                }
                if data.len() < bit_len.div_ceil(8) {
                    return Err(TvmError::InvalidValue(format!(
                        "insufficient key data for {} bits",
                        bit_len
                    )));
                }
                Ok(bytes_to_bits(data, *bit_len))
            }
            DictKey::Address(addr) => {
                if self.key_size != 267 {
                    return Err(TvmError::InvalidValue(
                        "address keys require key_size of 267 bits".to_string(),
                    ));
                }
                let mut builder = Builder::new();
                builder.store_address(Some(addr))?;
                let cell = builder.build()?;
                Ok(bytes_to_bits(cell.data(), cell.bit_len()))
            }
        }
    }

    fn insert_bits(&mut self, key: Vec<bool>, value: DictValue) {
        self.map.insert(key, value);
    }

    /// Sets a value for an integer key
    pub fn set_int_key(&mut self, key: u64, value: DictValue) -> TvmResult<&mut Self> {
        self.set(DictKey::Int(key), value)
    }

    /// Sets a value for a key
    pub fn set(&mut self, key: DictKey, value: DictValue) -> TvmResult<&mut Self> {
        let bits = self.key_bits(&key)?;
        self.insert_bits(bits, value);
        Ok(self)
    }

    /// Gets a value by integer key
    pub fn get_int_key(&self, key: u64) -> TvmResult<Option<&DictValue>> {
        self.get(&DictKey::Int(key))
    }

    /// Gets a value by key
    pub fn get(&self, key: &DictKey) -> TvmResult<Option<&DictValue>> {
        let bits = self.key_bits(key)?;
        Ok(self.map.get(&bits))
    }

    /// Looks up the entry stored under the SHA-256 of `name`
    pub fn get_hashed(&self, name: &[u8]) -> TvmResult<Option<&DictValue>> {
        self.get(&DictKey::hashed(name))
    }

    /// Removes an entry, returning it if it was present
    pub fn remove(&mut self, key: &DictKey) -> TvmResult<Option<DictValue>> {
        let bits = self.key_bits(key)?;
        Ok(self.map.remove(&bits))
    }

    /// Returns the number of entries in the dictionary
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the key size in bits
    pub fn key_size(&self) -> usize {
        self.key_size
    }

    /// Iterates entries in key order; keys are returned left-aligned in bytes
    pub fn iter(&self) -> impl Iterator<Item = (Vec<u8>, &DictValue)> {
        self.map.iter().map(|(k, v)| (bits_to_bytes(k), v))
    }

    /// Serializes the dictionary to its root cell, `None` when empty
    pub fn serialize(&self) -> TvmResult<Option<Arc<Cell>>> {
        if self.is_empty() {
            return Ok(None);
        }

        let entries: Vec<(&[bool], &DictValue)> =
            self.map.iter().map(|(k, v)| (k.as_slice(), v)).collect();
        Ok(Some(serialize_edge(&entries, self.key_size)?))
    }

    /// Deserializes a dictionary from its root cell
    pub fn deserialize(root: &Arc<Cell>, key_size: usize) -> TvmResult<Self> {
        let mut dict = Self::new(key_size);
        parse_edge(root.clone(), key_size, Vec::with_capacity(key_size), &mut dict.map)?;
        Ok(dict)
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new(HASHED_KEY_BITS)
    }
}

fn hash_bits(name: &[u8]) -> Vec<bool> {
    bytes_to_bits(&Sha256::digest(name), HASHED_KEY_BITS)
}

fn bytes_to_bits(data: &[u8], bit_len: usize) -> Vec<bool> {
    (0..bit_len)
        .map(|i| (data[i / 8] >> (7 - i % 8)) & 1 == 1)
        .collect()
}

fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            out[i / 8] |= 1 << (7 - i % 8);
        }
    }
    out
}

/// Number of bits needed to write any value in `0..=max`
fn len_bits(max: usize) -> usize {
    (usize::BITS - max.leading_zeros()) as usize
}

fn serialize_edge(entries: &[(&[bool], &DictValue)], key_len: usize) -> TvmResult<Arc<Cell>> {
    let first = entries[0].0;
    let last = entries[entries.len() - 1].0;
    let prefix_len = if entries.len() == 1 {
        key_len
    } else {
        first.iter().zip(last).take_while(|(a, b)| a == b).count()
    };

    let mut builder = Builder::new();
    store_label(&mut builder, &first[..prefix_len], key_len)?;

    if entries.len() == 1 {
        entries[0].1.store(&mut builder)?;
        return builder.build();
    }

    let split = prefix_len + 1;
    let rest = key_len - split;
    let (left, right): (Vec<_>, Vec<_>) = entries
        .iter()
        .map(|(k, v)| (&k[split..], *v, k[prefix_len]))
        .partition(|(_, _, bit)| !*bit);

    let left: Vec<(&[bool], &DictValue)> = left.into_iter().map(|(k, v, _)| (k, v)).collect();
    let right: Vec<(&[bool], &DictValue)> = right.into_iter().map(|(k, v, _)| (k, v)).collect();

    builder.store_ref(serialize_edge(&left, rest)?)?;
    builder.store_ref(serialize_edge(&right, rest)?)?;
    builder.build()
}

fn store_label(builder: &mut Builder, label: &[bool], max_len: usize) -> TvmResult<()> {
    let n = label.len();
    let width = len_bits(max_len);

    let short_len = 2 * n + 2;
    let long_len = 2 + width + n;
    let same_len = 3 + width;
    let is_same = label.windows(2).all(|w| w[0] == w[1]);

    let mut best = short_len;
    let mut kind = LabelKind::Short;
    if long_len < best {
        best = long_len;
        kind = LabelKind::Long;
    }
    if is_same && same_len < best {
        kind = LabelKind::Same;
    }

    match kind {
        LabelKind::Short => {
            builder.store_bit(false)?;
            for _ in 0..n {
                builder.store_bit(true)?;
            }
            builder.store_bit(false)?;
            for bit in label {
                builder.store_bit(*bit)?;
            }
        }
        LabelKind::Long => {
            builder.store_uint(0b10, 2)?;
            builder.store_uint(n as u64, width)?;
            for bit in label {
                builder.store_bit(*bit)?;
            }
        }
        LabelKind::Same => {
            builder.store_uint(0b11, 2)?;
            builder.store_bit(label[0])?;
            builder.store_uint(n as u64, width)?;
        }
    }
    Ok(())
}

enum LabelKind {
    Short,
    Long,
    Same,
}

fn load_label(slice: &mut Slice, max_len: usize) -> TvmResult<Vec<bool>> {
    let label = if !slice.load_bit()? {
        let mut n = 0;
        while slice.load_bit()? {
            n += 1;
        }
        if n > max_len {
            return Err(TvmError::Format(format!(
                "label length {} exceeds remaining key length {}",
                n, max_len
            )));
        }
        (0..n).map(|_| slice.load_bit()).collect::<TvmResult<Vec<_>>>()?
    } else if !slice.load_bit()? {
        let n = slice.load_uint(len_bits(max_len))? as usize;
        if n > max_len {
            return Err(TvmError::Format(format!(
                "label length {} exceeds remaining key length {}",
                n, max_len
            )));
        }
        (0..n).map(|_| slice.load_bit()).collect::<TvmResult<Vec<_>>>()?
    } else {
        let value = slice.load_bit()?;
        let n = slice.load_uint(len_bits(max_len))? as usize;
        if n > max_len {
            return Err(TvmError::Format(format!(
                "label length {} exceeds remaining key length {}",
                n, max_len
            )));
        }
        vec![value; n]
    };
    Ok(label)
}

fn parse_edge(
    cell: Arc<Cell>,
    key_len: usize,
    mut prefix: Vec<bool>,
    out: &mut BTreeMap<Vec<bool>, DictValue>,
) -> TvmResult<()> {
    let mut slice = Slice::new(cell);
    let label = load_label(&mut slice, key_len)?;
    let rest = key_len - label.len();
    prefix.extend(label);

    if rest == 0 {
        out.insert(prefix, DictValue::Slice(slice));
        return Ok(());
    }

    if slice.remaining_refs() < 2 {
        return Err(TvmError::Format(format!(
            "dictionary fork has {} refs, expected 2",
            slice.remaining_refs()
        )));
    }
    let left = slice.load_reference()?;
    let right = slice.load_reference()?;

    let mut left_prefix = prefix.clone();
    left_prefix.push(false);
    parse_edge(left, rest - 1, left_prefix, out)?;

    prefix.push(true);
    parse_edge(right, rest - 1, prefix, out)
}

/// Builder extension for dictionary operations
impl Builder {
    /// Stores a dictionary as HashmapE (one bit, plus the root reference when non-empty)
    pub fn store_dictionary(&mut self, dict: &Dict) -> TvmResult<&mut Self> {
        let root = dict.serialize()?;
        self.store_dict(root)
    }
}

/// Slice extension for dictionary operations
impl Slice {
    /// Loads a HashmapE dictionary from the slice
    pub fn load_dict(&mut self, key_size: usize) -> TvmResult<Dict> {
        match self.load_maybe_ref()? {
            Some(root) => Dict::deserialize(&root, key_size),
            None => Ok(Dict::new(key_size)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint_cell(v: u64) -> Arc<Cell> {
        let mut b = Builder::new();
        b.store_u32(v as u32).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn test_dict_basic() {
        let mut dict = Dict::new(256);
        dict.set_int_key(1, DictValue::Uint(100, 32)).unwrap();
        dict.set_int_key(2, DictValue::Uint(200, 32)).unwrap();

        assert_eq!(dict.len(), 2);
        assert!(!dict.is_empty());
    }

    #[test]
    fn test_dict_get() {
        let mut dict = Dict::new(64);
        dict.set_int_key(42, DictValue::Coins(1000)).unwrap();

        assert!(dict.get_int_key(42).unwrap().is_some());
        assert!(dict.get_int_key(43).unwrap().is_none());
    }

    #[test]
    fn test_int_key_must_fit() {
        let mut dict = Dict::new(8);
        assert!(dict.set_int_key(256, DictValue::Uint(1, 8)).is_err());
    }

    #[test]
    fn test_empty_dict_serializes_to_zero_bit() {
        let dict = Dict::new(256);
        assert!(dict.serialize().unwrap().is_none());

        let mut builder = Builder::new();
        builder.store_dictionary(&dict).unwrap();
        let cell = builder.build().unwrap();
        assert_eq!(cell.bit_len(), 1);
        assert_eq!(cell.reference_count(), 0);

        let loaded = Slice::new(cell).load_dict(256).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_single_entry_layout() {
        // Key 0b101 in a 3-bit dictionary: short label would take 8 bits,
        // long takes 7, so long wins
        let mut dict = Dict::new(3);
        dict.set_int_key(0b101, DictValue::Uint(0xA, 4)).unwrap();
        let root = dict.serialize().unwrap().unwrap();

        // long label: 10, n=3 in 2 bits (11), bits 101, then value 1010
        assert_eq!(root.bit_len(), 2 + 2 + 3 + 4);
        assert_eq!(root.data(), &[0b1011_1011, 0b0100_0000]);
    }

    #[test]
    fn test_same_label_for_uniform_key() {
        let mut dict = Dict::new(256);
        dict.set(DictKey::Bits(vec![0u8; 32], 256), DictValue::Uint(1, 1))
            .unwrap();
        let root = dict.serialize().unwrap().unwrap();

        // 11 + v(0) + n in 9 bits + 1 value bit
        assert_eq!(root.bit_len(), 2 + 1 + 9 + 1);
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let keys = [7u64, 1, 200, 42, 13];

        let mut forward = Dict::new(16);
        for k in keys {
            forward.set_int_key(k, DictValue::Cell(uint_cell(k))).unwrap();
        }
        let mut backward = Dict::new(16);
        for k in keys.iter().rev() {
            backward
                .set_int_key(*k, DictValue::Cell(uint_cell(*k)))
                .unwrap();
        }

        assert_eq!(
            forward.serialize().unwrap().unwrap().hash(),
            backward.serialize().unwrap().unwrap().hash()
        );
    }

    #[test]
    fn test_serialize_deserialize() {
        let mut dict = Dict::new(16);
        for k in [0u64, 1, 2, 255, 256, 65535] {
            dict.set_int_key(k, DictValue::Cell(uint_cell(k))).unwrap();
        }
        let root = dict.serialize().unwrap().unwrap();
        let loaded = Dict::deserialize(&root, 16).unwrap();

        assert_eq!(loaded.len(), 6);
        for k in [0u64, 1, 2, 255, 256, 65535] {
            let value = loaded.get_int_key(k).unwrap().unwrap();
            assert_eq!(value.as_cell().unwrap(), uint_cell(k));
        }
        assert!(loaded.get_int_key(3).unwrap().is_none());
    }

    #[test]
    fn test_hashed_trie_known_answer() {
        let dict = Dict::from_hashed([
            (b"name".as_slice(), DictValue::Cell(uint_cell(1))),
            (b"symbol".as_slice(), DictValue::Cell(uint_cell(2))),
        ]);
        let root = dict.serialize().unwrap().unwrap();

        assert_eq!(
            root.hash_hex(),
            "a64316a4f748632816d0010073736e961ed55c6d922b78329341d859a1550be9"
        );

        // Fork after the shared prefix 10, stored as short label 0 110 10
        assert_eq!(root.bit_len(), 6);
        assert_eq!(root.data(), &[0b0110_1000]);

        // Each leaf holds the remaining 253 key bits as a long label: 10, n in 8 bits, bits
        for leaf in root.references() {
            assert_eq!(leaf.bit_len(), 2 + 8 + 253);
            assert_eq!(leaf.data()[0], 0b1011_1111);
            assert_eq!(leaf.reference_count(), 1);
        }
    }

    #[test]
    fn test_hashed_lookup() {
        let name = uint_cell(1);
        let symbol = uint_cell(2);
        let dict = Dict::from_hashed([
            (b"name".as_slice(), DictValue::Cell(name.clone())),
            (b"symbol".as_slice(), DictValue::Cell(symbol.clone())),
        ]);

        let root = dict.serialize().unwrap().unwrap();
        let loaded = Dict::deserialize(&root, HASHED_KEY_BITS).unwrap();

        assert_eq!(
            loaded.get_hashed(b"name").unwrap().unwrap().as_cell().unwrap(),
            name
        );
        assert_eq!(
            loaded.get_hashed(b"symbol").unwrap().unwrap().as_cell().unwrap(),
            symbol
        );
        assert!(loaded.get_hashed(b"image").unwrap().is_none());
    }

    #[test]
    fn test_address_keys() {
        let mut dict = Dict::new(267);
        let a = Address::new(0, [1u8; 32]);
        let b = Address::new(-1, [1u8; 32]);
        dict.set(DictKey::Address(a), DictValue::Coins(5)).unwrap();
        dict.set(DictKey::Address(b), DictValue::Coins(6)).unwrap();

        let root = dict.serialize().unwrap().unwrap();
        let loaded = Dict::deserialize(&root, 267).unwrap();
        let mut value = loaded
            .get(&DictKey::Address(b))
            .unwrap()
            .unwrap()
            .as_slice()
            .unwrap();
        assert_eq!(value.load_coins().unwrap(), 6);
    }

    #[test]
    fn test_truncated_fork_is_format_error() {
        // Long label of length 0 in a 4-bit dict, then no refs: a fork without children
        let mut builder = Builder::new();
        builder.store_uint(0b10, 2).unwrap();
        builder.store_uint(0, 3).unwrap();
        let root = builder.build().unwrap();

        let err = Dict::deserialize(&root, 4).unwrap_err();
        assert!(matches!(err, TvmError::Format(_)));
    }
}
