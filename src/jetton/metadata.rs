//! On-chain jetton metadata (TEP-64)
//!
//! ```text
//! onchain#00 data:(HashmapE 256 ^ContentData) = FullContent;
//! snake#00 data:(SnakeData ~n) = ContentData;
//! ```
//!
//! Keys are the SHA-256 of the field name. Only the four standard fields are
//! accepted, and an empty value is never written, so it reads back as absent.

use crate::jetton::error::{JettonError, JettonResult};
use crate::tvm::{Builder, Cell, Dict, DictKey, DictValue, HASHED_KEY_BITS, Slice};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Leading byte of a content cell holding on-chain data
pub const ONCHAIN_CONTENT_PREFIX: u8 = 0x00;

/// Leading byte of a value cell holding snake-encoded data
pub const SNAKE_PREFIX: u8 = 0x00;

/// The closed set of recognized metadata fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataKey {
    Name,
    Description,
    Image,
    Symbol,
}

impl MetadataKey {
    pub const ALL: [MetadataKey; 4] = [
        MetadataKey::Name,
        MetadataKey::Description,
        MetadataKey::Image,
        MetadataKey::Symbol,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKey::Name => "name",
            MetadataKey::Description => "description",
            MetadataKey::Image => "image",
            MetadataKey::Symbol => "symbol",
        }
    }

    /// Image URLs are ASCII, every other field is UTF-8
    pub fn is_ascii_only(&self) -> bool {
        matches!(self, MetadataKey::Image)
    }

    /// Dictionary key: SHA-256 of the field name
    pub fn dict_key(&self) -> DictKey {
        DictKey::hashed(self.as_str().as_bytes())
    }
}

impl FromStr for MetadataKey {
    type Err = JettonError;

    fn from_str(s: &str) -> JettonResult<Self> {
        MetadataKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| JettonError::Validation(format!("Unsupported onchain key: {}", s)))
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Jetton metadata with every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

impl MetadataContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds content from `(field, value)` pairs, rejecting unknown fields
    pub fn from_pairs<I, K, V>(pairs: I) -> JettonResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut content = Self::new();
        for (key, value) in pairs {
            let key = MetadataKey::from_str(key.as_ref())?;
            content.set(key, value);
        }
        Ok(content)
    }

    pub fn get(&self, key: MetadataKey) -> Option<&str> {
        match key {
            MetadataKey::Name => self.name.as_deref(),
            MetadataKey::Description => self.description.as_deref(),
            MetadataKey::Image => self.image.as_deref(),
            MetadataKey::Symbol => self.symbol.as_deref(),
        }
    }

    pub fn set(&mut self, key: MetadataKey, value: impl Into<String>) -> &mut Self {
        let value = Some(value.into());
        match key {
            MetadataKey::Name => self.name = value,
            MetadataKey::Description => self.description = value,
            MetadataKey::Image => self.image = value,
            MetadataKey::Symbol => self.symbol = value,
        }
        self
    }

    pub fn with(mut self, key: MetadataKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Fields that would be written: present and non-empty
    pub fn entries(&self) -> impl Iterator<Item = (MetadataKey, &str)> {
        MetadataKey::ALL
            .into_iter()
            .filter_map(|key| self.get(key).filter(|v| !v.is_empty()).map(|v| (key, v)))
    }

    /// Copy with empty values dropped, the form that survives a round trip
    pub fn normalized(&self) -> Self {
        let mut content = Self::new();
        for (key, value) in self.entries() {
            content.set(key, value);
        }
        content
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Encodes the content as an on-chain content cell
    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        let mut dict = Dict::new(HASHED_KEY_BITS);

        for (key, value) in self.entries() {
            if key.is_ascii_only() && !value.is_ascii() {
                return Err(JettonError::Validation(format!(
                    "metadata field '{}' must be ASCII",
                    key
                )));
            }

            let mut builder = Builder::new();
            builder.store_snake_string(value, true)?;
            dict.set(key.dict_key(), DictValue::Cell(builder.build()?))?;
        }

        let mut builder = Builder::new();
        builder
            .store_byte(ONCHAIN_CONTENT_PREFIX)?
            .store_dictionary(&dict)?;
        let cell = builder.build()?;

        debug!(
            "built metadata cell {} with {} fields",
            cell.hash_hex(),
            dict.len()
        );
        Ok(cell)
    }

    /// Decodes an on-chain content cell
    pub fn from_cell(cell: &Arc<Cell>) -> JettonResult<Self> {
        let mut slice = Slice::new(cell.clone());

        let prefix = slice.load_byte()?;
        if prefix != ONCHAIN_CONTENT_PREFIX {
            return Err(JettonError::Format(format!(
                "Only snake format is supported, content prefix is 0x{:02x}",
                prefix
            )));
        }

        let dict = slice
            .load_dict(HASHED_KEY_BITS)
            .map_err(|e| JettonError::Format(format!("malformed metadata dictionary: {}", e)))?;

        let mut content = Self::new();
        for key in MetadataKey::ALL {
            let Some(value) = dict.get(&key.dict_key())? else {
                continue;
            };

            let text = parse_value(key, &value.as_cell()?)?;
            if !text.is_empty() {
                content.set(key, text);
            }
        }

        Ok(content)
    }
}

fn parse_value(key: MetadataKey, cell: &Arc<Cell>) -> JettonResult<String> {
    let mut slice = Slice::new(cell.clone());

    let tag = slice.load_byte()?;
    if tag != SNAKE_PREFIX {
        return Err(JettonError::Format(format!(
            "metadata field '{}' has unsupported data tag 0x{:02x}",
            key, tag
        )));
    }

    slice
        .load_snake_string()
        .map_err(|e| JettonError::Format(format!("metadata field '{}': {}", key, e)))
}

/// Encodes metadata into an on-chain content cell
pub fn build_metadata_cell(content: &MetadataContent) -> JettonResult<Arc<Cell>> {
    content.to_cell()
}

/// Decodes an on-chain content cell into metadata
pub fn parse_metadata_cell(cell: &Arc<Cell>) -> JettonResult<MetadataContent> {
    MetadataContent::from_cell(cell)
}
