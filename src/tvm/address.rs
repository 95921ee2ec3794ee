//! TON Address implementation
//!
//! An internal address is a workchain id plus a 256-bit account hash. The
//! bounceable / test-only flags only affect the user-friendly text form and
//! never take part in equality.

use crate::crc::CRC16;
use crate::tvm::error::{TvmError, TvmResult};
use base64::Engine;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;

/// Represents a TON blockchain address
#[derive(Debug, Clone, Copy)]
pub struct Address {
    /// Workchain ID (-1 for masterchain, 0 for basechain)
    pub workchain: i8,
    /// 32-byte hash part of the address
    pub hash_part: [u8; 32],
    /// Whether the address is bounceable (text form only)
    pub is_bounceable: bool,
    /// Whether this is a test-only address (text form only)
    pub is_test_only: bool,
}

impl Address {
    /// Creates a new address from workchain and hash part
    pub fn new(workchain: i8, hash_part: [u8; 32]) -> Self {
        Self {
            workchain,
            hash_part,
            is_bounceable: true,
            is_test_only: false,
        }
    }

    /// Parses address from raw format: "workchain:hash"
    pub fn from_hex(address: &str) -> TvmResult<Self> {
        let (workchain, hash_hex) = address
            .split_once(':')
            .ok_or_else(|| TvmError::Format("raw address must be workchain:hash".to_string()))?;

        let workchain = workchain
            .parse::<i8>()
            .map_err(|e| TvmError::Format(format!("invalid workchain '{}': {}", workchain, e)))?;

        if hash_hex.len() != 64 {
            return Err(TvmError::Format(
                "hash part must be 64 hex characters".to_string(),
            ));
        }

        let mut hash_part = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash_part)
            .map_err(|e| TvmError::Format(format!("invalid hash part: {}", e)))?;

        Ok(Self::new(workchain, hash_part))
    }

    /// Parses address from base64 user-friendly format
    pub fn from_base64(address: &str) -> TvmResult<Self> {
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(address)
            .or_else(|_| base64::engine::general_purpose::STANDARD.decode(address))
            .map_err(|e| TvmError::Format(format!("invalid base64 address: {}", e)))?;

        if decoded.len() != 36 {
            return Err(TvmError::Format(format!(
                "user-friendly address must be 36 bytes, got {}",
                decoded.len()
            )));
        }

        let mut tag = decoded[0];
        let is_test_only = tag & TAG_TEST_ONLY != 0;
        tag &= !TAG_TEST_ONLY;

        let is_bounceable = match tag {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            other => {
                return Err(TvmError::Format(format!(
                    "invalid address tag 0x{:02x}",
                    other
                )));
            }
        };

        let expected_crc = u16::from_be_bytes([decoded[34], decoded[35]]);
        if CRC16.checksum(&decoded[..34]) != expected_crc {
            return Err(TvmError::Format("invalid address CRC".to_string()));
        }

        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&decoded[2..34]);

        Ok(Self {
            workchain: decoded[1] as i8,
            hash_part,
            is_bounceable,
            is_test_only,
        })
    }

    /// Renders the address either raw or user-friendly with explicit flags
    pub fn to_string_with(
        &self,
        user_friendly: bool,
        url_safe: bool,
        bounceable: bool,
        test_only: bool,
    ) -> String {
        if !user_friendly {
            return self.to_hex();
        }

        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if test_only {
            tag |= TAG_TEST_ONLY;
        }

        let mut data = Vec::with_capacity(36);
        data.push(tag);
        data.push(self.workchain as u8);
        data.extend_from_slice(&self.hash_part);
        data.extend_from_slice(&CRC16.checksum(&data).to_be_bytes());

        if url_safe {
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&data)
        } else {
            base64::engine::general_purpose::STANDARD.encode(&data)
        }
    }

    /// Converts to raw format (workchain:hash)
    pub fn to_hex(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    /// Converts to user-friendly base64 format using the address' own flags
    pub fn to_base64(&self) -> String {
        self.to_string_with(true, true, self.is_bounceable, self.is_test_only)
    }

    /// Returns a copy with the bounceable flag set
    pub fn with_bounceable(mut self, bounceable: bool) -> Self {
        self.is_bounceable = bounceable;
        self
    }

    /// Returns a copy with the test-only flag set
    pub fn with_test_only(mut self, test_only: bool) -> Self {
        self.is_test_only = test_only;
        self
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.workchain == other.workchain && self.hash_part == other.hash_part
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.workchain.hash(state);
        self.hash_part.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl FromStr for Address {
    type Err = TvmError;

    /// Accepts both raw and user-friendly forms
    fn from_str(s: &str) -> TvmResult<Self> {
        if s.contains(':') {
            Self::from_hex(s)
        } else {
            Self::from_base64(s)
        }
    }
}
