use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Serialize};

use crate::tvm::{StackEntry, TvmError, TvmResult, base64_to_boc, boc_to_base64};


#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(untagged)]
pub enum StringOrInt {
    String(String),
    Int(i64),
}


#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "snake_case")]
pub enum StackItemType {
    Num,
    Cell,
    Slice,
    Null,
}


/// Stack entry as exchanged with `runGetMethod`: numbers are hex strings,
/// cells and slices are base64 BoC
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct V2StackEntity {
    pub r#type: StackItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StringOrInt>,
}


#[derive(Debug, Serialize, Deserialize)]
pub struct V2RunGetMethodResult {
    pub gas_used: Option<u64>,
    pub exit_code: i32,
    pub stack: Vec<V2StackEntity>,
}


fn parse_num(value: &str) -> TvmResult<BigInt> {
    let invalid = || TvmError::Format(format!("invalid stack number '{}'", value));
    let (sign, digits) = match value.strip_prefix('-') {
        Some(rest) => (Sign::Minus, rest),
        None => (Sign::Plus, value),
    };

    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => BigInt::parse_bytes(hex.as_bytes(), 16),
        None => BigInt::parse_bytes(digits.as_bytes(), 10),
    }
    .ok_or_else(invalid)?;

    Ok(match sign {
        Sign::Minus => -magnitude,
        _ => magnitude,
    })
}

fn format_num(value: &BigInt) -> String {
    match value.sign() {
        Sign::Minus => format!("-0x{}", (-value).to_str_radix(16)),
        _ => format!("0x{}", value.to_str_radix(16)),
    }
}


impl TryFrom<&V2StackEntity> for StackEntry {
    type Error = TvmError;

    fn try_from(entity: &V2StackEntity) -> TvmResult<Self> {
        let text = match &entity.value {
            Some(StringOrInt::String(s)) => Some(s.as_str()),
            Some(StringOrInt::Int(i)) if entity.r#type == StackItemType::Num => {
                return Ok(StackEntry::Int(BigInt::from(*i)));
            }
            Some(StringOrInt::Int(_)) => {
                return Err(TvmError::Format(format!(
                    "{:?} stack entry cannot hold an integer",
                    entity.r#type
                )));
            }
            None => None,
        };

        match (&entity.r#type, text) {
            (StackItemType::Null, _) => Ok(StackEntry::Null),
            (StackItemType::Num, Some(text)) => Ok(StackEntry::Int(parse_num(text)?)),
            (StackItemType::Cell, Some(text)) => Ok(StackEntry::Cell(base64_to_boc(text)?)),
            (StackItemType::Slice, Some(text)) => Ok(StackEntry::Slice(base64_to_boc(text)?)),
            (other, None) => Err(TvmError::Format(format!(
                "{:?} stack entry has no value",
                other
            ))),
        }
    }
}


impl TryFrom<&StackEntry> for V2StackEntity {
    type Error = TvmError;

    fn try_from(entry: &StackEntry) -> TvmResult<Self> {
        let (r#type, value) = match entry {
            StackEntry::Null => (StackItemType::Null, None),
            StackEntry::Int(value) => (StackItemType::Num, Some(format_num(value))),
            StackEntry::Cell(cell) => (StackItemType::Cell, Some(boc_to_base64(cell, false)?)),
            StackEntry::Slice(cell) => (StackItemType::Slice, Some(boc_to_base64(cell, false)?)),
        };
        Ok(Self {
            r#type,
            value: value.map(StringOrInt::String),
        })
    }
}


/// Converts a `runGetMethod` result into typed entries, failing on a non-zero exit code
pub fn stack_from_result(result: &V2RunGetMethodResult) -> TvmResult<Vec<StackEntry>> {
    if result.exit_code != 0 {
        return Err(TvmError::Format(format!(
            "get-method exited with code {}",
            result.exit_code
        )));
    }
    result.stack.iter().map(StackEntry::try_from).collect()
}

/// Converts typed arguments into `runGetMethod` entries
pub fn stack_to_entities(stack: &[StackEntry]) -> TvmResult<Vec<V2StackEntity>> {
    stack.iter().map(V2StackEntity::try_from).collect()
}
