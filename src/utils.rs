use crate::crc::CRC16;
use crate::jetton::{JettonError, JettonResult};
use pretty_env_logger::formatted_builder;

/// Decimal places of toncoin amounts
pub const TON_DECIMALS: u32 = 9;

pub fn init_logger() -> Result<(), log::SetLoggerError> {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else {
        builder.parse_filters("info");
    }

    builder.try_init()
}

/// Get-method id: `(crc16(name) & 0xffff) | 0x10000`
pub fn method_name_to_id(name: &str) -> u32 {
    let method_value = CRC16.checksum(name.as_bytes()) as u32;
    (method_value & 0xFFFF) | 0x10000
}

/// Scales a decimal string by `10^decimals` into an integer amount
///
/// More fractional digits than `decimals` is an error rather than a rounding.
pub fn to_decimals(amount: &str, decimals: u32) -> JettonResult<u128> {
    let amount = amount.trim();
    let invalid = || JettonError::Validation(format!("invalid amount '{}'", amount));

    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(JettonError::Validation(format!(
            "amount '{}' has more than {} decimal places",
            amount, decimals
        )));
    }

    let overflow = || JettonError::Validation(format!("amount '{}' is too large", amount));
    let scale = 10u128.checked_pow(decimals).ok_or_else(overflow)?;

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let fraction: u128 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = decimals as usize);
        padded.parse().map_err(|_| overflow())?
    };

    whole
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction))
        .ok_or_else(overflow)
}

/// Converts a toncoin amount such as `"0.05"` into nanotons
pub fn to_nano(amount: &str) -> JettonResult<u128> {
    to_decimals(amount, TON_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_ids() {
        assert_eq!(method_name_to_id("get_jetton_data"), 106029);
        assert_eq!(method_name_to_id("get_wallet_address"), 103289);
        assert_eq!(method_name_to_id("get_wallet_data"), 97026);
        assert_eq!(method_name_to_id("seqno"), 85143);
    }

    #[test]
    fn test_to_nano() {
        assert_eq!(to_nano("1").unwrap(), 1_000_000_000);
        assert_eq!(to_nano("0.05").unwrap(), 50_000_000);
        assert_eq!(to_nano("100").unwrap(), 100_000_000_000);
        assert_eq!(to_nano(".5").unwrap(), 500_000_000);
        assert_eq!(to_nano("2.").unwrap(), 2_000_000_000);
        assert_eq!(to_nano("0.000000001").unwrap(), 1);
        assert_eq!(to_nano("1.5000000000").unwrap(), 1_500_000_000);
    }

    #[test]
    fn test_to_decimals_rejects() {
        assert!(to_nano("0.0000000001").is_err());
        assert!(to_nano("").is_err());
        assert!(to_nano(".").is_err());
        assert!(to_nano("-1").is_err());
        assert!(to_nano("1e9").is_err());
        assert!(to_decimals("1", 40).is_err());
    }

    #[test]
    fn test_to_decimals_zero_places() {
        assert_eq!(to_decimals("100", 0).unwrap(), 100);
        assert!(to_decimals("100.5", 0).is_err());
        assert_eq!(to_decimals("100.0", 0).unwrap(), 100);
    }
}
