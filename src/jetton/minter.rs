//! Jetton minter state and `get_jetton_data` decoding
//!
//! ```text
//! storage#_ total_supply:Coins admin_address:MsgAddress
//!           content:^Cell jetton_wallet_code:^Cell = MinterStorage;
//! ```

use crate::jetton::error::{JettonError, JettonResult};
use crate::jetton::metadata::MetadataContent;
use crate::tvm::{Address, Builder, Cell, Slice, StackEntry, StackReader, StateInit};
use log::debug;
use num_bigint::{BigInt, BigUint, Sign};
use std::sync::Arc;

pub const GET_JETTON_DATA: &str = "get_jetton_data";
pub const GET_WALLET_ADDRESS: &str = "get_wallet_address";

/// Parameters a new minter is deployed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinterConfig {
    pub admin_address: Address,
    pub content: MetadataContent,
    pub wallet_code: Arc<Cell>,
}

impl MinterConfig {
    /// Initial minter data: zero supply, admin, content and wallet code
    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        MinterState {
            total_supply: 0,
            admin_address: Some(self.admin_address),
            content: self.content.to_cell()?,
            wallet_code: self.wallet_code.clone(),
        }
        .to_cell()
    }

    pub fn state_init(&self, minter_code: Arc<Cell>) -> JettonResult<StateInit> {
        Ok(StateInit::new(minter_code, self.to_cell()?))
    }

    pub fn address(&self, minter_code: Arc<Cell>, workchain: i8) -> JettonResult<Address> {
        let address = self.state_init(minter_code)?.address(workchain)?;
        debug!("minter address {}", address);
        Ok(address)
    }
}

/// Persistent minter data as laid out in the contract storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinterState {
    pub total_supply: u128,
    pub admin_address: Option<Address>,
    pub content: Arc<Cell>,
    pub wallet_code: Arc<Cell>,
}

impl MinterState {
    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder
            .store_coins(self.total_supply)?
            .store_address(self.admin_address.as_ref())?
            .store_ref(self.content.clone())?
            .store_ref(self.wallet_code.clone())?;
        Ok(builder.build()?)
    }

    pub fn from_cell(cell: &Arc<Cell>) -> JettonResult<Self> {
        let mut slice = Slice::new(cell.clone());
        let state = Self {
            total_supply: slice.load_coins()?,
            admin_address: slice.load_address()?,
            content: slice.load_reference()?,
            wallet_code: slice.load_reference()?,
        };
        slice.ensure_empty()?;
        Ok(state)
    }
}

/// Result of `get_jetton_data`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JettonData {
    pub total_supply: BigUint,
    /// Raw flag as the contract returns it: `-1` while minting is open, `0` once closed
    pub mintable: BigInt,
    /// `None` once the admin has been removed
    pub admin_address: Option<Address>,
    pub content: MetadataContent,
    pub wallet_code: Arc<Cell>,
}

impl JettonData {
    /// Whether the minter still accepts mints; any non-zero flag counts
    pub fn is_mintable(&self) -> bool {
        self.mintable.sign() != Sign::NoSign
    }

    /// Reads `total_supply, mintable, admin_address, content, wallet_code`
    pub fn from_stack(stack: &[StackEntry]) -> JettonResult<Self> {
        let mut reader = StackReader::new(stack);
        let total_supply = reader.read_big_uint()?;
        let mintable = reader.read_big_int()?;
        let admin_address = reader.read_address()?;
        let content = MetadataContent::from_cell(&reader.read_cell()?)?;
        let wallet_code = reader.read_cell()?;

        Ok(Self {
            total_supply,
            mintable,
            admin_address,
            content,
            wallet_code,
        })
    }

    /// Stack a minter returns for this data
    pub fn to_stack(&self) -> JettonResult<Vec<StackEntry>> {
        let admin = match &self.admin_address {
            Some(address) => StackEntry::from_address(address)?,
            None => {
                let mut builder = Builder::new();
                builder.store_address(None)?;
                StackEntry::Slice(builder.build()?)
            }
        };

        Ok(vec![
            StackEntry::Int(self.total_supply.clone().into()),
            StackEntry::Int(self.mintable.clone()),
            admin,
            StackEntry::Cell(self.content.to_cell()?),
            StackEntry::Cell(self.wallet_code.clone()),
        ])
    }
}

/// Argument stack of `get_wallet_address`: one slice holding the owner
pub fn wallet_address_args(owner: &Address) -> JettonResult<Vec<StackEntry>> {
    Ok(vec![StackEntry::from_address(owner)?])
}

/// Reads the single address returned by `get_wallet_address`
pub fn decode_wallet_address(stack: &[StackEntry]) -> JettonResult<Address> {
    StackReader::new(stack)
        .read_address()?
        .ok_or_else(|| JettonError::Decode("get_wallet_address returned addr_none".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jetton::MetadataKey;
    use crate::tvm::ErrorKind;

    fn code(byte: u8) -> Arc<Cell> {
        let mut builder = Builder::new();
        builder.store_byte(byte).unwrap();
        builder.build().unwrap()
    }

    fn config() -> MinterConfig {
        MinterConfig {
            admin_address: Address::new(0, [0xAD; 32]),
            content: MetadataContent::new()
                .with(MetadataKey::Name, "X")
                .with(MetadataKey::Symbol, "Y"),
            wallet_code: code(0xEE),
        }
    }

    #[test]
    fn test_initial_data_layout() {
        let config = config();
        let cell = config.to_cell().unwrap();

        // coins(0) + address
        assert_eq!(cell.bit_len(), 4 + 267);
        assert_eq!(cell.reference_count(), 2);
        assert_eq!(cell.reference(0).unwrap(), &config.content.to_cell().unwrap());
        assert_eq!(cell.reference(1).unwrap(), &config.wallet_code);

        let state = MinterState::from_cell(&cell).unwrap();
        assert_eq!(state.total_supply, 0);
        assert_eq!(state.admin_address, Some(config.admin_address));
    }

    #[test]
    fn test_address_depends_on_admin() {
        let a = config();
        let mut b = config();
        b.admin_address = Address::new(0, [0xAE; 32]);

        assert_eq!(
            a.address(code(1), 0).unwrap(),
            a.address(code(1), 0).unwrap()
        );
        assert_ne!(
            a.address(code(1), 0).unwrap(),
            b.address(code(1), 0).unwrap()
        );
    }

    #[test]
    fn test_jetton_data_from_stack() {
        let config = config();
        let data = JettonData {
            total_supply: BigUint::from(100u32),
            mintable: BigInt::from(-1),
            admin_address: Some(config.admin_address),
            content: config.content.clone(),
            wallet_code: config.wallet_code.clone(),
        };

        let stack = data.to_stack().unwrap();
        assert_eq!(JettonData::from_stack(&stack).unwrap(), data);
    }

    #[test]
    fn test_mintable_keeps_raw_value() {
        let mut stack = config_stack();
        stack[1] = StackEntry::Int(BigInt::from(-1));
        let data = JettonData::from_stack(&stack).unwrap();
        assert_eq!(data.mintable, BigInt::from(-1));
        assert!(data.is_mintable());

        stack[1] = StackEntry::Int(BigInt::from(0));
        let data = JettonData::from_stack(&stack).unwrap();
        assert_eq!(data.mintable, BigInt::from(0));
        assert!(!data.is_mintable());
    }

    #[test]
    fn test_short_stack_is_decode_error() {
        let stack = config_stack();
        let err = JettonData::from_stack(&stack[..4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_mistyped_stack_is_decode_error() {
        let mut stack = config_stack();
        stack[3] = StackEntry::Null;
        let err = JettonData::from_stack(&stack).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_wallet_address_roundtrip() {
        let owner = Address::new(0, [3u8; 32]);
        let args = wallet_address_args(&owner).unwrap();
        assert_eq!(decode_wallet_address(&args).unwrap(), owner);

        let err = decode_wallet_address(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    fn config_stack() -> Vec<StackEntry> {
        let config = config();
        JettonData {
            total_supply: BigUint::from(1u32),
            mintable: BigInt::from(0),
            admin_address: None,
            content: config.content,
            wallet_code: config.wallet_code,
        }
        .to_stack()
        .unwrap()
    }
}
