//! Jetton wallet state and `get_wallet_data` decoding
//!
//! ```text
//! storage#_ minter_address:MsgAddress owner_address:MsgAddress
//!           jetton_wallet_code:^Cell = WalletStorage;
//! ```

use crate::jetton::error::{JettonError, JettonResult};
use crate::tvm::{Address, Builder, Cell, Slice, StackEntry, StackReader, StateInit};
use log::debug;
use num_bigint::BigUint;
use std::sync::Arc;

pub const GET_WALLET_DATA: &str = "get_wallet_data";

/// Parameters a wallet is deployed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    pub minter_address: Address,
    pub owner_address: Address,
    pub wallet_code: Arc<Cell>,
}

impl WalletConfig {
    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder
            .store_address(Some(&self.minter_address))?
            .store_address(Some(&self.owner_address))?
            .store_ref(self.wallet_code.clone())?;
        Ok(builder.build()?)
    }

    pub fn from_cell(cell: &Arc<Cell>) -> JettonResult<Self> {
        let mut slice = Slice::new(cell.clone());
        let config = Self {
            minter_address: slice.load_internal_address()?,
            owner_address: slice.load_internal_address()?,
            wallet_code: slice.load_reference()?,
        };
        slice.ensure_empty()?;
        Ok(config)
    }

    /// Wallets are deployed with their own code as `wallet_code`
    pub fn state_init(&self) -> JettonResult<StateInit> {
        Ok(StateInit::new(self.wallet_code.clone(), self.to_cell()?))
    }

    pub fn address(&self, workchain: i8) -> JettonResult<Address> {
        let address = self.state_init()?.address(workchain)?;
        debug!(
            "wallet address {} for owner {}",
            address, self.owner_address
        );
        Ok(address)
    }
}

/// Result of `get_wallet_data`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletData {
    pub balance: BigUint,
    pub owner_address: Address,
    pub master_address: Address,
    pub wallet_code: Arc<Cell>,
}

impl WalletData {
    /// Reads `balance, owner_address, master_address, wallet_code`
    pub fn from_stack(stack: &[StackEntry]) -> JettonResult<Self> {
        let mut reader = StackReader::new(stack);
        let balance = reader.read_big_uint()?;
        let owner_address = read_required_address(&mut reader, "owner")?;
        let master_address = read_required_address(&mut reader, "master")?;
        let wallet_code = reader.read_cell()?;

        Ok(Self {
            balance,
            owner_address,
            master_address,
            wallet_code,
        })
    }

    pub fn to_stack(&self) -> JettonResult<Vec<StackEntry>> {
        Ok(vec![
            StackEntry::Int(self.balance.clone().into()),
            StackEntry::from_address(&self.owner_address)?,
            StackEntry::from_address(&self.master_address)?,
            StackEntry::Cell(self.wallet_code.clone()),
        ])
    }
}

fn read_required_address(reader: &mut StackReader<'_>, what: &str) -> JettonResult<Address> {
    reader.read_address()?.ok_or_else(|| {
        JettonError::Decode(format!("{} address is addr_none", what))
    })
}
