//! Contract initial state and address derivation
//!
//! ```text
//! _ split_depth:(Maybe (## 5)) special:(Maybe TickTock)
//!   code:(Maybe ^Cell) data:(Maybe ^Cell)
//!   library:(Maybe ^Cell) = StateInit;
//! ```

use crate::tvm::address::Address;
use crate::tvm::builder::Builder;
use crate::tvm::cell::Cell;
use crate::tvm::error::TvmResult;
use std::sync::Arc;

/// Code and data a contract is deployed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInit {
    pub code: Arc<Cell>,
    pub data: Arc<Cell>,
}

impl StateInit {
    pub fn new(code: Arc<Cell>, data: Arc<Cell>) -> Self {
        Self { code, data }
    }

    /// Serializes as `{0}{0}{1}{1}{0}` with references `[code, data]`
    pub fn to_cell(&self) -> TvmResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder
            .store_bit(false)? // split_depth
            .store_bit(false)? // special
            .store_maybe_ref(Some(self.code.clone()))?
            .store_maybe_ref(Some(self.data.clone()))?
            .store_bit(false)?; // library
        builder.build()
    }

    /// Address of the contract this state initializes in `workchain`
    pub fn address(&self, workchain: i8) -> TvmResult<Address> {
        let cell = self.to_cell()?;
        let address = Address::new(workchain, cell.hash());
        log::debug!("derived address {} from state init", address.to_hex());
        Ok(address)
    }
}

/// Derives a contract address from its code, data and workchain
pub fn derive_address(code: Arc<Cell>, data: Arc<Cell>, workchain: i8) -> TvmResult<Address> {
    StateInit::new(code, data).address(workchain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_with(byte: u8) -> Arc<Cell> {
        let mut builder = Builder::new();
        builder.store_byte(byte).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_state_init_layout() {
        let init = StateInit::new(cell_with(1), cell_with(2));
        let cell = init.to_cell().unwrap();

        assert_eq!(cell.bit_len(), 5);
        assert_eq!(cell.data(), &[0b0011_0000]);
        assert_eq!(cell.reference_count(), 2);
        assert_eq!(cell.reference(0).unwrap(), &init.code);
        assert_eq!(cell.reference(1).unwrap(), &init.data);
    }

    #[test]
    fn test_address_is_state_init_hash() {
        let init = StateInit::new(cell_with(1), cell_with(2));
        let address = init.address(0).unwrap();
        assert_eq!(address.workchain, 0);
        assert_eq!(address.hash_part, init.to_cell().unwrap().hash());
    }

    #[test]
    fn test_address_changes_with_inputs() {
        let base = derive_address(cell_with(1), cell_with(2), 0).unwrap();

        assert_eq!(base, derive_address(cell_with(1), cell_with(2), 0).unwrap());
        assert_ne!(base, derive_address(cell_with(3), cell_with(2), 0).unwrap());
        assert_ne!(base, derive_address(cell_with(1), cell_with(3), 0).unwrap());

        let masterchain = derive_address(cell_with(1), cell_with(2), -1).unwrap();
        assert_ne!(base, masterchain);
        assert_eq!(base.hash_part, masterchain.hash_part);
    }
}
