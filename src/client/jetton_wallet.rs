use std::sync::Arc;

use anyhow::Result;
use log::info;

use crate::client::base::{InternalMessage, Receipt, Transport};
use crate::jetton::{GET_WALLET_DATA, JettonResult, Transfer, WalletConfig, WalletData, deploy_body};
use crate::tvm::{Address, Cell, StateInit};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    pub to_address: Address,
    pub jetton_amount: u128,
    /// Where excess toncoin goes; the transport's sender when `None`
    pub response_address: Option<Address>,
    pub forward_ton_amount: u128,
    pub forward_payload: Option<Arc<Cell>>,
    pub query_id: u64,
    pub value: u128,
}


/// Handle on a jetton wallet contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JettonWallet {
    pub address: Address,
    pub init: Option<StateInit>,
}

impl JettonWallet {
    pub fn create_from_address(address: Address) -> Self {
        Self {
            address,
            init: None,
        }
    }

    pub fn create_from_config(config: &WalletConfig, workchain: i8) -> JettonResult<Self> {
        let init = config.state_init()?;
        let address = init.address(workchain)?;
        Ok(Self {
            address,
            init: Some(init),
        })
    }

    pub async fn send_deploy(&self, transport: &dyn Transport, value: u128) -> Result<Receipt> {
        info!("deploying jetton wallet {}", self.address);
        let message = InternalMessage::new(self.address, value, deploy_body())
            .with_state_init(self.init.clone());
        transport.submit(message).await
    }

    pub async fn send_transfer(
        &self,
        transport: &dyn Transport,
        opts: TransferOptions,
    ) -> Result<Receipt> {
        let body = Transfer {
            query_id: opts.query_id,
            jetton_amount: opts.jetton_amount,
            to_address: opts.to_address,
            response_address: Some(opts.response_address.unwrap_or_else(|| transport.sender())),
            forward_ton_amount: opts.forward_ton_amount,
            forward_payload: opts.forward_payload,
        }
        .to_cell()?;
        info!(
            "transferring {} jettons from {} to {}",
            opts.jetton_amount, self.address, opts.to_address
        );
        transport
            .submit(InternalMessage::new(self.address, opts.value, body))
            .await
    }

    pub async fn get_wallet_data(&self, transport: &dyn Transport) -> Result<WalletData> {
        let stack = transport.query(&self.address, GET_WALLET_DATA, vec![]).await?;
        Ok(WalletData::from_stack(&stack)?)
    }
}
