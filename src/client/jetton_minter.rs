use std::sync::Arc;

use anyhow::Result;
use log::{debug, info};

use crate::client::base::{InternalMessage, Receipt, Transport};
use crate::jetton::{
    ChangeAdmin, ChangeContent, GET_JETTON_DATA, GET_WALLET_ADDRESS, JettonData, JettonResult,
    MetadataContent, Mint, MinterConfig, ProvideWalletAddress, decode_wallet_address, deploy_body,
    wallet_address_args,
};
use crate::tvm::{Address, Cell, StateInit};


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOptions {
    pub to_address: Address,
    pub jetton_amount: u128,
    /// Toncoin forwarded to the receiving wallet
    pub amount: u128,
    pub query_id: u64,
    /// Toncoin attached to the mint message itself
    pub value: u128,
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideWalletAddressOptions {
    pub query_id: u64,
    pub owner_address: Address,
    pub include_address: bool,
    pub value: u128,
}


/// Handle on a jetton minter contract
///
/// Holds only the address and, for a contract not deployed yet, its initial
/// state. Every call takes the transport to go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JettonMinter {
    pub address: Address,
    pub init: Option<StateInit>,
}

impl JettonMinter {
    pub fn create_from_address(address: Address) -> Self {
        Self {
            address,
            init: None,
        }
    }

    pub fn create_from_config(
        config: &MinterConfig,
        code: Arc<Cell>,
        workchain: i8,
    ) -> JettonResult<Self> {
        let init = config.state_init(code)?;
        let address = init.address(workchain)?;
        Ok(Self {
            address,
            init: Some(init),
        })
    }

    async fn send(
        &self,
        transport: &dyn Transport,
        value: u128,
        body: Arc<Cell>,
    ) -> Result<Receipt> {
        debug!("minter {} <- body {}", self.address, body.hash_hex());
        transport
            .submit(InternalMessage::new(self.address, value, body))
            .await
    }

    /// Deploys the minter with its initial state and an empty body
    pub async fn send_deploy(&self, transport: &dyn Transport, value: u128) -> Result<Receipt> {
        info!("deploying jetton minter {}", self.address);
        let message = InternalMessage::new(self.address, value, deploy_body())
            .with_state_init(self.init.clone());
        transport.submit(message).await
    }

    pub async fn send_mint(&self, transport: &dyn Transport, opts: MintOptions) -> Result<Receipt> {
        let body = Mint::new(
            self.address,
            opts.to_address,
            opts.amount,
            opts.jetton_amount,
            opts.query_id,
        )
        .to_cell()?;
        info!(
            "minting {} jettons to {} via {}",
            opts.jetton_amount, opts.to_address, self.address
        );
        self.send(transport, opts.value, body).await
    }

    pub async fn send_provide_wallet_address(
        &self,
        transport: &dyn Transport,
        opts: ProvideWalletAddressOptions,
    ) -> Result<Receipt> {
        let body = ProvideWalletAddress {
            query_id: opts.query_id,
            owner_address: opts.owner_address,
            include_address: opts.include_address,
        }
        .to_cell()?;
        self.send(transport, opts.value, body).await
    }

    pub async fn send_change_admin(
        &self,
        transport: &dyn Transport,
        new_admin_address: Address,
        value: u128,
    ) -> Result<Receipt> {
        let body = ChangeAdmin { new_admin_address }.to_cell()?;
        self.send(transport, value, body).await
    }

    pub async fn send_change_content(
        &self,
        transport: &dyn Transport,
        content: &MetadataContent,
        value: u128,
    ) -> Result<Receipt> {
        let body = ChangeContent::from_metadata(content)?.to_cell()?;
        self.send(transport, value, body).await
    }

    pub async fn get_wallet_address(
        &self,
        transport: &dyn Transport,
        owner: &Address,
    ) -> Result<Address> {
        let stack = transport
            .query(&self.address, GET_WALLET_ADDRESS, wallet_address_args(owner)?)
            .await?;
        Ok(decode_wallet_address(&stack)?)
    }

    pub async fn get_minter_data(&self, transport: &dyn Transport) -> Result<JettonData> {
        let stack = transport.query(&self.address, GET_JETTON_DATA, vec![]).await?;
        Ok(JettonData::from_stack(&stack)?)
    }
}
