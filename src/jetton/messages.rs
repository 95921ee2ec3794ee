//! Jetton operation message bodies
//!
//! Every body starts with a 32-bit opcode. Apart from the admin operations,
//! a 64-bit query id follows; the contract echoes it back in its responses.
//!
//! ```text
//! mint#15 query_id:uint64 to_address:MsgAddress amount:Coins
//!         master_msg:^InternalTransfer = MinterMsg;
//! internal_transfer#178d4519 query_id:uint64 amount:Coins from:MsgAddress
//!         response_address:MsgAddress forward_ton_amount:Coins
//!         forward_payload:(Either Cell ^Cell) = InternalMsgBody;
//! provide_wallet_address#2c76b973 query_id:uint64 owner_address:MsgAddress
//!         include_address:Bool = InternalMsgBody;
//! change_admin#3 new_admin_address:MsgAddress = MinterMsg;
//! change_content#4 content:^Cell = MinterMsg;
//! transfer#0f8a7ea5 query_id:uint64 amount:Coins destination:MsgAddress
//!         response_destination:MsgAddress custom_payload:(Maybe ^Cell)
//!         forward_ton_amount:Coins forward_payload:(Either Cell ^Cell)
//!         = InternalMsgBody;
//! ```

use crate::jetton::error::{JettonError, JettonResult};
use crate::jetton::metadata::MetadataContent;
use crate::tvm::{Address, Builder, Cell, Slice};
use log::debug;
use std::sync::Arc;

/// Operation codes understood by the minter and wallet contracts
pub mod op {
    pub const MINT: u32 = 0x15;
    pub const INTERNAL_TRANSFER: u32 = 0x178d4519;
    pub const PROVIDE_WALLET_ADDRESS: u32 = 0x2c76b973;
    pub const CHANGE_ADMIN: u32 = 0x3;
    pub const CHANGE_CONTENT: u32 = 0x4;
    pub const TRANSFER: u32 = 0x0f8a7ea5;
}

/// Returns a random query id
pub fn new_query_id() -> u64 {
    rand::random()
}

/// Body of a deploy message: an empty cell
pub fn deploy_body() -> Arc<Cell> {
    Arc::new(Cell::new())
}

/// Transfer of freshly minted jettons from the minter to a wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalTransfer {
    pub query_id: u64,
    pub jetton_amount: u128,
    pub from_address: Option<Address>,
    pub response_address: Option<Address>,
    pub forward_ton_amount: u128,
}

impl InternalTransfer {
    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder
            .store_u32(op::INTERNAL_TRANSFER)?
            .store_u64(self.query_id)?
            .store_coins(self.jetton_amount)?
            .store_address(self.from_address.as_ref())?
            .store_address(self.response_address.as_ref())?
            .store_coins(self.forward_ton_amount)?
            .store_bit(false)?; // forward_payload: inline, empty
        Ok(builder.build()?)
    }

    fn load(slice: &mut Slice) -> JettonResult<Self> {
        let query_id = slice.load_u64()?;
        let jetton_amount = slice.load_coins()?;
        let from_address = slice.load_address()?;
        let response_address = slice.load_address()?;
        let forward_ton_amount = slice.load_coins()?;
        load_forward_payload(slice)?;

        Ok(Self {
            query_id,
            jetton_amount,
            from_address,
            response_address,
            forward_ton_amount,
        })
    }
}

/// Mint request sent by the admin to the minter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mint {
    pub query_id: u64,
    pub to_address: Address,
    /// Toncoin the minter attaches to the internal transfer
    pub amount: u128,
    pub master_msg: InternalTransfer,
}

impl Mint {
    /// Mint whose nested transfer names the minter as both sender and response
    /// destination
    pub fn new(
        minter_address: Address,
        to_address: Address,
        amount: u128,
        jetton_amount: u128,
        query_id: u64,
    ) -> Self {
        Self {
            query_id,
            to_address,
            amount,
            master_msg: InternalTransfer {
                query_id,
                jetton_amount,
                from_address: Some(minter_address),
                response_address: Some(minter_address),
                forward_ton_amount: 0,
            },
        }
    }

    pub fn jetton_amount(&self) -> u128 {
        self.master_msg.jetton_amount
    }

    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder
            .store_u32(op::MINT)?
            .store_u64(self.query_id)?
            .store_address(Some(&self.to_address))?
            .store_coins(self.amount)?
            .store_ref(self.master_msg.to_cell()?)?;
        Ok(builder.build()?)
    }
}

/// Request for the wallet address of `owner_address`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideWalletAddress {
    pub query_id: u64,
    pub owner_address: Address,
    pub include_address: bool,
}

impl ProvideWalletAddress {
    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder
            .store_u32(op::PROVIDE_WALLET_ADDRESS)?
            .store_u64(self.query_id)?
            .store_address(Some(&self.owner_address))?
            .store_bit(self.include_address)?;
        Ok(builder.build()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeAdmin {
    pub new_admin_address: Address,
}

impl ChangeAdmin {
    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder
            .store_u32(op::CHANGE_ADMIN)?
            .store_address(Some(&self.new_admin_address))?;
        Ok(builder.build()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeContent {
    pub content: Arc<Cell>,
}

impl ChangeContent {
    pub fn from_metadata(content: &MetadataContent) -> JettonResult<Self> {
        Ok(Self {
            content: content.to_cell()?,
        })
    }

    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder
            .store_u32(op::CHANGE_CONTENT)?
            .store_ref(self.content.clone())?;
        Ok(builder.build()?)
    }
}

/// Jetton transfer sent by an owner to their own wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub query_id: u64,
    pub jetton_amount: u128,
    pub to_address: Address,
    pub response_address: Option<Address>,
    pub forward_ton_amount: u128,
    /// Carried by reference when present
    pub forward_payload: Option<Arc<Cell>>,
}

impl Transfer {
    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        let mut builder = Builder::new();
        builder
            .store_u32(op::TRANSFER)?
            .store_u64(self.query_id)?
            .store_coins(self.jetton_amount)?
            .store_address(Some(&self.to_address))?
            .store_address(self.response_address.as_ref())?
            .store_maybe_ref(None)? // custom_payload
            .store_coins(self.forward_ton_amount)?;
        match &self.forward_payload {
            Some(payload) => builder.store_bit(true)?.store_ref(payload.clone())?,
            None => builder.store_bit(false)?,
        };
        Ok(builder.build()?)
    }

    fn load(slice: &mut Slice) -> JettonResult<Self> {
        let query_id = slice.load_u64()?;
        let jetton_amount = slice.load_coins()?;
        let to_address = slice.load_internal_address()?;
        let response_address = slice.load_address()?;
        let _custom_payload = slice.load_maybe_ref()?;
        let forward_ton_amount = slice.load_coins()?;
        let forward_payload = load_forward_payload(slice)?;

        Ok(Self {
            query_id,
            jetton_amount,
            to_address,
            response_address,
            forward_ton_amount,
            forward_payload,
        })
    }
}

/// `Either Cell ^Cell`: the inline branch keeps whatever bits are left
fn load_forward_payload(slice: &mut Slice) -> JettonResult<Option<Arc<Cell>>> {
    if slice.load_bit()? {
        Ok(Some(slice.load_reference()?))
    } else {
        Ok(None)
    }
}

/// Any message body the jetton contracts understand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JettonMessage {
    Mint(Mint),
    InternalTransfer(InternalTransfer),
    ProvideWalletAddress(ProvideWalletAddress),
    ChangeAdmin(ChangeAdmin),
    ChangeContent(ChangeContent),
    Transfer(Transfer),
}

impl JettonMessage {
    pub fn opcode(&self) -> u32 {
        match self {
            JettonMessage::Mint(_) => op::MINT,
            JettonMessage::InternalTransfer(_) => op::INTERNAL_TRANSFER,
            JettonMessage::ProvideWalletAddress(_) => op::PROVIDE_WALLET_ADDRESS,
            JettonMessage::ChangeAdmin(_) => op::CHANGE_ADMIN,
            JettonMessage::ChangeContent(_) => op::CHANGE_CONTENT,
            JettonMessage::Transfer(_) => op::TRANSFER,
        }
    }

    pub fn to_cell(&self) -> JettonResult<Arc<Cell>> {
        let cell = match self {
            JettonMessage::Mint(msg) => msg.to_cell(),
            JettonMessage::InternalTransfer(msg) => msg.to_cell(),
            JettonMessage::ProvideWalletAddress(msg) => msg.to_cell(),
            JettonMessage::ChangeAdmin(msg) => msg.to_cell(),
            JettonMessage::ChangeContent(msg) => msg.to_cell(),
            JettonMessage::Transfer(msg) => msg.to_cell(),
        }?;
        debug!(
            "built body op=0x{:08x} hash={}",
            self.opcode(),
            cell.hash_hex()
        );
        Ok(cell)
    }

    /// Decodes a message body; an empty body yields `None`
    pub fn from_cell(cell: &Arc<Cell>) -> JettonResult<Option<Self>> {
        let mut slice = Slice::new(cell.clone());
        if slice.is_empty() {
            return Ok(None);
        }

        let opcode = slice.load_u32()?;
        let message = match opcode {
            op::MINT => {
                let query_id = slice.load_u64()?;
                let to_address = slice.load_internal_address()?;
                let amount = slice.load_coins()?;
                let mut inner = Slice::new(slice.load_reference()?);
                let inner_op = inner.load_u32()?;
                if inner_op != op::INTERNAL_TRANSFER {
                    return Err(JettonError::Format(format!(
                        "mint carries op 0x{:08x} instead of internal_transfer",
                        inner_op
                    )));
                }
                JettonMessage::Mint(Mint {
                    query_id,
                    to_address,
                    amount,
                    master_msg: InternalTransfer::load(&mut inner)?,
                })
            }
            op::INTERNAL_TRANSFER => {
                JettonMessage::InternalTransfer(InternalTransfer::load(&mut slice)?)
            }
            op::PROVIDE_WALLET_ADDRESS => {
                JettonMessage::ProvideWalletAddress(ProvideWalletAddress {
                    query_id: slice.load_u64()?,
                    owner_address: slice.load_internal_address()?,
                    include_address: slice.load_bit()?,
                })
            }
            op::CHANGE_ADMIN => JettonMessage::ChangeAdmin(ChangeAdmin {
                new_admin_address: slice.load_internal_address()?,
            }),
            op::CHANGE_CONTENT => JettonMessage::ChangeContent(ChangeContent {
                content: slice.load_reference()?,
            }),
            op::TRANSFER => JettonMessage::Transfer(Transfer::load(&mut slice)?),
            other => {
                return Err(JettonError::Format(format!(
                    "unknown jetton opcode 0x{:08x}",
                    other
                )));
            }
        };

        Ok(Some(message))
    }
}
