//! Jetton (TEP-74 fungible token) codec
//!
//! Builds the bodies sent to minter and wallet contracts, their initial
//! states and addresses, and decodes what their get-methods return.

pub mod error;
pub mod messages;
pub mod metadata;
pub mod minter;
pub mod wallet;

pub use error::{JettonError, JettonResult};
pub use messages::{
    ChangeAdmin, ChangeContent, InternalTransfer, JettonMessage, Mint, ProvideWalletAddress,
    Transfer, deploy_body, new_query_id, op,
};
pub use metadata::{MetadataContent, MetadataKey, build_metadata_cell, parse_metadata_cell};
pub use minter::{
    GET_JETTON_DATA, GET_WALLET_ADDRESS, JettonData, MinterConfig, MinterState,
    decode_wallet_address, wallet_address_args,
};
pub use wallet::{GET_WALLET_DATA, WalletConfig, WalletData};
