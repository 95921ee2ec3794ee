//! Contract handles and the transport they talk through

pub mod base;
pub mod jetton_minter;
pub mod jetton_wallet;

pub use base::{InternalMessage, Receipt, SEND_MODE_PAY_GAS_SEPARATELY, Transport};
pub use jetton_minter::{JettonMinter, MintOptions, ProvideWalletAddressOptions};
pub use jetton_wallet::{JettonWallet, TransferOptions};
