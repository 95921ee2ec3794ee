//! Jetton deployment configuration
//!
//! ```json
//! {
//!   "admin": "EQ...",
//!   "workchain": 0,
//!   "content": { "name": "MyJetton", "symbol": "JET1" },
//!   "minter_code": "te6cc...",
//!   "wallet_code": "te6cc..."
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::jetton::{MetadataContent, MinterConfig, WalletConfig};
use crate::tvm::{Address, Cell, StateInit, base64_to_boc};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JettonConfig {
    /// Admin address, raw or user-friendly
    pub admin: String,
    #[serde(default)]
    pub workchain: i8,
    /// Metadata fields; unknown names are rejected when the config is used
    #[serde(default)]
    pub content: BTreeMap<String, String>,
    /// Base64 BoC of the minter code
    pub minter_code: String,
    /// Base64 BoC of the wallet code
    pub wallet_code: String,
}

impl FromStr for JettonConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("failed to parse jetton config")
    }
}

impl JettonConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        text.parse()
    }

    pub fn admin_address(&self) -> Result<Address> {
        Address::from_str(&self.admin)
            .with_context(|| format!("invalid admin address '{}'", self.admin))
    }

    pub fn metadata(&self) -> Result<MetadataContent> {
        Ok(MetadataContent::from_pairs(&self.content)?)
    }

    pub fn minter_code(&self) -> Result<Arc<Cell>> {
        base64_to_boc(&self.minter_code).context("invalid minter_code")
    }

    pub fn wallet_code(&self) -> Result<Arc<Cell>> {
        base64_to_boc(&self.wallet_code).context("invalid wallet_code")
    }

    pub fn minter_config(&self) -> Result<MinterConfig> {
        Ok(MinterConfig {
            admin_address: self.admin_address()?,
            content: self.metadata()?,
            wallet_code: self.wallet_code()?,
        })
    }

    pub fn minter_state_init(&self) -> Result<StateInit> {
        Ok(self.minter_config()?.state_init(self.minter_code()?)?)
    }

    pub fn minter_address(&self) -> Result<Address> {
        Ok(self.minter_state_init()?.address(self.workchain)?)
    }

    /// Wallet config of `owner` under the minter this config deploys
    pub fn wallet_config(&self, owner: Address) -> Result<WalletConfig> {
        Ok(WalletConfig {
            minter_address: self.minter_address()?,
            owner_address: owner,
            wallet_code: self.wallet_code()?,
        })
    }
}
