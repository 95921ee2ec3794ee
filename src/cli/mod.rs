use clap::{Parser, Subcommand};
use crate::config::JettonConfig;
use crate::jetton::{
    JettonData, JettonMessage, MetadataContent, MetadataKey, Mint, Transfer, WalletConfig,
    new_query_id,
};
use crate::models::{V2RunGetMethodResult, stack_from_result};
use crate::tvm::{Address, Cell, base64_to_boc, boc_to_base64};
use crate::utils::{method_name_to_id, to_decimals, to_nano};
use anyhow::{Context, Result};
use std::str::FromStr;
use std::sync::Arc;

/// jettonutils-rs CLI
#[derive(Parser, Debug)]
#[command(name = "jettonutils-rs")]
#[command(about = "Offline jetton message and metadata tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an on-chain metadata cell, or decode one with --decode
    Metadata {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<String>,
        /// Base64 BoC of a content cell to decode instead
        #[arg(long, conflicts_with_all = ["name", "symbol", "description", "image"])]
        decode: Option<String>,
    },
    /// Derive the minter address from a deployment config
    MinterAddress {
        /// Path to the JSON config
        #[arg(short = 'c', long)]
        config: String,
    },
    /// Derive the wallet address of an owner
    WalletAddress {
        /// Wallet owner address
        #[arg(short = 'o', long)]
        owner: String,
        /// Path to the JSON config (supplies minter address and wallet code)
        #[arg(short = 'c', long, conflicts_with_all = ["minter", "wallet_code"])]
        config: Option<String>,
        /// Minter address
        #[arg(short = 'm', long, requires = "wallet_code")]
        minter: Option<String>,
        /// Base64 BoC of the wallet code
        #[arg(short = 'w', long, requires = "minter")]
        wallet_code: Option<String>,
    },
    /// Print the body of a mint message
    MintBody {
        /// Minter address
        #[arg(short = 'm', long)]
        minter: String,
        /// Receiver of the jettons
        #[arg(short = 't', long)]
        to: String,
        /// Jetton amount, in whole jettons
        #[arg(short = 'j', long)]
        jetton_amount: String,
        /// Jetton decimals
        #[arg(short = 'd', long, default_value = "9")]
        decimals: u32,
        /// Toncoin forwarded to the receiving wallet
        #[arg(short = 'a', long, default_value = "0.05")]
        amount: String,
        /// Query id (random when omitted)
        #[arg(short = 'q', long)]
        query_id: Option<u64>,
    },
    /// Print the body of a wallet transfer message
    TransferBody {
        /// Receiver of the jettons
        #[arg(short = 't', long)]
        to: String,
        /// Receiver of excess toncoin
        #[arg(short = 'r', long)]
        response: String,
        /// Jetton amount, in whole jettons
        #[arg(short = 'j', long)]
        jetton_amount: String,
        /// Jetton decimals
        #[arg(short = 'd', long, default_value = "9")]
        decimals: u32,
        /// Toncoin forwarded with the transfer notification
        #[arg(short = 'f', long, default_value = "0")]
        forward_ton_amount: String,
        /// Query id (random when omitted)
        #[arg(short = 'q', long)]
        query_id: Option<u64>,
    },
    /// Decode a message body
    DecodeBody {
        /// Base64 BoC of the body
        body: String,
    },
    /// Decode a saved `get_jetton_data` result
    DecodeJettonData {
        /// Path to the JSON result of runGetMethod
        #[arg(short = 's', long)]
        stack_json: String,
    },
    /// Print the numeric id of a get-method
    MethodId {
        /// Method name
        name: String,
    },
}

fn parse_address(text: &str) -> Result<Address> {
    Address::from_str(text).with_context(|| format!("invalid address '{}'", text))
}

fn print_cell(label: &str, cell: &Arc<Cell>) -> Result<()> {
    log::info!("{} hash: {}", label, cell.hash_hex());
    log::info!("{} boc: {}", label, boc_to_base64(cell, true)?);
    Ok(())
}

fn print_address(label: &str, address: &Address) {
    log::info!("{} (raw): {}", label, address.to_hex());
    log::info!(
        "{} (bounceable): {}",
        label,
        address.to_string_with(true, true, true, false)
    );
    log::info!(
        "{} (non-bounceable): {}",
        label,
        address.to_string_with(true, true, false, false)
    );
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Execute the command
    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Metadata {
                name,
                symbol,
                description,
                image,
                decode,
            } => match decode {
                Some(boc) => self.execute_decode_metadata(boc),
                None => {
                    let pairs = [
                        (MetadataKey::Name, name),
                        (MetadataKey::Symbol, symbol),
                        (MetadataKey::Description, description),
                        (MetadataKey::Image, image),
                    ];
                    let mut content = MetadataContent::new();
                    for (key, value) in pairs {
                        if let Some(value) = value {
                            content.set(key, value.as_str());
                        }
                    }
                    self.execute_build_metadata(&content)
                }
            },
            Commands::MinterAddress { config } => self.execute_minter_address(config),
            Commands::WalletAddress {
                owner,
                config,
                minter,
                wallet_code,
            } => self.execute_wallet_address(
                owner,
                config.as_deref(),
                minter.as_deref(),
                wallet_code.as_deref(),
            ),
            Commands::MintBody {
                minter,
                to,
                jetton_amount,
                decimals,
                amount,
                query_id,
            } => {
                let minter = parse_address(minter)?;
                let mint = Mint::new(
                    minter,
                    parse_address(to)?,
                    to_nano(amount)?,
                    to_decimals(jetton_amount, *decimals)?,
                    query_id.unwrap_or_else(new_query_id),
                );
                log::info!("query id: {}", mint.query_id);
                print_cell("mint body", &mint.to_cell()?)
            }
            Commands::TransferBody {
                to,
                response,
                jetton_amount,
                decimals,
                forward_ton_amount,
                query_id,
            } => {
                let transfer = Transfer {
                    query_id: query_id.unwrap_or_else(new_query_id),
                    jetton_amount: to_decimals(jetton_amount, *decimals)?,
                    to_address: parse_address(to)?,
                    response_address: Some(parse_address(response)?),
                    forward_ton_amount: to_nano(forward_ton_amount)?,
                    forward_payload: None,
                };
                log::info!("query id: {}", transfer.query_id);
                print_cell("transfer body", &transfer.to_cell()?)
            }
            Commands::DecodeBody { body } => self.execute_decode_body(body),
            Commands::DecodeJettonData { stack_json } => {
                self.execute_decode_jetton_data(stack_json)
            }
            Commands::MethodId { name } => {
                log::info!("{}: {}", name, method_name_to_id(name));
                Ok(())
            }
        }
    }

    fn execute_build_metadata(&self, content: &MetadataContent) -> Result<()> {
        if content.is_empty() {
            log::warn!("no metadata fields given, building an empty content cell");
        }
        print_cell("content", &content.to_cell()?)
    }

    fn execute_decode_metadata(&self, boc: &str) -> Result<()> {
        let cell = base64_to_boc(boc).context("invalid content BoC")?;
        let content = MetadataContent::from_cell(&cell)?;
        log::info!("content: {}", serde_json::to_string_pretty(&content)?);
        Ok(())
    }

    fn execute_minter_address(&self, config_path: &str) -> Result<()> {
        let config = JettonConfig::from_file(config_path)?;
        let address = config.minter_address()?;
        print_address("minter address", &address);
        Ok(())
    }

    fn execute_wallet_address(
        &self,
        owner: &str,
        config_path: Option<&str>,
        minter: Option<&str>,
        wallet_code: Option<&str>,
    ) -> Result<()> {
        let owner = parse_address(owner)?;
        let wallet = match (config_path, minter, wallet_code) {
            (Some(path), _, _) => JettonConfig::from_file(path)?.wallet_config(owner)?,
            (None, Some(minter), Some(code)) => WalletConfig {
                minter_address: parse_address(minter)?,
                owner_address: owner,
                wallet_code: base64_to_boc(code).context("invalid wallet code BoC")?,
            },
            _ => anyhow::bail!("either --config or both --minter and --wallet-code are required"),
        };

        let workchain = wallet.minter_address.workchain;
        print_address("wallet address", &wallet.address(workchain)?);
        Ok(())
    }

    fn execute_decode_body(&self, body: &str) -> Result<()> {
        let cell = base64_to_boc(body).context("invalid body BoC")?;
        match JettonMessage::from_cell(&cell)? {
            Some(message) => log::info!("{:#?}", message),
            None => log::info!("empty body (deploy)"),
        }
        Ok(())
    }

    fn execute_decode_jetton_data(&self, path: &str) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path))?;
        let result: V2RunGetMethodResult =
            serde_json::from_str(&text).context("invalid runGetMethod result")?;
        let data = JettonData::from_stack(&stack_from_result(&result)?)?;

        log::info!("total supply: {}", data.total_supply);
        log::info!("mintable: {}", data.mintable);
        match &data.admin_address {
            Some(admin) => print_address("admin", admin),
            None => log::info!("admin: none"),
        }
        log::info!("content: {}", serde_json::to_string_pretty(&data.content)?);
        log::info!("wallet code hash: {}", data.wallet_code.hash_hex());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mint_body_args() {
        let cli = Cli::try_parse_from([
            "jettonutils-rs",
            "mint-body",
            "-m",
            "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8",
            "-t",
            "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N",
            "-j",
            "100",
            "-q",
            "42",
        ])
        .unwrap();

        match &cli.command {
            Commands::MintBody {
                amount,
                decimals,
                query_id,
                ..
            } => {
                assert_eq!(amount, "0.05");
                assert_eq!(*decimals, 9);
                assert_eq!(*query_id, Some(42));
            }
            other => panic!("unexpected command {:?}", other),
        }
        cli.execute().unwrap();
    }

    #[test]
    fn test_metadata_decode_conflicts_with_fields() {
        let result = Cli::try_parse_from([
            "jettonutils-rs",
            "metadata",
            "--name",
            "X",
            "--decode",
            "te6cckEBAQEAAgAAAEysuc0=",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_wallet_address_needs_source() {
        let cli = Cli::try_parse_from([
            "jettonutils-rs",
            "wallet-address",
            "-o",
            "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N",
        ])
        .unwrap();
        assert!(cli.execute().is_err());
    }

    #[test]
    fn test_method_id_command() {
        let cli = Cli::try_parse_from(["jettonutils-rs", "method-id", "get_jetton_data"]).unwrap();
        cli.execute().unwrap();
    }
}
