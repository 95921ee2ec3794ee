//! In-memory ledger that runs jetton bodies against minter and wallet state
//!
//! Accounts are recognized by their code cell. The ledger keeps wallet
//! balances beside the contract data, since the wallet data layout only holds
//! the minter, the owner and the code.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail, ensure};
use async_trait::async_trait;
use num_bigint::BigInt;

use jettonutils_rs::client::{InternalMessage, Receipt, Transport};
use jettonutils_rs::jetton::{
    GET_JETTON_DATA, GET_WALLET_ADDRESS, GET_WALLET_DATA, JettonMessage, MinterState,
    WalletConfig, WalletData,
};
use jettonutils_rs::tvm::{Address, Builder, Cell, StackEntry, StackReader};

struct Account {
    code: Arc<Cell>,
    data: Arc<Cell>,
}

#[derive(Default)]
struct State {
    accounts: HashMap<Address, Account>,
    balances: HashMap<Address, u128>,
}

pub struct Ledger {
    minter_code: Arc<Cell>,
    wallet_code: Arc<Cell>,
    state: Mutex<State>,
}

/// One party's view of the ledger: messages are sent from `sender`
pub struct Party {
    ledger: Arc<Ledger>,
    sender: Address,
}

pub fn code_cell(tag: u32) -> Arc<Cell> {
    let mut builder = Builder::new();
    builder.store_u32(tag).unwrap();
    builder.build().unwrap()
}

pub fn party_address(seed: u8) -> Address {
    Address::new(0, [seed; 32])
}

impl Ledger {
    pub fn new(minter_code: Arc<Cell>, wallet_code: Arc<Cell>) -> Arc<Self> {
        Arc::new(Self {
            minter_code,
            wallet_code,
            state: Mutex::new(State::default()),
        })
    }

    pub fn party(self: &Arc<Self>, sender: Address) -> Party {
        Party {
            ledger: self.clone(),
            sender,
        }
    }

    pub fn balances(&self) -> HashMap<Address, u128> {
        self.state.lock().unwrap().balances.clone()
    }

    fn deliver(&self, sender: Address, message: InternalMessage) -> Result<()> {
        let mut state = self.state.lock().map_err(|e| anyhow!("{e}"))?;

        if let Some(init) = &message.state_init {
            let expected = init.address(message.destination.workchain)?;
            ensure!(
                expected == message.destination,
                "state init does not match destination"
            );
            state
                .accounts
                .entry(message.destination)
                .or_insert_with(|| Account {
                    code: init.code.clone(),
                    data: init.data.clone(),
                });
        }

        let Some(account) = state.accounts.get(&message.destination) else {
            bail!("account {} is not deployed", message.destination);
        };

        let Some(body) = JettonMessage::from_cell(&message.body)? else {
            return Ok(());
        };

        if account.code == self.minter_code {
            let minter = MinterState::from_cell(&account.data)?;
            self.run_minter(&mut state, message.destination, minter, sender, body)
        } else if account.code == self.wallet_code {
            let wallet = WalletConfig::from_cell(&account.data)?;
            self.run_wallet(&mut state, message.destination, wallet, sender, body)
        } else {
            bail!("unknown code at {}", message.destination)
        }
    }

    fn run_minter(
        &self,
        state: &mut State,
        address: Address,
        mut minter: MinterState,
        sender: Address,
        body: JettonMessage,
    ) -> Result<()> {
        let is_admin = minter.admin_address == Some(sender);
        match body {
            JettonMessage::Mint(mint) => {
                ensure!(is_admin, "mint from non-admin {}", sender);
                ensure!(
                    mint.master_msg.from_address == Some(address),
                    "internal transfer must name the minter"
                );
                let wallet = WalletConfig {
                    minter_address: address,
                    owner_address: mint.to_address,
                    wallet_code: minter.wallet_code.clone(),
                };
                self.credit(state, &wallet, mint.jetton_amount())?;
                minter.total_supply = minter
                    .total_supply
                    .checked_add(mint.jetton_amount())
                    .ok_or_else(|| anyhow!("supply overflow"))?;
            }
            JettonMessage::ChangeAdmin(change) => {
                ensure!(is_admin, "change_admin from non-admin {}", sender);
                minter.admin_address = Some(change.new_admin_address);
            }
            JettonMessage::ChangeContent(change) => {
                ensure!(is_admin, "change_content from non-admin {}", sender);
                minter.content = change.content;
            }
            JettonMessage::ProvideWalletAddress(_) => {}
            other => bail!("minter does not accept op 0x{:08x}", other.opcode()),
        }

        state.accounts.insert(
            address,
            Account {
                code: self.minter_code.clone(),
                data: minter.to_cell()?,
            },
        );
        Ok(())
    }

    fn run_wallet(
        &self,
        state: &mut State,
        address: Address,
        wallet: WalletConfig,
        sender: Address,
        body: JettonMessage,
    ) -> Result<()> {
        let transfer = match body {
            JettonMessage::Transfer(transfer) => transfer,
            other => bail!("wallet does not accept op 0x{:08x}", other.opcode()),
        };
        ensure!(sender == wallet.owner_address, "transfer from non-owner {}", sender);

        let balance = state.balances.get(&address).copied().unwrap_or(0);
        ensure!(
            balance >= transfer.jetton_amount,
            "balance {} is below {}",
            balance,
            transfer.jetton_amount
        );

        let receiver = WalletConfig {
            minter_address: wallet.minter_address,
            owner_address: transfer.to_address,
            wallet_code: wallet.wallet_code.clone(),
        };
        state
            .balances
            .insert(address, balance - transfer.jetton_amount);
        self.credit(state, &receiver, transfer.jetton_amount)
    }

    fn credit(&self, state: &mut State, wallet: &WalletConfig, amount: u128) -> Result<()> {
        let init = wallet.state_init()?;
        let address = init.address(wallet.minter_address.workchain)?;
        state.accounts.entry(address).or_insert_with(|| Account {
            code: init.code.clone(),
            data: init.data.clone(),
        });
        let balance = state.balances.entry(address).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| anyhow!("balance overflow"))?;
        Ok(())
    }

    fn run_get_method(
        &self,
        address: &Address,
        method: &str,
        args: &[StackEntry],
    ) -> Result<Vec<StackEntry>> {
        let state = self.state.lock().map_err(|e| anyhow!("{e}"))?;
        let account = state
            .accounts
            .get(address)
            .ok_or_else(|| anyhow!("account {} is not deployed", address))?;

        match method {
            GET_JETTON_DATA if account.code == self.minter_code => {
                let minter = MinterState::from_cell(&account.data)?;
                let mut admin = Builder::new();
                admin.store_address(minter.admin_address.as_ref())?;
                Ok(vec![
                    StackEntry::Int(BigInt::from(minter.total_supply)),
                    StackEntry::from(true),
                    StackEntry::Slice(admin.build()?),
                    StackEntry::Cell(minter.content),
                    StackEntry::Cell(minter.wallet_code),
                ])
            }
            GET_WALLET_ADDRESS if account.code == self.minter_code => {
                let minter = MinterState::from_cell(&account.data)?;
                let owner = StackReader::new(args)
                    .read_address()?
                    .ok_or_else(|| anyhow!("owner is addr_none"))?;
                let wallet = WalletConfig {
                    minter_address: *address,
                    owner_address: owner,
                    wallet_code: minter.wallet_code,
                };
                let wallet_address = wallet.address(address.workchain)?;
                Ok(vec![StackEntry::from_address(&wallet_address)?])
            }
            GET_WALLET_DATA if account.code == self.wallet_code => {
                let wallet = WalletConfig::from_cell(&account.data)?;
                let balance = state.balances.get(address).copied().unwrap_or(0);
                Ok(WalletData {
                    balance: balance.into(),
                    owner_address: wallet.owner_address,
                    master_address: wallet.minter_address,
                    wallet_code: wallet.wallet_code,
                }
                .to_stack()?)
            }
            other => bail!("method {} is not available at {}", other, address),
        }
    }
}

#[async_trait]
impl Transport for Party {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn submit(&self, message: InternalMessage) -> Result<Receipt> {
        let message_hash = message.body.hash_hex();
        self.ledger.deliver(self.sender, message)?;
        Ok(Receipt { message_hash })
    }

    async fn query(
        &self,
        address: &Address,
        method: &str,
        args: Vec<StackEntry>,
    ) -> Result<Vec<StackEntry>> {
        self.ledger.run_get_method(address, method, &args)
    }
}
