//! Deploy, mint and transfer scenarios against the in-memory ledger

mod common;

use common::{Ledger, code_cell, party_address};
use num_bigint::BigUint;

use jettonutils_rs::client::{JettonMinter, JettonWallet, MintOptions, TransferOptions};
use jettonutils_rs::jetton::{MetadataContent, MetadataKey, MinterConfig, WalletConfig};
use jettonutils_rs::tvm::Address;
use jettonutils_rs::utils::to_nano;

const FIRST_MINT: u128 = 100;

struct Fixture {
    ledger: std::sync::Arc<Ledger>,
    deployer: Address,
    minter: JettonMinter,
    config: MinterConfig,
}

fn jetton_params() -> MetadataContent {
    MetadataContent::from_pairs([
        ("name", "MyJetton"),
        ("symbol", "JET1"),
        ("image", "https://www.linkpicture.com/q/download_183.png"),
        ("description", "My jetton"),
    ])
    .unwrap()
}

fn mint_options(to: Address, jetton_amount: u128) -> MintOptions {
    MintOptions {
        to_address: to,
        jetton_amount,
        amount: to_nano("1").unwrap(),
        query_id: 42,
        value: to_nano("2").unwrap(),
    }
}

/// Deploys the minter with the deployer as admin and mints the first batch to it
async fn setup() -> Fixture {
    let minter_code = code_cell(0x4d494e54);
    let wallet_code = code_cell(0x57414c4c);
    let ledger = Ledger::new(minter_code.clone(), wallet_code.clone());

    let deployer = party_address(0xD0);
    let config = MinterConfig {
        admin_address: deployer,
        content: jetton_params(),
        wallet_code,
    };
    let minter = JettonMinter::create_from_config(&config, minter_code, 0).unwrap();

    let admin = ledger.party(deployer);
    minter.send_deploy(&admin, to_nano("100").unwrap()).await.unwrap();
    minter
        .send_mint(&admin, mint_options(deployer, FIRST_MINT))
        .await
        .unwrap();

    Fixture {
        ledger,
        deployer,
        minter,
        config,
    }
}

impl Fixture {
    fn wallet_of(&self, owner: Address) -> JettonWallet {
        JettonWallet::create_from_config(
            &WalletConfig {
                minter_address: self.minter.address,
                owner_address: owner,
                wallet_code: self.config.wallet_code.clone(),
            },
            0,
        )
        .unwrap()
    }

    async fn balance(&self, owner: Address) -> BigUint {
        let party = self.ledger.party(owner);
        self.wallet_of(owner)
            .get_wallet_data(&party)
            .await
            .unwrap()
            .balance
    }

    async fn supply(&self) -> BigUint {
        let party = self.ledger.party(self.deployer);
        self.minter
            .get_minter_data(&party)
            .await
            .unwrap()
            .total_supply
    }
}

#[tokio::test]
async fn test_minter_initialization_data() {
    let fx = setup().await;
    let admin = fx.ledger.party(fx.deployer);

    let data = fx.minter.get_minter_data(&admin).await.unwrap();
    assert_eq!(data.total_supply, BigUint::from(FIRST_MINT));
    assert_eq!(data.admin_address, Some(fx.deployer));
    assert_eq!(data.content, jetton_params());
    assert_eq!(data.wallet_code, fx.config.wallet_code);
}

#[tokio::test]
async fn test_name_and_symbol_only_content() {
    let minter_code = code_cell(1);
    let wallet_code = code_cell(2);
    let ledger = Ledger::new(minter_code.clone(), wallet_code.clone());
    let admin_address = party_address(0xD1);

    let content = MetadataContent::new()
        .with(MetadataKey::Name, "X")
        .with(MetadataKey::Symbol, "Y");
    let config = MinterConfig {
        admin_address,
        content: content.clone(),
        wallet_code,
    };
    let minter = JettonMinter::create_from_config(&config, minter_code, 0).unwrap();
    let admin = ledger.party(admin_address);

    minter.send_deploy(&admin, 1).await.unwrap();
    minter
        .send_mint(&admin, mint_options(admin_address, 100))
        .await
        .unwrap();

    let data = minter.get_minter_data(&admin).await.unwrap();
    assert_eq!(data.total_supply, BigUint::from(100u32));
    assert_eq!(data.admin_address, Some(admin_address));
    assert_eq!(data.content, content);
    assert_eq!(data.content.description, None);
    assert_eq!(data.content.image, None);
}

#[tokio::test]
async fn test_offchain_and_onchain_wallet_addresses_match() {
    let fx = setup().await;
    let admin = fx.ledger.party(fx.deployer);

    let on_chain = fx.minter.get_wallet_address(&admin, &fx.deployer).await.unwrap();
    let off_chain = fx.wallet_of(fx.deployer).address;
    assert_eq!(on_chain.to_string(), off_chain.to_string());
    assert_eq!(on_chain, off_chain);
}

#[tokio::test]
async fn test_wallet_initialization_data() {
    let fx = setup().await;
    let owner = fx.ledger.party(fx.deployer);

    let data = fx.wallet_of(fx.deployer).get_wallet_data(&owner).await.unwrap();
    assert_eq!(data.balance, BigUint::from(FIRST_MINT));
    assert_eq!(data.owner_address, fx.deployer);
    assert_eq!(data.master_address, fx.minter.address);
}

#[tokio::test]
async fn test_mint_to_two_deployed_wallets() {
    let fx = setup().await;
    let admin = fx.ledger.party(fx.deployer);
    let participant_1 = party_address(0x01);
    let participant_2 = party_address(0x02);

    for participant in [participant_1, participant_2] {
        let wallet = fx.wallet_of(participant);
        wallet
            .send_deploy(&fx.ledger.party(participant), to_nano("2").unwrap())
            .await
            .unwrap();
        assert_eq!(fx.balance(participant).await, BigUint::from(0u8));
    }

    let mut supply_off_chain = fx.supply().await;
    for participant in [participant_1, participant_2] {
        fx.minter
            .send_mint(&admin, mint_options(participant, 100))
            .await
            .unwrap();
        supply_off_chain += 100u32;

        assert_eq!(fx.balance(participant).await, BigUint::from(100u32));
        assert_eq!(fx.supply().await, supply_off_chain);
    }
}

#[tokio::test]
async fn test_transfer_between_wallets_conserves_supply() {
    let fx = setup().await;
    let admin = fx.ledger.party(fx.deployer);
    let participant_1 = party_address(0x01);
    let participant_2 = party_address(0x02);

    for participant in [participant_1, participant_2] {
        fx.minter
            .send_mint(&admin, mint_options(participant, FIRST_MINT))
            .await
            .unwrap();
    }

    let sender = fx.ledger.party(participant_1);
    let wallet_1 = JettonWallet::create_from_address(
        fx.minter
            .get_wallet_address(&sender, &participant_1)
            .await
            .unwrap(),
    );

    let mut balance_1 = fx.balance(participant_1).await;
    let mut balance_2 = fx.balance(participant_2).await;
    let supply = fx.supply().await;

    let transfer_amount = 50u32;
    wallet_1
        .send_transfer(
            &sender,
            TransferOptions {
                to_address: participant_2,
                jetton_amount: transfer_amount.into(),
                response_address: None,
                forward_ton_amount: to_nano("0.22").unwrap(),
                forward_payload: None,
                query_id: 42,
                value: to_nano("0.3").unwrap(),
            },
        )
        .await
        .unwrap();

    balance_1 -= transfer_amount;
    balance_2 += transfer_amount;

    assert_eq!(fx.balance(participant_1).await, balance_1);
    assert_eq!(fx.balance(participant_2).await, balance_2);
    assert_eq!(fx.supply().await, supply);

    let total: u128 = fx.ledger.balances().values().sum();
    assert_eq!(BigUint::from(total), supply);
}

#[tokio::test]
async fn test_rejected_operations_leave_state_unchanged() {
    let fx = setup().await;
    let stranger_address = party_address(0x66);
    let stranger = fx.ledger.party(stranger_address);

    let err = fx
        .minter
        .send_mint(&stranger, mint_options(stranger_address, 1_000))
        .await;
    assert!(err.is_err());

    let overdraft = fx
        .wallet_of(fx.deployer)
        .send_transfer(
            &fx.ledger.party(fx.deployer),
            TransferOptions {
                to_address: stranger_address,
                jetton_amount: FIRST_MINT + 1,
                response_address: None,
                forward_ton_amount: 0,
                forward_payload: None,
                query_id: 1,
                value: 1,
            },
        )
        .await;
    assert!(overdraft.is_err());

    assert_eq!(fx.supply().await, BigUint::from(FIRST_MINT));
    assert_eq!(fx.balance(fx.deployer).await, BigUint::from(FIRST_MINT));
}

#[tokio::test]
async fn test_admin_changes() {
    let fx = setup().await;
    let admin = fx.ledger.party(fx.deployer);
    let new_admin = party_address(0xA2);

    let content = MetadataContent::new().with(MetadataKey::Name, "Renamed");
    fx.minter
        .send_change_content(&admin, &content, 1)
        .await
        .unwrap();
    fx.minter
        .send_change_admin(&admin, new_admin, 1)
        .await
        .unwrap();

    let data = fx.minter.get_minter_data(&admin).await.unwrap();
    assert_eq!(data.content, content);
    assert_eq!(data.admin_address, Some(new_admin));

    // The previous admin can no longer mint
    assert!(
        fx.minter
            .send_mint(&admin, mint_options(fx.deployer, 1))
            .await
            .is_err()
    );
    fx.minter
        .send_mint(&fx.ledger.party(new_admin), mint_options(new_admin, 1))
        .await
        .unwrap();
    assert_eq!(fx.supply().await, BigUint::from(FIRST_MINT + 1));
}
