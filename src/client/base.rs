use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::tvm::{Address, Cell, StackEntry, StateInit};


/// Sender pays forwarding fees on top of the attached value
pub const SEND_MODE_PAY_GAS_SEPARATELY: u8 = 1;


/// Internal message handed to a transport for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalMessage {
    pub destination: Address,
    /// Attached value in nanotons
    pub value: u128,
    pub body: Arc<Cell>,
    pub state_init: Option<StateInit>,
    pub send_mode: u8,
}

impl InternalMessage {
    pub fn new(destination: Address, value: u128, body: Arc<Cell>) -> Self {
        Self {
            destination,
            value,
            body,
            state_init: None,
            send_mode: SEND_MODE_PAY_GAS_SEPARATELY,
        }
    }

    pub fn with_state_init(mut self, state_init: Option<StateInit>) -> Self {
        self.state_init = state_init;
        self
    }
}


/// What a transport reports back after accepting a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Hex hash of the submitted body
    pub message_hash: String,
}


/// Delivery of messages and execution of get-methods
///
/// Implementations own the network side; everything passed in and out is
/// already encoded.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Address messages are sent from
    fn sender(&self) -> Address;

    async fn submit(&self, message: InternalMessage) -> Result<Receipt>;

    async fn query(
        &self,
        address: &Address,
        method: &str,
        args: Vec<StackEntry>,
    ) -> Result<Vec<StackEntry>>;
}
