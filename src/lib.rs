//! Jetton (TON fungible token) message and metadata codec
//!
//! - [`tvm`]: cells, builders, slices, dictionaries, BoC, addresses, stacks
//! - [`jetton`]: metadata, operation bodies, minter and wallet state
//! - [`client`]: contract handles over a caller-supplied [`client::Transport`]

pub mod cli;
pub mod client;
pub mod config;
pub mod crc;
pub mod jetton;
pub mod models;
pub mod tvm;
pub mod utils;
