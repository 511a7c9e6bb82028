// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Tx Engine - Raw Transaction Construction & Fee Accounting
//!
//! Builds, signs and broadcasts transfers for the custodial wallet service on
//! two families of chains, with exact decimal money math throughout.
//!
//! ## Modules
//!
//! - `amount` - Scaled-integer decimals and display/smallest unit conversion
//! - `fee` - UTXO size-based fees and the EIP-1559 burnt/tip/save split
//! - `node` - Node capability traits the builders are written against
//! - `tx` - UTXO and account-model transaction builders
//! - `blockchain` - bitcoind and EVM node adapters, key loading, ERC-20 calldata
//! - `config` - Environment-driven settings
//! - `logging` - `tracing` subscriber setup

pub mod amount;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod fee;
pub mod logging;
pub mod node;
pub mod tx;

pub use error::{TxError, TxResult};
