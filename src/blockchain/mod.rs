// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain-specific plumbing: node adapters, key loading and call payloads.

pub mod bitcoind;
pub mod erc20;
pub mod evm;
pub mod signing;
pub mod types;

pub use bitcoind::{BitcoindRpc, Command, CommandRegistry};
pub use evm::EvmNode;
pub use types::*;
