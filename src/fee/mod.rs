// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee models, one per chain family.
//!
//! - `utxo` - fee rate times measured virtual size
//! - `dynamic` - EIP-1559 burnt / tip / refund split

pub mod dynamic;
pub mod utxo;

pub use dynamic::{calc_fee_split, DynamicFeeParams, FeeSplit};
pub use utxo::{fee_for_size, FeeRate, FeeRateUnit, TxSize, P2PKH_OUTPUT_SIZE};
