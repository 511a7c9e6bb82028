// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversion between a chain's smallest indivisible unit and its display unit.
//!
//! `display = smallest / 10^decimals` and `smallest = display * 10^decimals`,
//! both computed with [`ScaledValue`] so the two directions are exact inverses.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use super::decimal::{DecimalError, ScaledValue};

/// Fractional digits of one gwei expressed in wei.
pub const GWEI_DECIMALS: u8 = 9;

/// Chain families with a fixed native unit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// UTXO model; 1 BTC = 10^8 satoshi.
    Bitcoin,
    /// Account model; 1 ETH = 10^18 wei.
    Ethereum,
    /// Federated ledger; 1 XRP = 10^6 drops.
    Ripple,
}

impl Chain {
    /// Fractional digits of the native display unit.
    pub const fn decimal_places(self) -> u8 {
        match self {
            Chain::Bitcoin => 8,
            Chain::Ethereum => 18,
            Chain::Ripple => 6,
        }
    }

    pub const fn display_unit(self) -> &'static str {
        match self {
            Chain::Bitcoin => "BTC",
            Chain::Ethereum => "ETH",
            Chain::Ripple => "XRP",
        }
    }

    pub const fn smallest_unit(self) -> &'static str {
        match self {
            Chain::Bitcoin => "satoshi",
            Chain::Ethereum => "wei",
            Chain::Ripple => "drop",
        }
    }
}

/// Smallest-unit value to display value.
pub fn to_display_unit(
    smallest: &ScaledValue,
    decimals: u8,
) -> Result<ScaledValue, DecimalError> {
    smallest.div_exact(&ScaledValue::ten_pow(u32::from(decimals))?)
}

/// Display value to smallest-unit value. The result may carry a fractional
/// part when the display value has more digits than `decimals`; callers that
/// need an integer use [`to_smallest_integer`].
pub fn to_smallest_unit(
    display: &ScaledValue,
    decimals: u8,
) -> Result<ScaledValue, DecimalError> {
    display.checked_mul(&ScaledValue::ten_pow(u32::from(decimals))?)
}

/// Display value to a non-negative integer amount of smallest units.
///
/// Returns `None` when the value is negative or would need a fractional
/// smallest unit.
pub fn to_smallest_integer(
    display: &ScaledValue,
    decimals: u8,
) -> Result<Option<U256>, DecimalError> {
    Ok(to_smallest_unit(display, decimals)?.to_u256())
}

/// String form of [`to_display_unit`].
pub fn format_display(smallest: &str, decimals: u8) -> Result<String, DecimalError> {
    Ok(to_display_unit(&ScaledValue::parse(smallest)?, decimals)?.to_string())
}

/// String form of [`to_smallest_unit`].
pub fn format_smallest(display: &str, decimals: u8) -> Result<String, DecimalError> {
    Ok(to_smallest_unit(&ScaledValue::parse(display)?, decimals)?.to_string())
}

pub fn wei_to_eth(wei: &str) -> Result<String, DecimalError> {
    format_display(wei, Chain::Ethereum.decimal_places())
}

pub fn eth_to_wei(eth: &str) -> Result<String, DecimalError> {
    format_smallest(eth, Chain::Ethereum.decimal_places())
}

pub fn wei_to_gwei(wei: &str) -> Result<String, DecimalError> {
    format_display(wei, GWEI_DECIMALS)
}

pub fn gwei_to_wei(gwei: &str) -> Result<String, DecimalError> {
    format_smallest(gwei, GWEI_DECIMALS)
}

pub fn satoshi_to_btc(satoshi: &str) -> Result<String, DecimalError> {
    format_display(satoshi, Chain::Bitcoin.decimal_places())
}

pub fn btc_to_satoshi(btc: &str) -> Result<String, DecimalError> {
    format_smallest(btc, Chain::Bitcoin.decimal_places())
}

pub fn drop_to_xrp(drop: &str) -> Result<String, DecimalError> {
    format_display(drop, Chain::Ripple.decimal_places())
}

pub fn xrp_to_drop(xrp: &str) -> Result<String, DecimalError> {
    format_smallest(xrp, Chain::Ripple.decimal_places())
}
