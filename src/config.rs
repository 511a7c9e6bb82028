// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names and defaults for the transaction engine. The
//! enclosing wallet service loads them once at startup with
//! [`EngineConfig::from_env`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `UTXO_FEE_RATE_UNIT` | Unit of UTXO fee rates (`btc_per_kvb` or `sat_per_vb`) | `btc_per_kvb` |
//! | `UTXO_CHANGE_PADDING_BYTES` | Size allowance for the change output | `34` |
//! | `UTXO_MIN_CONFIRMATIONS` | Lower confirmation bound for list-unspent | `1` |
//! | `UTXO_MAX_CONFIRMATIONS` | Upper confirmation bound for list-unspent | `99999999` |
//! | `UTXO_FEE_TARGET_BLOCKS` | Horizon for fee-rate estimation | `10` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::fmt::Display;
use std::str::FromStr;

use crate::fee::{FeeRateUnit, P2PKH_OUTPUT_SIZE};
use crate::logging::LogFormat;

pub const UTXO_FEE_RATE_UNIT_ENV: &str = "UTXO_FEE_RATE_UNIT";
pub const UTXO_CHANGE_PADDING_BYTES_ENV: &str = "UTXO_CHANGE_PADDING_BYTES";
pub const UTXO_MIN_CONFIRMATIONS_ENV: &str = "UTXO_MIN_CONFIRMATIONS";
pub const UTXO_MAX_CONFIRMATIONS_ENV: &str = "UTXO_MAX_CONFIRMATIONS";
pub const UTXO_FEE_TARGET_BLOCKS_ENV: &str = "UTXO_FEE_TARGET_BLOCKS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_MIN_CONFIRMATIONS: u32 = 1;
pub const DEFAULT_MAX_CONFIRMATIONS: u32 = 99_999_999;
pub const DEFAULT_FEE_TARGET_BLOCKS: u32 = 10;

/// Settings for [`crate::tx::UtxoTxBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoBuilderConfig {
    /// Unit of request fee rates. Node estimates are always BTC/kvB.
    pub fee_rate_unit: FeeRateUnit,
    /// Bytes added to the measured size for the not-yet-added change output.
    pub change_padding_bytes: u64,
    pub min_confirmations: u32,
    pub max_confirmations: u32,
    /// Confirmation horizon used when the fee rate is fetched from the node.
    pub fee_target_blocks: u32,
}

impl Default for UtxoBuilderConfig {
    fn default() -> Self {
        Self {
            fee_rate_unit: FeeRateUnit::BtcPerKvb,
            change_padding_bytes: P2PKH_OUTPUT_SIZE,
            min_confirmations: DEFAULT_MIN_CONFIRMATIONS,
            max_confirmations: DEFAULT_MAX_CONFIRMATIONS,
            fee_target_blocks: DEFAULT_FEE_TARGET_BLOCKS,
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub utxo: UtxoBuilderConfig,
    pub log_format: LogFormat,
}

impl EngineConfig {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup. Unset keys take their default;
    /// invalid values take their default and log a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = UtxoBuilderConfig::default();

        let mut utxo = UtxoBuilderConfig {
            fee_rate_unit: setting(&lookup, UTXO_FEE_RATE_UNIT_ENV, defaults.fee_rate_unit),
            change_padding_bytes: setting(
                &lookup,
                UTXO_CHANGE_PADDING_BYTES_ENV,
                defaults.change_padding_bytes,
            ),
            min_confirmations: setting(
                &lookup,
                UTXO_MIN_CONFIRMATIONS_ENV,
                defaults.min_confirmations,
            ),
            max_confirmations: setting(
                &lookup,
                UTXO_MAX_CONFIRMATIONS_ENV,
                defaults.max_confirmations,
            ),
            fee_target_blocks: setting(
                &lookup,
                UTXO_FEE_TARGET_BLOCKS_ENV,
                defaults.fee_target_blocks,
            ),
        };

        if utxo.min_confirmations > utxo.max_confirmations {
            tracing::warn!(
                min = utxo.min_confirmations,
                max = utxo.max_confirmations,
                "Confirmation bounds inverted, using defaults"
            );
            utxo.min_confirmations = defaults.min_confirmations;
            utxo.max_confirmations = defaults.max_confirmations;
        }

        Self {
            utxo,
            log_format: setting(&lookup, LOG_FORMAT_ENV, LogFormat::default()),
        }
    }
}

fn setting<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %raw, error = %e, default = %default, "Invalid setting, using default");
            default
        }),
    }
}
