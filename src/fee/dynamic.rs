// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-1559 fee accounting.
//!
//! Given the gas a transaction used and its fee parameters, splits the
//! maximum the sender authorized (`fee_cap * gas_used`) into the part burnt
//! by the protocol, the tip paid to the block proposer, and the refund.

use serde::{Deserialize, Serialize};

use crate::amount::ScaledValue;
use crate::error::{TxError, TxResult};

/// Per-gas fee parameters in display units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicFeeParams {
    /// Base Fee Per Gas
    pub base_fee: ScaledValue,
    /// Max Priority Fee Per Gas
    pub tip_cap: ScaledValue,
    /// Max Fee Per Gas
    pub fee_cap: ScaledValue,
}

/// Where the authorized fee went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// `base_fee * gas_used`, destroyed by the protocol.
    pub burnt: ScaledValue,
    /// Paid to the block proposer.
    pub tip: ScaledValue,
    /// Refunded to the sender.
    pub save: ScaledValue,
}

impl FeeSplit {
    /// What the sender actually paid (`burnt + tip`).
    pub fn paid(&self) -> TxResult<ScaledValue> {
        Ok(self.burnt.checked_add(&self.tip)?)
    }
}

impl DynamicFeeParams {
    pub fn parse(base_fee: &str, tip_cap: &str, fee_cap: &str) -> TxResult<Self> {
        Ok(Self {
            base_fee: ScaledValue::parse(base_fee)?,
            tip_cap: ScaledValue::parse(tip_cap)?,
            fee_cap: ScaledValue::parse(fee_cap)?,
        })
    }

    /// Split the fee for a transaction that used `gas_used` gas.
    pub fn split(&self, gas_used: u64) -> TxResult<FeeSplit> {
        let gas = ScaledValue::from(gas_used);
        let base_total = self.base_fee.checked_mul(&gas)?;
        let tip_total = self.tip_cap.checked_mul(&gas)?;
        let cap_total = self.fee_cap.checked_mul(&gas)?;

        if cap_total < base_total {
            return Err(TxError::InsufficientFeeCap {
                fee_cap: self.fee_cap.to_string(),
                floor: format!("base fee {}", self.base_fee),
            });
        }

        let headroom = cap_total.checked_sub(&base_total)?;
        let (tip, save) = if headroom > tip_total {
            (tip_total, headroom.checked_sub(&tip_total)?)
        } else {
            (headroom, ScaledValue::ZERO)
        };

        Ok(FeeSplit {
            burnt: base_total,
            tip,
            save,
        })
    }
}

/// String-in, string-out form of [`DynamicFeeParams::split`].
pub fn calc_fee_split(
    gas_used: u64,
    base_fee: &str,
    tip_cap: &str,
    fee_cap: &str,
) -> TxResult<FeeSplit> {
    DynamicFeeParams::parse(base_fee, tip_cap, fee_cap)?.split(gas_used)
}
