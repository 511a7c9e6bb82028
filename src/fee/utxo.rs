// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Rate-times-size fee model for UTXO chains.
//!
//! The fee for a transaction is `rate * (vsize + padding)`, where `vsize` is
//! measured on a signed serialization and `padding` anticipates the change
//! output that is appended only after the fee is known.

use std::fmt;
use std::str::FromStr;

use bitcoin::consensus::encode::deserialize;
use bitcoin::Transaction;
use serde::{Deserialize, Serialize};

use crate::amount::ScaledValue;
use crate::error::{TxError, TxResult};

/// Serialized size of one P2PKH output: 8-byte value, 1-byte script length,
/// 25-byte locking script. Used as the change-output allowance regardless of
/// the change address's real script type.
pub const P2PKH_OUTPUT_SIZE: u64 = 34;

/// Satoshi per vbyte in one BTC per 1000 vbytes (`10^8 / 10^3`).
const SAT_PER_VBYTE_DIGITS: u32 = 5;

/// Unit of a UTXO fee rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeRateUnit {
    /// BTC per 1000 virtual bytes, as reported by `estimatesmartfee`.
    #[default]
    BtcPerKvb,
    /// Satoshi per virtual byte.
    SatPerVb,
}

impl FromStr for FeeRateUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "btc_per_kvb" => Ok(Self::BtcPerKvb),
            "sat_per_vb" => Ok(Self::SatPerVb),
            other => Err(format!("unknown fee rate unit `{other}`")),
        }
    }
}

impl fmt::Display for FeeRateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BtcPerKvb => "btc_per_kvb",
            Self::SatPerVb => "sat_per_vb",
        })
    }
}

/// A non-negative fee rate with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRate {
    rate: ScaledValue,
    unit: FeeRateUnit,
}

impl FeeRate {
    pub fn new(rate: ScaledValue, unit: FeeRateUnit) -> TxResult<Self> {
        if rate.is_negative() {
            return Err(TxError::InvalidAmount(format!("negative fee rate {rate}")));
        }
        Ok(Self { rate, unit })
    }

    pub fn rate(&self) -> ScaledValue {
        self.rate
    }

    pub fn unit(&self) -> FeeRateUnit {
        self.unit
    }

    /// Whole satoshi per vbyte, truncated toward zero.
    pub fn sat_per_vbyte(&self) -> TxResult<u64> {
        let sat = match self.unit {
            FeeRateUnit::BtcPerKvb => self
                .rate
                .checked_mul(&ScaledValue::ten_pow(SAT_PER_VBYTE_DIGITS)?)?,
            FeeRateUnit::SatPerVb => self.rate,
        };
        sat.trunc()
            .to_u64()
            .ok_or_else(|| TxError::InvalidAmount(format!("fee rate {sat} sat/vB out of range")))
    }
}

/// `rate * (vsize + padding)` in satoshi.
pub fn fee_for_size(sat_per_vbyte: u64, vsize: u64, padding: u64) -> TxResult<u64> {
    vsize
        .checked_add(padding)
        .and_then(|size| size.checked_mul(sat_per_vbyte))
        .ok_or_else(|| {
            TxError::InvalidAmount(format!(
                "fee overflow: {sat_per_vbyte} sat/vB for {vsize}+{padding} vbytes"
            ))
        })
}

// =============================================================================
// Size Measurement
// =============================================================================

/// Serialized sizes of a transaction, with and without witness data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSize {
    pub total: u64,
    pub stripped: u64,
}

impl TxSize {
    /// Decode a legacy or segwit serialization and measure it.
    pub fn measure(raw: &[u8]) -> TxResult<Self> {
        let tx: Transaction = deserialize(raw)
            .map_err(|e| TxError::MalformedTransaction(e.to_string()))?;
        Ok(Self {
            total: tx.total_size() as u64,
            stripped: tx.base_size() as u64,
        })
    }

    /// `stripped * 3 + total`.
    pub fn weight(&self) -> u64 {
        self.stripped * 3 + self.total
    }

    /// Weight in virtual bytes, rounded half up.
    ///
    /// `bitcoin::Weight::to_vbytes_ceil` rounds every remainder up, which
    /// overcharges weights of the form `4n + 1`.
    pub fn vsize(&self) -> u64 {
        (self.weight() + 2) / 4
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Serialize a transaction with the given script/witness shapes.
    /// `inputs` holds `(script_sig_len, witness_item_lens)`.
    pub(crate) fn sample_tx(inputs: &[(usize, Vec<usize>)], output_scripts: &[usize]) -> Vec<u8> {
        let segwit = inputs.iter().any(|(_, w)| !w.is_empty());
        let mut tx = vec![2, 0, 0, 0];
        if segwit {
            tx.extend([0x00, 0x01]);
        }
        tx.push(inputs.len() as u8);
        for (script_len, _) in inputs {
            tx.extend([0xab; 32]);
            tx.extend([0, 0, 0, 0]);
            tx.push(*script_len as u8);
            tx.extend(vec![0x51; *script_len]);
            tx.extend([0xff; 4]);
        }
        tx.push(output_scripts.len() as u8);
        for script_len in output_scripts {
            tx.extend(1_000u64.to_le_bytes());
            tx.push(*script_len as u8);
            tx.extend(vec![0x76; *script_len]);
        }
        if segwit {
            for (_, witness) in inputs {
                tx.push(witness.len() as u8);
                for item in witness {
                    tx.push(*item as u8);
                    tx.extend(vec![0x30; *item]);
                }
            }
        }
        tx.extend([0, 0, 0, 0]);
        tx
    }

    #[test]
    fn test_measure_legacy_p2pkh() {
        // 1 input with a 107-byte scriptSig, 2 P2PKH outputs.
        let raw = sample_tx(&[(107, vec![])], &[25, 25]);
        let size = TxSize::measure(&raw).unwrap();
        assert_eq!(size.total, 226);
        assert_eq!(size.stripped, 226);
        assert_eq!(size.vsize(), 226);
    }

    #[test]
    fn test_measure_segwit_p2wpkh() {
        // 1 P2WPKH input (72-byte signature, 33-byte key), 2 P2WPKH outputs.
        let raw = sample_tx(&[(0, vec![72, 33])], &[22, 22]);
        let size = TxSize::measure(&raw).unwrap();
        // witness: count(1) + 1+72 + 1+33 = 108
        assert_eq!(size.total, raw.len() as u64);
        assert_eq!(size.stripped, size.total - 2 - 108);
        assert_eq!(size.weight(), size.stripped * 3 + size.total);
        // weight 4*stripped + 110 => vsize = stripped + 27.5 rounded up
        assert_eq!(size.vsize(), size.stripped + 28);
    }

    #[test]
    fn test_measure_matches_consensus_weight() {
        use bitcoin::absolute::LockTime;
        use bitcoin::transaction::Version;
        use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, TxIn, TxOut, Witness};

        let tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::from_slice(&[vec![0x30; 71], vec![0x02; 33]]),
            }],
            output: vec![TxOut {
                value: Amount::from_sat(50_000),
                script_pubkey: ScriptBuf::from_bytes(vec![0x00; 22]),
            }],
        };
        let raw = bitcoin::consensus::encode::serialize(&tx);

        let size = TxSize::measure(&raw).unwrap();
        assert_eq!(size.total, raw.len() as u64);
        assert_eq!(size.weight(), tx.weight().to_wu());
    }

    #[test]
    fn test_measure_rejects_garbage() {
        assert!(matches!(
            TxSize::measure(&[1, 0, 0]),
            Err(TxError::MalformedTransaction(_))
        ));

        let mut raw = sample_tx(&[(107, vec![])], &[25]);
        raw.push(0);
        assert!(matches!(
            TxSize::measure(&raw),
            Err(TxError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_vsize_rounds_half_up() {
        let size = TxSize {
            total: 102,
            stripped: 100,
        };
        assert_eq!(size.weight(), 402);
        assert_eq!(size.vsize(), 101);

        let size = TxSize {
            total: 101,
            stripped: 100,
        };
        assert_eq!(size.weight(), 401);
        assert_eq!(size.vsize(), 100);
    }

    #[test]
    fn test_fee_rate_conversion_truncates() {
        let rate = FeeRate::new(ScaledValue::parse("0.00012345").unwrap(), FeeRateUnit::BtcPerKvb)
            .unwrap();
        assert_eq!(rate.sat_per_vbyte().unwrap(), 12);

        let rate = FeeRate::new(ScaledValue::parse("0.0001").unwrap(), FeeRateUnit::BtcPerKvb)
            .unwrap();
        assert_eq!(rate.sat_per_vbyte().unwrap(), 10);

        let rate = FeeRate::new(ScaledValue::parse("3.9").unwrap(), FeeRateUnit::SatPerVb).unwrap();
        assert_eq!(rate.sat_per_vbyte().unwrap(), 3);
    }

    #[test]
    fn test_negative_fee_rate_is_rejected() {
        assert!(matches!(
            FeeRate::new(ScaledValue::parse("-1").unwrap(), FeeRateUnit::SatPerVb),
            Err(TxError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_fee_for_size_adds_padding() {
        assert_eq!(fee_for_size(10, 226, P2PKH_OUTPUT_SIZE).unwrap(), 2_600);
        assert!(fee_for_size(u64::MAX, 2, 0).is_err());
    }

    #[test]
    fn test_fee_rate_unit_parsing() {
        assert_eq!("btc_per_kvb".parse::<FeeRateUnit>(), Ok(FeeRateUnit::BtcPerKvb));
        assert_eq!(" SAT_PER_VB ".parse::<FeeRateUnit>(), Ok(FeeRateUnit::SatPerVb));
        assert!("sat".parse::<FeeRateUnit>().is_err());
        assert_eq!(FeeRateUnit::SatPerVb.to_string(), "sat_per_vb");
    }
}
