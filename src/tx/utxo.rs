// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction building for UTXO-model chains.
//!
//! Spends every unspent output of a set of source addresses, pays the
//! requested destinations, and returns whatever is left (minus the fee) to
//! a single change address. Source addresses may be indexed by the node's
//! wallet or known only by their private key.
//!
//! ## Phases
//!
//! 1. **Discover** - split sources into indexed / unindexed, query
//!    list-unspent and scan-unindexed respectively.
//! 2. **Assemble** - inputs are all discovered outputs, outputs are the
//!    destinations; `leftover = inputs - destinations` must not be negative.
//! 3. **Measure** - sign the provisional transaction once only to learn its
//!    virtual size, then `fee = rate * (vsize + padding)`.
//! 4. **Change** - append `leftover - fee` to the change address, last.
//! 5. **Final sign** - re-sign the complete transaction with every key.
//! 6. **Broadcast** - only [`UtxoTxBuilder::send`] submits.
//!
//! The measure pass and the final pass are separate calls on purpose: the
//! fee depends on the signed size, and the final signatures depend on the
//! fee. Nothing reaches the network before phase 6.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::amount::{to_display_unit, to_smallest_integer, Chain, ScaledValue};
use crate::config::UtxoBuilderConfig;
use crate::error::{TxError, TxResult};
use crate::fee::{fee_for_size, FeeRate, FeeRateUnit, TxSize};
use crate::node::{PrevOutput, TxInputRef, TxOutput, UtxoNode};

/// A source of funds: an address and the key that controls it.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceKey {
    pub private_key: String,
    pub address: String,
}

impl fmt::Debug for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceKey")
            .field("private_key", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

/// Caller-owned description of one UTXO transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoTransferRequest {
    pub sources: Vec<SourceKey>,
    /// Receives everything left after destinations and fee.
    pub change_address: String,
    /// Amounts in display units (BTC).
    pub destinations: Vec<TxOutput>,
    /// In the builder's configured unit; estimated by the node when absent.
    #[serde(default)]
    pub fee_rate: Option<ScaledValue>,
}

/// A discovered output together with the address that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingInput {
    pub address: String,
    pub prevout: PrevOutput,
}

/// A fully signed transaction that has not been broadcast.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub inputs: Vec<FundingInput>,
    /// Destinations in request order, change last.
    pub outputs: Vec<TxOutput>,
    pub input_total_sat: u64,
    pub fee_sat: u64,
    pub change_sat: u64,
    /// Virtual size measured on the provisional (change-less) signing pass.
    pub measured_vsize: u64,
    pub signed: Vec<u8>,
}

/// Outcome of phase 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FeeQuote {
    measured_vsize: u64,
    leftover_sat: u64,
    fee_sat: u64,
    change_sat: u64,
}

/// Builds, signs and broadcasts UTXO transfers through a [`UtxoNode`].
pub struct UtxoTxBuilder<N> {
    node: N,
    config: UtxoBuilderConfig,
    decimals: u8,
}

impl<N: UtxoNode> UtxoTxBuilder<N> {
    pub fn new(node: N, config: UtxoBuilderConfig) -> Self {
        Self {
            node,
            config,
            decimals: Chain::Bitcoin.decimal_places(),
        }
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn config(&self) -> &UtxoBuilderConfig {
        &self.config
    }

    /// Build, sign and broadcast. Returns the chain's transaction id.
    pub async fn send(&self, request: &UtxoTransferRequest) -> TxResult<String> {
        let prepared = self.build(request).await?;
        let txid = self.node.broadcast(&prepared.signed).await?;

        tracing::info!(
            txid = %txid,
            inputs = prepared.inputs.len(),
            outputs = prepared.outputs.len(),
            fee_sat = prepared.fee_sat,
            change_sat = prepared.change_sat,
            "UTXO transaction broadcast"
        );
        Ok(txid)
    }

    /// Phases 1 to 5: everything short of broadcasting.
    pub async fn build(&self, request: &UtxoTransferRequest) -> TxResult<PreparedTransaction> {
        self.validate(request)?;
        let keys: Vec<String> = request
            .sources
            .iter()
            .map(|s| s.private_key.clone())
            .collect();

        let inputs = self.discover(&request.sources).await?;
        let input_total_sat = self.input_total_sat(&inputs)?;
        let (provisional, leftover) = self.assemble(&inputs, &request.destinations).await?;

        let rate = self.fee_rate(request.fee_rate).await?;
        let quote = self
            .measure_fee(&provisional, &inputs, &keys, &leftover, rate)
            .await?;

        let outputs = self.with_change(&request.destinations, &request.change_address, &quote)?;
        let unsigned = self
            .node
            .create_raw_transaction(&input_refs(&inputs), &outputs)
            .await?;
        let signed = self.sign(&unsigned, &inputs, &keys).await?;

        Ok(PreparedTransaction {
            input_total_sat,
            inputs,
            outputs,
            fee_sat: quote.fee_sat,
            change_sat: quote.change_sat,
            measured_vsize: quote.measured_vsize,
            signed,
        })
    }

    /// Phase 1: every unspent output owned by the source addresses.
    async fn discover(&self, sources: &[SourceKey]) -> TxResult<Vec<FundingInput>> {
        let mut seen_addresses = HashSet::new();
        let mut indexed = Vec::new();
        let mut unindexed = Vec::new();
        for source in sources {
            if !seen_addresses.insert(source.address.as_str()) {
                continue;
            }
            if self.node.is_indexed(&source.address).await? {
                indexed.push(source.address.clone());
            } else {
                unindexed.push(source.address.clone());
            }
        }

        let mut inputs = Vec::new();
        if !indexed.is_empty() {
            let unspent = self
                .node
                .list_unspent(
                    &indexed,
                    self.config.min_confirmations,
                    self.config.max_confirmations,
                )
                .await?;
            for utxo in unspent {
                inputs.push(FundingInput {
                    address: utxo.address,
                    prevout: PrevOutput {
                        txid: utxo.txid,
                        vout: utxo.vout,
                        script_pub_key: utxo.script_pub_key,
                        redeem_script: utxo.redeem_script,
                        amount: utxo.amount,
                    },
                });
            }
        }
        if !unindexed.is_empty() {
            for utxo in self.node.scan_unindexed(&unindexed).await? {
                let address = descriptor_address(&utxo.descriptor)?.to_string();
                inputs.push(FundingInput {
                    address,
                    prevout: PrevOutput {
                        txid: utxo.txid,
                        vout: utxo.vout,
                        script_pub_key: utxo.script_pub_key,
                        redeem_script: None,
                        amount: utxo.amount,
                    },
                });
            }
        }

        let mut seen_outpoints = HashSet::new();
        inputs.retain(|input| {
            let fresh = seen_outpoints.insert((input.prevout.txid.clone(), input.prevout.vout));
            if !fresh {
                tracing::debug!(
                    txid = %input.prevout.txid,
                    vout = input.prevout.vout,
                    "Dropping duplicate outpoint"
                );
            }
            fresh
        });

        tracing::debug!(
            indexed = indexed.len(),
            unindexed = unindexed.len(),
            inputs = inputs.len(),
            "Discovered spendable outputs"
        );
        Ok(inputs)
    }

    /// Phase 2: provisional unsigned transaction and the value left over
    /// after destinations, in display units.
    async fn assemble(
        &self,
        inputs: &[FundingInput],
        destinations: &[TxOutput],
    ) -> TxResult<(Vec<u8>, ScaledValue)> {
        let input_total = sum(inputs.iter().map(|i| &i.prevout.amount))?;
        let destination_total = sum(destinations.iter().map(|d| &d.amount))?;

        let leftover = input_total.checked_sub(&destination_total)?;
        if leftover.is_negative() {
            return Err(TxError::InsufficientFunds {
                available: input_total.to_string(),
                required: destination_total.to_string(),
            });
        }

        let raw = self
            .node
            .create_raw_transaction(&input_refs(inputs), destinations)
            .await?;
        Ok((raw, leftover))
    }

    async fn fee_rate(&self, requested: Option<ScaledValue>) -> TxResult<FeeRate> {
        match requested {
            Some(rate) => FeeRate::new(rate, self.config.fee_rate_unit),
            None => {
                let rate = self
                    .node
                    .estimate_fee_rate(self.config.fee_target_blocks)
                    .await?;
                tracing::debug!(
                    rate = %rate,
                    target_blocks = self.config.fee_target_blocks,
                    "Using node fee estimate"
                );
                FeeRate::new(rate, FeeRateUnit::BtcPerKvb)
            }
        }
    }

    /// Phase 3: measure-pass signature, then the fee for the measured size.
    async fn measure_fee(
        &self,
        provisional: &[u8],
        inputs: &[FundingInput],
        keys: &[String],
        leftover: &ScaledValue,
        rate: FeeRate,
    ) -> TxResult<FeeQuote> {
        let measured = self.sign(provisional, inputs, keys).await?;
        let measured_vsize = TxSize::measure(&measured)?.vsize();

        let sat_per_vbyte = rate.sat_per_vbyte()?;
        let fee_sat = fee_for_size(sat_per_vbyte, measured_vsize, self.config.change_padding_bytes)?;
        let leftover_sat = self.to_satoshi(leftover)?;

        let change_sat = leftover_sat
            .checked_sub(fee_sat)
            .ok_or(TxError::InsufficientFundsAfterFee {
                leftover_sat,
                fee_sat,
            })?;

        tracing::debug!(
            measured_vsize,
            sat_per_vbyte,
            fee_sat,
            leftover_sat,
            change_sat,
            "Computed fee from measure pass"
        );
        Ok(FeeQuote {
            measured_vsize,
            leftover_sat,
            fee_sat,
            change_sat,
        })
    }

    /// Phase 4: destinations followed by the change output.
    fn with_change(
        &self,
        destinations: &[TxOutput],
        change_address: &str,
        quote: &FeeQuote,
    ) -> TxResult<Vec<TxOutput>> {
        let change = TxOutput {
            address: change_address.to_string(),
            amount: to_display_unit(&ScaledValue::from(quote.change_sat), self.decimals)?,
        };
        let mut outputs = destinations.to_vec();
        outputs.push(change);
        Ok(outputs)
    }

    /// Sign with every source key. Used by both the measure and final pass.
    async fn sign(
        &self,
        raw: &[u8],
        inputs: &[FundingInput],
        keys: &[String],
    ) -> TxResult<Vec<u8>> {
        let prevouts: Vec<PrevOutput> = inputs.iter().map(|i| i.prevout.clone()).collect();
        let signed = self.node.sign_with_keys(raw, &prevouts, keys).await?;
        if !signed.complete {
            return Err(TxError::SignatureError(format!(
                "signer left inputs unsigned: {}",
                signed.errors.join("; ")
            )));
        }
        Ok(signed.raw)
    }

    fn to_satoshi(&self, amount: &ScaledValue) -> TxResult<u64> {
        to_smallest_integer(amount, self.decimals)?
            .and_then(|sat| u64::try_from(sat).ok())
            .ok_or_else(|| {
                TxError::InvalidAmount(format!(
                    "{amount} is not a whole number of satoshi"
                ))
            })
    }

    /// Sum of the discovered input amounts, converted one by one.
    fn input_total_sat(&self, inputs: &[FundingInput]) -> TxResult<u64> {
        inputs.iter().try_fold(0u64, |total, input| {
            let sat = self.to_satoshi(&input.prevout.amount)?;
            total.checked_add(sat).ok_or_else(|| {
                TxError::InvalidAmount(format!("input total overflows at {}", input.prevout.txid))
            })
        })
    }

    fn validate(&self, request: &UtxoTransferRequest) -> TxResult<()> {
        if request.sources.is_empty() {
            return Err(TxError::InvalidAddress("no source addresses".to_string()));
        }
        if request.destinations.is_empty() {
            return Err(TxError::InvalidAddress("no destinations".to_string()));
        }
        if request.change_address.is_empty() {
            return Err(TxError::InvalidAddress("empty change address".to_string()));
        }
        for destination in &request.destinations {
            if destination.amount.is_negative() || destination.amount.is_zero() {
                return Err(TxError::InvalidAmount(format!(
                    "{} to {}",
                    destination.amount, destination.address
                )));
            }
            self.to_satoshi(&destination.amount)?;
        }
        Ok(())
    }
}

/// Owning address of a scan result descriptor such as `addr(bc1q...)#checksum`.
pub fn descriptor_address(descriptor: &str) -> TxResult<&str> {
    let malformed = || TxError::MalformedDescriptor(descriptor.to_string());

    let start = descriptor.find("addr(").ok_or_else(malformed)? + "addr(".len();
    let len = descriptor[start..].find(')').ok_or_else(malformed)?;
    if len == 0 {
        return Err(malformed());
    }
    Ok(&descriptor[start..start + len])
}

fn input_refs(inputs: &[FundingInput]) -> Vec<TxInputRef> {
    inputs
        .iter()
        .map(|i| TxInputRef {
            txid: i.prevout.txid.clone(),
            vout: i.prevout.vout,
        })
        .collect()
}

fn sum<'a>(mut values: impl Iterator<Item = &'a ScaledValue>) -> TxResult<ScaledValue> {
    values.try_fold(ScaledValue::ZERO, |acc, v| Ok::<_, TxError>(acc.checked_add(v)?))
}
