// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # ChainNode Capabilities
//!
//! The transaction builders never talk to the network themselves. They
//! compose calls to the capability traits defined here and interpret the
//! results. Adapters for concrete node software live in [`crate::blockchain`].
//!
//! | Capability | UTXO model | Account model |
//! |------------|------------|---------------|
//! | wallet index membership | [`UtxoNode::is_indexed`] | - |
//! | list-unspent | [`UtxoNode::list_unspent`] | - |
//! | scan-unindexed | [`UtxoNode::scan_unindexed`] | - |
//! | create-raw-tx | [`UtxoNode::create_raw_transaction`] | - |
//! | sign-with-keys | [`UtxoNode::sign_with_keys`] | local signer |
//! | broadcast | [`UtxoNode::broadcast`] | [`AccountNode::broadcast`] |
//! | estimate-fee-rate | [`UtxoNode::estimate_fee_rate`] | - |
//! | suggest-gas-price | - | [`AccountNode::suggest_gas_price`] |
//! | get-nonce | - | [`AccountNode::get_nonce`] |
//! | get-code | - | [`AccountNode::get_code`] |
//!
//! Every call may block on the network; callers wrap builds in their own
//! timeouts. Errors are passed through unchanged as [`NodeError`].

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::amount::ScaledValue;

/// Failures surfaced by a chain node or its transport.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid node response: {0}")]
    InvalidResponse(String),

    #[error("No RPC method registered for {0}")]
    UnsupportedCommand(String),
}

pub type NodeResult<T> = Result<T, NodeError>;

// =============================================================================
// UTXO Model
// =============================================================================

/// An unspent output tracked by the node's own wallet index.
///
/// `amount` is in the chain's display unit, exactly as the node reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendableOutput {
    pub txid: String,
    pub vout: u32,
    pub address: String,
    pub amount: ScaledValue,
    pub script_pub_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeem_script: Option<String>,
}

/// An unspent output found by scanning the UTXO set for an address the
/// node does not index. The owning address is only available through the
/// output descriptor, e.g. `addr(bc1q...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnindexedOutput {
    pub txid: String,
    pub vout: u32,
    pub amount: ScaledValue,
    pub script_pub_key: String,
    pub descriptor: String,
}

/// Reference to a prior output used as a transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInputRef {
    pub txid: String,
    pub vout: u32,
}

/// A `(destination, value)` pair. `amount` is in display units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: String,
    pub amount: ScaledValue,
}

/// Per-input script information the signer needs for inputs it cannot
/// look up in its own wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrevOutput {
    pub txid: String,
    pub vout: u32,
    pub script_pub_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeem_script: Option<String>,
    pub amount: ScaledValue,
}

/// Result of a sign-with-keys call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Serialized transaction, signatures included.
    pub raw: Vec<u8>,
    /// Whether every input carries a valid signature.
    pub complete: bool,
    /// Per-input script errors reported by the signer.
    pub errors: Vec<String>,
}

/// Node capabilities consumed by the UTXO transaction builder.
pub trait UtxoNode: Send + Sync {
    /// Whether the node's wallet indexes `address` (so `list_unspent` sees it).
    fn is_indexed(&self, address: &str) -> impl Future<Output = NodeResult<bool>> + Send;

    fn list_unspent(
        &self,
        addresses: &[String],
        min_confirmations: u32,
        max_confirmations: u32,
    ) -> impl Future<Output = NodeResult<Vec<SpendableOutput>>> + Send;

    fn scan_unindexed(
        &self,
        addresses: &[String],
    ) -> impl Future<Output = NodeResult<Vec<UnindexedOutput>>> + Send;

    /// Build an unsigned transaction. Output order is preserved.
    fn create_raw_transaction(
        &self,
        inputs: &[TxInputRef],
        outputs: &[TxOutput],
    ) -> impl Future<Output = NodeResult<Vec<u8>>> + Send;

    fn sign_with_keys(
        &self,
        raw: &[u8],
        prevouts: &[PrevOutput],
        private_keys: &[String],
    ) -> impl Future<Output = NodeResult<SignedTransaction>> + Send;

    /// Submit a signed transaction, returning the chain's transaction id.
    fn broadcast(&self, signed: &[u8]) -> impl Future<Output = NodeResult<String>> + Send;

    /// Fee rate in BTC per 1000 vbytes for confirmation within `target_blocks`.
    fn estimate_fee_rate(
        &self,
        target_blocks: u32,
    ) -> impl Future<Output = NodeResult<ScaledValue>> + Send;
}

// =============================================================================
// Account Model
// =============================================================================

/// Gas price suggestion, in wei per gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSuggestion {
    /// Suggested total price per gas (base fee plus tip).
    pub gas_price: u128,
    /// Suggested priority fee per gas.
    pub tip_cap: u128,
}

/// Node capabilities consumed by the account transaction builder.
pub trait AccountNode: Send + Sync {
    /// Next usable nonce for `address`, pending transactions included.
    fn get_nonce(&self, address: &str) -> impl Future<Output = NodeResult<u64>> + Send;

    /// Deployed bytecode at `address`; empty for externally owned accounts.
    fn get_code(&self, address: &str) -> impl Future<Output = NodeResult<Vec<u8>>> + Send;

    fn suggest_gas_price(&self) -> impl Future<Output = NodeResult<GasSuggestion>> + Send;

    /// Submit an EIP-2718 encoded signed transaction.
    fn broadcast(&self, signed: &[u8]) -> impl Future<Output = NodeResult<String>> + Send;
}
