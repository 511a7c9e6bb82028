// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory nodes for builder tests.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy::primitives::keccak256;

use crate::amount::ScaledValue;
use crate::fee::utxo::tests::sample_tx;
use crate::node::{
    AccountNode, GasSuggestion, NodeError, NodeResult, PrevOutput, SignedTransaction,
    SpendableOutput, TxInputRef, TxOutput, UnindexedOutput, UtxoNode,
};

/// UTXO node that records every call.
///
/// Unsigned transactions are encoded as `[input_count, output_count]`; the
/// signer expands them to legacy P2PKH-shaped transactions (107-byte
/// scriptSig, 25-byte scriptPubKey) so their size is predictable.
#[derive(Default)]
pub(crate) struct MockUtxoNode {
    indexed: HashMap<String, Vec<SpendableOutput>>,
    unindexed: Vec<UnindexedOutput>,
    fee_estimate: Option<ScaledValue>,
    incomplete_signatures: bool,
    calls: Mutex<Vec<String>>,
    created: Mutex<Vec<Vec<TxOutput>>>,
    broadcasts: Mutex<Vec<Vec<u8>>>,
}

impl MockUtxoNode {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_indexed(mut self, address: &str, outputs: Vec<SpendableOutput>) -> Self {
        self.indexed.insert(address.to_string(), outputs);
        self
    }

    pub(crate) fn with_unindexed(mut self, outputs: Vec<UnindexedOutput>) -> Self {
        self.unindexed = outputs;
        self
    }

    pub(crate) fn with_fee_estimate(mut self, rate: &str) -> Self {
        self.fee_estimate = Some(ScaledValue::parse(rate).unwrap());
        self
    }

    pub(crate) fn with_incomplete_signatures(mut self) -> Self {
        self.incomplete_signatures = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn created_outputs(&self) -> Vec<Vec<TxOutput>> {
        self.created.lock().unwrap().clone()
    }

    pub(crate) fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.broadcasts.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl UtxoNode for MockUtxoNode {
    async fn is_indexed(&self, address: &str) -> NodeResult<bool> {
        self.record(format!("is_indexed {address}"));
        Ok(self.indexed.contains_key(address))
    }

    async fn list_unspent(
        &self,
        addresses: &[String],
        _min_confirmations: u32,
        _max_confirmations: u32,
    ) -> NodeResult<Vec<SpendableOutput>> {
        self.record(format!("list_unspent {}", addresses.join(",")));
        Ok(addresses
            .iter()
            .filter_map(|a| self.indexed.get(a))
            .flatten()
            .cloned()
            .collect())
    }

    async fn scan_unindexed(&self, addresses: &[String]) -> NodeResult<Vec<UnindexedOutput>> {
        self.record(format!("scan_unindexed {}", addresses.join(",")));
        Ok(self.unindexed.clone())
    }

    async fn create_raw_transaction(
        &self,
        inputs: &[TxInputRef],
        outputs: &[TxOutput],
    ) -> NodeResult<Vec<u8>> {
        self.record(format!("create {}x{}", inputs.len(), outputs.len()));
        self.created.lock().unwrap().push(outputs.to_vec());
        Ok(vec![inputs.len() as u8, outputs.len() as u8])
    }

    async fn sign_with_keys(
        &self,
        raw: &[u8],
        prevouts: &[PrevOutput],
        private_keys: &[String],
    ) -> NodeResult<SignedTransaction> {
        self.record(format!("sign {} keys={}", prevouts.len(), private_keys.len()));
        let [inputs, outputs] = raw else {
            return Err(NodeError::InvalidResponse("unexpected raw tx".to_string()));
        };
        let signed = sample_tx(
            &vec![(107, vec![]); usize::from(*inputs)],
            &vec![25; usize::from(*outputs)],
        );
        Ok(SignedTransaction {
            raw: signed,
            complete: !self.incomplete_signatures,
            errors: if self.incomplete_signatures {
                vec!["Unable to sign input, invalid stack size".to_string()]
            } else {
                Vec::new()
            },
        })
    }

    async fn broadcast(&self, signed: &[u8]) -> NodeResult<String> {
        let mut broadcasts = self.broadcasts.lock().unwrap();
        broadcasts.push(signed.to_vec());
        Ok(format!("mock-txid-{}", broadcasts.len()))
    }

    async fn estimate_fee_rate(&self, target_blocks: u32) -> NodeResult<ScaledValue> {
        self.record(format!("estimate_fee_rate {target_blocks}"));
        self.fee_estimate.ok_or(NodeError::Rpc {
            code: -32603,
            message: "Insufficient data or no feerate found".to_string(),
        })
    }
}

/// Account node that records every call.
pub(crate) struct MockAccountNode {
    pub(crate) nonce: u64,
    pub(crate) code: HashMap<String, Vec<u8>>,
    pub(crate) suggestion: GasSuggestion,
    pub(crate) reject_broadcast: bool,
    calls: Mutex<Vec<String>>,
    broadcasts: Mutex<Vec<Vec<u8>>>,
}

impl MockAccountNode {
    pub(crate) fn new() -> Self {
        Self {
            nonce: 7,
            code: HashMap::new(),
            suggestion: GasSuggestion {
                gas_price: 30_000_000_000,
                tip_cap: 1_500_000_000,
            },
            reject_broadcast: false,
            calls: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_contract(mut self, address: &str) -> Self {
        self.code
            .insert(address.to_lowercase(), vec![0x60, 0x80, 0x60, 0x40]);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn broadcasts(&self) -> Vec<Vec<u8>> {
        self.broadcasts.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AccountNode for MockAccountNode {
    async fn get_nonce(&self, address: &str) -> NodeResult<u64> {
        self.record(format!("get_nonce {address}"));
        Ok(self.nonce)
    }

    async fn get_code(&self, address: &str) -> NodeResult<Vec<u8>> {
        self.record(format!("get_code {address}"));
        Ok(self
            .code
            .get(&address.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn suggest_gas_price(&self) -> NodeResult<GasSuggestion> {
        self.record("suggest_gas_price".to_string());
        Ok(self.suggestion)
    }

    async fn broadcast(&self, signed: &[u8]) -> NodeResult<String> {
        self.record("broadcast".to_string());
        if self.reject_broadcast {
            return Err(NodeError::Rpc {
                code: -32000,
                message: "nonce too low".to_string(),
            });
        }
        self.broadcasts.lock().unwrap().push(signed.to_vec());
        Ok(format!("{:?}", keccak256(signed)))
    }
}
