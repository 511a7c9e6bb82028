// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bitcoin Core JSON-RPC adapter.
//!
//! Implements [`UtxoNode`] over HTTP. The RPC method used for each node
//! capability comes from a [`CommandRegistry`] fixed at construction, so
//! forks with renamed or missing methods get their own registry rather than
//! a code change.
//!
//! Amounts are read from the raw JSON text and written back as decimal
//! strings; no value ever passes through a float.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, value::RawValue, Map, Value};
use url::Url;

use crate::amount::ScaledValue;
use crate::node::{
    NodeError, NodeResult, PrevOutput, SignedTransaction, SpendableOutput, TxInputRef, TxOutput,
    UnindexedOutput, UtxoNode,
};

/// Node capabilities that map to one RPC method each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    AddressInfo,
    ListUnspent,
    ScanUtxoSet,
    CreateRawTransaction,
    SignWithKeys,
    SendRawTransaction,
    EstimateFee,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AddressInfo => "address-info",
            Self::ListUnspent => "list-unspent",
            Self::ScanUtxoSet => "scan-utxo-set",
            Self::CreateRawTransaction => "create-raw-tx",
            Self::SignWithKeys => "sign-with-keys",
            Self::SendRawTransaction => "broadcast",
            Self::EstimateFee => "estimate-fee-rate",
        })
    }
}

/// Command to RPC method name table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandRegistry {
    methods: HashMap<Command, String>,
}

impl CommandRegistry {
    /// Method names of Bitcoin Core 0.17 and later.
    pub fn bitcoin_core() -> Self {
        Self::default()
            .register(Command::AddressInfo, "getaddressinfo")
            .register(Command::ListUnspent, "listunspent")
            .register(Command::ScanUtxoSet, "scantxoutset")
            .register(Command::CreateRawTransaction, "createrawtransaction")
            .register(Command::SignWithKeys, "signrawtransactionwithkey")
            .register(Command::SendRawTransaction, "sendrawtransaction")
            .register(Command::EstimateFee, "estimatesmartfee")
    }

    /// Add or replace the method for `command`.
    pub fn register(mut self, command: Command, method: impl Into<String>) -> Self {
        self.methods.insert(command, method.into());
        self
    }

    pub fn method(&self, command: Command) -> NodeResult<&str> {
        self.methods
            .get(&command)
            .map(String::as_str)
            .ok_or_else(|| NodeError::UnsupportedCommand(command.to_string()))
    }
}

/// JSON-RPC client for a Bitcoin Core compatible node.
pub struct BitcoindRpc {
    http: reqwest::Client,
    url: Url,
    auth: Option<(String, String)>,
    commands: CommandRegistry,
    next_id: AtomicU64,
}

impl BitcoindRpc {
    pub fn new(rpc_url: &str, commands: CommandRegistry) -> NodeResult<Self> {
        let url = Url::parse(rpc_url)
            .map_err(|e| NodeError::Transport(format!("Invalid RPC URL {rpc_url:?}: {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            url,
            auth: None,
            commands,
            next_id: AtomicU64::new(1),
        })
    }

    /// HTTP basic credentials (`rpcuser` / `rpcpassword`).
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((user.into(), password.into()));
        self
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    async fn call<T: DeserializeOwned>(&self, command: Command, params: Value) -> NodeResult<T> {
        let method = self.commands.method(command)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "1.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut request = self.http.post(self.url.clone()).json(&payload);
        if let Some((user, password)) = &self.auth {
            request = request.basic_auth(user, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| NodeError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NodeError::Transport(e.to_string()))?;

        tracing::debug!(method, id, status = %status, "bitcoind RPC response");
        // bitcoind reports RPC errors with a non-2xx status and a JSON body
        decode_response(&body).map_err(|e| match e {
            NodeError::InvalidResponse(_) if !status.is_success() => {
                NodeError::Transport(format!("HTTP {status}: {body}"))
            }
            other => other,
        })
    }
}

impl UtxoNode for BitcoindRpc {
    async fn is_indexed(&self, address: &str) -> NodeResult<bool> {
        let info: AddressInfo = self.call(Command::AddressInfo, json!([address])).await?;
        Ok(info.ismine || info.iswatchonly)
    }

    async fn list_unspent(
        &self,
        addresses: &[String],
        min_confirmations: u32,
        max_confirmations: u32,
    ) -> NodeResult<Vec<SpendableOutput>> {
        let entries: Vec<UnspentEntry> = self
            .call(
                Command::ListUnspent,
                json!([min_confirmations, max_confirmations, addresses]),
            )
            .await?;
        Ok(entries.into_iter().map(SpendableOutput::from).collect())
    }

    async fn scan_unindexed(&self, addresses: &[String]) -> NodeResult<Vec<UnindexedOutput>> {
        let descriptors: Vec<String> = addresses.iter().map(|a| format!("addr({a})")).collect();
        let scan: ScanResult = self
            .call(Command::ScanUtxoSet, json!(["start", descriptors]))
            .await?;
        if !scan.success {
            return Err(NodeError::InvalidResponse(
                "UTXO set scan did not complete".to_string(),
            ));
        }
        Ok(scan.unspents.into_iter().map(UnindexedOutput::from).collect())
    }

    async fn create_raw_transaction(
        &self,
        inputs: &[TxInputRef],
        outputs: &[TxOutput],
    ) -> NodeResult<Vec<u8>> {
        let hex: String = self
            .call(Command::CreateRawTransaction, create_params(inputs, outputs))
            .await?;
        decode_hex(&hex)
    }

    async fn sign_with_keys(
        &self,
        raw: &[u8],
        prevouts: &[PrevOutput],
        private_keys: &[String],
    ) -> NodeResult<SignedTransaction> {
        let result: SignResult = self
            .call(Command::SignWithKeys, sign_params(raw, prevouts, private_keys))
            .await?;
        Ok(SignedTransaction {
            raw: decode_hex(&result.hex)?,
            complete: result.complete,
            errors: result
                .errors
                .into_iter()
                .map(|e| format!("{}:{} {}", e.txid, e.vout, e.error))
                .collect(),
        })
    }

    async fn broadcast(&self, signed: &[u8]) -> NodeResult<String> {
        self.call(
            Command::SendRawTransaction,
            json!([alloy::hex::encode(signed)]),
        )
        .await
    }

    async fn estimate_fee_rate(&self, target_blocks: u32) -> NodeResult<ScaledValue> {
        let estimate: FeeEstimate = self
            .call(Command::EstimateFee, json!([target_blocks]))
            .await?;
        estimate.feerate.ok_or_else(|| {
            NodeError::InvalidResponse(format!(
                "no fee estimate for {target_blocks} blocks: {}",
                estimate.errors.join("; ")
            ))
        })
    }
}

// =============================================================================
// Wire Format
// =============================================================================

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

fn decode_response<T: DeserializeOwned>(body: &str) -> NodeResult<T> {
    let response: RpcResponse<T> = serde_json::from_str(body)
        .map_err(|e| NodeError::InvalidResponse(format!("{e}: {body}")))?;
    if let Some(error) = response.error {
        return Err(NodeError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    response
        .result
        .ok_or_else(|| NodeError::InvalidResponse("null result".to_string()))
}

/// Parse a JSON number from its source text so no digits are lost.
fn exact_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ScaledValue, D::Error> {
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    ScaledValue::parse(raw.get().trim_matches('"')).map_err(serde::de::Error::custom)
}

fn optional_exact_amount<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ScaledValue>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "exact_amount")] ScaledValue);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(v)| v))
}

#[derive(Debug, Deserialize)]
struct AddressInfo {
    #[serde(default)]
    ismine: bool,
    #[serde(default)]
    iswatchonly: bool,
}

#[derive(Debug, Deserialize)]
struct UnspentEntry {
    txid: String,
    vout: u32,
    address: String,
    #[serde(deserialize_with = "exact_amount")]
    amount: ScaledValue,
    #[serde(rename = "scriptPubKey")]
    script_pub_key: String,
    #[serde(rename = "redeemScript", default)]
    redeem_script: Option<String>,
}

impl From<UnspentEntry> for SpendableOutput {
    fn from(entry: UnspentEntry) -> Self {
        Self {
            txid: entry.txid,
            vout: entry.vout,
            address: entry.address,
            amount: entry.amount,
            script_pub_key: entry.script_pub_key,
            redeem_script: entry.redeem_script,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScanResult {
    success: bool,
    #[serde(default)]
    unspents: Vec<ScanEntry>,
}

#[derive(Debug, Deserialize)]
struct ScanEntry {
    txid: String,
    vout: u32,
    #[serde(rename = "scriptPubKey")]
    script_pub_key: String,
    desc: String,
    #[serde(deserialize_with = "exact_amount")]
    amount: ScaledValue,
}

impl From<ScanEntry> for UnindexedOutput {
    fn from(entry: ScanEntry) -> Self {
        Self {
            txid: entry.txid,
            vout: entry.vout,
            amount: entry.amount,
            script_pub_key: entry.script_pub_key,
            descriptor: entry.desc,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignResult {
    hex: String,
    complete: bool,
    #[serde(default)]
    errors: Vec<SignError>,
}

#[derive(Debug, Deserialize)]
struct SignError {
    txid: String,
    vout: u32,
    error: String,
}

#[derive(Debug, Deserialize)]
struct FeeEstimate {
    #[serde(default, deserialize_with = "optional_exact_amount")]
    feerate: Option<ScaledValue>,
    #[serde(default)]
    errors: Vec<String>,
}

/// Inputs as `{txid, vout}` objects; outputs as single-key objects so
/// their order survives.
fn create_params(inputs: &[TxInputRef], outputs: &[TxOutput]) -> Value {
    let inputs: Vec<Value> = inputs
        .iter()
        .map(|i| json!({ "txid": i.txid, "vout": i.vout }))
        .collect();
    let outputs: Vec<Value> = outputs
        .iter()
        .map(|o| {
            let mut output = Map::new();
            output.insert(o.address.clone(), Value::String(o.amount.to_string()));
            Value::Object(output)
        })
        .collect();
    json!([inputs, outputs])
}

fn sign_params(raw: &[u8], prevouts: &[PrevOutput], private_keys: &[String]) -> Value {
    let prevtxs: Vec<Value> = prevouts
        .iter()
        .map(|p| {
            let mut prevtx = json!({
                "txid": p.txid,
                "vout": p.vout,
                "scriptPubKey": p.script_pub_key,
                "amount": p.amount.to_string(),
            });
            if let Some(redeem_script) = &p.redeem_script {
                prevtx["redeemScript"] = json!(redeem_script);
            }
            prevtx
        })
        .collect();
    json!([alloy::hex::encode(raw), private_keys, prevtxs])
}

fn decode_hex(hex: &str) -> NodeResult<Vec<u8>> {
    alloy::hex::decode(hex).map_err(|e| NodeError::InvalidResponse(format!("bad hex: {e}")))
}
