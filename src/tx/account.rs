// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction building for account-model (EVM) chains.
//!
//! Produces a signed EIP-1559 transaction for either a native-currency
//! transfer or an ERC-20 `transfer` call, then submits it. Signing happens
//! locally; the node only supplies nonce, fee suggestions and contract code.

use std::fmt;
use std::str::FromStr;

use alloy::{
    consensus::{SignableTransaction, TxEip1559, TxEnvelope},
    eips::eip2718::Encodable2718,
    primitives::{Address, Signature, TxKind, U256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use serde::{Deserialize, Serialize};

use crate::amount::{to_smallest_integer, Chain, ScaledValue};
use crate::blockchain::{erc20::transfer_payload, signing::signer_from_key_material, NetworkConfig};
use crate::error::{TxError, TxResult};
use crate::node::AccountNode;

/// ERC-20 token parameters for a token transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub contract: String,
    pub decimals: u8,
}

/// EIP-1559 fee parameters, in wei per gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip1559Fees {
    pub tip_cap: u128,
    pub fee_cap: u128,
}

/// Caller-owned description of one account-model transfer.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountTransferRequest {
    /// Hex (optionally `0x`-prefixed) or PEM.
    pub private_key: String,
    pub to: String,
    /// Display units of the native currency, or of the token when `token` is set.
    pub amount: String,
    #[serde(default)]
    pub token: Option<TokenTransfer>,
    pub gas_limit: u64,
    /// Suggested by the node when absent.
    #[serde(default)]
    pub fees: Option<Eip1559Fees>,
    /// Pending nonce of the sender when absent.
    #[serde(default)]
    pub nonce: Option<u64>,
}

impl fmt::Debug for AccountTransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountTransferRequest")
            .field("private_key", &"<redacted>")
            .field("to", &self.to)
            .field("amount", &self.amount)
            .field("token", &self.token)
            .field("gas_limit", &self.gas_limit)
            .field("fees", &self.fees)
            .field("nonce", &self.nonce)
            .finish()
    }
}

/// A signed transaction ready for submission.
#[derive(Debug, Clone)]
pub struct SignedAccountTx {
    pub from: Address,
    pub tx: TxEip1559,
    pub signature: Signature,
    /// EIP-2718 envelope bytes.
    pub raw: Vec<u8>,
    /// `0x`-prefixed hash computed locally from `raw`.
    pub tx_hash: String,
}

/// Recipient, value and calldata of the transaction.
struct Call {
    to: Address,
    value: U256,
    input: Vec<u8>,
}

/// Builds, signs and submits EIP-1559 transfers through an [`AccountNode`].
pub struct AccountTxBuilder<N> {
    node: N,
    network: NetworkConfig,
}

impl<N: AccountNode> AccountTxBuilder<N> {
    pub fn new(node: N, network: NetworkConfig) -> Self {
        Self { node, network }
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Build, sign and submit. Returns the locally computed transaction hash.
    pub async fn send(&self, request: &AccountTransferRequest) -> TxResult<String> {
        let signed = self.build(request).await?;
        let reported = self.node.broadcast(&signed.raw).await?;

        if !reported.eq_ignore_ascii_case(&signed.tx_hash) {
            tracing::warn!(
                local = %signed.tx_hash,
                reported = %reported,
                "Node reported a different transaction id"
            );
        }
        tracing::info!(
            tx_hash = %signed.tx_hash,
            network = self.network.name,
            nonce = signed.tx.nonce,
            explorer = %self.network.explorer_tx_url(&signed.tx_hash),
            "EIP-1559 transaction submitted"
        );
        Ok(signed.tx_hash)
    }

    /// Everything short of submitting.
    pub async fn build(&self, request: &AccountTransferRequest) -> TxResult<SignedAccountTx> {
        let signer = signer_from_key_material(&request.private_key)?;
        let from = signer.address();

        let call = self.prepare_call(request).await?;

        let nonce = match request.nonce {
            Some(nonce) => nonce,
            None => self.node.get_nonce(&from.to_checksum(None)).await?,
        };
        let fees = match request.fees {
            Some(fees) => fees,
            None => {
                let suggestion = self.node.suggest_gas_price().await?;
                Eip1559Fees {
                    tip_cap: suggestion.tip_cap,
                    fee_cap: suggestion.gas_price,
                }
            }
        };
        if fees.tip_cap > fees.fee_cap {
            return Err(TxError::InsufficientFeeCap {
                fee_cap: fees.fee_cap.to_string(),
                floor: format!("tip cap {}", fees.tip_cap),
            });
        }

        let tx = TxEip1559 {
            chain_id: self.network.chain_id,
            nonce,
            gas_limit: request.gas_limit,
            max_fee_per_gas: fees.fee_cap,
            max_priority_fee_per_gas: fees.tip_cap,
            to: TxKind::Call(call.to),
            value: call.value,
            access_list: Default::default(),
            input: call.input.into(),
        };

        tracing::debug!(
            from = %from,
            to = %call.to,
            nonce,
            gas_limit = request.gas_limit,
            max_fee_per_gas = fees.fee_cap,
            max_priority_fee_per_gas = fees.tip_cap,
            chain_id = self.network.chain_id,
            "Signing EIP-1559 transaction"
        );
        sign(tx, &signer)
    }

    /// Native transfers pay `to` directly; token transfers call the contract
    /// with zero value.
    async fn prepare_call(&self, request: &AccountTransferRequest) -> TxResult<Call> {
        let to = parse_address(&request.to)?;

        match &request.token {
            None => Ok(Call {
                to,
                value: smallest_amount(&request.amount, Chain::Ethereum.decimal_places())?,
                input: Vec::new(),
            }),
            Some(token) => {
                let contract = parse_address(&token.contract)?;
                let amount = smallest_amount(&request.amount, token.decimals)?;

                let code = self.node.get_code(&contract.to_checksum(None)).await?;
                if code.is_empty() {
                    return Err(TxError::NotAContract(contract.to_checksum(None)));
                }
                Ok(Call {
                    to: contract,
                    value: U256::ZERO,
                    input: transfer_payload(to, amount),
                })
            }
        }
    }
}

fn sign(tx: TxEip1559, signer: &PrivateKeySigner) -> TxResult<SignedAccountTx> {
    let signature = signer
        .sign_hash_sync(&tx.signature_hash())
        .map_err(|e| TxError::SignatureError(e.to_string()))?;

    let envelope = TxEnvelope::from(tx.clone().into_signed(signature));
    let raw = envelope.encoded_2718();
    let tx_hash = format!("{:?}", envelope.tx_hash());

    Ok(SignedAccountTx {
        from: signer.address(),
        tx,
        signature,
        raw,
        tx_hash,
    })
}

fn parse_address(address: &str) -> TxResult<Address> {
    Address::from_str(address.trim())
        .map_err(|e| TxError::InvalidAddress(format!("{address:?}: {e}")))
}

/// Display-unit string to an exact integer of smallest units.
fn smallest_amount(amount: &str, decimals: u8) -> TxResult<U256> {
    let display = ScaledValue::parse(amount)
        .map_err(|e| TxError::InvalidAmount(format!("{amount:?}: {e}")))?;
    to_smallest_integer(&display, decimals)
        .map_err(|e| TxError::InvalidAmount(format!("{amount:?}: {e}")))?
        .ok_or_else(|| {
            TxError::InvalidAmount(format!(
                "{amount:?} is negative or has more than {decimals} decimal places"
            ))
        })
}
