// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction builders.
//!
//! Chains follow one of two value models and each has its own builder:
//!
//! - [`UtxoTxBuilder`] - discrete unspent outputs, node-side signing
//! - [`AccountTxBuilder`] - balances and nonces, local EIP-1559 signing
//!
//! [`TransferBuilder`] dispatches a [`Transfer`] to whichever builder a chain
//! is configured with. The set of models is closed.

pub mod account;
pub mod utxo;

#[cfg(test)]
pub(crate) mod testing;

pub use account::{
    AccountTransferRequest, AccountTxBuilder, Eip1559Fees, SignedAccountTx, TokenTransfer,
};
pub use utxo::{
    descriptor_address, FundingInput, PreparedTransaction, SourceKey, UtxoTransferRequest,
    UtxoTxBuilder,
};

use serde::{Deserialize, Serialize};

use crate::error::{TxError, TxResult};
use crate::node::{AccountNode, UtxoNode};

/// A transfer request for either value model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Transfer {
    Utxo(UtxoTransferRequest),
    Account(AccountTransferRequest),
}

impl Transfer {
    pub fn model(&self) -> &'static str {
        match self {
            Self::Utxo(_) => "utxo",
            Self::Account(_) => "account",
        }
    }
}

/// The builder configured for one chain.
pub enum TransferBuilder<U, A> {
    Utxo(UtxoTxBuilder<U>),
    Account(AccountTxBuilder<A>),
}

impl<U: UtxoNode, A: AccountNode> TransferBuilder<U, A> {
    pub fn model(&self) -> &'static str {
        match self {
            Self::Utxo(_) => "utxo",
            Self::Account(_) => "account",
        }
    }

    /// Build, sign and broadcast, returning the transaction id.
    ///
    /// Fails with [`TxError::ChainModelMismatch`] when the request's model
    /// differs from the builder's.
    pub async fn send(&self, transfer: &Transfer) -> TxResult<String> {
        match (self, transfer) {
            (Self::Utxo(builder), Transfer::Utxo(request)) => builder.send(request).await,
            (Self::Account(builder), Transfer::Account(request)) => builder.send(request).await,
            (builder, request) => Err(TxError::ChainModelMismatch {
                request: request.model(),
                builder: builder.model(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ETHEREUM_SEPOLIA;
    use crate::config::UtxoBuilderConfig;
    use crate::node::TxOutput;
    use super::testing::{MockAccountNode, MockUtxoNode};

    fn utxo_transfer() -> Transfer {
        Transfer::Utxo(UtxoTransferRequest {
            sources: vec![SourceKey {
                private_key: "key".to_string(),
                address: "addr".to_string(),
            }],
            change_address: "change".to_string(),
            destinations: vec![TxOutput {
                address: "dest".to_string(),
                amount: "0.1".parse().unwrap(),
            }],
            fee_rate: None,
        })
    }

    #[tokio::test]
    async fn test_mismatched_model_is_rejected() {
        let builder: TransferBuilder<MockUtxoNode, MockAccountNode> =
            TransferBuilder::Account(AccountTxBuilder::new(MockAccountNode::new(), ETHEREUM_SEPOLIA));

        let err = builder.send(&utxo_transfer()).await.unwrap_err();
        assert!(matches!(
            err,
            TxError::ChainModelMismatch {
                request: "utxo",
                builder: "account"
            }
        ));
        if let TransferBuilder::Account(inner) = &builder {
            assert!(inner.node().calls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_matching_model_is_dispatched() {
        let builder: TransferBuilder<MockUtxoNode, MockAccountNode> = TransferBuilder::Utxo(
            UtxoTxBuilder::new(MockUtxoNode::new(), UtxoBuilderConfig::default()),
        );

        // no funds anywhere, so the UTXO builder itself rejects it
        let err = builder.send(&utxo_transfer()).await.unwrap_err();
        assert!(matches!(err, TxError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_transfer_is_tagged_by_model() {
        let json = serde_json::to_value(utxo_transfer()).unwrap();
        assert_eq!(json["model"], "utxo");
        assert_eq!(json["destinations"][0]["amount"], "0.1");
    }
}
