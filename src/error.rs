// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy for transaction builds.
//!
//! Every phase fails fast: nothing is broadcast until the last phase, so an
//! error never leaves partial state behind. Nothing is retried here; a retry
//! of a signed transaction that may already be in flight risks a double spend
//! and is the caller's decision.

use crate::amount::DecimalError;
use crate::node::NodeError;

#[derive(Debug, thiserror::Error)]
pub enum TxError {
    /// Malformed numeral or arithmetic that cannot be represented exactly.
    #[error("Decimal error: {0}")]
    Decimal(#[from] DecimalError),

    #[error("Insufficient funds: inputs total {available}, destinations total {required}")]
    InsufficientFunds { available: String, required: String },

    #[error("Insufficient funds after fee: {leftover_sat} sat left over, fee is {fee_sat} sat")]
    InsufficientFundsAfterFee { leftover_sat: u64, fee_sat: u64 },

    #[error("Fee cap {fee_cap} is below {floor}")]
    InsufficientFeeCap { fee_cap: String, floor: String },

    #[error("Malformed output descriptor: {0:?}")]
    MalformedDescriptor(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Signature error: {0}")]
    SignatureError(String),

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("Address {0} holds no contract code")]
    NotAContract(String),

    #[error("A {request} transfer cannot be built by the {builder} builder")]
    ChainModelMismatch {
        request: &'static str,
        builder: &'static str,
    },

    #[error("Node error: {0}")]
    Node(#[from] NodeError),
}

pub type TxResult<T> = Result<T, TxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_context() {
        let err = TxError::InsufficientFundsAfterFee {
            leftover_sat: 1_000,
            fee_sat: 2_600,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds after fee: 1000 sat left over, fee is 2600 sat"
        );

        let err = TxError::InsufficientFunds {
            available: "0.5".to_string(),
            required: "1".to_string(),
        };
        assert!(err.to_string().contains("0.5"));
        assert!(err.to_string().contains("1"));
    }

    #[test]
    fn test_pass_through_conversions() {
        let err: TxError = DecimalError::DivisionByZero.into();
        assert!(matches!(err, TxError::Decimal(DecimalError::DivisionByZero)));

        let err: TxError = NodeError::Transport("connection refused".to_string()).into();
        assert_eq!(err.to_string(), "Node error: Transport error: connection refused");
    }
}
