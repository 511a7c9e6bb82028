// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM node adapter over an alloy provider.

use std::str::FromStr;

use alloy::{
    primitives::Address,
    providers::{Provider, RootProvider},
    transports::TransportError,
};

use crate::node::{AccountNode, GasSuggestion, NodeError, NodeResult};

/// [`AccountNode`] backed by any alloy [`Provider`].
pub struct EvmNode<P> {
    provider: P,
}

impl EvmNode<RootProvider> {
    /// Plain HTTP provider without fillers; the builder fills every field.
    pub fn connect_http(rpc_url: &str) -> NodeResult<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| NodeError::Transport(format!("Invalid RPC URL: {e}")))?;
        Ok(Self::new(RootProvider::new_http(url)))
    }
}

impl<P: Provider> EvmNode<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> AccountNode for EvmNode<P> {
    async fn get_nonce(&self, address: &str) -> NodeResult<u64> {
        self.provider
            .get_transaction_count(parse_address(address)?)
            .pending()
            .await
            .map_err(node_error)
    }

    async fn get_code(&self, address: &str) -> NodeResult<Vec<u8>> {
        let code = self
            .provider
            .get_code_at(parse_address(address)?)
            .await
            .map_err(node_error)?;
        Ok(code.to_vec())
    }

    async fn suggest_gas_price(&self) -> NodeResult<GasSuggestion> {
        let gas_price = self.provider.get_gas_price().await.map_err(node_error)?;
        let tip_cap = self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .map_err(node_error)?;
        Ok(GasSuggestion { gas_price, tip_cap })
    }

    async fn broadcast(&self, signed: &[u8]) -> NodeResult<String> {
        let pending = self
            .provider
            .send_raw_transaction(signed)
            .await
            .map_err(node_error)?;
        Ok(format!("{:?}", pending.tx_hash()))
    }
}

fn parse_address(address: &str) -> NodeResult<Address> {
    Address::from_str(address)
        .map_err(|e| NodeError::InvalidResponse(format!("Invalid address {address:?}: {e}")))
}

/// JSON-RPC error responses keep their code; everything else is transport.
fn node_error(err: TransportError) -> NodeError {
    match err.as_error_resp() {
        Some(payload) => NodeError::Rpc {
            code: payload.code,
            message: payload.message.to_string(),
        },
        None => NodeError::Transport(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_http_validates_url() {
        assert!(EvmNode::connect_http("https://api.avax-test.network/ext/bc/C/rpc").is_ok());
        assert!(matches!(
            EvmNode::connect_http("::not a url::"),
            Err(NodeError::Transport(_))
        ));
    }

    #[test]
    fn test_parse_address() {
        assert!(parse_address("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").is_ok());
        assert!(parse_address("0x7099").is_err());
    }
}
