// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account-model network parameters.

/// EVM network configuration. `chain_id` is the EIP-155 replay-protection
/// domain every signature is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

impl NetworkConfig {
    /// Explorer link for a transaction hash.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}

pub const ETHEREUM_MAINNET: NetworkConfig = NetworkConfig {
    name: "Ethereum Mainnet",
    chain_id: 1,
    explorer_url: "https://etherscan.io",
};

pub const ETHEREUM_SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Ethereum Sepolia",
    chain_id: 11_155_111,
    explorer_url: "https://sepolia.etherscan.io",
};

/// Avalanche C-Chain Mainnet configuration.
pub const AVAX_MAINNET: NetworkConfig = NetworkConfig {
    name: "Avalanche C-Chain",
    chain_id: 43114,
    explorer_url: "https://snowtrace.io",
};

/// Avalanche Fuji Testnet configuration.
pub const AVAX_FUJI: NetworkConfig = NetworkConfig {
    name: "Avalanche Fuji Testnet",
    chain_id: 43113,
    explorer_url: "https://testnet.snowtrace.io",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explorer_tx_url() {
        assert_eq!(
            AVAX_FUJI.explorer_tx_url("0xabc"),
            "https://testnet.snowtrace.io/tx/0xabc"
        );
        assert_eq!(ETHEREUM_MAINNET.chain_id, 1);
    }
}
