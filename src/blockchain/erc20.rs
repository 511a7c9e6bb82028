// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 call payloads.

use alloy::{
    primitives::{Address, U256},
    sol,
    sol_types::SolCall,
};

sol! {
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// Calldata for `transfer(to, amount)`: 4-byte selector followed by the
/// destination and amount, each left-padded to a 32-byte word.
pub fn transfer_payload(to: Address, amount: U256) -> Vec<u8> {
    IERC20::transferCall { to, amount }.abi_encode()
}
