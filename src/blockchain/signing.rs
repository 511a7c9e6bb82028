// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Private key loading for account-model signing.
//!
//! Custodial keys arrive either as raw hex (with or without `0x`) or as the
//! PEM documents the wallet service stores (SEC1 or PKCS#8). Both end up as
//! an alloy [`PrivateKeySigner`].

use alloy::signers::local::PrivateKeySigner;
use k256::SecretKey;

use crate::error::{TxError, TxResult};

/// Parse a private key from PEM format to hex string.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(TxError::SignatureError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> TxResult<String> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| TxError::SignatureError(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| TxError::SignatureError(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| TxError::SignatureError(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a hex-encoded private key.
pub fn signer_from_hex(private_key_hex: &str) -> TxResult<PrivateKeySigner> {
    let trimmed = private_key_hex.trim();
    let stripped = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let key_bytes = alloy::hex::decode(stripped)
        .map_err(|e| TxError::SignatureError(format!("Invalid key hex: {}", e)))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| TxError::SignatureError(format!("Invalid private key: {}", e)))
}

/// Create a signer from PEM-encoded private key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> TxResult<PrivateKeySigner> {
    signer_from_hex(&pem_to_hex(pem_bytes)?)
}

/// Accept either encoding: anything that looks like a PEM document is
/// parsed as one, everything else as hex.
pub fn signer_from_key_material(key: &str) -> TxResult<PrivateKeySigner> {
    if key.trim_start().starts_with("-----BEGIN") {
        signer_from_pem(key.as_bytes())
    } else {
        signer_from_hex(key)
    }
}
