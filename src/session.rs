//! Wallet session lifecycle: exactly one per running client, created on
//! connect and torn down on disconnect. Nothing else survives a restart.

use crate::error::ChainError;
use alloy::{
    primitives::Address,
    signers::local::PrivateKeySigner,
};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletSession {
    pub address: Address,
    pub chain_id: u64,
    pub is_connected: bool,
}

impl WalletSession {
    pub fn disconnect(&mut self) {
        self.is_connected = false;
    }
}

/// Where the signing key comes from.
#[derive(Clone, Debug)]
pub enum KeySource {
    /// Raw hex private key, typically from an environment variable.
    Hex(String),
    /// Encrypted JSON keystore on disk; the password is prompted for.
    Keystore { path: String },
}

/// Load and unlock the signer. Missing or undecryptable key material maps to
/// `NoProvider`; an aborted password prompt maps to `UserRejected`.
pub fn load_signer(source: &KeySource) -> Result<PrivateKeySigner, ChainError> {
    match source {
        KeySource::Hex(raw) => PrivateKeySigner::from_str(raw.trim())
            .map_err(|e| ChainError::NoProvider(format!("invalid private key: {e}"))),
        KeySource::Keystore { path } => {
            let path = shellexpand::tilde(path).into_owned();
            let password = rpassword::prompt_password("Keystore password: ")
                .map_err(|_| ChainError::UserRejected)?;
            let key = eth_keystore::decrypt_key(&path, password).map_err(|e| {
                ChainError::NoProvider(format!("cannot unlock keystore {path}: {e}"))
            })?;
            PrivateKeySigner::from_slice(&key)
                .map_err(|e| ChainError::NoProvider(format!("bad keystore key: {e}")))
        }
    }
}

/// Pick the key source from the environment: `DONE_PRIVATE_KEY` wins, then
/// `DONE_KEYSTORE`.
pub fn key_source_from_env() -> Result<KeySource, ChainError> {
    if let Ok(raw) = std::env::var("DONE_PRIVATE_KEY") {
        return Ok(KeySource::Hex(raw));
    }
    if let Ok(path) = std::env::var("DONE_KEYSTORE") {
        return Ok(KeySource::Keystore { path });
    }
    Err(ChainError::NoProvider(
        "set DONE_PRIVATE_KEY or DONE_KEYSTORE".to_string(),
    ))
}
