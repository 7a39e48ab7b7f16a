//! Account identity and the counters needed to build transactions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bech32 account address as used on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccAddress(String);

impl AccAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Account record as stored by the auth module.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: String,
    pub public_key: Option<String>,
    pub account_number: u64,
    pub sequence: u64,
}

impl BaseAccount {
    pub fn state(&self) -> AccountState {
        AccountState {
            account_number: self.account_number,
            sequence: self.sequence,
        }
    }
}

/// `(account number, sequence)` pair used to sign a new transaction.
///
/// Both counters only ever grow for a given account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountState {
    pub account_number: u64,
    pub sequence: u64,
}

/// JSON payload of an account query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAccountParams {
    #[serde(rename = "Address")]
    pub address: AccAddress,
}
