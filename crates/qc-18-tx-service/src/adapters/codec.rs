//! Transaction codec and type registry.
//!
//! Encoding is `bincode` over the [`Tx`] structure, so the same value always
//! yields the same bytes. A client that builds its bytes some other way may
//! still produce a different encoding of an equal transaction.

use crate::domain::{AnyTx, CachedValue, Tx, TX_TYPE_URL};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("failed to encode tx: {0}")]
    Encode(String),
    #[error("failed to decode tx: {0}")]
    Decode(String),
}

/// Encodes transactions and unpacks [`AnyTx`] payloads by type URL.
#[derive(Debug, Clone)]
pub struct TxCodec {
    /// Registered non-transaction types: type URL -> type name.
    foreign: HashMap<String, String>,
}

impl Default for TxCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TxCodec {
    pub fn new() -> Self {
        Self {
            foreign: HashMap::new(),
        }
    }

    /// Register a payload type that is known but is not a transaction.
    pub fn register(&mut self, type_url: impl Into<String>, type_name: impl Into<String>) {
        self.foreign.insert(type_url.into(), type_name.into());
    }

    pub fn encode(&self, tx: &Tx) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(tx).map_err(|e| CodecError::Encode(e.to_string()))
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Tx, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    /// Pack a transaction with its cached value already set.
    pub fn pack(&self, tx: &Tx) -> Result<AnyTx, CodecError> {
        Ok(AnyTx {
            type_url: TX_TYPE_URL.to_string(),
            value: self.encode(tx)?,
            cached: Some(CachedValue::Tx(Box::new(tx.clone()))),
        })
    }

    /// Materialise the cached value of a payload.
    ///
    /// Transactions are decoded; registered foreign types are tagged with
    /// their name; unknown type URLs leave nothing cached.
    pub fn unpack(&self, type_url: &str, value: Vec<u8>) -> Result<AnyTx, CodecError> {
        let cached = if type_url == TX_TYPE_URL {
            Some(CachedValue::Tx(Box::new(self.decode(&value)?)))
        } else {
            self.foreign
                .get(type_url)
                .map(|type_name| CachedValue::Foreign {
                    type_name: type_name.clone(),
                })
        };

        Ok(AnyTx {
            type_url: type_url.to_string(),
            value,
            cached,
        })
    }
}
