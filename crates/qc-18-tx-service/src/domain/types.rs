//! Transaction model and indexed transaction results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type URL under which full transactions are packed.
pub const TX_TYPE_URL: &str = "/cosmos.tx.v1beta1.Tx";

/// A signed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tx {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    pub signatures: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxBody {
    pub messages: Vec<AnyMsg>,
    pub memo: String,
    pub timeout_height: u64,
}

/// A message packed with its type URL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnyMsg {
    pub type_url: String,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignerInfo {
    pub public_key: Option<Vec<u8>>,
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas_limit: u64,
    pub payer: String,
    pub granter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

/// Value materialised from an [`AnyTx`] by the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    /// A decoded transaction.
    Tx(Box<Tx>),
    /// A registered type that is not a transaction.
    Foreign { type_name: String },
}

impl CachedValue {
    pub fn type_name(&self) -> &str {
        match self {
            CachedValue::Tx(_) => expected_tx_type(),
            CachedValue::Foreign { type_name } => type_name,
        }
    }
}

/// Name of the concrete transaction type, used in mismatch reports.
pub fn expected_tx_type() -> &'static str {
    std::any::type_name::<Tx>()
}

/// The cached value under an [`AnyTx`] was not a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub expected: &'static str,
    pub actual: String,
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, got {}", self.expected, self.actual)
    }
}

impl std::error::Error for TypeMismatch {}

/// Polymorphic transaction payload as returned by the tx index.
///
/// The wire form is `type_url` + `value`; `cached` holds the value decoded
/// once upstream and is never serialised.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnyTx {
    pub type_url: String,
    pub value: Vec<u8>,
    #[serde(skip)]
    pub cached: Option<CachedValue>,
}

impl AnyTx {
    /// Recover the concrete transaction.
    ///
    /// Fails when nothing is cached or the cached value is of another type;
    /// it never falls back to decoding `value` here.
    pub fn cached_tx(&self) -> Result<&Tx, TypeMismatch> {
        match &self.cached {
            Some(CachedValue::Tx(tx)) => Ok(tx),
            other => Err(TypeMismatch {
                expected: expected_tx_type(),
                actual: other
                    .as_ref()
                    .map(|v| v.type_name().to_string())
                    .unwrap_or_else(|| "<nil>".to_string()),
            }),
        }
    }
}

/// An ABCI event emitted while executing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.into(),
            index: true,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
    pub index: bool,
}

/// Indexed transaction together with its execution metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxResponse {
    pub height: i64,
    pub txhash: String,
    pub codespace: String,
    pub code: u32,
    pub data: String,
    pub raw_log: String,
    pub info: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
    pub tx: Option<AnyTx>,
    pub timestamp: String,
    pub events: Vec<Event>,
}

/// One page of an event search.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchTxsResult {
    pub total_count: u64,
    pub count: u64,
    pub page_number: u64,
    pub page_total: u64,
    pub limit: u64,
    pub txs: Vec<TxResponse>,
}

/// Gas accounting reported by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GasInfo {
    pub gas_wanted: u64,
    pub gas_used: u64,
}

/// Opaque execution result of a simulated transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    pub data: Vec<u8>,
    pub log: String,
    pub events: Vec<Event>,
}

/// How a broadcast waits for the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BroadcastMode {
    #[default]
    Unspecified,
    /// Wait for the tx to be committed in a block.
    Block,
    /// Wait for the CheckTx result.
    Sync,
    /// Return immediately.
    Async,
}
