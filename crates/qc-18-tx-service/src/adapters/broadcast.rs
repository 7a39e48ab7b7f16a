//! Broadcast transport over a [`NodeQuerier`].
//!
//! Each mode maps to its own node method, called with `{"tx": <base64>}`.
//! Mempool rejections the node reports as errors are turned into a
//! [`TxResponse`] with an ABCI code, so callers see them the same way as a
//! failed `CheckTx`.

use crate::adapters::node_searcher::NodeExecResult;
use crate::adapters::wire::int_from_str_or_int;
use crate::domain::{tx_hash_of, BroadcastMode, TxResponse, TxServiceError, UpstreamError};
use crate::ports::{Broadcaster, NodeQuerier, NodeQueryError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub const BROADCAST_SYNC_PATH: &str = "broadcast_tx_sync";
pub const BROADCAST_ASYNC_PATH: &str = "broadcast_tx_async";
pub const BROADCAST_COMMIT_PATH: &str = "broadcast_tx_commit";

/// Codespace of the SDK's own error codes.
pub const SDK_CODESPACE: &str = "sdk";
pub const CODE_TX_IN_MEMPOOL_CACHE: u32 = 19;
pub const CODE_MEMPOOL_IS_FULL: u32 = 20;
pub const CODE_TX_TOO_LARGE: u32 = 21;

/// Node route for a broadcast mode.
pub fn broadcast_path(mode: BroadcastMode) -> Result<&'static str, TxServiceError> {
    match mode {
        BroadcastMode::Sync => Ok(BROADCAST_SYNC_PATH),
        BroadcastMode::Async => Ok(BROADCAST_ASYNC_PATH),
        BroadcastMode::Block => Ok(BROADCAST_COMMIT_PATH),
        BroadcastMode::Unspecified => Err(TxServiceError::invalid_argument(
            "unsupported return type BROADCAST_MODE_UNSPECIFIED; supported types: sync, async, block",
        )),
    }
}

#[derive(Debug, Serialize)]
struct BroadcastParams {
    tx: String,
}

/// Sync and async answers are flat; commit answers nest `check_tx` and
/// `tx_result` (`deliver_tx` on older nodes).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NodeBroadcastResult {
    code: u32,
    codespace: String,
    data: String,
    log: String,
    hash: String,
    #[serde(deserialize_with = "int_from_str_or_int")]
    height: i64,
    #[serde(deserialize_with = "int_from_str_or_int")]
    gas_wanted: i64,
    #[serde(deserialize_with = "int_from_str_or_int")]
    gas_used: i64,
    check_tx: Option<NodeExecResult>,
    #[serde(alias = "deliver_tx")]
    tx_result: Option<NodeExecResult>,
}

impl NodeBroadcastResult {
    fn into_response(self, fallback_hash: String) -> TxResponse {
        let txhash = if self.hash.is_empty() {
            fallback_hash
        } else {
            self.hash
        };
        // A failed CheckTx is the outcome; otherwise the execution result is.
        let exec = match (self.check_tx, self.tx_result) {
            (Some(check), _) if check.code != 0 => Some(check),
            (_, Some(deliver)) => Some(deliver),
            (check, None) => check,
        };

        match exec {
            Some(exec) => TxResponse {
                height: self.height,
                txhash,
                codespace: exec.codespace,
                code: exec.code,
                data: exec.data,
                raw_log: exec.log,
                info: exec.info,
                gas_wanted: exec.gas_wanted,
                gas_used: exec.gas_used,
                events: exec.events,
                ..Default::default()
            },
            None => TxResponse {
                height: self.height,
                txhash,
                codespace: self.codespace,
                code: self.code,
                data: self.data,
                raw_log: self.log,
                gas_wanted: self.gas_wanted,
                gas_used: self.gas_used,
                ..Default::default()
            },
        }
    }
}

/// Map a node error that really describes a mempool rejection to its code.
fn mempool_rejection(log: &str) -> Option<(u32, &'static str)> {
    let log = log.to_lowercase();
    if log.contains("tx already exists in cache") {
        Some((CODE_TX_IN_MEMPOOL_CACHE, "tx already in mempool"))
    } else if log.contains("mempool is full") {
        Some((CODE_MEMPOOL_IS_FULL, "mempool is full"))
    } else if log.contains("tx too large") {
        Some((CODE_TX_TOO_LARGE, "tx too large"))
    } else {
        None
    }
}

/// [`Broadcaster`] that submits transaction bytes to a node.
pub struct NodeBroadcaster<Q: NodeQuerier> {
    querier: Arc<Q>,
}

impl<Q: NodeQuerier> NodeBroadcaster<Q> {
    pub fn new(querier: Arc<Q>) -> Self {
        Self { querier }
    }
}

#[async_trait]
impl<Q: NodeQuerier> Broadcaster for NodeBroadcaster<Q> {
    #[instrument(skip(self, tx_bytes), fields(len = tx_bytes.map_or(0, <[u8]>::len)))]
    async fn broadcast_tx(
        &self,
        tx_bytes: Option<&[u8]>,
        mode: BroadcastMode,
    ) -> Result<TxResponse, TxServiceError> {
        let tx_bytes = match tx_bytes {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(TxServiceError::invalid_argument("invalid empty tx")),
        };
        let path = broadcast_path(mode)?;
        let txhash = tx_hash_of(tx_bytes);

        let params = serde_json::to_vec(&BroadcastParams {
            tx: BASE64_STANDARD.encode(tx_bytes),
        })
        .map_err(|e| UpstreamError::new(e.to_string()))?;

        let response = match self.querier.query_with_data(path, &params).await {
            Ok(response) => response,
            Err(err) => {
                let log = match &err {
                    NodeQueryError::Rejected { log, .. } => log.as_str(),
                    NodeQueryError::Transport(msg) => msg.as_str(),
                };
                if let Some((code, raw_log)) = mempool_rejection(log) {
                    debug!(code, %txhash, "Broadcast rejected by mempool");
                    return Ok(TxResponse {
                        txhash,
                        codespace: SDK_CODESPACE.to_string(),
                        code,
                        raw_log: raw_log.to_string(),
                        ..Default::default()
                    });
                }
                warn!(error = %err, "Broadcast failed");
                return Err(UpstreamError::new(err.to_string()).into());
            }
        };

        let result: NodeBroadcastResult = serde_json::from_slice(&response.value)
            .map_err(|e| UpstreamError::new(format!("invalid broadcast answer: {}", e)))?;

        Ok(result.into_response(txhash))
    }
}
