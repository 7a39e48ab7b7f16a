//! Transaction index reached through a [`NodeQuerier`].
//!
//! `tx_search` and `tx` are JSON-RPC methods of the node. Their answers carry
//! base64 transaction bytes, which are unpacked through [`TxCodec`] so that
//! every returned [`TxResponse`] carries its cached value.

use crate::adapters::codec::TxCodec;
use crate::adapters::wire::int_from_str_or_int;
use crate::domain::{
    order_directive, Event, EventFilter, SearchTxsResult, SortOrder, TxResponse, UpstreamError,
    TX_TYPE_URL,
};
use crate::ports::{NodeQuerier, NodeQueryError, TxSearcher};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

pub const TX_SEARCH_PATH: &str = "tx_search";
pub const TX_PATH: &str = "tx";

#[derive(Debug, Serialize)]
struct TxSearchParams<'a> {
    query: String,
    prove: bool,
    page: u64,
    per_page: u64,
    order_by: &'a str,
}

/// The node takes the hash as base64 of its raw bytes.
#[derive(Debug, Serialize)]
struct TxParams {
    hash: String,
    prove: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct NodeTxSearchResult {
    pub txs: Vec<NodeTxResult>,
    #[serde(deserialize_with = "int_from_str_or_int")]
    pub total_count: u64,
}

/// One indexed transaction as the node reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct NodeTxResult {
    pub hash: String,
    #[serde(deserialize_with = "int_from_str_or_int")]
    pub height: i64,
    #[serde(default)]
    pub index: u32,
    pub tx_result: NodeExecResult,
    /// Base64 payload.
    pub tx: String,
    /// Payload type; transactions when absent.
    #[serde(default)]
    pub type_url: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct NodeExecResult {
    pub code: u32,
    pub codespace: String,
    pub data: String,
    pub log: String,
    pub info: String,
    #[serde(deserialize_with = "int_from_str_or_int")]
    pub gas_wanted: i64,
    #[serde(deserialize_with = "int_from_str_or_int")]
    pub gas_used: i64,
    pub events: Vec<Event>,
}

fn encode_params(params: &impl Serialize) -> Result<Vec<u8>, UpstreamError> {
    serde_json::to_vec(params).map_err(|e| UpstreamError::new(e.to_string()))
}

/// [`TxSearcher`] over a node's tx index.
pub struct NodeTxSearcher<Q: NodeQuerier> {
    querier: Arc<Q>,
    codec: TxCodec,
}

impl<Q: NodeQuerier> NodeTxSearcher<Q> {
    pub fn new(querier: Arc<Q>, codec: TxCodec) -> Self {
        Self { querier, codec }
    }

    async fn query(&self, path: &str, data: Vec<u8>) -> Result<Vec<u8>, UpstreamError> {
        match self.querier.query_with_data(path, &data).await {
            Ok(response) => Ok(response.value),
            // Keep the node's own wording so "not found" can be recognised.
            Err(NodeQueryError::Rejected { log, .. }) => Err(UpstreamError::new(log)),
            Err(err @ NodeQueryError::Transport(_)) => Err(UpstreamError::new(err.to_string())),
        }
    }

    fn to_response(&self, result: NodeTxResult) -> Result<TxResponse, UpstreamError> {
        let bytes = BASE64_STANDARD
            .decode(result.tx.as_bytes())
            .map_err(|e| UpstreamError::new(format!("invalid tx encoding: {}", e)))?;
        let type_url = result.type_url.as_deref().unwrap_or(TX_TYPE_URL);
        let any = self
            .codec
            .unpack(type_url, bytes)
            .map_err(|e| UpstreamError::new(e.to_string()))?;

        let exec = result.tx_result;
        Ok(TxResponse {
            height: result.height,
            txhash: result.hash,
            codespace: exec.codespace,
            code: exec.code,
            data: exec.data,
            raw_log: exec.log,
            info: exec.info,
            gas_wanted: exec.gas_wanted,
            gas_used: exec.gas_used,
            tx: Some(any),
            timestamp: result.timestamp,
            events: exec.events,
        })
    }
}

#[async_trait]
impl<Q: NodeQuerier> TxSearcher for NodeTxSearcher<Q> {
    #[instrument(skip(self, events), fields(filters = events.len()))]
    async fn search_txs(
        &self,
        events: &EventFilter,
        page: u64,
        limit: u64,
        order: Option<SortOrder>,
    ) -> Result<SearchTxsResult, UpstreamError> {
        let params = TxSearchParams {
            query: events.to_query(),
            prove: false,
            page,
            per_page: limit,
            order_by: order_directive(order),
        };
        let raw = self.query(TX_SEARCH_PATH, encode_params(&params)?).await?;
        let result: NodeTxSearchResult =
            serde_json::from_slice(&raw).map_err(|e| UpstreamError::new(e.to_string()))?;

        let txs = result
            .txs
            .into_iter()
            .map(|tx| self.to_response(tx))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(total = result.total_count, returned = txs.len(), "Tx search answered");

        let limit = limit.max(1);
        Ok(SearchTxsResult {
            total_count: result.total_count,
            count: txs.len() as u64,
            page_number: page,
            page_total: result.total_count.div_ceil(limit),
            limit,
            txs,
        })
    }

    #[instrument(skip(self))]
    async fn get_tx(&self, hash: &str) -> Result<TxResponse, UpstreamError> {
        let raw_hash =
            hex::decode(hash).map_err(|e| UpstreamError::new(format!("invalid tx hash: {}", e)))?;
        let params = encode_params(&TxParams {
            hash: BASE64_STANDARD.encode(raw_hash),
            prove: false,
        })?;
        let raw = self.query(TX_PATH, params).await?;
        let result: NodeTxResult =
            serde_json::from_slice(&raw).map_err(|e| UpstreamError::new(e.to_string()))?;
        self.to_response(result)
    }
}
