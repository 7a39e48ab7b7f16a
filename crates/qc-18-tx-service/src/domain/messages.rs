//! Request and response messages of the Tx service.
//!
//! Field names follow the HTTP gateway mapping (camelCase).

use crate::domain::types::{BroadcastMode, GasInfo, SimulationResult, Tx, TxResponse};
use crate::domain::value_objects::{OrderBy, PageRequest, PageResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetTxsEventRequest {
    pub events: Vec<String>,
    pub pagination: Option<PageRequest>,
    pub order_by: OrderBy,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTxsEventResponse {
    pub txs: Vec<Tx>,
    pub tx_responses: Vec<TxResponse>,
    pub pagination: Option<PageResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulateRequest {
    /// Structured transaction.
    ///
    /// Kept for older clients only. It is re-encoded by the service, and that
    /// encoding is not guaranteed to match the bytes the client signed, so
    /// signature checks may fail during simulation.
    pub tx: Option<Tx>,
    pub tx_bytes: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub gas_info: GasInfo,
    pub result: SimulationResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetTxRequest {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTxResponse {
    pub tx: Tx,
    pub tx_response: TxResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetBlockWithTxsRequest {
    pub height: i64,
    pub pagination: Option<PageRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBlockWithTxsResponse {
    pub txs: Vec<Tx>,
    pub pagination: Option<PageResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BroadcastTxRequest {
    pub tx_bytes: Option<Vec<u8>>,
    pub mode: BroadcastMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastTxResponse {
    pub tx_response: TxResponse,
}
