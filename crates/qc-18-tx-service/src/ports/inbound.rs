//! # Inbound Ports (Driving Ports)
//!
//! The RPC-facing API of the Tx service.

use crate::domain::{
    BroadcastTxRequest, BroadcastTxResponse, GetBlockWithTxsRequest, GetBlockWithTxsResponse,
    GetTxRequest, GetTxResponse, GetTxsEventRequest, GetTxsEventResponse, SimulateRequest,
    SimulateResponse, TxServiceResult,
};
use async_trait::async_trait;

/// Tx query, simulation and broadcast API.
///
/// Every call is independent; a `None` request is rejected with
/// `InvalidArgument` where the operation needs one.
#[async_trait]
pub trait TxServiceApi: Send + Sync {
    /// Search transactions by event filters.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: missing request, no filters, or a malformed filter
    /// - pagination errors, unchanged
    /// - `Internal`: the index returned a payload that is not a transaction
    async fn get_txs_event(
        &self,
        request: Option<GetTxsEventRequest>,
    ) -> TxServiceResult<GetTxsEventResponse>;

    /// Simulate a transaction and report its gas usage.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: neither `tx_bytes` nor `tx` given
    /// - `Unknown`: the engine failed; the message includes gas wanted/used
    async fn simulate(&self, request: Option<SimulateRequest>)
        -> TxServiceResult<SimulateResponse>;

    /// Fetch one transaction by hex hash.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: empty hash or wrong length
    /// - `NotFound`: the index has no such transaction
    /// - `Internal`: the index returned a payload that is not a transaction
    async fn get_tx(&self, request: Option<GetTxRequest>) -> TxServiceResult<GetTxResponse>;

    /// Block with decoded transactions. Not supported.
    async fn get_block_with_txs(
        &self,
        request: Option<GetBlockWithTxsRequest>,
    ) -> TxServiceResult<GetBlockWithTxsResponse>;

    /// Hand encoded transaction bytes to the broadcast transport.
    async fn broadcast_tx(
        &self,
        request: Option<BroadcastTxRequest>,
    ) -> TxServiceResult<BroadcastTxResponse>;
}
