//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the Tx service depends on. Adapters implement them against a
//! live node or in memory; the service never knows which.
//!
//! - [`NodeQuerier`]: opaque `(path, data) -> (bytes, height)` node queries
//! - [`AccountRetriever`]: account existence and number/sequence lookup
//! - [`TxSearcher`]: the event-indexed transaction store
//! - [`Simulator`]: the execution engine's simulate entry point
//! - [`Broadcaster`]: the broadcast transport

use crate::domain::{
    AccAddress, AccountState, BaseAccount, BroadcastMode, EventFilter, GasInfo, SearchTxsResult,
    SimulationResult, SortOrder, TxResponse, TxServiceError, UpstreamError,
};
use async_trait::async_trait;
use thiserror::Error;

// =============================================================================
// NODE QUERIER
// =============================================================================

/// Raw answer to a node query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeQueryResponse {
    /// Encoded result; the caller knows the codec.
    pub value: Vec<u8>,
    /// Block height the query was answered at.
    pub height: i64,
}

impl NodeQueryResponse {
    pub fn new(value: impl Into<Vec<u8>>, height: i64) -> Self {
        Self {
            value: value.into(),
            height,
        }
    }
}

/// Failure of a node query, surfaced as-is to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeQueryError {
    /// The node answered with a non-zero result code.
    #[error("query {path} failed with code {code}: {log}")]
    Rejected { path: String, code: u32, log: String },

    /// The node could not be reached, timed out, or sent an unreadable answer.
    #[error("{0}")]
    Transport(String),
}

/// Minimal capability to query a node.
///
/// This is the only way account and transaction logic reaches node state.
/// Any implementation, including a synthetic one, can stand in for a live
/// node. Inputs are not validated here.
#[async_trait]
pub trait NodeQuerier: Send + Sync {
    async fn query_with_data(
        &self,
        path: &str,
        data: &[u8],
    ) -> Result<NodeQueryResponse, NodeQueryError>;
}

#[async_trait]
impl<T: NodeQuerier + ?Sized> NodeQuerier for std::sync::Arc<T> {
    async fn query_with_data(
        &self,
        path: &str,
        data: &[u8],
    ) -> Result<NodeQueryResponse, NodeQueryError> {
        (**self).query_with_data(path, data).await
    }
}

// =============================================================================
// ACCOUNT RETRIEVER
// =============================================================================

/// Account lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// The node reports no account at this address.
    #[error("account {address} not found")]
    NotFound { address: AccAddress },

    /// The query itself failed.
    #[error(transparent)]
    Query(#[from] NodeQueryError),

    /// The query payload or the node's answer could not be (de)serialised.
    #[error("account codec error: {0}")]
    Codec(String),
}

impl AccountError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AccountError::NotFound { .. })
    }
}

/// Account information needed to construct transactions.
///
/// Read-only: none of these calls change node state.
#[async_trait]
pub trait AccountRetriever: Send + Sync {
    /// Fetch the account together with the height it was read at.
    async fn get_account_with_height(
        &self,
        querier: &dyn NodeQuerier,
        address: &AccAddress,
    ) -> Result<(BaseAccount, i64), AccountError>;

    async fn get_account(
        &self,
        querier: &dyn NodeQuerier,
        address: &AccAddress,
    ) -> Result<BaseAccount, AccountError> {
        let (account, _) = self.get_account_with_height(querier, address).await?;
        Ok(account)
    }

    /// Succeeds only if the account exists.
    async fn ensure_exists(
        &self,
        querier: &dyn NodeQuerier,
        address: &AccAddress,
    ) -> Result<(), AccountError> {
        self.get_account(querier, address).await.map(|_| ())
    }

    async fn get_account_number_sequence(
        &self,
        querier: &dyn NodeQuerier,
        address: &AccAddress,
    ) -> Result<AccountState, AccountError> {
        let account = self.get_account(querier, address).await?;
        Ok(account.state())
    }
}

// =============================================================================
// TRANSACTION INDEX
// =============================================================================

/// The event-indexed transaction store.
///
/// Returned [`TxResponse`]s carry their `tx` already unpacked, so the
/// cached value can be inspected without decoding again.
#[async_trait]
pub trait TxSearcher: Send + Sync {
    /// Search by validated event filters.
    ///
    /// `order` is `None` when the store should apply its default ordering.
    async fn search_txs(
        &self,
        events: &EventFilter,
        page: u64,
        limit: u64,
        order: Option<SortOrder>,
    ) -> Result<SearchTxsResult, UpstreamError>;

    /// Look up a single transaction by hex hash.
    async fn get_tx(&self, hash: &str) -> Result<TxResponse, UpstreamError>;
}

// =============================================================================
// EXECUTION ENGINE
// =============================================================================

/// Successful simulation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimulationOutcome {
    pub gas_info: GasInfo,
    pub result: SimulationResult,
}

/// Failed simulation, with the gas accounted up to the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SimulationFailure {
    pub gas_info: GasInfo,
    pub message: String,
}

impl SimulationFailure {
    pub fn new(gas_info: GasInfo, message: impl Into<String>) -> Self {
        Self {
            gas_info,
            message: message.into(),
        }
    }
}

/// The execution engine's simulate entry point.
#[async_trait]
pub trait Simulator: Send + Sync {
    async fn simulate(&self, tx_bytes: &[u8]) -> Result<SimulationOutcome, SimulationFailure>;
}

#[async_trait]
impl<F> Simulator for F
where
    F: Fn(&[u8]) -> Result<SimulationOutcome, SimulationFailure> + Send + Sync,
{
    async fn simulate(&self, tx_bytes: &[u8]) -> Result<SimulationOutcome, SimulationFailure> {
        self(tx_bytes)
    }
}

// =============================================================================
// BROADCAST TRANSPORT
// =============================================================================

/// Transport that submits encoded transactions to the network.
///
/// Errors are transport-defined and reach the caller unchanged.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast_tx(
        &self,
        tx_bytes: Option<&[u8]>,
        mode: BroadcastMode,
    ) -> Result<TxResponse, TxServiceError>;
}
