//! Deterministic in-memory adapters for tests.
//!
//! Each double can be injected anywhere the corresponding port is expected,
//! so account and transaction logic runs without a live node.

use crate::domain::{
    AccAddress, BaseAccount, BroadcastMode, EventFilter, SearchTxsResult, SortOrder, TxResponse,
    TxServiceError, UpstreamError, TX_HEIGHT_KEY,
};
use crate::ports::{
    AccountError, AccountRetriever, Broadcaster, NodeQuerier, NodeQueryError, NodeQueryResponse,
    SimulationFailure, SimulationOutcome, Simulator, TxSearcher,
};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;

// =============================================================================
// NODE QUERIER
// =============================================================================

struct Expectation {
    path: String,
    /// `None` matches any payload.
    data: Option<Vec<u8>>,
    response: Result<NodeQueryResponse, NodeQueryError>,
}

/// Node querier answering from a table of expected calls.
///
/// Each expectation is consumed by the first call that matches it. A call
/// with no matching expectation fails with a transport error.
#[derive(Default)]
pub struct MockNodeQuerier {
    expectations: Mutex<Vec<Expectation>>,
    calls: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockNodeQuerier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect one call with exactly this path and payload.
    pub fn expect(
        &self,
        path: impl Into<String>,
        data: impl Into<Vec<u8>>,
        response: Result<NodeQueryResponse, NodeQueryError>,
    ) -> &Self {
        self.expectations.lock().push(Expectation {
            path: path.into(),
            data: Some(data.into()),
            response,
        });
        self
    }

    /// Expect one call on `path` with any payload.
    pub fn expect_path(
        &self,
        path: impl Into<String>,
        response: Result<NodeQueryResponse, NodeQueryError>,
    ) -> &Self {
        self.expectations.lock().push(Expectation {
            path: path.into(),
            data: None,
            response,
        });
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.expectations.lock().len()
    }

    /// Panic if some expectation was never used.
    pub fn assert_exhausted(&self) {
        let remaining: Vec<String> = self
            .expectations
            .lock()
            .iter()
            .map(|e| e.path.clone())
            .collect();
        assert!(
            remaining.is_empty(),
            "missing calls to MockNodeQuerier: {:?}",
            remaining
        );
    }
}

#[async_trait]
impl NodeQuerier for MockNodeQuerier {
    async fn query_with_data(
        &self,
        path: &str,
        data: &[u8],
    ) -> Result<NodeQueryResponse, NodeQueryError> {
        self.calls.lock().push((path.to_string(), data.to_vec()));

        let mut expectations = self.expectations.lock();
        let position = expectations.iter().position(|e| {
            e.path == path && e.data.as_deref().map_or(true, |expected| expected == data)
        });

        match position {
            Some(index) => expectations.remove(index).response,
            None => Err(NodeQueryError::Transport(format!(
                "unexpected call to MockNodeQuerier: path {} with {} bytes",
                path,
                data.len()
            ))),
        }
    }
}

// =============================================================================
// ACCOUNT RETRIEVER
// =============================================================================

/// Account retriever with canned per-address answers.
///
/// Unknown addresses are reported as not found. The querier passed in is
/// never touched.
#[derive(Default)]
pub struct MockAccountRetriever {
    accounts: RwLock<HashMap<AccAddress, Result<(BaseAccount, i64), AccountError>>>,
    lookups: Mutex<Vec<AccAddress>>,
}

impl MockAccountRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, address: AccAddress, account_number: u64, sequence: u64) -> Self {
        let account = BaseAccount {
            address: address.to_string(),
            public_key: None,
            account_number,
            sequence,
        };
        self.accounts.write().insert(address, Ok((account, 1)));
        self
    }

    pub fn with_error(self, address: AccAddress, error: AccountError) -> Self {
        self.accounts.write().insert(address, Err(error));
        self
    }

    pub fn lookups(&self) -> Vec<AccAddress> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl AccountRetriever for MockAccountRetriever {
    async fn get_account_with_height(
        &self,
        _querier: &dyn NodeQuerier,
        address: &AccAddress,
    ) -> Result<(BaseAccount, i64), AccountError> {
        self.lookups.lock().push(address.clone());
        self.accounts
            .read()
            .get(address)
            .cloned()
            .unwrap_or_else(|| {
                Err(AccountError::NotFound {
                    address: address.clone(),
                })
            })
    }
}

// =============================================================================
// TRANSACTION INDEX
// =============================================================================

/// Arguments of one `search_txs` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub events: Vec<String>,
    pub page: u64,
    pub limit: u64,
    pub order: Option<SortOrder>,
}

/// In-memory transaction index.
///
/// Transactions are kept in insertion order. A search keeps those whose
/// events satisfy every filter, then orders by height (ascending unless
/// told otherwise) and slices out the requested page.
#[derive(Default)]
pub struct MemoryTxStore {
    txs: RwLock<Vec<TxResponse>>,
    failure: RwLock<Option<UpstreamError>>,
    searches: Mutex<Vec<SearchCall>>,
}

impl MemoryTxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tx: TxResponse) {
        self.txs.write().push(tx);
    }

    /// Make every subsequent call fail with `error`.
    pub fn fail_with(&self, error: UpstreamError) {
        *self.failure.write() = Some(error);
    }

    pub fn last_search(&self) -> Option<SearchCall> {
        self.searches.lock().last().cloned()
    }

    fn check_failure(&self) -> Result<(), UpstreamError> {
        match self.failure.read().as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn matches_filter(tx: &TxResponse, filter: &EventFilter) -> bool {
    filter.conditions().all(|cond| {
        let key = format!("{}.{}", cond.event_type, cond.attribute);
        if key == TX_HEIGHT_KEY {
            return tx.height.to_string() == cond.value;
        }
        if key == "tx.hash" {
            return tx.txhash.eq_ignore_ascii_case(cond.value);
        }
        tx.events.iter().any(|event| {
            event.kind == cond.event_type
                && event
                    .attributes
                    .iter()
                    .any(|attr| attr.key == cond.attribute && attr.value == cond.value)
        })
    })
}

#[async_trait]
impl TxSearcher for MemoryTxStore {
    async fn search_txs(
        &self,
        events: &EventFilter,
        page: u64,
        limit: u64,
        order: Option<SortOrder>,
    ) -> Result<SearchTxsResult, UpstreamError> {
        self.searches.lock().push(SearchCall {
            events: events.as_slice().to_vec(),
            page,
            limit,
            order,
        });
        self.check_failure()?;

        let mut matched: Vec<TxResponse> = self
            .txs
            .read()
            .iter()
            .filter(|tx| matches_filter(tx, events))
            .cloned()
            .collect();

        matched.sort_by_key(|tx| tx.height);
        if order == Some(SortOrder::Desc) {
            matched.reverse();
        }

        let total_count = matched.len() as u64;
        let limit = limit.max(1);
        let start = page.saturating_sub(1).saturating_mul(limit);
        let txs: Vec<TxResponse> = matched
            .into_iter()
            .skip(usize::try_from(start).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();

        Ok(SearchTxsResult {
            total_count,
            count: txs.len() as u64,
            page_number: page,
            page_total: total_count.div_ceil(limit),
            limit,
            txs,
        })
    }

    async fn get_tx(&self, hash: &str) -> Result<TxResponse, UpstreamError> {
        self.check_failure()?;
        self.txs
            .read()
            .iter()
            .find(|tx| tx.txhash.eq_ignore_ascii_case(hash))
            .cloned()
            .ok_or_else(|| UpstreamError::new(format!("tx ({}) not found", hash)))
    }
}

// =============================================================================
// EXECUTION ENGINE
// =============================================================================

/// Simulator returning a canned outcome and recording its inputs.
pub struct MockSimulator {
    outcome: Mutex<Result<SimulationOutcome, SimulationFailure>>,
    inputs: Mutex<Vec<Vec<u8>>>,
}

impl MockSimulator {
    pub fn succeeding(outcome: SimulationOutcome) -> Self {
        Self {
            outcome: Mutex::new(Ok(outcome)),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(failure: SimulationFailure) -> Self {
        Self {
            outcome: Mutex::new(Err(failure)),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<Vec<u8>> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl Simulator for MockSimulator {
    async fn simulate(&self, tx_bytes: &[u8]) -> Result<SimulationOutcome, SimulationFailure> {
        self.inputs.lock().push(tx_bytes.to_vec());
        self.outcome.lock().clone()
    }
}

// =============================================================================
// BROADCAST TRANSPORT
// =============================================================================

/// Broadcaster returning a canned result and recording its inputs.
pub struct MockBroadcaster {
    result: Mutex<Result<TxResponse, TxServiceError>>,
    calls: Mutex<Vec<(Option<Vec<u8>>, BroadcastMode)>>,
}

impl MockBroadcaster {
    pub fn new(result: Result<TxResponse, TxServiceError>) -> Self {
        Self {
            result: Mutex::new(result),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(Option<Vec<u8>>, BroadcastMode)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Broadcaster for MockBroadcaster {
    async fn broadcast_tx(
        &self,
        tx_bytes: Option<&[u8]>,
        mode: BroadcastMode,
    ) -> Result<TxResponse, TxServiceError> {
        self.calls.lock().push((tx_bytes.map(<[u8]>::to_vec), mode));
        self.result.lock().clone()
    }
}
