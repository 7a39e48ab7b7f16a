//! # Tx Service
//!
//! The RPC-facing facade: validates requests, delegates to the tx index, the
//! execution engine and the broadcast transport, and classifies their
//! failures.
//!
//! ## Architecture
//!
//! Implements [`TxServiceApi`] on top of three outbound ports:
//! - [`TxSearcher`]: event search and lookup by hash
//! - [`Simulator`]: the execution engine's simulate entry point
//! - [`Broadcaster`]: the broadcast transport
//!
//! The service holds no mutable state. Every call is validate, delegate,
//! translate; there are no retries and no timeouts of its own.

use std::sync::Arc;

use async_trait::async_trait;
use quantum_telemetry::log_tx_event;
use tracing::{debug, error, instrument, warn};

use crate::adapters::{NodeBroadcaster, NodeTxSearcher, TxCodec};
use crate::domain::{
    parse_pagination, validate_tx_hash, AnyTx, BroadcastTxRequest, BroadcastTxResponse,
    ConfigError, EventFilter, GetBlockWithTxsRequest, GetBlockWithTxsResponse, GetTxRequest, GetTxResponse,
    GetTxsEventRequest, GetTxsEventResponse, PageResponse, PaginationConfig, SimulateRequest,
    SimulateResponse, Tx, TxServiceConfig, TxServiceError, TxServiceResult,
};
use crate::ports::inbound::TxServiceApi;
use crate::ports::outbound::{Broadcaster, NodeQuerier, Simulator, TxSearcher};

/// Recover the concrete transaction behind an index payload.
///
/// A missing or foreign cached value is a codec registration defect and is
/// reported as `Internal`.
fn unwrap_tx(any: Option<&AnyTx>) -> TxServiceResult<Tx> {
    let tx = match any {
        Some(any) => any.cached_tx().map(Tx::clone),
        None => AnyTx::default().cached_tx().map(Tx::clone),
    };
    tx.map_err(|mismatch| {
        error!(%mismatch, "Tx index returned a payload that is not a transaction");
        TxServiceError::internal(mismatch.to_string())
    })
}

/// Transaction query, simulation and broadcast facade.
///
/// ## Dependencies
///
/// - `S: TxSearcher` - indexed transaction store
/// - `E: Simulator` - execution engine
/// - `B: Broadcaster` - broadcast transport
pub struct TxService<S, E, B>
where
    S: TxSearcher,
    E: Simulator,
    B: Broadcaster,
{
    searcher: Arc<S>,
    simulator: Arc<E>,
    broadcaster: Arc<B>,
    /// Re-encodes structured transactions on the legacy simulate path.
    codec: TxCodec,
    pagination: PaginationConfig,
    subsystem_id: String,
}

impl<S, E, B> TxService<S, E, B>
where
    S: TxSearcher,
    E: Simulator,
    B: Broadcaster,
{
    /// Create a service after validating `config`.
    pub fn new(
        searcher: Arc<S>,
        simulator: Arc<E>,
        broadcaster: Arc<B>,
        config: &TxServiceConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            searcher,
            simulator,
            broadcaster,
            codec: TxCodec::new(),
            pagination: config.pagination.clone(),
            subsystem_id: config.telemetry_subsystem_id.clone(),
        })
    }

    /// Use `codec` for re-encoding instead of the default one.
    pub fn with_codec(mut self, codec: TxCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }
}

impl<Q, E> TxService<NodeTxSearcher<Q>, E, NodeBroadcaster<Q>>
where
    Q: NodeQuerier,
    E: Simulator,
{
    /// Service whose index and broadcast transport both go through `querier`.
    pub fn with_node(
        querier: Arc<Q>,
        simulator: Arc<E>,
        config: &TxServiceConfig,
    ) -> Result<Self, ConfigError> {
        let codec = TxCodec::new();
        let searcher = Arc::new(NodeTxSearcher::new(querier.clone(), codec.clone()));
        let broadcaster = Arc::new(NodeBroadcaster::new(querier));
        Ok(Self::new(searcher, simulator, broadcaster, config)?.with_codec(codec))
    }
}

#[async_trait]
impl<S, E, B> TxServiceApi for TxService<S, E, B>
where
    S: TxSearcher,
    E: Simulator,
    B: Broadcaster,
{
    #[instrument(skip_all, fields(events = request.as_ref().map_or(0, |r| r.events.len())))]
    async fn get_txs_event(
        &self,
        request: Option<GetTxsEventRequest>,
    ) -> TxServiceResult<GetTxsEventResponse> {
        let request =
            request.ok_or_else(|| TxServiceError::invalid_argument("request cannot be nil"))?;

        let (page, limit) = parse_pagination(request.pagination.as_ref(), &self.pagination)?;
        let order = request.order_by.sort_order();
        let filter = EventFilter::parse(&request.events).inspect_err(|err| {
            debug!(error = %err, "Rejected event filters");
        })?;

        let result = self
            .searcher
            .search_txs(&filter, page, limit, order)
            .await
            .inspect_err(|err| warn!(error = %err, "Tx search failed"))?;

        let txs = result
            .txs
            .iter()
            .map(|tx_response| unwrap_tx(tx_response.tx.as_ref()))
            .collect::<TxServiceResult<Vec<_>>>()?;

        debug!(
            page,
            limit,
            total = result.total_count,
            returned = txs.len(),
            "Tx search completed"
        );

        Ok(GetTxsEventResponse {
            txs,
            tx_responses: result.txs,
            pagination: Some(PageResponse {
                next_key: Vec::new(),
                total: result.total_count,
            }),
        })
    }

    #[instrument(skip_all)]
    async fn simulate(
        &self,
        request: Option<SimulateRequest>,
    ) -> TxServiceResult<SimulateResponse> {
        let request = request.ok_or_else(|| TxServiceError::invalid_argument("invalid empty tx"))?;

        let tx_bytes = match (request.tx_bytes, request.tx) {
            (Some(bytes), _) => bytes,
            (None, Some(tx)) => {
                // Legacy clients: this encoding may differ from the one they signed.
                self.codec
                    .encode(&tx)
                    .map_err(|e| TxServiceError::invalid_argument(format!("invalid tx; {}", e)))?
            }
            (None, None) => {
                return Err(TxServiceError::invalid_argument(
                    "empty txBytes is not allowed",
                ))
            }
        };

        match self.simulator.simulate(&tx_bytes).await {
            Ok(outcome) => {
                debug!(
                    gas_wanted = outcome.gas_info.gas_wanted,
                    gas_used = outcome.gas_info.gas_used,
                    "Simulation succeeded"
                );
                Ok(SimulateResponse {
                    gas_info: outcome.gas_info,
                    result: outcome.result,
                })
            }
            Err(failure) => {
                warn!(
                    error = %failure,
                    gas_wanted = failure.gas_info.gas_wanted,
                    gas_used = failure.gas_info.gas_used,
                    "Simulation failed"
                );
                Err(TxServiceError::unknown(format!(
                    "{} With gas wanted: '{}' and gas used: '{}' ",
                    failure.message, failure.gas_info.gas_wanted, failure.gas_info.gas_used
                )))
            }
        }
    }

    #[instrument(skip_all, fields(hash = request.as_ref().map(|r| r.hash.as_str())))]
    async fn get_tx(&self, request: Option<GetTxRequest>) -> TxServiceResult<GetTxResponse> {
        let request =
            request.ok_or_else(|| TxServiceError::invalid_argument("request cannot be nil"))?;
        validate_tx_hash(&request.hash)?;

        let tx_response = match self.searcher.get_tx(&request.hash).await {
            Ok(tx_response) => tx_response,
            Err(err) if err.is_not_found() => {
                debug!(error = %err, "Tx not in index");
                return Err(TxServiceError::not_found(format!(
                    "tx not found: {}",
                    request.hash
                )));
            }
            Err(err) => {
                warn!(error = %err, "Tx lookup failed");
                return Err(err.into());
            }
        };

        let tx = unwrap_tx(tx_response.tx.as_ref())?;
        log_tx_event!(
            debug,
            self.subsystem_id.as_str(),
            "Tx retrieved",
            request.hash,
            height = tx_response.height
        );

        Ok(GetTxResponse { tx, tx_response })
    }

    async fn get_block_with_txs(
        &self,
        _request: Option<GetBlockWithTxsRequest>,
    ) -> TxServiceResult<GetBlockWithTxsResponse> {
        Err(TxServiceError::unimplemented("service not supported"))
    }

    #[instrument(skip_all, fields(mode = ?request.as_ref().map(|r| r.mode)))]
    async fn broadcast_tx(
        &self,
        request: Option<BroadcastTxRequest>,
    ) -> TxServiceResult<BroadcastTxResponse> {
        let request = request.unwrap_or_default();
        let tx_response = self
            .broadcaster
            .broadcast_tx(request.tx_bytes.as_deref(), request.mode)
            .await?;

        log_tx_event!(
            info,
            self.subsystem_id.as_str(),
            "Tx broadcast",
            tx_response.txhash,
            code = tx_response.code
        );

        Ok(BroadcastTxResponse { tx_response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryTxStore, MockBroadcaster, MockSimulator};
    use crate::domain::{
        BroadcastMode, CachedValue, Code, Event, GasInfo, OrderBy, PageRequest, SortOrder,
        TxResponse, UpstreamError, TX_TYPE_URL,
    };
    use crate::ports::{SimulationFailure, SimulationOutcome};

    type TestService = TxService<MemoryTxStore, MockSimulator, MockBroadcaster>;

    const HASH: &str = "A1B2C3D4E5F60718293A4B5C6D7E8F90A1B2C3D4E5F60718293A4B5C6D7E8F90";

    fn tx_response(hash: &str, height: i64) -> TxResponse {
        let codec = TxCodec::new();
        TxResponse {
            height,
            txhash: hash.to_string(),
            tx: Some(codec.pack(&Tx::default()).unwrap()),
            events: vec![Event::new("message").with_attribute("sender", "cosmos1abc")],
            ..Default::default()
        }
    }

    fn service_with(store: Arc<MemoryTxStore>) -> TestService {
        TxService::new(
            store,
            Arc::new(MockSimulator::succeeding(SimulationOutcome::default())),
            Arc::new(MockBroadcaster::new(Ok(TxResponse::default()))),
            &TxServiceConfig::default(),
        )
        .unwrap()
    }

    fn events(filters: &[&str]) -> Option<GetTxsEventRequest> {
        Some(GetTxsEventRequest {
            events: filters.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_nil_requests_rejected() {
        let service = service_with(Arc::new(MemoryTxStore::new()));

        let err = service.get_txs_event(None).await.unwrap_err();
        assert_eq!(err.to_string(), "request cannot be nil");

        let err = service.get_tx(None).await.unwrap_err();
        assert_eq!(err.code(), Some(Code::InvalidArgument));

        let err = service.simulate(None).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid empty tx");
    }

    #[tokio::test]
    async fn test_pagination_checked_before_events() {
        let service = service_with(Arc::new(MemoryTxStore::new()));
        let err = service
            .get_txs_event(Some(GetTxsEventRequest {
                events: vec![],
                pagination: Some(PageRequest {
                    offset: u64::MAX,
                    ..Default::default()
                }),
                order_by: OrderBy::Unspecified,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::InvalidArgument));
        assert_eq!(err.to_string(), "offset must greater than 0");
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = TxServiceConfig::default();
        config.pagination.default_limit = 0;

        let result = TxService::new(
            Arc::new(MemoryTxStore::new()),
            Arc::new(MockSimulator::succeeding(SimulationOutcome::default())),
            Arc::new(MockBroadcaster::new(Ok(TxResponse::default()))),
            &config,
        );
        assert!(matches!(result, Err(ConfigError::InvalidLimit(_))));

        let querier = Arc::new(crate::adapters::MockNodeQuerier::new());
        let simulator = Arc::new(MockSimulator::succeeding(SimulationOutcome::default()));
        assert!(TxService::with_node(querier, simulator, &config).is_err());
    }

    #[tokio::test]
    async fn test_large_page_limit_reaches_index() {
        let store = Arc::new(MemoryTxStore::new());
        let service = service_with(store.clone());

        service
            .get_txs_event(Some(GetTxsEventRequest {
                events: vec!["tx.height=5".into()],
                pagination: Some(PageRequest {
                    limit: 5000,
                    ..Default::default()
                }),
                order_by: OrderBy::Asc,
            }))
            .await
            .unwrap();

        let call = store.last_search().unwrap();
        assert_eq!((call.page, call.limit), (1, 5000));
    }

    #[tokio::test]
    async fn test_empty_and_malformed_events() {
        let service = service_with(Arc::new(MemoryTxStore::new()));

        let err = service.get_txs_event(events(&[])).await.unwrap_err();
        assert_eq!(err.to_string(), "must declare at least one event to search");

        let err = service
            .get_txs_event(events(&["message.sender=a=b"]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::InvalidArgument));
        assert!(err.to_string().contains("message.sender=a=b"));
    }

    #[tokio::test]
    async fn test_search_passes_order_and_page() {
        let store = Arc::new(MemoryTxStore::new());
        for h in 1..=3 {
            store.insert(tx_response(&format!("{:064X}", h), h));
        }
        let service = service_with(store.clone());

        let response = service
            .get_txs_event(Some(GetTxsEventRequest {
                events: vec!["message.sender=cosmos1abc".into()],
                pagination: Some(PageRequest {
                    offset: 2,
                    limit: 2,
                    ..Default::default()
                }),
                order_by: OrderBy::Desc,
            }))
            .await
            .unwrap();

        let call = store.last_search().unwrap();
        assert_eq!(call.page, 2);
        assert_eq!(call.limit, 2);
        assert_eq!(call.order, Some(SortOrder::Desc));
        assert_eq!(response.pagination.unwrap().total, 3);
        assert_eq!(response.txs.len(), response.tx_responses.len());
    }

    #[tokio::test]
    async fn test_foreign_payload_is_internal() {
        let store = Arc::new(MemoryTxStore::new());
        let mut foreign = tx_response(HASH, 1);
        foreign.tx = Some(AnyTx {
            type_url: "/cosmos.bank.v1beta1.MsgSend".into(),
            value: vec![],
            cached: Some(CachedValue::Foreign {
                type_name: "MsgSend".into(),
            }),
        });
        store.insert(foreign);
        let service = service_with(store);

        let err = service
            .get_tx(Some(GetTxRequest { hash: HASH.into() }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::Internal));
        assert!(err.to_string().ends_with("got MsgSend"));

        let err = service
            .get_txs_event(events(&["message.sender=cosmos1abc"]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::Internal));
    }

    #[tokio::test]
    async fn test_missing_payload_is_internal() {
        let store = Arc::new(MemoryTxStore::new());
        let mut bare = tx_response(HASH, 1);
        bare.tx = None;
        store.insert(bare);

        let err = service_with(store)
            .get_tx(Some(GetTxRequest { hash: HASH.into() }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::Internal));
        assert!(err.to_string().ends_with("got <nil>"));
    }

    #[tokio::test]
    async fn test_get_tx_not_found_names_hash() {
        let service = service_with(Arc::new(MemoryTxStore::new()));
        let err = service
            .get_tx(Some(GetTxRequest { hash: HASH.into() }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::NotFound));
        assert_eq!(err.to_string(), format!("tx not found: {}", HASH));
    }

    #[tokio::test]
    async fn test_other_store_errors_pass_through() {
        let store = Arc::new(MemoryTxStore::new());
        store.fail_with(UpstreamError::new("index is offline"));
        let service = service_with(store);

        let err = service
            .get_tx(Some(GetTxRequest { hash: HASH.into() }))
            .await
            .unwrap_err();
        assert_eq!(err, TxServiceError::Upstream(UpstreamError::new("index is offline")));

        let err = service
            .get_txs_event(events(&["tx.height=5"]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), None);
    }

    #[tokio::test]
    async fn test_get_tx_returns_decoded_tx() {
        let store = Arc::new(MemoryTxStore::new());
        store.insert(tx_response(HASH, 9));
        let response = service_with(store)
            .get_tx(Some(GetTxRequest { hash: HASH.into() }))
            .await
            .unwrap();
        assert_eq!(response.tx, Tx::default());
        assert_eq!(response.tx_response.height, 9);
        assert_eq!(response.tx_response.tx.unwrap().type_url, TX_TYPE_URL);
    }

    #[tokio::test]
    async fn test_simulate_prefers_bytes() {
        let simulator = Arc::new(MockSimulator::succeeding(SimulationOutcome::default()));
        let service = TxService::new(
            Arc::new(MemoryTxStore::new()),
            simulator.clone(),
            Arc::new(MockBroadcaster::new(Ok(TxResponse::default()))),
            &TxServiceConfig::default(),
        )
        .unwrap();

        service
            .simulate(Some(SimulateRequest {
                tx: Some(Tx::default()),
                tx_bytes: Some(vec![9, 9]),
            }))
            .await
            .unwrap();
        assert_eq!(simulator.inputs(), vec![vec![9, 9]]);
    }

    #[tokio::test]
    async fn test_simulate_failure_reports_gas() {
        let simulator = MockSimulator::failing(SimulationFailure::new(
            GasInfo {
                gas_wanted: 100,
                gas_used: 150,
            },
            "out of gas",
        ));
        let service = TxService::new(
            Arc::new(MemoryTxStore::new()),
            Arc::new(simulator),
            Arc::new(MockBroadcaster::new(Ok(TxResponse::default()))),
            &TxServiceConfig::default(),
        )
        .unwrap();

        let err = service
            .simulate(Some(SimulateRequest {
                tx: None,
                tx_bytes: Some(vec![1]),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::Unknown));
        assert_eq!(
            err.to_string(),
            "out of gas With gas wanted: '100' and gas used: '150' "
        );
    }

    #[tokio::test]
    async fn test_block_with_txs_unimplemented() {
        let service = service_with(Arc::new(MemoryTxStore::new()));
        let err = service
            .get_block_with_txs(Some(GetBlockWithTxsRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::Unimplemented));
        assert_eq!(err.to_string(), "service not supported");
    }

    #[tokio::test]
    async fn test_broadcast_is_pass_through() {
        let broadcaster = Arc::new(MockBroadcaster::new(Err(TxServiceError::invalid_argument(
            "invalid empty tx",
        ))));
        let service = TxService::new(
            Arc::new(MemoryTxStore::new()),
            Arc::new(MockSimulator::succeeding(SimulationOutcome::default())),
            broadcaster.clone(),
            &TxServiceConfig::default(),
        )
        .unwrap();

        let err = service.broadcast_tx(None).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid empty tx");

        let _ = service
            .broadcast_tx(Some(BroadcastTxRequest {
                tx_bytes: Some(vec![1, 2]),
                mode: BroadcastMode::Sync,
            }))
            .await;
        assert_eq!(
            broadcaster.calls(),
            vec![
                (None, BroadcastMode::Unspecified),
                (Some(vec![1, 2]), BroadcastMode::Sync)
            ]
        );
    }
}
