//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound port traits.
//!
//! ## Adapters
//!
//! - `HttpNodeQuerier` - node JSON-RPC: `abci_query` for state paths, method calls otherwise
//! - `NodeAccountRetriever` - account lookup through any `NodeQuerier`
//! - `NodeTxSearcher` - event search and hash lookup on the node's tx index
//! - `NodeBroadcaster` - sync/async/commit broadcast routes
//! - `mock` - in-memory doubles for every port

pub mod account_retriever;
pub mod broadcast;
pub mod codec;
pub mod http;
pub mod mock;
pub mod node_searcher;
mod wire;

pub use account_retriever::{NodeAccountRetriever, ACCOUNT_QUERY_PATH};
pub use broadcast::{broadcast_path, NodeBroadcaster};
pub use codec::{CodecError, TxCodec};
pub use http::HttpNodeQuerier;
pub use mock::{
    MemoryTxStore, MockAccountRetriever, MockBroadcaster, MockNodeQuerier, MockSimulator,
    SearchCall,
};
pub use node_searcher::{NodeTxSearcher, TX_PATH, TX_SEARCH_PATH};
