//! # Transaction Service Subsystem (qc-18)
//!
//! Query, simulate and broadcast transactions over an indexed node.
//!
//! ## Architecture Role
//!
//! ```text
//! [RPC / HTTP gateway] ──GetTxsEvent/GetTx/Simulate/BroadcastTx──→ [Tx Service (18)]
//!                                                                       │
//!                                ┌──────────────────┬───────────────────┤
//!                                ↓                  ↓                   ↓
//!                           [Tx index]     [Execution engine]   [Broadcast transport]
//!                                └─────────── NodeQuerier ──────────────┘
//! ```
//!
//! ## Error Classification
//!
//! | Class | Raised when |
//! |-------|-------------|
//! | `InvalidArgument` | missing request, out-of-range page, bad event filter, bad hash length, empty simulate input |
//! | `NotFound` | the index reports no such transaction |
//! | `Internal` | the index hands back a payload that is not a transaction |
//! | `Unimplemented` | `GetBlockWithTxs` |
//! | `Unknown` | simulation failed; gas figures are in the message |
//! | pass-through | any other collaborator error, unchanged |
//!
//! ## Testing Without a Node
//!
//! Every port has an in-memory double in [`adapters::mock`]. Account logic
//! only ever sees a [`NodeQuerier`], so [`MockNodeQuerier`] is enough to
//! drive it.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{
    HttpNodeQuerier, MemoryTxStore, MockAccountRetriever, MockBroadcaster, MockNodeQuerier,
    MockSimulator, NodeAccountRetriever, NodeBroadcaster, NodeTxSearcher, TxCodec,
};
pub use domain::*;
pub use ports::inbound::TxServiceApi;
pub use ports::outbound::{
    AccountError, AccountRetriever, Broadcaster, NodeQuerier, NodeQueryError, NodeQueryResponse,
    SimulationFailure, SimulationOutcome, Simulator, TxSearcher,
};
pub use service::TxService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
