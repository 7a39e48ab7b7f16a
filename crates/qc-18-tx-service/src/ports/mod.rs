//! # Ports Layer
//!
//! - **Driving Ports (Inbound)**: the RPC-facing [`TxServiceApi`]
//! - **Driven Ports (Outbound)**: node queries, account lookup, tx index,
//!   execution engine and broadcast transport

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
