//! # Domain Layer
//!
//! Request validation, the transaction model, error classification and
//! configuration. No I/O happens here; collaborators are reached through
//! the traits in `ports`.

pub mod account;
pub mod config;
pub mod error;
pub mod messages;
pub mod types;
pub mod value_objects;

pub use account::*;
pub use config::{
    ConfigError, NodeConfig, PaginationConfig, TxServiceConfig, DEFAULT_PAGE_LIMIT,
};
pub use error::{codes, Code, ErrorPayload, TxServiceError, TxServiceResult, UpstreamError};
pub use messages::*;
pub use types::*;
pub use value_objects::*;
