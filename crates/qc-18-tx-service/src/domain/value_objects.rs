//! # Value Objects
//!
//! Validated request fragments: event filters, transaction hashes, result
//! ordering and pagination.

use crate::domain::config::PaginationConfig;
use crate::domain::error::{TxServiceError, TxServiceResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Expected shape of an event filter.
pub const EVENT_FORMAT: &str = "{eventType}.{eventAttribute}={value}";

/// Event key that is matched numerically by the node instead of as a string.
pub const TX_HEIGHT_KEY: &str = "tx.height";

/// Digest size of the transaction hash function (SHA-256), in bytes.
pub const TX_HASH_DIGEST_SIZE: usize = 32;

/// Length of a hex-encoded transaction hash.
pub const TX_HASH_HEX_LEN: usize = TX_HASH_DIGEST_SIZE * 2;

// =============================================================================
// EVENT FILTERS
// =============================================================================

/// Non-empty list of `{eventType}.{eventAttribute}={value}` filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    events: Vec<String>,
}

/// One filter split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCondition<'a> {
    pub event_type: &'a str,
    pub attribute: &'a str,
    pub value: &'a str,
}

impl EventFilter {
    /// Validate raw filters.
    ///
    /// Requires at least one filter, and exactly one `=` in each.
    pub fn parse(events: &[String]) -> TxServiceResult<Self> {
        if events.is_empty() {
            return Err(TxServiceError::invalid_argument(
                "must declare at least one event to search",
            ));
        }

        for event in events {
            if event.matches('=').count() != 1 {
                return Err(TxServiceError::invalid_argument(format!(
                    "invalid event; event {} should be of the format: {}",
                    event, EVENT_FORMAT
                )));
            }
        }

        Ok(Self {
            events: events.to_vec(),
        })
    }

    pub fn as_slice(&self) -> &[String] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Split every filter into type, attribute and value.
    pub fn conditions(&self) -> impl Iterator<Item = EventCondition<'_>> {
        self.events.iter().filter_map(|event| {
            let (key, value) = event.split_once('=')?;
            let (event_type, attribute) = key.split_once('.').unwrap_or((key, ""));
            Some(EventCondition {
                event_type,
                attribute,
                value,
            })
        })
    }

    /// Render the filters as a node search query.
    ///
    /// String values are quoted, `tx.height` is left bare, and filters are
    /// joined with `AND`.
    pub fn to_query(&self) -> String {
        self.events
            .iter()
            .filter_map(|event| event.split_once('='))
            .map(|(key, value)| {
                if key == TX_HEIGHT_KEY {
                    format!("{}={}", key, value)
                } else {
                    format!("{}='{}'", key, value)
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

// =============================================================================
// TRANSACTION HASHES
// =============================================================================

/// Check that `hash` has the length of a hex-encoded digest.
///
/// An empty hash is reported separately from a wrong length. The characters
/// themselves are left for the index to judge.
pub fn validate_tx_hash(hash: &str) -> TxServiceResult<()> {
    match hash.len() {
        TX_HASH_HEX_LEN => Ok(()),
        0 => Err(TxServiceError::invalid_argument("tx hash cannot be empty")),
        _ => Err(TxServiceError::invalid_argument(format!(
            "The length of tx hash must be {}",
            TX_HASH_HEX_LEN
        ))),
    }
}

/// Upper-case hex SHA-256 of raw transaction bytes.
pub fn tx_hash_of(tx_bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(tx_bytes))
}

// =============================================================================
// ORDERING
// =============================================================================

/// Requested ordering of search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderBy {
    #[default]
    #[serde(rename = "ORDER_BY_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "ORDER_BY_ASC")]
    Asc,
    #[serde(rename = "ORDER_BY_DESC")]
    Desc,
}

/// Explicit sort directive passed to the tx index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl OrderBy {
    /// Sort directive for the index.
    ///
    /// `Unspecified` yields `None`: the index applies its own default
    /// (currently ascending).
    pub fn sort_order(self) -> Option<SortOrder> {
        match self {
            OrderBy::Asc => Some(SortOrder::Asc),
            OrderBy::Desc => Some(SortOrder::Desc),
            OrderBy::Unspecified => None,
        }
    }
}

/// Wire form of a sort directive; the empty string leaves the choice to the node.
pub fn order_directive(order: Option<SortOrder>) -> &'static str {
    order.map(SortOrder::as_str).unwrap_or("")
}

// =============================================================================
// PAGINATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageRequest {
    pub key: Vec<u8>,
    pub offset: u64,
    pub limit: u64,
    pub count_total: bool,
    pub reverse: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageResponse {
    pub next_key: Vec<u8>,
    pub total: u64,
}

/// Largest offset or limit a node's signed 64-bit page arithmetic accepts.
const MAX_PAGE_VALUE: u64 = i64::MAX as u64;

/// Turn an optional page request into a 1-based `(page, limit)` pair.
///
/// A missing request or a zero limit falls back to the configured default.
/// Values a signed node would read as negative are rejected.
pub fn parse_pagination(
    request: Option<&PageRequest>,
    config: &PaginationConfig,
) -> TxServiceResult<(u64, u64)> {
    let default_limit = config.effective_default_limit();
    let (offset, limit) = request.map_or((0, default_limit), |req| (req.offset, req.limit));

    if offset > MAX_PAGE_VALUE {
        return Err(TxServiceError::invalid_argument("offset must greater than 0"));
    }
    if limit > MAX_PAGE_VALUE {
        return Err(TxServiceError::invalid_argument("limit must greater than 0"));
    }

    let limit = if limit == 0 { default_limit } else { limit };
    Ok((offset / limit + 1, limit))
}
