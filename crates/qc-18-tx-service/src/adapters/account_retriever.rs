//! Account retriever backed by a [`NodeQuerier`].
//!
//! Works the same against a live node, a proxy or a test double; it only
//! needs the querier handed in on each call.

use crate::domain::{AccAddress, BaseAccount, QueryAccountParams};
use crate::ports::{AccountError, AccountRetriever, NodeQuerier, NodeQueryError};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

/// Route of the auth module's account query.
pub const ACCOUNT_QUERY_PATH: &str = "custom/acc/account";

/// Result code the auth module uses for an unknown address.
pub const CODE_UNKNOWN_ADDRESS: u32 = 9;

/// Queries accounts through `custom/acc/account` with a JSON payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeAccountRetriever;

impl NodeAccountRetriever {
    pub fn new() -> Self {
        Self
    }
}

/// Whether a node rejection means the account does not exist.
fn indicates_absence(err: &NodeQueryError) -> bool {
    match err {
        NodeQueryError::Rejected { code, log, .. } => {
            *code == CODE_UNKNOWN_ADDRESS
                || log.contains("not found")
                || log.contains("does not exist")
        }
        NodeQueryError::Transport(_) => false,
    }
}

#[async_trait]
impl AccountRetriever for NodeAccountRetriever {
    #[instrument(skip_all, fields(address = %address))]
    async fn get_account_with_height(
        &self,
        querier: &dyn NodeQuerier,
        address: &AccAddress,
    ) -> Result<(BaseAccount, i64), AccountError> {
        let params = serde_json::to_vec(&QueryAccountParams {
            address: address.clone(),
        })
        .map_err(|e| AccountError::Codec(e.to_string()))?;

        let response = match querier.query_with_data(ACCOUNT_QUERY_PATH, &params).await {
            Ok(response) => response,
            Err(err) if indicates_absence(&err) => {
                debug!(error = %err, "Account query reports absence");
                return Err(AccountError::NotFound {
                    address: address.clone(),
                });
            }
            Err(err) => {
                warn!(error = %err, "Account query failed");
                return Err(err.into());
            }
        };

        if response.value.is_empty() {
            return Err(AccountError::NotFound {
                address: address.clone(),
            });
        }

        let account: BaseAccount = serde_json::from_slice(&response.value)
            .map_err(|e| AccountError::Codec(e.to_string()))?;

        debug!(
            account_number = account.account_number,
            sequence = account.sequence,
            height = response.height,
            "Account retrieved"
        );

        Ok((account, response.height))
    }
}
