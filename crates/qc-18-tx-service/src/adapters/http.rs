//! JSON-RPC node querier.
//!
//! Paths naming application state (`custom/...`, `store/...`, `app/...`,
//! `p2p/...` or a leading `/`) go through `abci_query` with hex-encoded data,
//! and the answer's value arrives base64-encoded. Any other path is a node
//! RPC method (`tx`, `tx_search`, `broadcast_tx_sync`, ...): the data is its
//! JSON params and the JSON result is handed back as the value.

use crate::adapters::wire::{int_field, int_from_str_or_int};
use crate::domain::NodeConfig;
use crate::ports::{NodeQuerier, NodeQueryError, NodeQueryResponse};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, instrument};

const ABCI_QUERY_METHOD: &str = "abci_query";

const ABCI_PATH_PREFIXES: [&str; 5] = ["custom/", "store/", "app/", "p2p/", "/"];

/// Whether `path` is answered by the application through `abci_query`.
fn is_abci_path(path: &str) -> bool {
    ABCI_PATH_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Serialize)]
struct AbciQueryParams<'a> {
    path: &'a str,
    data: String,
    height: &'static str,
    prove: bool,
}

#[derive(Debug, Deserialize)]
struct AbciQueryResult {
    response: AbciResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AbciResponse {
    code: u32,
    log: String,
    value: Option<String>,
    #[serde(deserialize_with = "int_from_str_or_int")]
    height: i64,
}

/// A JSON-RPC error on a method call; `data` carries the node's reason.
fn method_rejection(path: &str, error: JsonRpcError) -> NodeQueryError {
    let log = match error.data {
        Some(data) if !data.is_empty() => format!("{}: {}", error.message, data),
        _ => error.message,
    };
    NodeQueryError::Rejected {
        path: path.to_string(),
        code: u32::try_from(error.code.unsigned_abs()).unwrap_or(u32::MAX),
        log,
    }
}

fn method_params(data: &[u8]) -> Result<Value, NodeQueryError> {
    if data.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(data)
        .map_err(|e| NodeQueryError::Transport(format!("invalid method params: {}", e)))
}

fn into_query_response(
    path: &str,
    response: AbciResponse,
) -> Result<NodeQueryResponse, NodeQueryError> {
    if response.code != 0 {
        return Err(NodeQueryError::Rejected {
            path: path.to_string(),
            code: response.code,
            log: response.log,
        });
    }

    let value = match response.value {
        Some(encoded) if !encoded.is_empty() => BASE64_STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| NodeQueryError::Transport(format!("invalid query value: {}", e)))?,
        _ => Vec::new(),
    };

    Ok(NodeQueryResponse::new(value, response.height))
}

/// [`NodeQuerier`] speaking JSON-RPC to a node's HTTP endpoint.
pub struct HttpNodeQuerier {
    http_client: reqwest::Client,
    rpc_url: String,
    request_id: AtomicU64,
}

impl HttpNodeQuerier {
    pub fn new(config: &NodeConfig) -> Result<Self, NodeQueryError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NodeQueryError::Transport(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            rpc_url: config.rpc_url.clone(),
            request_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

impl HttpNodeQuerier {
    async fn call<P, R>(
        &self,
        method: &str,
        params: P,
    ) -> Result<JsonRpcResponse<R>, NodeQueryError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NodeQueryError::Transport(format!("failed to send query: {}", e)))?;

        response
            .json()
            .await
            .map_err(|e| NodeQueryError::Transport(format!("failed to parse answer: {}", e)))
    }

    async fn abci_query(
        &self,
        path: &str,
        data: &[u8],
    ) -> Result<NodeQueryResponse, NodeQueryError> {
        let params = AbciQueryParams {
            path,
            data: hex::encode(data),
            height: "0",
            prove: false,
        };
        let rpc_response: JsonRpcResponse<AbciQueryResult> =
            self.call(ABCI_QUERY_METHOD, params).await?;

        if let Some(error) = rpc_response.error {
            let detail = error.data.unwrap_or_default();
            return Err(NodeQueryError::Transport(format!(
                "RPC error {}: {} {}",
                error.code, error.message, detail
            )
            .trim_end()
            .to_string()));
        }

        let result = rpc_response
            .result
            .ok_or_else(|| NodeQueryError::Transport("RPC answer missing result".into()))?;

        debug!(path, code = result.response.code, "ABCI query answered");
        into_query_response(path, result.response)
    }

    async fn method_call(
        &self,
        method: &str,
        data: &[u8],
    ) -> Result<NodeQueryResponse, NodeQueryError> {
        let params = method_params(data)?;
        let rpc_response: JsonRpcResponse<Value> = self.call(method, params).await?;

        if let Some(error) = rpc_response.error {
            debug!(method, code = error.code, "Node method rejected");
            return Err(method_rejection(method, error));
        }

        let result = rpc_response
            .result
            .ok_or_else(|| NodeQueryError::Transport("RPC answer missing result".into()))?;
        let height = int_field(&result, "height");
        let value = serde_json::to_vec(&result)
            .map_err(|e| NodeQueryError::Transport(format!("invalid method result: {}", e)))?;

        debug!(method, height, "Node method answered");
        Ok(NodeQueryResponse::new(value, height))
    }
}

#[async_trait]
impl NodeQuerier for HttpNodeQuerier {
    #[instrument(skip(self, data), fields(len = data.len()))]
    async fn query_with_data(
        &self,
        path: &str,
        data: &[u8],
    ) -> Result<NodeQueryResponse, NodeQueryError> {
        if is_abci_path(path) {
            self.abci_query(path, data).await
        } else {
            self.method_call(path, data).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(json: &str) -> AbciResponse {
        let result: JsonRpcResponse<AbciQueryResult> = serde_json::from_str(json).unwrap();
        result.result.unwrap().response
    }

    #[test]
    fn test_successful_answer_is_decoded() {
        let response = parse(
            r#"{"jsonrpc":"2.0","id":1,"result":{"response":{"code":0,"log":"","value":"aGVsbG8=","height":"17"}}}"#,
        );
        let answer = into_query_response("custom/acc/account", response).unwrap();
        assert_eq!(answer.value, b"hello".to_vec());
        assert_eq!(answer.height, 17);
    }

    #[test]
    fn test_numeric_height_and_missing_value() {
        let response =
            parse(r#"{"jsonrpc":"2.0","id":1,"result":{"response":{"code":0,"height":4}}}"#);
        let answer = into_query_response("tx", response).unwrap();
        assert!(answer.value.is_empty());
        assert_eq!(answer.height, 4);
    }

    #[test]
    fn test_nonzero_code_is_rejection() {
        let response = parse(
            r#"{"jsonrpc":"2.0","id":1,"result":{"response":{"code":9,"log":"unknown address","height":"0"}}}"#,
        );
        assert_eq!(
            into_query_response("custom/acc/account", response).unwrap_err(),
            NodeQueryError::Rejected {
                path: "custom/acc/account".into(),
                code: 9,
                log: "unknown address".into(),
            }
        );
    }

    #[test]
    fn test_request_shape() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method: ABCI_QUERY_METHOD,
            params: AbciQueryParams {
                path: "tx",
                data: hex::encode([0xab, 0x01]),
                height: "0",
                prove: false,
            },
            id: 3,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["params"]["data"], "ab01");
        assert_eq!(json["method"], "abci_query");
    }

    #[test]
    fn test_path_routing() {
        assert!(is_abci_path("custom/acc/account"));
        assert!(is_abci_path("store/bank/key"));
        assert!(is_abci_path("/cosmos.auth.v1beta1.Query/Account"));
        assert!(!is_abci_path("tx"));
        assert!(!is_abci_path("tx_search"));
        assert!(!is_abci_path("broadcast_tx_sync"));
    }

    #[test]
    fn test_method_error_keeps_node_reason() {
        let error: JsonRpcError = serde_json::from_str(
            r#"{"code":-32603,"message":"Internal error","data":"tx (AB) not found"}"#,
        )
        .unwrap();
        assert_eq!(
            method_rejection("tx", error),
            NodeQueryError::Rejected {
                path: "tx".into(),
                code: 32603,
                log: "Internal error: tx (AB) not found".into(),
            }
        );
    }

    #[test]
    fn test_method_params() {
        assert_eq!(method_params(&[]).unwrap(), serde_json::json!({}));
        assert_eq!(
            method_params(br#"{"tx":"AQI="}"#).unwrap(),
            serde_json::json!({ "tx": "AQI=" })
        );
        assert!(matches!(method_params(b"\x01"), Err(NodeQueryError::Transport(_))));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let querier = HttpNodeQuerier::new(&NodeConfig {
            rpc_url: "http://127.0.0.1:1".into(),
            timeout: Duration::from_millis(200),
        })
        .unwrap();
        let err = querier.query_with_data("tx", &[]).await.unwrap_err();
        assert!(matches!(err, NodeQueryError::Transport(_)));
    }
}
