//! JSON-RPC 2.0 node client over HTTP.
//!
//! Layer and network queries go to the node's public endpoint, sync status to
//! its private endpoint. Every call is bounded by the client timeout.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{LayerNumber, NetworkInfo};
use tracing::debug;

use crate::domain::{LayerSnapshot, NodeError};
use crate::ports::NodeClient;

/// RPC error code the node uses for a layer it cannot serve.
pub const LAYER_NOT_AVAILABLE_CODE: i64 = -32004;

const METHOD_NETWORK_INFO: &str = "mesh_networkInfo";
const METHOD_LAYER: &str = "mesh_layer";
const METHOD_STATUS: &str = "node_status";

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
}

/// Node sync status from the private endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NodeStatus {
    /// Highest layer the node has fully processed.
    pub synced_layer: LayerNumber,
    /// Highest layer the node has heard of.
    pub top_layer: LayerNumber,
    pub is_synced: bool,
}

/// HTTP JSON-RPC implementation of [`NodeClient`].
pub struct JsonRpcNodeClient {
    http_client: reqwest::Client,
    public_url: String,
    private_url: String,
    hrp: String,
    timeout: Duration,
    request_id: AtomicU64,
}

impl JsonRpcNodeClient {
    /// Client for `<host>:<port>` endpoints (an explicit `http(s)://` scheme
    /// is kept as given). Addresses must carry `hrp`.
    pub fn new(public: &str, private: &str, hrp: &str, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            public_url: endpoint_url(public),
            private_url: endpoint_url(private),
            hrp: hrp.to_string(),
            timeout,
            request_id: AtomicU64::new(1),
        }
    }

    /// Node sync status.
    pub async fn status(&self) -> Result<NodeStatus, NodeError> {
        self.call(&self.private_url, METHOD_STATUS, Vec::<()>::new(), |e| {
            unavailable(&self.private_url, e)
        })
        .await
    }

    async fn call<P, R, F>(
        &self,
        url: &str,
        method: &'static str,
        params: P,
        rpc_error: F,
    ) -> Result<R, NodeError>
    where
        P: Serialize,
        R: DeserializeOwned,
        F: FnOnce(JsonRpcError) -> NodeError,
    {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        debug!(method, id, url, "[mx-02] node call");

        let response = self
            .http_client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(url, method, e))?;

        let rpc_response: JsonRpcResponse<R> =
            response.json().await.map_err(|e| NodeError::Malformed {
                method: method.to_string(),
                message: e.to_string(),
            })?;

        if let Some(error) = rpc_response.error {
            return Err(rpc_error(error));
        }

        rpc_response.result.ok_or_else(|| NodeError::Malformed {
            method: method.to_string(),
            message: "response missing result".to_string(),
        })
    }

    fn transport_error(&self, url: &str, method: &str, e: reqwest::Error) -> NodeError {
        if e.is_timeout() {
            NodeError::Timeout {
                method: method.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            NodeError::Unavailable {
                endpoint: url.to_string(),
                message: e.to_string(),
            }
        }
    }

    fn check_hrp(&self, snapshot: &LayerSnapshot) -> Result<(), NodeError> {
        match snapshot
            .addresses()
            .find(|address| !has_hrp(address, &self.hrp))
        {
            Some(foreign) => Err(NodeError::Malformed {
                method: METHOD_LAYER.to_string(),
                message: format!(
                    "address {foreign} in layer {} does not use prefix {}",
                    snapshot.number(),
                    self.hrp
                ),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NodeClient for JsonRpcNodeClient {
    async fn network_info(&self) -> Result<NetworkInfo, NodeError> {
        let info: NetworkInfo = self
            .call(&self.public_url, METHOD_NETWORK_INFO, Vec::<()>::new(), |e| {
                unavailable(&self.public_url, e)
            })
            .await?;

        if info.hrp != self.hrp {
            return Err(NodeError::Malformed {
                method: METHOD_NETWORK_INFO.to_string(),
                message: format!("node uses address prefix {}, expected {}", info.hrp, self.hrp),
            });
        }
        Ok(info)
    }

    async fn highest_layer(&self) -> Result<LayerNumber, NodeError> {
        Ok(self.status().await?.synced_layer)
    }

    async fn layer(&self, number: LayerNumber) -> Result<LayerSnapshot, NodeError> {
        let snapshot: LayerSnapshot = self
            .call(&self.public_url, METHOD_LAYER, [number], |e| {
                if e.code == LAYER_NOT_AVAILABLE_CODE {
                    NodeError::LayerNotAvailable { layer: number }
                } else {
                    unavailable(&self.public_url, e)
                }
            })
            .await?;

        if snapshot.number() != number {
            return Err(NodeError::Malformed {
                method: METHOD_LAYER.to_string(),
                message: format!("asked for layer {number}, got {}", snapshot.number()),
            });
        }
        self.check_hrp(&snapshot)?;
        Ok(snapshot)
    }
}

/// Normalize `<host>:<port>` into an HTTP URL.
pub fn endpoint_url(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

fn unavailable(url: &str, error: JsonRpcError) -> NodeError {
    NodeError::Unavailable {
        endpoint: url.to_string(),
        message: format!("RPC error {}: {}", error.code, error.message),
    }
}

fn has_hrp(address: &str, hrp: &str) -> bool {
    address
        .strip_prefix(hrp)
        .is_some_and(|rest| rest.starts_with('1'))
}
